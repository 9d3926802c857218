#[allow(unused_imports)]
use bingelog_dal::tag::{CreateTag, Tag, TagRepository};

crate::label_api!(Tag, CreateTag, TagRepository);
