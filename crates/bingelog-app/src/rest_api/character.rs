#[allow(unused_imports)]
use bingelog_dal::character::{Character, CharacterRepository, CreateCharacter};

crate::label_api!(Character, CreateCharacter, CharacterRepository);
