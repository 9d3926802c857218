crate::label::label_repository!(
    Tag,
    CreateTag,
    TagRepository,
    TagRepositoryImpl,
    "tag",
    "series_tags",
    "tag_id"
);
