crate::label::label_repository!(
    Character,
    CreateCharacter,
    CharacterRepository,
    CharacterRepositoryImpl,
    "character",
    "series_characters",
    "character_id"
);
