//! Raw table rows, exactly as they are laid out on disk.

/// Row of the `files` table.
#[derive(Clone, Debug, Eq, PartialEq, sqlx::FromRow)]
pub struct FileRow {
    pub id: i64,
    pub file_name: String,
}

/// Row of the `tags` table.
#[derive(Clone, Debug, Eq, PartialEq, sqlx::FromRow)]
pub struct TagRow {
    pub id: i64,
    pub name: String,
}

/// Row of the `tag_list_entity` table, linking one file to one tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq, sqlx::FromRow)]
pub struct LinkRow {
    pub id: i64,
    pub file_id: i64,
    pub tag_id: i64,
}
