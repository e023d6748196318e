use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved bookmark.
///
/// `id` is always recomputable from `uri` via `ident::derive_id`; the
/// store never lets the two diverge except inside the atomic relocation
/// performed by a URI update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bookmark {
    pub id: Uuid,
    pub uri: String,
    pub title: String,
    /// Set once at insert, never modified.
    pub created_at: NaiveDateTime,
    /// `None` until the first title or URI mutation.
    pub updated_at: Option<NaiveDateTime>,
}

impl Bookmark {
    pub fn new(
        id: Uuid,
        uri: String,
        title: String,
        created_at: NaiveDateTime,
        updated_at: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id,
            uri,
            title,
            created_at,
            updated_at,
        }
    }
}
