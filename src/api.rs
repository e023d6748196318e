//! JSON view layer between the HTTP routes and the stores.
//!
//! Owns the wire shapes: ids travel as 32-hex-digit strings, dates in a
//! human-readable format, and a never-updated bookmark reports an empty
//! `date_updated` rather than null.

use crate::error::{Error, Result};
use crate::models::bookmark::Bookmark;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire format for both timestamp fields.
pub const DATE_FORMAT: &str = "%H:%M:%S on %B %d %Y";

fn format_date(date: NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Full bookmark record as served to clients. All fields are strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookmarkView {
    pub uuid: String,
    pub uri: String,
    pub title: String,
    pub date_created: String,
    pub date_updated: String,
}

impl BookmarkView {
    /// Per-field extraction from a stored record.
    pub fn from_record(bookmark: &Bookmark) -> Self {
        Self {
            uuid: bookmark.id.simple().to_string(),
            uri: bookmark.uri.clone(),
            title: bookmark.title.clone(),
            date_created: format_date(bookmark.created_at),
            date_updated: bookmark.updated_at.map(format_date).unwrap_or_default(),
        }
    }
}

/// Response to a save: just the id the URI resolved to.
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedView {
    pub uuid: String,
}

impl SavedView {
    pub fn new(id: Uuid) -> Self {
        Self {
            uuid: id.simple().to_string(),
        }
    }
}

/// Response to a delete: the id as the caller sent it, plus whether the
/// record is gone.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedView {
    pub uuid: String,
    pub bookmark_deleted: bool,
}

/// Parse a client-supplied id string, rejecting anything that isn't a
/// valid 128-bit id before it reaches the store. Accepts both the
/// 32-hex-digit simple form and the hyphenated form.
pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::InvalidId(raw.to_string()))
}
