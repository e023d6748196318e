use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An externally-issued authentication token, tracked per client address.
///
/// Structurally a twin of `Bookmark`, except the id is a random v4 UUID
/// rather than content-derived. Storage only: nothing in this crate
/// enforces authorization with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthToken {
    pub id: Uuid,
    pub client_ip: String,
    pub auth_key: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl AuthToken {
    pub fn new(
        id: Uuid,
        client_ip: String,
        auth_key: String,
        active: bool,
        created_at: NaiveDateTime,
        updated_at: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id,
            client_ip,
            auth_key,
            active,
            created_at,
            updated_at,
        }
    }
}
