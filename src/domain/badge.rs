use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque reference into the badge catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
}
