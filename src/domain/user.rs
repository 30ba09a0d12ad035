use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Public,
    Helper,
    Leader,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Public => "public",
            Role::Helper => "helper",
            Role::Leader => "leader",
            Role::Admin => "admin",
        }
    }

    /// Leaders and admins run events.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Leader | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Role::Public),
            "helper" => Ok(Role::Helper),
            "leader" => Ok(Role::Leader),
            "admin" => Ok(Role::Admin),
            _ => Err(AppError::BadRequest(format!("Invalid role: {}", s))),
        }
    }
}

/// Directory entry pushed by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertUserRequest {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
}
