// src/models/identity.rs
// DOCUMENTATION: Authenticated identity and actor roles

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity produced by the upstream authentication flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Actor role stored on the profile row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Anything other than "admin" is a regular user
    pub fn from_db(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }

    /// Privileged actors bypass the daily spin limit
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Identity plus the role loaded from the profile store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn new(identity: Identity, role: Role) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_db() {
        assert_eq!(Role::from_db(Some("admin")), Role::Admin);
        assert_eq!(Role::from_db(Some(" ADMIN ")), Role::Admin);
        assert_eq!(Role::from_db(Some("user")), Role::User);
        assert_eq!(Role::from_db(Some("moderator")), Role::User);
        assert_eq!(Role::from_db(None), Role::User);
        assert!(Role::Admin.is_privileged());
        assert!(!Role::User.is_privileged());
    }
}
