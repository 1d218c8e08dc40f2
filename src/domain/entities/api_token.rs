//! API tokens and the roles they grant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried by an API token.
///
/// Editors manage content; admins may also delete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}' (expected editor or admin)")),
        }
    }
}

/// API token metadata. Only the HMAC of the raw token is stored.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub id: i64,
    pub name: String,
    pub token_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub token_id: i64,
    pub name: String,
    pub role: Role,
}

impl From<&ApiToken> for Principal {
    fn from(token: &ApiToken) -> Self {
        Self {
            token_id: token.id,
            name: token.name.clone(),
            role: token.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("editor".parse::<Role>().unwrap(), Role::Editor);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::Editor);
    }

    #[test]
    fn test_principal_from_token() {
        let token = ApiToken {
            id: 3,
            name: "Dashboard".to_string(),
            token_hash: "abc".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };

        let principal = Principal::from(&token);
        assert_eq!(principal.token_id, 3);
        assert_eq!(principal.name, "Dashboard");
        assert_eq!(principal.role, Role::Admin);
        assert!(!token.is_revoked());
    }
}
