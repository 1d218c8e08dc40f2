//! Access rules for content resources.

use serde_json::json;

use crate::domain::catalog::{ResourceDef, Visibility};
use crate::domain::entities::{Principal, Role};
use crate::error::AppError;

/// Operation a request performs on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

fn is_anonymous_allowed(visibility: Visibility, action: Action) -> bool {
    matches!(
        (visibility, action),
        (Visibility::Public, Action::Read) | (Visibility::Inbox, Action::Create)
    )
}

fn required_role(action: Action) -> Role {
    match action {
        Action::Delete => Role::Admin,
        _ => Role::Editor,
    }
}

/// Checks whether `principal` may perform `action` on `resource`.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] when the action needs a token and none
/// was presented, and [`AppError::Forbidden`] when the token's role is too low.
pub fn authorize(
    resource: &ResourceDef,
    action: Action,
    principal: Option<&Principal>,
) -> Result<(), AppError> {
    if is_anonymous_allowed(resource.visibility, action) {
        return Ok(());
    }

    let Some(principal) = principal else {
        return Err(AppError::unauthorized(
            "Unauthorized",
            json!({"reason": "Authentication required", "resource": resource.name, "action": action.as_str()}),
        ));
    };

    let required = required_role(action);
    if principal.role < required {
        return Err(AppError::forbidden(
            "Insufficient role",
            json!({"required": required.as_str(), "role": principal.role.as_str()}),
        ));
    }

    Ok(())
}
