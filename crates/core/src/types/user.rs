//! Session user identity.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Logged-in user as persisted in the session store.
///
/// Produced by the auth collaborator. The storefront only reads `id`, to scope
/// seller views to the user's own listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl SessionUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self.username.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_auth_payload() {
        let user: SessionUser = serde_json::from_str(
            r#"{"id": 1714000000000, "username": "ana", "email": "ana@example.com", "firstName": "Ana"}"#,
        )
        .unwrap();
        assert_eq!(user.id, UserId::new(1_714_000_000_000));
        assert_eq!(user.display_name(), "Ana");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user = SessionUser {
            id: UserId::new(1),
            username: "seller1".to_string(),
            email: "s@example.com".to_string(),
            first_name: None,
            last_name: Some("Pérez".to_string()),
        };
        assert_eq!(user.display_name(), "seller1");
    }
}
