use serde::{Deserialize, Serialize};

/// Authenticated caller resolved from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    username: String,
    role_id: Option<String>,
    permissions: Option<Vec<String>>,
}

impl UserIdentity {
    /// Creates a user identity from verified credential claims.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        username: impl Into<String>,
        role_id: Option<String>,
        permissions: Option<Vec<String>>,
    ) -> Self {
        Self {
            subject: subject.into(),
            username: username.into(),
            role_id,
            permissions,
        }
    }

    /// Returns the stable subject claim (the user id).
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the username captured when the credential was issued.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the role the credential was issued for, if any.
    #[must_use]
    pub fn role_id(&self) -> Option<&str> {
        self.role_id
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    /// Returns the permission snapshot embedded in the credential.
    ///
    /// The snapshot may drift from live role grants until the credential is
    /// refreshed.
    #[must_use]
    pub fn embedded_permissions(&self) -> Option<&[String]> {
        self.permissions.as_deref()
    }

    /// Returns whether the embedded snapshot carries the given permission.
    #[must_use]
    pub fn has_embedded_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|values| values.iter().any(|value| value == permission))
    }
}

#[cfg(test)]
mod tests {
    use super::UserIdentity;

    #[test]
    fn blank_role_id_is_treated_as_absent() {
        let identity = UserIdentity::new("user-1", "alice", Some("  ".to_owned()), None);
        assert_eq!(identity.role_id(), None);
    }

    #[test]
    fn embedded_permission_lookup_is_exact() {
        let identity = UserIdentity::new(
            "user-1",
            "alice",
            None,
            Some(vec!["achievements.create".to_owned()]),
        );

        assert!(identity.has_embedded_permission("achievements.create"));
        assert!(!identity.has_embedded_permission("achievements"));
        assert!(!identity.has_embedded_permission("achievements.verify"));
    }
}
