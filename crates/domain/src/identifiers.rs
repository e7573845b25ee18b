//! UUID-backed identifiers for relational rows.

use laurel_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Parses a transport value into an identifier.
            pub fn parse(value: &str) -> AppResult<Self> {
                Uuid::parse_str(value.trim()).map(Self).map_err(|error| {
                    AppError::Validation(format!(
                        concat!("invalid ", $label, " '{}': {}"),
                        value, error
                    ))
                })
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a user account.
    UserId,
    "user id"
);
uuid_identifier!(
    /// Unique identifier for a role.
    RoleId,
    "role id"
);
uuid_identifier!(
    /// Unique identifier for a permission definition row.
    PermissionId,
    "permission id"
);
uuid_identifier!(
    /// Unique identifier for a student profile.
    StudentId,
    "student id"
);
uuid_identifier!(
    /// Unique identifier for a lecturer profile.
    LecturerId,
    "lecturer id"
);
uuid_identifier!(
    /// Unique identifier for an achievement reference row.
    ReferenceId,
    "reference id"
);
