use laurel_application::RolePermissions;
use laurel_domain::RoleDefinition;
use serde::{Deserialize, Serialize};

/// Incoming payload for role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            description: value.description,
        }
    }
}

/// Role together with its granted permission names.
#[derive(Debug, Serialize)]
pub struct RolePermissionsResponse {
    pub role: RoleResponse,
    pub permissions: Vec<String>,
}

impl From<RolePermissions> for RolePermissionsResponse {
    fn from(value: RolePermissions) -> Self {
        Self {
            role: RoleResponse::from(value.role),
            permissions: value.permissions.into_iter().map(String::from).collect(),
        }
    }
}
