use std::sync::Arc;

use laurel_application::{
    AchievementService, AuthorizationService, CredentialVerifier, ProfileService,
    RoleAdminService, UserAdminService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub achievement_service: AchievementService,
    pub profile_service: ProfileService,
    pub role_admin_service: RoleAdminService,
    pub user_admin_service: UserAdminService,
    pub credential_verifier: Arc<dyn CredentialVerifier>,
}
