//! Application services and ports.

#![forbid(unsafe_code)]

mod achievement_ports;
mod achievement_service;
mod authorization_ports;
mod authorization_service;
mod credential_ports;
mod profile_ports;
mod profile_service;
mod role_admin_service;
mod user_admin_service;
mod user_ports;

pub use achievement_ports::{
    AchievementListQuery, AchievementPage, AchievementStore, PageRequest, ReferenceLedger,
    ScanCursor,
};
pub use achievement_service::{AchievementDetail, AchievementService, ReconciliationReport};
pub use authorization_ports::{PermissionCache, RolePermissionRepository};
pub use authorization_service::{AccessDecision, AuthorizationService};
pub use credential_ports::CredentialVerifier;
pub use profile_ports::{CreateLecturerInput, CreateStudentInput, ProfileRepository};
pub use profile_service::ProfileService;
pub use role_admin_service::{RoleAdminService, RolePermissions};
pub use user_admin_service::{CallerProfile, UserAdminService};
pub use user_ports::{CreateUserInput, UserRepository};
