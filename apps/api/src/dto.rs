mod achievements;
mod common;
mod profiles;
mod roles;
mod users;

pub use achievements::{
    AchievementDetailResponse, AchievementListParams, AchievementPageResponse,
    AchievementResponse, AddAttachmentRequest, AttachmentResponse, CreateAchievementRequest,
    ReferenceResponse, RejectAchievementRequest, UpdateAchievementRequest,
};
pub use common::HealthResponse;
pub use profiles::{
    CreateLecturerRequest, CreateStudentRequest, LecturerResponse, SetAdvisorRequest,
    StudentResponse,
};
pub use roles::{CreateRoleRequest, RolePermissionsResponse, RoleResponse};
pub use users::{
    AssignRoleRequest, CallerProfileResponse, CreateUserRequest, UpdateUserRequest, UserResponse,
};
