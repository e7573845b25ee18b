use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use laurel_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/achievements",
            get(handlers::achievements::list_achievements_handler)
                .post(handlers::achievements::create_achievement_handler),
        )
        .route(
            "/achievements/{achievement_id}",
            get(handlers::achievements::get_achievement_handler)
                .put(handlers::achievements::update_achievement_handler)
                .delete(handlers::achievements::delete_achievement_handler),
        )
        .route(
            "/achievements/{achievement_id}/permanent",
            delete(handlers::achievements::hard_delete_achievement_handler),
        )
        .route(
            "/achievements/{achievement_id}/submit",
            post(handlers::achievements::submit_achievement_handler),
        )
        .route(
            "/achievements/{achievement_id}/verify",
            post(handlers::achievements::verify_achievement_handler),
        )
        .route(
            "/achievements/{achievement_id}/reject",
            post(handlers::achievements::reject_achievement_handler),
        )
        .route(
            "/achievements/{achievement_id}/history",
            get(handlers::achievements::achievement_history_handler),
        )
        .route(
            "/achievements/{achievement_id}/attachments",
            get(handlers::achievements::list_attachments_handler)
                .post(handlers::achievements::add_attachment_handler),
        )
        .route("/auth/profile", get(handlers::auth::profile_handler))
        .route(
            "/users",
            get(handlers::users::list_users_handler).post(handlers::users::create_user_handler),
        )
        .route(
            "/users/{user_id}",
            get(handlers::users::get_user_handler)
                .put(handlers::users::update_user_handler)
                .delete(handlers::users::delete_user_handler),
        )
        .route(
            "/users/{user_id}/role",
            put(handlers::users::assign_role_handler),
        )
        .route(
            "/students",
            get(handlers::profiles::list_students_handler)
                .post(handlers::profiles::create_student_handler),
        )
        .route(
            "/students/{student_id}",
            get(handlers::profiles::get_student_handler),
        )
        .route(
            "/students/{student_id}/advisor",
            put(handlers::profiles::set_student_advisor_handler),
        )
        .route(
            "/students/{student_id}/achievements",
            get(handlers::profiles::student_achievements_handler),
        )
        .route(
            "/lecturers",
            get(handlers::profiles::list_lecturers_handler)
                .post(handlers::profiles::create_lecturer_handler),
        )
        .route(
            "/lecturers/{lecturer_id}",
            get(handlers::profiles::get_lecturer_handler),
        )
        .route(
            "/lecturers/{lecturer_id}/advisees",
            get(handlers::profiles::lecturer_advisees_handler),
        )
        .route("/roles", post(handlers::roles::create_role_handler))
        .route(
            "/roles/{role}",
            get(handlers::roles::get_role_by_name_handler),
        )
        .route(
            "/roles/{role}/permissions",
            get(handlers::roles::list_role_permissions_handler),
        )
        .route(
            "/roles/{role}/permissions/{permission}",
            put(handlers::roles::grant_role_permission_handler)
                .delete(handlers::roles::revoke_role_permission_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(frontend_url).map_err(|error| {
            AppError::Validation(format!("invalid FRONTEND_URL '{frontend_url}': {error}"))
        })?)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .nest("/api/v1", protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
