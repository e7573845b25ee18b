pub mod achievements;
pub mod auth;
pub mod health;
pub mod profiles;
pub mod roles;
pub mod users;
