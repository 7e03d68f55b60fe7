pub mod admin;
pub mod auth;
pub mod goals;
pub mod reports;
pub mod tasks;
