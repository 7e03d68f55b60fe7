pub mod auth;
pub mod division;
pub mod goal;
pub mod report;
pub mod task;
