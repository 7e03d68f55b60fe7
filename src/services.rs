pub mod auth;
pub mod division_service;
pub mod export_service;
pub mod goal_service;
pub mod report_service;
pub mod task_history;
pub mod task_query;
pub mod task_service;
pub mod user_service;
