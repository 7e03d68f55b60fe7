pub mod division_repo;
pub use division_repo::{DivisionRepository, PgDivisionRepository};
pub mod user_repo;
pub use user_repo::{PgUserRepository, UserRepository};
pub mod goal_repo;
pub use goal_repo::{GoalRepository, PgGoalRepository};
pub mod task_repo;
pub use task_repo::{PgTaskRepository, TaskRepository};

pub mod memory;
pub use memory::MemoryStore;
