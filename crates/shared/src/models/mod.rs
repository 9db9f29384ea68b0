pub mod api;
pub mod task;
pub mod timestamp;
pub mod user;

pub use task::Task;
pub use user::User;
