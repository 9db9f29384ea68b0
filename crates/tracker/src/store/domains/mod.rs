pub(crate) mod task_store;
pub(crate) mod user_store;
