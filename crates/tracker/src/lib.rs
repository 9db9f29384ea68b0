mod api;
mod store;

pub use api::server::{configure_app, start_server, AppState, DEFAULT_PAYLOAD_LIMIT};
pub use store::core::StoreContext;
