mod catalog;
mod execution;
mod server;

pub use catalog::discover_modules;
pub use execution::{ExecutionStore, OutputSubscription, spawn_module_run};
pub use server::{ServerConfig, ServerState, build_api_app, build_push_app};
