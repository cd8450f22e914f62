mod app;
mod catalog;
mod client;
mod delivery;
mod export;
mod form;
mod history;
mod logging;
mod output;

pub use app::{ConsoleApp, dispatch};
pub use catalog::Catalog;
pub use client::ApiClient;
pub use delivery::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_PUSH_PORT, DeliveryConfig, DeliveryMode, OutputSession,
    start_session,
};
pub use export::{EXPORT_FILENAME, export_log, export_log_to};
pub use form::{FormField, ParamForm};
pub use history::{History, HistoryEntry};
pub use logging::init as init_logging;
pub use output::{OutputPane, SharedPane};
