pub mod api_client;
pub mod app_config;
pub mod logging;
pub mod schedule;
pub mod storage;

pub use api_client::*;
pub use app_config::*;
pub use logging::*;
pub use schedule::*;
pub use storage::*;
