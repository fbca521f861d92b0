//! 发布计划引擎的外部适配器
//!
//! - [`HttpReleaseApi`]: 基于 reqwest 的后端接口客户端
//! - [`FileStateStore`]: JSON 文件实现的本地键值存储
//! - [`TracingNotifier`]: 输出到日志的用户提示
//! - [`init_logging`]: tracing 订阅器初始化

pub mod http_client;
pub mod logging;
pub mod notifier;
pub mod state_store;

pub use http_client::HttpReleaseApi;
pub use logging::init_logging;
pub use notifier::TracingNotifier;
pub use state_store::FileStateStore;
