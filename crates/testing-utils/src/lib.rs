//! # Release Testing Utils
//!
//! 工作区共享的测试工具：
//!
//! - **Mock 端口**: `ReleaseApi`、`StateStore`、`Notifier`、`Clock` 的内存实现
//! - **数据构建器**: `Release`、`ScheduleSettings` 的 builder
//! - **辅助函数**: 日期解析和常用样例数据
//!
//! ```toml
//! [dev-dependencies]
//! release-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
