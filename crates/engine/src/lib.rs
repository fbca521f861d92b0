//! 发布计划聚合与预览引擎
//!
//! - `status`: 两阶段状态命令
//! - `filtering` / `pivot` / `charts`: 由规范列表推导视图的纯函数
//! - `preview`: 客户端草稿会话
//! - `facade`: 按书籍聚合以上能力的门面
//! - `debounce`: 搜索输入防抖

pub mod charts;
pub mod debounce;
pub mod facade;
pub mod filtering;
pub mod pivot;
pub mod presentation;
pub mod preview;
pub mod status;

pub use charts::{ChartProjection, CombinedChart, CombinedDataset, TargetGroup};
pub use debounce::Debouncer;
pub use facade::{
    BulkReport, Collaborators, DerivedViews, ScheduleFacade, FILTERS_KEY,
    MANAGEMENT_COLLAPSED_KEY,
};
pub use filtering::TargetOption;
pub use pivot::{PivotRow, PivotTable, PivotTotals};
pub use presentation::{format_percent, DateUrgency, ExecutionGrade};
pub use preview::{PreviewSession, PreviewTotals};
pub use status::Command;
