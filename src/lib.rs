pub mod app;
pub mod plan;
pub mod render;

pub use app::Application;
pub use plan::PreviewPlan;
