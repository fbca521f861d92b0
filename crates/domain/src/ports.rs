//! 领域端口
//!
//! 引擎依赖的外部协作者抽象：后端接口、本地键值存储、用户提示和时钟

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::entities::Release;
use crate::value_objects::{GenerateOutcome, Notice, ScheduleRequest};
use release_errors::ReleaseResult;

/// 发布计划后端接口
///
/// 404 统一映射为 `ReleaseNotFound` / `TargetNotFound`，
/// 带 `message` 的错误体映射为 `Validation`，其余失败映射为 `Network`。
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    /// `GET /books/{id}/schedule`
    async fn fetch_schedule(&self, book_id: &str) -> ReleaseResult<Vec<Release>>;
    /// `PATCH /releases/{id}/executed`，服务端翻转执行标志
    async fn toggle_executed(&self, release_id: &str) -> ReleaseResult<()>;
    /// `POST /releases/{id}/execute`
    async fn execute_release(&self, release_id: &str) -> ReleaseResult<()>;
    /// `PUT /releases/{id}`
    async fn update_release(&self, release: &Release) -> ReleaseResult<()>;
    /// `DELETE /releases/{id}`
    async fn delete_release(&self, release_id: &str) -> ReleaseResult<()>;
    /// `POST /books/{id}/generate-release?preview={bool}`
    async fn generate_release(
        &self,
        book_id: &str,
        request: &ScheduleRequest,
        preview: bool,
    ) -> ReleaseResult<GenerateOutcome>;
    /// `GET /release-targets/{id}/releases`
    async fn fetch_target_releases(&self, target_id: &str) -> ReleaseResult<Vec<Release>>;
    /// `PATCH /release-targets/{id}/enabled`
    async fn toggle_target_enabled(&self, target_id: &str) -> ReleaseResult<()>;
    /// `GET /action-types`
    async fn fetch_action_types(&self) -> ReleaseResult<Vec<String>>;
}

/// 持久化的本地键值存储
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> ReleaseResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ReleaseResult<()>;
}

/// 用户可见的短暂提示
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now_millis(&self) -> i64;
}

/// 本地时区的系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
