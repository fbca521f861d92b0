//! Mock implementations for all domain ports
//!
//! 内存实现，单元测试无需启动真实的后端服务。

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use release_domain::{
    Clock, GenerateOutcome, Notice, NoticeLevel, Notifier, Release, ReleaseApi, ScheduleRequest,
    StateStore,
};
use release_errors::{ReleaseError, ReleaseResult};

/// 可重复注入的失败类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    Network,
    NotFound,
    Validation(String),
}

impl MockFailure {
    fn to_error(&self, id: &str) -> ReleaseError {
        match self {
            MockFailure::Network => ReleaseError::network("connection refused"),
            MockFailure::NotFound => ReleaseError::release_not_found(id),
            MockFailure::Validation(message) => ReleaseError::validation_error(message.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct MockBackend {
    releases: Vec<Release>,
    target_releases: HashMap<String, Vec<Release>>,
    targets: HashMap<String, bool>,
    simulated_plan: Vec<Release>,
    action_types: Vec<String>,
    next_failures: VecDeque<ReleaseError>,
    failing_ids: HashMap<String, MockFailure>,
    calls: Vec<String>,
    generate_calls: Vec<bool>,
    generate_requests: Vec<ScheduleRequest>,
    next_id: u64,
}

impl MockBackend {
    fn check(&mut self, call: String, id: &str) -> ReleaseResult<()> {
        self.calls.push(call);
        if let Some(failure) = self.failing_ids.get(id) {
            return Err(failure.to_error(id));
        }
        match self.next_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn position(&self, id: &str) -> ReleaseResult<usize> {
        self.releases
            .iter()
            .position(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| ReleaseError::release_not_found(id))
    }
}

/// Mock implementation of ReleaseApi for testing
///
/// 克隆共享同一份后端状态，测试可以在交给引擎之后继续检查调用记录。
#[derive(Debug, Clone, Default)]
pub struct MockReleaseApi {
    backend: Arc<Mutex<MockBackend>>,
}

impl MockReleaseApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_releases(releases: Vec<Release>) -> Self {
        let api = Self::new();
        api.backend.lock().unwrap().releases = releases;
        api
    }

    pub fn set_releases(&self, releases: Vec<Release>) {
        self.backend.lock().unwrap().releases = releases;
    }

    pub fn set_target_releases(&self, target_id: &str, releases: Vec<Release>) {
        self.backend
            .lock()
            .unwrap()
            .target_releases
            .insert(target_id.to_string(), releases);
    }

    pub fn add_target(&self, target_id: &str, enabled: bool) {
        self.backend
            .lock()
            .unwrap()
            .targets
            .insert(target_id.to_string(), enabled);
    }

    pub fn set_simulated_plan(&self, releases: Vec<Release>) {
        self.backend.lock().unwrap().simulated_plan = releases;
    }

    pub fn set_action_types(&self, action_types: &[&str]) {
        self.backend.lock().unwrap().action_types =
            action_types.iter().map(|s| s.to_string()).collect();
    }

    /// 下一次任意调用返回该错误
    pub fn fail_next(&self, err: ReleaseError) {
        self.backend.lock().unwrap().next_failures.push_back(err);
    }

    /// 针对某个id的调用持续失败
    pub fn fail_for(&self, id: &str, failure: MockFailure) {
        self.backend
            .lock()
            .unwrap()
            .failing_ids
            .insert(id.to_string(), failure);
    }

    pub fn clear_failures(&self) {
        let mut backend = self.backend.lock().unwrap();
        backend.next_failures.clear();
        backend.failing_ids.clear();
    }

    pub fn releases(&self) -> Vec<Release> {
        self.backend.lock().unwrap().releases.clone()
    }

    pub fn release(&self, id: &str) -> Option<Release> {
        self.backend
            .lock()
            .unwrap()
            .releases
            .iter()
            .find(|r| r.id.as_deref() == Some(id))
            .cloned()
    }

    pub fn target_enabled(&self, target_id: &str) -> Option<bool> {
        self.backend.lock().unwrap().targets.get(target_id).copied()
    }

    pub fn calls(&self) -> Vec<String> {
        self.backend.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.backend
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// 每次生成请求的 preview 标志
    pub fn generate_calls(&self) -> Vec<bool> {
        self.backend.lock().unwrap().generate_calls.clone()
    }

    pub fn last_generate_request(&self) -> Option<ScheduleRequest> {
        self.backend.lock().unwrap().generate_requests.last().cloned()
    }
}

#[async_trait]
impl ReleaseApi for MockReleaseApi {
    async fn fetch_schedule(&self, book_id: &str) -> ReleaseResult<Vec<Release>> {
        let mut backend = self.backend.lock().unwrap();
        backend.check(format!("fetch_schedule:{book_id}"), book_id)?;
        Ok(backend.releases.clone())
    }

    async fn toggle_executed(&self, release_id: &str) -> ReleaseResult<()> {
        let mut backend = self.backend.lock().unwrap();
        backend.check(format!("toggle_executed:{release_id}"), release_id)?;
        let index = backend.position(release_id)?;
        let release = &mut backend.releases[index];
        release.set_executed(!release.executed);
        Ok(())
    }

    async fn execute_release(&self, release_id: &str) -> ReleaseResult<()> {
        let mut backend = self.backend.lock().unwrap();
        backend.check(format!("execute_release:{release_id}"), release_id)?;
        backend.position(release_id)?;
        Ok(())
    }

    async fn update_release(&self, release: &Release) -> ReleaseResult<()> {
        let id = release.id_str().to_string();
        let mut backend = self.backend.lock().unwrap();
        backend.check(format!("update_release:{id}"), &id)?;
        let index = backend.position(&id)?;
        backend.releases[index] = release.clone();
        Ok(())
    }

    async fn delete_release(&self, release_id: &str) -> ReleaseResult<()> {
        let mut backend = self.backend.lock().unwrap();
        backend.check(format!("delete_release:{release_id}"), release_id)?;
        let index = backend.position(release_id)?;
        backend.releases.remove(index);
        Ok(())
    }

    async fn generate_release(
        &self,
        book_id: &str,
        request: &ScheduleRequest,
        preview: bool,
    ) -> ReleaseResult<GenerateOutcome> {
        let mut backend = self.backend.lock().unwrap();
        backend.check(format!("generate_release:{book_id}:{preview}"), book_id)?;
        backend.generate_calls.push(preview);
        backend.generate_requests.push(request.clone());

        if preview {
            let plan = if backend.simulated_plan.is_empty() {
                request.releases.clone()
            } else {
                backend.simulated_plan.clone()
            };
            return Ok(GenerateOutcome::Simulated(plan));
        }

        for release in &request.releases {
            backend.next_id += 1;
            let mut persisted = release.clone();
            persisted.id = Some(format!("gen-{}", backend.next_id));
            backend.releases.push(persisted);
        }
        Ok(GenerateOutcome::Committed)
    }

    async fn fetch_target_releases(&self, target_id: &str) -> ReleaseResult<Vec<Release>> {
        let mut backend = self.backend.lock().unwrap();
        backend.check(format!("fetch_target_releases:{target_id}"), target_id)?;
        Ok(backend
            .target_releases
            .get(target_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn toggle_target_enabled(&self, target_id: &str) -> ReleaseResult<()> {
        let mut backend = self.backend.lock().unwrap();
        backend.check(format!("toggle_target_enabled:{target_id}"), target_id)?;
        match backend.targets.get_mut(target_id) {
            Some(enabled) => {
                *enabled = !*enabled;
                Ok(())
            }
            None => Err(ReleaseError::target_not_found(target_id)),
        }
    }

    async fn fetch_action_types(&self) -> ReleaseResult<Vec<String>> {
        let mut backend = self.backend.lock().unwrap();
        backend.check("fetch_action_types".to_string(), "")?;
        Ok(backend.action_types.clone())
    }
}

/// Mock implementation of StateStore for testing
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    broken: Arc<Mutex<bool>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// 之后的读写全部返回存储错误
    pub fn break_storage(&self) {
        *self.broken.lock().unwrap() = true;
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> ReleaseResult<Option<String>> {
        if *self.broken.lock().unwrap() {
            return Err(ReleaseError::storage_error("storage unavailable"));
        }
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ReleaseResult<()> {
        if *self.broken.lock().unwrap() {
            return Err(ReleaseError::storage_error("storage unavailable"));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 记录所有提示，便于断言
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().unwrap().last().cloned()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// 固定日期的时钟，可在测试中推进
#[derive(Debug, Clone)]
pub struct FixedClock {
    today: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    pub fn on(today: NaiveDate) -> Self {
        Self {
            today: Arc::new(Mutex::new(today)),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap() = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap()
    }

    fn now_millis(&self) -> i64 {
        self.today()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default()
    }
}
