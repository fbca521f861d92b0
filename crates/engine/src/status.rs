//! 发布状态机
//!
//! 每个会改变规范列表的动作都建模为两阶段命令：先 `apply` 乐观修改本地状态，
//! 后端确认失败时 `revert` 恢复到修改前的快照。

use chrono::NaiveDate;
use tracing::debug;

use release_domain::{validate_chapters, PreviewRelease, Release, ReleaseStatus, ReleaseTarget};
use release_errors::{ReleaseError, ReleaseResult};

/// 可回滚的状态修改
pub trait Command<S: ?Sized> {
    /// 命令作用的实体id
    fn subject(&self) -> &str;
    fn apply(&mut self, state: &mut S) -> ReleaseResult<()>;
    fn revert(&mut self, state: &mut S);
}

#[derive(Debug, Clone)]
struct Snapshot<T> {
    index: usize,
    value: T,
}

fn position(releases: &[Release], release_id: &str) -> ReleaseResult<usize> {
    releases
        .iter()
        .position(|r| r.id.as_deref() == Some(release_id))
        .ok_or_else(|| ReleaseError::release_not_found(release_id))
}

/// 按id写回快照；实体已被移除时插回原位置
fn restore(releases: &mut Vec<Release>, snapshot: Snapshot<Release>) {
    let id = snapshot.value.id.clone();
    match releases.iter().position(|r| r.id == id) {
        Some(index) => releases[index] = snapshot.value,
        None => {
            let index = snapshot.index.min(releases.len());
            releases.insert(index, snapshot.value);
        }
    }
}

/// 设置执行标志；状态由标志推导
#[derive(Debug, Clone)]
pub struct SetExecuted {
    release_id: String,
    executed: bool,
    snapshot: Option<Snapshot<Release>>,
}

impl SetExecuted {
    pub fn new(release_id: impl Into<String>, executed: bool) -> Self {
        Self {
            release_id: release_id.into(),
            executed,
            snapshot: None,
        }
    }

    pub fn executed(release_id: impl Into<String>) -> Self {
        Self::new(release_id, true)
    }

    pub fn pending(release_id: impl Into<String>) -> Self {
        Self::new(release_id, false)
    }
}

impl Command<Vec<Release>> for SetExecuted {
    fn subject(&self) -> &str {
        &self.release_id
    }

    fn apply(&mut self, releases: &mut Vec<Release>) -> ReleaseResult<()> {
        let index = position(releases, &self.release_id)?;
        self.snapshot = Some(Snapshot {
            index,
            value: releases[index].clone(),
        });
        releases[index].set_executed(self.executed);
        debug!(
            "发布 {} 标记为 {}",
            self.release_id,
            ReleaseStatus::from_executed(self.executed)
        );
        Ok(())
    }

    fn revert(&mut self, releases: &mut Vec<Release>) {
        if let Some(snapshot) = self.snapshot.take() {
            restore(releases, snapshot);
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoveRelease {
    release_id: String,
    snapshot: Option<Snapshot<Release>>,
}

impl RemoveRelease {
    pub fn new(release_id: impl Into<String>) -> Self {
        Self {
            release_id: release_id.into(),
            snapshot: None,
        }
    }
}

impl Command<Vec<Release>> for RemoveRelease {
    fn subject(&self) -> &str {
        &self.release_id
    }

    fn apply(&mut self, releases: &mut Vec<Release>) -> ReleaseResult<()> {
        let index = position(releases, &self.release_id)?;
        let value = releases.remove(index);
        self.snapshot = Some(Snapshot { index, value });
        Ok(())
    }

    fn revert(&mut self, releases: &mut Vec<Release>) {
        if let Some(snapshot) = self.snapshot.take() {
            restore(releases, snapshot);
        }
    }
}

/// 编辑保存：替换日期和章节数并清理编辑缓冲
#[derive(Debug, Clone)]
pub struct UpdateFields {
    release_id: String,
    date: NaiveDate,
    chapters: i32,
    snapshot: Option<Snapshot<Release>>,
}

impl UpdateFields {
    pub fn new(release_id: impl Into<String>, date: NaiveDate, chapters: i32) -> Self {
        Self {
            release_id: release_id.into(),
            date,
            chapters,
            snapshot: None,
        }
    }
}

impl Command<Vec<Release>> for UpdateFields {
    fn subject(&self) -> &str {
        &self.release_id
    }

    fn apply(&mut self, releases: &mut Vec<Release>) -> ReleaseResult<()> {
        validate_chapters(self.chapters)?;
        let index = position(releases, &self.release_id)?;
        self.snapshot = Some(Snapshot {
            index,
            value: releases[index].clone(),
        });
        let release = &mut releases[index];
        release.date = self.date;
        release.chapters = self.chapters;
        release.ui.editing = false;
        release.ui.edit_data = None;
        Ok(())
    }

    fn revert(&mut self, releases: &mut Vec<Release>) {
        if let Some(snapshot) = self.snapshot.take() {
            restore(releases, snapshot);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToggleTargetEnabled {
    target_id: String,
    previous: Option<bool>,
}

impl ToggleTargetEnabled {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            previous: None,
        }
    }
}

impl Command<Vec<ReleaseTarget>> for ToggleTargetEnabled {
    fn subject(&self) -> &str {
        &self.target_id
    }

    fn apply(&mut self, targets: &mut Vec<ReleaseTarget>) -> ReleaseResult<()> {
        let target = targets
            .iter_mut()
            .find(|t| t.id == self.target_id)
            .ok_or_else(|| ReleaseError::target_not_found(&self.target_id))?;
        self.previous = Some(target.enabled);
        target.enabled = !target.enabled;
        Ok(())
    }

    fn revert(&mut self, targets: &mut Vec<ReleaseTarget>) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        if let Some(target) = targets.iter_mut().find(|t| t.id == self.target_id) {
            target.enabled = previous;
        }
    }
}

/// 仅本地的执行标志翻转，不访问后端
pub fn toggle_executed(release: &mut Release) {
    release.set_executed(!release.executed);
}

/// 草稿条目的本地翻转；MANUAL_ACTION_REQUIRED 视为未执行
pub fn toggle_preview_executed(entry: &mut PreviewRelease) {
    entry.status = ReleaseStatus::from_executed(!entry.is_executed());
}
