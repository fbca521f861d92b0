//! 预览草稿会话
//!
//! 在调用后端生成/提交接口之前，纯客户端编辑的一份发布计划草稿。
//! 每次结构或字段修改之后都会同步重算派生值（合计、跨度、均值、图表投影、章节区间）。

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::charts::ChartProjection;
use crate::status::toggle_preview_executed;
use release_domain::{
    validate_chapters, Clock, DraftId, EditState, GenerateOutcome, PreviewRelease, ReleaseApi,
    ScheduleRequest, ScheduleSettings, SubmitMode, PAGES_KEY,
};
use release_errors::{ReleaseError, ReleaseResult};

/// 草稿的派生合计
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTotals {
    pub entry_count: usize,
    pub total_chapters: i64,
    pub duration_days: i64,
    /// 保留一位小数
    pub average_chapters: String,
}

impl Default for PreviewTotals {
    fn default() -> Self {
        Self {
            entry_count: 0,
            total_chapters: 0,
            duration_days: 0,
            average_chapters: "0.0".to_string(),
        }
    }
}

pub struct PreviewSession {
    book_id: String,
    settings: ScheduleSettings,
    entries: Vec<PreviewRelease>,
    api: Arc<dyn ReleaseApi>,
    clock: Arc<dyn Clock>,
    next_seq: u64,
    totals: PreviewTotals,
    chart: ChartProjection,
}

impl PreviewSession {
    pub fn new(
        book_id: impl Into<String>,
        settings: ScheduleSettings,
        api: Arc<dyn ReleaseApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            settings,
            entries: Vec::new(),
            api,
            clock,
            next_seq: 0,
            totals: PreviewTotals::default(),
            chart: ChartProjection::default(),
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ScheduleSettings) {
        self.settings = settings;
        self.recompute();
    }

    pub fn entries(&self) -> &[PreviewRelease] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> ReleaseResult<&PreviewRelease> {
        let len = self.entries.len();
        self.entries
            .get(index)
            .ok_or(ReleaseError::InvalidIndex { index, len })
    }

    fn entry_mut(&mut self, index: usize) -> ReleaseResult<&mut PreviewRelease> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or(ReleaseError::InvalidIndex { index, len })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn totals(&self) -> &PreviewTotals {
        &self.totals
    }

    pub fn chart(&self) -> &ChartProjection {
        &self.chart
    }

    /// 剩余待分配章节；为负表示已超额
    pub fn surplus(&self) -> i64 {
        self.settings.amount_of_chapters - self.totals.total_chapters
    }

    fn next_draft_id(&mut self) -> DraftId {
        self.next_seq += 1;
        DraftId(format!("draft-{}-{}", self.clock.now_millis(), self.next_seq))
    }

    /// 追加一条草稿，返回其下标
    pub fn add_entry(&mut self) -> usize {
        let (target_id, date) = match self.entries.last() {
            None => (None, self.clock.today()),
            Some(last) => {
                let date = last
                    .date
                    .map(|d| d + Duration::days(self.settings.day_threshold))
                    .unwrap_or_else(|| self.clock.today());
                (last.target_id.clone(), date)
            }
        };

        let draft_id = self.next_draft_id();
        debug!("新增草稿条目 {} 日期 {}", draft_id, date);
        self.entries
            .push(PreviewRelease::new(draft_id, target_id, Some(date)));
        self.recompute();
        self.entries.len() - 1
    }

    /// 删除后后续下标前移，不重新编号
    pub fn remove_entry(&mut self, index: usize) -> ReleaseResult<PreviewRelease> {
        self.entry(index)?;
        let removed = self.entries.remove(index);
        self.recompute();
        Ok(removed)
    }

    /// 在源条目之后插入副本：新草稿id，状态重置为 DRAFT，界面暂存清空
    pub fn duplicate_entry(&mut self, index: usize) -> ReleaseResult<usize> {
        let mut copy = self.entry(index)?.clone();
        copy.draft_id = self.next_draft_id();
        copy.status = Default::default();
        copy.ui = EditState::default();
        self.entries.insert(index + 1, copy);
        self.recompute();
        Ok(index + 1)
    }

    /// 把剩余章节追加为一条新草稿，返回剩余值
    ///
    /// 剩余为 0 时不追加；为负时报错且不修改草稿，保证章节数恒为正。
    pub fn spread_remaining(&mut self) -> ReleaseResult<i64> {
        let surplus = self.surplus();
        if surplus == 0 {
            debug!("没有剩余章节需要分配");
            return Ok(0);
        }
        if surplus < 0 {
            warn!("草稿章节超出目标 {} 章", -surplus);
            return Err(ReleaseError::validation_error(format!(
                "草稿章节已超出目标 {} 章",
                -surplus
            )));
        }

        let chapters = i32::try_from(surplus).map_err(|_| {
            ReleaseError::validation_error(format!("剩余章节数过大: {surplus}"))
        })?;
        let index = self.add_entry();
        self.entries[index].chapters = chapters;
        self.recompute();
        Ok(surplus)
    }

    /// 重算全部派生值，幂等
    pub fn recompute(&mut self) {
        self.recompute_metadata_pages();

        let total_chapters: i64 = self.entries.iter().map(|e| i64::from(e.chapters)).sum();
        let dates: Vec<NaiveDate> = self.entries.iter().filter_map(|e| e.date).collect();
        let duration_days = match (dates.iter().min(), dates.iter().max()) {
            (Some(min), Some(max)) => (*max - *min).num_days(),
            _ => 0,
        };
        let average_chapters = if self.entries.is_empty() {
            "0.0".to_string()
        } else {
            format!("{:.1}", total_chapters as f64 / self.entries.len() as f64)
        };

        self.totals = PreviewTotals {
            entry_count: self.entries.len(),
            total_chapters,
            duration_days,
            average_chapters,
        };
        self.chart = ChartProjection::from_points(
            self.entries
                .iter()
                .filter_map(|e| e.date.map(|date| (date, e.chapters))),
        );
    }

    /// 按时间顺序为每条草稿写入其覆盖的章节区间 `pages`，从 1 开始；无日期条目排在最后
    pub fn recompute_metadata_pages(&mut self) {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by_key(|&i| (self.entries[i].date.is_none(), self.entries[i].date));

        let mut start: i64 = 1;
        for index in order {
            let entry = &mut self.entries[index];
            let chapters = i64::from(entry.chapters.max(0));
            let end = start + chapters - 1;
            entry
                .metadata
                .insert(PAGES_KEY.to_string(), format!("{start}-{end}"));
            start += chapters;
        }
    }

    /// 以某个已有目标的发布作为草稿起点；丢弃 `id` 和 `target_id`，替换当前草稿
    pub async fn copy_from_existing_target(&mut self, target_id: &str) -> ReleaseResult<usize> {
        let releases = self.api.fetch_target_releases(target_id).await?;

        let mut entries = Vec::with_capacity(releases.len());
        for release in releases {
            let draft_id = self.next_draft_id();
            let mut entry = PreviewRelease::from_release(draft_id, release.normalized());
            entry.target_id = None;
            entries.push(entry);
        }

        info!("从目标 {} 复制了 {} 条发布到草稿", target_id, entries.len());
        self.entries = entries;
        self.recompute();
        Ok(self.entries.len())
    }

    /// 提交草稿
    ///
    /// 预览模式用服务端返回的计划整体替换草稿；提交模式成功后清空草稿。
    /// 失败时草稿保持不变。
    pub async fn submit(
        &mut self,
        mode: SubmitMode,
        action_types: &[String],
    ) -> ReleaseResult<GenerateOutcome> {
        self.settings.validate(action_types)?;
        let releases = self
            .entries
            .iter()
            .map(PreviewRelease::to_release)
            .collect::<ReleaseResult<Vec<_>>>()?;
        let request = ScheduleRequest {
            settings: self.settings.clone(),
            releases,
        };

        let outcome = self
            .api
            .generate_release(&self.book_id, &request, mode.is_preview())
            .await?;

        match (mode, &outcome) {
            (SubmitMode::Preview, GenerateOutcome::Simulated(releases)) => {
                let mut entries = Vec::with_capacity(releases.len());
                for release in releases.iter().cloned() {
                    let draft_id = self.next_draft_id();
                    entries.push(PreviewRelease::from_release(draft_id, release.normalized()));
                }
                info!("服务端预览返回 {} 条发布", entries.len());
                self.entries = entries;
            }
            (SubmitMode::Preview, GenerateOutcome::Committed) => {
                warn!("预览请求没有返回模拟计划，草稿保持不变");
            }
            (SubmitMode::Commit, _) => {
                info!("发布计划已提交，丢弃 {} 条草稿", self.entries.len());
                self.entries.clear();
            }
        }
        self.recompute();
        Ok(outcome)
    }

    pub fn set_chapters(&mut self, index: usize, chapters: i32) -> ReleaseResult<()> {
        validate_chapters(chapters)?;
        self.entry_mut(index)?.chapters = chapters;
        self.recompute();
        Ok(())
    }

    /// 解析 `YYYY-MM-DD`；空串或无法解析时清空日期
    pub fn set_date(&mut self, index: usize, raw: &str) -> ReleaseResult<Option<NaiveDate>> {
        let raw = raw.trim();
        let date = if raw.is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(e) => {
                    warn!("无法解析草稿日期 {:?}: {}", raw, e);
                    None
                }
            }
        };
        self.entry_mut(index)?.date = date;
        self.recompute();
        Ok(date)
    }

    pub fn set_target(&mut self, index: usize, target_id: Option<String>) -> ReleaseResult<()> {
        self.entry_mut(index)?.target_id = target_id.filter(|t| !t.trim().is_empty());
        Ok(())
    }

    pub fn toggle_executed(&mut self, index: usize) -> ReleaseResult<()> {
        toggle_preview_executed(self.entry_mut(index)?);
        Ok(())
    }

    pub fn set_metadata(
        &mut self,
        index: usize,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> ReleaseResult<()> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ReleaseError::validation_error("metadata 键不能为空"));
        }
        self.entry_mut(index)?.metadata.insert(key, value.into());
        self.recompute();
        Ok(())
    }

    pub fn remove_metadata(&mut self, index: usize, key: &str) -> ReleaseResult<Option<String>> {
        let removed = self.entry_mut(index)?.metadata.remove(key);
        self.recompute();
        Ok(removed)
    }

    pub fn toggle_metadata_panel(&mut self, index: usize) -> ReleaseResult<bool> {
        let entry = self.entry_mut(index)?;
        entry.ui.show_metadata = !entry.ui.show_metadata;
        Ok(entry.ui.show_metadata)
    }

    /// 更新待添加的 metadata 输入缓冲
    pub fn set_pending_metadata(
        &mut self,
        index: usize,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> ReleaseResult<()> {
        let entry = self.entry_mut(index)?;
        entry.ui.pending_key = key.into();
        entry.ui.pending_value = value.into();
        Ok(())
    }

    /// 把输入缓冲写入 metadata 并清空缓冲
    pub fn commit_pending_metadata(&mut self, index: usize) -> ReleaseResult<()> {
        let entry = self.entry_mut(index)?;
        let key = std::mem::take(&mut entry.ui.pending_key);
        let value = std::mem::take(&mut entry.ui.pending_value);
        self.set_metadata(index, key, value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recompute();
    }
}

impl std::fmt::Debug for PreviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSession")
            .field("book_id", &self.book_id)
            .field("entries", &self.entries.len())
            .field("totals", &self.totals)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use release_testing_utils::{FixedClock, MockReleaseApi, ReleaseBuilder, ScheduleSettingsBuilder};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn session_with(api: MockReleaseApi, amount: i64) -> PreviewSession {
        let settings = ScheduleSettingsBuilder::new()
            .with_amount_of_chapters(amount)
            .with_day_threshold(3)
            .build();
        PreviewSession::new(
            "book-1",
            settings,
            Arc::new(api),
            Arc::new(FixedClock::on(date("2024-01-10"))),
        )
    }

    fn session(amount: i64) -> PreviewSession {
        session_with(MockReleaseApi::new(), amount)
    }

    #[test]
    fn test_add_entry_defaults() {
        let mut session = session(10);
        let first = session.add_entry();
        assert_eq!(first, 0);
        let entry = session.entry(0).unwrap();
        assert_eq!(entry.date, Some(date("2024-01-10")));
        assert_eq!(entry.target_id, None);
        assert_eq!(entry.chapters, 1);

        session.set_target(0, Some("A".to_string())).unwrap();
        session.add_entry();
        let second = session.entry(1).unwrap();
        assert_eq!(second.date, Some(date("2024-01-13")));
        assert_eq!(second.target_id.as_deref(), Some("A"));
        assert_ne!(second.draft_id, session.entry(0).unwrap().draft_id);
    }

    #[test]
    fn test_add_entry_after_undated_entry_uses_today() {
        let mut session = session(10);
        session.add_entry();
        session.set_date(0, "").unwrap();
        session.add_entry();
        assert_eq!(session.entry(1).unwrap().date, Some(date("2024-01-10")));
    }

    #[test]
    fn test_spread_remaining_reaches_target() {
        let mut session = session(20);
        session.add_entry();
        session.set_chapters(0, 5).unwrap();

        assert_eq!(session.spread_remaining().unwrap(), 15);
        assert_eq!(session.len(), 2);
        assert_eq!(session.entry(1).unwrap().chapters, 15);
        assert_eq!(session.totals().total_chapters, 20);

        assert_eq!(session.spread_remaining().unwrap(), 0);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_spread_remaining_over_allocated_is_rejected() {
        let mut session = session(4);
        session.add_entry();
        session.set_chapters(0, 6).unwrap();

        assert!(session.spread_remaining().is_err());
        assert_eq!(session.len(), 1);
        assert_eq!(session.surplus(), -2);
        assert!(session.entries().iter().all(|e| e.chapters > 0));
    }

    #[test]
    fn test_chapters_must_stay_positive() {
        let mut session = session(10);
        session.add_entry();
        assert!(session.set_chapters(0, 0).is_err());
        assert!(session.set_chapters(0, -5).is_err());
        assert_eq!(session.entry(0).unwrap().chapters, 1);
        assert!(matches!(
            session.set_chapters(4, 2),
            Err(ReleaseError::InvalidIndex { index: 4, len: 1 })
        ));
    }

    #[test]
    fn test_duplicate_then_remove_restores_content() {
        let mut session = session(10);
        session.add_entry();
        session.add_entry();
        session.set_chapters(0, 4).unwrap();
        session.set_metadata(0, "note", "first").unwrap();
        session.toggle_executed(0).unwrap();
        session.toggle_metadata_panel(0).unwrap();

        let before: Vec<_> = session
            .entries()
            .iter()
            .map(|e| (e.date, e.chapters, e.status, e.metadata.clone()))
            .collect();

        let copy = session.duplicate_entry(0).unwrap();
        assert_eq!(copy, 1);
        let duplicated = session.entry(1).unwrap();
        assert_eq!(duplicated.chapters, 4);
        assert_eq!(duplicated.status, Default::default());
        assert!(!duplicated.ui.show_metadata);
        assert_ne!(duplicated.draft_id, session.entry(0).unwrap().draft_id);

        session.remove_entry(1).unwrap();
        let after: Vec<_> = session
            .entries()
            .iter()
            .map(|e| (e.date, e.chapters, e.status, e.metadata.clone()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_derived_totals() {
        let mut session = session(10);
        assert_eq!(session.totals().average_chapters, "0.0");
        assert_eq!(session.totals().duration_days, 0);

        session.add_entry();
        session.add_entry();
        session.add_entry();
        session.set_chapters(0, 2).unwrap();
        session.set_chapters(1, 2).unwrap();
        session.set_chapters(2, 3).unwrap();

        let totals = session.totals();
        assert_eq!(totals.total_chapters, 7);
        assert_eq!(totals.duration_days, 6);
        assert_eq!(totals.average_chapters, "2.3");
        assert_eq!(session.chart().values, vec![2, 2, 3]);
        assert_eq!(session.chart().labels[0], "January 10, 2024");
    }

    #[test]
    fn test_chart_skips_undated_and_is_chronological() {
        let mut session = session(10);
        session.add_entry();
        session.add_entry();
        session.add_entry();
        session.set_date(0, "2024-02-01").unwrap();
        session.set_date(1, "not-a-date").unwrap();

        assert_eq!(session.entry(1).unwrap().date, None);
        assert_eq!(session.chart().len(), 2);
        assert_eq!(session.chart().labels, vec!["January 16, 2024", "February 1, 2024"]);
    }

    #[test]
    fn test_metadata_pages_follow_chronological_order() {
        let mut session = session(10);
        session.add_entry();
        session.add_entry();
        session.set_chapters(0, 3).unwrap();
        session.set_chapters(1, 2).unwrap();
        session.set_date(0, "2024-03-01").unwrap();

        assert_eq!(session.entry(1).unwrap().pages(), Some("1-2"));
        assert_eq!(session.entry(0).unwrap().pages(), Some("3-5"));

        session.set_metadata(0, PAGES_KEY, "manual").unwrap();
        assert_eq!(session.entry(0).unwrap().pages(), Some("3-5"));
    }

    #[test]
    fn test_pending_metadata_buffer() {
        let mut session = session(10);
        session.add_entry();
        session.set_pending_metadata(0, "lang", "en").unwrap();
        session.commit_pending_metadata(0).unwrap();

        let entry = session.entry(0).unwrap();
        assert_eq!(entry.metadata.get("lang").map(String::as_str), Some("en"));
        assert!(entry.ui.pending_key.is_empty());

        assert_eq!(session.remove_metadata(0, "lang").unwrap().as_deref(), Some("en"));
        session.set_pending_metadata(0, " ", "x").unwrap();
        assert!(session.commit_pending_metadata(0).is_err());
    }

    #[tokio::test]
    async fn test_copy_from_existing_target_strips_identity() {
        let api = MockReleaseApi::new();
        api.set_target_releases(
            "t-1",
            vec![
                ReleaseBuilder::new()
                    .with_id("r-1")
                    .with_target("t-1")
                    .with_date("2024-01-01")
                    .with_chapters(4)
                    .build(),
                ReleaseBuilder::new()
                    .with_id("r-2")
                    .with_target("t-1")
                    .with_date("2024-01-05")
                    .with_chapters(6)
                    .executed()
                    .build(),
            ],
        );
        let mut session = session_with(api, 10);
        session.add_entry();

        let copied = session.copy_from_existing_target("t-1").await.unwrap();
        assert_eq!(copied, 2);
        assert!(session.entries().iter().all(|e| e.target_id.is_none()));
        assert_eq!(session.totals().total_chapters, 10);

        let payload = session.entry(0).unwrap().to_release().unwrap();
        assert!(payload.id.is_none());
    }

    #[tokio::test]
    async fn test_submit_preview_replaces_draft() {
        let api = MockReleaseApi::new();
        api.set_simulated_plan(vec![
            ReleaseBuilder::new().with_date("2024-02-01").with_chapters(7).build(),
            ReleaseBuilder::new().with_date("2024-02-05").with_chapters(8).build(),
            ReleaseBuilder::new().with_date("2024-02-09").with_chapters(5).build(),
        ]);
        let mut session = session_with(api.clone(), 20);
        session.add_entry();

        let outcome = session.submit(SubmitMode::Preview, &[]).await.unwrap();
        assert!(matches!(outcome, GenerateOutcome::Simulated(ref r) if r.len() == 3));
        assert_eq!(session.len(), 3);
        assert_eq!(session.totals().total_chapters, 20);
        assert_eq!(api.generate_calls(), vec![true]);
        assert!(api.releases().is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_undated_entries_and_invalid_settings() {
        let mut session = session(10);
        session.add_entry();
        session.set_date(0, "").unwrap();
        assert!(session.submit(SubmitMode::Commit, &[]).await.is_err());
        assert_eq!(session.len(), 1);

        let mut invalid = session_with(MockReleaseApi::new(), 0);
        assert!(invalid.submit(SubmitMode::Preview, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_draft() {
        let api = MockReleaseApi::new();
        api.fail_next(ReleaseError::validation_error("dayThreshold too small"));
        let mut session = session_with(api, 10);
        session.add_entry();
        session.set_chapters(0, 4).unwrap();

        let err = session.submit(SubmitMode::Commit, &[]).await.unwrap_err();
        assert_eq!(err.user_message(), "dayThreshold too small");
        assert_eq!(session.len(), 1);
        assert_eq!(session.entry(0).unwrap().chapters, 4);
    }
}
