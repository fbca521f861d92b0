//! 发布计划聚合门面
//!
//! 持有某本书的规范发布列表和当前过滤条件。任何修改列表或过滤条件的方法，
//! 在返回之前都会同步重算全部派生视图（过滤排序视图、分组、透视表、组合图）。

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use crate::charts::{combined_chart, group_by_target, ChartProjection, CombinedChart, TargetGroup};
use crate::filtering::{filtered_view, matches, unique_targets, TargetOption};
use crate::pivot::{build_pivot, PivotTable};
use crate::preview::PreviewSession;
use crate::status::{
    toggle_executed, Command, RemoveRelease, SetExecuted, ToggleTargetEnabled, UpdateFields,
};
use release_domain::{
    validate_chapters, Clock, EditData, FilterPatch, GenerateOutcome, Notice, Notifier, Release,
    ReleaseApi, ReleaseFilters, ReleaseTarget, ScheduleSettings, SortKey, StateStore, SubmitMode,
};
use release_errors::{ReleaseError, ReleaseResult};

/// 过滤条件在本地存储中的键
pub const FILTERS_KEY: &str = "releaseFilters";
/// 管理面板折叠标志在本地存储中的键
pub const MANAGEMENT_COLLAPSED_KEY: &str = "managementCollapsed";

pub const DEFAULT_DAY_THRESHOLD: i64 = 4;

/// 门面依赖的外部协作者
#[derive(Clone)]
pub struct Collaborators {
    pub api: Arc<dyn ReleaseApi>,
    pub store: Arc<dyn StateStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// 由规范列表和过滤条件推导出的只读视图
#[derive(Debug, Clone, Default)]
pub struct DerivedViews {
    pub filtered: Vec<Release>,
    pub groups: Vec<TargetGroup>,
    pub pivot: PivotTable,
    pub unique_targets: Vec<TargetOption>,
    pub combined: CombinedChart,
}

/// 逐条确认的批量执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub confirmed: Vec<String>,
    pub not_found: Vec<String>,
    /// (发布id, 失败原因)
    pub failed: Vec<(String, String)>,
    /// 已执行或缺少id而跳过的条数
    pub skipped: usize,
}

impl BulkReport {
    pub fn is_complete(&self) -> bool {
        self.not_found.is_empty() && self.failed.is_empty()
    }
}

type Initializer = fn(&mut ScheduleFacade);

/// 构造时按顺序执行
const INITIALIZERS: &[(&str, Initializer)] = &[
    ("filters", ScheduleFacade::restore_filters),
    ("management_collapsed", ScheduleFacade::restore_management_collapsed),
    ("views", ScheduleFacade::refresh_views),
];

pub struct ScheduleFacade {
    book_id: String,
    deps: Collaborators,
    day_threshold: i64,
    releases: Vec<Release>,
    targets: Vec<ReleaseTarget>,
    action_types: Vec<String>,
    filters: ReleaseFilters,
    management_collapsed: bool,
    views: DerivedViews,
    preview: Option<PreviewSession>,
}

impl ScheduleFacade {
    pub fn new(book_id: impl Into<String>, deps: Collaborators) -> Self {
        let mut facade = Self {
            book_id: book_id.into(),
            deps,
            day_threshold: DEFAULT_DAY_THRESHOLD,
            releases: Vec::new(),
            targets: Vec::new(),
            action_types: Vec::new(),
            filters: ReleaseFilters::default(),
            management_collapsed: false,
            views: DerivedViews::default(),
            preview: None,
        };
        facade.initialize();
        facade
    }

    pub fn with_day_threshold(mut self, day_threshold: i64) -> Self {
        self.day_threshold = day_threshold;
        self
    }

    fn initialize(&mut self) {
        for (name, init) in INITIALIZERS {
            debug!("执行初始化步骤: {}", name);
            init(self);
        }
    }

    // ---- 本地持久化状态 ----

    /// 缺失或损坏的存储值回退为默认过滤条件，不向外抛错
    fn restore_filters(&mut self) {
        self.filters = match self.deps.store.get(FILTERS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("存储的过滤条件无法解析，使用默认值: {}", e);
                ReleaseFilters::default()
            }),
            Ok(None) => ReleaseFilters::default(),
            Err(e) => {
                warn!("读取过滤条件失败，使用默认值: {}", e);
                ReleaseFilters::default()
            }
        };
    }

    fn persist_filters(&self) {
        let result = serde_json::to_string(&self.filters)
            .map_err(ReleaseError::from)
            .and_then(|raw| self.deps.store.set(FILTERS_KEY, &raw));
        if let Err(e) = result {
            warn!("保存过滤条件失败: {}", e);
        }
    }

    fn restore_management_collapsed(&mut self) {
        self.management_collapsed = match self.deps.store.get(MANAGEMENT_COLLAPSED_KEY) {
            Ok(Some(raw)) => raw.trim() == "true",
            Ok(None) => false,
            Err(e) => {
                warn!("读取管理面板状态失败: {}", e);
                false
            }
        };
    }

    pub fn set_management_collapsed(&mut self, collapsed: bool) {
        self.management_collapsed = collapsed;
        if let Err(e) = self
            .deps
            .store
            .set(MANAGEMENT_COLLAPSED_KEY, if collapsed { "true" } else { "false" })
        {
            warn!("保存管理面板状态失败: {}", e);
        }
    }

    pub fn toggle_management_collapsed(&mut self) -> bool {
        self.set_management_collapsed(!self.management_collapsed);
        self.management_collapsed
    }

    // ---- 派生视图 ----

    /// 重算全部派生视图
    pub fn refresh_views(&mut self) {
        let today = self.deps.clock.today();
        self.views.filtered = filtered_view(&self.releases, &self.filters, today);
        self.views.unique_targets = unique_targets(&self.releases);
        self.views.groups = group_by_target(&self.releases);
        self.recompute_pivot();
        self.views.combined = combined_chart(&self.views.groups);
    }

    /// 透视表基于未过滤的分组
    pub fn recompute_pivot(&mut self) {
        self.views.pivot = build_pivot(&self.views.groups);
    }

    pub fn apply_filters(&mut self, patch: FilterPatch) {
        self.filters.apply(patch);
        self.persist_filters();
        self.refresh_views();
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.apply_filters(FilterPatch::default().with_sort(key));
    }

    pub fn reset_filters(&mut self) {
        self.filters = ReleaseFilters::default();
        self.persist_filters();
        self.refresh_views();
    }

    // ---- 加载 ----

    pub async fn load(&mut self) -> ReleaseResult<usize> {
        match self.deps.api.fetch_schedule(&self.book_id).await {
            Ok(releases) => {
                self.replace_releases(releases);
                info!("书籍 {} 加载了 {} 条发布", self.book_id, self.releases.len());
                Ok(self.releases.len())
            }
            Err(err) => {
                warn!("加载书籍 {} 的发布计划失败: {}", self.book_id, err);
                self.notify_error(&err);
                Err(err)
            }
        }
    }

    pub fn replace_releases(&mut self, releases: Vec<Release>) {
        self.releases = releases.into_iter().map(Release::normalized).collect();
        self.refresh_views();
    }

    pub fn set_targets(&mut self, targets: Vec<ReleaseTarget>) {
        self.targets = targets;
    }

    pub async fn load_action_types(&mut self) -> ReleaseResult<&[String]> {
        match self.deps.api.fetch_action_types().await {
            Ok(action_types) => {
                debug!("加载了 {} 个动作类型", action_types.len());
                self.action_types = action_types;
                Ok(&self.action_types)
            }
            Err(err) => {
                self.notify_error(&err);
                Err(err)
            }
        }
    }

    // ---- 状态流转 ----

    pub async fn mark_executed(&mut self, release_id: &str) -> ReleaseResult<()> {
        self.set_executed_confirmed(release_id, true).await
    }

    pub async fn mark_pending(&mut self, release_id: &str) -> ReleaseResult<()> {
        self.set_executed_confirmed(release_id, false).await
    }

    async fn set_executed_confirmed(&mut self, release_id: &str, executed: bool) -> ReleaseResult<()> {
        let current = match self.release(release_id) {
            Some(release) => release.executed,
            None => return self.report(Err(ReleaseError::release_not_found(release_id)), ""),
        };
        // 后端接口是翻转语义，状态一致时不能再发请求
        if current == executed {
            debug!("发布 {} 已处于目标状态，跳过", release_id);
            return Ok(());
        }

        let api = Arc::clone(&self.deps.api);
        let id = release_id.to_string();
        let result = self
            .run_confirmed(SetExecuted::new(release_id, executed), async move {
                api.toggle_executed(&id).await
            })
            .await;
        let message = if executed {
            "已标记为已执行"
        } else {
            "已标记为待执行"
        };
        self.report(result, message)
    }

    /// 仅本地翻转，不访问后端；返回新的执行标志
    pub fn toggle_executed(&mut self, release_id: &str) -> ReleaseResult<bool> {
        let release = self
            .release_mut(release_id)
            .ok_or_else(|| ReleaseError::release_not_found(release_id))?;
        toggle_executed(release);
        let executed = release.executed;
        self.refresh_views();
        Ok(executed)
    }

    /// 把当前过滤视图中的发布全部标记为已执行，仅修改内存；返回变更条数
    pub fn bulk_execute(&mut self) -> usize {
        let today = self.deps.clock.today();
        let mut changed = 0;
        for release in self
            .releases
            .iter_mut()
            .filter(|r| matches(r, &self.filters, today))
        {
            if release.is_pending() {
                release.set_executed(true);
                changed += 1;
            }
        }
        self.refresh_views();
        info!("批量标记 {} 条发布为已执行", changed);
        self.deps
            .notifier
            .notify(Notice::success(format!("已批量标记 {changed} 条发布为已执行")));
        changed
    }

    /// 逐条向后端确认的批量执行
    ///
    /// 每条独立两阶段提交：失败的条目单独回滚，已成功的条目不回滚。
    pub async fn bulk_execute_confirmed(&mut self) -> BulkReport {
        let mut report = BulkReport::default();
        let candidates: Vec<String> = self
            .views
            .filtered
            .iter()
            .filter(|r| r.is_pending())
            .filter_map(|r| r.id.clone())
            .collect();
        report.skipped = self.views.filtered.len() - candidates.len();

        for release_id in candidates {
            let api = Arc::clone(&self.deps.api);
            let id = release_id.clone();
            let result = self
                .run_confirmed(SetExecuted::executed(release_id.as_str()), async move {
                    api.toggle_executed(&id).await
                })
                .await;
            match result {
                Ok(()) => report.confirmed.push(release_id),
                Err(err) if err.is_not_found() => report.not_found.push(release_id),
                Err(err) => report.failed.push((release_id, err.user_message())),
            }
        }

        if report.is_complete() {
            self.deps.notifier.notify(Notice::success(format!(
                "已批量执行 {} 条发布",
                report.confirmed.len()
            )));
        } else {
            warn!(
                "批量执行部分失败: 成功 {}, 不存在 {}, 失败 {}",
                report.confirmed.len(),
                report.not_found.len(),
                report.failed.len()
            );
            self.deps.notifier.notify(Notice::error(format!(
                "批量执行部分失败: 成功 {} 条，失败 {} 条",
                report.confirmed.len(),
                report.not_found.len() + report.failed.len()
            )));
        }
        report
    }

    /// 把当前过滤视图中未执行的发布整体后移，仅修改内存；返回移动条数
    pub fn shift_pending(&mut self, days: Option<i64>) -> usize {
        let days = days.unwrap_or(self.day_threshold);
        let today = self.deps.clock.today();
        let mut moved = 0;
        for release in self
            .releases
            .iter_mut()
            .filter(|r| r.is_pending() && matches(r, &self.filters, today))
        {
            release.date += Duration::days(days);
            moved += 1;
        }
        self.refresh_views();
        debug!("{} 条待执行发布后移 {} 天", moved, days);
        moved
    }

    pub async fn schedule_execution(&mut self, release_id: &str) -> ReleaseResult<()> {
        if self.release(release_id).is_none() {
            return self.report(Err(ReleaseError::release_not_found(release_id)), "");
        }
        let result = self.deps.api.execute_release(release_id).await;
        if let Err(err) = &result {
            if err.is_not_found() {
                self.releases.retain(|r| r.id.as_deref() != Some(release_id));
                self.refresh_views();
            }
        }
        self.report(result, "已安排执行")
    }

    // ---- 编辑 ----

    pub fn begin_edit(&mut self, release_id: &str) -> ReleaseResult<()> {
        let release = self
            .release_mut(release_id)
            .ok_or_else(|| ReleaseError::release_not_found(release_id))?;
        release.ui.editing = true;
        release.ui.edit_data = Some(EditData {
            date: Some(release.date),
            chapters: release.chapters,
        });
        self.refresh_views();
        Ok(())
    }

    pub fn update_edit(
        &mut self,
        release_id: &str,
        date: Option<NaiveDate>,
        chapters: i32,
    ) -> ReleaseResult<()> {
        let release = self
            .release_mut(release_id)
            .ok_or_else(|| ReleaseError::release_not_found(release_id))?;
        if !release.ui.editing {
            return Err(ReleaseError::validation_error(format!(
                "发布 {release_id} 不在编辑状态"
            )));
        }
        release.ui.edit_data = Some(EditData { date, chapters });
        self.refresh_views();
        Ok(())
    }

    pub fn cancel_edit(&mut self, release_id: &str) -> ReleaseResult<()> {
        let release = self
            .release_mut(release_id)
            .ok_or_else(|| ReleaseError::release_not_found(release_id))?;
        release.ui.editing = false;
        release.ui.edit_data = None;
        self.refresh_views();
        Ok(())
    }

    /// 保存编辑缓冲，通过 `PUT /releases/{id}` 确认
    pub async fn save_edit(&mut self, release_id: &str) -> ReleaseResult<()> {
        let prepared = self.prepare_edit(release_id);
        let (date, chapters, payload) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => return self.report(Err(err), ""),
        };

        let api = Arc::clone(&self.deps.api);
        let result = self
            .run_confirmed(UpdateFields::new(release_id, date, chapters), async move {
                api.update_release(&payload).await
            })
            .await;
        self.report(result, "发布已更新")
    }

    fn prepare_edit(&self, release_id: &str) -> ReleaseResult<(NaiveDate, i32, Release)> {
        let release = self
            .release(release_id)
            .ok_or_else(|| ReleaseError::release_not_found(release_id))?;
        let edit = release
            .ui
            .edit_data
            .as_ref()
            .filter(|_| release.ui.editing)
            .ok_or_else(|| {
                ReleaseError::validation_error(format!("发布 {release_id} 不在编辑状态"))
            })?;
        let date = edit
            .date
            .ok_or_else(|| ReleaseError::validation_error("发布日期不能为空"))?;
        validate_chapters(edit.chapters)?;

        let mut payload = release.clone();
        payload.date = date;
        payload.chapters = edit.chapters;
        payload.ui = Default::default();
        Ok((date, edit.chapters, payload))
    }

    pub async fn delete_release(&mut self, release_id: &str) -> ReleaseResult<()> {
        let api = Arc::clone(&self.deps.api);
        let id = release_id.to_string();
        let result = self
            .run_confirmed(RemoveRelease::new(release_id), async move {
                api.delete_release(&id).await
            })
            .await;
        self.report(result, "发布已删除")
    }

    // ---- 发布目标 ----

    /// 404 时移除该目标及其全部发布
    pub async fn toggle_target_enabled(&mut self, target_id: &str) -> ReleaseResult<()> {
        let mut command = ToggleTargetEnabled::new(target_id);
        if let Err(err) = command.apply(&mut self.targets) {
            return self.report(Err(err), "");
        }

        let result = self.deps.api.toggle_target_enabled(target_id).await;
        if let Err(err) = &result {
            command.revert(&mut self.targets);
            if err.is_not_found() {
                warn!("发布目标 {} 在服务端已不存在，移除其发布", target_id);
                self.targets.retain(|t| t.id != target_id);
                self.releases
                    .retain(|r| r.target_id.as_deref() != Some(target_id));
                self.refresh_views();
            }
        }
        self.report(result, "发布目标状态已更新")
    }

    // ---- 预览会话 ----

    /// 首次使用时创建预览会话；已存在时只更新参数
    pub fn open_preview(&mut self, settings: ScheduleSettings) -> &mut PreviewSession {
        let session = match self.preview.take() {
            Some(mut session) => {
                session.set_settings(settings);
                session
            }
            None => {
                debug!("为书籍 {} 创建预览会话", self.book_id);
                PreviewSession::new(
                    self.book_id.clone(),
                    settings,
                    Arc::clone(&self.deps.api),
                    Arc::clone(&self.deps.clock),
                )
            }
        };
        self.preview.insert(session)
    }

    pub fn preview(&self) -> Option<&PreviewSession> {
        self.preview.as_ref()
    }

    pub fn preview_mut(&mut self) -> Option<&mut PreviewSession> {
        self.preview.as_mut()
    }

    /// 结束编辑会话并丢弃草稿
    pub fn close_preview(&mut self) -> Option<PreviewSession> {
        let session = self.preview.take();
        if session.is_some() {
            debug!("预览会话已关闭");
        }
        session
    }

    /// 提交预览草稿；提交模式成功后关闭会话并重新加载规范列表
    pub async fn submit_preview(&mut self, mode: SubmitMode) -> ReleaseResult<GenerateOutcome> {
        let action_types = self.action_types.clone();
        let Some(session) = self.preview.as_mut() else {
            let err = ReleaseError::validation_error("没有进行中的预览会话");
            self.notify_error(&err);
            return Err(err);
        };

        let outcome = match session.submit(mode, &action_types).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.notify_error(&err);
                return Err(err);
            }
        };

        match mode {
            SubmitMode::Preview => {
                self.deps.notifier.notify(Notice::success("预览已更新"));
            }
            SubmitMode::Commit => {
                self.close_preview();
                self.deps.notifier.notify(Notice::success("发布计划已生成"));
                if let Err(err) = self.load().await {
                    warn!("提交后重新加载失败: {}", err);
                }
            }
        }
        Ok(outcome)
    }

    // ---- 查询 ----

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn release(&self, release_id: &str) -> Option<&Release> {
        self.releases
            .iter()
            .find(|r| r.id.as_deref() == Some(release_id))
    }

    fn release_mut(&mut self, release_id: &str) -> Option<&mut Release> {
        self.releases
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(release_id))
    }

    pub fn filters(&self) -> &ReleaseFilters {
        &self.filters
    }

    pub fn views(&self) -> &DerivedViews {
        &self.views
    }

    pub fn filtered_releases(&self) -> &[Release] {
        &self.views.filtered
    }

    pub fn pivot(&self) -> &PivotTable {
        &self.views.pivot
    }

    pub fn target_groups(&self) -> &[TargetGroup] {
        &self.views.groups
    }

    pub fn unique_targets(&self) -> &[TargetOption] {
        &self.views.unique_targets
    }

    pub fn combined_chart(&self) -> &CombinedChart {
        &self.views.combined
    }

    pub fn target_chart(&self, target_id: &str) -> Option<ChartProjection> {
        self.views
            .groups
            .iter()
            .find(|g| g.target_id.as_deref() == Some(target_id))
            .map(ChartProjection::from_group)
    }

    pub fn targets(&self) -> &[ReleaseTarget] {
        &self.targets
    }

    pub fn action_types(&self) -> &[String] {
        &self.action_types
    }

    pub fn management_collapsed(&self) -> bool {
        self.management_collapsed
    }

    pub fn today(&self) -> NaiveDate {
        self.deps.clock.today()
    }

    // ---- 内部 ----

    /// 两阶段执行：先乐观修改，确认失败则回滚；404 时回滚后再移除该实体
    async fn run_confirmed<C, F>(&mut self, mut command: C, request: F) -> ReleaseResult<()>
    where
        C: Command<Vec<Release>>,
        F: Future<Output = ReleaseResult<()>>,
    {
        command.apply(&mut self.releases)?;
        self.refresh_views();

        if let Err(err) = request.await {
            command.revert(&mut self.releases);
            let subject = command.subject().to_string();
            if err.is_not_found() {
                warn!("发布 {} 在服务端已不存在，从列表移除", subject);
                self.releases
                    .retain(|r| r.id.as_deref() != Some(subject.as_str()));
            } else {
                warn!("发布 {} 确认失败，已回滚: {}", subject, err);
            }
            self.refresh_views();
            return Err(err);
        }
        Ok(())
    }

    fn report(&self, result: ReleaseResult<()>, success: &str) -> ReleaseResult<()> {
        match &result {
            Ok(()) => self.deps.notifier.notify(Notice::success(success)),
            Err(err) => self.notify_error(err),
        }
        result
    }

    fn notify_error(&self, err: &ReleaseError) {
        self.deps.notifier.notify(Notice::error(err.user_message()));
    }
}

impl std::fmt::Debug for ScheduleFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleFacade")
            .field("book_id", &self.book_id)
            .field("releases", &self.releases.len())
            .field("filters", &self.filters)
            .field("preview", &self.preview)
            .finish()
    }
}
