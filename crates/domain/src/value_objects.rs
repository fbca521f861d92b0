use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::{Metadata, Release};
use release_errors::{ReleaseError, ReleaseResult};

/// 执行状态过滤
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    #[serde(rename = "")]
    Any,
    #[serde(rename = "executed")]
    Executed,
    #[serde(rename = "pending")]
    Pending,
}

/// 日期区间过滤
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DateBucket {
    #[default]
    #[serde(rename = "")]
    Any,
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "thisWeek")]
    ThisWeek,
    #[serde(rename = "nextWeek")]
    NextWeek,
    #[serde(rename = "nextMonth")]
    NextMonth,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "target")]
    Target,
    #[serde(rename = "chapters")]
    Chapters,
}

impl std::str::FromStr for StatusFilter {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(StatusFilter::Any),
            "executed" => Ok(StatusFilter::Executed),
            "pending" => Ok(StatusFilter::Pending),
            _ => Err(ReleaseError::validation_error(format!(
                "未知的状态过滤: {s}"
            ))),
        }
    }
}

impl std::str::FromStr for DateBucket {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(DateBucket::Any),
            "today" => Ok(DateBucket::Today),
            "thisWeek" => Ok(DateBucket::ThisWeek),
            "nextWeek" => Ok(DateBucket::NextWeek),
            "nextMonth" => Ok(DateBucket::NextMonth),
            _ => Err(ReleaseError::validation_error(format!(
                "未知的日期过滤: {s}"
            ))),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortKey::Date),
            "target" => Ok(SortKey::Target),
            "chapters" => Ok(SortKey::Chapters),
            _ => Err(ReleaseError::validation_error(format!("未知的排序字段: {s}"))),
        }
    }
}

/// 发布列表的过滤与排序条件，原样持久化到本地键值存储
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseFilters {
    /// 空字符串表示不过滤
    pub target_id: String,
    pub status: StatusFilter,
    pub date: DateBucket,
    pub sort_by: SortKey,
}

/// `apply_filters` 的局部更新
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub target_id: Option<String>,
    pub status: Option<StatusFilter>,
    pub date: Option<DateBucket>,
    pub sort_by: Option<SortKey>,
}

impl FilterPatch {
    pub fn target(target_id: impl Into<String>) -> Self {
        Self {
            target_id: Some(target_id.into()),
            ..Self::default()
        }
    }

    pub fn status(status: StatusFilter) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn date(date: DateBucket) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_date(mut self, date: DateBucket) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_sort(mut self, sort_by: SortKey) -> Self {
        self.sort_by = Some(sort_by);
        self
    }
}

impl ReleaseFilters {
    pub fn apply(&mut self, patch: FilterPatch) {
        if let Some(target_id) = patch.target_id {
            self.target_id = target_id;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
    }

    pub fn target(&self) -> Option<&str> {
        let target = self.target_id.trim();
        (!target.is_empty()).then_some(target)
    }
}

/// 生成一批新发布的参数；分布形状参数原样交给后端生成算法
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSettings {
    pub name: String,
    pub action_type: String,
    pub start_date: NaiveDate,
    pub day_threshold: i64,
    pub amount_of_chapters: i64,
    pub start_bulk: f64,
    pub end_bulk: f64,
    pub min_chapters: i64,
    pub max_chapters: i64,
    pub peak_width: f64,
    pub smooth_factor: f64,
    pub random_factor: f64,
    pub period_count: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ScheduleSettings {
    pub fn new(name: impl Into<String>, action_type: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            action_type: action_type.into(),
            start_date,
            day_threshold: 4,
            amount_of_chapters: 0,
            start_bulk: 0.1,
            end_bulk: 0.1,
            min_chapters: 10,
            max_chapters: 50,
            peak_width: 0.4,
            smooth_factor: 0.2,
            random_factor: 0.3,
            period_count: 12.0,
            metadata: Metadata::new(),
        }
    }

    /// `action_types` 为空时跳过动作类型校验（词表尚未加载）
    pub fn validate(&self, action_types: &[String]) -> ReleaseResult<()> {
        if self.name.trim().is_empty() {
            return Err(ReleaseError::validation_error("name 不能为空"));
        }
        if self.action_type.trim().is_empty() {
            return Err(ReleaseError::validation_error("actionType 不能为空"));
        }
        if !action_types.is_empty() && !action_types.iter().any(|t| t == &self.action_type) {
            return Err(ReleaseError::validation_error(format!(
                "未知的 actionType: {}，可选值: {}",
                self.action_type,
                action_types.join(", ")
            )));
        }
        if self.amount_of_chapters < 1 {
            return Err(ReleaseError::validation_error("amountOfChapters 必须至少为1"));
        }
        if self.day_threshold < 1 {
            return Err(ReleaseError::validation_error("dayThreshold 必须至少为1"));
        }
        Ok(())
    }
}

/// `generate-release` 接口的请求体
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScheduleRequest {
    pub settings: ScheduleSettings,
    pub releases: Vec<Release>,
}

/// 生成接口的两种模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// 服务端模拟，返回修订后的计划
    Preview,
    /// 服务端持久化
    Commit,
}

impl SubmitMode {
    pub fn is_preview(&self) -> bool {
        matches!(self, SubmitMode::Preview)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    Simulated(Vec<Release>),
    Committed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// 短暂显示给用户的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}
