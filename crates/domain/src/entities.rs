use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use release_errors::{ReleaseError, ReleaseResult};

/// 发布记录的自由注解
pub type Metadata = BTreeMap<String, String>;

/// 章节区间注解的键，值形如 `1-10`
pub const PAGES_KEY: &str = "pages";

/// 未分配发布目标时展示用的标签
pub const UNASSIGNED_LABEL: &str = "-";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ReleaseStatus {
    #[default]
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "MANUAL_ACTION_REQUIRED")]
    ManualActionRequired,
    #[serde(rename = "EXECUTED")]
    Executed,
}

impl ReleaseStatus {
    /// 开关式切换只会产生 DRAFT 或 EXECUTED
    pub fn from_executed(executed: bool) -> Self {
        if executed {
            ReleaseStatus::Executed
        } else {
            ReleaseStatus::Draft
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Draft => "DRAFT",
            ReleaseStatus::ManualActionRequired => "MANUAL_ACTION_REQUIRED",
            ReleaseStatus::Executed => "EXECUTED",
        }
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 表格内联编辑的暂存值
#[derive(Debug, Clone, PartialEq)]
pub struct EditData {
    pub date: Option<NaiveDate>,
    pub chapters: i32,
}

/// 仅供界面使用的临时状态，不参与序列化
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditState {
    pub editing: bool,
    pub edit_data: Option<EditData>,
    pub show_metadata: bool,
    pub pending_key: String,
    pub pending_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "releaseTargetId", alias = "targetId")]
    pub target_id: Option<String>,
    #[serde(
        default,
        rename = "releaseTargetName",
        alias = "targetName",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    pub date: NaiveDate,
    pub chapters: i32,
    #[serde(default)]
    pub executed: bool,
    #[serde(default)]
    pub status: ReleaseStatus,
    #[serde(default, deserialize_with = "deserialize_metadata")]
    pub metadata: Metadata,
    #[serde(skip)]
    pub ui: EditState,
}

impl Release {
    pub fn new(target_id: Option<String>, date: NaiveDate, chapters: i32) -> Self {
        Self {
            id: None, // 将由后端生成
            target_id,
            target_name: None,
            action_type: None,
            date,
            chapters,
            executed: false,
            status: ReleaseStatus::Draft,
            metadata: Metadata::new(),
            ui: EditState::default(),
        }
    }

    /// 后端可能只返回 `executed` 或只返回 `status`，以执行标志为准对齐两者
    pub fn normalized(mut self) -> Self {
        if self.executed {
            self.status = ReleaseStatus::Executed;
        } else if self.status == ReleaseStatus::Executed {
            self.executed = true;
        }
        self
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn is_pending(&self) -> bool {
        !self.executed
    }

    pub fn set_executed(&mut self, executed: bool) {
        self.executed = executed;
        self.status = ReleaseStatus::from_executed(executed);
    }

    /// 排序和展示用的目标名称
    pub fn target_label(&self) -> &str {
        self.target_name
            .as_deref()
            .or(self.target_id.as_deref())
            .unwrap_or(UNASSIGNED_LABEL)
    }

    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn has_metadata(&self, key: &str, value: &str) -> bool {
        self.metadata_value(key) == Some(value)
    }

    pub fn validate(&self) -> ReleaseResult<()> {
        validate_chapters(self.chapters)
    }
}

pub fn validate_chapters(chapters: i32) -> ReleaseResult<()> {
    if chapters <= 0 {
        return Err(ReleaseError::validation_error(format!(
            "章节数必须大于0，实际为 {chapters}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseTarget {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "deserialize_metadata")]
    pub metadata: Metadata,
}

fn default_enabled() -> bool {
    true
}

impl ReleaseTarget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            book_id: None,
            name: name.into(),
            action_type: None,
            enabled: true,
            metadata: Metadata::new(),
        }
    }
}

/// 草稿会话内的临时标识，不会作为后端id发送
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftId(pub String);

impl std::fmt::Display for DraftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 预览草稿中的一条发布
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRelease {
    #[serde(skip)]
    pub draft_id: DraftId,
    #[serde(rename = "releaseTargetId")]
    pub target_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub chapters: i32,
    pub status: ReleaseStatus,
    pub metadata: Metadata,
    #[serde(skip)]
    pub ui: EditState,
}

impl PreviewRelease {
    pub fn new(draft_id: DraftId, target_id: Option<String>, date: Option<NaiveDate>) -> Self {
        Self {
            draft_id,
            target_id,
            date,
            chapters: 1,
            status: ReleaseStatus::Draft,
            metadata: Metadata::new(),
            ui: EditState::default(),
        }
    }

    /// 从已有发布构造草稿条目；持久化身份(`id`)在此丢弃
    pub fn from_release(draft_id: DraftId, release: Release) -> Self {
        Self {
            draft_id,
            target_id: release.target_id,
            date: Some(release.date),
            chapters: release.chapters,
            status: release.status,
            metadata: release.metadata,
            ui: EditState::default(),
        }
    }

    pub fn is_executed(&self) -> bool {
        self.status == ReleaseStatus::Executed
    }

    /// 派生的章节区间
    pub fn pages(&self) -> Option<&str> {
        self.metadata.get(PAGES_KEY).map(String::as_str)
    }

    /// 转为提交给后端的发布载荷，没有日期或章节数非法的条目会被拒绝
    pub fn to_release(&self) -> ReleaseResult<Release> {
        validate_chapters(self.chapters)?;
        let date = self.date.ok_or_else(|| {
            ReleaseError::validation_error(format!("草稿条目 {} 缺少发布日期", self.draft_id))
        })?;

        let mut release = Release::new(self.target_id.clone(), date, self.chapters);
        release.set_executed(self.is_executed());
        if self.status == ReleaseStatus::ManualActionRequired {
            release.status = ReleaseStatus::ManualActionRequired;
        }
        release.metadata = self.metadata.clone();
        Ok(release)
    }
}

/// 后端的 metadata 是任意 JSON 值，统一收敛为字符串
fn deserialize_metadata<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}
