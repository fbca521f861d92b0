//! 预览命令读取的计划文件
//!
//! ```toml
//! name = "spring-arc"
//! action_type = "TELEGRAM"
//! start_date = "2024-02-01"
//! amount_of_chapters = 120
//! copy_from_target = "A"      # 可选，先复制该目标的已有发布
//!
//! [[releases]]
//! target_id = "A"
//! date = "2024-02-01"
//! chapters = 20
//! ```
//!
//! 未出现的生成参数取自配置中的 `[schedule]` 默认值。

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use release_config::ScheduleDefaults;
use release_domain::{ReleaseResult, ScheduleSettings};
use release_engine::PreviewSession;

#[derive(Debug, Clone, Deserialize)]
pub struct PlanEntry {
    #[serde(default)]
    pub target_id: Option<String>,
    /// `YYYY-MM-DD`，留空表示暂不定日期
    #[serde(default)]
    pub date: String,
    pub chapters: i32,
    #[serde(default)]
    pub executed: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewPlan {
    pub name: String,
    pub action_type: String,
    pub start_date: NaiveDate,
    pub amount_of_chapters: i64,
    pub day_threshold: Option<i64>,
    pub start_bulk: Option<f64>,
    pub end_bulk: Option<f64>,
    pub min_chapters: Option<i64>,
    pub max_chapters: Option<i64>,
    pub peak_width: Option<f64>,
    pub smooth_factor: Option<f64>,
    pub random_factor: Option<f64>,
    pub period_count: Option<f64>,
    #[serde(default)]
    pub copy_from_target: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub releases: Vec<PlanEntry>,
}

impl PreviewPlan {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("解析计划文件失败")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("读取计划文件失败: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// 计划文件优先，其次配置默认值
    pub fn settings(&self, defaults: &ScheduleDefaults) -> ScheduleSettings {
        let mut settings =
            ScheduleSettings::new(&self.name, &self.action_type, self.start_date);
        settings.amount_of_chapters = self.amount_of_chapters;
        settings.day_threshold = self.day_threshold.unwrap_or(defaults.day_threshold);
        settings.start_bulk = self.start_bulk.unwrap_or(defaults.start_bulk);
        settings.end_bulk = self.end_bulk.unwrap_or(defaults.end_bulk);
        settings.min_chapters = self.min_chapters.unwrap_or(defaults.min_chapters);
        settings.max_chapters = self.max_chapters.unwrap_or(defaults.max_chapters);
        settings.peak_width = self.peak_width.unwrap_or(defaults.peak_width);
        settings.smooth_factor = self.smooth_factor.unwrap_or(defaults.smooth_factor);
        settings.random_factor = self.random_factor.unwrap_or(defaults.random_factor);
        settings.period_count = self.period_count.unwrap_or(defaults.period_count);
        settings.metadata = self.metadata.clone();
        settings
    }

    /// 把计划中的条目逐条追加到草稿
    pub fn fill_session(&self, session: &mut PreviewSession) -> ReleaseResult<usize> {
        for entry in &self.releases {
            let index = session.add_entry();
            session.set_target(index, entry.target_id.clone())?;
            session.set_date(index, &entry.date)?;
            session.set_chapters(index, entry.chapters)?;
            if entry.executed {
                session.toggle_executed(index)?;
            }
            for (key, value) in &entry.metadata {
                session.set_metadata(index, key.as_str(), value.as_str())?;
            }
        }
        Ok(self.releases.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
name = "spring-arc"
action_type = "TELEGRAM"
start_date = "2024-02-01"
amount_of_chapters = 120
max_chapters = 30

[metadata]
season = "2"

[[releases]]
target_id = "A"
date = "2024-02-01"
chapters = 20

[[releases]]
chapters = 5
"#;

    #[test]
    fn test_parse_plan() {
        let plan = PreviewPlan::from_toml(PLAN).unwrap();
        assert_eq!(plan.name, "spring-arc");
        assert_eq!(plan.releases.len(), 2);
        assert_eq!(plan.releases[0].target_id.as_deref(), Some("A"));
        assert!(plan.releases[1].date.is_empty());
        assert!(plan.copy_from_target.is_none());
    }

    #[test]
    fn test_settings_fall_back_to_defaults() {
        let plan = PreviewPlan::from_toml(PLAN).unwrap();
        let defaults = ScheduleDefaults {
            day_threshold: 7,
            ..Default::default()
        };
        let settings = plan.settings(&defaults);
        assert_eq!(settings.amount_of_chapters, 120);
        assert_eq!(settings.max_chapters, 30);
        assert_eq!(settings.min_chapters, 10);
        assert_eq!(settings.day_threshold, 7);
        assert_eq!(settings.metadata.get("season").map(String::as_str), Some("2"));
        assert!(settings.validate(&[]).is_ok());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        assert!(PreviewPlan::from_toml("name = \"x\"").is_err());
    }
}
