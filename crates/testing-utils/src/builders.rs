//! Test data builders
//!
//! 带默认值的 builder，测试只需指定关心的字段。

use chrono::NaiveDate;

use release_domain::{Release, ReleaseStatus, ReleaseTarget, ScheduleSettings};

use crate::helpers::date;

/// Builder for creating test Release entities
pub struct ReleaseBuilder {
    release: Release,
}

impl ReleaseBuilder {
    pub fn new() -> Self {
        Self {
            release: Release::new(Some("A".to_string()), date("2024-01-01"), 1),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.release.id = Some(id.to_string());
        self
    }

    pub fn with_target(mut self, target_id: &str) -> Self {
        self.release.target_id = Some(target_id.to_string());
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.release.target_id = None;
        self
    }

    pub fn with_target_name(mut self, name: &str) -> Self {
        self.release.target_name = Some(name.to_string());
        self
    }

    pub fn with_action_type(mut self, action_type: &str) -> Self {
        self.release.action_type = Some(action_type.to_string());
        self
    }

    /// `YYYY-MM-DD`
    pub fn with_date(mut self, day: &str) -> Self {
        self.release.date = date(day);
        self
    }

    pub fn on(mut self, day: NaiveDate) -> Self {
        self.release.date = day;
        self
    }

    pub fn with_chapters(mut self, chapters: i32) -> Self {
        self.release.chapters = chapters;
        self
    }

    pub fn executed(mut self) -> Self {
        self.release.set_executed(true);
        self
    }

    pub fn with_status(mut self, status: ReleaseStatus) -> Self {
        self.release.status = status;
        self.release.executed = status == ReleaseStatus::Executed;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.release
            .metadata
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Release {
        self.release
    }
}

impl Default for ReleaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test ScheduleSettings
pub struct ScheduleSettingsBuilder {
    settings: ScheduleSettings,
}

impl ScheduleSettingsBuilder {
    pub fn new() -> Self {
        let mut settings = ScheduleSettings::new("test_schedule", "TELEGRAM", date("2024-01-01"));
        settings.amount_of_chapters = 100;
        Self { settings }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.settings.name = name.to_string();
        self
    }

    pub fn with_action_type(mut self, action_type: &str) -> Self {
        self.settings.action_type = action_type.to_string();
        self
    }

    pub fn with_start_date(mut self, day: &str) -> Self {
        self.settings.start_date = date(day);
        self
    }

    pub fn with_day_threshold(mut self, day_threshold: i64) -> Self {
        self.settings.day_threshold = day_threshold;
        self
    }

    pub fn with_amount_of_chapters(mut self, amount: i64) -> Self {
        self.settings.amount_of_chapters = amount;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.settings
            .metadata
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> ScheduleSettings {
        self.settings
    }
}

impl Default for ScheduleSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test ReleaseTarget entities
pub struct ReleaseTargetBuilder {
    target: ReleaseTarget,
}

impl ReleaseTargetBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            target: ReleaseTarget::new(id, id),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.target.name = name.to_string();
        self
    }

    pub fn with_action_type(mut self, action_type: &str) -> Self {
        self.target.action_type = Some(action_type.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.target.enabled = false;
        self
    }

    pub fn build(self) -> ReleaseTarget {
        self.target
    }
}
