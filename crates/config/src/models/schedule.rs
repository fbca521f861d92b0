use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// 新建发布计划时的默认参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleDefaults {
    pub day_threshold: i64,
    pub start_bulk: f64,
    pub end_bulk: f64,
    pub min_chapters: i64,
    pub max_chapters: i64,
    pub peak_width: f64,
    pub smooth_factor: f64,
    pub random_factor: f64,
    pub period_count: f64,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            day_threshold: 4,
            start_bulk: 0.1,
            end_bulk: 0.1,
            min_chapters: 10,
            max_chapters: 50,
            peak_width: 0.4,
            smooth_factor: 0.2,
            random_factor: 0.3,
            period_count: 12.0,
        }
    }
}

impl ConfigValidator for ScheduleDefaults {
    fn validate(&self) -> crate::ConfigResult<()> {
        if self.day_threshold < 1 {
            return Err(crate::ConfigError::Validation(
                "schedule.day_threshold must be at least 1".to_string(),
            ));
        }
        if self.min_chapters < 1 || self.min_chapters > self.max_chapters {
            return Err(crate::ConfigError::Validation(
                "schedule.min_chapters must be within [1, schedule.max_chapters]".to_string(),
            ));
        }
        ValidationUtils::validate_fraction(self.start_bulk, "schedule.start_bulk")?;
        ValidationUtils::validate_fraction(self.end_bulk, "schedule.end_bulk")?;
        ValidationUtils::validate_fraction(self.smooth_factor, "schedule.smooth_factor")?;
        ValidationUtils::validate_fraction(self.random_factor, "schedule.random_factor")?;
        ValidationUtils::validate_positive(self.peak_width, "schedule.peak_width")?;
        ValidationUtils::validate_positive(self.period_count, "schedule.period_count")?;
        Ok(())
    }
}
