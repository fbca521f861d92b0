//! 展示层辅助：执行率分级、日期紧迫度、百分比格式

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionGrade {
    Good,
    Fair,
    Poor,
}

impl ExecutionGrade {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 0.9 {
            ExecutionGrade::Good
        } else if rate >= 0.7 {
            ExecutionGrade::Fair
        } else {
            ExecutionGrade::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionGrade::Good => "good",
            ExecutionGrade::Fair => "fair",
            ExecutionGrade::Poor => "poor",
        }
    }
}

/// 待执行发布距离今天的紧迫程度
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum DateUrgency {
    Overdue,
    WithinOneDay,
    WithinTwoDays,
    WithinWeek,
    WithinTwoWeeks,
    WithinThreeWeeks,
    Later,
}

impl DateUrgency {
    pub fn classify(date: NaiveDate, today: NaiveDate) -> Self {
        let days = (date - today).num_days();
        match days {
            d if d < 0 => DateUrgency::Overdue,
            0..=1 => DateUrgency::WithinOneDay,
            2 => DateUrgency::WithinTwoDays,
            3..=7 => DateUrgency::WithinWeek,
            8..=14 => DateUrgency::WithinTwoWeeks,
            15..=21 => DateUrgency::WithinThreeWeeks,
            _ => DateUrgency::Later,
        }
    }
}

/// 0.6667 -> "66.7%"
pub fn format_percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
