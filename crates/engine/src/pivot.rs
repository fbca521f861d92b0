use chrono::NaiveDate;
use serde::Serialize;

use crate::charts::TargetGroup;

/// 零分母时定义为 0
pub fn execution_rate(executed_chapters: i64, total_chapters: i64) -> f64 {
    if total_chapters == 0 {
        0.0
    } else {
        executed_chapters as f64 / total_chapters as f64
    }
}

/// 单个目标的汇总
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PivotRow {
    pub target_id: Option<String>,
    pub label: String,
    pub release_count: usize,
    pub total_chapters: i64,
    pub executed_chapters: i64,
    pub execution_rate: f64,
    pub latest_date: Option<NaiveDate>,
    /// `None` 表示组内全部已执行
    pub next_pending_date: Option<NaiveDate>,
}

impl PivotRow {
    pub fn from_group(group: &TargetGroup) -> Self {
        let total_chapters: i64 = group.releases.iter().map(|r| i64::from(r.chapters)).sum();
        let executed_chapters: i64 = group
            .releases
            .iter()
            .filter(|r| r.is_executed())
            .map(|r| i64::from(r.chapters))
            .sum();

        Self {
            target_id: group.target_id.clone(),
            label: group.label.clone(),
            release_count: group.releases.len(),
            total_chapters,
            executed_chapters,
            execution_rate: execution_rate(executed_chapters, total_chapters),
            latest_date: group.releases.iter().map(|r| r.date).max(),
            next_pending_date: group
                .releases
                .iter()
                .filter(|r| r.is_pending())
                .map(|r| r.date)
                .min(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PivotTotals {
    pub release_count: usize,
    pub total_chapters: i64,
    pub executed_chapters: i64,
    /// 由合计值计算，不是各行比率的平均
    pub overall_execution_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PivotTable {
    pub rows: Vec<PivotRow>,
    pub totals: PivotTotals,
}

impl PivotTable {
    pub fn row(&self, target_id: &str) -> Option<&PivotRow> {
        self.rows
            .iter()
            .find(|row| row.target_id.as_deref() == Some(target_id))
    }
}

pub fn build_pivot(groups: &[TargetGroup]) -> PivotTable {
    let rows: Vec<PivotRow> = groups.iter().map(PivotRow::from_group).collect();

    let release_count = rows.iter().map(|r| r.release_count).sum();
    let total_chapters = rows.iter().map(|r| r.total_chapters).sum();
    let executed_chapters = rows.iter().map(|r| r.executed_chapters).sum();

    PivotTable {
        rows,
        totals: PivotTotals {
            release_count,
            total_chapters,
            executed_chapters,
            overall_execution_rate: execution_rate(executed_chapters, total_chapters),
        },
    }
}
