//! 图表数据投影
//!
//! 只负责把发布列表整理成绘图协作者需要的序列，不涉及绘制。

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use release_domain::Release;

pub const CHART_LABEL_FORMAT: &str = "%B %-d, %Y";

pub fn format_chart_label(date: NaiveDate) -> String {
    date.format(CHART_LABEL_FORMAT).to_string()
}

/// 同一目标下按日期排序的发布
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGroup {
    pub target_id: Option<String>,
    pub label: String,
    pub releases: Vec<Release>,
}

impl TargetGroup {
    pub fn total_chapters(&self) -> i64 {
        self.releases.iter().map(|r| i64::from(r.chapters)).sum()
    }
}

/// 按 `target_id` 分组，组顺序为首次出现顺序，组内按日期稳定排序
pub fn group_by_target(releases: &[Release]) -> Vec<TargetGroup> {
    let mut groups: Vec<TargetGroup> = Vec::new();
    for release in releases {
        match groups.iter_mut().find(|g| g.target_id == release.target_id) {
            Some(group) => group.releases.push(release.clone()),
            None => groups.push(TargetGroup {
                target_id: release.target_id.clone(),
                label: release.target_label().to_string(),
                releases: vec![release.clone()],
            }),
        }
    }
    for group in &mut groups {
        group.releases.sort_by_key(|r| r.date);
    }
    groups
}

/// 单序列投影：标签为格式化日期，值为章节数
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ChartProjection {
    pub labels: Vec<String>,
    pub values: Vec<i32>,
}

impl ChartProjection {
    pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, i32)>) -> Self {
        let mut points: Vec<(NaiveDate, i32)> = points.into_iter().collect();
        points.sort_by_key(|(date, _)| *date);
        let (labels, values) = points
            .into_iter()
            .map(|(date, chapters)| (format_chart_label(date), chapters))
            .unzip();
        Self { labels, values }
    }

    pub fn from_group(group: &TargetGroup) -> Self {
        Self::from_points(group.releases.iter().map(|r| (r.date, r.chapters)))
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CombinedDataset {
    pub target_id: Option<String>,
    pub label: String,
    /// 每个日期上的章节合计，缺席为 0
    pub chapters: Vec<i64>,
    pub planned: Vec<i64>,
    pub executed: Vec<i64>,
}

/// 所有目标共享一条日期轴的组合图
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CombinedChart {
    pub dates: Vec<NaiveDate>,
    pub labels: Vec<String>,
    pub datasets: Vec<CombinedDataset>,
}

pub fn combined_chart(groups: &[TargetGroup]) -> CombinedChart {
    let dates: Vec<NaiveDate> = groups
        .iter()
        .flat_map(|g| g.releases.iter().map(|r| r.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let datasets = groups
        .iter()
        .map(|group| {
            let mut chapters = vec![0i64; dates.len()];
            let mut planned = vec![0i64; dates.len()];
            let mut executed = vec![0i64; dates.len()];
            for release in &group.releases {
                let Ok(slot) = dates.binary_search(&release.date) else {
                    continue;
                };
                let amount = i64::from(release.chapters);
                chapters[slot] += amount;
                if release.is_executed() {
                    executed[slot] += amount;
                } else {
                    planned[slot] += amount;
                }
            }
            CombinedDataset {
                target_id: group.target_id.clone(),
                label: group.label.clone(),
                chapters,
                planned,
                executed,
            }
        })
        .collect();

    CombinedChart {
        labels: dates.iter().copied().map(format_chart_label).collect(),
        dates,
        datasets,
    }
}
