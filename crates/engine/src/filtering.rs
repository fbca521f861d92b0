//! 过滤与排序
//!
//! 纯函数：输入规范列表和过滤条件，输出新的派生集合，从不修改输入。

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use release_domain::{DateBucket, Release, ReleaseFilters, SortKey, StatusFilter};

/// 日期区间（闭区间）；`Any` 返回 `None`
pub fn date_range(bucket: DateBucket, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match bucket {
        DateBucket::Any => None,
        DateBucket::Today => Some((today, today)),
        DateBucket::ThisWeek => {
            // 周一为 1，周日为 7
            let offset = i64::from(today.weekday().number_from_monday()) - 1;
            let monday = today - Duration::days(offset);
            Some((monday, monday + Duration::days(6)))
        }
        DateBucket::NextWeek => Some((today, today + Duration::days(7))),
        DateBucket::NextMonth => {
            let first = today - Duration::days(i64::from(today.day0()));
            Some((first, first + Duration::days(30)))
        }
    }
}

pub fn matches(release: &Release, filters: &ReleaseFilters, today: NaiveDate) -> bool {
    if let Some(target) = filters.target() {
        if release.target_id.as_deref() != Some(target) {
            return false;
        }
    }

    let status_ok = match filters.status {
        StatusFilter::Any => true,
        StatusFilter::Executed => release.is_executed(),
        StatusFilter::Pending => release.is_pending(),
    };
    if !status_ok {
        return false;
    }

    match date_range(filters.date, today) {
        Some((start, end)) => release.date >= start && release.date <= end,
        None => true,
    }
}

pub fn filter_releases(
    releases: &[Release],
    filters: &ReleaseFilters,
    today: NaiveDate,
) -> Vec<Release> {
    releases
        .iter()
        .filter(|r| matches(r, filters, today))
        .cloned()
        .collect()
}

/// 稳定排序，相同键保持原有顺序
pub fn sort_releases(releases: &mut [Release], key: SortKey) {
    match key {
        SortKey::Date => releases.sort_by_key(|r| r.date),
        SortKey::Target => releases.sort_by(|a, b| a.target_label().cmp(b.target_label())),
        SortKey::Chapters => releases.sort_by_key(|r| Reverse(r.chapters)),
    }
}

/// 先过滤后排序
pub fn filtered_view(releases: &[Release], filters: &ReleaseFilters, today: NaiveDate) -> Vec<Release> {
    let mut view = filter_releases(releases, filters, today);
    sort_releases(&mut view, filters.sort_by);
    view
}

/// 过滤下拉框的一个选项
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TargetOption {
    pub target_id: Option<String>,
    pub label: String,
    pub action_type: Option<String>,
}

/// 未过滤列表中出现过的目标，每个 `target_id` 一项，首次出现的动作类型生效
pub fn unique_targets(releases: &[Release]) -> Vec<TargetOption> {
    let mut seen = HashSet::new();
    let mut options: Vec<TargetOption> = releases
        .iter()
        .filter(|r| seen.insert(r.target_id.clone()))
        .map(|r| TargetOption {
            target_id: r.target_id.clone(),
            label: r.target_label().to_string(),
            action_type: r.action_type.clone(),
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}
