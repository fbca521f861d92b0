//! 命令行输出格式化

use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;

use release_domain::Release;
use release_engine::{
    format_percent, ChartProjection, DateUrgency, ExecutionGrade, PivotTable, PreviewSession,
    ScheduleFacade,
};

fn urgency_label(urgency: DateUrgency) -> &'static str {
    match urgency {
        DateUrgency::Overdue => "已逾期",
        DateUrgency::WithinOneDay => "1天内",
        DateUrgency::WithinTwoDays => "2天内",
        DateUrgency::WithinWeek => "1周内",
        DateUrgency::WithinTwoWeeks => "2周内",
        DateUrgency::WithinThreeWeeks => "3周内",
        DateUrgency::Later => "",
    }
}

fn date_or_dash(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn render_releases(out: &mut String, releases: &[Release], today: NaiveDate) -> Result<()> {
    writeln!(
        out,
        "{:<12} {:<16} {:<12} {:>6}  {:<24} {:<8}",
        "ID", "目标", "日期", "章节", "状态", "紧迫度"
    )?;
    writeln!(out, "{}", "-".repeat(84))?;

    for release in releases {
        let urgency = if release.is_pending() {
            urgency_label(DateUrgency::classify(release.date, today))
        } else {
            ""
        };
        writeln!(
            out,
            "{:<12} {:<16} {:<12} {:>6}  {:<24} {:<8}",
            release.id_str(),
            release.target_label(),
            release.date.to_string(),
            release.chapters,
            release.status.as_str(),
            urgency
        )?;
    }
    Ok(())
}

pub fn render_pivot(out: &mut String, pivot: &PivotTable) -> Result<()> {
    writeln!(
        out,
        "{:<16} {:>6} {:>8} {:>8} {:>8} {:<6} {:<12} {:<12}",
        "目标", "发布数", "总章节", "已执行", "执行率", "评级", "最后日期", "下次待发"
    )?;
    writeln!(out, "{}", "-".repeat(84))?;

    for row in &pivot.rows {
        writeln!(
            out,
            "{:<16} {:>6} {:>8} {:>8} {:>8} {:<6} {:<12} {:<12}",
            row.label,
            row.release_count,
            row.total_chapters,
            row.executed_chapters,
            format_percent(row.execution_rate),
            ExecutionGrade::from_rate(row.execution_rate).as_str(),
            date_or_dash(row.latest_date),
            date_or_dash(row.next_pending_date),
        )?;
    }

    let totals = &pivot.totals;
    writeln!(
        out,
        "合计: {} 条发布, {} 章, 已执行 {} 章 ({})",
        totals.release_count,
        totals.total_chapters,
        totals.executed_chapters,
        format_percent(totals.overall_execution_rate)
    )?;
    Ok(())
}

pub fn render_chart(out: &mut String, chart: &ChartProjection) -> Result<()> {
    if chart.is_empty() {
        writeln!(out, "(无带日期的条目)")?;
        return Ok(());
    }
    for (label, value) in chart.labels.iter().zip(&chart.values) {
        writeln!(out, "{label:<20} {value:>6}")?;
    }
    Ok(())
}

/// 过滤后的发布表 + 透视表
pub fn render_schedule(facade: &ScheduleFacade) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "书籍 {} 共 {} 条发布，当前显示 {} 条",
        facade.book_id(),
        facade.releases().len(),
        facade.filtered_releases().len()
    )?;
    writeln!(out)?;
    render_releases(&mut out, facade.filtered_releases(), facade.today())?;
    writeln!(out)?;
    render_pivot(&mut out, facade.pivot())?;
    Ok(out)
}

pub fn render_preview(session: &PreviewSession) -> Result<String> {
    let mut out = String::new();
    let totals = session.totals();
    writeln!(out, "预览: {}", session.settings().name)?;
    writeln!(
        out,
        "条目 {}，总章节 {} / 目标 {}，跨度 {} 天，平均每次 {} 章",
        totals.entry_count,
        totals.total_chapters,
        session.settings().amount_of_chapters,
        totals.duration_days,
        totals.average_chapters
    )?;
    writeln!(out)?;
    render_chart(&mut out, session.chart())?;
    Ok(out)
}

pub fn render_action_types(action_types: &[String]) -> Result<String> {
    let mut out = String::new();
    if action_types.is_empty() {
        writeln!(out, "(没有可用的动作类型)")?;
    }
    for action_type in action_types {
        writeln!(out, "{action_type}")?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_chart_lines() {
        let chart = ChartProjection {
            labels: vec!["January 2, 2024".to_string(), "January 8, 2024".to_string()],
            values: vec![10, 5],
        };
        let mut out = String::new();
        render_chart(&mut out, &chart).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("January 2, 2024"));
        assert!(lines[1].ends_with("5"));
    }

    #[test]
    fn test_render_empty_chart() {
        let mut out = String::new();
        render_chart(&mut out, &ChartProjection::default()).unwrap();
        assert_eq!(out.trim(), "(无带日期的条目)");
    }

    #[test]
    fn test_render_action_types() {
        let out = render_action_types(&["TELEGRAM".to_string(), "WEBSITE".to_string()]).unwrap();
        assert_eq!(out, "TELEGRAM\nWEBSITE\n");
    }
}
