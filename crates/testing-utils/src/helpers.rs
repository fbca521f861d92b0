//! Test helper utilities

use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::sleep;

use release_domain::Release;

use crate::builders::ReleaseBuilder;

/// 解析 `YYYY-MM-DD`，格式错误直接 panic
pub fn date(day: &str) -> NaiveDate {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .unwrap_or_else(|e| panic!("invalid test date {day:?}: {e}"))
}

/// 跨三周、两个目标的样例计划；2024-01-10 是周三
///
/// | id | target | date | chapters | executed |
/// |---|---|---|---|---|
/// | r1 | A | 2024-01-02 | 10 | yes |
/// | r2 | A | 2024-01-08 | 5 | no |
/// | r3 | B | 2024-01-10 | 8 | yes |
/// | r4 | B | 2024-01-14 | 4 | no |
/// | r5 | A | 2024-01-16 | 6 | no |
pub fn sample_schedule() -> Vec<Release> {
    vec![
        ReleaseBuilder::new()
            .with_id("r1")
            .with_target("A")
            .with_target_name("Telegram")
            .with_action_type("TELEGRAM")
            .with_date("2024-01-02")
            .with_chapters(10)
            .executed()
            .build(),
        ReleaseBuilder::new()
            .with_id("r2")
            .with_target("A")
            .with_target_name("Telegram")
            .with_action_type("TELEGRAM")
            .with_date("2024-01-08")
            .with_chapters(5)
            .build(),
        ReleaseBuilder::new()
            .with_id("r3")
            .with_target("B")
            .with_target_name("Website")
            .with_action_type("WEBSITE")
            .with_date("2024-01-10")
            .with_chapters(8)
            .executed()
            .build(),
        ReleaseBuilder::new()
            .with_id("r4")
            .with_target("B")
            .with_target_name("Website")
            .with_action_type("WEBSITE")
            .with_date("2024-01-14")
            .with_chapters(4)
            .build(),
        ReleaseBuilder::new()
            .with_id("r5")
            .with_target("A")
            .with_target_name("Telegram")
            .with_action_type("TELEGRAM")
            .with_date("2024-01-16")
            .with_chapters(6)
            .build(),
    ]
}

/// 轮询直到条件成立或超时
pub async fn wait_for<F>(mut condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}
