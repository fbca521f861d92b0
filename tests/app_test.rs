use std::sync::Arc;

use release_config::AppConfig;
use release_domain::{FilterPatch, StatusFilter, SubmitMode};
use release_engine::Collaborators;
use release_planner::{Application, PreviewPlan};
use release_testing_utils::{
    date, sample_schedule, FixedClock, MemoryStateStore, MockReleaseApi, RecordingNotifier,
    ReleaseBuilder,
};

struct Fixture {
    api: MockReleaseApi,
    notifier: RecordingNotifier,
    app: Application,
}

fn fixture() -> Fixture {
    let api = MockReleaseApi::with_releases(sample_schedule());
    let notifier = RecordingNotifier::new();
    let deps = Collaborators {
        api: Arc::new(api.clone()),
        store: Arc::new(MemoryStateStore::new()),
        notifier: Arc::new(notifier.clone()),
        clock: Arc::new(FixedClock::on(date("2024-01-10"))),
    };
    let app = Application::with_collaborators(AppConfig::default(), "book-1", deps);
    Fixture { api, notifier, app }
}

const PLAN: &str = r#"
name = "spring-arc"
action_type = "TELEGRAM"
start_date = "2024-02-01"
amount_of_chapters = 120

[[releases]]
target_id = "A"
date = "2024-02-01"
chapters = 20

[[releases]]
target_id = "A"
date = "2024-02-05"
chapters = 5
"#;

#[tokio::test]
async fn test_schedule_output_respects_filters() {
    let mut f = fixture();

    let output = f
        .app
        .schedule(Some(FilterPatch::target("B").with_status(StatusFilter::Pending)))
        .await
        .unwrap();

    assert!(output.contains("共 5 条发布，当前显示 1 条"));
    assert!(output.contains("r4 "));
    assert!(!output.contains("r2 "));
    // 透视表不受过滤影响
    assert!(output.contains("合计: 5 条发布, 33 章, 已执行 18 章 (54.5%)"));
    assert_eq!(f.app.facade().filtered_releases().len(), 1);
}

#[tokio::test]
async fn test_mark_executed_goes_through_backend() {
    let mut f = fixture();

    f.app.mark("r2", true).await.unwrap();
    assert!(f.api.release("r2").unwrap().is_executed());

    assert!(f.app.mark("missing", true).await.is_err());
    assert!(f.notifier.last().unwrap().is_error());
}

#[tokio::test]
async fn test_preview_renders_server_plan() {
    let mut f = fixture();
    let plan = PreviewPlan::from_toml(PLAN).unwrap();

    let output = f.app.preview(&plan, SubmitMode::Preview).await.unwrap();

    assert!(output.contains("预览: spring-arc"));
    assert!(output.contains("总章节 25 / 目标 120"));
    assert!(output.contains("February 1, 2024"));
    assert!(output.contains("February 5, 2024"));
    assert_eq!(f.api.generate_calls(), vec![true]);
    assert_eq!(f.api.releases().len(), 5);
}

#[tokio::test]
async fn test_preview_copies_target_before_plan_entries() {
    let mut f = fixture();
    f.api.set_target_releases(
        "B",
        vec![ReleaseBuilder::new()
            .with_id("b-old")
            .with_target("B")
            .with_date("2024-01-20")
            .with_chapters(7)
            .build()],
    );
    let mut plan = PreviewPlan::from_toml(PLAN).unwrap();
    plan.copy_from_target = Some("B".to_string());

    f.app.preview(&plan, SubmitMode::Preview).await.unwrap();

    let request = f.api.last_generate_request().unwrap();
    assert_eq!(request.releases.len(), 3);
    // 复制的条目不带原目标和id
    assert_eq!(request.releases[0].chapters, 7);
    assert_eq!(request.releases[0].date, date("2024-01-20"));
    assert!(request.releases[0].target_id.is_none());
    assert_eq!(request.releases[1].target_id.as_deref(), Some("A"));
    assert!(request.releases.iter().all(|r| r.id.is_none()));
}

#[tokio::test]
async fn test_commit_prints_reloaded_schedule() {
    let mut f = fixture();
    let plan = PreviewPlan::from_toml(PLAN).unwrap();

    let output = f.app.preview(&plan, SubmitMode::Commit).await.unwrap();

    assert!(output.contains("共 7 条发布"));
    assert!(f.app.facade().preview().is_none());
    assert_eq!(f.api.releases().len(), 7);
}

#[tokio::test]
async fn test_unknown_action_type_is_rejected() {
    let mut f = fixture();
    f.api.set_action_types(&["WEBSITE"]);
    let plan = PreviewPlan::from_toml(PLAN).unwrap();

    assert!(f.app.preview(&plan, SubmitMode::Preview).await.is_err());
    assert!(f.api.generate_calls().is_empty());

    let output = f.app.action_types().await.unwrap();
    assert_eq!(output, "WEBSITE\n");
}
