use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use release_config::AppConfig;
use release_domain::{FilterPatch, GenerateOutcome, SubmitMode, SystemClock};
use release_engine::{Collaborators, ScheduleFacade};
use release_infrastructure::{FileStateStore, HttpReleaseApi, TracingNotifier};

use crate::plan::PreviewPlan;
use crate::render;

/// 绑定到单本书的命令行应用
pub struct Application {
    config: AppConfig,
    facade: ScheduleFacade,
}

impl Application {
    /// 使用真实的 HTTP 后端和本地状态文件
    pub fn new(config: AppConfig, book_id: &str) -> Result<Self> {
        let api = HttpReleaseApi::from_config(&config.api).context("创建后端客户端失败")?;
        info!("后端地址: {}", api.base_url());

        let deps = Collaborators {
            api: Arc::new(api),
            store: Arc::new(FileStateStore::new(&config.storage.state_file)),
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
        };
        Ok(Self::with_collaborators(config, book_id, deps))
    }

    pub fn with_collaborators(config: AppConfig, book_id: &str, deps: Collaborators) -> Self {
        let facade =
            ScheduleFacade::new(book_id, deps).with_day_threshold(config.schedule.day_threshold);
        Self { config, facade }
    }

    pub fn facade(&self) -> &ScheduleFacade {
        &self.facade
    }

    /// 加载发布计划；`patch` 为空时沿用上次保存的过滤条件
    pub async fn schedule(&mut self, patch: Option<FilterPatch>) -> Result<String> {
        self.facade.load().await.context("加载发布计划失败")?;
        if let Some(patch) = patch {
            self.facade.apply_filters(patch);
        }
        render::render_schedule(&self.facade)
    }

    pub async fn mark(&mut self, release_id: &str, executed: bool) -> Result<String> {
        self.facade.load().await.context("加载发布计划失败")?;
        if executed {
            self.facade.mark_executed(release_id).await?;
        } else {
            self.facade.mark_pending(release_id).await?;
        }
        render::render_schedule(&self.facade)
    }

    /// 按计划文件构造草稿并提交
    ///
    /// 预览模式输出服务端返回的草稿；提交模式输出重新加载后的发布计划。
    pub async fn preview(&mut self, plan: &PreviewPlan, mode: SubmitMode) -> Result<String> {
        if let Err(e) = self.facade.load_action_types().await {
            warn!("动作类型加载失败，跳过校验: {}", e);
        }

        let settings = plan.settings(&self.config.schedule);
        let session = self.facade.open_preview(settings);
        if let Some(target_id) = &plan.copy_from_target {
            session
                .copy_from_existing_target(target_id)
                .await
                .with_context(|| format!("复制发布目标 {target_id} 失败"))?;
        }
        plan.fill_session(session).context("计划条目无效")?;

        let outcome = self.facade.submit_preview(mode).await?;
        match outcome {
            GenerateOutcome::Simulated(_) => {
                let session = self
                    .facade
                    .preview()
                    .context("预览会话意外关闭")?;
                render::render_preview(session)
            }
            GenerateOutcome::Committed => render::render_schedule(&self.facade),
        }
    }

    pub async fn action_types(&mut self) -> Result<String> {
        let action_types = self
            .facade
            .load_action_types()
            .await
            .context("获取动作类型失败")?;
        render::render_action_types(action_types)
    }
}
