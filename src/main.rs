use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use release_config::{AppConfig, LogLevel, OutputFormat};
use release_domain::{DateBucket, FilterPatch, SortKey, StatusFilter, SubmitMode};
use release_infrastructure::init_logging;
use release_planner::{Application, PreviewPlan};

/// 连载内容发布计划命令行工具
#[derive(Parser, Debug)]
#[command(name = "release-planner")]
#[command(version = "1.0.0")]
#[command(about = "连载内容发布计划聚合与预览")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径，缺省时按默认位置查找
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long, global = true, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// 日志格式，覆盖配置文件
    #[arg(long, global = true, value_parser = ["json", "pretty"])]
    log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 显示发布表和按目标汇总的透视表
    Schedule {
        /// 书籍ID
        #[arg(short, long)]
        book: String,
        /// 只显示该目标，传空串清除
        #[arg(short, long)]
        target: Option<String>,
        /// executed | pending，传空串清除
        #[arg(short, long)]
        status: Option<String>,
        /// today | thisWeek | nextWeek | nextMonth，传空串清除
        #[arg(short, long)]
        date: Option<String>,
        /// date | target | chapters
        #[arg(long)]
        sort: Option<String>,
    },
    /// 标记发布为已执行或待执行
    Mark {
        #[arg(short, long)]
        book: String,
        /// 发布ID
        release_id: String,
        /// 标记为待执行
        #[arg(long)]
        pending: bool,
    },
    /// 按计划文件生成预览，或直接提交
    Preview {
        #[arg(short, long)]
        book: String,
        /// 计划文件(TOML)
        #[arg(short, long)]
        settings: String,
        /// 提交而不是预览
        #[arg(long)]
        commit: bool,
    },
    /// 列出后端支持的动作类型
    ActionTypes,
}

fn filter_patch(
    target: Option<String>,
    status: Option<String>,
    date: Option<String>,
    sort: Option<String>,
) -> Result<Option<FilterPatch>> {
    let patch = FilterPatch {
        target_id: target,
        status: status
            .map(|s| s.parse::<StatusFilter>())
            .transpose()?,
        date: date.map(|d| d.parse::<DateBucket>()).transpose()?,
        sort_by: sort.map(|s| s.parse::<SortKey>()).transpose()?,
    };
    Ok((patch != FilterPatch::default()).then_some(patch))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).with_context(|| {
        format!(
            "加载配置文件失败: {}",
            cli.config.as_deref().unwrap_or("<默认位置>")
        )
    })?;
    if let Some(level) = &cli.log_level {
        config.log.level = level.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }
    if let Some(format) = &cli.log_format {
        config.log.format = format.parse::<OutputFormat>().map_err(anyhow::Error::msg)?;
    }

    init_logging(&config.log)?;
    debug!("命令: {:?}", cli.command);

    let output = match cli.command {
        Commands::Schedule {
            book,
            target,
            status,
            date,
            sort,
        } => {
            let patch = filter_patch(target, status, date, sort)?;
            let mut app = Application::new(config, &book)?;
            app.schedule(patch).await?
        }
        Commands::Mark {
            book,
            release_id,
            pending,
        } => {
            let mut app = Application::new(config, &book)?;
            app.mark(&release_id, !pending).await?
        }
        Commands::Preview {
            book,
            settings,
            commit,
        } => {
            let plan = PreviewPlan::load(&settings)?;
            let mode = if commit {
                SubmitMode::Commit
            } else {
                SubmitMode::Preview
            };
            info!("书籍 {} 使用计划文件 {} ({:?})", book, settings, mode);
            let mut app = Application::new(config, &book)?;
            app.preview(&plan, mode).await?
        }
        Commands::ActionTypes => {
            let mut app = Application::new(config, "")?;
            app.action_types().await?
        }
    };

    print!("{output}");
    Ok(())
}
