use tracing::{info, warn};

use release_domain::{Notice, NoticeLevel, Notifier};

/// 把提示写入日志，命令行场景下替代弹出式提示
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(target: "release_planner::notice", "{}", notice.message),
            NoticeLevel::Error => warn!(target: "release_planner::notice", "{}", notice.message),
        }
    }
}
