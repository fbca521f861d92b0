use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// 搜索输入防抖
///
/// 新的触发会取消尚未发出的上一次请求；窗口已过、请求已发出时取消为空操作。
pub struct Debouncer {
    window: Duration,
    pending: Option<Pending>,
}

struct Pending {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn trigger<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            flag.store(true, Ordering::SeqCst);
            task.await;
        });
        self.pending = Some(Pending { handle, fired });
    }

    /// 返回是否真的取消了一个未发出的请求
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if pending.fired.load(Ordering::SeqCst) {
            return false;
        }
        pending.handle.abort();
        debug!("已取消未发出的防抖请求");
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.fired.load(Ordering::SeqCst))
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_only_last_trigger_fires() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::from_millis(300);

        for query in 1..=3 {
            let calls = Arc::clone(&calls);
            let last = Arc::clone(&last);
            debouncer.trigger(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                last.store(query, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_window_is_noop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::from_millis(50);

        let counter = Arc::clone(&calls);
        debouncer.trigger(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!debouncer.cancel());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_window() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::from_millis(50);

        let counter = Arc::clone(&calls);
        debouncer.trigger(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.cancel());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!debouncer.is_pending());
    }
}
