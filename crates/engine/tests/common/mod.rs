#![allow(dead_code)]

use std::sync::Arc;

use release_engine::{Collaborators, ScheduleFacade};
use release_testing_utils::{
    date, sample_schedule, FixedClock, MemoryStateStore, MockReleaseApi, RecordingNotifier,
};

pub const BOOK_ID: &str = "book-1";

/// 一组共享状态的测试替身；`facade()` 每次用同一组替身构造新的门面
pub struct Harness {
    pub api: MockReleaseApi,
    pub store: MemoryStateStore,
    pub notifier: RecordingNotifier,
    pub clock: FixedClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryStateStore::new())
    }

    pub fn with_store(store: MemoryStateStore) -> Self {
        Self {
            api: MockReleaseApi::with_releases(sample_schedule()),
            store,
            notifier: RecordingNotifier::new(),
            clock: FixedClock::on(date("2024-01-10")),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            api: Arc::new(self.api.clone()),
            store: Arc::new(self.store.clone()),
            notifier: Arc::new(self.notifier.clone()),
            clock: Arc::new(self.clock.clone()),
        }
    }

    pub fn facade(&self) -> ScheduleFacade {
        ScheduleFacade::new(BOOK_ID, self.collaborators())
    }

    pub async fn loaded(&self) -> ScheduleFacade {
        let mut facade = self.facade();
        facade.load().await.expect("sample schedule should load");
        self.notifier.clear();
        facade
    }
}

pub fn ids(releases: &[release_domain::Release]) -> Vec<&str> {
    releases.iter().map(|r| r.id_str()).collect()
}
