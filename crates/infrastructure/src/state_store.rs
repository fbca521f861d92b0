use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use release_domain::StateStore;
use release_errors::{ReleaseError, ReleaseResult};

type StateMap = BTreeMap<String, String>;

/// 以单个 JSON 对象文件保存的键值存储
///
/// 文件内容形如 `{"releaseFilters": "{...}", "managementCollapsed": "true"}`。
/// 写入先落到临时文件再改名，进程中途退出不会留下半截文件。
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> ReleaseResult<StateMap> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StateMap::new()),
            Err(e) => {
                return Err(ReleaseError::storage_error(format!(
                    "读取状态文件失败 {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(StateMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            ReleaseError::storage_error(format!("状态文件已损坏 {}: {e}", self.path.display()))
        })
    }

    fn write_map(&self, map: &StateMap) -> ReleaseResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ReleaseError::storage_error(format!("创建目录失败 {}: {e}", parent.display()))
            })?;
        }

        let content = serde_json::to_string_pretty(map)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content).map_err(|e| {
            ReleaseError::storage_error(format!("写入状态文件失败 {}: {e}", tmp_path.display()))
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ReleaseError::storage_error(format!("替换状态文件失败 {}: {e}", self.path.display()))
        })
    }

    fn guard(&self) -> ReleaseResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| ReleaseError::Internal("状态存储锁已中毒".to_string()))
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> ReleaseResult<Option<String>> {
        let _guard = self.guard()?;
        let mut map = self.read_map()?;
        Ok(map.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> ReleaseResult<()> {
        let _guard = self.guard()?;
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(e) => {
                warn!("状态文件不可读，将被覆盖: {}", e);
                StateMap::new()
            }
        };
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)?;
        debug!("已保存状态键 {}", key);
        Ok(())
    }
}
