use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// 本地键值存储（过滤条件、面板折叠状态）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub state_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: ".release-planner/state.json".to_string(),
        }
    }
}

impl ConfigValidator for StorageConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.state_file, "storage.state_file")
    }
}
