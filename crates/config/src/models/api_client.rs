use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// 后端接口客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiClientConfig {
    /// 形如 `http://localhost:8080/api`，所有接口路径拼接在其后
    pub base_url: String,
    /// 为空表示不设置超时
    pub request_timeout_seconds: Option<u64>,
    /// 标题搜索的防抖窗口
    pub search_debounce_ms: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            request_timeout_seconds: None,
            search_debounce_ms: 300,
        }
    }
}

impl ConfigValidator for ApiClientConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_http_url(&self.base_url, "api.base_url")?;
        if let Some(timeout) = self.request_timeout_seconds {
            ValidationUtils::validate_timeout(timeout, "api.request_timeout_seconds")?;
        }
        if self.search_debounce_ms > 10_000 {
            return Err(crate::ConfigError::Validation(
                "api.search_debounce_ms must be less than or equal to 10000".to_string(),
            ));
        }
        Ok(())
    }
}

impl ApiClientConfig {
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
