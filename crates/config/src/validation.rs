// 基础配置验证

use crate::{ConfigError, ConfigResult};

pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

pub struct ValidationUtils;

impl ValidationUtils {
    /// 验证字符串非空
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// 验证超时值
    pub fn validate_timeout(timeout_seconds: u64, field_name: &str) -> ConfigResult<()> {
        if timeout_seconds == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if timeout_seconds > 3600 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 3600 seconds"
            )));
        }
        Ok(())
    }

    /// 验证HTTP(S) URL
    pub fn validate_http_url(url: &str, field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(url, field_name)?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "{field_name} must start with http:// or https://"
            )));
        }

        Ok(())
    }

    pub fn validate_positive(value: f64, field_name: &str) -> ConfigResult<()> {
        if !(value > 0.0) {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        Ok(())
    }

    pub fn validate_fraction(value: f64, field_name: &str) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be within [0, 1]"
            )));
        }
        Ok(())
    }
}
