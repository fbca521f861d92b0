use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("网络错误: {0}")]
    Network(String),
    #[error("发布记录不存在: {id}")]
    ReleaseNotFound { id: String },
    #[error("发布目标不存在: {id}")]
    TargetNotFound { id: String },
    #[error("{0}")]
    Validation(String),
    #[error("本地状态与服务端不一致: {0}")]
    StateInconsistency(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("本地存储错误: {0}")]
    Storage(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("草稿索引越界: index={index}, len={len}")]
    InvalidIndex { index: usize, len: usize },
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type ReleaseResult<T> = Result<T, ReleaseError>;

impl ReleaseError {
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }
    pub fn release_not_found<S: Into<String>>(id: S) -> Self {
        Self::ReleaseNotFound { id: id.into() }
    }
    pub fn target_not_found<S: Into<String>>(id: S) -> Self {
        Self::TargetNotFound { id: id.into() }
    }
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn storage_error<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReleaseError::ReleaseNotFound { .. } | ReleaseError::TargetNotFound { .. }
        )
    }
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReleaseError::Network(_) | ReleaseError::Storage(_))
    }
    /// 提示给用户的文案；校验错误原样透出
    pub fn user_message(&self) -> String {
        match self {
            ReleaseError::Validation(msg) => msg.clone(),
            ReleaseError::ReleaseNotFound { .. } => "该发布记录已不存在".to_string(),
            ReleaseError::TargetNotFound { .. } => "该发布目标已不存在".to_string(),
            ReleaseError::Network(_) => "网络请求失败，请稍后重试".to_string(),
            ReleaseError::StateInconsistency(_) => "本地状态已回滚，请刷新后重试".to_string(),
            ReleaseError::InvalidIndex { .. } => "草稿条目不存在".to_string(),
            _ => "系统繁忙，请稍后重试".to_string(),
        }
    }
}

impl From<serde_json::Error> for ReleaseError {
    fn from(err: serde_json::Error) -> Self {
        ReleaseError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for ReleaseError {
    fn from(err: anyhow::Error) -> Self {
        ReleaseError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests;
