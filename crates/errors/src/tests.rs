use crate::*;

#[test]
fn test_release_error_display() {
    let network = ReleaseError::Network("connection refused".to_string());
    assert_eq!(network.to_string(), "网络错误: connection refused");

    let missing = ReleaseError::release_not_found("r-1");
    assert_eq!(missing.to_string(), "发布记录不存在: r-1");

    let target = ReleaseError::target_not_found("t-9");
    assert_eq!(target.to_string(), "发布目标不存在: t-9");

    let index = ReleaseError::InvalidIndex { index: 4, len: 2 };
    assert_eq!(index.to_string(), "草稿索引越界: index=4, len=2");
}

#[test]
fn test_validation_message_is_verbatim() {
    let err = ReleaseError::validation_error("amountOfChapters must be >= 1");
    assert_eq!(err.to_string(), "amountOfChapters must be >= 1");
    assert_eq!(err.user_message(), "amountOfChapters must be >= 1");
}

#[test]
fn test_error_classification() {
    assert!(ReleaseError::release_not_found("a").is_not_found());
    assert!(ReleaseError::target_not_found("a").is_not_found());
    assert!(!ReleaseError::network("x").is_not_found());

    assert!(ReleaseError::network("x").is_retryable());
    assert!(ReleaseError::storage_error("x").is_retryable());
    assert!(!ReleaseError::validation_error("x").is_retryable());
}

#[test]
fn test_error_conversions() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: ReleaseError = json_err.into();
    assert!(matches!(err, ReleaseError::Serialization(_)));

    let err: ReleaseError = anyhow::anyhow!("boom").into();
    assert!(matches!(err, ReleaseError::Internal(ref m) if m == "boom"));
}
