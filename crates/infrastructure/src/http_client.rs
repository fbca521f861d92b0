use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use release_config::ApiClientConfig;
use release_domain::{GenerateOutcome, Release, ReleaseApi, ScheduleRequest};
use release_errors::{ReleaseError, ReleaseResult};

/// 后端返回的结构化错误体
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    detail: Option<String>,
}

/// 404 时应当映射成的错误类型
#[derive(Debug, Clone, Copy)]
enum Subject<'a> {
    Release(&'a str),
    Target(&'a str),
    Other,
}

fn transport_error(err: reqwest::Error) -> ReleaseError {
    ReleaseError::network(format!("请求发送失败: {err}"))
}

/// 把非 2xx 响应翻译为错误
async fn response_error(response: Response, subject: Subject<'_>) -> ReleaseError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        match subject {
            Subject::Release(id) => return ReleaseError::release_not_found(id),
            Subject::Target(id) => return ReleaseError::target_not_found(id),
            Subject::Other => {}
        }
    }

    let body = response.text().await.unwrap_or_default();
    if let Ok(ErrorPayload {
        message: Some(message),
        detail,
    }) = serde_json::from_str::<ErrorPayload>(&body)
    {
        return match detail {
            Some(detail) if !detail.is_empty() => {
                ReleaseError::validation_error(format!("{message}: {detail}"))
            }
            _ => ReleaseError::validation_error(message),
        };
    }
    ReleaseError::network(format!("HTTP {status} - {body}"))
}

async fn expect_success(response: Response, subject: Subject<'_>) -> ReleaseResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let err = response_error(response, subject).await;
        warn!("请求失败: {}", err);
        Err(err)
    }
}

async fn read_releases(response: Response) -> ReleaseResult<Vec<Release>> {
    let releases: Vec<Release> = response.json().await.map_err(|e| {
        ReleaseError::Serialization(format!("无法解析发布列表: {e}"))
    })?;
    Ok(releases.into_iter().map(Release::normalized).collect())
}

/// 基于 reqwest 的后端接口客户端
#[derive(Debug, Clone)]
pub struct HttpReleaseApi {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpReleaseApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ApiClientConfig) -> ReleaseResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let http_client = builder
            .build()
            .map_err(|e| ReleaseError::config_error(format!("创建HTTP客户端失败: {e}")))?;
        Ok(Self {
            base_url: config.trimmed_base_url().to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ReleaseApi for HttpReleaseApi {
    #[instrument(skip(self))]
    async fn fetch_schedule(&self, book_id: &str) -> ReleaseResult<Vec<Release>> {
        let url = self.url(&format!("/books/{book_id}/schedule"));
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_success(response, Subject::Other).await?;
        let releases = read_releases(response).await?;
        debug!("获取到 {} 条发布", releases.len());
        Ok(releases)
    }

    #[instrument(skip(self))]
    async fn toggle_executed(&self, release_id: &str) -> ReleaseResult<()> {
        let url = self.url(&format!("/releases/{release_id}/executed"));
        let response = self
            .http_client
            .patch(&url)
            .send()
            .await
            .map_err(transport_error)?;
        expect_success(response, Subject::Release(release_id)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn execute_release(&self, release_id: &str) -> ReleaseResult<()> {
        let url = self.url(&format!("/releases/{release_id}/execute"));
        let response = self
            .http_client
            .post(&url)
            .send()
            .await
            .map_err(transport_error)?;
        expect_success(response, Subject::Release(release_id)).await?;
        Ok(())
    }

    #[instrument(skip(self, release), fields(release_id = release.id_str()))]
    async fn update_release(&self, release: &Release) -> ReleaseResult<()> {
        let release_id = release
            .id
            .as_deref()
            .ok_or_else(|| ReleaseError::validation_error("发布记录缺少id，无法更新"))?;
        let url = self.url(&format!("/releases/{release_id}"));
        let response = self
            .http_client
            .put(&url)
            .json(release)
            .send()
            .await
            .map_err(transport_error)?;
        expect_success(response, Subject::Release(release_id)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_release(&self, release_id: &str) -> ReleaseResult<()> {
        let url = self.url(&format!("/releases/{release_id}"));
        let response = self
            .http_client
            .delete(&url)
            .send()
            .await
            .map_err(transport_error)?;
        expect_success(response, Subject::Release(release_id)).await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(releases = request.releases.len()))]
    async fn generate_release(
        &self,
        book_id: &str,
        request: &ScheduleRequest,
        preview: bool,
    ) -> ReleaseResult<GenerateOutcome> {
        let url = self.url(&format!("/books/{book_id}/generate-release"));
        let response = self
            .http_client
            .post(&url)
            .query(&[("preview", preview)])
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_success(response, Subject::Other).await?;

        if preview {
            let releases = read_releases(response).await?;
            debug!("服务端模拟返回 {} 条发布", releases.len());
            Ok(GenerateOutcome::Simulated(releases))
        } else {
            Ok(GenerateOutcome::Committed)
        }
    }

    #[instrument(skip(self))]
    async fn fetch_target_releases(&self, target_id: &str) -> ReleaseResult<Vec<Release>> {
        let url = self.url(&format!("/release-targets/{target_id}/releases"));
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_success(response, Subject::Target(target_id)).await?;
        read_releases(response).await
    }

    #[instrument(skip(self))]
    async fn toggle_target_enabled(&self, target_id: &str) -> ReleaseResult<()> {
        let url = self.url(&format!("/release-targets/{target_id}/enabled"));
        let response = self
            .http_client
            .patch(&url)
            .send()
            .await
            .map_err(transport_error)?;
        expect_success(response, Subject::Target(target_id)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_action_types(&self) -> ReleaseResult<Vec<String>> {
        let url = self.url("/action-types");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_success(response, Subject::Other).await?;
        response
            .json()
            .await
            .map_err(|e| ReleaseError::Serialization(format!("无法解析动作类型: {e}")))
    }
}
