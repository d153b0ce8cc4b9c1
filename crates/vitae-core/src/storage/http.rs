//! REST client for the remote template service.

use super::{
    AuthToken, BoxFuture, Scope, StoreError, StoreResult, TemplateDraft, TemplateId,
    TemplateRecord, TemplateStore,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct RatingBody {
    rating: u8,
}

/// Template store backed by the HTTP document service.
///
/// Routes: `{base}/personal-template[/{id}]`, `{base}/public-template[/{id}[/rate]]`.
/// The bearer token is forwarded verbatim whenever one is supplied.
#[derive(Clone)]
pub struct HttpTemplateStore {
    client: Client,
    base_url: Url,
}

impl HttpTemplateStore {
    /// Create a client for the service rooted at `base_url`, e.g. `https://host/api`.
    pub fn new(base_url: &str) -> StoreResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Unavailable(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(request: RequestBuilder, auth: Option<&str>) -> RequestBuilder {
        match auth {
            Some(header) => request.header(reqwest::header::AUTHORIZATION, header),
            None => request,
        }
    }
}

/// Map a non-success status to a store error.
fn status_error(status: StatusCode, message: String, id: Option<&TemplateId>) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::AuthRequired,
        StatusCode::NOT_FOUND => StoreError::NotFound(id.map_or(message, |id| id.to_string())),
        status if status.is_server_error() => {
            StoreError::Unavailable(format!("server error {}: {}", status.as_u16(), message))
        }
        status => StoreError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

async fn check(response: Response, id: Option<&TemplateId>) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    log::debug!("Template service answered {status}: {message}");
    Err(status_error(status, message, id))
}

async fn decode<T: DeserializeOwned>(response: Response, id: Option<&TemplateId>) -> StoreResult<T> {
    let response = check(response, id).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

impl TemplateStore for HttpTemplateStore {
    fn get(&self, scope: Scope, id: &TemplateId, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let url = self.endpoint(&[scope.path_segment(), id.as_str()]);
        let id = id.clone();
        let auth = auth.map(AuthToken::bearer);
        Box::pin(async move {
            let request = Self::authorize(self.client.get(url?), auth.as_deref());
            let response = request.send().await.map_err(transport_error)?;
            decode(response, Some(&id)).await
        })
    }

    fn list(&self, scope: Scope, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<Vec<TemplateRecord>>> {
        let url = self.endpoint(&[scope.path_segment()]);
        let auth = auth.map(AuthToken::bearer);
        Box::pin(async move {
            let request = Self::authorize(self.client.get(url?), auth.as_deref());
            let response = request.send().await.map_err(transport_error)?;
            decode(response, None).await
        })
    }

    fn create(&self, scope: Scope, draft: TemplateDraft, auth: Option<&AuthToken>) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let url = self.endpoint(&[scope.path_segment()]);
        let auth = auth.map(AuthToken::bearer);
        Box::pin(async move {
            let request = Self::authorize(self.client.post(url?).json(&draft), auth.as_deref());
            let response = request.send().await.map_err(transport_error)?;
            decode(response, None).await
        })
    }

    fn update(&self, id: &TemplateId, draft: TemplateDraft, auth: &AuthToken) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let url = self.endpoint(&[Scope::Owner.path_segment(), id.as_str()]);
        let id = id.clone();
        let auth = auth.bearer();
        Box::pin(async move {
            let request = Self::authorize(self.client.put(url?).json(&draft), Some(&auth));
            let response = request.send().await.map_err(transport_error)?;
            decode(response, Some(&id)).await
        })
    }

    fn delete(&self, id: &TemplateId, auth: &AuthToken) -> BoxFuture<'_, StoreResult<()>> {
        let url = self.endpoint(&[Scope::Owner.path_segment(), id.as_str()]);
        let id = id.clone();
        let auth = auth.bearer();
        Box::pin(async move {
            let request = Self::authorize(self.client.delete(url?), Some(&auth));
            let response = request.send().await.map_err(transport_error)?;
            check(response, Some(&id)).await?;
            Ok(())
        })
    }

    fn rate(&self, id: &TemplateId, rating: u8, auth: &AuthToken) -> BoxFuture<'_, StoreResult<TemplateRecord>> {
        let url = self.endpoint(&[Scope::Public.path_segment(), id.as_str(), "rate"]);
        let id = id.clone();
        let auth = auth.bearer();
        Box::pin(async move {
            let request = Self::authorize(
                self.client.post(url?).json(&RatingBody { rating }),
                Some(&auth),
            );
            let response = request.send().await.map_err(transport_error)?;
            decode(response, Some(&id)).await
        })
    }
}
