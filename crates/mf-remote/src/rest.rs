//! Bearer-token JSON client shared by the REST collaborators.

use crate::error::{RemoteError, RemoteResult};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub(crate) struct RestClient {
    client: Client,
    base_url: String,
    token: String,
}

impl RestClient {
    pub(crate) fn new(base_url: impl Into<String>, token: impl Into<String>) -> RemoteResult<Self> {
        let base_url: String = base_url.into();
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> RemoteResult<T> {
        let raw = format!("{}{}", self.base_url, path);
        let url = Url::parse_with_params(&raw, query).map_err(|e| RemoteError::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })?;
        log::debug!("GET {path}");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> RemoteResult<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {path}");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> RemoteResult<T> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let body: Option<ApiErrorBody> = serde_json::from_str(&text).ok();
            let (error_code, message) = match body {
                Some(b) => (b.error_code, b.message.unwrap_or_else(|| text.clone())),
                None => (None, text),
            };
            return Err(RemoteError::Api {
                endpoint: path.to_string(),
                status: status.as_u16(),
                error_code,
                message,
            });
        }
        // Some endpoints answer with an empty body on success.
        let text = if text.trim().is_empty() { "{}" } else { &text };
        serde_json::from_str(text).map_err(|e| RemoteError::MalformedResponse {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }
}
