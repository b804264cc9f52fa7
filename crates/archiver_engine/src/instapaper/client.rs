use std::time::Duration;

use archiver_core::{ApiView, Highlight};
use archiver_logging::archive_debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use super::decode::decode_text;
use super::oauth::{Credentials, OAuthSigner};
use super::wire;
use crate::{BookmarkSource, Folder, FolderId, SourceError};

pub const DEFAULT_BASE_URL: &str = "https://www.instapaper.com";

const ACCESS_TOKEN_PATH: &str = "/api/1/oauth/access_token";
const FOLDERS_LIST_PATH: &str = "/api/1/folders/list";
const BOOKMARKS_LIST_PATH: &str = "/api/1/bookmarks/list";
const GET_TEXT_PATH: &str = "/api/1/bookmarks/get_text";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Authenticated Instapaper session. Cheap to share behind an `Arc`; the
/// underlying `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct InstapaperClient {
    http: reqwest::Client,
    base_url: String,
    signer: OAuthSigner,
}

struct Body {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl InstapaperClient {
    /// Exchanges the account credentials for an access token (xAuth).
    pub async fn authenticate(
        settings: ClientSettings,
        consumer: Credentials,
        username: &str,
        password: &str,
    ) -> Result<Self, SourceError> {
        let mut client = Self::with_token(settings, consumer.clone(), None)?;
        let params = [
            ("x_auth_username", username),
            ("x_auth_password", password),
            ("x_auth_mode", "client_auth"),
        ];
        let body = match client.post(ACCESS_TOKEN_PATH, &params).await {
            Ok(body) => body,
            Err(SourceError::Status { status, message })
                if status == StatusCode::FORBIDDEN.as_u16() =>
            {
                return Err(SourceError::Auth(message));
            }
            Err(err) => return Err(err),
        };

        let token = parse_access_token(&body.bytes)?;
        archive_debug!("authenticated against {}", client.base_url);
        client.signer = OAuthSigner::new(consumer, Some(token));
        Ok(client)
    }

    /// A client for an already issued access token, or an unauthenticated one when `token` is `None`.
    pub fn with_token(
        settings: ClientSettings,
        consumer: Credentials,
        token: Option<Credentials>,
    ) -> Result<Self, SourceError> {
        let base_url = reqwest::Url::parse(&settings.base_url)
            .map_err(|err| SourceError::Network(format!("invalid base url {}: {err}", settings.base_url)))?
            .as_str()
            .trim_end_matches('/')
            .to_string();
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SourceError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            signer: OAuthSigner::new(consumer, token),
        })
    }

    async fn post(&self, path: &str, params: &[(&str, &str)]) -> Result<Body, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let authorization = self.signer.authorization("POST", &url, params)?;
        let form = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().copied())
            .finish();

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

        if !status.is_success() {
            let message = wire::error_message(&bytes).unwrap_or_else(|| status.to_string());
            if status == StatusCode::UNAUTHORIZED {
                return Err(SourceError::Auth(message));
            }
            return Err(SourceError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(Body {
            bytes,
            content_type,
        })
    }
}

#[async_trait::async_trait]
impl BookmarkSource for InstapaperClient {
    async fn list_folders(&self) -> Result<Vec<Folder>, SourceError> {
        let body = self.post(FOLDERS_LIST_PATH, &[]).await?;
        wire::parse_folders(&body.bytes)
    }

    async fn list_bookmarks(
        &self,
        folder: &FolderId,
        limit: usize,
    ) -> Result<Vec<ApiView>, SourceError> {
        let limit = limit.to_string();
        let body = self
            .post(
                BOOKMARKS_LIST_PATH,
                &[("folder_id", folder.as_str()), ("limit", limit.as_str())],
            )
            .await?;
        wire::parse_bookmark_list(&body.bytes)
    }

    async fn get_text(&self, bookmark_id: u64) -> Result<String, SourceError> {
        let id = bookmark_id.to_string();
        let body = self.post(GET_TEXT_PATH, &[("bookmark_id", id.as_str())]).await?;
        decode_text(&body.bytes, body.content_type.as_deref())
    }

    async fn list_highlights(&self, bookmark_id: u64) -> Result<Vec<Highlight>, SourceError> {
        let path = format!("/api/1.1/bookmarks/{bookmark_id}/highlights");
        let body = self.post(&path, &[]).await?;
        wire::parse_highlights(&body.bytes)
    }
}

fn parse_access_token(body: &[u8]) -> Result<Credentials, SourceError> {
    let mut key = None;
    let mut secret = None;
    for (name, value) in url::form_urlencoded::parse(body) {
        match name.as_ref() {
            "oauth_token" => key = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {}
        }
    }
    match (key, secret) {
        (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
            Ok(Credentials::new(key, secret))
        }
        _ => Err(SourceError::Auth("access token missing from response".into())),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        return SourceError::Timeout(err.to_string());
    }
    SourceError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_is_read_from_form_body() {
        let token = parse_access_token(b"oauth_token_secret=s%2Bcret&oauth_token=tok").unwrap();
        assert_eq!(token, Credentials::new("tok", "s+cret"));
    }

    #[test]
    fn partial_token_is_an_auth_error() {
        assert!(matches!(
            parse_access_token(b"oauth_token=tok"),
            Err(SourceError::Auth(_))
        ));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let settings = ClientSettings {
            base_url: "http://127.0.0.1:9/".into(),
            ..ClientSettings::default()
        };
        let client = InstapaperClient::with_token(settings, Credentials::new("k", "s"), None).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:9");
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let settings = ClientSettings {
            base_url: "not a url".into(),
            ..ClientSettings::default()
        };
        assert!(InstapaperClient::with_token(settings, Credentials::new("k", "s"), None).is_err());
    }
}
