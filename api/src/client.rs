use crate::wire::{PageResponse, error_message};
use crate::{Match, MatchPage, MatchQuery, SaveMatchRequest};
use reqwest::{Client, RequestBuilder, Response};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";

/// Client for the match backend under `/bet`.
#[derive(Debug, Clone)]
pub struct BetApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for BetApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// No response at all: connection refused, DNS, timeout.
    Network(reqwest::Error, String),
    /// Non-2xx response. `message` is the backend's own text when it sent one.
    Rejected { status: u16, message: String },
    Parsing(reqwest::Error, String),
    Other(String),
}

impl ApiError {
    /// Text shown to the user. Server messages pass through untouched.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(..) => "Could not reach the match service.".to_string(),
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Parsing(..) => "Unexpected response from the match service.".to_string(),
            ApiError::Other(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Rejected { status, message } => write!(f, "Rejected ({status}): {message}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl BetApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("betdesk/0.1 (terminal match manager)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of matches. Public endpoint, no credentials.
    pub async fn list_matches(&self, query: &MatchQuery) -> ApiResult<MatchPage> {
        let url = format!("{}/bet/matches", self.base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
            ("sortBy", query.sort_by.as_str().to_string()),
            ("direction", query.direction.as_str().to_string()),
        ];
        if let Some(owner) = &query.owner {
            params.push(("owner", owner.clone()));
        }
        if let Some(sport) = query.sport {
            params.push(("sport", sport.label().to_string()));
        }
        if let Some(date) = query.match_date {
            params.push(("matchDate", date.format("%Y-%m-%d").to_string()));
        }

        let response = self.send(self.client.get(&url).query(&params), &url).await?;
        let raw: PageResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parsing(e, url))?;
        Ok(MatchPage { items: raw.content, total_pages: raw.total_pages })
    }

    pub async fn create_match(&self, payload: &SaveMatchRequest, token: &str) -> ApiResult<Match> {
        let url = format!("{}/bet/saveMatch", self.base_url);
        let request = self.client.post(&url).bearer_auth(token).json(payload);
        let response = self.send(request, &url).await?;
        response.json().await.map_err(|e| ApiError::Parsing(e, url))
    }

    pub async fn update_match(
        &self,
        match_id: &str,
        payload: &SaveMatchRequest,
        token: &str,
    ) -> ApiResult<Match> {
        let url = format!("{}/bet/updateMatch/{match_id}", self.base_url);
        let request = self.client.put(&url).bearer_auth(token).json(payload);
        let response = self.send(request, &url).await?;
        response.json().await.map_err(|e| ApiError::Parsing(e, url))
    }

    pub async fn delete_match(&self, match_id: &str, token: &str) -> ApiResult<()> {
        let url = format!("{}/bet/matches/{match_id}", self.base_url);
        self.send(self.client.delete(&url).bearer_auth(token), &url).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> ApiResult<Response> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        Err(ApiError::Rejected { status: status.as_u16(), message })
    }
}
