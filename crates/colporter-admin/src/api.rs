//! REST client for the program API
//!
//! Every request carries the current bearer token. A 401/403 response
//! triggers exactly one token refresh followed by exactly one retry of the
//! original request; there are no other retries.

use chrono::NaiveDate;
use colporter_reports::constants::DATE_FORMAT;
use colporter_reports::model::{
    BonificationTotals, CashAdvance, Charge, DashboardStats, Expense, LeaderPercentage, Person,
    ProgramConfig, ReviewStatus, Transaction,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants;

// =============================================================================
// Errors
// =============================================================================

/// Response body attached to an HTTP error
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(serde_json::Value),
    Text(String),
}

impl ApiBody {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => ApiBody::Json(value),
            Err(_) => ApiBody::Text(raw.to_string()),
        }
    }

    /// Server-provided message, if the body carries one
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiBody::Json(value) => value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(|m| m.as_str()),
            ApiBody::Text(text) if !text.trim().is_empty() => Some(text.trim()),
            ApiBody::Text(_) => None,
        }
    }
}

impl std::fmt::Display for ApiBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}", message),
            None => match self {
                ApiBody::Json(value) => write!(f, "{}", value),
                ApiBody::Text(_) => write!(f, "(empty body)"),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{path} returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: ApiBody,
    },

    #[error("request to {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

// =============================================================================
// Interceptor
// =============================================================================

/// What to do with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Accept,
    RefreshAndRetry,
    Reject,
}

fn is_auth_failure(status: u16) -> bool {
    status == 401 || status == 403
}

/// One-shot refresh rule: an auth failure is retried once, never twice
pub fn next_step(status: u16, already_retried: bool) -> NextStep {
    if (200..300).contains(&status) {
        NextStep::Accept
    } else if is_auth_failure(status) && !already_retried {
        NextStep::RefreshAndRetry
    } else {
        NextStep::Reject
    }
}

// =============================================================================
// Session tokens
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Current tokens, persisted to the session file whenever they change.
///
/// The lock is only held to copy tokens in or out, never across an await.
pub struct TokenStore {
    session: Mutex<Session>,
    path: PathBuf,
}

impl TokenStore {
    /// Load the persisted session, falling back to the configured tokens
    pub fn load(path: &Path, fallback: Session) -> Self {
        let persisted = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Session>(&content).ok())
            .filter(|s| s.access_token.is_some() || s.refresh_token.is_some());

        let session = match persisted {
            Some(session) => {
                debug!(path = %path.display(), "Using persisted session");
                session
            }
            None => fallback,
        };

        Self {
            session: Mutex::new(session),
            path: path.to_path_buf(),
        }
    }

    fn snapshot(&self) -> Session {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.snapshot().access_token
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.snapshot().refresh_token
    }

    pub fn store(&self, session: Session) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session.clone();

        let written = serde_json::to_string_pretty(&session)
            .map_err(std::io::Error::other)
            .and_then(|json| {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, json)
            });
        if let Err(e) = written {
            warn!(path = %self.path.display(), error = %e, "Failed to persist session");
        }
    }

    /// Forget all tokens and remove the session file
    pub fn clear(&self) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Session::default();

        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to remove session file");
            }
        }
    }
}

// =============================================================================
// Query filters
// =============================================================================

/// Optional filters; only the ones that are set are sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub status: Option<ReviewStatus>,
    pub student_id: Option<String>,
    pub leader_id: Option<String>,
    pub program_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Query {
    pub fn program(program_id: &str) -> Self {
        Self {
            program_id: Some(program_id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ReviewStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_student(mut self, student_id: &str) -> Self {
        self.student_id = Some(student_id.to_string());
        self
    }

    pub fn with_leader(mut self, leader_id: &str) -> Self {
        self.leader_id = Some(leader_id.to_string());
        self
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let fmt = |d: &NaiveDate| d.format(DATE_FORMAT).to_string();
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.to_string()));
        }
        if let Some(id) = &self.student_id {
            params.push(("studentId", id.clone()));
        }
        if let Some(id) = &self.leader_id {
            params.push(("leaderId", id.clone()));
        }
        if let Some(id) = &self.program_id {
            params.push(("programId", id.clone()));
        }
        if let Some(date) = &self.date {
            params.push(("date", fmt(date)));
        }
        if let Some(date) = &self.start_date {
            params.push(("startDate", fmt(date)));
        }
        if let Some(date) = &self.end_date {
            params.push(("endDate", fmt(date)));
        }
        params
    }
}

/// Build a request URL from the base URL, a resource path and filters
pub fn build_url(base_url: &str, path: &str, params: &[(&str, String)]) -> ApiResult<Url> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    let result = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params.iter().map(|(k, v)| (*k, v.as_str())))
    };
    result.map_err(|e| ApiError::InvalidUrl {
        url: raw,
        reason: e.to_string(),
    })
}

// =============================================================================
// Wire envelopes
// =============================================================================

/// List endpoints answer either with a bare array or with `{ "data": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListResponse<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Bare(items) | ListResponse::Wrapped { data: items } => items,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Program API client
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(config: &Config) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Client)?;

        let tokens = TokenStore::load(
            &config.session_path,
            Session {
                access_token: config.access_token.clone(),
                refresh_token: config.refresh_token.clone(),
            },
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    async fn send(&self, path: &str, url: &Url) -> ApiResult<reqwest::Response> {
        let mut request = self
            .client
            .get(url.clone())
            .header("Accept", "application/json");
        if let Some(token) = self.tokens.access_token() {
            request = request.bearer_auth(token);
        }
        request.send().await.map_err(|source| ApiError::Network {
            path: path.to_string(),
            source,
        })
    }

    async fn read_body(path: &str, response: reqwest::Response) -> ApiResult<String> {
        response.text().await.map_err(|source| ApiError::Network {
            path: path.to_string(),
            source,
        })
    }

    /// GET a JSON resource through the one-shot refresh interceptor
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = build_url(&self.base_url, path, params)?;
        let mut retried = false;

        loop {
            debug!(%url, "GET");
            let response = self.send(path, &url).await?;
            let status = response.status().as_u16();

            match next_step(status, retried) {
                NextStep::Accept => {
                    let body = Self::read_body(path, response).await?;
                    return serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                        path: path.to_string(),
                        source,
                    });
                }
                NextStep::RefreshAndRetry => {
                    info!(path, status, "Access token rejected, refreshing");
                    self.refresh().await?;
                    retried = true;
                }
                NextStep::Reject => {
                    let body = Self::read_body(path, response).await.unwrap_or_default();
                    return Err(ApiError::Status {
                        path: path.to_string(),
                        status,
                        body: ApiBody::parse(&body),
                    });
                }
            }
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str, query: &Query) -> ApiResult<Vec<T>> {
        let list: ListResponse<T> = self.get_json(path, &query.params()).await?;
        let items = list.into_vec();
        debug!(path, count = items.len(), "Fetched list");
        Ok(items)
    }

    /// Exchange the refresh token for new tokens; any failure clears the session
    async fn refresh(&self) -> ApiResult<()> {
        match self.request_refresh().await {
            Ok(session) => {
                self.tokens.store(session);
                Ok(())
            }
            Err(reason) => {
                warn!(%reason, "Token refresh failed, clearing session");
                self.tokens.clear();
                Err(ApiError::RefreshFailed(reason))
            }
        }
    }

    async fn request_refresh(&self) -> Result<Session, String> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .ok_or_else(|| "no refresh token available".to_string())?;
        let url = build_url(&self.base_url, constants::AUTH_REFRESH_PATH, &[])
            .map_err(|e| e.to_string())?;

        let response = self
            .client
            .post(url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("refresh endpoint returned HTTP {}", status.as_u16()));
        }

        let body: RefreshResponse = response.json().await.map_err(|e| e.to_string())?;
        Ok(Session {
            access_token: Some(body.access_token),
            refresh_token: body.refresh_token.or(Some(refresh_token)),
        })
    }

    // =========================================================================
    // Resources
    // =========================================================================

    pub async fn transactions(&self, query: &Query) -> ApiResult<Vec<Transaction>> {
        self.get_list(constants::TRANSACTIONS_PATH, query).await
    }

    pub async fn expenses(&self, query: &Query) -> ApiResult<Vec<Expense>> {
        self.get_list(constants::EXPENSES_PATH, query).await
    }

    pub async fn cash_advances(&self, query: &Query) -> ApiResult<Vec<CashAdvance>> {
        self.get_list(constants::CASH_ADVANCES_PATH, query).await
    }

    pub async fn charges(&self, query: &Query) -> ApiResult<Vec<Charge>> {
        self.get_list(constants::CHARGES_PATH, query).await
    }

    pub async fn people(&self, query: &Query) -> ApiResult<Vec<Person>> {
        self.get_list(constants::PEOPLE_PATH, query).await
    }

    pub async fn leader_percentages(&self, query: &Query) -> ApiResult<Vec<LeaderPercentage>> {
        self.get_list(constants::LEADER_PERCENTAGES_PATH, query).await
    }

    pub async fn program(&self, program_id: &str) -> ApiResult<ProgramConfig> {
        let path = format!("{}/{}", constants::PROGRAM_PATH, program_id);
        self.get_json(&path, &[]).await
    }

    /// Server-aggregated hours and net amounts across the given programs
    pub async fn bonification_totals(
        &self,
        program_ids: &[String],
    ) -> ApiResult<Vec<BonificationTotals>> {
        let mut params = Vec::new();
        if !program_ids.is_empty() {
            params.push(("programIds", program_ids.join(",")));
        }
        let list: ListResponse<BonificationTotals> = self
            .get_json(constants::BONIFICATION_STATUS_PATH, &params)
            .await?;
        Ok(list.into_vec())
    }

    pub async fn dashboard_stats(&self, program_id: Option<&str>) -> ApiResult<DashboardStats> {
        let query = program_id.map(Query::program).unwrap_or_default();
        self.get_json(constants::DASHBOARD_STATS_PATH, &query.params())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_session_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("colporter-admin-test-{}-{}", std::process::id(), name))
            .join(constants::SESSION_FILENAME)
    }

    #[test]
    fn test_next_step_refreshes_once() {
        assert_eq!(next_step(200, false), NextStep::Accept);
        assert_eq!(next_step(204, true), NextStep::Accept);
        assert_eq!(next_step(401, false), NextStep::RefreshAndRetry);
        assert_eq!(next_step(403, false), NextStep::RefreshAndRetry);
        // Second auth failure after the retry is an error
        assert_eq!(next_step(401, true), NextStep::Reject);
        assert_eq!(next_step(403, true), NextStep::Reject);
    }

    #[test]
    fn test_next_step_never_retries_other_errors() {
        assert_eq!(next_step(404, false), NextStep::Reject);
        assert_eq!(next_step(500, false), NextStep::Reject);
        assert_eq!(next_step(429, false), NextStep::Reject);
    }

    #[test]
    fn test_query_sends_only_set_filters() {
        assert!(Query::default().params().is_empty());

        let query = Query::program("p1")
            .with_status(ReviewStatus::Approved)
            .with_student("c7")
            .with_range(
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            );

        assert_eq!(
            query.params(),
            vec![
                ("status", "APPROVED".to_string()),
                ("studentId", "c7".to_string()),
                ("programId", "p1".to_string()),
                ("startDate", "2025-06-01".to_string()),
                ("endDate", "2025-06-30".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_url() {
        let url = build_url(
            "https://admin.example.org/api/",
            "/transactions",
            &Query::program("p 1").with_leader("l2").params(),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://admin.example.org/api/transactions?leaderId=l2&programId=p+1"
        );

        let bare = build_url("https://admin.example.org/api", "/people", &[]).unwrap();
        assert_eq!(bare.as_str(), "https://admin.example.org/api/people");

        assert!(build_url("not a url", "/people", &[]).is_err());
    }

    #[test]
    fn test_error_body_is_parsed() {
        let json = ApiBody::parse(r#"{"message": "Token expired"}"#);
        assert_eq!(json.message(), Some("Token expired"));

        let text = ApiBody::parse("Bad Gateway");
        assert_eq!(text, ApiBody::Text("Bad Gateway".to_string()));

        let err = ApiError::Status {
            path: "/expenses".to_string(),
            status: 422,
            body: json,
        };
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.to_string(), "/expenses returned HTTP 422: Token expired");
    }

    #[test]
    fn test_list_response_accepts_both_shapes() {
        let bare: ListResponse<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2]);

        let wrapped: ListResponse<u32> = serde_json::from_str(r#"{"data": [3]}"#).unwrap();
        assert_eq!(wrapped.into_vec(), vec![3]);
    }

    #[test]
    fn test_token_store_persists_and_clears() {
        let path = temp_session_path("persist");
        let _ = std::fs::remove_file(&path);

        let store = TokenStore::load(
            &path,
            Session {
                access_token: Some("from-config".to_string()),
                refresh_token: Some("r1".to_string()),
            },
        );
        assert_eq!(store.access_token().as_deref(), Some("from-config"));

        store.store(Session {
            access_token: Some("fresh".to_string()),
            refresh_token: Some("r2".to_string()),
        });
        assert!(path.exists());

        // A new store prefers the persisted session over the config tokens
        let reloaded = TokenStore::load(&path, Session::default());
        assert_eq!(reloaded.access_token().as_deref(), Some("fresh"));
        assert_eq!(reloaded.refresh_token().as_deref(), Some("r2"));

        reloaded.clear();
        assert!(!path.exists());
        assert!(reloaded.access_token().is_none());
    }
}
