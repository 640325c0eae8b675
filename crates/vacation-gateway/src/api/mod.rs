//! Downstream vacation REST API client
//!
//! A client is built per tool call from the caller's validated token, with
//! configured overrides and built-in defaults filling the gaps:
//!
//! | setting   | first choice           | then                | default                 |
//! |-----------|------------------------|---------------------|-------------------------|
//! | base URL  | configured override    | token `link`        | `http://localhost:3000` |
//! | token     | derived credential     | `USER_SECRET`       | `default-secret`        |
//! | user id   | token `key.identifier` | `USER_ID`           | `default-user`          |

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use vacation_core::branding::{DEFAULT_API_BASE_URL, DEFAULT_USER_ID, DEFAULT_USER_SECRET};
use vacation_core::{
    CallerContext, CreateVacationFlowInput, MyVacations, StepRequirements, VacationFlowCreated,
    WorkflowAdvance,
};

use crate::error::GatewayError;

/// Per-request timeout for downstream calls
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const API_TOKEN_HEADER: &str = "x-api-token";
pub const API_ID_HEADER: &str = "x-api-id";

/// Operator-supplied settings (`VACATION_API_URL`, `USER_SECRET`, `USER_ID`)
#[derive(Debug, Clone, Default)]
pub struct ApiOverrides {
    pub base_url: Option<String>,
    pub user_secret: Option<String>,
    pub user_id: Option<String>,
}

/// Fully resolved settings for one downstream client
#[derive(Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub user_id: String,
}

impl std::fmt::Debug for ApiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl ApiClientConfig {
    pub fn resolve(caller: Option<&CallerContext>, overrides: &ApiOverrides) -> Self {
        let payload = caller.map(|c| &c.payload);

        let base_url = non_empty(overrides.base_url.as_deref())
            .or_else(|| non_empty(payload.and_then(|p| p.link.as_deref())))
            .unwrap_or(DEFAULT_API_BASE_URL)
            .to_string();

        let api_token = caller
            .map(|c| c.credential.expose())
            .or_else(|| non_empty(overrides.user_secret.as_deref()))
            .unwrap_or(DEFAULT_USER_SECRET)
            .to_string();

        let user_id = payload
            .and_then(|p| p.user_identifier())
            .or_else(|| non_empty(overrides.user_id.as_deref()).map(String::from))
            .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

        Self {
            base_url,
            api_token,
            user_id,
        }
    }
}

/// HTTP client bound to one caller's downstream identity
pub struct VacationApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl VacationApiClient {
    pub fn new(config: &ApiClientConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            API_TOKEN_HEADER,
            HeaderValue::from_str(&config.api_token).map_err(GatewayError::downstream)?,
        );
        headers.insert(
            API_ID_HEADER,
            HeaderValue::from_str(&config.user_id).map_err(GatewayError::downstream)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(GatewayError::downstream)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a client for a caller, logging the resolved identity
    pub fn for_caller(
        caller: Option<&CallerContext>,
        overrides: &ApiOverrides,
    ) -> Result<Self, GatewayError> {
        let config = ApiClientConfig::resolve(caller, overrides);

        info!(
            base_url = %config.base_url,
            user_id = %config.user_id,
            authenticated = caller.is_some(),
            "[VacationApi] Client configured"
        );
        debug!(
            api_token = %config.api_token,
            payload = ?caller.map(|c| &c.payload),
            "[VacationApi] Resolved credentials"
        );

        Self::new(&config)
    }

    pub async fn my_vacations(&self) -> Result<MyVacations, GatewayError> {
        self.get("/rest/vacation/me").await
    }

    pub async fn create_flow(
        &self,
        input: &CreateVacationFlowInput,
    ) -> Result<VacationFlowCreated, GatewayError> {
        self.post("/rest/vacation", input).await
    }

    /// Sent without a request body
    pub async fn requirements(&self) -> Result<StepRequirements, GatewayError> {
        let path = "/rest/vacation/requirements";
        let request = self.http.post(self.url(path));
        self.send(path, request).await
    }

    pub async fn advance(&self, body: &serde_json::Value) -> Result<WorkflowAdvance, GatewayError> {
        self.post("/rest/vacation/next", body).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let request = self.http.get(self.url(path));
        self.send(path, request).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(path, request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = request.send().await.map_err(GatewayError::downstream)?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "[VacationApi] Response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::DownstreamFailure(format!(
                "{} returned {}: {}",
                path, status, body
            )));
        }

        response.json::<T>().await.map_err(GatewayError::downstream)
    }
}
