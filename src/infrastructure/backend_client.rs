use crate::domain::models::Supplement;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireCalendarEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub start: String,
    pub end: String,
    #[serde(rename = "allDay", default)]
    pub all_day: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireTodayPlanItem {
    pub supplement: String,
    pub time: String,
    #[serde(rename = "timeOfDay")]
    pub time_of_day: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireWeeklyPlanEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchedulePayload {
    #[serde(rename = "supplementName")]
    pub supplement_name: String,
    #[serde(rename = "intakeTime")]
    pub intake_time: String,
    #[serde(rename = "intakeStart")]
    pub intake_start: String,
    #[serde(rename = "intakeDistance")]
    pub intake_distance: u32,
    #[serde(rename = "intakeEnd")]
    pub intake_end: String,
    pub memo: String,
}

#[derive(Debug, Deserialize)]
struct CreateScheduleResponse {
    #[serde(rename = "scheduleId")]
    schedule_id: Option<i64>,
}

#[async_trait]
pub trait ScheduleBackendClient: Send + Sync {
    /// Account-type probe; only the HTTP outcome matters, the body is unused.
    async fn probe_account_type(&self) -> Result<(), InfraError>;

    async fn fetch_weekly_plan(&self) -> Result<HashMap<String, WireWeeklyPlanEntry>, InfraError>;

    async fn fetch_today_plan(&self) -> Result<Vec<WireTodayPlanItem>, InfraError>;

    async fn fetch_events(&self) -> Result<Vec<WireCalendarEvent>, InfraError>;

    async fn fetch_supplements(&self) -> Result<Vec<Supplement>, InfraError>;

    /// Returns the server-assigned schedule id when the 2xx body carries one.
    async fn create_schedule(&self, payload: &SchedulePayload) -> Result<Option<i64>, InfraError>;

    async fn update_event(&self, event_id: i64, event: &WireCalendarEvent)
        -> Result<(), InfraError>;

    async fn delete_event(&self, event_id: i64) -> Result<(), InfraError>;
}

/// Reqwest-backed client for the scheduling backend. The credential provider
/// is injected at construction; a stored token is attached as a bearer header
/// and an absent token leaves the request unauthenticated for the server to
/// reject. No retry and no request timeout.
pub struct ReqwestScheduleBackendClient {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl ReqwestScheduleBackendClient {
    pub fn new(base_url: Url, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            credentials,
        }
    }

    fn api_endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| InfraError::Api("backend base URL cannot be a base".to_string()))?;
            parts.pop_if_empty();
            parts.push("api");
            for segment in segments {
                parts.push(segment);
            }
        }
        Ok(url)
    }

    fn event_endpoint(&self, event_id: i64) -> Result<Url, InfraError> {
        self.api_endpoint(&["events", &event_id.to_string()])
    }

    fn api_http_error(status: reqwest::StatusCode, body: &str) -> InfraError {
        let message = if body.trim().is_empty() {
            format!("http {}", status.as_u16())
        } else {
            format!("http {}; body={body}", status.as_u16())
        };
        InfraError::Api(message)
    }

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, InfraError> {
        match self.credentials.load_token()? {
            Some(token) if !token.trim().is_empty() => Ok(request.bearer_auth(token.trim())),
            _ => Ok(request),
        }
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<(reqwest::StatusCode, String), InfraError> {
        let response = self
            .authorize(request)?
            .send()
            .await
            .map_err(|error| InfraError::Api(format!("network error while {context}: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Api(format!("failed reading {context} response: {error}")))?;
        Ok((status, body))
    }

    fn parse_payload<T: serde::de::DeserializeOwned>(
        body: &str,
        context: &str,
    ) -> Result<T, InfraError> {
        serde_json::from_str(body)
            .map_err(|error| InfraError::Api(format!("invalid {context} payload: {error}; body={body}")))
    }
}

#[async_trait]
impl ScheduleBackendClient for ReqwestScheduleBackendClient {
    async fn probe_account_type(&self) -> Result<(), InfraError> {
        let endpoint = self.api_endpoint(&["member", "account-type"])?;
        let (status, body) = self
            .dispatch(self.client.get(endpoint), "probing account type")
            .await?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }
        Ok(())
    }

    async fn fetch_weekly_plan(&self) -> Result<HashMap<String, WireWeeklyPlanEntry>, InfraError> {
        let endpoint = self.api_endpoint(&["weekly-plan"])?;
        let (status, body) = self
            .dispatch(self.client.get(endpoint), "fetching weekly plan")
            .await?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }
        Self::parse_payload(&body, "weekly plan")
    }

    async fn fetch_today_plan(&self) -> Result<Vec<WireTodayPlanItem>, InfraError> {
        let endpoint = self.api_endpoint(&["today-plan"])?;
        let (status, body) = self
            .dispatch(self.client.get(endpoint), "fetching today plan")
            .await?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }
        Self::parse_payload(&body, "today plan")
    }

    async fn fetch_events(&self) -> Result<Vec<WireCalendarEvent>, InfraError> {
        let endpoint = self.api_endpoint(&["events"])?;
        let (status, body) = self
            .dispatch(self.client.get(endpoint), "fetching events")
            .await?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }
        Self::parse_payload(&body, "event list")
    }

    async fn fetch_supplements(&self) -> Result<Vec<Supplement>, InfraError> {
        let endpoint = self.api_endpoint(&["supplements"])?;
        let (status, body) = self
            .dispatch(self.client.get(endpoint), "fetching supplements")
            .await?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }
        Self::parse_payload(&body, "supplement catalog")
    }

    async fn create_schedule(&self, payload: &SchedulePayload) -> Result<Option<i64>, InfraError> {
        let endpoint = self.api_endpoint(&["schedules"])?;
        let (status, body) = self
            .dispatch(self.client.post(endpoint).json(payload), "creating schedule")
            .await?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }

        // A 2xx body without a usable scheduleId is not an error; the caller
        // falls back to a client-generated id.
        Ok(serde_json::from_str::<CreateScheduleResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.schedule_id))
    }

    async fn update_event(
        &self,
        event_id: i64,
        event: &WireCalendarEvent,
    ) -> Result<(), InfraError> {
        let endpoint = self.event_endpoint(event_id)?;
        let (status, body) = self
            .dispatch(self.client.put(endpoint).json(event), "updating event")
            .await?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }
        Ok(())
    }

    async fn delete_event(&self, event_id: i64) -> Result<(), InfraError> {
        let endpoint = self.event_endpoint(event_id)?;
        let (status, body) = self
            .dispatch(self.client.delete(endpoint), "deleting event")
            .await?;
        if !status.is_success() {
            return Err(Self::api_http_error(status, &body));
        }
        Ok(())
    }
}
