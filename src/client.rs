//! Client for the survey data service.

use std::time::Duration;

use serde::de::DeserializeOwned;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use crate::departments::DepartmentsPayload;
use crate::filter::ALL_UNIVERSITIES;
use crate::models::{DashboardResponse, SurveyRecord};
use crate::{Error, Result};

const USER_AGENT: &str = concat!("wellbeing-dashboard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct CoursesResponse {
    #[serde(default)]
    courses: Vec<String>,
}

pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended by percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid api_base_url {:?}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("api_base_url {:?} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn dashboard_request(&self, university: &str) -> Result<reqwest::Request> {
        let url = self.endpoint(&["dashboard"])?;
        Ok(self
            .http_client
            .get(url)
            .query(&[("university", university)])
            .build()?)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T> {
        let url = request.url().to_string();
        debug!(url = %url, "Requesting survey service");

        let response = self.http_client.execute(request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// `GET /dashboard?university=<All|code>`
    pub async fn fetch_dashboard(&self, university: &str) -> Result<Vec<SurveyRecord>> {
        let request = self.dashboard_request(university)?;
        let response: DashboardResponse = self.get_json(request).await?;

        info!(university, records = response.data.len(), "Fetched dashboard data");
        Ok(response.data)
    }

    /// `GET /departments/<university>`; "All" has no department list.
    pub async fn fetch_departments(&self, university: &str) -> Result<DepartmentsPayload> {
        if university == ALL_UNIVERSITIES {
            return Ok(DepartmentsPayload::default());
        }

        let request = self
            .http_client
            .get(self.endpoint(&["departments", university])?)
            .build()?;
        let payload: DepartmentsPayload = self.get_json(request).await?;

        info!(university, departments = payload.departments.len(), "Fetched departments");
        Ok(payload)
    }

    /// `GET /courses/<university>`
    pub async fn fetch_courses(&self, university: &str) -> Result<Vec<String>> {
        let request = self
            .http_client
            .get(self.endpoint(&["courses", university])?)
            .build()?;
        let response: CoursesResponse = self.get_json(request).await?;
        Ok(response.courses)
    }
}
