use crate::config::NewsConfig;
use crate::error::{NewsdeskError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SEARCH_PATH: &str = "/api/v1/search/live/news";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Done,
    Unknown(String),
}

impl JobStatus {
    pub fn parse(status: Option<&str>) -> Self {
        match status {
            Some("done") => Self::Done,
            Some("pending") => Self::Pending,
            Some(other) => Self::Unknown(other.to_string()),
            None => Self::Unknown(String::new()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// One news record as returned by the search service. Only `title` is
/// interpreted; every other field is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewsItem(pub Value);

impl NewsItem {
    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }
}

/// The three calls of the live news search API.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Starts a search; `None` when the service did not return a job id.
    async fn create_job(&self, query: &str, max_results: u32) -> Result<Option<String>>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatus>;

    async fn job_result(&self, job_id: &str) -> Result<Vec<NewsItem>>;
}

#[derive(Debug, Serialize)]
struct CreateJobRequest<'a> {
    query: &'a str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: Option<String>,
}

pub struct MasaClient {
    client: reqwest::Client,
    base_url: String,
}

impl MasaClient {
    pub fn new(config: &NewsConfig) -> Result<Self> {
        let token = config.require_api_key()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            NewsdeskError::Configuration(format!("invalid MASA_DATA_API_KEY: {e}"))
        })?;
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.base_url, SEARCH_PATH, suffix)
    }
}

#[async_trait]
impl JobApi for MasaClient {
    async fn create_job(&self, query: &str, max_results: u32) -> Result<Option<String>> {
        let response: CreateJobResponse = self
            .client
            .post(self.url(""))
            .json(&CreateJobRequest { query, max_results })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.uuid.filter(|id| !id.is_empty()))
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus> {
        let response: StatusResponse = self
            .client
            .get(self.url(&format!("/status/{job_id}")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(JobStatus::parse(response.status.as_deref()))
    }

    async fn job_result(&self, job_id: &str) -> Result<Vec<NewsItem>> {
        let items: Vec<NewsItem> = self
            .client
            .get(self.url(&format!("/result/{job_id}")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(items)
    }
}
