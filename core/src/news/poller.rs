use crate::config::NewsConfig;
use crate::error::{NewsdeskError, Result};
use crate::news::{JobApi, NewsItem};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const NO_RESULTS: &str = "No news articles found.";
pub const NO_TITLE: &str = "No Title";

/// Submits a search job and waits for it with a fixed number of status
/// checks spaced by a fixed delay.
///
/// Giving up does not cancel the remote job; it may keep running.
pub struct JobPoller {
    api: Arc<dyn JobApi>,
    max_polls: u32,
    poll_interval: Duration,
}

impl JobPoller {
    pub fn new(api: Arc<dyn JobApi>, config: &NewsConfig) -> Self {
        Self {
            api,
            max_polls: config.max_polls,
            poll_interval: config.poll_interval(),
        }
    }

    pub fn with_budget(mut self, max_polls: u32, poll_interval: Duration) -> Self {
        self.max_polls = max_polls;
        self.poll_interval = poll_interval;
        self
    }

    pub async fn search_job(&self, query: &str, max_results: u32) -> Result<Vec<NewsItem>> {
        let job_id = self
            .api
            .create_job(query, max_results)
            .await?
            .ok_or_else(|| {
                NewsdeskError::JobSubmission(
                    "Failed to start crypto news search job.".to_string(),
                )
            })?;
        info!("Started search job {} for {:?}", job_id, query);

        self.wait_until_done(&job_id).await?;

        let items = self.api.job_result(&job_id).await?;
        info!("Search job {} returned {} items", job_id, items.len());
        Ok(items)
    }

    async fn wait_until_done(&self, job_id: &str) -> Result<()> {
        for attempt in 1..=self.max_polls {
            let status = self.api.job_status(job_id).await?;
            if status.is_done() {
                debug!("Job {} done after {} status checks", job_id, attempt);
                return Ok(());
            }
            debug!(
                "Job {} status {:?} ({}/{})",
                job_id, status, attempt, self.max_polls
            );
            tokio::time::sleep(self.poll_interval).await;
        }

        warn!(
            "Job {} not done after {} status checks, giving up",
            job_id, self.max_polls
        );
        Err(NewsdeskError::JobTimeout {
            job_id: job_id.to_string(),
        })
    }
}

/// Titles of the matching articles, one per line, in service order.
pub async fn fetch_crypto_news(
    poller: &JobPoller,
    query: &str,
    max_results: u32,
) -> Result<String> {
    let items = poller.search_job(query, max_results).await?;
    Ok(format_titles(&items))
}

pub fn format_titles(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return NO_RESULTS.to_string();
    }

    items
        .iter()
        .map(|item| item.title().unwrap_or(NO_TITLE))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::JobStatus;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct FakeApi {
        job_id: Option<&'static str>,
        done_on: Option<u32>,
        items: Vec<NewsItem>,
        status_calls: Mutex<u32>,
        submitted: Mutex<Vec<(String, u32)>>,
    }

    impl FakeApi {
        fn new(done_on: Option<u32>, items: Vec<NewsItem>) -> Self {
            Self {
                job_id: Some("job-42"),
                done_on,
                items,
                status_calls: Mutex::new(0),
                submitted: Mutex::new(Vec::new()),
            }
        }

        fn status_calls(&self) -> u32 {
            *self.status_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl JobApi for FakeApi {
        async fn create_job(&self, query: &str, max_results: u32) -> Result<Option<String>> {
            self.submitted
                .lock()
                .unwrap()
                .push((query.to_string(), max_results));
            Ok(self.job_id.map(String::from))
        }

        async fn job_status(&self, job_id: &str) -> Result<JobStatus> {
            assert_eq!(job_id, "job-42");
            let mut calls = self.status_calls.lock().unwrap();
            *calls += 1;
            Ok(match self.done_on {
                Some(k) if *calls >= k => JobStatus::Done,
                _ => JobStatus::Pending,
            })
        }

        async fn job_result(&self, _job_id: &str) -> Result<Vec<NewsItem>> {
            Ok(self.items.clone())
        }
    }

    fn poller(api: Arc<FakeApi>) -> JobPoller {
        JobPoller::new(api, &NewsConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn stops_polling_once_done() {
        let api = Arc::new(FakeApi::new(
            Some(4),
            vec![NewsItem(json!({"title": "A"}))],
        ));
        let started = Instant::now();

        let items = poller(api.clone()).search_job("bitcoin", 5).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(api.status_calls(), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(6));
        assert_eq!(
            api.submitted.lock().unwrap().as_slice(),
            &[("bitcoin".to_string(), 5)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn done_on_first_check_does_not_wait() {
        let api = Arc::new(FakeApi::new(Some(1), vec![]));
        let started = Instant::now();

        poller(api.clone()).search_job("eth", 10).await.unwrap();

        assert_eq!(api.status_calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_exactly_thirty_checks() {
        let api = Arc::new(FakeApi::new(None, vec![]));

        let err = poller(api.clone()).search_job("sol", 10).await.unwrap_err();

        assert_eq!(api.status_calls(), 30);
        match err {
            NewsdeskError::JobTimeout { job_id } => assert_eq!(job_id, "job-42"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn budget_is_configurable() {
        let api = Arc::new(FakeApi::new(None, vec![]));
        let started = Instant::now();

        let err = poller(api.clone())
            .with_budget(3, Duration::from_millis(500))
            .search_job("sol", 10)
            .await
            .unwrap_err();

        assert!(matches!(err, NewsdeskError::JobTimeout { .. }));
        assert_eq!(api.status_calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn missing_job_id_fails_without_polling() {
        let api = Arc::new(FakeApi {
            job_id: None,
            ..FakeApi::new(Some(1), vec![])
        });

        let err = poller(api.clone()).search_job("ada", 10).await.unwrap_err();

        assert!(matches!(err, NewsdeskError::JobSubmission(_)));
        assert_eq!(api.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_returns_titles_in_order() {
        let api = Arc::new(FakeApi::new(
            Some(2),
            vec![NewsItem(json!({"title": "A"})), NewsItem(json!({}))],
        ));

        let text = fetch_crypto_news(&poller(api), "bitcoin", 10).await.unwrap();
        assert_eq!(text, "A\nNo Title");
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_reports_empty_results() {
        let api = Arc::new(FakeApi::new(Some(1), vec![]));

        let text = fetch_crypto_news(&poller(api), "bitcoin", 10).await.unwrap();
        assert_eq!(text, NO_RESULTS);
    }
}
