use crate::news::{JobPoller, fetch_crypto_news};
use crate::tools::{extract_string_arg, extract_u32_arg_opt};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

fn news_schema(name: &str, default_max_results: u32) -> Value {
    json!({
        "title": format!("{name}Arguments"),
        "type": "object",
        "properties": {
            "crypto_name": {
                "title": "Crypto Name",
                "type": "string",
                "description": "Name or ticker of the cryptocurrency, e.g. bitcoin"
            },
            "max_results": {
                "title": "Max Results",
                "type": "integer",
                "default": default_max_results
            }
        },
        "required": ["crypto_name"]
    })
}

/// Raw search results as a JSON array.
pub struct SearchCryptoNewsTool {
    poller: Arc<JobPoller>,
    default_max_results: u32,
}

impl SearchCryptoNewsTool {
    pub fn new(poller: Arc<JobPoller>, default_max_results: u32) -> Self {
        Self {
            poller,
            default_max_results,
        }
    }
}

#[async_trait]
impl Tool for SearchCryptoNewsTool {
    fn name(&self) -> &str {
        "search_crypto_news"
    }

    fn description(&self) -> &str {
        "Search the MASA API for latest crypto news related to a specific crypto coin."
    }

    fn parameters_schema(&self) -> Value {
        news_schema(self.name(), self.default_max_results)
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let crypto_name = extract_string_arg(&args, "crypto_name")?;
        let max_results = extract_u32_arg_opt(&args, "max_results", self.default_max_results);

        let items = self.poller.search_job(&crypto_name, max_results).await?;
        Ok(ToolResult::success(serde_json::to_string(&items)?))
    }
}

/// Newline-separated headlines.
pub struct FetchCryptoNewsTool {
    poller: Arc<JobPoller>,
    default_max_results: u32,
}

impl FetchCryptoNewsTool {
    pub fn new(poller: Arc<JobPoller>, default_max_results: u32) -> Self {
        Self {
            poller,
            default_max_results,
        }
    }
}

#[async_trait]
impl Tool for FetchCryptoNewsTool {
    fn name(&self) -> &str {
        "fetch_crypto_news"
    }

    fn description(&self) -> &str {
        "Fetch crypto news without sentiment analysis."
    }

    fn parameters_schema(&self) -> Value {
        news_schema(self.name(), self.default_max_results)
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let crypto_name = extract_string_arg(&args, "crypto_name")?;
        let max_results = extract_u32_arg_opt(&args, "max_results", self.default_max_results);

        let titles = fetch_crypto_news(&self.poller, &crypto_name, max_results).await?;
        Ok(ToolResult::success(titles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolRegistry;
    use crate::config::NewsConfig;
    use crate::error::Result;
    use crate::news::{JobApi, JobStatus, NewsItem};
    use std::sync::Mutex;

    struct InstantApi {
        requested: Mutex<Option<(String, u32)>>,
        items: Vec<NewsItem>,
    }

    #[async_trait]
    impl JobApi for InstantApi {
        async fn create_job(&self, query: &str, max_results: u32) -> Result<Option<String>> {
            *self.requested.lock().unwrap() = Some((query.to_string(), max_results));
            Ok(Some("job-1".into()))
        }

        async fn job_status(&self, _job_id: &str) -> Result<JobStatus> {
            Ok(JobStatus::Done)
        }

        async fn job_result(&self, _job_id: &str) -> Result<Vec<NewsItem>> {
            Ok(self.items.clone())
        }
    }

    fn registry(api: Arc<InstantApi>) -> ToolRegistry {
        let poller = Arc::new(JobPoller::new(api, &NewsConfig::default()));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SearchCryptoNewsTool::new(poller.clone(), 10)));
        registry.register(Arc::new(FetchCryptoNewsTool::new(poller, 10)));
        registry
    }

    fn api(items: Vec<Value>) -> Arc<InstantApi> {
        Arc::new(InstantApi {
            requested: Mutex::new(None),
            items: items.into_iter().map(NewsItem).collect(),
        })
    }

    #[test]
    fn exposes_contract_names_and_defaults() {
        let specs = registry(api(vec![])).get_specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["search_crypto_news", "fetch_crypto_news"]);
        for spec in &specs {
            assert_eq!(spec.parameters_schema["properties"]["max_results"]["default"], 10);
            assert_eq!(spec.parameters_schema["required"], json!(["crypto_name"]));
        }
    }

    #[tokio::test]
    async fn fetch_defaults_max_results() {
        let api = api(vec![json!({"title": "A"}), json!({"url": "x"})]);
        let result = registry(api.clone())
            .execute("fetch_crypto_news", json!({"crypto_name": "bitcoin"}))
            .await;

        assert!(result.success);
        assert_eq!(result.output, "A\nNo Title");
        assert_eq!(
            api.requested.lock().unwrap().clone(),
            Some(("bitcoin".to_string(), 10))
        );
    }

    #[tokio::test]
    async fn search_returns_items_verbatim() {
        let api = api(vec![json!({"title": "A", "source": "coindesk"})]);
        let result = registry(api.clone())
            .execute(
                "search_crypto_news",
                json!({"crypto_name": "eth", "max_results": 3}),
            )
            .await;

        assert!(result.success);
        let parsed: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(parsed, json!([{"title": "A", "source": "coindesk"}]));
        assert_eq!(
            api.requested.lock().unwrap().clone(),
            Some(("eth".to_string(), 3))
        );
    }

    #[tokio::test]
    async fn missing_coin_is_an_error_result() {
        let result = registry(api(vec![]))
            .execute("fetch_crypto_news", json!({}))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("crypto_name"));
    }
}
