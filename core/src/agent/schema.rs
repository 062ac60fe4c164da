use crate::traits::ToolSpec;
use serde_json::Value;

/// Keys that only affect how a schema is displayed.
const PRESENTATION_KEYS: &[&str] = &["title"];

/// Strips presentation-only metadata from a JSON schema at every depth.
///
/// Only string-valued `title` entries are removed, so a property that happens
/// to be called `title` keeps its definition.
pub fn adapt_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => map
            .iter()
            .filter(|(key, value)| !(PRESENTATION_KEYS.contains(&key.as_str()) && value.is_string()))
            .map(|(key, value)| (key.clone(), adapt_schema(value)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
        Value::Array(items) => Value::Array(items.iter().map(adapt_schema).collect()),
        other => other.clone(),
    }
}

pub fn adapt_tool_specs(tools: &[ToolSpec]) -> Vec<ToolSpec> {
    tools
        .iter()
        .map(|t| ToolSpec {
            name: t.name.clone(),
            description: t.description.clone(),
            parameters_schema: adapt_schema(&t.parameters_schema),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn news_schema() -> Value {
        json!({
            "title": "search_crypto_newsArguments",
            "type": "object",
            "properties": {
                "crypto_name": {"title": "Crypto Name", "type": "string"},
                "max_results": {"title": "Max Results", "type": "integer", "default": 10},
                "filters": {
                    "type": "array",
                    "items": {"title": "Filter", "type": "string", "minLength": 1}
                }
            },
            "required": ["crypto_name"]
        })
    }

    #[test]
    fn removes_titles_at_every_depth() {
        let adapted = adapt_schema(&news_schema());
        assert_eq!(
            adapted,
            json!({
                "type": "object",
                "properties": {
                    "crypto_name": {"type": "string"},
                    "max_results": {"type": "integer", "default": 10},
                    "filters": {
                        "type": "array",
                        "items": {"type": "string", "minLength": 1}
                    }
                },
                "required": ["crypto_name"]
            })
        );
    }

    #[test]
    fn adaptation_is_idempotent() {
        let once = adapt_schema(&news_schema());
        let twice = adapt_schema(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn keeps_property_named_title() {
        let schema = json!({
            "type": "object",
            "properties": {"title": {"title": "Title", "type": "string"}}
        });
        assert_eq!(
            adapt_schema(&schema),
            json!({"type": "object", "properties": {"title": {"type": "string"}}})
        );
    }

    #[test]
    fn adapts_every_spec() {
        let specs = vec![ToolSpec {
            name: "fetch_crypto_news".into(),
            description: "Fetch crypto news".into(),
            parameters_schema: news_schema(),
        }];
        let adapted = adapt_tool_specs(&specs);
        assert_eq!(adapted[0].name, "fetch_crypto_news");
        assert!(adapted[0].parameters_schema.get("title").is_none());
    }
}
