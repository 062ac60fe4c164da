use serde_json::Value;

pub fn extract_string_arg(args: &Value, key: &str) -> anyhow::Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
        .map(|s| s.to_string())
}

/// Reads an optional non-negative integer argument. Models sometimes send
/// whole numbers as floats (`5.0`), which are accepted too.
pub fn extract_u32_arg_opt(args: &Value, key: &str, default: u32) -> u32 {
    args.get(key)
        .and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
        })
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}
