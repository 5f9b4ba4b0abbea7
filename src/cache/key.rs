//! Cache key generation.
//!
//! A key is the request URL followed by its parameters sorted by name and
//! rendered as `name=<canonical json>` pairs joined with `&`. Equal requests
//! always map to the same key regardless of parameter insertion order.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Request parameters as a JSON object.
pub type CacheParams = Map<String, Value>;

/// Placeholder used when a value cannot be rendered.
const UNDEFINED: &str = "undefined";

/// Builds the cache key for `url` with `params`.
pub fn generate_key(url: &str, params: &CacheParams) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let sorted: BTreeMap<&String, &Value> = params.iter().collect();
    let query = sorted
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, canonical_json(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", url, query)
}

/// Converts any serializable parameter struct into [`CacheParams`].
///
/// Anything that is not a JSON object degrades to an empty parameter set so
/// that key generation never aborts a request.
pub fn to_params<P: Serialize + ?Sized>(params: &P) -> CacheParams {
    match serde_json::to_value(params) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => CacheParams::new(),
        Ok(other) => {
            warn!("Ignoring non-object request params: {}", other);
            CacheParams::new()
        }
        Err(e) => {
            warn!("Request params could not be serialized: {}", e);
            CacheParams::new()
        }
    }
}

/// Renders a value as JSON with object keys sorted at every depth.
fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&canonicalize(value)).unwrap_or_else(|_| UNDEFINED.to_string())
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
