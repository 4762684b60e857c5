use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Dialect;
use crate::options::Query;

/// Logical test-submission parameters. Unset fields are omitted from the
/// query entirely; no defaults are injected at this layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestParams {
    pub url: Option<String>,
    pub label: Option<String>,
    pub location: Option<String>,
    pub runs: Option<u32>,
    pub first_view_only: Option<bool>,
    pub dom_element: Option<String>,
    pub private: Option<bool>,
    pub connections: Option<u32>,
    pub stop_at_document_complete: Option<bool>,
    pub script: Option<String>,
    pub sensitive: Option<bool>,
    pub block: Option<String>,
    pub login: Option<String>,
    pub authentication_type: Option<String>,
    pub video: Option<bool>,
    pub notify_email: Option<String>,
    pub pingback: Option<String>,
    pub bandwidth_down: Option<u32>,
    pub bandwidth_up: Option<u32>,
    pub latency: Option<u32>,
    pub packet_loss_rate: Option<f64>,
    pub tcp_dump: Option<bool>,
    pub disable_optimization: Option<bool>,
    pub disable_screenshot: Option<bool>,
    pub disable_http_headers: Option<bool>,
    pub full_resolution_screenshot: Option<bool>,
    pub jpeg_compression_level: Option<u32>,
    pub timeline: Option<bool>,
    pub net_log: Option<bool>,
}

impl TestParams {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// The parameter set keyed by logical name, with unset fields dropped.
    /// Keys match the entries of the dialect's param table.
    fn to_map(&self) -> IndexMap<String, Value> {
        let mut map = IndexMap::new();

        macro_rules! put {
            ($key:literal, $field:ident) => {
                if let Some(value) = &self.$field {
                    map.insert($key.to_string(), json!(value));
                }
            };
        }

        put!("url", url);
        put!("label", label);
        put!("location", location);
        put!("runs", runs);
        put!("firstViewOnly", first_view_only);
        put!("domElement", dom_element);
        put!("private", private);
        put!("connections", connections);
        put!("stopAtDocumentComplete", stop_at_document_complete);
        put!("script", script);
        put!("sensitive", sensitive);
        put!("block", block);
        put!("login", login);
        put!("authenticationType", authentication_type);
        put!("video", video);
        put!("notifyEmail", notify_email);
        put!("pingback", pingback);
        put!("bandwidthDown", bandwidth_down);
        put!("bandwidthUp", bandwidth_up);
        put!("latency", latency);
        put!("packetLossRate", packet_loss_rate);
        put!("tcpDump", tcp_dump);
        put!("disableOptimization", disable_optimization);
        put!("disableScreenshot", disable_screenshot);
        put!("disableHTTPHeaders", disable_http_headers);
        put!("fullResolutionScreenshot", full_resolution_screenshot);
        put!("jpegCompressionLevel", jpeg_compression_level);
        put!("timeline", timeline);
        put!("netLog", net_log);

        map
    }
}

/// Builds the wire query for a test submission. Walks the dialect's param
/// table in declaration order, translating logical names to wire names and
/// coercing boolean flags to `1`/`0`; other values pass through unvalidated.
/// Then, in fixed order: the JSON output format flag, the API key if one is
/// configured, and the script-over-url rule (when both resolved, `script`
/// wins and `url` is dropped).
pub fn map_params(params: &TestParams, dialect: &Dialect, api_key: Option<&str>) -> Query {
    let input = params.to_map();
    let mut query = Query::new();

    for (logical, spec) in &dialect.params {
        let value = match input.get(logical) {
            Some(value) if !value.is_null() => value,
            _ => continue,
        };
        let wire_value = if spec.bool_flag {
            if truthy(value) { "1" } else { "0" }.to_string()
        } else {
            plain_value(value)
        };
        query.insert(spec.name.clone(), wire_value);
    }

    query.insert("f".to_string(), "json".to_string());

    if let Some(key) = api_key {
        query.insert("k".to_string(), key.to_string());
    }

    let script_wire = wire_name(dialect, "script");
    let url_wire = wire_name(dialect, "url");
    if query.contains_key(&script_wire) {
        query.shift_remove(&url_wire);
    }

    query
}

fn wire_name(dialect: &Dialect, logical: &str) -> String {
    dialect
        .params
        .get(logical)
        .map(|spec| spec.name.clone())
        .unwrap_or_else(|| logical.to_string())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
