use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::error::DecodeError;

/// One decoded row of a delimited-text body, keyed by column name in column
/// order.
pub type Record = IndexMap<String, String>;

/// Column schema of the per-request data file. The positions are a versioned
/// contract with the remote service; empty names mark reserved columns that
/// are dropped from decoded records.
pub const REQUEST_DATA_COLUMNS: &[&str] = &[
    "",
    "",
    "",
    "ip_addr",
    "method",
    "host",
    "url",
    "responseCode",
    "load_ms",
    "ttfb_ms",
    "load_start",
    "bytesOut",
    "bytesIn",
    "objectSize",
    "",
    "",
    "expires",
    "cacheControl",
    "contentType",
    "contentEncoding",
    "type",
    "socket",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "score_cache",
    "score_cdn",
    "score_gzip",
    "score_cookies",
    "score_keep-alive",
    "",
    "score_minify",
    "score_combine",
    "score_compress",
    "score_etags",
    "",
    "is_secure",
    "dns_ms",
    "connect_ms",
    "ssl_ms",
    "gzip_total",
    "gzip_save",
    "minify_total",
    "minify_save",
    "image_total",
    "image_save",
    "cache_time",
    "",
    "",
    "",
    "cdn_provider",
    "dns_start",
    "dns_end",
    "connect_start",
    "connect_end",
    "ssl_start",
    "ssl_end",
    "initiator",
    "initiator_line",
    "initiator_column",
];

/// Decodes a delimited-text body into records. With `columns: None` the
/// first line is treated as the header row; otherwise fields are zipped
/// against the given names in order and columns named `""` are skipped.
/// Rows shorter or longer than the column list are accepted; extra fields
/// are dropped. Trailing blank lines are ignored.
pub fn delimited_to_records(
    text: &str,
    delimiter: u8,
    columns: Option<&[&str]>,
) -> Result<Vec<Record>, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(columns.is_none())
        .flexible(true)
        // the service emits plain delimiter-split lines, not quoted CSV
        .quoting(false)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = match columns {
        Some(names) => names.iter().map(|name| name.to_string()).collect(),
        None => reader.headers()?.iter().map(str::to_string).collect(),
    };

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (name, field) in columns.iter().zip(row.iter()) {
            if name.is_empty() {
                continue;
            }
            record.insert(name.clone(), field.to_string());
        }
        records.push(record);
    }

    Ok(records)
}

struct Node {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }
}

/// Parses the service's XML subset into a JSON-style tree. Element text
/// becomes a string value, childless elements become empty objects, and
/// repeated sibling tags collect into an array under the shared key in
/// document order. Attributes, comments, declarations, and whitespace-only
/// text are dropped. Recovery policy for malformed input: unmatched closing
/// tags are ignored and elements left open at end of input are auto-closed.
/// Fails only when the body contains no elements at all.
pub fn markup_to_value(text: &str) -> Result<Value, DecodeError> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let token = TOKEN.get_or_init(|| {
        Regex::new(concat!(
            r"(?s)<!--.*?-->",
            r"|<\?.*?\?>",
            r"|<!\[CDATA\[(?P<cdata>.*?)\]\]>",
            r"|<!DOCTYPE[^>]*>",
            r#"|<\s*(?P<close>/?)\s*(?P<name>[A-Za-z_][\w.:-]*)(?:[^<>"']|"[^"]*"|'[^']*')*?(?P<selfclose>/?)\s*>"#,
        ))
        .unwrap()
    });

    let mut stack = vec![Node::new(String::new())];
    let mut seen_element = false;
    let mut last_end = 0;

    for caps in token.captures_iter(text) {
        let Some(matched) = caps.get(0) else { continue };

        if let Some(top) = stack.last_mut() {
            let gap = &text[last_end..matched.start()];
            top.text.push_str(&decode_entities(gap));
        }
        last_end = matched.end();

        if let Some(cdata) = caps.name("cdata") {
            if let Some(top) = stack.last_mut() {
                top.text.push_str(cdata.as_str());
            }
            continue;
        }

        let Some(name) = caps.name("name") else {
            // comment, processing instruction, or doctype
            continue;
        };
        let name = name.as_str().to_string();
        let closing = caps.name("close").map_or(false, |g| g.as_str() == "/");
        let self_closing = caps
            .name("selfclose")
            .map_or(false, |g| g.as_str() == "/");
        seen_element = true;

        if closing {
            // close the element if it matches the open one; a closing tag
            // with no matching open element is ignored
            let matches_top = stack.last().map_or(false, |node| node.name == name);
            if matches_top && stack.len() > 1 {
                close_top(&mut stack);
            }
        } else if self_closing {
            if let Some(top) = stack.last_mut() {
                add_child(&mut top.children, name, Value::Object(Map::new()));
            }
        } else {
            stack.push(Node::new(name));
        }
    }

    if let Some(top) = stack.last_mut() {
        top.text.push_str(&decode_entities(&text[last_end..]));
    }

    if !seen_element {
        return Err(DecodeError::Markup("no elements found".to_string()));
    }

    // auto-close anything left open
    while stack.len() > 1 {
        close_top(&mut stack);
    }

    match stack.pop() {
        Some(root) => Ok(Value::Object(root.children)),
        None => Err(DecodeError::Markup("empty document".to_string())),
    }
}

fn close_top(stack: &mut Vec<Node>) {
    if let Some(node) = stack.pop() {
        let name = node.name.clone();
        let value = finalize(node);
        if let Some(parent) = stack.last_mut() {
            add_child(&mut parent.children, name, value);
        }
    }
}

fn finalize(node: Node) -> Value {
    if node.children.is_empty() {
        let text = node.text.trim();
        if text.is_empty() {
            Value::Object(Map::new())
        } else {
            Value::String(text.to_string())
        }
    } else {
        // mixed content keeps the element structure; stray text is dropped
        Value::Object(node.children)
    }
}

fn add_child(children: &mut Map<String, Value>, key: String, value: Value) {
    match children.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(key, value);
        }
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Re-encodes raw bytes as a `data:` URI with a base64 payload. Lossless and
/// deterministic.
pub fn data_uri(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Splits a network-log body into per-line events. Lines holding a JSON
/// object decode into structured values; anything else passes through as an
/// opaque string (unknown event types stay intact either way). Blank lines
/// are skipped.
pub fn net_log_to_events(text: &str) -> Vec<Value> {
    let mut events = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(event) => events.push(event),
            Err(_) => events.push(Value::String(line.to_string())),
        }
    }
    events
}
