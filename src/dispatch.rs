use serde_json::Value;
use url::Url;

use crate::client::WptClient;
use crate::decode::{self, Record};
use crate::error::{DecodeError, Error, Result};
use crate::options::{BodyParser, Encoding, Query, RequestOptions};

/// The decoded outcome of one API call. Exactly one decoder produced it:
/// the explicit parser override, the content-type default, or pass-through.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiReply {
    /// Dry run: the fully-built request URL, no network I/O performed.
    /// Image operations also tag the reply with the MIME type they would
    /// have fetched.
    DryRun {
        url: Url,
        mime_type: Option<String>,
    },
    /// `application/json` response body.
    Json(Value),
    /// `text/xml` response body, decoded from the service's markup subset.
    Xml(Value),
    /// Pass-through text body.
    Text(String),
    /// Pass-through binary body.
    Bytes(Vec<u8>),
    /// Delimited-text body decoded into rows.
    Records(Vec<Record>),
    /// Network-log body decoded into events.
    NetLog(Vec<Value>),
    /// Image artifact, tagged with its MIME type.
    Image { data: ImageData, mime_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    Raw(Vec<u8>),
    Uri(String),
}

impl WptClient {
    /// Builds the fully-qualified request URL for an endpoint: scheme, host,
    /// port (omitted when 80), base path, pathname, and query string.
    pub(crate) fn build_url(&self, pathname: &str, query: &Query) -> Result<Url> {
        let config = self.config();
        let origin = if config.port == 80 {
            format!("http://{}", config.host)
        } else {
            format!("http://{}:{}", config.host, config.port)
        };
        let mut url = Url::parse(&origin)?;

        let base = self.dialect().paths.base.trim_end_matches('/');
        url.set_path(&format!("{}/{}", base, pathname.trim_start_matches('/')));

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }

    /// Performs one API exchange: URL construction, GET, decode. A dry run
    /// stops after construction and returns the URL. HTTP 404 maps to
    /// [`Error::NotFound`]; decoder failures come back as [`Error::Decode`],
    /// never as panics, and carry no partial data.
    pub(crate) async fn call(
        &self,
        pathname: &str,
        query: &Query,
        options: &RequestOptions,
    ) -> Result<ApiReply> {
        let url = self.build_url(pathname, query)?;

        if options.dry_run {
            return Ok(ApiReply::DryRun {
                url,
                mime_type: None,
            });
        }

        let response = self.http().get(url.clone()).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound { url });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_string())
            .unwrap_or_default();

        let body = response.bytes().await?;

        Ok(decode_body(&body, &content_type, options)?)
    }
}

/// Selects and runs exactly one decoder for the body: the explicit override
/// when present, otherwise the content-type default, otherwise pass-through
/// in the requested encoding.
fn decode_body(
    body: &[u8],
    content_type: &str,
    options: &RequestOptions,
) -> std::result::Result<ApiReply, DecodeError> {
    if let Some(parser) = &options.parser {
        return run_parser(parser, body);
    }

    // the service answers some artifact requests with an empty body
    if body.is_empty() {
        return Ok(ApiReply::Json(Value::Object(serde_json::Map::new())));
    }

    match content_type {
        "application/json" => Ok(ApiReply::Json(serde_json::from_slice(body)?)),
        "text/xml" => {
            let text = String::from_utf8(body.to_vec())?;
            Ok(ApiReply::Xml(decode::markup_to_value(&text)?))
        }
        _ => match options.encoding.unwrap_or(Encoding::Text) {
            Encoding::Binary => Ok(ApiReply::Bytes(body.to_vec())),
            Encoding::Text => Ok(ApiReply::Text(String::from_utf8(body.to_vec())?)),
        },
    }
}

fn run_parser(parser: &BodyParser, body: &[u8]) -> std::result::Result<ApiReply, DecodeError> {
    match parser {
        BodyParser::Raw => Ok(ApiReply::Bytes(body.to_vec())),
        BodyParser::DataUri { mime_type } => Ok(ApiReply::Image {
            data: ImageData::Uri(decode::data_uri(body, mime_type)),
            mime_type: mime_type.clone(),
        }),
        BodyParser::Delimited { delimiter, columns } => {
            let text = String::from_utf8(body.to_vec())?;
            let names: Option<Vec<&str>> = columns
                .as_ref()
                .map(|list| list.iter().map(String::as_str).collect());
            let records = decode::delimited_to_records(&text, *delimiter, names.as_deref())?;
            Ok(ApiReply::Records(records))
        }
        BodyParser::NetLog => {
            let text = String::from_utf8(body.to_vec())?;
            Ok(ApiReply::NetLog(decode::net_log_to_events(&text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    fn client(config: ServerConfig) -> WptClient {
        WptClient::new(config).unwrap()
    }

    #[test]
    fn test_build_url_omits_default_port() {
        let client = client(ServerConfig::new("wpt.example.com"));
        let url = client.build_url("testStatus.php", &Query::new()).unwrap();
        assert_eq!(url.as_str(), "http://wpt.example.com/testStatus.php");
    }

    #[test]
    fn test_build_url_keeps_custom_port() {
        let client = client(ServerConfig::new("wpt.example.com").with_port(8888));
        let url = client.build_url("runtest.php", &Query::new()).unwrap();
        assert_eq!(url.as_str(), "http://wpt.example.com:8888/runtest.php");
    }

    #[test]
    fn test_build_url_query_round_trips() {
        let client = client(ServerConfig::new("wpt.example.com"));
        let mut query = Query::new();
        query.insert("test".to_string(), "230101_AB_1".to_string());
        query.insert("file".to_string(), "1_progress.csv".to_string());
        query.insert("label".to_string(), "a b&c".to_string());

        let url = client.build_url("getgzip.php", &query).unwrap();

        let parsed: Vec<(String, String)> = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        assert_eq!(
            parsed,
            vec![
                ("test".to_string(), "230101_AB_1".to_string()),
                ("file".to_string(), "1_progress.csv".to_string()),
                ("label".to_string(), "a b&c".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_body_json() {
        let reply = decode_body(
            b"{\"statusCode\": 200}",
            "application/json",
            &RequestOptions::default(),
        )
        .unwrap();
        assert_eq!(reply, ApiReply::Json(serde_json::json!({"statusCode": 200})));
    }

    #[test]
    fn test_decode_body_bad_json_is_an_error() {
        let result = decode_body(b"{not json", "application/json", &RequestOptions::default());
        assert!(matches!(result, Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_body_xml() {
        let reply = decode_body(
            b"<response><data>ok</data></response>",
            "text/xml",
            &RequestOptions::default(),
        )
        .unwrap();
        assert_eq!(
            reply,
            ApiReply::Xml(serde_json::json!({"response": {"data": "ok"}}))
        );
    }

    #[test]
    fn test_decode_body_pass_through() {
        let reply = decode_body(b"plain text", "text/plain", &RequestOptions::default()).unwrap();
        assert_eq!(reply, ApiReply::Text("plain text".to_string()));

        let binary = RequestOptions {
            encoding: Some(Encoding::Binary),
            ..Default::default()
        };
        let reply = decode_body(&[0xff, 0xd8, 0xff], "image/jpeg", &binary).unwrap();
        assert_eq!(reply, ApiReply::Bytes(vec![0xff, 0xd8, 0xff]));
    }

    #[test]
    fn test_decode_body_empty_defaults_to_empty_object() {
        let reply = decode_body(b"", "text/plain", &RequestOptions::default()).unwrap();
        assert_eq!(reply, ApiReply::Json(serde_json::json!({})));
    }

    #[test]
    fn test_parser_override_wins_over_content_type() {
        let options = RequestOptions {
            parser: Some(BodyParser::Raw),
            ..Default::default()
        };
        let reply = decode_body(b"{\"a\": 1}", "application/json", &options).unwrap();
        assert_eq!(reply, ApiReply::Bytes(b"{\"a\": 1}".to_vec()));
    }

    #[test]
    fn test_data_uri_parser() {
        let options = RequestOptions {
            parser: Some(BodyParser::DataUri {
                mime_type: "image/png".to_string(),
            }),
            ..Default::default()
        };
        let reply = decode_body(b"png-bytes", "image/png", &options).unwrap();
        match reply {
            ApiReply::Image {
                data: ImageData::Uri(uri),
                mime_type,
            } => {
                assert!(uri.starts_with("data:image/png;base64,"));
                assert_eq!(mime_type, "image/png");
            }
            other => panic!("expected data-URI image, got {other:?}"),
        }
    }
}
