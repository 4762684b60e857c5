use crate::config::{Dialect, ServerConfig};
use crate::dispatch::{ApiReply, ImageData};
use crate::error::Result;
use crate::files::{apply_view, resolve_filename};
use crate::options::{BodyParser, Encoding, Query, RequestOptions};
use crate::params::{map_params, TestParams};
use crate::decode::REQUEST_DATA_COLUMNS;

/// Client for one WebPageTest-style server. One method per remote
/// capability; every method is a single stateless request/response exchange,
/// so callers poll status themselves until the run reaches a terminal state.
/// The client is cheap to share across tasks: all configuration is read-only
/// after construction.
pub struct WptClient {
    config: ServerConfig,
    dialect: Dialect,
    http: reqwest::Client,
}

impl WptClient {
    /// Client with the stock wire dialect.
    pub fn new(config: ServerConfig) -> Result<Self> {
        Self::with_dialect(config, Dialect::default())
    }

    /// Client for a server whose paths, filenames, or parameter names differ
    /// from stock. Apply overrides to the dialect before passing it in;
    /// nothing is mutable afterwards.
    pub fn with_dialect(config: ServerConfig, dialect: Dialect) -> Result<Self> {
        Ok(Self {
            config,
            dialect,
            http: reqwest::Client::builder().build()?,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Submits a test to the server. The reply carries the test id and
    /// polling URLs as JSON.
    pub async fn run_test(
        &self,
        params: &TestParams,
        options: &RequestOptions,
    ) -> Result<ApiReply> {
        let query = map_params(params, &self.dialect, self.config.key.as_deref());
        self.call(&self.dialect.paths.test, &query, options).await
    }

    pub async fn get_test_status(&self, id: &str, options: &RequestOptions) -> Result<ApiReply> {
        let query = test_query(id);
        self.call(&self.dialect.paths.test_status, &query, options)
            .await
    }

    pub async fn get_test_results(&self, id: &str, options: &RequestOptions) -> Result<ApiReply> {
        let query = test_query(id);
        self.call(&self.dialect.paths.test_results, &query, options)
            .await
    }

    pub async fn get_locations(&self, options: &RequestOptions) -> Result<ApiReply> {
        self.call(&self.dialect.paths.locations, &Query::new(), options)
            .await
    }

    pub async fn get_page_speed_data(
        &self,
        id: &str,
        options: &RequestOptions,
    ) -> Result<ApiReply> {
        self.get_artifact(id, &self.dialect.filenames.page_speed, options)
            .await
    }

    pub async fn get_har_data(&self, id: &str, options: &RequestOptions) -> Result<ApiReply> {
        let query = test_query(id);
        self.call(&self.dialect.paths.har, &query, options).await
    }

    /// CPU/bandwidth utilization samples. Decoded as header-row CSV unless
    /// the caller overrides the parser.
    pub async fn get_utilization_data(
        &self,
        id: &str,
        options: &RequestOptions,
    ) -> Result<ApiReply> {
        let mut options = options.clone();
        if options.parser.is_none() {
            options.parser = Some(BodyParser::Delimited {
                delimiter: b',',
                columns: None,
            });
        }
        self.get_artifact(id, &self.dialect.filenames.utilization, &options)
            .await
    }

    /// Per-request network/timing/scoring breakdown. Decoded as TSV against
    /// the fixed request-data schema unless the caller overrides the parser.
    pub async fn get_request_data(&self, id: &str, options: &RequestOptions) -> Result<ApiReply> {
        let mut options = options.clone();
        if options.parser.is_none() {
            options.parser = Some(BodyParser::Delimited {
                delimiter: b'\t',
                columns: Some(
                    REQUEST_DATA_COLUMNS
                        .iter()
                        .map(|name| name.to_string())
                        .collect(),
                ),
            });
        }
        self.get_artifact(id, &self.dialect.filenames.request, &options)
            .await
    }

    pub async fn get_timeline_data(&self, id: &str, options: &RequestOptions) -> Result<ApiReply> {
        self.get_artifact(id, &self.dialect.filenames.timeline, options)
            .await
    }

    /// Browser network log, decoded into per-line events unless the caller
    /// overrides the parser.
    pub async fn get_net_log_data(&self, id: &str, options: &RequestOptions) -> Result<ApiReply> {
        let mut options = options.clone();
        if options.parser.is_none() {
            options.parser = Some(BodyParser::NetLog);
        }
        self.get_artifact(id, &self.dialect.filenames.net_log, &options)
            .await
    }

    /// Waterfall PNG for one run/view. `thumbnail` reroutes through the
    /// thumbnail endpoint; `data_uri` delivers the image as a `data:` URI.
    pub async fn get_waterfall_image(
        &self,
        id: &str,
        options: &RequestOptions,
    ) -> Result<ApiReply> {
        let mut options = options.clone();
        if options.encoding.is_none() {
            options.encoding = Some(Encoding::Binary);
        }
        if options.parser.is_none() && options.data_uri {
            options.parser = Some(BodyParser::DataUri {
                mime_type: "image/png".to_string(),
            });
        }

        let mut query = test_query(id);
        apply_view(&mut query, &options);

        let pathname = if options.thumbnail {
            query.insert(
                "file".to_string(),
                resolve_filename(
                    &self.dialect.filenames.waterfall,
                    &self.dialect.filenames,
                    &options,
                ),
            );
            &self.dialect.paths.thumbnail
        } else {
            &self.dialect.paths.waterfall
        };

        let reply = self.call(pathname, &query, &options).await?;
        Ok(tag_image(reply, "image/png"))
    }

    /// Screenshot for one run/view. `start_render`, `document_complete`, and
    /// `full_resolution` select among the captured variants; the full
    /// resolution variant is a PNG, the rest are JPEGs.
    pub async fn get_screenshot_image(
        &self,
        id: &str,
        options: &RequestOptions,
    ) -> Result<ApiReply> {
        let mut options = options.clone();
        if options.encoding.is_none() {
            options.encoding = Some(Encoding::Binary);
        }

        let filenames = &self.dialect.filenames;
        let (filename, mime_type) = if options.start_render {
            (&filenames.screenshot_start_render, "image/jpeg")
        } else if options.document_complete {
            (&filenames.screenshot_document_complete, "image/jpeg")
        } else if options.full_resolution {
            (&filenames.screenshot_full_resolution, "image/png")
        } else {
            (&filenames.screenshot, "image/jpeg")
        };

        if options.parser.is_none() && options.data_uri {
            options.parser = Some(BodyParser::DataUri {
                mime_type: mime_type.to_string(),
            });
        }

        let mut query = test_query(id);
        query.insert(
            "file".to_string(),
            resolve_filename(filename, filenames, &options),
        );

        let pathname = if options.thumbnail {
            apply_view(&mut query, &options);
            &self.dialect.paths.thumbnail
        } else {
            &self.dialect.paths.gzip
        };

        let reply = self.call(pathname, &query, &options).await?;
        Ok(tag_image(reply, mime_type))
    }

    async fn get_artifact(
        &self,
        id: &str,
        filename: &str,
        options: &RequestOptions,
    ) -> Result<ApiReply> {
        let mut query = test_query(id);
        query.insert(
            "file".to_string(),
            resolve_filename(filename, &self.dialect.filenames, options),
        );
        self.call(&self.dialect.paths.gzip, &query, options).await
    }
}

fn test_query(id: &str) -> Query {
    let mut query = Query::new();
    query.insert("test".to_string(), id.to_string());
    query
}

/// Tags a reply with the MIME type of the requested image variant: raw
/// bytes become an [`ApiReply::Image`], and dry runs carry the type as
/// metadata alongside the URL. Replies that already carry their own shape
/// (data URIs, parser overrides) pass through untouched.
fn tag_image(reply: ApiReply, mime_type: &str) -> ApiReply {
    match reply {
        ApiReply::Bytes(bytes) => ApiReply::Image {
            data: ImageData::Raw(bytes),
            mime_type: mime_type.to_string(),
        },
        ApiReply::DryRun { url, .. } => ApiReply::DryRun {
            url,
            mime_type: Some(mime_type.to_string()),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dry() -> RequestOptions {
        RequestOptions {
            dry_run: true,
            ..Default::default()
        }
    }

    fn query_of(reply: &ApiReply) -> Vec<(String, String)> {
        match reply {
            ApiReply::DryRun { url, .. } => url
                .query_pairs()
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect(),
            other => panic!("expected dry run, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_test_dry_run_url() {
        let client = WptClient::new(
            ServerConfig::new("wpt.example.com").with_key("K9"),
        )
        .unwrap();
        let params = TestParams {
            url: Some("http://example.com".to_string()),
            first_view_only: Some(true),
            runs: Some(2),
            ..Default::default()
        };

        let reply = client.run_test(&params, &dry()).await.unwrap();
        let pairs = query_of(&reply);
        assert_eq!(
            pairs,
            vec![
                ("url".to_string(), "http://example.com".to_string()),
                ("runs".to_string(), "2".to_string()),
                ("fvonly".to_string(), "1".to_string()),
                ("f".to_string(), "json".to_string()),
                ("k".to_string(), "K9".to_string()),
            ]
        );

        if let ApiReply::DryRun { url, .. } = reply {
            assert_eq!(url.path(), "/runtest.php");
            assert_eq!(url.host_str(), Some("wpt.example.com"));
        }
    }

    #[tokio::test]
    async fn test_status_and_results_queries() {
        let client = WptClient::new(ServerConfig::new("wpt.example.com")).unwrap();

        let reply = client.get_test_status("230101_AB_1", &dry()).await.unwrap();
        assert_eq!(
            query_of(&reply),
            vec![("test".to_string(), "230101_AB_1".to_string())]
        );

        let reply = client.get_test_results("230101_AB_1", &dry()).await.unwrap();
        if let ApiReply::DryRun { url, .. } = reply {
            assert_eq!(url.path(), "/xmlResult.php");
        }
    }

    #[tokio::test]
    async fn test_locations_has_no_query() {
        let client = WptClient::new(ServerConfig::new("wpt.example.com")).unwrap();
        let reply = client.get_locations(&dry()).await.unwrap();
        if let ApiReply::DryRun { url, .. } = reply {
            assert_eq!(url.as_str(), "http://wpt.example.com/getLocations.php");
        } else {
            panic!("expected dry run");
        }
    }

    #[tokio::test]
    async fn test_artifact_filename_resolution() {
        let client = WptClient::new(ServerConfig::new("wpt.example.com")).unwrap();
        let options = RequestOptions {
            dry_run: true,
            run: Some(2),
            repeat_view: true,
            ..Default::default()
        };

        let reply = client
            .get_page_speed_data("230101_AB_1", &options)
            .await
            .unwrap();
        let pairs = query_of(&reply);
        assert_eq!(
            pairs,
            vec![
                ("test".to_string(), "230101_AB_1".to_string()),
                ("file".to_string(), "2_Cached_pagespeed.txt".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_waterfall_object_form_query() {
        let client = WptClient::new(ServerConfig::new("wpt.example.com")).unwrap();

        let reply = client
            .get_waterfall_image("230101_AB_1", &dry())
            .await
            .unwrap();
        if let ApiReply::DryRun { url, .. } = &reply {
            assert_eq!(url.path(), "/waterfall.php");
        }
        assert_eq!(
            query_of(&reply),
            vec![
                ("test".to_string(), "230101_AB_1".to_string()),
                ("run".to_string(), "1".to_string()),
                ("cached".to_string(), "0".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_waterfall_thumbnail_path_and_file() {
        let client = WptClient::new(ServerConfig::new("wpt.example.com")).unwrap();
        let options = RequestOptions {
            dry_run: true,
            thumbnail: true,
            ..Default::default()
        };

        let reply = client
            .get_waterfall_image("230101_AB_1", &options)
            .await
            .unwrap();
        if let ApiReply::DryRun { url, .. } = &reply {
            assert_eq!(url.path(), "/thumbnail.php");
        }
        assert_eq!(
            query_of(&reply),
            vec![
                ("test".to_string(), "230101_AB_1".to_string()),
                ("run".to_string(), "1".to_string()),
                ("cached".to_string(), "0".to_string()),
                ("file".to_string(), "1_waterfall.png".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_screenshot_variant_selection() {
        let client = WptClient::new(ServerConfig::new("wpt.example.com")).unwrap();

        let options = RequestOptions {
            dry_run: true,
            start_render: true,
            ..Default::default()
        };
        let reply = client
            .get_screenshot_image("230101_AB_1", &options)
            .await
            .unwrap();
        let pairs = query_of(&reply);
        assert_eq!(pairs[1].1, "1_screen_render.jpg");

        let options = RequestOptions {
            dry_run: true,
            full_resolution: true,
            repeat_view: true,
            ..Default::default()
        };
        let reply = client
            .get_screenshot_image("230101_AB_1", &options)
            .await
            .unwrap();
        let pairs = query_of(&reply);
        assert_eq!(pairs[1].1, "1_Cached_screen.png");
    }

    #[tokio::test]
    async fn test_screenshot_thumbnail_reroutes() {
        let client = WptClient::new(ServerConfig::new("wpt.example.com")).unwrap();
        let options = RequestOptions {
            dry_run: true,
            thumbnail: true,
            ..Default::default()
        };

        let reply = client
            .get_screenshot_image("230101_AB_1", &options)
            .await
            .unwrap();
        if let ApiReply::DryRun { url, .. } = &reply {
            assert_eq!(url.path(), "/thumbnail.php");
        }
        let pairs = query_of(&reply);
        assert!(pairs.contains(&("run".to_string(), "1".to_string())));
        assert!(pairs.contains(&("cached".to_string(), "0".to_string())));
    }

    #[tokio::test]
    async fn test_dry_run_image_calls_keep_mime_tag() {
        let client = WptClient::new(ServerConfig::new("wpt.example.com")).unwrap();

        let mime_of = |reply: &ApiReply| match reply {
            ApiReply::DryRun { mime_type, .. } => mime_type.clone(),
            other => panic!("expected dry run, got {other:?}"),
        };

        let reply = client
            .get_waterfall_image("230101_AB_1", &dry())
            .await
            .unwrap();
        assert_eq!(mime_of(&reply).as_deref(), Some("image/png"));

        let reply = client
            .get_screenshot_image("230101_AB_1", &dry())
            .await
            .unwrap();
        assert_eq!(mime_of(&reply).as_deref(), Some("image/jpeg"));

        let options = RequestOptions {
            dry_run: true,
            full_resolution: true,
            ..Default::default()
        };
        let reply = client
            .get_screenshot_image("230101_AB_1", &options)
            .await
            .unwrap();
        assert_eq!(mime_of(&reply).as_deref(), Some("image/png"));

        // non-image operations carry no tag
        let reply = client.get_test_status("230101_AB_1", &dry()).await.unwrap();
        assert_eq!(mime_of(&reply), None);
    }

    #[tokio::test]
    async fn test_dry_run_respects_dialect_overrides() {
        use crate::config::{DialectOverrides, PathOverrides};

        let mut dialect = Dialect::default();
        dialect.apply(DialectOverrides {
            paths: PathOverrides {
                base: Some("/wpt/".to_string()),
                test_status: Some("status.php".to_string()),
                ..Default::default()
            },
            ..Default::default()
        });

        let client =
            WptClient::with_dialect(ServerConfig::new("wpt.example.com"), dialect).unwrap();
        let reply = client.get_test_status("230101_AB_1", &dry()).await.unwrap();
        if let ApiReply::DryRun { url, .. } = reply {
            assert_eq!(url.path(), "/wpt/status.php");
        } else {
            panic!("expected dry run");
        }
    }
}
