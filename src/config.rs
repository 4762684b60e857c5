use indexmap::IndexMap;

/// Connection settings for one WebPageTest-style server. Immutable once the
/// client is built.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 80,
            key: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Server-side endpoint paths, relative to the base path.
#[derive(Debug, Clone)]
pub struct Paths {
    pub base: String,
    pub test_status: String,
    pub test_results: String,
    pub locations: String,
    pub test: String,
    pub gzip: String,
    pub har: String,
    pub waterfall: String,
    pub thumbnail: String,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            base: "/".to_string(),
            test_status: "testStatus.php".to_string(),
            test_results: "xmlResult.php".to_string(),
            locations: "getLocations.php".to_string(),
            test: "runtest.php".to_string(),
            gzip: "getgzip.php".to_string(),
            har: "export.php".to_string(),
            waterfall: "waterfall.php".to_string(),
            thumbnail: "thumbnail.php".to_string(),
        }
    }
}

/// Names of the artifact files a completed run leaves on the server.
/// `cached` is the marker spliced into repeat-view filenames.
#[derive(Debug, Clone)]
pub struct Filenames {
    pub page_speed: String,
    pub utilization: String,
    pub request: String,
    pub timeline: String,
    pub net_log: String,
    pub waterfall: String,
    pub screenshot: String,
    pub screenshot_start_render: String,
    pub screenshot_document_complete: String,
    pub screenshot_full_resolution: String,
    pub cached: String,
}

impl Default for Filenames {
    fn default() -> Self {
        Self {
            page_speed: "pagespeed.txt".to_string(),
            utilization: "progress.csv".to_string(),
            request: "IEWTR.txt".to_string(),
            timeline: "timeline.json".to_string(),
            net_log: "netlog.txt".to_string(),
            waterfall: "waterfall.png".to_string(),
            screenshot: "screen.jpg".to_string(),
            screenshot_start_render: "screen_render.jpg".to_string(),
            screenshot_document_complete: "screen_doc.jpg".to_string(),
            screenshot_full_resolution: "screen.png".to_string(),
            cached: "_Cached".to_string(),
        }
    }
}

/// How one logical test parameter maps onto the wire. Boolean flags are
/// serialized as `1`/`0` rather than passed through.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub bool_flag: bool,
}

impl ParamSpec {
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bool_flag: false,
        }
    }

    pub fn flag(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bool_flag: true,
        }
    }
}

/// The complete wire dialect of the remote service: endpoint paths, artifact
/// filenames, and the logical-to-wire parameter table. Built once, optionally
/// patched with [`DialectOverrides`], then read-only for the client lifetime.
#[derive(Debug, Clone)]
pub struct Dialect {
    pub paths: Paths,
    pub filenames: Filenames,
    pub params: IndexMap<String, ParamSpec>,
}

impl Default for Dialect {
    fn default() -> Self {
        let mut params = IndexMap::new();
        params.insert("url".to_string(), ParamSpec::plain("url"));
        params.insert("label".to_string(), ParamSpec::plain("label"));
        params.insert("location".to_string(), ParamSpec::plain("location"));
        params.insert("runs".to_string(), ParamSpec::plain("runs"));
        params.insert("firstViewOnly".to_string(), ParamSpec::flag("fvonly"));
        params.insert("domElement".to_string(), ParamSpec::plain("domelement"));
        params.insert("private".to_string(), ParamSpec::flag("private"));
        params.insert("connections".to_string(), ParamSpec::plain("connections"));
        params.insert(
            "stopAtDocumentComplete".to_string(),
            ParamSpec::flag("web10"),
        );
        params.insert("script".to_string(), ParamSpec::plain("script"));
        params.insert("sensitive".to_string(), ParamSpec::flag("sensitive"));
        params.insert("block".to_string(), ParamSpec::plain("block"));
        params.insert("login".to_string(), ParamSpec::plain("login"));
        params.insert(
            "authenticationType".to_string(),
            ParamSpec::plain("authType"),
        );
        params.insert("video".to_string(), ParamSpec::flag("video"));
        params.insert("notifyEmail".to_string(), ParamSpec::plain("notify"));
        params.insert("pingback".to_string(), ParamSpec::plain("pingback"));
        params.insert("bandwidthDown".to_string(), ParamSpec::plain("bwDown"));
        params.insert("bandwidthUp".to_string(), ParamSpec::plain("bwUp"));
        params.insert("latency".to_string(), ParamSpec::plain("latency"));
        params.insert("packetLossRate".to_string(), ParamSpec::plain("plr"));
        params.insert("tcpDump".to_string(), ParamSpec::flag("tcpdump"));
        params.insert("disableOptimization".to_string(), ParamSpec::flag("noopt"));
        params.insert("disableScreenshot".to_string(), ParamSpec::flag("noimages"));
        params.insert(
            "disableHTTPHeaders".to_string(),
            ParamSpec::flag("noheaders"),
        );
        params.insert(
            "fullResolutionScreenshot".to_string(),
            ParamSpec::flag("pngss"),
        );
        params.insert("jpegCompressionLevel".to_string(), ParamSpec::plain("iq"));
        params.insert("timeline".to_string(), ParamSpec::flag("timeline"));
        params.insert("netLog".to_string(), ParamSpec::flag("netlog"));

        Self {
            paths: Paths::default(),
            filenames: Filenames::default(),
            params,
        }
    }
}

impl Dialect {
    /// Merges partial overrides into the dialect, key by key. Unset fields
    /// keep their previous values; param entries overwrite or extend the
    /// table, last writer wins.
    pub fn apply(&mut self, overrides: DialectOverrides) {
        let DialectOverrides {
            paths,
            filenames,
            params,
        } = overrides;

        macro_rules! merge {
            ($target:expr, $source:expr, [$($field:ident),+ $(,)?]) => {
                $(if let Some(value) = $source.$field {
                    $target.$field = value;
                })+
            };
        }

        merge!(
            self.paths,
            paths,
            [
                base,
                test_status,
                test_results,
                locations,
                test,
                gzip,
                har,
                waterfall,
                thumbnail,
            ]
        );
        merge!(
            self.filenames,
            filenames,
            [
                page_speed,
                utilization,
                request,
                timeline,
                net_log,
                waterfall,
                screenshot,
                screenshot_start_render,
                screenshot_document_complete,
                screenshot_full_resolution,
                cached,
            ]
        );
        for (key, spec) in params {
            self.params.insert(key, spec);
        }
    }
}

/// Partial replacements for the wire dialect. Built by a caller targeting a
/// private server whose endpoints or filenames differ from stock.
#[derive(Debug, Clone, Default)]
pub struct DialectOverrides {
    pub paths: PathOverrides,
    pub filenames: FilenameOverrides,
    pub params: IndexMap<String, ParamSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub base: Option<String>,
    pub test_status: Option<String>,
    pub test_results: Option<String>,
    pub locations: Option<String>,
    pub test: Option<String>,
    pub gzip: Option<String>,
    pub har: Option<String>,
    pub waterfall: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FilenameOverrides {
    pub page_speed: Option<String>,
    pub utilization: Option<String>,
    pub request: Option<String>,
    pub timeline: Option<String>,
    pub net_log: Option<String>,
    pub waterfall: Option<String>,
    pub screenshot: Option<String>,
    pub screenshot_start_render: Option<String>,
    pub screenshot_document_complete: Option<String>,
    pub screenshot_full_resolution: Option<String>,
    pub cached: Option<String>,
}
