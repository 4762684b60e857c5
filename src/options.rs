use indexmap::IndexMap;

/// Ordered wire-level query parameters, serialized in insertion order.
pub type Query = IndexMap<String, String>;

/// How the response body is treated when no decoder applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Decode the body as UTF-8 text (the default for most endpoints).
    Text,
    /// Keep the body as raw bytes (the default for image endpoints).
    Binary,
}

/// Explicit decoder override for one call. When set, it wins over the
/// content-type-driven default.
#[derive(Debug, Clone)]
pub enum BodyParser {
    /// Delimited text. With `columns: None` the first line is the header row;
    /// otherwise fields are zipped against the given column names and columns
    /// named `""` are dropped.
    Delimited {
        delimiter: u8,
        columns: Option<Vec<String>>,
    },
    /// Line-delimited network log events.
    NetLog,
    /// Re-encode the raw body as a `data:` URI with the given MIME type.
    DataUri { mime_type: String },
    /// Pass the raw bytes through untouched.
    Raw,
}

/// Per-call options shared by every operation. All fields are optional;
/// `RequestOptions::default()` gives first-view, run 1, real network I/O.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Run index within the test, 1-based. Absent or zero resolves to 1.
    pub run: Option<u32>,
    /// Fetch the repeat-view (cached) variant of the artifact.
    pub repeat_view: bool,
    /// Decoder override; each operation fills in its own default when unset.
    pub parser: Option<BodyParser>,
    /// Body treatment for pass-through responses. Unset means text, except
    /// for image operations which default to binary.
    pub encoding: Option<Encoding>,
    /// Build and return the request URL without any network access.
    pub dry_run: bool,
    /// Request the thumbnail variant of an image artifact.
    pub thumbnail: bool,
    /// Screenshot captured at start-render time.
    pub start_render: bool,
    /// Screenshot captured at document-complete time.
    pub document_complete: bool,
    /// Full-resolution PNG screenshot instead of the compressed JPEG.
    pub full_resolution: bool,
    /// Deliver images as `data:` URIs instead of raw bytes.
    pub data_uri: bool,
}
