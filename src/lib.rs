//! Client library for WebPageTest-style web performance testing APIs.
//!
//! The client submits tests, polls status, and retrieves run artifacts
//! (timings, HAR data, waterfalls, screenshots) over the service's
//! GET-based REST dialect. Responses come back as structured values:
//! JSON and XML bodies decode into trees, delimited-text artifacts into
//! records, network logs into events, and images into tagged bytes or
//! `data:` URIs.
//!
//! ```no_run
//! use wpt_client::{RequestOptions, ServerConfig, TestParams, WptClient};
//!
//! # async fn example() -> wpt_client::Result<()> {
//! let client = WptClient::new(ServerConfig::new("wpt.example.com").with_key("API_KEY"))?;
//! let reply = client
//!     .run_test(&TestParams::for_url("http://example.com"), &RequestOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod files;
pub mod options;
pub mod params;
pub mod script;

pub use client::WptClient;
pub use config::{
    Dialect, DialectOverrides, FilenameOverrides, Filenames, ParamSpec, PathOverrides, Paths,
    ServerConfig,
};
pub use decode::{Record, REQUEST_DATA_COLUMNS};
pub use dispatch::{ApiReply, ImageData};
pub use error::{DecodeError, Error, Result};
pub use options::{BodyParser, Encoding, Query, RequestOptions};
pub use params::TestParams;
pub use script::{script_to_string, ScriptCommand};
