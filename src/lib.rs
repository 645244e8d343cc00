//! qq: an interoperable configuration-format transcoder with jq querying.
//!
//! Input in any supported text or binary format is decoded into one
//! canonical [`Value`] tree, queried with a jq expression, and re-encoded
//! in the chosen output format. The crate is organized leaves-first:
//!
//! - [`value`] - the canonical value model and scalar inference
//! - [`codec`] - the format registry and per-format codecs
//! - [`stream`] - the incremental path-value decomposer (`--stream`)
//! - [`query`] - the boundary to the jq collaborator
//! - [`pretty`] - raw-output handling and semantic colorization
//! - [`tui`] - the interactive viewer-model and renderer
//!
//! # Example
//!
//! ```
//! use qq::{codec, query, Encoding};
//!
//! let value = codec::decode(br#"{"a": 1, "b": [2, 3]}"#, Encoding::Json).unwrap();
//! let q = query::parse(".b[1]").unwrap();
//! let results = q.run_collect(&value).unwrap();
//! assert_eq!(codec::encode(&results[0], Encoding::Json).unwrap(), b"3");
//! ```

pub mod codec;
pub mod error;
pub mod pretty;
pub mod query;
pub mod stream;
pub mod tui;
pub mod value;

pub use codec::Encoding;
pub use error::{QqError, Result};
pub use value::Value;
