//! The codec registry: one table mapping format identifiers to decode and
//! encode functions over the canonical [`Value`](crate::value::Value) tree.
//!
//! Adding a format is a single entry in [`Encoding::ALL`] plus its codec
//! module; no other component learns of its existence except through this
//! table.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{QqError, Result};
use crate::value::Value;

pub mod base64;
pub mod dsv;
pub mod env;
pub mod gron;
pub mod hcl;
pub mod html;
pub mod ini;
pub mod json;
pub mod jsonc;
pub mod jsonl;
pub mod line;
pub mod markdown;
pub mod msgpack;
pub mod parquet;
pub mod properties;
pub mod proto;
pub mod toml;
pub mod xml;
pub mod yaml;

/// A supported input/output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Json,
    Jsonl,
    Jsonc,
    Yaml,
    Toml,
    Hcl,
    Xml,
    Html,
    Csv,
    Tsv,
    Ini,
    Properties,
    Env,
    Gron,
    Line,
    Proto,
    Msgpack,
    Parquet,
    Base64,
    Markdown,
}

impl Encoding {
    /// Every registered format, in registry order. First extension wins on
    /// duplicates when building the extension map.
    pub const ALL: &'static [Encoding] = &[
        Encoding::Json,
        Encoding::Jsonl,
        Encoding::Jsonc,
        Encoding::Yaml,
        Encoding::Toml,
        Encoding::Hcl,
        Encoding::Xml,
        Encoding::Html,
        Encoding::Csv,
        Encoding::Tsv,
        Encoding::Ini,
        Encoding::Properties,
        Encoding::Env,
        Encoding::Gron,
        Encoding::Line,
        Encoding::Proto,
        Encoding::Msgpack,
        Encoding::Parquet,
        Encoding::Base64,
        Encoding::Markdown,
    ];

    /// Canonical name, used in messages and help text.
    pub fn name(&self) -> &'static str {
        self.extensions()[0]
    }

    /// Accepted extension aliases; the first entry is the canonical name.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Encoding::Json => &["json"],
            Encoding::Jsonl => &["jsonl", "ndjson", "jsonlines"],
            Encoding::Jsonc => &["jsonc"],
            Encoding::Yaml => &["yaml", "yml"],
            Encoding::Toml => &["toml"],
            Encoding::Hcl => &["hcl", "tf"],
            Encoding::Xml => &["xml"],
            Encoding::Html => &["html", "htm"],
            Encoding::Csv => &["csv"],
            Encoding::Tsv => &["tsv"],
            Encoding::Ini => &["ini"],
            Encoding::Properties => &["properties"],
            Encoding::Env => &["env"],
            Encoding::Gron => &["gron"],
            Encoding::Line => &["line", "txt"],
            Encoding::Proto => &["proto"],
            Encoding::Msgpack => &["msgpack", "mpk"],
            Encoding::Parquet => &["parquet"],
            Encoding::Base64 => &["base64", "b64"],
            Encoding::Markdown => &["markdown", "md"],
        }
    }

    /// Binary formats write raw bytes to stdout and skip pretty-printing.
    pub fn is_binary(&self) -> bool {
        matches!(self, Encoding::Msgpack | Encoding::Parquet)
    }

    /// Formats with an incremental path-value decomposer. Everything else
    /// falls back to decode-in-full when streamed.
    pub fn is_streamable(&self) -> bool {
        matches!(
            self,
            Encoding::Json
                | Encoding::Jsonl
                | Encoding::Yaml
                | Encoding::Line
                | Encoding::Csv
                | Encoding::Tsv
        )
    }

    /// Case-insensitive lookup across canonical names and aliases.
    pub fn from_name(name: &str) -> Result<Encoding> {
        let lower = name.to_lowercase();
        for enc in Encoding::ALL {
            if enc.extensions().contains(&lower.as_str()) {
                return Ok(*enc);
            }
        }
        Err(QqError::UnknownFormat(name.to_string()))
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = QqError;

    fn from_str(s: &str) -> Result<Encoding> {
        Encoding::from_name(s)
    }
}

/// Extension → encoding lookup used to infer a format from a filename.
/// First registration wins on duplicate extensions.
pub fn extension_map() -> &'static HashMap<&'static str, Encoding> {
    static MAP: OnceLock<HashMap<&'static str, Encoding>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = HashMap::new();
        for enc in Encoding::ALL {
            for ext in enc.extensions() {
                map.entry(*ext).or_insert(*enc);
            }
        }
        map
    })
}

/// Every accepted extension, sorted, for help text.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut exts: Vec<&'static str> = extension_map().keys().copied().collect();
    exts.sort_unstable();
    exts
}

/// Decode `input` as `encoding` into the canonical value tree.
pub fn decode(input: &[u8], encoding: Encoding) -> Result<Value> {
    let result = match encoding {
        Encoding::Json => json::decode(input),
        Encoding::Jsonl => jsonl::decode(input),
        Encoding::Jsonc => jsonc::decode(input),
        Encoding::Yaml => yaml::decode(input),
        Encoding::Toml => toml::decode(input),
        Encoding::Hcl => hcl::decode(input),
        Encoding::Xml => xml::decode(input),
        Encoding::Html => html::decode(input),
        Encoding::Csv => dsv::decode_csv(input),
        Encoding::Tsv => dsv::decode_tsv(input),
        Encoding::Ini => ini::decode(input),
        Encoding::Properties => properties::decode(input),
        Encoding::Env => env::decode(input),
        Encoding::Gron => gron::decode(input),
        Encoding::Line => line::decode(input),
        Encoding::Proto => proto::decode(input),
        Encoding::Msgpack => msgpack::decode(input),
        Encoding::Parquet => parquet::decode(input),
        Encoding::Base64 => base64::decode(input),
        Encoding::Markdown => markdown::decode(input),
    };
    result.map_err(|e| QqError::Decode(format!("{e:#}")))
}

/// Encode `value` as `encoding`.
///
/// HTML, Proto and Markdown are decode-only; their output paths reuse the
/// XML and JSON encoders respectively.
pub fn encode(value: &Value, encoding: Encoding) -> Result<Vec<u8>> {
    let result = match encoding {
        Encoding::Json | Encoding::Jsonc => json::encode(value),
        Encoding::Jsonl => jsonl::encode(value),
        Encoding::Yaml => yaml::encode(value),
        Encoding::Toml => toml::encode(value),
        Encoding::Hcl => hcl::encode(value),
        Encoding::Xml | Encoding::Html => xml::encode(value),
        Encoding::Csv => dsv::encode_csv(value),
        Encoding::Tsv => dsv::encode_tsv(value),
        Encoding::Ini => ini::encode(value),
        Encoding::Properties => properties::encode(value),
        Encoding::Env => env::encode(value),
        Encoding::Gron => gron::encode(value),
        Encoding::Line | Encoding::Proto | Encoding::Markdown => json::encode(value),
        Encoding::Msgpack => msgpack::encode(value),
        Encoding::Parquet => parquet::encode(value),
        Encoding::Base64 => base64::encode(value),
    };
    result.map_err(|e| QqError::Encode {
        format: encoding,
        detail: format!("{e:#}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_alias() {
        assert_eq!(Encoding::from_name("json").unwrap(), Encoding::Json);
        assert_eq!(Encoding::from_name("YAML").unwrap(), Encoding::Yaml);
        assert_eq!(Encoding::from_name("yml").unwrap(), Encoding::Yaml);
        assert_eq!(Encoding::from_name("tf").unwrap(), Encoding::Hcl);
        assert_eq!(Encoding::from_name("mpk").unwrap(), Encoding::Msgpack);
        assert_eq!(Encoding::from_name("ndjson").unwrap(), Encoding::Jsonl);
        assert_eq!(Encoding::from_name("b64").unwrap(), Encoding::Base64);
        assert!(Encoding::from_name("nope").is_err());
    }

    #[test]
    fn test_registry_closure() {
        // every supported extension resolves to an encoding that lists it
        for ext in supported_extensions() {
            let enc = Encoding::from_name(ext).unwrap();
            assert!(
                enc.extensions().contains(&ext),
                "{ext} not listed by {enc}"
            );
        }
    }

    #[test]
    fn test_extension_map_first_wins() {
        assert_eq!(extension_map()["txt"], Encoding::Line);
        assert_eq!(extension_map()["tf"], Encoding::Hcl);
    }

    #[test]
    fn test_binary_flags() {
        assert!(Encoding::Msgpack.is_binary());
        assert!(Encoding::Parquet.is_binary());
        assert!(!Encoding::Json.is_binary());
    }

    #[test]
    fn test_streamable_flags() {
        for enc in [
            Encoding::Json,
            Encoding::Jsonl,
            Encoding::Yaml,
            Encoding::Line,
            Encoding::Csv,
            Encoding::Tsv,
        ] {
            assert!(enc.is_streamable(), "{enc} has an incremental parser");
        }
        assert!(!Encoding::Toml.is_streamable());
        assert!(!Encoding::Msgpack.is_streamable());
    }

    #[test]
    fn test_decode_error_prefix() {
        let err = decode(b"{invalid", Encoding::Json).unwrap_err();
        assert!(err.to_string().starts_with("error parsing input:"));
    }

    #[test]
    fn test_encode_error_prefix() {
        let err = encode(&Value::Int(3), Encoding::Csv).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("error marshaling result to csv:"));
    }
}
