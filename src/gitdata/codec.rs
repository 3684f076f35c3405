//! gitdata::codec
//!
//! Wire-format rules shared by every object-client call.
//!
//! # Conventions
//!
//! - Field names on the wire are snake_case, which is also the Rust
//!   naming convention, so records map field-for-field; the few wire
//!   names that differ (`type`, `target`, `submodule_git_url`) are
//!   renamed explicitly.
//! - Binary payloads travel as base64 text. The remote wraps long
//!   payloads with newlines, so decoding ignores ASCII whitespace but
//!   rejects any other non-alphabet character.
//! - [`DirectoryEntry`] is a closed set of four variants selected by the
//!   `type` discriminator. An unknown discriminator is a decode error.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding wire payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("payload is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("unsupported blob encoding '{0}'")]
    UnsupportedEncoding(String),
}

/// Encode raw bytes as a base64 payload.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 payload, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns `CodecError::InvalidBase64` for any other invalid input.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, CodecError> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .map_err(|e| CodecError::InvalidBase64(e.to_string()))
}

/// Decode blob content according to the `encoding` field that
/// accompanies it.
///
/// # Errors
///
/// Returns `CodecError::UnsupportedEncoding` for encodings other than
/// `base64` and `utf-8`, and `CodecError::InvalidBase64` for a bad
/// base64 payload.
pub fn decode_blob_content(content: &str, encoding: &str) -> Result<Vec<u8>, CodecError> {
    match encoding {
        "base64" => decode_base64(content),
        "utf-8" | "utf8" => Ok(content.as_bytes().to_vec()),
        other => Err(CodecError::UnsupportedEncoding(other.to_string())),
    }
}

/// Serde adapter for `Vec<u8>` fields carried as base64 strings.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_base64(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let payload = String::deserialize(deserializer)?;
        super::decode_base64(&payload).map_err(serde::de::Error::custom)
    }

    /// The same adapter for optional fields.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            bytes: &Option<Vec<u8>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => super::serialize(bytes, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec<u8>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|payload| super::super::decode_base64(&payload))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

/// An entry of a directory listing on a branch.
///
/// Each variant carries only the fields meaningful for it, and encoding
/// emits only those fields next to the discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectoryEntry {
    /// A regular file. `content` is only present when a single file was
    /// requested.
    File {
        name: String,
        #[serde(
            default,
            with = "base64_bytes::option",
            skip_serializing_if = "Option::is_none"
        )]
        content: Option<Vec<u8>>,
    },

    /// A subdirectory.
    #[serde(rename = "dir")]
    Directory { name: String },

    /// A symbolic link.
    Symlink {
        name: String,
        #[serde(rename = "target")]
        target_path: String,
    },

    /// A submodule.
    Submodule {
        name: String,
        #[serde(rename = "submodule_git_url")]
        url: String,
    },
}

impl DirectoryEntry {
    /// Entry name (last path component).
    pub fn name(&self) -> &str {
        match self {
            DirectoryEntry::File { name, .. }
            | DirectoryEntry::Directory { name }
            | DirectoryEntry::Symlink { name, .. }
            | DirectoryEntry::Submodule { name, .. } => name,
        }
    }

    /// Wire discriminator of this entry.
    pub fn kind(&self) -> &'static str {
        match self {
            DirectoryEntry::File { .. } => "file",
            DirectoryEntry::Directory { .. } => "dir",
            DirectoryEntry::Symlink { .. } => "symlink",
            DirectoryEntry::Submodule { .. } => "submodule",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod base64_payloads {
        use super::*;

        #[test]
        fn decodes_wrapped_payload() {
            // GitHub wraps blob content at 60 columns
            let payload = "aGVs\nbG8g\r\nd29y bGQ=\n";
            assert_eq!(decode_base64(payload).unwrap(), b"hello world");
        }

        #[test]
        fn rejects_invalid_characters() {
            assert!(matches!(
                decode_base64("not*base64"),
                Err(CodecError::InvalidBase64(_))
            ));
        }

        #[test]
        fn empty_payload_is_empty_content() {
            assert_eq!(decode_base64("").unwrap(), Vec::<u8>::new());
        }

        #[test]
        fn blob_encodings() {
            assert_eq!(decode_blob_content("aGk=", "base64").unwrap(), b"hi");
            assert_eq!(decode_blob_content("hi", "utf-8").unwrap(), b"hi");
            assert!(matches!(
                decode_blob_content("hi", "latin1"),
                Err(CodecError::UnsupportedEncoding(_))
            ));
        }
    }

    mod directory_entry {
        use super::*;

        #[test]
        fn decodes_file_with_content() {
            let entry: DirectoryEntry = serde_json::from_value(json!({
                "type": "file",
                "name": "README.md",
                "path": "docs/README.md",
                "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
                "encoding": "base64",
                "content": "SGVs\nbG8=\n",
            }))
            .unwrap();
            assert_eq!(
                entry,
                DirectoryEntry::File {
                    name: "README.md".into(),
                    content: Some(b"Hello".to_vec()),
                }
            );
        }

        #[test]
        fn decodes_file_without_content() {
            let entry: DirectoryEntry =
                serde_json::from_value(json!({"type": "file", "name": "a.txt"})).unwrap();
            assert_eq!(
                entry,
                DirectoryEntry::File {
                    name: "a.txt".into(),
                    content: None,
                }
            );
        }

        #[test]
        fn decodes_dir_symlink_submodule() {
            let entries: Vec<DirectoryEntry> = serde_json::from_value(json!([
                {"type": "dir", "name": "src"},
                {"type": "symlink", "name": "latest", "target": "releases/v2"},
                {"type": "submodule", "name": "vendor", "submodule_git_url": "git://example.com/vendor.git"},
            ]))
            .unwrap();
            assert_eq!(
                entries,
                vec![
                    DirectoryEntry::Directory { name: "src".into() },
                    DirectoryEntry::Symlink {
                        name: "latest".into(),
                        target_path: "releases/v2".into(),
                    },
                    DirectoryEntry::Submodule {
                        name: "vendor".into(),
                        url: "git://example.com/vendor.git".into(),
                    },
                ]
            );
        }

        #[test]
        fn unknown_discriminator_is_an_error() {
            let result: Result<DirectoryEntry, _> =
                serde_json::from_value(json!({"type": "socket", "name": "x"}));
            assert!(result.is_err());
        }

        #[test]
        fn symlink_requires_target() {
            let result: Result<DirectoryEntry, _> =
                serde_json::from_value(json!({"type": "symlink", "name": "x"}));
            assert!(result.is_err());
        }

        #[test]
        fn invalid_inline_content_is_an_error() {
            let result: Result<DirectoryEntry, _> = serde_json::from_value(
                json!({"type": "file", "name": "x", "content": "%%%"}),
            );
            assert!(result.is_err());
        }

        #[test]
        fn encodes_only_variant_fields() {
            let dir = serde_json::to_value(DirectoryEntry::Directory { name: "src".into() })
                .unwrap();
            assert_eq!(dir, json!({"type": "dir", "name": "src"}));

            let file = serde_json::to_value(DirectoryEntry::File {
                name: "a.txt".into(),
                content: Some(b"hi".to_vec()),
            })
            .unwrap();
            assert_eq!(file, json!({"type": "file", "name": "a.txt", "content": "aGk="}));

            let bare = serde_json::to_value(DirectoryEntry::File {
                name: "a.txt".into(),
                content: None,
            })
            .unwrap();
            assert_eq!(bare, json!({"type": "file", "name": "a.txt"}));
        }

        #[test]
        fn name_and_kind() {
            let entry = DirectoryEntry::Symlink {
                name: "latest".into(),
                target_path: "v2".into(),
            };
            assert_eq!(entry.name(), "latest");
            assert_eq!(entry.kind(), "symlink");
        }
    }
}
