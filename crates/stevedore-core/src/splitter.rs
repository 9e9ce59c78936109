//! Multi-document bundle splitting
//!
//! Bundles are YAML streams (JSON documents are valid YAML). Each non-empty
//! document is re-serialized to canonical YAML so later stages never see
//! anchors, flow style or comments. Null documents, such as the ones produced
//! by consecutive `---` markers, are dropped and not counted.

use serde::Deserialize;

use crate::declaration::Document;
use crate::error::{CoreError, Result};

/// Lazy, single-pass iterator over the non-empty documents of a bundle
///
/// The iterator stops after the first error.
pub struct DocumentSplitter<'a> {
    stream: serde_yaml::Deserializer<'a>,
    yielded: usize,
    failed: bool,
}

impl<'a> DocumentSplitter<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            stream: serde_yaml::Deserializer::from_slice(bytes),
            yielded: 0,
            failed: false,
        }
    }

    /// Number of documents yielded so far
    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl Iterator for DocumentSplitter<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let document = self.stream.next()?;

            let value = match serde_yaml::Value::deserialize(document) {
                Ok(value) => value,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(CoreError::Stream(e)));
                }
            };

            if value.is_null() {
                continue;
            }

            let index = self.yielded + 1;
            return match serde_yaml::to_string(&value) {
                Ok(normalized) => {
                    self.yielded = index;
                    Some(Ok(Document {
                        index,
                        bytes: normalized.into_bytes(),
                    }))
                }
                Err(source) => {
                    self.failed = true;
                    Some(Err(CoreError::Normalize { index, source }))
                }
            };
        }
    }
}

/// Drain a bundle into its documents, preserving order
pub fn split_documents(bytes: &[u8]) -> Result<Vec<Document>> {
    DocumentSplitter::new(bytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(doc: &Document) -> &str {
        std::str::from_utf8(&doc.bytes).unwrap()
    }

    #[test]
    fn test_split_two_documents() {
        let bundle = b"apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n---\napiVersion: v1\nkind: Secret\nmetadata:\n  name: b\n";
        let docs = split_documents(bundle).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].index, 1);
        assert_eq!(docs[1].index, 2);
        assert!(text(&docs[1]).contains("kind: Secret"));
    }

    #[test]
    fn test_empty_documents_are_dropped() {
        let bundle = b"---\n---\nkind: Foo\napiVersion: example.com/v1\n";
        let docs = split_documents(bundle).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].index, 1);
    }

    #[test]
    fn test_comment_only_document_is_dropped() {
        let bundle = b"# leading comment\n---\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: ops\n---\n# trailing\n";
        let docs = split_documents(bundle).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_empty_stream() {
        assert!(split_documents(b"").unwrap().is_empty());
        assert!(split_documents(b"\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_json_document() {
        let bundle = br#"{"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": "j"}}"#;
        let docs = split_documents(bundle).unwrap();
        assert_eq!(docs.len(), 1);
        insta::assert_snapshot!(text(&docs[0]), @r"
        apiVersion: v1
        kind: ConfigMap
        metadata:
          name: j
        ");
    }

    #[test]
    fn test_documents_are_normalized() {
        let bundle = b"apiVersion: v1\nkind: ConfigMap   # trailing comment\nmetadata: {name: flow}\n";
        let docs = split_documents(bundle).unwrap();
        insta::assert_snapshot!(text(&docs[0]), @r"
        apiVersion: v1
        kind: ConfigMap
        metadata:
          name: flow
        ");
    }

    #[test]
    fn test_invalid_yaml_aborts() {
        let bundle = b"apiVersion: v1\nkind: ConfigMap\n---\nkey: [unclosed\n";
        let mut splitter = DocumentSplitter::new(bundle);

        assert!(splitter.next().unwrap().is_ok());
        assert!(matches!(splitter.next(), Some(Err(CoreError::Stream(_)))));
        assert!(splitter.next().is_none());
        assert_eq!(splitter.yielded(), 1);
    }

    #[test]
    fn test_split_documents_fails_on_any_error() {
        let bundle = b"a: 1\n---\na: b: c\n";
        assert!(split_documents(bundle).is_err());
    }
}
