//! JSON document operations
//!
//! A document is whatever JSON value is stored at a path. Reads of a path
//! that was never written are not errors; they come back as
//! `DocumentRead::Empty` and are served as `[]`.

use std::path::Path;

use serde_json::Value;

use crate::error::DocumentError;
use crate::http::response::EMPTY_DOCUMENT_BODY;
use crate::storage::DocumentStore;

/// Outcome of a successful document read
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentRead {
    Found(Value),
    /// Nothing stored at the path yet
    Empty,
}

impl DocumentRead {
    /// Compact JSON body for the response
    pub fn into_body(self) -> Result<Vec<u8>, DocumentError> {
        match self {
            Self::Found(value) => Ok(serde_json::to_vec(&value)?),
            Self::Empty => Ok(EMPTY_DOCUMENT_BODY.as_bytes().to_vec()),
        }
    }
}

/// Load and parse the document stored at `path`
pub async fn read_document(
    store: &dyn DocumentStore,
    path: &Path,
) -> Result<DocumentRead, DocumentError> {
    let Some(bytes) = store.read(path).await? else {
        return Ok(DocumentRead::Empty);
    };
    let text = std::str::from_utf8(&bytes)?;
    Ok(DocumentRead::Found(serde_json::from_str(text)?))
}

/// Parse `body` and overwrite the document at `path` with it
///
/// The body is fully parsed before the store is touched, so a malformed
/// body leaves the existing document intact. The write itself truncates
/// in place; a failure part way through can leave a partial file.
pub async fn write_document(
    store: &dyn DocumentStore,
    path: &Path,
    body: &[u8],
) -> Result<(), DocumentError> {
    let text = std::str::from_utf8(body)?;
    let value: Value = serde_json::from_str(text)?;
    let serialized = serde_json::to_string_pretty(&value)?;
    store.write(path, serialized.as_bytes()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_document_is_empty() {
        let store = InMemoryStore::new();
        let read = read_document(&store, Path::new("never.json")).await.unwrap();
        assert_eq!(read, DocumentRead::Empty);
        assert_eq!(read.into_body().unwrap(), b"[]");
    }

    #[tokio::test]
    async fn test_roundtrip_values() {
        let store = InMemoryStore::new();
        let values = [
            json!({"sessions": [{"id": 1, "minutes": 25.5}], "active": null}),
            json!([1, "two", false]),
            json!("just a string"),
            json!(42),
            json!(null),
        ];

        for value in values {
            write_document(&store, Path::new("doc.json"), value.to_string().as_bytes())
                .await
                .unwrap();
            let read = read_document(&store, Path::new("doc.json")).await.unwrap();
            assert_eq!(read, DocumentRead::Found(value));
        }
    }

    #[tokio::test]
    async fn test_written_form_is_pretty_with_two_spaces() {
        let store = InMemoryStore::new();
        write_document(&store, Path::new("data.json"), br#"{"a":[1,2]}"#)
            .await
            .unwrap();

        let stored = store.contents("data.json").await.unwrap();
        assert_eq!(
            String::from_utf8(stored).unwrap(),
            "{\n  \"a\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[tokio::test]
    async fn test_key_order_preserved() {
        let store = InMemoryStore::new();
        write_document(&store, Path::new("o.json"), br#"{"zeta": 1, "alpha": 2, "mid": 3}"#)
            .await
            .unwrap();

        let body = read_document(&store, Path::new("o.json"))
            .await
            .unwrap()
            .into_body()
            .unwrap();
        assert_eq!(body, br#"{"zeta":1,"alpha":2,"mid":3}"#);
    }

    #[tokio::test]
    async fn test_large_integers_survive() {
        let store = InMemoryStore::new();
        write_document(&store, Path::new("n.json"), b"[123456789012345678901234567890]")
            .await
            .unwrap();
        let body = read_document(&store, Path::new("n.json"))
            .await
            .unwrap()
            .into_body()
            .unwrap();
        assert_eq!(body, b"[123456789012345678901234567890]");
    }

    #[tokio::test]
    async fn test_malformed_body_leaves_document_untouched() {
        let store = InMemoryStore::with_files([("data.json", r#"{"keep": true}"#)]);

        let err = write_document(&store, Path::new("data.json"), b"not-json")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
        assert_eq!(store.contents("data.json").await.unwrap(), br#"{"keep": true}"#);
    }

    #[tokio::test]
    async fn test_invalid_utf8_body() {
        let store = InMemoryStore::new();
        let err = write_document(&store, Path::new("data.json"), &[0x22, 0xff, 0x22])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Utf8(_)));
        assert!(store.contents("data.json").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_stored_document() {
        let store = InMemoryStore::with_files([("data.json", "{\"a\": ")]);
        let err = read_document(&store, Path::new("data.json")).await.unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
        assert_eq!(err.status(), 500);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let store = InMemoryStore::new();
        let err = write_document(&store, Path::new("missing/data.json"), b"[]")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Store(_)));
    }
}
