use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A raw uploaded file: its label (file name) and text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub label: String,
    pub content: String,
}

impl Payload {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
        }
    }
}

/// Generate a stable version string for a set of payloads.
///
/// Any change to a label, a content byte, or the payload order yields a new
/// version.
pub fn content_version(payloads: &[Payload]) -> String {
    let mut hasher = Sha256::new();
    for payload in payloads {
        hasher.update(payload.label.len().to_le_bytes());
        hasher.update(payload.label.as_bytes());
        hasher.update(payload.content.len().to_le_bytes());
        hasher.update(payload.content.as_bytes());
    }
    let result = hasher.finalize();
    hex::encode(&result[..16]) // First 16 bytes (32 hex chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_stable() {
        let payloads = vec![Payload::new("a.json", "[]"), Payload::new("b.json", "[1]")];
        assert_eq!(content_version(&payloads), content_version(&payloads.clone()));
        assert_eq!(content_version(&payloads).len(), 32);
    }

    #[test]
    fn test_version_tracks_content_and_boundaries() {
        let base = content_version(&[Payload::new("a.json", "[]")]);
        assert_ne!(base, content_version(&[Payload::new("a.json", "[ ]")]));
        assert_ne!(
            content_version(&[Payload::new("ab", "c")]),
            content_version(&[Payload::new("a", "bc")])
        );
    }
}
