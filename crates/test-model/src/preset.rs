use serde::{Deserialize, Serialize};

/// The preset reply for one oracle call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Text chunks streamed back as message deltas, in order.
    pub chunks: Vec<String>,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` that streams `text` as a single chunk.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self::with_chunks([text.into()])
    }

    /// Creates a `PresetResponse` with the specified chunks.
    #[inline]
    pub fn with_chunks(chunks: impl Into<Vec<String>>) -> Self {
        Self {
            chunks: chunks.into(),
            failures: None,
        }
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Returns the full text of this response.
    #[inline]
    pub fn text(&self) -> String {
        self.chunks.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_chunks([
            "CONFIDENCE: 90\n".to_owned(),
            "REASONING: enough sources agree\n".to_owned(),
        ])
        .with_failures(2);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
        assert_eq!(
            deserialized.text(),
            "CONFIDENCE: 90\nREASONING: enough sources agree\n"
        );
    }
}
