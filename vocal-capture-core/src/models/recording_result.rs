use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A finished recording: the concatenated device bytes plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub bytes: Vec<u8>,
    pub metadata: RecordingMetadata,
}

impl Recording {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Metadata describing a recording, serializable for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub chunk_count: usize,
    pub byte_length: usize,
    /// SHA-256 of the concatenated bytes, lowercase hex.
    pub checksum: String,
    pub started_at: String,
    pub stopped_at: String,
    pub duration_secs: f64,
}

impl RecordingMetadata {
    pub fn new(
        bytes: &[u8],
        chunk_count: usize,
        started_at: DateTime<Utc>,
        stopped_at: DateTime<Utc>,
    ) -> Self {
        let duration_secs = (stopped_at - started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chunk_count,
            byte_length: bytes.len(),
            checksum: sha256_hex(bytes),
            started_at: started_at.to_rfc3339(),
            stopped_at: stopped_at.to_rfc3339(),
            duration_secs,
        }
    }
}

fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
