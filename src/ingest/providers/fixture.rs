// src/ingest/providers/fixture.rs
use async_trait::async_trait;

use crate::error::FeedError;
use crate::ingest::types::FeedSource;

/// Serves a document held in memory (tests, replays of saved feeds).
pub struct FixtureFeed {
    name: String,
    bytes: Vec<u8>,
}

impl FixtureFeed {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_fixture(s: &str) -> Self {
        Self::from_bytes("fixture", s.as_bytes())
    }

    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(path.display().to_string(), bytes))
    }
}

#[async_trait]
impl FeedSource for FixtureFeed {
    async fn fetch(&self) -> Result<Vec<u8>, FeedError> {
        Ok(self.bytes.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
