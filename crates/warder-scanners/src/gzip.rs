use std::io::Read as _;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use serde_json::json;
use warder_coordinator::CoordinatorClient;
use warder_core::types::{File, ScanOutput, ScannerOptions};
use warder_core::ScannerPlugin;

/// Single-member gzip decompression, producing exactly one child file.
pub struct ScanGzip {
    coordinator: CoordinatorClient,
}

impl ScanGzip {
    pub fn new(coordinator: CoordinatorClient) -> Self {
        Self { coordinator }
    }
}

fn decompress(data: Vec<u8>) -> anyhow::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data.as_slice());
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[async_trait]
impl ScannerPlugin for ScanGzip {
    fn name(&self) -> &str {
        "ScanGzip"
    }

    async fn scan_wrapper(
        &self,
        data: &[u8],
        file: &File,
        _options: &ScannerOptions,
        expire_at: DateTime<Utc>,
    ) -> anyhow::Result<(Vec<File>, ScanOutput)> {
        let owned = data.to_vec();
        let decompressed = tokio::task::spawn_blocking(move || decompress(owned)).await??;

        let pointer = uuid::Uuid::new_v4().to_string();
        self.coordinator
            .push_bytes(&pointer, &decompressed, expire_at.timestamp())
            .await?;

        let child_name = file
            .name
            .as_deref()
            .and_then(|n| n.strip_suffix(".gz"))
            .map(|n| n.to_string());
        let child = File::child(pointer, child_name, Some(self.name().to_string()));

        let output = json!({ "decompressed_size": decompressed.len() });
        Ok((vec![child], output))
    }
}
