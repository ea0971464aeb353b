use std::io::Read as _;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use warder_coordinator::CoordinatorClient;
use warder_core::types::{File, ScanOutput, ScannerOptions};
use warder_core::ScannerPlugin;

/// Walks a ZIP archive's central directory, pushing each entry's bytes back
/// to the coordinator under a fresh pointer.
pub struct ScanZip {
    coordinator: CoordinatorClient,
}

impl ScanZip {
    pub fn new(coordinator: CoordinatorClient) -> Self {
        Self { coordinator }
    }
}

fn extract_entries(data: Vec<u8>) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)?;
    let mut out = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;
        out.push((name, buf));
    }
    Ok(out)
}

#[async_trait]
impl ScannerPlugin for ScanZip {
    fn name(&self) -> &str {
        "ScanZip"
    }

    async fn scan_wrapper(
        &self,
        data: &[u8],
        _file: &File,
        _options: &ScannerOptions,
        expire_at: DateTime<Utc>,
    ) -> anyhow::Result<(Vec<File>, ScanOutput)> {
        let owned = data.to_vec();
        let entries = tokio::task::spawn_blocking(move || extract_entries(owned)).await??;

        let mut children = Vec::with_capacity(entries.len());
        for (name, bytes) in &entries {
            let pointer = uuid::Uuid::new_v4().to_string();
            self.coordinator
                .push_bytes(&pointer, bytes, expire_at.timestamp())
                .await?;
            children.push(File::child(
                pointer,
                Some(name.clone()),
                Some(self.name().to_string()),
            ));
        }

        let output = json!({ "entry_count": children.len() });
        Ok((children, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn build_test_archive() -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = std::io::Cursor::new(&mut buf);
            let mut writer = ::zip::ZipWriter::new(cursor);
            let options = ::zip::write::FileOptions::default();
            writer.start_file("hello.txt", options).unwrap();
            writer.write_all(b"hello").unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn extracts_single_entry() {
        let archive = build_test_archive();
        let entries = extract_entries(archive).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "hello.txt");
        assert_eq!(entries[0].1, b"hello");
    }
}
