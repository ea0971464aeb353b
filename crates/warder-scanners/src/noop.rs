use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use warder_core::types::{File, ScanOutput, ScannerOptions};
use warder_core::ScannerPlugin;

/// Passthrough plugin: documents the minimal contract a plugin must satisfy.
pub struct ScanNoop;

#[async_trait]
impl ScannerPlugin for ScanNoop {
    fn name(&self) -> &str {
        "ScanNoop"
    }

    async fn scan_wrapper(
        &self,
        _data: &[u8],
        _file: &File,
        _options: &ScannerOptions,
        _expire_at: DateTime<Utc>,
    ) -> anyhow::Result<(Vec<File>, ScanOutput)> {
        Ok((Vec::new(), json!({})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warder_core::File;

    #[tokio::test]
    async fn produces_no_children_or_output() {
        let scanner = ScanNoop;
        let file = File::root("r1");
        let (children, output) = scanner
            .scan_wrapper(b"anything", &file, &Default::default(), Utc::now())
            .await
            .unwrap();
        assert!(children.is_empty());
        assert_eq!(output, json!({}));
    }
}
