use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sha2::Digest as _;
use warder_core::types::{File, ScanOutput, ScannerOptions};
use warder_core::ScannerPlugin;

/// Computes MD5/SHA1/SHA256 digests. No children, no options, always safe
/// to run regardless of flavor.
pub struct ScanHash;

#[async_trait]
impl ScannerPlugin for ScanHash {
    fn name(&self) -> &str {
        "ScanHash"
    }

    async fn scan_wrapper(
        &self,
        data: &[u8],
        _file: &File,
        _options: &ScannerOptions,
        _expire_at: DateTime<Utc>,
    ) -> anyhow::Result<(Vec<File>, ScanOutput)> {
        let md5 = hex::encode(md5::Md5::digest(data));
        let sha1 = hex::encode(sha1::Sha1::digest(data));
        let sha256 = hex::encode(sha2::Sha256::digest(data));
        let blake3 = blake3::hash(data).to_hex().to_string();

        let output = json!({
            "md5": md5,
            "sha1": sha1,
            "sha256": sha256,
            "blake3": blake3,
        });
        Ok((Vec::new(), output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warder_core::File;

    #[tokio::test]
    async fn digests_known_input() {
        let scanner = ScanHash;
        let file = File::root("r1");
        let (children, output) = scanner
            .scan_wrapper(b"hello world", &file, &Default::default(), Utc::now())
            .await
            .unwrap();
        assert!(children.is_empty());
        assert_eq!(
            output["sha256"],
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde"
        );
        assert_eq!(output["md5"], "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }
}
