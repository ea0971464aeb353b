//! Tasting: two independent classifiers run sequentially on raw bytes
//! (spec §4.2).
//!
//! MIME detection is magic-number content sniffing (`infer`); rule matching
//! is a YARA-compatible, pure-Rust engine (`yara-x`). Both are loaded once at
//! worker start and reused for the lifetime of the process — no hot reload,
//! consistent with the bounded-lifetime-worker design (spec §4.6).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("failed to read yara rule file {path}: {source}")]
    ReadRules {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to compile yara rules: {0}")]
    Compile(String),
    #[error("yara rule directory {0} contains no *.yar/*.yara files")]
    EmptyRuleDir(PathBuf),
}

/// Loaded, compiled classifier state.
pub struct Classifier {
    rules: Option<yara_x::Rules>,
}

impl Classifier {
    /// Build a classifier from `tasting.yara_rules`, which may point at a
    /// single rule file or a directory of them. `None` disables rule
    /// matching entirely (only MIME flavors are produced).
    pub fn load(yara_rules: Option<&Path>) -> Result<Self, ClassifierError> {
        let rules = match yara_rules {
            None => None,
            Some(path) => Some(Self::compile_rules(path)?),
        };
        Ok(Self { rules })
    }

    fn rule_files(path: &Path) -> Result<Vec<PathBuf>, ClassifierError> {
        if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)
                .map_err(|source| ClassifierError::ReadRules {
                    path: path.to_path_buf(),
                    source,
                })?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("yar") | Some("yara")
                    )
                })
                .collect();
            files.sort();
            if files.is_empty() {
                return Err(ClassifierError::EmptyRuleDir(path.to_path_buf()));
            }
            Ok(files)
        } else {
            Ok(vec![path.to_path_buf()])
        }
    }

    /// Compile every matching rule file into one `Rules` object, one
    /// namespace per file (`namespace{i}`), compiled once.
    fn compile_rules(path: &Path) -> Result<yara_x::Rules, ClassifierError> {
        let files = Self::rule_files(path)?;
        let mut compiler = yara_x::Compiler::new();

        for (i, file) in files.iter().enumerate() {
            let source = std::fs::read_to_string(file).map_err(|source| ClassifierError::ReadRules {
                path: file.clone(),
                source,
            })?;
            let namespace = format!("namespace{i}");
            compiler
                .new_namespace(&namespace)
                .add_source(source.as_str())
                .map_err(|e| ClassifierError::Compile(e.to_string()))?;
        }

        Ok(compiler.build())
    }

    /// Content-sniff a single MIME label, if any.
    pub fn mime(&self, data: &[u8]) -> Option<String> {
        infer::get(data).map(|kind| kind.mime_type().to_string())
    }

    /// Run the rule matcher over `data` with leading ASCII whitespace
    /// stripped, returning one label per matching rule name.
    pub fn yara(&self, data: &[u8]) -> BTreeSet<String> {
        let rules = match &self.rules {
            Some(rules) => rules,
            None => return BTreeSet::new(),
        };

        let start = data
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(data.len());
        let stripped = &data[start..];

        let mut scanner = yara_x::Scanner::new(rules);
        let labels = match scanner.scan(stripped) {
            Ok(results) => results
                .matching_rules()
                .map(|r| r.identifier().to_string())
                .collect(),
            Err(e) => {
                debug!(error = %e, "yara scan failed");
                BTreeSet::new()
            }
        };
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_with_no_rules_still_sniffs() {
        let c = Classifier::load(None).unwrap();
        assert_eq!(c.yara(b"anything").len(), 0);
        // A PNG magic header should be recognized regardless of rule config.
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(c.mime(&png_header).as_deref(), Some("image/png"));
    }

    #[test]
    fn idempotent_classification() {
        let c = Classifier::load(None).unwrap();
        let data = b"hello world\n";
        let first = c.mime(data);
        let second = c.mime(data);
        assert_eq!(first, second);
    }
}
