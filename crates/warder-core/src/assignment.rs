//! Scanner assignment algorithm (spec §4.4).
//!
//! For a single scanner, rules are evaluated in configured order; the first
//! rule that produces a verdict wins. A negative match at any rule vetoes the
//! *entire scanner* (later rules are not tried); a positive miss merely
//! advances to the next rule. This asymmetry is load-bearing.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use regex::Regex;
use warder_config::{RuleMatch, ScannerRule};

use crate::types::Assignment;

/// Caches compiled filename/source regexes across calls so that a request
/// with many file nodes doesn't recompile the same patterns per node.
pub struct AssignmentEngine {
    regex_cache: Mutex<HashMap<String, Regex>>,
}

impl Default for AssignmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentEngine {
    pub fn new() -> Self {
        Self {
            regex_cache: Mutex::new(HashMap::new()),
        }
    }

    fn matches(&self, pattern: &str, haystack: &str) -> bool {
        let mut cache = self.regex_cache.lock().unwrap();
        let re = cache
            .entry(pattern.to_string())
            .or_insert_with(|| match Regex::new(pattern) {
                Ok(re) => re,
                // An unparsable pattern never matches rather than panicking
                // the worker over a config typo.
                Err(_) => Regex::new("$^").unwrap(),
            });
        re.is_match(haystack)
    }

    fn side_matches(
        &self,
        side: &RuleMatch,
        flavors: &BTreeSet<String>,
        name: Option<&str>,
        source: Option<&str>,
    ) -> bool {
        if side
            .flavors
            .iter()
            .any(|f| f == "*" || flavors.contains(f))
        {
            return true;
        }
        if let (Some(pattern), Some(name)) = (side.filename.as_deref(), name) {
            if self.matches(pattern, name) {
                return true;
            }
        }
        if let (Some(pattern), Some(source)) = (side.source.as_deref(), source) {
            if self.matches(pattern, source) {
                return true;
            }
        }
        false
    }

    /// Veto check only looks at flavors/filename/source explicitly listed on
    /// the negative side — a `*` flavor wildcard is a positive-side-only
    /// concept and is intentionally not treated specially here.
    fn negative_vetoes(
        &self,
        side: &RuleMatch,
        flavors: &BTreeSet<String>,
        name: Option<&str>,
        source: Option<&str>,
    ) -> bool {
        if side.flavors.iter().any(|f| flavors.contains(f)) {
            return true;
        }
        if let (Some(pattern), Some(name)) = (side.filename.as_deref(), name) {
            if self.matches(pattern, name) {
                return true;
            }
        }
        if let (Some(pattern), Some(source)) = (side.source.as_deref(), source) {
            if self.matches(pattern, source) {
                return true;
            }
        }
        false
    }

    /// Evaluate one scanner's rule list against a file's flavors/name/source.
    /// Returns `None` if the scanner is not assigned.
    pub fn assign_one(
        &self,
        scanner_name: &str,
        rules: &[ScannerRule],
        flavors: &BTreeSet<String>,
        name: Option<&str>,
        source: Option<&str>,
    ) -> Option<Assignment> {
        for rule in rules {
            if let Some(negative) = &rule.negative {
                if self.negative_vetoes(negative, flavors, name, source) {
                    return None;
                }
            }
            if let Some(positive) = &rule.positive {
                if self.side_matches(positive, flavors, name, source) {
                    return Some(Assignment {
                        name: scanner_name.to_string(),
                        priority: rule.priority,
                        options: rule.options.clone(),
                    });
                }
            }
        }
        None
    }

    /// Evaluate every configured scanner and return the assigned ones,
    /// sorted by priority descending with stable (configured-order)
    /// tie-breaking.
    pub fn assign_all<'a>(
        &self,
        scanners: impl IntoIterator<Item = (&'a String, &'a Vec<ScannerRule>)>,
        flavors: &BTreeSet<String>,
        name: Option<&str>,
        source: Option<&str>,
    ) -> Vec<Assignment> {
        let mut assigned: Vec<Assignment> = scanners
            .into_iter()
            .filter_map(|(scanner_name, rules)| {
                self.assign_one(scanner_name, rules, flavors, name, source)
            })
            .collect();
        assigned.sort_by(|a, b| b.priority.cmp(&a.priority));
        assigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warder_config::ScannerRule;

    fn rule(
        positive: Option<RuleMatch>,
        negative: Option<RuleMatch>,
        priority: i32,
    ) -> ScannerRule {
        ScannerRule {
            positive,
            negative,
            priority,
            options: Default::default(),
        }
    }

    fn flavors(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wildcard_positive_matches_anything() {
        let engine = AssignmentEngine::new();
        let rules = vec![rule(
            Some(RuleMatch {
                flavors: vec!["*".into()],
                filename: None,
                source: None,
            }),
            None,
            5,
        )];
        let assignment = engine
            .assign_one("ScanFoo", &rules, &flavors(&["text/plain"]), None, None)
            .unwrap();
        assert_eq!(assignment.name, "ScanFoo");
        assert_eq!(assignment.priority, 5);
    }

    #[test]
    fn negative_veto_short_circuits_entire_scanner() {
        let engine = AssignmentEngine::new();
        let rules = vec![
            rule(
                None,
                Some(RuleMatch {
                    flavors: vec!["text/plain".into()],
                    filename: None,
                    source: None,
                }),
                5,
            ),
            rule(
                Some(RuleMatch {
                    flavors: vec!["*".into()],
                    filename: None,
                    source: None,
                }),
                None,
                5,
            ),
        ];
        let assignment = engine.assign_one(
            "ScanFoo",
            &rules,
            &flavors(&["text/plain"]),
            None,
            None,
        );
        assert!(assignment.is_none());
    }

    #[test]
    fn positive_miss_advances_to_next_rule() {
        let engine = AssignmentEngine::new();
        let rules = vec![
            rule(
                Some(RuleMatch {
                    flavors: vec!["application/zip".into()],
                    filename: None,
                    source: None,
                }),
                None,
                5,
            ),
            rule(
                Some(RuleMatch {
                    flavors: vec!["*".into()],
                    filename: None,
                    source: None,
                }),
                None,
                3,
            ),
        ];
        let assignment = engine
            .assign_one("ScanFoo", &rules, &flavors(&["text/plain"]), None, None)
            .unwrap();
        assert_eq!(assignment.priority, 3);
    }

    #[test]
    fn priority_sort_is_descending_and_stable() {
        let engine = AssignmentEngine::new();
        let wildcard = |priority| {
            vec![rule(
                Some(RuleMatch {
                    flavors: vec!["*".into()],
                    filename: None,
                    source: None,
                }),
                None,
                priority,
            )]
        };
        let a_rules = wildcard(7);
        let b_rules = wildcard(3);
        let map: Vec<(String, Vec<ScannerRule>)> = vec![
            ("ScanB".to_string(), b_rules),
            ("ScanA".to_string(), a_rules),
        ];
        let refs: Vec<(&String, &Vec<ScannerRule>)> = map.iter().map(|(k, v)| (k, v)).collect();
        let assigned = engine.assign_all(refs, &flavors(&["text/plain"]), None, None);
        assert_eq!(assigned[0].name, "ScanA");
        assert_eq!(assigned[1].name, "ScanB");
    }
}
