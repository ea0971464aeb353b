//! Distributor: classify + scan one file node, emit its event, surface
//! children (spec §4.5).
//!
//! Traversal is driven from an explicit work stack rather than native
//! recursion (Design Notes §9), so tree depth never grows the call stack —
//! `max_depth` remains the only termination guarantee on tree depth, and a
//! generous breadth cap (`max_nodes`, an addition beyond the distilled spec)
//! guards total memory if a scanner returns unbounded children.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use warder_config::{log_distributor_debug, log_distributor_warn, ScannerRule};
use warder_coordinator::CoordinatorClient;

use crate::assignment::AssignmentEngine;
use crate::classifier::Classifier;
use crate::error::WorkerError;
use crate::registry::ScannerRegistry;
use crate::types::{File, FileRecord, TreeAnchor};

/// Generous default cap on outstanding file nodes per request, independent
/// of `max_depth`. Not part of the distilled spec's config surface; guards
/// memory if a scanner returns pathologically many children.
pub const DEFAULT_MAX_NODES: usize = 100_000;

pub struct Distributor<'a> {
    coordinator: &'a CoordinatorClient,
    classifier: &'a Classifier,
    assignment_engine: &'a AssignmentEngine,
    registry: &'a mut ScannerRegistry,
    scanners: &'a IndexMap<String, Vec<ScannerRule>>,
    max_depth: u32,
    distribution_timeout: Duration,
    max_nodes: usize,
}

impl<'a> Distributor<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        coordinator: &'a CoordinatorClient,
        classifier: &'a Classifier,
        assignment_engine: &'a AssignmentEngine,
        registry: &'a mut ScannerRegistry,
        scanners: &'a IndexMap<String, Vec<ScannerRule>>,
        max_depth: u32,
        distribution_timeout: Duration,
    ) -> Self {
        Self {
            coordinator,
            classifier,
            assignment_engine,
            registry,
            scanners,
            max_depth,
            distribution_timeout,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }

    /// Process the full tree rooted at `root`, emitting one event per
    /// processed node. Does not emit `FIN` — that is the worker loop's job
    /// once this returns successfully.
    pub async fn run(&mut self, root_id: &str, root: File, expire_at: DateTime<Utc>) -> Result<(), WorkerError> {
        let mut stack = vec![root];
        let mut processed = 0usize;

        while let Some(file) = stack.pop() {
            if processed >= self.max_nodes {
                log_distributor_warn!(
                    "max outstanding node count reached, dropping remaining queue",
                    root_id = root_id,
                    max_nodes = self.max_nodes
                );
                break;
            }
            processed += 1;

            let children = self.distribute_one(root_id, file, expire_at).await?;
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        Ok(())
    }

    /// Process a single file node under its own distribution timeout.
    /// Returns the children collected so far even if the timeout fires
    /// partway through (spec §4.5: "children collected up to that point are
    /// still recursed into").
    async fn distribute_one(
        &mut self,
        root_id: &str,
        mut file: File,
        expire_at: DateTime<Utc>,
    ) -> Result<Vec<File>, WorkerError> {
        if file.depth > self.max_depth {
            log_distributor_debug!(
                "file exceeds max depth, skipping",
                root_id = root_id,
                depth = file.depth,
                max_depth = self.max_depth
            );
            return Ok(Vec::new());
        }

        let children_so_far: Arc<Mutex<Vec<File>>> = Arc::new(Mutex::new(Vec::new()));
        let acc = Arc::clone(&children_so_far);

        let outcome = tokio::time::timeout(
            self.distribution_timeout,
            self.process_node(root_id, &mut file, expire_at, acc),
        )
        .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_elapsed) => {
                log_distributor_warn!(
                    "distribution timed out, event for this node may be lost",
                    root_id = root_id,
                    uid = file.uid.as_str(),
                    depth = file.depth
                );
            }
        }

        let children = Arc::try_unwrap(children_so_far)
            .map(|m| m.into_inner().unwrap())
            .unwrap_or_default();
        Ok(children)
    }

    /// Steps 2-9 of spec §4.5 for one file node. Pushes children into `acc`
    /// as they're discovered so a mid-flight distribution timeout still sees
    /// partial progress.
    async fn process_node(
        &mut self,
        root_id: &str,
        file: &mut File,
        expire_at: DateTime<Utc>,
        acc: Arc<Mutex<Vec<File>>>,
    ) -> Result<(), WorkerError> {
        // Step 2: drain bytes.
        let data = self.coordinator.drain_bytes(&file.pointer).await?;

        // Step 3: populate mime/yara flavors.
        if let Some(mime) = self.classifier.mime(&data) {
            file.flavors.mime.insert(mime);
        }
        file.flavors.yara = self.classifier.yara(&data);

        // Step 4: union of flavors across namespaces.
        let flavors = file.flavors.union_all();

        // Step 5: assign + sort scanners.
        let assignments = self.assignment_engine.assign_all(
            self.scanners.iter(),
            &flavors,
            file.name.as_deref(),
            file.source.as_deref(),
        );

        // Step 6: build the file sub-record, anchoring the tree to root_id.
        let tree = TreeAnchor::for_file(root_id, file);
        let file_record = FileRecord {
            depth: file.depth,
            name: file.name.clone(),
            flavors,
            size: data.len(),
            source: file.source.clone(),
            scanners: assignments.iter().map(|a| a.name.clone()).collect(),
            tree,
        };

        // Step 7: run each assigned scanner, merging outputs and children.
        let mut scan: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        for assignment in &assignments {
            let plugin = match self.registry.get_or_create(&assignment.name) {
                Some(plugin) => plugin,
                None => {
                    // MissingScanner: soft failure, request continues.
                    continue;
                }
            };

            match plugin
                .scan_wrapper(&data, file, &assignment.options, expire_at)
                .await
            {
                Ok((mut child_files, output)) => {
                    // Scan-output merge on key collision: last writer (in
                    // priority order) wins — preserved per DESIGN.md Open
                    // Question resolution, not switched to first-wins.
                    scan.insert(assignment.name.clone(), output);
                    // Stamp parent/depth as soon as each child is collected,
                    // not after the loop: a distribution timeout cancels
                    // this future mid-loop, and partially-collected children
                    // must already carry correct depth/parent so the
                    // max_depth check and tree anchoring stay correct even
                    // when this node's own event is lost.
                    for child in child_files.iter_mut() {
                        child.parent = Some(file.uid.clone());
                        child.depth = file.depth + 1;
                    }
                    acc.lock().unwrap().append(&mut child_files);
                }
                Err(source) => {
                    log_distributor_warn!(
                        "scanner faulted, skipping",
                        root_id = root_id,
                        scanner = assignment.name.as_str(),
                        error = %source
                    );
                    // ScannerFault: soft failure, other scanners and
                    // children continue.
                }
            }
        }

        // Step 8: emit the event for this node.
        let event = crate::types::EventRecord { file: file_record, scan };
        let bytes = serde_json::to_vec(&event).expect("event records are always serializable");
        self.coordinator
            .emit(root_id, &bytes, expire_at.timestamp())
            .await?;

        Ok(())
    }
}
