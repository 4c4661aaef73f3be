//! Per-file migration pipeline.
//!
//! Files are processed strictly in order. Each file's facts are extracted and
//! submitted one by one before the next file is read, so totals are
//! deterministic and an interrupted run leaves no half-written file behind.

use serde::Serialize;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::extract::{synthesize, FactExtractor};
use crate::gateway::{GatewayHealth, MemoryGateway};
use crate::types::{CandidateFact, CandidateMemory, FileDescriptor, FileType, MotivationDelta, Shard};

/// Context `source` attached to migrated memories.
pub const MIGRATION_SOURCE: &str = "migration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Migrated,
    /// Extracted only; nothing was submitted.
    DryRun,
    /// Too little content to extract from.
    Skipped,
    /// The file could not be read.
    Failed,
}

/// Outcome of migrating one file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub relative_path: String,
    pub file_type: FileType,
    pub status: FileStatus,
    pub facts: Vec<CandidateFact>,
    /// Newly stored by the gateway.
    pub encoded: usize,
    /// Rejected by the gateway as near-duplicates.
    pub deduplicated: usize,
    pub errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    fn new(file: &FileDescriptor, status: FileStatus) -> Self {
        Self {
            relative_path: file.relative_path.clone(),
            file_type: file.file_type,
            status,
            facts: Vec::new(),
            encoded: 0,
            deduplicated: 0,
            errors: 0,
            error: None,
        }
    }

    pub fn found(&self) -> usize {
        self.facts.len()
    }
}

/// Running totals over a migration run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub dry_run: bool,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub facts_found: usize,
    pub encoded: usize,
    pub deduplicated: usize,
    pub errors: usize,
    pub files: Vec<FileReport>,
}

impl MigrationReport {
    pub fn record(&mut self, file: FileReport) {
        match file.status {
            FileStatus::Skipped => self.files_skipped += 1,
            _ => self.files_processed += 1,
        }
        self.facts_found += file.found();
        self.encoded += file.encoded;
        self.deduplicated += file.deduplicated;
        self.errors += file.errors;
        self.files.push(file);
    }
}

/// Runs files through extraction, synthesis and submission.
pub struct Migrator {
    gateway: Arc<dyn MemoryGateway>,
    extractor: Arc<dyn FactExtractor>,
    config: ExtractionConfig,
    dry_run: bool,
}

impl Migrator {
    pub fn new(
        gateway: Arc<dyn MemoryGateway>,
        extractor: Arc<dyn FactExtractor>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            gateway,
            extractor,
            config,
            dry_run: false,
        }
    }

    /// Extract without submitting anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    pub async fn check_gateway(&self) -> Result<GatewayHealth> {
        self.gateway.health().await
    }

    fn memory_for(&self, file: &FileDescriptor, fact: &CandidateFact) -> CandidateMemory {
        CandidateMemory {
            event: fact.trigger.clone(),
            content: fact.content.clone(),
            shard: fact.shard.unwrap_or(Shard::Semantic),
            context: json!({
                "source": MIGRATION_SOURCE,
                "file": file.relative_path,
                "fileType": file.file_type,
                "tags": [MIGRATION_SOURCE, file.file_type.as_str()],
            }),
            motivation_delta: MotivationDelta::default(),
            dedup_threshold: self.config.migration_dedup_threshold,
        }
    }

    /// Migrate one file. Never fails; problems are counted in the report.
    pub async fn migrate_file(&self, file: &FileDescriptor) -> FileReport {
        let text = match fs::read_to_string(&file.path) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %file.relative_path, "Failed to read file: {}", e);
                let mut report = FileReport::new(file, FileStatus::Failed);
                report.errors = 1;
                report.error = Some(e.to_string());
                return report;
            }
        };

        if text.trim().chars().count() < self.config.min_file_chars {
            debug!(file = %file.relative_path, "Skipping near-empty file");
            return FileReport::new(file, FileStatus::Skipped);
        }

        let status = if self.dry_run {
            FileStatus::DryRun
        } else {
            FileStatus::Migrated
        };
        let mut report = FileReport::new(file, status);
        report.facts = self
            .extractor
            .extract(&text, &file.relative_path, Some(file.shard_hint))
            .await;
        report.facts.extend(synthesize(&text, file.file_type));

        if self.dry_run {
            return report;
        }

        for fact in &report.facts {
            match self.gateway.encode(&self.memory_for(file, fact)).await {
                Ok(resp) if !resp.ok => report.errors += 1,
                Ok(resp) if resp.deduplicated => report.deduplicated += 1,
                Ok(_) => report.encoded += 1,
                Err(e) => {
                    warn!(file = %file.relative_path, trigger = %fact.trigger, "Encode failed: {}", e);
                    report.errors += 1;
                }
            }
        }

        debug!(
            file = %file.relative_path,
            found = report.found(),
            encoded = report.encoded,
            deduplicated = report.deduplicated,
            errors = report.errors,
            "File migrated"
        );
        report
    }

    /// Migrate files in order, calling `on_file` after each one.
    ///
    /// Unless this is a dry run, an unhealthy gateway aborts before any file
    /// is read.
    pub async fn run_with<F>(&self, files: &[FileDescriptor], mut on_file: F) -> Result<MigrationReport>
    where
        F: FnMut(&FileReport),
    {
        if !self.dry_run {
            let health = self.check_gateway().await?;
            info!(status = %health.status, memories = health.total_memories, "Gateway reachable");
        }

        let mut report = MigrationReport {
            dry_run: self.dry_run,
            ..Default::default()
        };
        for file in files {
            let file_report = self.migrate_file(file).await;
            on_file(&file_report);
            report.record(file_report);
        }

        info!(
            files = report.files_processed,
            found = report.facts_found,
            encoded = report.encoded,
            deduplicated = report.deduplicated,
            errors = report.errors,
            "Migration finished"
        );
        Ok(report)
    }

    pub async fn run(&self, files: &[FileDescriptor]) -> Result<MigrationReport> {
        self.run_with(files, |_| {}).await
    }
}
