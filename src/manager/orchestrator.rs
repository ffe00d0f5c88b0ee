//! The scan orchestrator.

use crate::audit;
use crate::backends::{ClamAvScanner, YaraScanner};
use crate::config::ScanHookConfig;
use crate::core::hasher::verify_content;
use crate::core::{
    ArcScanner, ArtifactEvent, EngineKind, Integrity, RepositoryError, ScanError, ScanReason,
    Scanner,
};
use crate::manager::annotation::build_comment;
use crate::manager::stage::ScanStage;
use crate::manager::summary::ScanSummary;
use crate::repository::{ArcRepository, SampleRepository};
use crate::sandbox::Sandbox;
use crate::tags::reconcile;

use std::path::Path;
use std::sync::Arc;

/// Default size ceiling: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Artifacts larger than this are skipped without a content fetch.
    pub max_file_size: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl OrchestratorConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size ceiling.
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }
}

/// Builder for creating a `ScanOrchestrator`.
pub struct ScanOrchestratorBuilder {
    repository: Option<ArcRepository>,
    sandbox: Option<Sandbox>,
    scanners: Vec<ArcScanner>,
    config: OrchestratorConfig,
}

impl ScanOrchestratorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            repository: None,
            sandbox: None,
            scanners: Vec::new(),
            config: OrchestratorConfig::default(),
        }
    }

    /// Sets the repository client.
    pub fn with_repository<R: SampleRepository + 'static>(mut self, repository: R) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Sets a shared repository client.
    pub fn with_arc_repository(mut self, repository: ArcRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Sets the sandbox used for staging.
    pub fn with_sandbox(mut self, sandbox: Sandbox) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Adds an engine driver. Drivers run in the order they are added.
    pub fn add_scanner<S: Scanner + 'static>(mut self, scanner: S) -> Self {
        self.scanners.push(Arc::new(scanner));
        self
    }

    /// Adds an engine driver wrapped in an Arc.
    pub fn add_arc_scanner(mut self, scanner: ArcScanner) -> Self {
        self.scanners.push(scanner);
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Result<ScanOrchestrator, ScanError> {
        let repository = self
            .repository
            .ok_or_else(|| ScanError::configuration("a sample repository is required"))?;
        let sandbox = self
            .sandbox
            .ok_or_else(|| ScanError::configuration("a sandbox directory is required"))?;

        let mut seen: Vec<EngineKind> = Vec::with_capacity(self.scanners.len());
        for scanner in &self.scanners {
            let engine = scanner.engine();
            if seen.contains(&engine) {
                return Err(ScanError::configuration(format!(
                    "engine '{}' registered more than once",
                    engine.as_str()
                )));
            }
            seen.push(engine);
        }

        if self.scanners.is_empty() {
            tracing::warn!("No scan engines enabled; artifacts will not be annotated");
        }

        Ok(ScanOrchestrator {
            repository,
            sandbox,
            scanners: self.scanners,
            config: self.config,
        })
    }
}

impl Default for ScanOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives one artifact through fetch, staging, scanning and publishing.
///
/// One orchestrator serves every event; runs for different artifacts may
/// proceed concurrently.
///
/// # Example
///
/// ```rust,ignore
/// use scanhook::config::ScanHookConfig;
/// use scanhook::manager::ScanOrchestrator;
///
/// let config = ScanHookConfig::from_env()?;
/// let orchestrator = ScanOrchestrator::from_config(&config)?;
///
/// let summary = orchestrator.on_artifact_created("abc123").await;
/// println!("{} -> {}", summary.artifact_id, summary.stage);
/// ```
pub struct ScanOrchestrator {
    repository: ArcRepository,
    sandbox: Sandbox,
    scanners: Vec<ArcScanner>,
    config: OrchestratorConfig,
}

impl ScanOrchestrator {
    /// Creates a new builder.
    pub fn builder() -> ScanOrchestratorBuilder {
        ScanOrchestratorBuilder::new()
    }

    /// Builds an orchestrator backed by the MWDB client described in `config`.
    #[cfg(feature = "mwdb")]
    pub fn from_config(config: &ScanHookConfig) -> Result<Self, ScanError> {
        let client = crate::repository::MwdbClient::new(config.repository_config()?)?;
        Self::from_config_with_repository(config, Arc::new(client))
    }

    /// Builds an orchestrator with the engines and sandbox described in
    /// `config` and the given repository.
    pub fn from_config_with_repository(
        config: &ScanHookConfig,
        repository: ArcRepository,
    ) -> Result<Self, ScanError> {
        let sandbox = Sandbox::new(&config.sandbox_dir)?;
        let mut builder = Self::builder()
            .with_arc_repository(repository)
            .with_config(OrchestratorConfig::new().with_max_file_size(config.max_file_size));

        for engine in config.enabled_engines() {
            let guard = sandbox.guard().clone();
            builder = match engine {
                EngineKind::ClamAv => builder.add_scanner(ClamAvScanner::new(config.clamav_config(), guard)),
                EngineKind::Yara => builder.add_scanner(YaraScanner::new(config.yara_config(), guard)),
            };
        }

        builder.with_sandbox(sandbox).build()
    }

    /// Handles an "artifact created" event.
    pub async fn on_artifact_created(&self, artifact_id: &str) -> ScanSummary {
        self.process(artifact_id, ScanReason::Created).await
    }

    /// Handles an "artifact re-uploaded" event.
    pub async fn on_artifact_reuploaded(&self, artifact_id: &str) -> ScanSummary {
        self.process(artifact_id, ScanReason::Reuploaded).await
    }

    /// Handles an inbound event.
    pub async fn handle_event(&self, event: &ArtifactEvent) -> ScanSummary {
        self.process(&event.artifact_id, event.reason).await
    }

    /// Processes one artifact to completion.
    ///
    /// Never fails: every error ends the run in `Aborted` and is recorded
    /// in the summary. The staged file is removed before this returns.
    pub async fn process(&self, artifact_id: &str, reason: ScanReason) -> ScanSummary {
        let mut summary = ScanSummary::begin(artifact_id, reason);

        tracing::info!(
            run_id = %summary.run_id,
            artifact_id = %artifact_id,
            reason = %reason,
            engines = self.scanners.len(),
            "Processing artifact"
        );
        audit::emit_scan_started(summary.run_id, artifact_id, reason);

        match self.run(&mut summary).await {
            Ok(()) => {
                summary.finish(None);
                tracing::info!(
                    run_id = %summary.run_id,
                    artifact_id = %artifact_id,
                    detected = summary.has_detection(),
                    tags_added = summary.tags_added.len(),
                    tags_removed = summary.tags_removed.len(),
                    "Artifact processed"
                );
            }
            Err(e) if e.is_skip() => {
                tracing::warn!(
                    run_id = %summary.run_id,
                    artifact_id = %artifact_id,
                    reason = %e,
                    "Skipping artifact"
                );
                audit::emit_scan_skipped(summary.run_id, artifact_id, &e);
                summary.finish(Some(e));
            }
            Err(e) => {
                tracing::error!(
                    run_id = %summary.run_id,
                    artifact_id = %artifact_id,
                    stage = %summary.last_stage,
                    error = %e,
                    "Artifact processing aborted"
                );
                summary.finish(Some(e));
            }
        }

        audit::emit_scan_finished(&summary);
        summary
    }

    async fn run(&self, summary: &mut ScanSummary) -> Result<(), ScanError> {
        let id = summary.artifact_id.clone();

        let metadata = self
            .repository
            .fetch_metadata(&id)
            .await
            .map_err(|e| ScanError::fetch(&id, e))?;
        summary.advance(ScanStage::MetadataFetched);

        self.check_size(metadata.size)?;
        summary.advance(ScanStage::SizeChecked);

        let content = self
            .repository
            .fetch_content(&id, self.config.max_file_size)
            .await
            .map_err(|e| ScanError::fetch(&id, e))?;
        // The repository may not honor the limit.
        self.check_size(content.len() as u64)?;

        match verify_content(&id, &content) {
            Integrity::Mismatch { actual } => {
                return Err(ScanError::fetch(
                    &id,
                    RepositoryError::Rejected {
                        reason: format!("content digest {} does not match identifier", actual),
                    },
                ));
            }
            Integrity::Verified => tracing::debug!(artifact_id = %id, "Content digest verified"),
            Integrity::Unchecked => {}
        }

        let staged = self.sandbox.stage_bytes(&id, &content).await?;
        drop(content);
        summary.advance(ScanStage::Staged);

        let published = self.scan_and_publish(staged.path(), summary).await;
        staged.unstage();
        published?;

        summary.advance(ScanStage::CleanedUp);
        Ok(())
    }

    fn check_size(&self, size: u64) -> Result<(), ScanError> {
        if size > self.config.max_file_size {
            return Err(ScanError::SizeLimitExceeded {
                size,
                max: self.config.max_file_size,
            });
        }
        Ok(())
    }

    async fn scan_and_publish(&self, path: &Path, summary: &mut ScanSummary) -> Result<(), ScanError> {
        let id = summary.artifact_id.clone();

        for scanner in &self.scanners {
            let result = scanner.scan(path).await;
            audit::emit_engine_result(summary.run_id, &id, &result);
            summary.results.push(result);
        }
        summary.advance(ScanStage::Scanned);

        if let Some(comment) = build_comment(&summary.results) {
            self.repository
                .add_comment(&id, &comment)
                .await
                .map_err(|e| ScanError::publish(&id, e))?;
            summary.comment = Some(comment);
        }

        if !summary.results.is_empty() {
            let mut tags = self
                .repository
                .list_tags(&id)
                .await
                .map_err(|e| ScanError::publish(&id, e))?;

            for result in &summary.results {
                let delta = reconcile(&tags, result.engine, result.verdicts());

                for tag in &delta.to_remove {
                    self.repository
                        .remove_tag(&id, tag)
                        .await
                        .map_err(|e| ScanError::publish(&id, e))?;
                    summary.tags_removed.push(tag.clone());
                }
                for tag in &delta.to_add {
                    self.repository
                        .add_tag(&id, tag)
                        .await
                        .map_err(|e| ScanError::publish(&id, e))?;
                    summary.tags_added.push(tag.clone());
                }

                delta.apply_to(&mut tags);
            }
        }

        summary.advance(ScanStage::Annotated);
        Ok(())
    }

    /// Returns the number of enabled engines.
    pub fn scanner_count(&self) -> usize {
        self.scanners.len()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Returns the sandbox.
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }
}

impl std::fmt::Debug for ScanOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanOrchestrator")
            .field("repository", &self.repository)
            .field("sandbox", &self.sandbox.root())
            .field("scanner_count", &self.scanners.len())
            .field("config", &self.config)
            .finish()
    }
}
