use std::sync::Arc;
use std::time::Instant;

use crate::{
    db::Storage,
    error::{AppError, AppResult},
    models::{
        normalize_keyword, total_reviews, AnalysisReport, Application, DroppedApplication,
        OpportunityAnalysis,
    },
    services::{analyzer::OpportunityAnalyzer, clusterer::SimilarityClusterer},
};

/// Runs the full analysis pass for a keyword
///
/// Stages run strictly in order: clear old results, load apps, filter by
/// embedding, cluster, then analyze and persist one cluster at a time.
/// Stored rows therefore follow cluster order.
pub struct AnalysisOrchestrator {
    storage: Arc<dyn Storage>,
    analyzer: OpportunityAnalyzer,
    clusterer: SimilarityClusterer,
}

impl AnalysisOrchestrator {
    pub fn new(
        storage: Arc<dyn Storage>,
        analyzer: OpportunityAnalyzer,
        clusterer: SimilarityClusterer,
    ) -> Self {
        Self {
            storage,
            analyzer,
            clusterer,
        }
    }

    /// Replaces all stored analyses for `keyword` with a fresh run
    ///
    /// Fails only when no apps are tagged with the keyword or none of them
    /// carries an embedding. Clusters whose analysis fails are skipped and
    /// counted in [`AnalysisReport::failed_groups`].
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, keyword: &str) -> AppResult<AnalysisReport> {
        let start = Instant::now();
        let keyword = normalize_keyword(keyword);

        if keyword.is_empty() {
            return Err(AppError::InvalidInput("Keyword is required".to_string()));
        }

        tracing::info!(keyword = %keyword, "Starting analysis");

        match self.storage.delete_analyses(&keyword).await {
            Ok(deleted) => tracing::info!(deleted, "Cleared previous analyses"),
            Err(e) => tracing::error!(error = %e, "Failed to clear previous analyses"),
        }

        let apps = self.storage.load_applications(&keyword).await?;
        if apps.is_empty() {
            return Err(AppError::NoApplicationsFound(keyword));
        }

        tracing::info!(loaded = apps.len(), "Loaded apps");

        let (valid_apps, dropped_apps) = filter_embedded(apps);
        if valid_apps.is_empty() {
            return Err(AppError::NoEmbeddingsAvailable(keyword));
        }

        let total_apps = valid_apps.len();
        tracing::info!(
            ready = total_apps,
            dropped = dropped_apps.len(),
            "Apps ready for analysis"
        );

        let clusters = self.clusterer.cluster(valid_apps);
        let groups_analyzed = clusters.len();

        let mut analyses = Vec::new();
        let mut failed_groups = 0;

        for (index, cluster) in clusters.iter().enumerate() {
            let Some(analysis) = self.analyzer.analyze(cluster, &keyword, index).await else {
                failed_groups += 1;
                tracing::warn!(group = index + 1, "Cluster produced no analysis, skipping");
                continue;
            };

            let record = OpportunityAnalysis::new(
                keyword.clone(),
                cluster.iter().map(|a| a.name.clone()).collect(),
                analysis,
                total_reviews(cluster) as i64,
            );

            if let Err(e) = self.storage.save_analysis(&record).await {
                tracing::error!(error = %e, group = index + 1, "Failed to persist analysis");
            } else {
                tracing::info!(
                    group = index + 1,
                    micro_niches = record.analysis.micro_niches.len(),
                    "Analysis saved"
                );
            }

            analyses.push(record);
        }

        if analyses.is_empty() {
            tracing::warn!(groups = groups_analyzed, "No cluster produced an analysis");
        }

        tracing::info!(
            groups = groups_analyzed,
            succeeded = analyses.len(),
            failed = failed_groups,
            processing_time_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            keyword,
            groups_analyzed,
            analyses,
            total_apps,
            failed_groups,
            dropped_apps,
        })
    }
}

/// Keeps apps with a usable embedding
///
/// The first embedded app (the highest rated) fixes the expected
/// dimensionality; anything else is dropped with a reason.
fn filter_embedded(apps: Vec<Application>) -> (Vec<Application>, Vec<DroppedApplication>) {
    let mut valid: Vec<Application> = Vec::new();
    let mut dropped = Vec::new();
    let mut dimension: Option<usize> = None;

    for app in apps {
        if !app.has_embedding() {
            dropped.push(DroppedApplication {
                name: app.name,
                reason: "missing embedding".to_string(),
            });
            continue;
        }

        let expected = *dimension.get_or_insert(app.embedding.len());
        if app.embedding.len() != expected {
            dropped.push(DroppedApplication {
                reason: format!(
                    "dimension mismatch: expected {}, got {}",
                    expected,
                    app.embedding.len()
                ),
                name: app.name,
            });
            continue;
        }

        valid.push(app);
    }

    for app in &dropped {
        tracing::warn!(app = %app.name, reason = %app.reason, "Dropping app before clustering");
    }

    (valid, dropped)
}
