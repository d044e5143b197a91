use crate::{models::Application, services::similarity::cosine_similarity};

/// Apps at or above this similarity to a cluster's seed join that cluster
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Number of apps included in the debug similarity table
const SIMILARITY_TABLE_LIMIT: usize = 5;

/// Groups apps that share a product approach
///
/// Greedy single pass: each unclustered app seeds a new cluster and claims
/// every later unclustered app whose similarity *to the seed* meets the
/// threshold. Members are not compared with each other, so the result depends
/// on input order.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityClusterer {
    threshold: f32,
}

impl Default for SimilarityClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl SimilarityClusterer {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn cluster(&self, apps: Vec<Application>) -> Vec<Vec<Application>> {
        if apps.is_empty() {
            return Vec::new();
        }

        // Too few apps for clustering to mean anything
        if apps.len() <= 2 {
            tracing::info!(apps = apps.len(), "Too few apps to cluster, analyzing together");
            let clusters = vec![apps];
            log_clusters(&clusters);
            return clusters;
        }

        let mut used = vec![false; apps.len()];
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for i in 0..apps.len() {
            if used[i] {
                continue;
            }

            used[i] = true;
            let mut group = vec![i];

            for j in (i + 1)..apps.len() {
                if used[j] {
                    continue;
                }

                if self.similarity(&apps[i], &apps[j]) >= self.threshold {
                    group.push(j);
                    used[j] = true;
                }
            }

            groups.push(group);
        }

        self.log_similarity_table(&apps);

        let mut slots: Vec<Option<Application>> = apps.into_iter().map(Some).collect();
        let clusters: Vec<Vec<Application>> = groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .filter_map(|idx| slots[idx].take())
                    .collect()
            })
            .collect();

        log_clusters(&clusters);
        clusters
    }

    /// Mismatched dimensions count as dissimilar
    fn similarity(&self, a: &Application, b: &Application) -> f32 {
        match cosine_similarity(&a.embedding, &b.embedding) {
            Ok(sim) => sim,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    left = %a.name,
                    right = %b.name,
                    "Skipping similarity comparison"
                );
                f32::NEG_INFINITY
            }
        }
    }

    fn log_similarity_table(&self, apps: &[Application]) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }

        let limit = apps.len().min(SIMILARITY_TABLE_LIMIT);
        for i in 0..limit {
            for j in (i + 1)..limit {
                tracing::debug!(
                    left = %apps[i].name,
                    right = %apps[j].name,
                    similarity = %format!("{:.3}", self.similarity(&apps[i], &apps[j])),
                    "Pairwise similarity"
                );
            }
        }
    }
}

fn log_clusters(clusters: &[Vec<Application>]) {
    tracing::info!(
        clusters = clusters.len(),
        sizes = ?clusters.iter().map(Vec::len).collect::<Vec<_>>(),
        "Found distinct sub-categories"
    );
    for (idx, cluster) in clusters.iter().enumerate() {
        tracing::info!(
            group = idx + 1,
            apps = ?cluster.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            "Cluster membership"
        );
    }
}
