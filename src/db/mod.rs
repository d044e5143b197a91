use crate::{
    error::AppResult,
    models::{Application, OpportunityAnalysis},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

/// Persistence boundary of the analysis pipeline
///
/// Implementations hand the pipeline fully typed applications: embeddings
/// are decoded to numeric vectors here, never in the clustering code.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Applications tagged with the normalized `keyword`, rating descending
    async fn load_applications(&self, keyword: &str) -> AppResult<Vec<Application>>;

    /// Removes every stored analysis for `keyword`, returning how many were deleted
    async fn delete_analyses(&self, keyword: &str) -> AppResult<u64>;

    async fn save_analysis(&self, record: &OpportunityAnalysis) -> AppResult<()>;

    /// Stored analyses for `keyword`, oldest first
    async fn list_analyses(&self, keyword: &str) -> AppResult<Vec<OpportunityAnalysis>>;
}

/// Decodes an embedding stored as text (`"[0.1, 0.2]"`, pgvector's text form)
///
/// Missing or malformed values decode to an empty vector.
pub fn parse_embedding(raw: Option<&str>) -> Vec<f32> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<f32>>(raw) {
        Ok(embedding) => embedding,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding malformed embedding");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embedding_text_form() {
        assert_eq!(parse_embedding(Some("[0.5, -1, 2.25]")), vec![0.5, -1.0, 2.25]);
        assert_eq!(parse_embedding(Some("[1,2]")), vec![1.0, 2.0]);
    }

    #[test]
    fn test_parse_embedding_missing_or_malformed() {
        assert!(parse_embedding(None).is_empty());
        assert!(parse_embedding(Some("  ")).is_empty());
        assert!(parse_embedding(Some("not a vector")).is_empty());
        assert!(parse_embedding(Some("{\"a\": 1}")).is_empty());
        assert!(parse_embedding(Some("[]")).is_empty());
    }
}
