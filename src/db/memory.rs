use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    db::Storage,
    error::AppResult,
    models::{Application, OpportunityAnalysis},
};

/// In-memory storage for tests and local development
///
/// Apps are keyed by their normalized keyword tag. Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    apps: RwLock<HashMap<String, Vec<Application>>>,
    analyses: RwLock<Vec<OpportunityAnalysis>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stands in for ingestion: tags `apps` with `keyword`
    ///
    /// Apps with an `app_store_id` already stored under the keyword are replaced.
    pub async fn insert_applications(&self, keyword: &str, apps: Vec<Application>) {
        let mut stored = self.apps.write().await;
        let tagged = stored.entry(keyword.to_string()).or_default();

        for app in apps {
            match tagged.iter_mut().find(|a| a.app_store_id == app.app_store_id) {
                Some(existing) => *existing = app,
                None => tagged.push(app),
            }
        }
    }

    pub async fn analysis_count(&self) -> usize {
        self.analyses.read().await.len()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStore {
    async fn load_applications(&self, keyword: &str) -> AppResult<Vec<Application>> {
        let mut apps = self
            .apps
            .read()
            .await
            .get(keyword)
            .cloned()
            .unwrap_or_default();

        apps.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        Ok(apps)
    }

    async fn delete_analyses(&self, keyword: &str) -> AppResult<u64> {
        let mut analyses = self.analyses.write().await;
        let before = analyses.len();
        analyses.retain(|a| a.keyword != keyword);
        Ok((before - analyses.len()) as u64)
    }

    async fn save_analysis(&self, record: &OpportunityAnalysis) -> AppResult<()> {
        self.analyses.write().await.push(record.clone());
        Ok(())
    }

    async fn list_analyses(&self, keyword: &str) -> AppResult<Vec<OpportunityAnalysis>> {
        Ok(self
            .analyses
            .read()
            .await
            .iter()
            .filter(|a| a.keyword == keyword)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Analysis, ApproachSummary};

    fn app(id: &str, rating: f64) -> Application {
        Application {
            app_store_id: id.to_string(),
            name: format!("App {}", id),
            description: String::new(),
            rating,
            embedding: vec![1.0],
            reviews: Vec::new(),
        }
    }

    fn record(keyword: &str) -> OpportunityAnalysis {
        let analysis = Analysis {
            summary: ApproachSummary {
                approach_name: "Minimalist".to_string(),
                apps_analyzed: 1,
                total_reviews: 0,
                strengths: "Simple".to_string(),
                core_limitation: "Bare".to_string(),
            },
            micro_niches: Vec::new(),
        };
        OpportunityAnalysis::new(keyword.to_string(), vec!["App 1".to_string()], analysis, 0)
    }

    #[tokio::test]
    async fn test_load_orders_by_rating_descending() {
        let store = MemoryStore::new();
        store
            .insert_applications("budget", vec![app("1", 3.9), app("2", 4.8), app("3", 4.1)])
            .await;

        let apps = store.load_applications("budget").await.unwrap();
        let ids: Vec<&str> = apps.iter().map(|a| a.app_store_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);

        assert!(store.load_applications("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_replaces_same_app() {
        let store = MemoryStore::new();
        store.insert_applications("budget", vec![app("1", 3.0)]).await;
        store.insert_applications("budget", vec![app("1", 4.5)]).await;

        let apps = store.load_applications("budget").await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].rating, 4.5);
    }

    #[tokio::test]
    async fn test_delete_is_keyword_scoped() {
        let store = MemoryStore::new();
        store.save_analysis(&record("budget")).await.unwrap();
        store.save_analysis(&record("budget")).await.unwrap();
        store.save_analysis(&record("habit tracker")).await.unwrap();

        assert_eq!(store.delete_analyses("budget").await.unwrap(), 2);
        assert_eq!(store.analysis_count().await, 1);
        assert_eq!(store.list_analyses("habit tracker").await.unwrap().len(), 1);
    }
}
