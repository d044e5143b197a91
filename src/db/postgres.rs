use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    db::{parse_embedding, Storage},
    error::AppResult,
    models::{Analysis, Application, OpportunityAnalysis, Review},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// PostgreSQL-backed storage for apps and analyses
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct AppRow {
    app_store_id: String,
    name: String,
    description: String,
    rating: f64,
    embedding: Option<String>,
    reviews: Json<Vec<Review>>,
}

impl From<AppRow> for Application {
    fn from(row: AppRow) -> Self {
        Application {
            embedding: parse_embedding(row.embedding.as_deref()),
            app_store_id: row.app_store_id,
            name: row.name,
            description: row.description,
            rating: row.rating,
            reviews: row.reviews.0,
        }
    }
}

#[derive(FromRow)]
struct AnalysisRow {
    id: Uuid,
    keyword: String,
    apps: Vec<String>,
    analysis: Json<Analysis>,
    review_count: i64,
    created_at: DateTime<Utc>,
}

impl From<AnalysisRow> for OpportunityAnalysis {
    fn from(row: AnalysisRow) -> Self {
        OpportunityAnalysis {
            id: row.id,
            keyword: row.keyword,
            apps: row.apps,
            analysis: row.analysis.0,
            review_count: row.review_count,
            created_at: row.created_at,
        }
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for PgStore {
    async fn load_applications(&self, keyword: &str) -> AppResult<Vec<Application>> {
        let rows: Vec<AppRow> = sqlx::query_as(
            r#"
            SELECT app_store_id,
                   name,
                   COALESCE(description, '') AS description,
                   COALESCE(rating, 0)::float8 AS rating,
                   embedding::text AS embedding,
                   reviews
            FROM apps
            WHERE keyword_tag = $1
            ORDER BY rating DESC NULLS LAST
            "#,
        )
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(keyword = %keyword, rows = rows.len(), "Loaded apps");

        Ok(rows.into_iter().map(Application::from).collect())
    }

    async fn delete_analyses(&self, keyword: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM market_analysis WHERE keyword = $1")
            .bind(keyword)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn save_analysis(&self, record: &OpportunityAnalysis) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO market_analysis (id, keyword, apps, analysis, review_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(&record.keyword)
        .bind(&record.apps)
        .bind(Json(&record.analysis))
        .bind(record.review_count)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_analyses(&self, keyword: &str) -> AppResult<Vec<OpportunityAnalysis>> {
        let rows: Vec<AnalysisRow> = sqlx::query_as(
            r#"
            SELECT id, keyword, apps, analysis, review_count, created_at
            FROM market_analysis
            WHERE keyword = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OpportunityAnalysis::from).collect())
    }
}
