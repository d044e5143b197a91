use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::DroppedApplication;

/// Structured opportunity analysis for one cluster, as produced by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    #[serde(rename = "sub_category_summary")]
    pub summary: ApproachSummary,
    #[serde(default)]
    pub micro_niches: Vec<MicroNiche>,
}

/// What the cluster's shared approach is, and how it holds up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApproachSummary {
    pub approach_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub apps_analyzed: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_reviews: u32,
    #[serde(rename = "what_this_approach_does_well")]
    pub strengths: String,
    pub core_limitation: String,
}

/// Accepts integers, floats and numeric strings; anything else reads as 0
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0)
            .map(|f| f as u64),
        _ => None,
    };
    Ok(count.map_or(0, |c| u32::try_from(c).unwrap_or(u32::MAX)))
}

/// An underserved user segment within the cluster's approach
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MicroNiche {
    pub niche_name: String,
    pub target_user: String,
    pub core_problem: String,
    pub solution: String,
    pub why_this_is_different: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunity_score: Option<f64>,
}

/// Persisted analysis row, one per cluster per run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpportunityAnalysis {
    pub id: Uuid,
    /// Normalized (trimmed, lowercase)
    pub keyword: String,
    /// Names of the cluster's member apps
    pub apps: Vec<String>,
    pub analysis: Analysis,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

impl OpportunityAnalysis {
    pub fn new(keyword: String, apps: Vec<String>, analysis: Analysis, review_count: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            keyword,
            apps,
            analysis,
            review_count,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of one orchestrator run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub keyword: String,
    /// Number of clusters the valid apps were split into
    pub groups_analyzed: usize,
    pub analyses: Vec<OpportunityAnalysis>,
    /// Number of apps that passed the embedding filter
    pub total_apps: usize,
    /// Clusters whose analysis failed and were skipped
    pub failed_groups: usize,
    pub dropped_apps: Vec<DroppedApplication>,
}

/// Trim and lowercase a keyword for storage and lookups
pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("  Habit Tracker "), "habit tracker");
        assert_eq!(normalize_keyword("BUDGET"), "budget");
        assert_eq!(normalize_keyword("   "), "");
    }

    #[test]
    fn test_analysis_uses_model_field_names() {
        let json = r#"{
            "sub_category_summary": {
                "approach_name": "Minimalist streak trackers",
                "apps_analyzed": 2,
                "total_reviews": 150,
                "what_this_approach_does_well": "Fast daily check-ins",
                "core_limitation": "Streak anxiety"
            },
            "micro_niches": [
                {
                    "niche_name": "Streak-free tracking for shift workers",
                    "target_user": "Nurses on rotating shifts",
                    "core_problem": "Daily streaks break on night shifts",
                    "solution": "Rolling weekly targets",
                    "why_this_is_different": "No daily reset",
                    "opportunity_score": 8
                }
            ]
        }"#;

        let analysis: Analysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.summary.strengths, "Fast daily check-ins");
        assert_eq!(analysis.micro_niches.len(), 1);
        assert_eq!(analysis.micro_niches[0].opportunity_score, Some(8.0));
        assert_eq!(analysis.micro_niches[0].frequency, None);

        let value = serde_json::to_value(&analysis).unwrap();
        assert!(value.get("sub_category_summary").is_some());
        assert!(value["micro_niches"][0].get("frequency").is_none());
    }

    #[test]
    fn test_echoed_counts_are_lenient() {
        let json = r#"{
            "sub_category_summary": {
                "approach_name": "Gamified",
                "apps_analyzed": 3.0,
                "total_reviews": "120",
                "what_this_approach_does_well": "Fun",
                "core_limitation": "Grindy"
            }
        }"#;

        let analysis: Analysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.summary.apps_analyzed, 3);
        assert_eq!(analysis.summary.total_reviews, 120);

        let json = json.replace("3.0", "null").replace("\"120\"", "\"many\"");
        let analysis: Analysis = serde_json::from_str(&json).unwrap();
        assert_eq!(analysis.summary.apps_analyzed, 0);
        assert_eq!(analysis.summary.total_reviews, 0);
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let json = r#"{
            "sub_category_summary": {
                "approach_name": "Gamified",
                "core_limitation": "Grindy"
            }
        }"#;

        assert!(serde_json::from_str::<Analysis>(json).is_err());
    }
}
