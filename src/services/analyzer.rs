use std::sync::Arc;

use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{total_reviews, Analysis, Application, MicroNiche},
    services::{
        llm::{GenerationOptions, LanguageModel},
        review_corpus,
    },
};

/// Description characters shown per app in the prompt
const DESCRIPTION_PREVIEW_CHARS: usize = 150;

/// Turns one cluster of apps into a structured opportunity analysis
#[derive(Clone)]
pub struct OpportunityAnalyzer {
    model: Arc<dyn LanguageModel>,
}

impl OpportunityAnalyzer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Analyzes a cluster with a single model call
    ///
    /// Returns `None` when the model call fails or its output cannot be
    /// turned into a valid [`Analysis`]. The failure is logged; callers move
    /// on to the next cluster.
    #[tracing::instrument(skip_all, fields(group = %group_label(cluster, cluster_index), keyword = %keyword))]
    pub async fn analyze(
        &self,
        cluster: &[Application],
        keyword: &str,
        cluster_index: usize,
    ) -> Option<Analysis> {
        let review_count = total_reviews(cluster);

        tracing::info!(
            apps = ?cluster.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            reviews = review_count,
            "Analyzing cluster"
        );

        let prompt = build_prompt(cluster, keyword);

        let raw = match self
            .model
            .generate_structured(&prompt, GenerationOptions::deterministic_json())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, provider = self.model.name(), "Analysis failed");
                return None;
            }
        };

        match parse_analysis(&raw, cluster.len(), review_count) {
            Ok(analysis) => {
                tracing::info!(
                    micro_niches = analysis.micro_niches.len(),
                    approach = %analysis.summary.approach_name,
                    "Analysis completed"
                );
                Some(analysis)
            }
            Err(e) => {
                tracing::error!(error = %e, response_chars = raw.len(), "Analysis failed");
                None
            }
        }
    }
}

fn group_label(cluster: &[Application], cluster_index: usize) -> String {
    if cluster.len() > 1 {
        format!("Group {}", cluster_index + 1)
    } else {
        "All Apps".to_string()
    }
}

/// Builds the instruction prompt for one cluster
pub fn build_prompt(cluster: &[Application], keyword: &str) -> String {
    let review_count = total_reviews(cluster);
    let app_summary = cluster
        .iter()
        .map(|app| format!("{}: {}", app.name, preview(&app.description)))
        .collect::<Vec<_>>()
        .join("\n");
    let corpus = review_corpus::format_cluster(cluster);
    let app_count = cluster.len();

    format!(
        r#"You are analyzing a SUB-CATEGORY of apps within the "{keyword}" market.

These {app_count} apps were grouped together because they share a SIMILAR APPROACH (for example, all gamified, or all minimalist).

APPS IN THIS SUB-CATEGORY:
{app_summary}

TOTAL REVIEWS: {review_count} recent reviews

{corpus}

TASK: Find SPECIFIC micro-niche opportunities that apps taking THIS approach are missing.

Because these apps share an approach, identify:

1. **What this approach does well** (what users consistently love)
2. **The core limitation of this approach** (what users keep complaining about)
3. **Which user types struggle with this approach** (e.g. "ADHD users struggle with streak-based gamification")
4. **Which variant of this approach would serve them** (targeted changes, not complete redesigns)

For each micro-niche:
- Target users who WANT this type of app but find it frustrating
- Propose a concrete VARIANT of this approach that fixes their problem

Respond with a single JSON object of this shape:
{{
  "sub_category_summary": {{
    "approach_name": "The shared approach (e.g. 'Gamified with social features' or 'Minimalist streak trackers')",
    "apps_analyzed": {app_count},
    "total_reviews": {review_count},
    "what_this_approach_does_well": "What users consistently praise",
    "core_limitation": "The main weakness of this approach"
  }},
  "micro_niches": [
    {{
      "niche_name": "Very specific (e.g. 'Gamified habit tracking WITHOUT streak anxiety')",
      "target_user": "Who wants this approach but is frustrated by it?",
      "core_problem": "What about THIS approach frustrates them?",
      "solution": "The product variant that addresses it",
      "why_this_is_different": "How this differs from the existing apps in this group"
    }}
  ]
}}"#
    )
}

/// First `DESCRIPTION_PREVIEW_CHARS` characters of a description
fn preview(description: &str) -> &str {
    match description.char_indices().nth(DESCRIPTION_PREVIEW_CHARS) {
        Some((idx, _)) => &description[..idx],
        None => description,
    }
}

/// Parses and normalizes a raw model response
///
/// The model occasionally wraps its object in an array; a non-empty array is
/// unwrapped to its first element. Summary counts are overwritten with the
/// real cluster numbers. Malformed micro-niches are dropped one by one; only
/// a missing or malformed summary rejects the response.
pub fn parse_analysis(raw: &str, apps_analyzed: usize, review_count: usize) -> AppResult<Analysis> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| AppError::InvalidResponse(format!("not valid JSON: {}", e)))?;

    let mut object = match value {
        Value::Object(_) => value,
        Value::Array(items) => items.into_iter().next().ok_or_else(|| {
            AppError::InvalidResponse("response was an empty array".to_string())
        })?,
        other => {
            return Err(AppError::InvalidResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let niches = match &mut object {
        Value::Object(map) => map.remove("micro_niches"),
        _ => None,
    };

    let mut analysis: Analysis = serde_json::from_value(object)
        .map_err(|e| AppError::InvalidResponse(format!("unexpected structure: {}", e)))?;
    analysis.micro_niches = parse_micro_niches(niches);

    normalize(&mut analysis, apps_analyzed, review_count)?;
    Ok(analysis)
}

fn parse_micro_niches(value: Option<Value>) -> Vec<MicroNiche> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!(
                kind = json_kind(&other),
                "Ignoring micro_niches that is not an array"
            );
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<MicroNiche>(item) {
            Ok(niche) => Some(niche),
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "Discarded malformed micro-niche");
                None
            }
        })
        .collect()
}

fn normalize(analysis: &mut Analysis, apps_analyzed: usize, review_count: usize) -> AppResult<()> {
    let summary = &mut analysis.summary;
    trim_in_place(&mut summary.approach_name);
    trim_in_place(&mut summary.strengths);
    trim_in_place(&mut summary.core_limitation);

    if summary.approach_name.is_empty() {
        return Err(AppError::InvalidResponse(
            "approach_name is blank".to_string(),
        ));
    }

    summary.apps_analyzed = apps_analyzed as u32;
    summary.total_reviews = review_count as u32;

    for niche in analysis.micro_niches.iter_mut() {
        trim_in_place(&mut niche.niche_name);
        trim_in_place(&mut niche.target_user);
        trim_in_place(&mut niche.core_problem);
        trim_in_place(&mut niche.solution);
        trim_in_place(&mut niche.why_this_is_different);
    }

    let before = analysis.micro_niches.len();
    analysis.micro_niches.retain(|n| !n.niche_name.is_empty());
    if analysis.micro_niches.len() < before {
        tracing::warn!(
            discarded = before - analysis.micro_niches.len(),
            "Discarded micro-niches without a name"
        );
    }

    Ok(())
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
