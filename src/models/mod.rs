pub mod analysis;
pub mod application;

pub use analysis::{
    normalize_keyword, Analysis, AnalysisReport, ApproachSummary, MicroNiche, OpportunityAnalysis,
};
pub use application::{total_reviews, Application, DroppedApplication, Review, ReviewBand};
