pub mod analyzer;
pub mod clusterer;
pub mod llm;
pub mod orchestrator;
pub mod review_corpus;
pub mod similarity;

pub use analyzer::OpportunityAnalyzer;
pub use clusterer::SimilarityClusterer;
pub use orchestrator::AnalysisOrchestrator;
