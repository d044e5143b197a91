use serde::{Deserialize, Serialize};

/// A mobile application competing for a keyword, as delivered by ingestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub app_store_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rating: f64,
    /// Empty when ingestion produced no usable embedding
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Recency-ordered, newest first
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Application {
    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// A single user review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub score: i32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: String,
}

/// Review bucket used to prioritize feedback for the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewBand {
    /// 1-3 stars
    Critical,
    /// 4 stars
    Mixed,
    /// 5 stars
    Positive,
}

impl ReviewBand {
    /// Returns `None` for scores above 5.
    pub fn from_score(score: i32) -> Option<Self> {
        match score {
            s if s <= 3 => Some(ReviewBand::Critical),
            4 => Some(ReviewBand::Mixed),
            5 => Some(ReviewBand::Positive),
            _ => None,
        }
    }
}

/// Total number of reviews across a group of applications
pub fn total_reviews(apps: &[Application]) -> usize {
    apps.iter().map(Application::review_count).sum()
}

/// An application removed before clustering
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DroppedApplication {
    pub name: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_band_from_score() {
        assert_eq!(ReviewBand::from_score(1), Some(ReviewBand::Critical));
        assert_eq!(ReviewBand::from_score(3), Some(ReviewBand::Critical));
        assert_eq!(ReviewBand::from_score(4), Some(ReviewBand::Mixed));
        assert_eq!(ReviewBand::from_score(5), Some(ReviewBand::Positive));
        assert_eq!(ReviewBand::from_score(6), None);
    }

    #[test]
    fn test_application_deserialization_defaults() {
        let json = r#"{
            "app_store_id": "1234",
            "name": "Streaks",
            "rating": 4.8
        }"#;

        let app: Application = serde_json::from_str(json).unwrap();
        assert_eq!(app.name, "Streaks");
        assert!(app.description.is_empty());
        assert!(!app.has_embedding());
        assert_eq!(app.review_count(), 0);
    }

    #[test]
    fn test_total_reviews() {
        let review = Review {
            score: 5,
            text: "Great".to_string(),
            date: "2025-01-01".to_string(),
        };
        let app = Application {
            app_store_id: "1".to_string(),
            name: "A".to_string(),
            description: String::new(),
            rating: 4.0,
            embedding: vec![1.0],
            reviews: vec![review.clone(), review],
        };

        assert_eq!(total_reviews(&[app.clone(), app]), 4);
    }
}
