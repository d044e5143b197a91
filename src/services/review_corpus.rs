use std::fmt::Write;

use crate::models::{Application, Review, ReviewBand};

/// Maximum 4-star reviews rendered per app
pub const MAX_MIXED_REVIEWS: usize = 30;
/// Maximum 5-star reviews rendered per app
pub const MAX_POSITIVE_REVIEWS: usize = 20;

/// Renders an app's reviews as a prompt excerpt, most informative first
///
/// Critical reviews (1-3 stars) are always rendered in full. Mixed and
/// positive reviews are sampled from the front of the list, which ingestion
/// delivers newest first.
pub fn format(app: &Application) -> String {
    let mut critical: Vec<&Review> = Vec::new();
    let mut mixed: Vec<&Review> = Vec::new();
    let mut positive: Vec<&Review> = Vec::new();

    for review in &app.reviews {
        match ReviewBand::from_score(review.score) {
            Some(ReviewBand::Critical) => critical.push(review),
            Some(ReviewBand::Mixed) => mixed.push(review),
            Some(ReviewBand::Positive) => positive.push(review),
            None => {}
        }
    }

    let mut output = String::new();
    let _ = writeln!(
        output,
        "\n=== {} ({}★ avg, {} reviews) ===",
        app.name,
        app.rating,
        app.reviews.len()
    );

    if !critical.is_empty() {
        let _ = writeln!(
            output,
            "\n[NEGATIVE/CRITICAL (1-3★)] - {} reviews:",
            critical.len()
        );
        write_reviews(&mut output, &critical, critical.len());
    }

    if !mixed.is_empty() {
        let _ = writeln!(output, "\n[MIXED FEEDBACK (4★)] - {} reviews:", mixed.len());
        write_reviews(&mut output, &mixed, MAX_MIXED_REVIEWS);
    }

    if !positive.is_empty() {
        let _ = writeln!(
            output,
            "\n[POSITIVE (5★)] - Sample of {} reviews:",
            positive.len()
        );
        write_reviews(&mut output, &positive, MAX_POSITIVE_REVIEWS);
    }

    output
}

/// Concatenates the excerpts of every app in a cluster, in cluster order
pub fn format_cluster(apps: &[Application]) -> String {
    apps.iter().map(format).collect()
}

fn write_reviews(output: &mut String, reviews: &[&Review], limit: usize) {
    for review in reviews.iter().take(limit) {
        let _ = writeln!(output, "[{}★] {}\n", review.score, review.text);
    }
}
