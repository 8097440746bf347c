//! Market sentiment collaborator.
//!
//! The engine only needs one number per cycle: a score in [-1, 1]. Where it
//! comes from (news feed, external scoring service, a pinned value for dry
//! runs) is behind the `SentimentSource` trait.

use crate::domain::errors::SentimentError;
use async_trait::async_trait;

/// A fetched news item.
#[derive(Debug, Clone)]
pub struct NewsArticle {
    pub title: String,
    pub body: String,
}

const POSITIVE_TERMS: &[&str] = &[
    "rally", "surge", "gain", "bullish", "adoption", "record", "soar", "approval",
];
const NEGATIVE_TERMS: &[&str] = &[
    "crash", "plunge", "selloff", "bearish", "hack", "ban", "lawsuit", "fraud",
];

/// Naive lexicon score over a batch of articles, bounded to [-1, 1].
/// Empty input scores neutral.
pub fn score_articles(articles: &[NewsArticle]) -> f64 {
    if articles.is_empty() {
        return 0.0;
    }
    let mut positive = 0i32;
    let mut negative = 0i32;
    for article in articles {
        let text = format!("{} {}", article.title, article.body).to_lowercase();
        positive += POSITIVE_TERMS.iter().filter(|t| text.contains(*t)).count() as i32;
        negative += NEGATIVE_TERMS.iter().filter(|t| text.contains(*t)).count() as i32;
    }
    let total = positive + negative;
    if total == 0 {
        return 0.0;
    }
    (positive - negative) as f64 / total as f64
}

/// Source of the per-cycle sentiment score.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn latest_score(&self) -> Result<f64, SentimentError>;
}

/// Pinned sentiment score, for dry runs and tests.
pub struct FixedSentiment(pub f64);

#[async_trait]
impl SentimentSource for FixedSentiment {
    async fn latest_score(&self) -> Result<f64, SentimentError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn test_score_empty_is_neutral() {
        assert_eq!(score_articles(&[]), 0.0);
        assert_eq!(score_articles(&[article("bitcoin unchanged today")]), 0.0);
    }

    #[test]
    fn test_score_positive_batch() {
        let articles = vec![
            article("Bitcoin rally continues as adoption grows"),
            article("Markets surge on ETF approval"),
        ];
        let score = score_articles(&articles);
        assert!(score > 0.5);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_score_mixed_batch() {
        let articles = vec![
            article("Bitcoin rally stalls"),
            article("Exchange hack triggers selloff"),
        ];
        let score = score_articles(&articles);
        assert!(score < 0.0);
        assert!(score >= -1.0);
    }

    #[tokio::test]
    async fn test_fixed_sentiment() {
        let source = FixedSentiment(0.3);
        assert_eq!(source.latest_score().await.unwrap(), 0.3);
    }
}
