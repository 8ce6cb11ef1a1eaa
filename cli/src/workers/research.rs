// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Research swarm stand-ins: trend fetching and niche analysis.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use chimera_core::domain::task::{Task, TaskType};
use chimera_core::domain::worker::{Worker, WorkerError, WorkerIdentity};

use super::stable_hash;

const TREND_SOURCES: [&str; 4] = [
    "google_trends_api",
    "twitter_trends_api",
    "reddit_hot_topics",
    "youtube_trending",
];

/// Used when the task carries no keywords.
const BASE_KEYWORDS: [&str; 10] = [
    "AI",
    "Machine Learning",
    "Python",
    "Web Development",
    "Cloud Computing",
    "Data Science",
    "Cybersecurity",
    "Blockchain",
    "IoT",
    "DevOps",
];

const MAX_TRENDS: usize = 5;

pub struct TrendFetcher {
    identity: WorkerIdentity,
}

impl TrendFetcher {
    pub fn new(identity: WorkerIdentity) -> Self {
        Self { identity }
    }

    fn trend(keyword: &str, timeframe: &str) -> Value {
        let hash = stable_hash(keyword);
        let volume = 1000 + hash % 9001;
        let sentiment = ((hash >> 16) % 201) as f64 / 100.0 - 1.0;
        let strength = if volume > 5000 && sentiment > 0.3 {
            "rising"
        } else {
            "stable"
        };

        json!({
            "keyword": keyword,
            "volume": volume,
            "sentiment_score": (sentiment * 100.0).round() / 100.0,
            "trend_strength": strength,
            "source": TREND_SOURCES[(hash >> 32) as usize % TREND_SOURCES.len()],
            "timestamp": Utc::now().to_rfc3339(),
            "timeframe": timeframe,
        })
    }
}

#[async_trait]
impl Worker for TrendFetcher {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![TaskType::AnalyzeTrends]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        let timeframe = task.get_str("timeframe").unwrap_or("7d");
        let mut keywords = task.get_strings("keywords");
        if keywords.is_empty() {
            keywords = BASE_KEYWORDS.iter().map(|k| k.to_string()).collect();
        }
        info!(
            topic = task.get_str("topic").unwrap_or_default(),
            timeframe, "Fetching trends"
        );

        let trends: Vec<Value> = keywords
            .iter()
            .take(MAX_TRENDS)
            .map(|keyword| Self::trend(keyword, timeframe))
            .collect();

        Ok(json!({
            "total_trends": trends.len(),
            "fetched_trends": trends,
            "timeframe": timeframe,
            "sources_used": TREND_SOURCES,
            "analysis_completed": true,
        }))
    }
}

const NICHE_CATEGORIES: [&str; 8] = [
    "tech_reviews",
    "educational_content",
    "gaming",
    "finance",
    "health_fitness",
    "cooking",
    "travel",
    "DIY_crafts",
];

pub struct NicheAnalyst {
    identity: WorkerIdentity,
}

impl NicheAnalyst {
    pub fn new(identity: WorkerIdentity) -> Self {
        Self { identity }
    }

    fn relevance(category: &str, keywords: &[String]) -> f64 {
        let category_lower = category.to_lowercase();
        keywords
            .iter()
            .map(|keyword| {
                let keyword = keyword.to_lowercase();
                if category_lower.contains(&keyword) {
                    0.5
                } else if ["ai", "machine learning", "technology"].contains(&keyword.as_str())
                    && category_lower.contains("tech")
                {
                    0.8
                } else if ["education", "learning", "tutorial"].contains(&keyword.as_str())
                    && category_lower.contains("educational")
                {
                    0.8
                } else {
                    0.0
                }
            })
            .sum()
    }

    fn content_types(category: &str) -> &'static [&'static str] {
        match category {
            "tech_reviews" => &["product_reviews", "tutorials", "unboxings"],
            "educational_content" => &["tutorials", "explainer_videos", "course_content"],
            "gaming" => &["gameplay", "reviews", "tips_and_tricks"],
            "finance" => &["investment_advice", "budgeting", "economic_news"],
            "health_fitness" => &["workouts", "nutrition", "wellness_tips"],
            "cooking" => &["recipe_videos", "cooking_tips", "ingredient_reviews"],
            "travel" => &["destination_reviews", "travel_tips", "vlog"],
            "DIY_crafts" => &["tutorials", "project_demonstrations", "supply_reviews"],
            _ => &["general_content"],
        }
    }
}

#[async_trait]
impl Worker for NicheAnalyst {
    fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    fn task_types(&self) -> Vec<TaskType> {
        vec![TaskType::AnalyzeTrends]
    }

    async fn handle(&self, task: &Task) -> Result<Value, WorkerError> {
        let keywords = task.get_strings("keywords");
        info!(topic = task.get_str("topic").unwrap_or_default(), "Analyzing niches");

        let mut niches: Vec<(f64, Value)> = NICHE_CATEGORIES
            .iter()
            .filter_map(|category| {
                let score = Self::relevance(category, &keywords);
                if score <= 0.0 {
                    return None;
                }
                let hash = stable_hash(category);
                let competition = ["low", "medium", "high"][hash as usize % 3];
                let niche = json!({
                    "category": category,
                    "relevance_score": (score * 100.0).round() / 100.0,
                    "competition_level": competition,
                    "potential_audience_size": 10_000 + hash % 990_001,
                    "recommended_content_types": Self::content_types(category),
                });
                Some((score, niche))
            })
            .collect();
        niches.sort_by(|a, b| b.0.total_cmp(&a.0));

        let identified: Vec<Value> = niches.into_iter().map(|(_, niche)| niche).collect();
        let top: Vec<Value> = identified.iter().take(3).cloned().collect();

        Ok(json!({
            "identified_niches": identified,
            "top_niches": top,
            "analysis_completed": true,
            "total_niches_analyzed": NICHE_CATEGORIES.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn research_task(keywords: Value) -> Task {
        Task::new("research_1", TaskType::AnalyzeTrends)
            .with("topic", "AI")
            .with("keywords", keywords)
            .with("timeframe", "24h")
    }

    #[tokio::test]
    async fn test_trend_fetcher_limits_and_is_deterministic() {
        let fetcher = TrendFetcher::new(WorkerIdentity::new("trend_fetcher", "TrendFetcher"));
        let task = research_task(json!(["a", "b", "c", "d", "e", "f"]));

        let first = fetcher.handle(&task).await.unwrap();
        let second = fetcher.handle(&task).await.unwrap();

        let trends = first["fetched_trends"].as_array().unwrap();
        assert_eq!(trends.len(), 5);
        assert_eq!(first["total_trends"], 5);
        assert_eq!(trends[0]["timeframe"], "24h");
        assert_eq!(trends[0]["volume"], second["fetched_trends"][0]["volume"]);

        let volume = trends[0]["volume"].as_u64().unwrap();
        assert!((1000..=10000).contains(&volume));
        let sentiment = trends[0]["sentiment_score"].as_f64().unwrap();
        assert!((-1.0..=1.0).contains(&sentiment));
    }

    #[tokio::test]
    async fn test_trend_fetcher_falls_back_to_base_keywords() {
        let fetcher = TrendFetcher::new(WorkerIdentity::new("trend_fetcher", "TrendFetcher"));
        let result = fetcher.handle(&research_task(json!([]))).await.unwrap();
        assert_eq!(result["fetched_trends"][0]["keyword"], "AI");
        assert_eq!(result["fetched_trends"][4]["keyword"], "Cloud Computing");
    }

    #[tokio::test]
    async fn test_niche_analyst_ranks_by_relevance() {
        let analyst = NicheAnalyst::new(WorkerIdentity::new("niche_analyst", "NicheAnalyst"));
        let result = analyst
            .handle(&research_task(json!(["AI", "tutorial", "gaming"])))
            .await
            .unwrap();

        let niches = result["identified_niches"].as_array().unwrap();
        assert_eq!(niches.len(), 3);
        assert_eq!(niches[0]["relevance_score"], 0.8);
        assert_eq!(niches[2]["category"], "gaming");
        assert!(niches.iter().all(|niche| {
            ["low", "medium", "high"].contains(&niche["competition_level"].as_str().unwrap())
        }));
        assert_eq!(result["total_niches_analyzed"], 8);
    }
}
