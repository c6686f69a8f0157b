use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Discussion ---

/// A single agree (+1) / disagree (-1) vote. At most one per (user, comment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: Uuid,
    pub comment_id: Uuid,
    pub value: i16,
}

impl Vote {
    pub fn agree(user_id: Uuid, comment_id: Uuid) -> Self {
        Self { user_id, comment_id, value: 1 }
    }

    pub fn disagree(user_id: Uuid, comment_id: Uuid) -> Self {
        Self { user_id, comment_id, value: -1 }
    }

    pub fn is_valid(&self) -> bool {
        self.value == 1 || self.value == -1
    }
}

/// A comment on a story together with every vote cast on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub story_id: Uuid,
    pub votes: Vec<Vote>,
}

/// Derived per-comment ranking fields, overwritten on every consensus run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    pub comment_id: Uuid,
    pub consensus_score: f64,
    pub cluster_label: String,
}

/// Human-facing label for a zero-based voter cluster index.
pub fn cluster_label(index: usize) -> String {
    format!("Cluster-{}", index + 1)
}

// --- News ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    /// Stored feature vector, when one has already been computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Null until assigned. Assignment is one-way.
    pub story_cluster_id: Option<Uuid>,
}

impl Article {
    /// Text sent to the embedding service.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }
}

/// A persisted topic group of articles. Never merged or updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCluster {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Job results ---

/// Result of one job run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub processed_count: usize,
    pub group_count: usize,
}

impl JobSummary {
    pub fn empty() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for JobSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed={} groups={}",
            self.processed_count, self.group_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_label_is_one_based() {
        assert_eq!(cluster_label(0), "Cluster-1");
        assert_eq!(cluster_label(2), "Cluster-3");
    }

    #[test]
    fn vote_validity() {
        let (u, c) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(Vote::agree(u, c).is_valid());
        assert!(Vote::disagree(u, c).is_valid());
        assert!(!Vote { user_id: u, comment_id: c, value: 0 }.is_valid());
    }

    #[test]
    fn job_summary_serializes_camel_case() {
        let json = serde_json::to_value(JobSummary { processed_count: 4, group_count: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"processedCount": 4, "groupCount": 2}));
    }

    #[test]
    fn embedding_text_joins_title_and_content() {
        let article = Article {
            id: Uuid::new_v4(),
            title: "Rates rise".into(),
            content: "The central bank moved.".into(),
            published_at: Utc::now(),
            source: "Wire".into(),
            embedding: None,
            story_cluster_id: None,
        };
        assert_eq!(article.embedding_text(), "Rates rise\nThe central bank moved.");
    }
}
