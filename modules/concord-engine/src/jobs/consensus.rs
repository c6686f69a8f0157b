use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use concord_common::{
    Comment, ConcordError, ConsensusConfig, ConsensusResult, DataStore, JobSummary,
};

use crate::consensus::score_comments;
use crate::matrix::VoteMatrix;
use crate::segmentation::{segment_voters, VoterSegmentation};

/// Scores and segmentation for one discussion, before write-back.
#[derive(Debug, Clone)]
pub struct ConsensusOutcome {
    pub results: Vec<ConsensusResult>,
    pub segmentation: VoterSegmentation,
}

/// Build the vote matrix, segment voters, and score every comment.
pub fn compute_consensus(
    comments: &[Comment],
    config: &ConsensusConfig,
) -> Result<ConsensusOutcome, ConcordError> {
    let matrix = VoteMatrix::build(comments)?;
    let segmentation = segment_voters(&matrix, config);
    let results = score_comments(&matrix, &segmentation);
    Ok(ConsensusOutcome {
        results,
        segmentation,
    })
}

/// Recomputes consensus fields for every comment on one story.
///
/// Each run overwrites previous values, so re-running after a partial
/// failure converges on a full result. Callers are expected to keep at most
/// one run per story in flight.
pub struct ConsensusJob {
    store: Arc<dyn DataStore>,
    config: ConsensusConfig,
}

impl ConsensusJob {
    pub fn new(store: Arc<dyn DataStore>, config: ConsensusConfig) -> Self {
        Self { store, config }
    }

    pub async fn run(&self, story_id: Uuid) -> Result<JobSummary, ConcordError> {
        info!(%story_id, "ConsensusJob.start");

        let comments = self
            .store
            .fetch_comments_with_votes(story_id)
            .await
            .map_err(ConcordError::store)?;

        if comments.is_empty() {
            info!(%story_id, "No comments found for story");
            return Ok(JobSummary::empty());
        }

        let outcome = compute_consensus(&comments, &self.config)?;

        for result in &outcome.results {
            self.store
                .update_comment_consensus(
                    result.comment_id,
                    result.consensus_score,
                    &result.cluster_label,
                )
                .await
                .map_err(ConcordError::store)?;
        }

        let summary = JobSummary {
            processed_count: comments.len(),
            group_count: outcome.segmentation.k,
        };
        info!(
            %story_id,
            comments = comments.len(),
            voters = outcome.segmentation.assignments.len(),
            k = outcome.segmentation.k,
            "Consensus job complete"
        );
        Ok(summary)
    }
}
