//! Cross-segment consensus scoring.
//!
//! For comment column `c` and segment `j`, `avg(c, j)` is the mean cell value
//! over the segment's voters (0 for an empty segment). The consensus score is
//! `min_j |avg(c, j)|`: it only approaches 1 when every segment leans hard in
//! some direction. The dominant segment is `argmax_j |avg(c, j)|`, ties going
//! to the lowest index.

use concord_common::{cluster_label, ConsensusResult};

use crate::matrix::VoteMatrix;
use crate::segmentation::VoterSegmentation;

/// Mean vote on `col` within each segment, indexed by segment.
pub fn cluster_averages(matrix: &VoteMatrix, segmentation: &VoterSegmentation, col: usize) -> Vec<f64> {
    let mut sums = vec![0.0; segmentation.k];
    let mut counts = vec![0usize; segmentation.k];
    for (row, &cluster) in segmentation.assignments.iter().enumerate() {
        sums[cluster] += matrix.get(row, col);
        counts[cluster] += 1;
    }
    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| if count == 0 { 0.0 } else { sum / count as f64 })
        .collect()
}

pub fn consensus_score(averages: &[f64]) -> f64 {
    averages
        .iter()
        .map(|a| a.abs())
        .reduce(f64::min)
        .unwrap_or(0.0)
}

pub fn dominant_cluster(averages: &[f64]) -> usize {
    let mut best = 0;
    for (j, a) in averages.iter().enumerate() {
        if a.abs() > averages[best].abs() {
            best = j;
        }
    }
    best
}

/// Score every comment column of the matrix, in column order.
pub fn score_comments(matrix: &VoteMatrix, segmentation: &VoterSegmentation) -> Vec<ConsensusResult> {
    matrix
        .comments()
        .iter()
        .enumerate()
        .map(|(col, comment_id)| {
            let averages = cluster_averages(matrix, segmentation, col);
            ConsensusResult {
                comment_id: *comment_id,
                consensus_score: consensus_score(&averages),
                cluster_label: cluster_label(dominant_cluster(&averages)),
            }
        })
        .collect()
}
