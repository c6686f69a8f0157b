//! Voter segmentation: group voter rows by voting pattern.

use tracing::debug;

use concord_common::ConsensusConfig;

use crate::kmeans::KMeans;
use crate::matrix::VoteMatrix;

/// Stable mapping voter row → cluster index in `[0, k)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterSegmentation {
    pub assignments: Vec<usize>,
    pub k: usize,
}

impl VoterSegmentation {
    /// Every voter in cluster 0.
    pub fn single(voters: usize) -> Self {
        Self {
            assignments: vec![0; voters],
            k: 1,
        }
    }

    pub fn cluster_of(&self, row: usize) -> usize {
        self.assignments[row]
    }

    /// Number of voters per cluster, empty clusters included.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &c in &self.assignments {
            sizes[c] += 1;
        }
        sizes
    }
}

/// Cluster the matrix rows into `k = min(max_clusters, voters)` groups.
///
/// With at most one voter k-means is skipped and everyone lands in
/// cluster 0. A discussion with no voters still reports `k = 1` so that
/// every comment has one (empty) segment to score against.
pub fn segment_voters(matrix: &VoteMatrix, config: &ConsensusConfig) -> VoterSegmentation {
    let voters = matrix.voter_count();
    if voters <= 1 {
        return VoterSegmentation::single(voters);
    }

    let k = config.max_clusters.max(1).min(voters);
    let partition = KMeans::new(k)
        .with_seed(config.seed)
        .with_max_iterations(config.max_iterations)
        .fit(matrix.rows());

    debug!(voters, k, iterations = partition.iterations, "Voters segmented");

    VoterSegmentation {
        assignments: partition.assignments,
        k,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_clusters: usize) -> ConsensusConfig {
        ConsensusConfig {
            max_clusters,
            seed: Some(11),
            max_iterations: 50,
        }
    }

    #[test]
    fn single_voter_bypasses_clustering() {
        let matrix = VoteMatrix::from_rows(vec![vec![1.0, -1.0]]);
        let seg = segment_voters(&matrix, &config(3));
        assert_eq!(seg, VoterSegmentation::single(1));
        assert_eq!(seg.cluster_of(0), 0);
    }

    #[test]
    fn no_voters_reports_one_empty_cluster() {
        let matrix = VoteMatrix::from_rows(vec![]);
        let seg = segment_voters(&matrix, &config(3));
        assert_eq!(seg.k, 1);
        assert!(seg.assignments.is_empty());
        assert_eq!(seg.sizes(), vec![0]);
    }

    #[test]
    fn k_is_capped_by_voter_count() {
        let matrix = VoteMatrix::from_rows(vec![vec![1.0], vec![-1.0]]);
        let seg = segment_voters(&matrix, &config(3));
        assert_eq!(seg.k, 2);
        assert_ne!(seg.cluster_of(0), seg.cluster_of(1));
    }

    #[test]
    fn k_is_capped_by_config() {
        let rows = (0..10)
            .map(|i| vec![if i % 2 == 0 { 1.0 } else { -1.0 }, 0.0])
            .collect();
        let seg = segment_voters(&VoteMatrix::from_rows(rows), &config(3));
        assert_eq!(seg.k, 3);
        assert_eq!(seg.assignments.len(), 10);
        assert!(seg.assignments.iter().all(|&c| c < 3));
        assert_eq!(seg.sizes().iter().sum::<usize>(), 10);
    }
}
