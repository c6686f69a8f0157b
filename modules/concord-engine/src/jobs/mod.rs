mod clustering;
mod consensus;

pub use clustering::ClusteringJob;
pub use consensus::{compute_consensus, ConsensusJob, ConsensusOutcome};
