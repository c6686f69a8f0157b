pub mod consensus;
pub mod embedder;
pub mod features;
pub mod jobs;
pub mod kmeans;
pub mod materialize;
pub mod matrix;
pub mod partition;
pub mod segmentation;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use embedder::{Embedder, TextEmbedder};
pub use features::{ArticleFeatureExtractor, ArticleFeatures, EmbeddingExtractor, KeywordExtractor};
pub use jobs::{compute_consensus, ClusteringJob, ConsensusJob, ConsensusOutcome};
pub use kmeans::{KMeans, Partition};
pub use materialize::{ClusterMaterializer, MaterializeStats};
pub use matrix::VoteMatrix;
pub use partition::{partition_articles, ArticleGroup, OTHER_GROUP};
pub use segmentation::{segment_voters, VoterSegmentation};
