use std::sync::Arc;

use concord_common::{Article, ClusteringConfig, ConcordError, JobSummary, StrategyKind};
use concord_engine::testing::{article, FixedEmbedder, MockStore};
use concord_engine::{ArticleFeatureExtractor, ClusteringJob, TextEmbedder};

fn keyword_config(terms: &[&str]) -> ClusteringConfig {
    ClusteringConfig {
        strategy: StrategyKind::Keyword,
        vocabulary: terms.iter().map(|t| t.to_string()).collect(),
        ..ClusteringConfig::default()
    }
}

fn embedding_config(max_clusters: usize) -> ClusteringConfig {
    ClusteringConfig {
        strategy: StrategyKind::Embedding,
        max_clusters,
        seed: Some(11),
        ..ClusteringConfig::default()
    }
}

fn keyword_job(store: Arc<MockStore>, config: ClusteringConfig) -> ClusteringJob {
    let extractor = ArticleFeatureExtractor::from_config(&config, None).unwrap();
    ClusteringJob::new(store, extractor, config)
}

fn embedding_job(store: Arc<MockStore>, embedder: Arc<FixedEmbedder>, config: ClusteringConfig) -> ClusteringJob {
    let embedder: Arc<dyn TextEmbedder> = embedder;
    let extractor = ArticleFeatureExtractor::from_config(&config, Some(embedder)).unwrap();
    ClusteringJob::new(store, extractor, config)
}

fn cluster_title(store: &MockStore, article: &Article) -> String {
    let cluster_id = store.cluster_of(article.id).unwrap();
    store
        .clusters()
        .into_iter()
        .find(|c| c.id == cluster_id)
        .map(|c| c.title)
        .unwrap()
}

#[tokio::test]
async fn keyword_strategy_groups_by_vocabulary_term() {
    let ai = article("AI breakthrough", "");
    let sport = article("Local sports team wins", "");
    let store = Arc::new(MockStore::new().with_articles(vec![ai.clone(), sport.clone()]));
    let job = keyword_job(store.clone(), keyword_config(&["tech", "AI", "sport"]));

    let summary = job.run().await.unwrap();
    assert_eq!(
        summary,
        JobSummary {
            processed_count: 2,
            group_count: 2
        }
    );
    assert_eq!(cluster_title(&store, &ai), "AI News");
    assert_eq!(cluster_title(&store, &sport), "Sport News");
    assert_eq!(store.unclustered_count(), 0);
}

#[tokio::test]
async fn unmatched_articles_land_in_other() {
    let matched = article("Tech giants report earnings", "");
    let unmatched = article("Weather report", "Clouds tomorrow");
    let store = Arc::new(MockStore::new().with_articles(vec![matched.clone(), unmatched.clone()]));
    let job = keyword_job(store.clone(), keyword_config(&["tech", "sport"]));

    job.run().await.unwrap();
    assert_eq!(cluster_title(&store, &unmatched), "Other News");

    let other = store
        .clusters()
        .into_iter()
        .find(|c| c.title == "Other News")
        .unwrap();
    assert_eq!(other.summary.as_deref(), Some("A collection of 1 articles about other"));
}

#[tokio::test]
async fn empty_backlog_issues_no_writes() {
    let store = Arc::new(MockStore::new());
    let job = keyword_job(store.clone(), ClusteringConfig::default());

    let summary = job.run().await.unwrap();
    assert_eq!(summary, JobSummary::empty());
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn second_run_finds_nothing_left() {
    let store = Arc::new(MockStore::new().with_articles(vec![
        article("AI chips", ""),
        article("Sport results", ""),
        article("Economy slows", ""),
    ]));
    let job = keyword_job(store.clone(), ClusteringConfig::default());

    assert_eq!(job.run().await.unwrap().processed_count, 3);
    let writes_after_first = store.writes().len();

    let summary = job.run().await.unwrap();
    assert_eq!(summary, JobSummary::empty());
    assert_eq!(store.writes().len(), writes_after_first);
}

#[tokio::test]
async fn keyword_runs_are_deterministic() {
    let titles = ["AI in health care", "Tech stocks", "Politics of sport", "Gardening tips"];
    let mut assignments = Vec::new();
    for _ in 0..2 {
        let articles: Vec<Article> = titles.iter().map(|t| article(t, "")).collect();
        let store = Arc::new(MockStore::new().with_articles(articles.clone()));
        keyword_job(store.clone(), ClusteringConfig::default())
            .run()
            .await
            .unwrap();
        assignments.push(
            articles
                .iter()
                .map(|a| cluster_title(&store, a))
                .collect::<Vec<_>>(),
        );
    }
    assert_eq!(assignments[0], assignments[1]);
    assert_eq!(assignments[0], vec!["AI News", "Tech News", "Sport News", "Other News"]);
}

#[tokio::test]
async fn embedding_strategy_separates_distant_topics() {
    let a1 = article("Rocket launch", "orbit");
    let a2 = article("Satellite deployed", "orbit");
    let b1 = article("Bread prices", "bakery");
    let b2 = article("Flour shortage", "bakery");
    let embedder = Arc::new(
        FixedEmbedder::new(3)
            .on_text(&a1.embedding_text(), vec![1.0, 0.0, 0.0])
            .on_text(&a2.embedding_text(), vec![0.9, 0.1, 0.0])
            .on_text(&b1.embedding_text(), vec![0.0, 0.0, 1.0])
            .on_text(&b2.embedding_text(), vec![0.0, 0.1, 0.9]),
    );
    let store = Arc::new(MockStore::new().with_articles(vec![
        a1.clone(),
        a2.clone(),
        b1.clone(),
        b2.clone(),
    ]));
    let job = embedding_job(store.clone(), embedder.clone(), embedding_config(2));

    let summary = job.run().await.unwrap();
    assert_eq!(summary.processed_count, 4);
    assert_eq!(summary.group_count, 2);
    assert_eq!(store.cluster_of(a1.id), store.cluster_of(a2.id));
    assert_eq!(store.cluster_of(b1.id), store.cluster_of(b2.id));
    assert_ne!(store.cluster_of(a1.id), store.cluster_of(b1.id));
    assert_eq!(embedder.calls().len(), 1);
    assert_eq!(embedder.calls()[0].len(), 4);
}

#[tokio::test]
async fn stored_embeddings_are_not_requested_again() {
    let mut stored = article("Rocket launch", "orbit");
    stored.embedding = Some(vec![1.0, 0.0]);
    let fresh = article("Bread prices", "bakery");
    let embedder = Arc::new(FixedEmbedder::new(2).on_text(&fresh.embedding_text(), vec![0.0, 1.0]));
    let store = Arc::new(MockStore::new().with_articles(vec![stored, fresh.clone()]));
    let job = embedding_job(store.clone(), embedder.clone(), embedding_config(2));

    job.run().await.unwrap();
    assert_eq!(embedder.calls(), vec![vec![fresh.embedding_text()]]);
}

#[tokio::test]
async fn embedding_failure_writes_nothing() {
    let store = Arc::new(MockStore::new().with_articles(vec![article("Rocket launch", "orbit")]));
    let embedder = Arc::new(FixedEmbedder::new(3).failing());
    let job = embedding_job(store.clone(), embedder, embedding_config(2));

    let err = job.run().await.unwrap_err();
    assert!(matches!(err, ConcordError::Embedding(_)), "got {err:?}");
    assert!(store.writes().is_empty());
    assert_eq!(store.unclustered_count(), 1);
}

#[tokio::test]
async fn embedding_strategy_requires_an_embedder() {
    let err = ArticleFeatureExtractor::from_config(&embedding_config(2), None).err().unwrap();
    assert!(matches!(err, ConcordError::Config(_)));
}

#[tokio::test]
async fn failed_assignment_leaves_articles_for_the_next_run() {
    let ai = article("AI breakthrough", "");
    let store = Arc::new(
        MockStore::new()
            .with_articles(vec![ai.clone()])
            .failing_article_updates(),
    );
    let job = keyword_job(store.clone(), keyword_config(&["AI"]));

    let err = job.run().await.unwrap_err();
    assert!(matches!(err, ConcordError::Store(_)), "got {err:?}");
    assert_eq!(store.unclustered_count(), 1);
    // The non-transactional path leaves the created cluster behind.
    assert_eq!(store.clusters().len(), 1);

    store.heal();
    let summary = job.run().await.unwrap();
    assert_eq!(summary.processed_count, 1);
    assert!(store.cluster_of(ai.id).is_some());
}

#[tokio::test]
async fn transactional_store_rolls_back_failed_groups() {
    let store = Arc::new(
        MockStore::new()
            .with_articles(vec![article("AI breakthrough", "")])
            .failing_article_updates()
            .transactional(),
    );
    let job = keyword_job(store.clone(), keyword_config(&["AI"]));

    assert!(job.run().await.is_err());
    assert!(store.clusters().is_empty());
    assert_eq!(store.unclustered_count(), 1);
}
