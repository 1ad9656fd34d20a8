//! End-to-end enrichment behaviour against the in-memory platform.
//!
//! Covers quota routing across keys, body-first cost avoidance, early stop
//! under concurrency and quota exhaustion mid-run.

use std::sync::Arc;
use std::time::Duration;

use trendscout_scout::pipeline::{EnrichmentConfig, EnrichmentPipeline};
use trendscout_scout::scheduling::{CredentialId, Operation};
use trendscout_scout::testing::{
    comment, test_selector, thread, video_record, MockBodies, MockPlatform,
};

fn build(
    platform: MockPlatform,
    bodies: MockBodies,
    keys: usize,
    quota: u64,
    workers: usize,
) -> (EnrichmentPipeline, Arc<MockPlatform>, Arc<MockBodies>) {
    let platform = Arc::new(platform);
    let bodies = Arc::new(bodies);
    let pipeline = EnrichmentPipeline::new(
        platform.clone(),
        bodies.clone(),
        test_selector(keys, quota),
        EnrichmentConfig::with_workers(workers),
    );
    (pipeline, platform, bodies)
}

#[tokio::test]
async fn candidate_without_body_costs_nothing() {
    let platform = MockPlatform::new()
        .on_search("budget", &["A", "B"])
        .on_video(video_record("A", "Budget A", "chan-a"))
        .on_video(video_record("B", "Budget B", "chan-b"));
    let bodies = MockBodies::new().with_body("B", "transcript of B");
    let (pipeline, platform, _) = build(platform, bodies, 1, 10_000, 3);

    let items = pipeline.enrich("budget", 10, 1, None).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "B");
    assert_eq!(items[0].body.as_text(), Some("transcript of B"));
    assert!(platform.calls_for("A").is_empty());
    // search + video + channel + one empty comment page
    assert_eq!(
        pipeline.selector().ledger().usage(CredentialId(0)),
        Some(100 + 1 + 1 + 1)
    );
}

#[tokio::test]
async fn search_moves_to_next_key_when_first_cannot_afford_it() {
    let (pipeline, platform, _) = build(
        MockPlatform::new().on_search("budget", &[]),
        MockBodies::new(),
        2,
        10_000,
        3,
    );
    let ledger = pipeline.selector().ledger().clone();
    assert!(ledger.charge_if_available(CredentialId(0), 9_950));

    pipeline.enrich("budget", 10, 5, None).await;

    let calls = platform.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].api_key, "key-1");
    assert_eq!(ledger.usage(CredentialId(0)), Some(9_950));
    assert_eq!(ledger.usage(CredentialId(1)), Some(100));
}

#[tokio::test]
async fn exhausted_search_returns_empty_without_calls() {
    let (pipeline, platform, bodies) = build(
        MockPlatform::new().on_search("budget", &["A"]),
        MockBodies::new().with_body("A", "text"),
        2,
        50,
        3,
    );

    assert!(pipeline.enrich("budget", 10, 5, None).await.is_empty());
    assert!(platform.calls().is_empty());
    assert!(bodies.resolved().is_empty());
}

#[tokio::test]
async fn failed_search_returns_empty() {
    let (pipeline, platform, _) = build(
        MockPlatform::new().failing(Operation::Search, "budget"),
        MockBodies::new(),
        1,
        10_000,
        3,
    );

    assert!(pipeline.enrich("budget", 10, 5, None).await.is_empty());
    // the failed call was still charged
    assert_eq!(platform.count(Operation::Search), 1);
    assert_eq!(pipeline.selector().ledger().usage(CredentialId(0)), Some(100));
}

#[tokio::test]
async fn early_stop_cancels_queued_candidates_and_drops_late_results() {
    let platform = MockPlatform::new()
        .on_search("budget", &["a", "b", "c", "d", "e"])
        .on_video(video_record("a", "A", "chan"))
        .on_video(video_record("b", "B", "chan"))
        .on_video(video_record("c", "C", "chan"))
        .on_video(video_record("d", "D", "chan"))
        .on_video(video_record("e", "E", "chan"))
        .with_delay("a", Duration::from_millis(20))
        .with_delay("b", Duration::from_millis(200))
        .with_delay("c", Duration::from_millis(200));
    let bodies = ["a", "b", "c", "d", "e"]
        .iter()
        .fold(MockBodies::new(), |b, id| b.with_body(id, "transcript"));
    let (pipeline, platform, bodies) = build(platform, bodies, 1, 10_000, 3);

    let items = pipeline.enrich("budget", 10, 1, None).await;

    assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["a"]);
    // b and c were already in flight
    assert!(!platform.calls_for("b").is_empty());
    assert!(!platform.calls_for("c").is_empty());
    // d and e never started
    assert!(platform.calls_for("d").is_empty());
    assert!(platform.calls_for("e").is_empty());
    let resolved = bodies.resolved();
    assert!(!resolved.contains(&"d".to_string()));
    assert!(!resolved.contains(&"e".to_string()));
}

#[tokio::test]
async fn quota_running_out_mid_run_degrades_then_skips() {
    let platform = MockPlatform::new()
        .on_search("budget", &["A", "B"])
        .on_video(video_record("A", "Budget A", "chan-a"))
        .on_video(video_record("B", "Budget B", "chan-b"));
    let bodies = MockBodies::new().with_body("A", "text").with_body("B", "text");
    // one key, exactly enough for the search and one item lookup
    let (pipeline, platform, _) = build(platform, bodies, 1, 101, 1);

    let items = pipeline.enrich("budget", 10, 2, None).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "A");
    assert_eq!(items[0].author.name, "chan-a title");
    assert_eq!(items[0].author.creation_date, "Unknown");
    assert!(items[0].comments.is_empty());
    assert_eq!(platform.count(Operation::Videos), 1);
    assert_eq!(platform.count(Operation::Channels), 0);
    assert_eq!(pipeline.selector().ledger().remaining(CredentialId(0)), Some(0));
}

#[tokio::test]
async fn enriched_item_carries_ranked_comment_tree() {
    let platform = MockPlatform::new()
        .on_search("budget", &["A"])
        .on_video(video_record("A", "Budget A", "chan-a"))
        .on_threads(
            "A",
            vec![
                vec![
                    thread("t1", "this budget leaves out the farmers entirely", 4, 0),
                    thread("t2", "too short", 90, 0),
                ],
                vec![thread("t3", "the fiscal deficit target looks very ambitious", 12, 2)],
            ],
        )
        .on_replies(
            "t3",
            vec![vec![
                comment("r1", "agreed, the numbers rely on optimistic growth", 2),
                comment("r2", "nope", 1),
            ]],
        );
    let (pipeline, platform, _) = build(
        platform,
        MockBodies::new().with_body("A", "text"),
        1,
        10_000,
        3,
    );

    let items = pipeline.enrich("budget", 10, 1, None).await;

    let comments = &items[0].comments;
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].score, 12);
    // short replies stay; only top-level comments have a word floor
    assert_eq!(comments[0].replies.len(), 2);
    assert_eq!(comments[0].replies[0].score, 2);
    assert_eq!(comments[0].replies[1].text, "nope");
    assert_eq!(comments[1].score, 4);
    assert!(comments[1].replies.is_empty());
    // replies are only listed for threads that have them
    assert!(platform.calls_for("t1").is_empty());
    assert_eq!(platform.count(Operation::CommentThreads), 2);
}
