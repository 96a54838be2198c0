use huddle_core::CandidateInit;

use crate::integration::init_tracing;
use crate::integration::negotiation_tests::create_engine;

fn candidate(tag: &str) -> CandidateInit {
    CandidateInit {
        candidate: tag.to_string(),
        ..Default::default()
    }
}

/// Candidates arriving before the remote offer are held back and applied,
/// in arrival order, right after the description lands.
#[tokio::test]
async fn test_candidates_queue_until_remote_offer() {
    init_tracing();

    let (mut engine, transport, _signals) = create_engine("alice", "bob");

    engine
        .handle_candidate(candidate("c1"))
        .await
        .expect("Early candidate must be accepted");
    engine
        .handle_candidate(candidate("c2"))
        .await
        .expect("Early candidate must be accepted");
    assert!(transport.candidates().await.is_empty());

    engine
        .handle_offer("their-offer".to_string())
        .await
        .expect("Failed to handle offer");

    let applied = transport.candidates().await;
    let tags: Vec<&str> = applied.iter().map(|c| c.candidate.as_str()).collect();
    assert_eq!(tags, vec!["c1", "c2"]);

    // With the description in place, new candidates go straight through.
    engine
        .handle_candidate(candidate("c3"))
        .await
        .expect("Candidate must apply directly");
    assert_eq!(transport.candidates().await.len(), 3);
}

/// Same flush on the offerer's side: the remote answer is the description
/// that releases the queue.
#[tokio::test]
async fn test_candidates_queue_until_remote_answer() {
    init_tracing();

    let (mut engine, transport, _signals) = create_engine("alice", "bob");

    engine.create_offer().await.expect("Failed to create offer");
    engine
        .handle_candidate(candidate("early"))
        .await
        .expect("Early candidate must be accepted");
    assert!(transport.candidates().await.is_empty());

    engine
        .handle_answer("their-answer".to_string())
        .await
        .expect("Failed to apply answer");

    let applied = transport.candidates().await;
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].candidate, "early");
}
