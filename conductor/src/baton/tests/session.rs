use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use shared_types::PlaybackState;

use super::support::{
    config, score, setup_session, setup_with_source, stretched_smf, worker, PausingSource,
};
use crate::baton::BatonError;
use crate::score::SmfScoreSource;

const STEP: Duration = Duration::from_millis(100);

#[tokio::test]
async fn test_tracks_follow_registration_order_and_extra_tracks_drop() {
    let (session, registry, client) = setup_session(score(3, 4, Duration::ZERO), config(false));
    registry.register(worker(0xA, "http://addr1")).await;
    registry.register(worker(0xB, "http://addr2")).await;

    session.play(b"score").unwrap();
    session.wait_idle().await;

    let to_a = client.payloads_for("http://addr1");
    let to_b = client.payloads_for("http://addr2");
    assert_eq!(to_a, (0..4).map(|i| vec![0, i]).collect::<Vec<_>>());
    assert_eq!(to_b, (0..4).map(|i| vec![1, i]).collect::<Vec<_>>());
    assert_eq!(client.deliveries().len(), 8);

    let status = session.status().await;
    assert_eq!(status.state, PlaybackState::Idle);
    assert_eq!(status.sessions_completed, 1);
    let summary = status.last_session.unwrap();
    assert_eq!(summary.tracks, 3);
    assert_eq!(summary.routed_tracks, 2);
    assert_eq!(summary.dropped_tracks, vec![2]);
    assert_eq!(summary.delivered, 8);
    assert!(!summary.cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_second_play_conflicts_until_idle() {
    let (session, registry, client) = setup_session(score(1, 3, STEP), config(true));
    registry.register(worker(1, "http://a")).await;

    session.play(b"first").unwrap();
    assert_eq!(session.state(), PlaybackState::Playing);
    assert!(matches!(
        session.play(b"second"),
        Err(BatonError::AlreadyPlaying)
    ));

    session.wait_idle().await;
    assert_eq!(client.deliveries().len(), 3, "first session unaffected");

    session.play(b"third").unwrap();
    session.wait_idle().await;
    assert_eq!(client.deliveries().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_plays_start_exactly_one_session() {
    let (session, registry, _client) = setup_session(score(1, 2, STEP), config(true));
    registry.register(worker(1, "http://a")).await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move { session.play(b"x").is_ok() }));
    }
    let mut started = 0;
    for handle in handles {
        if handle.await.unwrap() {
            started += 1;
        }
    }
    assert_eq!(started, 1);
    session.wait_idle().await;
}

#[tokio::test]
async fn test_invalid_score_is_rejected_and_releases_guard() {
    let (session, registry, _client) = setup_session(score(1, 1, Duration::ZERO), config(false));
    registry.register(worker(1, "http://a")).await;

    assert!(matches!(
        session.play(b"bad"),
        Err(BatonError::InvalidScore(_))
    ));
    assert_eq!(session.state(), PlaybackState::Idle);

    session.play(b"good").unwrap();
    session.wait_idle().await;
}

#[tokio::test]
async fn test_parser_panic_releases_guard() {
    let (session, registry, client) = setup_session(score(1, 2, Duration::ZERO), config(false));
    registry.register(worker(1, "http://a")).await;

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| session.play(b"panic")));
    assert!(outcome.is_err());
    assert_eq!(session.state(), PlaybackState::Idle);
    assert!(matches!(session.pause(), Err(BatonError::NotPlaying)));

    session.play(b"good").unwrap();
    session.wait_idle().await;
    assert_eq!(client.deliveries().len(), 2);
}

#[tokio::test]
async fn test_score_past_playable_range_is_rejected() {
    let (session, registry, client) = setup_with_source(Arc::new(SmfScoreSource), config(false));
    registry.register(worker(1, "http://a")).await;

    assert!(matches!(
        session.play(&stretched_smf(1, 5000)),
        Err(BatonError::InvalidScore(_))
    ));
    assert_eq!(session.state(), PlaybackState::Idle);

    // A long but representable score still plays.
    session.play(&stretched_smf(96, 3)).unwrap();
    session.wait_idle().await;
    assert_eq!(client.deliveries().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_pause_during_parse_is_kept() {
    let source = PausingSource::new(score(1, 3, STEP));
    let (session, registry, client) = setup_with_source(source.clone(), config(true));
    source.attach(&session);
    registry.register(worker(1, "http://a")).await;

    session.play(b"x").unwrap();
    assert!(session.is_paused());
    assert!(session.status().await.paused);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(client.deliveries().is_empty());

    session.resume().unwrap();
    session.wait_idle().await;
    assert_eq!(client.deliveries().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_pause_after_session_ends_is_refused() {
    let (session, registry, _client) = setup_session(score(1, 2, STEP), config(true));
    registry.register(worker(1, "http://a")).await;

    session.play(b"x").unwrap();
    session.wait_idle().await;

    assert!(matches!(session.pause(), Err(BatonError::NotPlaying)));
    assert!(!session.is_paused());
    assert!(!session.status().await.paused);
}

#[tokio::test(start_paused = true)]
async fn test_pause_holds_events_and_resume_keeps_order() {
    let (session, registry, client) = setup_session(score(2, 3, STEP), config(true));
    registry.register(worker(1, "http://a")).await;
    registry.register(worker(2, "http://b")).await;

    session.play(b"x").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.pause().unwrap();
    assert!(session.is_paused());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(client.payloads_for("http://a"), vec![vec![0, 0]]);
    assert_eq!(client.payloads_for("http://b"), vec![vec![1, 0]]);

    session.resume().unwrap();
    session.wait_idle().await;
    assert_eq!(
        client.payloads_for("http://a"),
        vec![vec![0, 0], vec![0, 1], vec![0, 2]]
    );
    assert_eq!(
        client.payloads_for("http://b"),
        vec![vec![1, 0], vec![1, 1], vec![1, 2]]
    );
    assert!(!session.is_paused());
}

#[tokio::test]
async fn test_pause_and_stop_require_active_session() {
    let (session, _registry, _client) = setup_session(score(1, 1, Duration::ZERO), config(false));
    assert!(matches!(session.pause(), Err(BatonError::NotPlaying)));
    assert!(matches!(session.resume(), Err(BatonError::NotPlaying)));
    assert!(matches!(session.stop(), Err(BatonError::NotPlaying)));
}

#[tokio::test(start_paused = true)]
async fn test_reregistration_mid_session_redirects_unsent_events() {
    let (session, registry, client) = setup_session(score(1, 3, STEP), config(true));
    registry.register(worker(1, "http://old")).await;

    session.play(b"x").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    registry.register(worker(1, "http://new")).await;
    session.wait_idle().await;

    assert_eq!(client.payloads_for("http://old"), vec![vec![0, 0]]);
    assert_eq!(
        client.payloads_for("http://new"),
        vec![vec![0, 1], vec![0, 2]]
    );
    assert_eq!(registry.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unregister_mid_session_drops_remaining_events() {
    let (session, registry, client) = setup_session(score(2, 3, STEP), config(true));
    let gone = worker(1, "http://gone");
    registry.register(gone.clone()).await;
    registry.register(worker(2, "http://stays")).await;

    session.play(b"x").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    registry.unregister(&gone.id).await;
    session.wait_idle().await;

    assert_eq!(client.payloads_for("http://gone").len(), 1);
    assert_eq!(client.payloads_for("http://stays").len(), 3);

    let summary = session.status().await.last_session.unwrap();
    assert_eq!(summary.delivered, 4);
    assert_eq!(summary.skipped, 2);
}

#[tokio::test]
async fn test_failing_worker_does_not_stop_the_others() {
    let (session, registry, client) = setup_session(score(2, 5, Duration::ZERO), config(false));
    registry.register(worker(1, "http://down")).await;
    registry.register(worker(2, "http://up")).await;
    client.fail_for("http://down");

    session.play(b"x").unwrap();
    session.wait_idle().await;

    assert_eq!(client.payloads_for("http://up").len(), 5);
    let summary = session.status().await.last_session.unwrap();
    assert_eq!(summary.failed, 5);
    assert_eq!(summary.delivered, 5);
}

#[tokio::test(start_paused = true)]
async fn test_slow_worker_does_not_hold_up_other_tracks() {
    let mut cfg = config(false);
    cfg.channel_capacity = 1;
    cfg.delivery_timeout = Duration::from_secs(60);
    let (session, registry, client) = setup_session(score(2, 5, Duration::ZERO), cfg);
    registry.register(worker(1, "http://slow")).await;
    registry.register(worker(2, "http://fast")).await;
    client.slow_for("http://slow", Duration::from_secs(10));

    session.play(b"x").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(client.payloads_for("http://fast").len(), 5);
    assert!(client.payloads_for("http://slow").is_empty());
    assert_eq!(session.state(), PlaybackState::Playing);

    session.wait_idle().await;
    assert_eq!(client.payloads_for("http://slow").len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_worker_times_out() {
    let mut cfg = config(false);
    cfg.delivery_timeout = Duration::from_millis(500);
    let (session, registry, client) = setup_session(score(1, 2, Duration::ZERO), cfg);
    registry.register(worker(1, "http://hung")).await;
    client.slow_for("http://hung", Duration::from_secs(3600));

    session.play(b"x").unwrap();
    session.wait_idle().await;

    let summary = session.status().await.last_session.unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.delivered, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_and_returns_to_idle() {
    let (session, registry, client) = setup_session(score(1, 10, STEP), config(true));
    registry.register(worker(1, "http://a")).await;

    session.play(b"x").unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    session.stop().unwrap();
    session.wait_idle().await;

    assert_eq!(session.state(), PlaybackState::Idle);
    let delivered = client.deliveries().len() as u64;
    assert_eq!(delivered, 3);

    let summary = session.status().await.last_session.unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.delivered + summary.skipped, 10);
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_paused_does_not_hang() {
    let (session, registry, _client) = setup_session(score(1, 10, STEP), config(true));
    registry.register(worker(1, "http://a")).await;

    session.play(b"x").unwrap();
    session.pause().unwrap();
    session.stop().unwrap();
    session.wait_idle().await;
    assert!(!session.is_paused());
}

#[tokio::test]
async fn test_session_with_no_workers_completes() {
    let (session, _registry, client) = setup_session(score(3, 2, Duration::ZERO), config(false));
    session.play(b"x").unwrap();
    session.wait_idle().await;

    assert!(client.deliveries().is_empty());
    let summary = session.status().await.last_session.unwrap();
    assert_eq!(summary.dropped_tracks, vec![0, 1, 2]);
}
