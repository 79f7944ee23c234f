mod utils;

use tapround::{score_from_taps, AppError, RoundPhase};
use utils::{finish_round, start_round, tap_times, TestSetupBuilder};

#[tokio::test]
async fn full_round_lifecycle_produces_summary() {
    let setup = TestSetupBuilder::new()
        .with_players(vec![("u-alice", "alice"), ("u-bob", "bob"), ("u-nik", "Никита")])
        .build()
        .await;
    let round = setup.create_round().await;

    assert_eq!(
        setup.round_service.phase_of(round.id).await.unwrap(),
        RoundPhase::Cooldown
    );
    for user in ["u-alice", "u-bob", "u-nik"] {
        setup
            .score_service
            .register_participant(user, round.id)
            .await
            .expect("registration during cooldown should succeed");
    }

    start_round(&setup, &round);
    assert_eq!(
        setup.round_service.phase_of(round.id).await.unwrap(),
        RoundPhase::Active
    );
    tap_times(&setup, &round, "u-bob", "survivor", 11).await;
    let last = tap_times(&setup, &round, "u-nik", "survivor", 22).await.unwrap();
    assert_eq!(last.score, 40, "excluded identity still accumulates privately");

    finish_round(&setup, &round);
    assert_eq!(
        setup.round_service.phase_of(round.id).await.unwrap(),
        RoundPhase::Finished
    );

    let summary = setup.score_service.get_summary(round.id).await.unwrap();
    assert_eq!(summary.total_score, score_from_taps(0) + score_from_taps(11));
    let best = summary.best_player.clone().expect("bob should be nominated");
    assert_eq!(best.username, "bob");
    assert_eq!(best.score, 20);
    assert_eq!(summary.score_for("u-alice"), Some(0));
    assert_eq!(summary.score_for("u-nik"), Some(40));
}

#[tokio::test]
async fn taps_outside_active_window_are_rejected() {
    let setup = TestSetupBuilder::new().build().await;
    let round = setup.create_round().await;
    setup
        .score_service
        .register_participant("u1", round.id)
        .await
        .unwrap();

    let early = setup.score_service.record_tap("u1", round.id, "survivor").await;
    assert!(matches!(early, Err(AppError::InvalidPhase(_))));

    finish_round(&setup, &round);
    let late = setup.score_service.record_tap("u1", round.id, "survivor").await;
    assert!(matches!(late, Err(AppError::InvalidPhase(_))));

    let record = setup
        .score_service
        .own_score("u1", round.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.taps, 0);
}

#[tokio::test]
async fn late_joiner_cannot_register_or_tap() {
    let setup = TestSetupBuilder::new().build().await;
    let round = setup.create_round().await;
    start_round(&setup, &round);

    let join = setup.score_service.register_participant("late", round.id).await;
    assert!(matches!(join, Err(AppError::InvalidPhase(_))));

    let tap = setup.score_service.record_tap("late", round.id, "survivor").await;
    assert!(matches!(tap, Err(AppError::NotRegistered(_))));
}

#[tokio::test]
async fn ghost_role_keeps_score_constant() {
    let setup = TestSetupBuilder::new()
        .with_players(vec![("u-ghost", "casper")])
        .build()
        .await;
    let round = setup.create_round().await;
    setup
        .score_service
        .register_participant("u-ghost", round.id)
        .await
        .unwrap();

    start_round(&setup, &round);
    tap_times(&setup, &round, "u-ghost", "survivor", 12).await;
    let ghost = tap_times(&setup, &round, "u-ghost", "nikita", 30).await.unwrap();
    assert_eq!(ghost.taps, 12);
    assert_eq!(ghost.score, score_from_taps(12));

    finish_round(&setup, &round);
    let summary = setup.score_service.get_summary(round.id).await.unwrap();
    assert_eq!(summary.total_score, 21);
}

#[tokio::test]
async fn summary_is_unavailable_until_finished() {
    let setup = TestSetupBuilder::new().build().await;
    let round = setup.create_round().await;

    let cooldown = setup.score_service.get_summary(round.id).await;
    assert!(matches!(cooldown, Err(AppError::InvalidPhase(_))));

    start_round(&setup, &round);
    let active = setup.score_service.get_summary(round.id).await;
    assert!(matches!(active, Err(AppError::InvalidPhase(_))));

    finish_round(&setup, &round);
    let summary = setup.score_service.get_summary(round.id).await.unwrap();
    assert_eq!(summary.total_score, 0);
    assert!(summary.best_player.is_none());
}

#[tokio::test]
async fn no_best_player_when_nobody_scored() {
    let setup = TestSetupBuilder::new()
        .with_players(vec![("u1", "alice"), ("u2", "Никита")])
        .build()
        .await;
    let round = setup.create_round().await;
    for user in ["u1", "u2"] {
        setup
            .score_service
            .register_participant(user, round.id)
            .await
            .unwrap();
    }

    start_round(&setup, &round);
    tap_times(&setup, &round, "u2", "survivor", 50).await;

    finish_round(&setup, &round);
    let summary = setup.score_service.get_summary(round.id).await.unwrap();
    assert_eq!(summary.total_score, 0);
    assert!(summary.best_player.is_none());
}

#[tokio::test]
async fn rounds_are_isolated_from_each_other() {
    let setup = TestSetupBuilder::new()
        .with_players(vec![("u1", "alice")])
        .build()
        .await;
    let first = setup.create_round().await;
    let second = setup.create_round().await;
    for round in [&first, &second] {
        setup
            .score_service
            .register_participant("u1", round.id)
            .await
            .unwrap();
    }

    start_round(&setup, &first);
    tap_times(&setup, &first, "u1", "survivor", 5).await;

    finish_round(&setup, &first);
    let first_summary = setup.score_service.get_summary(first.id).await.unwrap();
    let second_summary = setup.score_service.get_summary(second.id).await.unwrap();
    assert_eq!(first_summary.total_score, 5);
    assert_eq!(second_summary.total_score, 0);
}
