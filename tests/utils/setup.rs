use chrono::{TimeZone, Utc};
use std::sync::Arc;

use tapround::{
    clock::ManualClock,
    round::{InMemoryRoundRepository, RoundModel, RoundService, RoundSettings},
    score::{InMemoryScoreRepository, ScoreService},
    user::{InMemoryUserDirectory, ParticipantRules, UserDirectory, UserProfile},
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub clock: Arc<ManualClock>,
    pub round_service: Arc<RoundService>,
    pub score_service: Arc<ScoreService>,
    pub settings: RoundSettings,
}

impl TestSetup {
    pub async fn create_round(&self) -> RoundModel {
        self.round_service
            .create_round(self.settings)
            .await
            .expect("round creation should succeed")
    }
}

pub struct TestSetupBuilder {
    players: Vec<(String, String)>, // (user_id, username)
    settings: RoundSettings,
    rules: ParticipantRules,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            settings: RoundSettings::from_secs(60, 300),
            rules: ParticipantRules::default(),
        }
    }

    pub fn with_players(mut self, players: Vec<(&str, &str)>) -> Self {
        self.players = players
            .into_iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        self
    }

    #[allow(dead_code)]
    pub fn with_rules(mut self, rules: ParticipantRules) -> Self {
        self.rules = rules;
        self
    }

    pub async fn build(self) -> TestSetup {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap(),
        ));
        let rounds = Arc::new(InMemoryRoundRepository::new());
        let users = Arc::new(InMemoryUserDirectory::new());

        for (user_id, username) in &self.players {
            users
                .upsert(&UserProfile {
                    user_id: user_id.clone(),
                    username: username.clone(),
                })
                .await
                .unwrap();
        }

        let round_service = Arc::new(RoundService::new(rounds.clone(), clock.clone()));
        let score_service = Arc::new(ScoreService::new(
            rounds,
            Arc::new(InMemoryScoreRepository::new()),
            users,
            self.rules,
            clock.clone(),
        ));

        TestSetup {
            clock,
            round_service,
            score_service,
            settings: self.settings,
        }
    }
}
