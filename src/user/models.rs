use serde::{Deserialize, Serialize};

/// Authenticated caller, as asserted by the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

impl Identity {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
        }
    }
}

/// What the rest of the system knows about a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
}

/// The two independent participation gates plus the admin check.
///
/// A ghost role keeps its counter frozen. An excluded username still counts
/// taps privately but contributes nothing to the round summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRules {
    pub ghost_role: String,
    pub excluded_username: String,
    pub admin_role: String,
}

impl Default for ParticipantRules {
    fn default() -> Self {
        Self {
            ghost_role: "nikita".to_string(),
            excluded_username: "Никита".to_string(),
            admin_role: "admin".to_string(),
        }
    }
}

impl ParticipantRules {
    pub fn is_ghost_role(&self, role: &str) -> bool {
        role == self.ghost_role
    }

    pub fn is_excluded(&self, username: &str) -> bool {
        username == self.excluded_username
    }

    pub fn is_admin(&self, role: &str) -> bool {
        role == self.admin_role
    }
}
