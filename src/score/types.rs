use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request payload for a tap
#[derive(Debug, Deserialize)]
pub struct TapRequest {
    pub uuid: Uuid, // Round id
}

/// Response for a tap: the caller's published score after it
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TapResponse {
    pub score: u64,
}
