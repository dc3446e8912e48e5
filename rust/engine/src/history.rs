use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::betting::BettingMode;
use crate::cards::Card;
use crate::game::Stage;
use crate::player::{PlayerAction, PlayerId};
use crate::table::HandResult;
use crate::variant::Variant;

/// A single accepted player action.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Stage in which the action happened
    pub stage: Stage,
    pub action: PlayerAction,
    /// Chips moved from the stack by this action.
    pub committed: u64,
    /// The player's round total afterwards.
    pub total_bet: u64,
    pub all_in: bool,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlindPost {
    pub player_id: PlayerId,
    pub amount: u64,
}

/// Complete record of one hand, built by the engine while the hand runs.
/// Serialized one object per line for external hand-history writers.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    /// Unique identifier for this hand (format: YYYYMMDD-NNNNNN)
    pub hand_id: String,
    pub table_id: String,
    pub hand_number: u64,
    /// Seed the deck was shuffled with; replays the deal exactly.
    pub seed: Option<u64>,
    pub variant: Variant,
    pub betting_mode: BettingMode,
    pub dealer_seat: usize,
    pub blinds: Vec<BlindPost>,
    /// Chronological list of accepted actions
    pub actions: Vec<ActionRecord>,
    /// Community cards dealt on the live board
    pub board: Vec<Card>,
    /// Extra boards when the hand was run more than once.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_boards: Vec<Vec<Card>>,
    #[serde(default)]
    pub results: Vec<HandResult>,
    /// Settlement time (RFC3339); unset while the hand runs.
    #[serde(default)]
    pub ts: Option<String>,
}

impl HandRecord {
    pub fn is_complete(&self) -> bool {
        self.ts.is_some()
    }

    pub fn stamp(&mut self) {
        self.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub fn format_hand_id(yyyymmdd: &str, seq: u64) -> String {
    format!("{}-{:06}", yyyymmdd, seq)
}

/// Hand id for hand `seq` played today (UTC).
pub fn hand_id_for_today(seq: u64) -> String {
    format_hand_id(&Utc::now().format("%Y%m%d").to_string(), seq)
}
