use serde::{Deserialize, Serialize};

use crate::betting::BettingMode;
use crate::cards::Card;
use crate::game::Stage;
use crate::player::{Player, PlayerId};
use crate::run_it_twice::RunItTwiceState;
use crate::variant::Variant;

/// Outcome of a settled hand for one player.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandResult {
    pub player_id: PlayerId,
    pub description: String,
    /// Hand category (0 high card .. 8 straight flush); `None` without a showdown.
    pub strength_rank: Option<u8>,
    pub win_amount: u64,
}

/// Authoritative state of one table, serializable as a client snapshot.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub table_id: String,
    pub variant: Variant,
    pub betting_mode: BettingMode,
    pub stage: Stage,
    /// Seated players, ordered by seat.
    pub players: Vec<Player>,
    pub active_player: Option<PlayerId>,
    /// Chips already swept in from finished betting rounds.
    pub pot: u64,
    pub community_cards: Vec<Card>,
    /// Highest total bet of the current round.
    pub current_bet: u64,
    pub min_raise: u64,
    /// Seat of the dealer button.
    pub dealer_position: usize,
    pub small_blind: u64,
    pub big_blind: u64,
    pub hand_number: u64,
    #[serde(default)]
    pub results: Vec<HandResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_it_twice: Option<RunItTwiceState>,
}

impl TableState {
    /// `Σ stack + pot + Σ current_bet`; constant for the whole hand.
    pub fn total_chips(&self) -> u64 {
        self.players
            .iter()
            .map(|p| p.stack + p.current_bet)
            .sum::<u64>()
            + self.pot
    }

    /// Sum of every player's `current_bet`.
    pub fn pending_bets(&self) -> u64 {
        self.players.iter().map(|p| p.current_bet).sum()
    }

    pub fn index_of(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn players_in_hand(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.in_hand())
    }

    pub fn hand_in_progress(&self) -> bool {
        self.stage.is_betting()
    }

    /// Betting is closed but the board is not complete: the hand waits for
    /// the remaining streets (or a run-it-twice) to be dealt.
    pub fn awaiting_runout(&self) -> bool {
        self.hand_in_progress() && self.active_player.is_none()
    }
}
