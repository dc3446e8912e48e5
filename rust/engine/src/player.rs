use serde::{Deserialize, Serialize};

use crate::cards::Card;

pub type PlayerId = String;

/// Default per-player time bank, in seconds.
pub const DEFAULT_TIME_BANK_SECS: u32 = 30;

/// The kinds of action a player can submit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Fold and forfeit the hand
    Fold,
    /// Check (no bet, only valid if no bet to call)
    Check,
    /// Call the current bet
    Call,
    /// Open the betting round
    Bet,
    /// Raise an existing bet
    Raise,
}

/// A player action as submitted by the orchestrator.
///
/// `amount` is the intended new total bet for this betting round, not the
/// number of chips added. Only `bet` and `raise` need it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub player_id: PlayerId,
    #[serde(default)]
    pub amount: Option<u64>,
    /// Milliseconds since the Unix epoch, as stamped by the caller.
    #[serde(default)]
    pub timestamp: i64,
}

impl PlayerAction {
    pub fn new(kind: ActionKind, player_id: impl Into<PlayerId>) -> Self {
        Self {
            kind,
            player_id: player_id.into(),
            amount: None,
            timestamp: 0,
        }
    }

    pub fn fold(player_id: impl Into<PlayerId>) -> Self {
        Self::new(ActionKind::Fold, player_id)
    }

    pub fn check(player_id: impl Into<PlayerId>) -> Self {
        Self::new(ActionKind::Check, player_id)
    }

    pub fn call(player_id: impl Into<PlayerId>) -> Self {
        Self::new(ActionKind::Call, player_id)
    }

    pub fn bet(player_id: impl Into<PlayerId>, amount: u64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::new(ActionKind::Bet, player_id)
        }
    }

    pub fn raise(player_id: impl Into<PlayerId>, amount: u64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::new(ActionKind::Raise, player_id)
        }
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Seat assignment supplied when the engine is built.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeatedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub stack: u64,
    pub seat: usize,
}

impl SeatedPlayer {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, stack: u64, seat: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stack,
            seat,
        }
    }
}

/// A player at the table. Owned and mutated only by the engine.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub seat: usize,
    pub stack: u64,
    /// Chips committed this betting round, not yet swept into the pot.
    pub current_bet: u64,
    /// Chips committed over the whole hand, blinds included.
    pub total_contributed: u64,
    /// Every card dealt to the player, face-down and face-up.
    pub hole_cards: Vec<Card>,
    /// The face-up subset of `hole_cards` (stud).
    #[serde(default)]
    pub up_cards: Vec<Card>,
    pub is_folded: bool,
    pub is_all_in: bool,
    pub has_acted: bool,
    pub time_bank: u32,
    /// Dealt out of the current hand (no chips at the start of it).
    #[serde(default)]
    pub sitting_out: bool,
    /// Left the table; dropped from the roster before the next hand.
    #[serde(default)]
    pub departed: bool,
}

impl Player {
    pub fn new(seat: &SeatedPlayer, time_bank: u32) -> Self {
        Self {
            id: seat.id.clone(),
            name: seat.name.clone(),
            seat: seat.seat,
            stack: seat.stack,
            current_bet: 0,
            total_contributed: 0,
            hole_cards: Vec::new(),
            up_cards: Vec::new(),
            is_folded: false,
            is_all_in: false,
            has_acted: false,
            time_bank,
            sitting_out: false,
            departed: false,
        }
    }

    /// Still contesting the pot.
    pub fn in_hand(&self) -> bool {
        !self.is_folded
    }

    /// Still contesting the pot and able to put in more chips.
    pub fn can_act(&self) -> bool {
        !self.is_folded && !self.is_all_in
    }

    /// Moves up to `amount` chips from the stack into `current_bet`.
    /// Returns the chips actually committed; emptying the stack sets all-in.
    pub fn commit(&mut self, amount: u64) -> u64 {
        let actual = amount.min(self.stack);
        self.stack -= actual;
        self.current_bet += actual;
        self.total_contributed += actual;
        if self.stack == 0 && actual > 0 {
            self.is_all_in = true;
        }
        actual
    }

    pub fn give_card(&mut self, card: Card, face_up: bool) {
        self.hole_cards.push(card);
        if face_up {
            self.up_cards.push(card);
        }
    }

    pub fn add_chips(&mut self, amount: u64) {
        self.stack = self.stack.saturating_add(amount);
    }

    /// Clears everything that only lives for one hand. The stack is kept.
    pub fn reset_for_hand(&mut self) {
        self.current_bet = 0;
        self.total_contributed = 0;
        self.hole_cards.clear();
        self.up_cards.clear();
        self.is_all_in = false;
        self.has_acted = false;
        self.sitting_out = self.stack == 0;
        self.is_folded = self.sitting_out;
    }
}
