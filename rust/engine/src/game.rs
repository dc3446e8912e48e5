use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::hand::{compare_hands, compare_low_hands, evaluate_hand};
use crate::player::{Player, PlayerId};
use crate::pot::PotWinners;
use crate::table::TableState;
use crate::variant::{rules_for, VariantRules};

/// Stage of a hand. Which stages a hand visits depends on the variant.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// No hand has been dealt yet
    Waiting,
    Preflop,
    Flop,
    Turn,
    River,
    SecondStreet,
    ThirdStreet,
    FourthStreet,
    FifthStreet,
    SixthStreet,
    SeventhStreet,
    /// Hand settled
    Showdown,
}

impl Stage {
    pub fn is_betting(self) -> bool {
        !matches!(self, Stage::Waiting | Stage::Showdown)
    }
}

/// Seating, turn order and stage sequencing for one variant.
///
/// All positions are indices into `TableState::players`, which is kept in
/// seat order.
#[derive(Debug, Clone, Copy)]
pub struct GameStateManager {
    rules: &'static dyn VariantRules,
}

impl GameStateManager {
    pub fn new(rules: &'static dyn VariantRules) -> Self {
        Self { rules }
    }

    pub fn for_state(state: &TableState) -> Self {
        Self::new(rules_for(state.variant))
    }

    pub fn rules(&self) -> &'static dyn VariantRules {
        self.rules
    }

    /// Whether `players[idx]` still has a decision to make this round.
    pub fn needs_to_act(&self, state: &TableState, idx: usize) -> bool {
        let p = &state.players[idx];
        if !p.can_act() {
            return false;
        }
        if p.current_bet < state.current_bet {
            return true;
        }
        // an unacted player only gets an option if someone can still respond
        !p.has_acted && can_act_count(&state.players) > 1
    }

    /// Next seat after `from` that still has to act, or `None` once the
    /// betting round is closed.
    pub fn find_next_active_player(&self, state: &TableState, from: usize) -> Option<usize> {
        let n = state.players.len();
        (1..=n)
            .map(|k| (from + k) % n)
            .find(|&idx| self.needs_to_act(state, idx))
    }

    pub fn is_betting_round_closed(&self, state: &TableState) -> bool {
        (0..state.players.len()).all(|idx| !self.needs_to_act(state, idx))
    }

    /// Advances to the next stage of the variant and returns it.
    pub fn move_to_next_stage(&self, state: &mut TableState) -> Stage {
        state.stage = self.rules.next_stage(state.stage);
        state.stage
    }

    /// Moves every round bet into the pot.
    pub fn sweep_bets(&self, state: &mut TableState) {
        for p in state.players.iter_mut() {
            state.pot += p.current_bet;
            p.current_bet = 0;
        }
        state.current_bet = 0;
    }

    /// Opens a betting round after the cards of `state.stage` are dealt.
    /// Blinds posted for the opening round stay live in `current_bet`.
    pub fn start_betting_round(&self, state: &mut TableState) {
        if state.stage != self.rules.first_stage() {
            self.sweep_bets(state);
        }
        for p in state.players.iter_mut() {
            p.has_acted = false;
        }
        state.min_raise = state.big_blind;
        state.active_player = self
            .first_to_act(state)
            .map(|idx| state.players[idx].id.clone());
    }

    /// First player to act in the current round, per variant rule.
    pub fn first_to_act(&self, state: &TableState) -> Option<usize> {
        let dealer = self.dealer_index(state)?;
        if state.stage == self.rules.first_stage() {
            let (_, big) = self.blind_positions(state)?;
            return self.find_next_active_player(state, big);
        }
        if self.rules.uses_board() {
            return self.find_next_active_player(state, dealer);
        }
        // later stud streets: best exposed cards open, ties go to the seat
        // nearest the dealer's left
        let n = state.players.len();
        let mut best: Option<usize> = None;
        for idx in (1..=n).map(|k| (dealer + k) % n) {
            if !self.needs_to_act(state, idx) {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => {
                    let showing = evaluate_hand(&state.players[idx].up_cards);
                    let leader = evaluate_hand(&state.players[b].up_cards);
                    compare_hands(&showing, &leader).is_gt()
                }
            };
            if better {
                best = Some(idx);
            }
        }
        best
    }

    pub fn dealer_index(&self, state: &TableState) -> Option<usize> {
        state
            .players
            .iter()
            .position(|p| p.seat == state.dealer_position)
    }

    /// Small and big blind indices. Heads-up the dealer posts the small blind.
    pub fn blind_positions(&self, state: &TableState) -> Option<(usize, usize)> {
        let dealer = self.dealer_index(state)?;
        let dealt_in = dealt_in_count(&state.players);
        if dealt_in < 2 {
            return None;
        }
        let small = if dealt_in == 2 {
            dealer
        } else {
            next_dealt_in(&state.players, dealer)?
        };
        let big = next_dealt_in(&state.players, small)?;
        Some((small, big))
    }

    /// Moves the button to the next seat holding a player who is dealt in.
    pub fn rotate_dealer_button(&self, state: &mut TableState) {
        let mut seats: Vec<usize> = state
            .players
            .iter()
            .filter(|p| !p.sitting_out && !p.departed)
            .map(|p| p.seat)
            .collect();
        seats.sort_unstable();
        let current = state.dealer_position;
        if let Some(&next) = seats
            .iter()
            .find(|&&s| s > current)
            .or_else(|| seats.first())
        {
            state.dealer_position = next;
        }
    }

    /// Clears per-hand flags and cards on every player. Stacks are kept.
    pub fn reset_player_states(&self, state: &mut TableState) {
        for p in state.players.iter_mut() {
            p.reset_for_hand();
        }
        state.active_player = None;
        state.current_bet = 0;
        state.min_raise = state.big_blind;
    }

    /// The single player left when everybody else folded.
    pub fn sole_survivor(&self, state: &TableState) -> Option<usize> {
        let mut live = state.players.iter().enumerate().filter(|(_, p)| p.in_hand());
        match (live.next(), live.next()) {
            (Some((idx, _)), None) => Some(idx),
            _ => None,
        }
    }

    /// High winners (and low winners for hi-lo variants) among `eligible`,
    /// judged on `board`.
    pub fn showdown_winners(
        &self,
        players: &[Player],
        board: &[Card],
        eligible: &[PlayerId],
    ) -> PotWinners {
        let contenders: Vec<&Player> = players
            .iter()
            .filter(|p| eligible.contains(&p.id))
            .collect();

        let mut high: Vec<PlayerId> = Vec::new();
        let mut best = None;
        for p in &contenders {
            let strength = self.rules.evaluate_high(&p.hole_cards, board);
            match best.as_ref().map(|b| compare_hands(&strength, b)) {
                None | Some(std::cmp::Ordering::Greater) => {
                    best = Some(strength);
                    high = vec![p.id.clone()];
                }
                Some(std::cmp::Ordering::Equal) => high.push(p.id.clone()),
                Some(std::cmp::Ordering::Less) => {}
            }
        }

        let mut low: Vec<PlayerId> = Vec::new();
        if self.rules.is_hi_lo() {
            let mut best_low = None;
            for p in &contenders {
                let Some(lo) = self.rules.evaluate_low(&p.hole_cards, board) else {
                    continue;
                };
                match best_low.as_ref().map(|b| compare_low_hands(&lo, b)) {
                    None | Some(std::cmp::Ordering::Greater) => {
                        best_low = Some(lo);
                        low = vec![p.id.clone()];
                    }
                    Some(std::cmp::Ordering::Equal) => low.push(p.id.clone()),
                    Some(std::cmp::Ordering::Less) => {}
                }
            }
        }
        PotWinners { high, low }
    }

    /// More betting can still happen on later streets.
    pub fn betting_possible(&self, state: &TableState) -> bool {
        can_act_count(&state.players) >= 2
    }
}

fn can_act_count(players: &[Player]) -> usize {
    players.iter().filter(|p| p.can_act()).count()
}

fn dealt_in_count(players: &[Player]) -> usize {
    players.iter().filter(|p| !p.sitting_out).count()
}

fn next_dealt_in(players: &[Player], from: usize) -> Option<usize> {
    let n = players.len();
    (1..=n)
        .map(|k| (from + k) % n)
        .find(|&idx| !players[idx].sitting_out)
}
