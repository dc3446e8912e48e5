use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{GameError, GameResult};
use crate::player::{ActionKind, Player, PlayerAction};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BettingMode {
    #[default]
    NoLimit,
    PotLimit,
}

impl BettingMode {
    pub fn id(self) -> &'static str {
        match self {
            BettingMode::NoLimit => "no-limit",
            BettingMode::PotLimit => "pot-limit",
        }
    }
}

impl fmt::Display for BettingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BettingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no-limit" => Ok(BettingMode::NoLimit),
            "pot-limit" => Ok(BettingMode::PotLimit),
            other => Err(format!("unknown betting mode '{other}'")),
        }
    }
}

/// Table-level betting facts an action is judged against.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct BettingContext<'a> {
    /// Player whose turn it is.
    pub active_player: Option<&'a str>,
    /// Highest total bet in the current round.
    pub current_bet: u64,
    /// Smallest legal raise increment.
    pub min_raise: u64,
    /// Chips already swept into the pot.
    pub pot: u64,
    /// Sum of every player's `current_bet` this round.
    pub pending: u64,
}

/// An action after validation, carrying the player's resulting round total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatedAction {
    Fold,
    Check,
    Call(u64),
    Bet(u64),
    Raise(u64),
    AllIn(u64),
}

/// What applying an action changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Chips moved from the stack into `current_bet`.
    pub added: u64,
    /// The player's `current_bet` afterwards.
    pub new_total: u64,
    /// How far the table's current bet went up.
    pub raise_increment: u64,
    /// The increment was at least a full minimum raise.
    pub full_raise: bool,
    pub went_all_in: bool,
}

/// Bounds for the acting player, derived from the same arithmetic as
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalActions {
    pub can_check: bool,
    /// Chips needed to call, already clamped to the stack.
    pub call_amount: u64,
    /// Whether a bet or raise is possible at all.
    pub can_raise: bool,
    /// Smallest legal bet/raise total (all-in total if that is smaller).
    pub min_raise_to: u64,
    /// Largest legal bet/raise total.
    pub max_raise_to: u64,
}

/// Pure betting arithmetic for one table configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BettingManager {
    pub small_blind: u64,
    pub big_blind: u64,
    pub mode: BettingMode,
}

impl BettingManager {
    pub fn new(small_blind: u64, big_blind: u64, mode: BettingMode) -> Self {
        Self {
            small_blind,
            big_blind,
            mode,
        }
    }

    /// Posts both blinds, each clamped to the poster's stack.
    /// Returns the chips actually posted as `(small, big)`.
    pub fn post_blinds(&self, players: &mut [Player], small: usize, big: usize) -> (u64, u64) {
        let sb = players[small].commit(self.small_blind);
        let bb = players[big].commit(self.big_blind);
        (sb, bb)
    }

    /// Largest total a pot-limit player may bet or raise to: the current
    /// bet plus the pot as it would stand after the player's call.
    pub fn pot_limit_cap(&self, player: &Player, ctx: &BettingContext<'_>) -> u64 {
        let to_call = ctx.current_bet.saturating_sub(player.current_bet);
        ctx.current_bet + ctx.pot + ctx.pending + to_call
    }

    fn max_total(&self, player: &Player, ctx: &BettingContext<'_>) -> u64 {
        let all_in = player.current_bet + player.stack;
        match self.mode {
            BettingMode::NoLimit => all_in,
            BettingMode::PotLimit => all_in.min(self.pot_limit_cap(player, ctx)),
        }
    }

    pub fn validate(
        &self,
        player: &Player,
        action: &PlayerAction,
        ctx: &BettingContext<'_>,
    ) -> GameResult<ValidatedAction> {
        if ctx.active_player != Some(player.id.as_str()) || action.player_id != player.id {
            return Err(GameError::NotYourTurn {
                expected: ctx.active_player.map(str::to_string),
                actual: action.player_id.clone(),
            });
        }
        if !player.can_act() {
            return Err(GameError::invalid("player cannot act in this hand"));
        }

        let to_call = ctx.current_bet.saturating_sub(player.current_bet);
        let all_in_total = player.current_bet + player.stack;

        match action.kind {
            ActionKind::Fold => Ok(ValidatedAction::Fold),
            ActionKind::Check => {
                if to_call == 0 {
                    Ok(ValidatedAction::Check)
                } else {
                    Err(GameError::invalid(format!(
                        "cannot check facing a bet of {}",
                        ctx.current_bet
                    )))
                }
            }
            ActionKind::Call => {
                if to_call == 0 {
                    Err(GameError::invalid("nothing to call"))
                } else if player.stack <= to_call {
                    Ok(ValidatedAction::AllIn(all_in_total))
                } else {
                    Ok(ValidatedAction::Call(ctx.current_bet))
                }
            }
            ActionKind::Bet | ActionKind::Raise => {
                // a full raise clears has_acted, so an acted player is only
                // ever facing short all-ins here
                if player.has_acted {
                    return Err(GameError::invalid(
                        "a short all-in does not re-open the betting; call or fold",
                    ));
                }
                let is_bet = action.kind == ActionKind::Bet;
                if is_bet && ctx.current_bet > 0 {
                    return Err(GameError::invalid("a bet is already open, raise instead"));
                }
                if !is_bet && ctx.current_bet == 0 {
                    return Err(GameError::invalid("nothing to raise, bet instead"));
                }
                let requested = action
                    .amount
                    .ok_or_else(|| GameError::invalid("bet and raise need an amount"))?;
                let target = requested.min(self.max_total(player, ctx));
                if target == all_in_total {
                    return Ok(ValidatedAction::AllIn(all_in_total));
                }
                if target <= ctx.current_bet {
                    return Err(GameError::invalid(format!(
                        "raise must exceed the current bet of {}",
                        ctx.current_bet
                    )));
                }
                let minimum = ctx.current_bet + ctx.min_raise;
                if target < minimum {
                    return Err(GameError::invalid(format!(
                        "minimum {} is to {minimum}",
                        if is_bet { "bet" } else { "raise" }
                    )));
                }
                Ok(if is_bet {
                    ValidatedAction::Bet(target)
                } else {
                    ValidatedAction::Raise(target)
                })
            }
        }
    }

    /// Applies a validated action to the player.
    pub fn apply(
        &self,
        player: &mut Player,
        action: ValidatedAction,
        ctx: &BettingContext<'_>,
    ) -> ActionOutcome {
        player.has_acted = true;
        let target = match action {
            ValidatedAction::Fold => {
                // chips already in `current_bet` stay bound to the pot
                player.is_folded = true;
                return ActionOutcome {
                    new_total: player.current_bet,
                    ..ActionOutcome::default()
                };
            }
            ValidatedAction::Check => player.current_bet,
            ValidatedAction::Call(to)
            | ValidatedAction::Bet(to)
            | ValidatedAction::Raise(to)
            | ValidatedAction::AllIn(to) => to,
        };
        let added = player.commit(target.saturating_sub(player.current_bet));
        let raise_increment = player.current_bet.saturating_sub(ctx.current_bet);
        ActionOutcome {
            added,
            new_total: player.current_bet,
            raise_increment,
            full_raise: raise_increment > 0 && raise_increment >= ctx.min_raise,
            went_all_in: player.is_all_in,
        }
    }

    /// Validates and applies in one step. On error the player is untouched.
    pub fn process_action(
        &self,
        player: &mut Player,
        action: &PlayerAction,
        ctx: &BettingContext<'_>,
    ) -> GameResult<ActionOutcome> {
        let validated = self.validate(player, action, ctx)?;
        Ok(self.apply(player, validated, ctx))
    }

    pub fn legal_actions(&self, player: &Player, ctx: &BettingContext<'_>) -> LegalActions {
        let to_call = ctx.current_bet.saturating_sub(player.current_bet);
        let all_in_total = player.current_bet + player.stack;
        let max_raise_to = self.max_total(player, ctx);
        let min_raise_to = (ctx.current_bet + ctx.min_raise).min(all_in_total);
        LegalActions {
            can_check: to_call == 0,
            call_amount: to_call.min(player.stack),
            can_raise: player.can_act() && !player.has_acted && all_in_total > ctx.current_bet,
            min_raise_to,
            max_raise_to: max_raise_to.max(min_raise_to),
        }
    }
}
