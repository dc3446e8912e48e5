//! Multi-board settlement for all-in confrontations.
//!
//! The resolver is pure: it builds boards and per-run distributions from a
//! snapshot and leaves committing chips to the engine. Each run settles its
//! own slice of every pot layer through [`PotCalculator`], so the odd-chip
//! rule and eligibility are the same as for a single board.

use std::collections::BTreeMap;
use std::error::Error;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::{EngineFault, GameError, GameResult};
use crate::game::{GameStateManager, Stage};
use crate::player::PlayerId;
use crate::pot::{verify_conservation, AwardKind, Contribution, PotCalculator};
use crate::table::TableState;

/// Hook invoked once per settled run. Failures are logged and ignored.
pub type PersistenceCallback =
    Box<dyn FnMut(&RunRecord) -> Result<(), Box<dyn Error + Send + Sync>> + Send>;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunWinner {
    pub player_id: PlayerId,
    pub amount: u64,
    pub kind: AwardKind,
    /// Best hand on this run's board.
    pub description: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// 1-based board number.
    pub board_number: usize,
    pub community_cards: Vec<Card>,
    pub winners: Vec<RunWinner>,
    /// This run's share of the pot.
    pub pot_amount: u64,
}

/// What the persistence hook receives for one run.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub hand_id: String,
    pub board_number: usize,
    pub community_cards: Vec<Card>,
    pub winners: Vec<RunWinner>,
    pub pot_amount: u64,
}

impl RunRecord {
    pub fn new(hand_id: &str, run: &RunResult) -> Self {
        Self {
            hand_id: hand_id.to_string(),
            board_number: run.board_number,
            community_cards: run.community_cards.clone(),
            winners: run.winners.clone(),
            pot_amount: run.pot_amount,
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunItTwiceState {
    pub enabled: bool,
    pub runs_requested: usize,
    /// Seed each board was shuffled with.
    pub seeds: Vec<u64>,
    /// Full boards, one per run, already-dealt cards included.
    pub boards: Vec<Vec<Card>>,
    #[serde(default)]
    pub results: Vec<RunResult>,
    /// Chips won per player across every run.
    #[serde(default)]
    pub pot_distribution: BTreeMap<PlayerId, u64>,
}

impl RunItTwiceState {
    pub fn is_resolved(&self) -> bool {
        !self.results.is_empty()
    }
}

/// Checks that the hand is an all-in standoff with cards still to come and
/// that `runs` is between 2 and the number of players in the hand.
pub fn check_eligibility(state: &TableState, runs: usize) -> GameResult<()> {
    let gsm = GameStateManager::for_state(state);
    let rules = gsm.rules();
    match state.stage {
        Stage::Waiting => return Err(GameError::NoHandInProgress),
        Stage::Showdown => return Err(GameError::HandAlreadySettled),
        _ => {}
    }
    if !rules.uses_board() {
        return Err(GameError::rit(format!("{} has no shared board", rules.name())));
    }
    if state.community_cards.len() >= rules.board_size() {
        return Err(GameError::rit("the board is already complete"));
    }

    let live: Vec<_> = state.players_in_hand().collect();
    if live.len() < 2 {
        return Err(GameError::rit("fewer than two players remain"));
    }
    if !live.iter().any(|p| p.is_all_in) {
        return Err(GameError::rit("nobody is all-in"));
    }
    if live.iter().filter(|p| !p.is_all_in).count() > 1 {
        return Err(GameError::rit("more than one player can still bet"));
    }
    let owes = live
        .iter()
        .any(|p| !p.is_all_in && p.current_bet < state.current_bet);
    if state.active_player.is_some() || owes {
        return Err(GameError::rit("betting is still open"));
    }

    if runs < 2 || runs > live.len() {
        return Err(GameError::rit(format!(
            "runs must be between 2 and {}, got {runs}",
            live.len()
        )));
    }
    Ok(())
}

/// Completes `community` once per seed. Each board draws its missing cards
/// from its own shuffle of `undealt`, so boards are independent of each
/// other and of the live deck.
pub fn generate_boards(
    community: &[Card],
    undealt: &[Card],
    board_size: usize,
    seeds: &[u64],
) -> Result<Vec<Vec<Card>>, EngineFault> {
    let missing = board_size.saturating_sub(community.len());
    if undealt.len() < missing {
        tracing::error!(missing, remaining = undealt.len(), "not enough cards to run the board");
        return Err(EngineFault::DeckExhausted {
            needed: missing,
            remaining: undealt.len(),
        });
    }
    Ok(seeds
        .iter()
        .map(|&seed| {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let mut pool = undealt.to_vec();
            pool.shuffle(&mut rng);
            let mut board = community.to_vec();
            board.extend_from_slice(&pool[..missing]);
            board
        })
        .collect())
}

/// Settles every board. The runs together hand out exactly the chips the
/// players wagered.
pub fn resolve(state: &TableState, boards: &[Vec<Card>]) -> Result<Vec<RunResult>, EngineFault> {
    let gsm = GameStateManager::for_state(state);
    let rules = gsm.rules();
    let contributions = Contribution::from_players(&state.players);
    let calc = PotCalculator::from_contributions(&contributions);
    let runs = boards.len();

    let mut results = Vec::with_capacity(runs);
    let mut distributed = 0u64;
    for (run, board) in boards.iter().enumerate() {
        let pots = calc.for_run(run, runs);
        let dist = PotCalculator::distribute(&pots, |eligible| {
            gsm.showdown_winners(&state.players, board, eligible)
        });
        distributed += dist.total();

        let mut winners: Vec<RunWinner> = Vec::new();
        for award in &dist.awards {
            if let Some(w) = winners
                .iter_mut()
                .find(|w| w.player_id == award.player_id && w.kind == award.kind)
            {
                w.amount += award.amount;
                continue;
            }
            let description = state
                .player(&award.player_id)
                .and_then(|p| match award.kind {
                    AwardKind::Low => rules
                        .evaluate_low(&p.hole_cards, board)
                        .map(|low| low.describe()),
                    _ => Some(rules.evaluate_high(&p.hole_cards, board).describe()),
                })
                .unwrap_or_default();
            winners.push(RunWinner {
                player_id: award.player_id.clone(),
                amount: award.amount,
                kind: award.kind,
                description,
            });
        }

        results.push(RunResult {
            board_number: run + 1,
            community_cards: board.clone(),
            winners,
            pot_amount: pots.iter().map(|p| p.amount).sum(),
        });
    }

    verify_conservation(calc.wagered(), distributed)?;
    Ok(results)
}

/// Per-player totals across runs.
pub fn aggregate(results: &[RunResult]) -> BTreeMap<PlayerId, u64> {
    let mut totals = BTreeMap::new();
    for w in results.iter().flat_map(|r| &r.winners) {
        *totals.entry(w.player_id.clone()).or_insert(0) += w.amount;
    }
    totals
}
