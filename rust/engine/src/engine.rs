use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::betting::{BettingContext, BettingManager, BettingMode, LegalActions};
use crate::cards::Card;
use crate::config::{EngineConfig, TableConfig};
use crate::deck::{BoardStreet, Deck, RabbitPreview};
use crate::errors::{EngineFault, GameError, GameResult};
use crate::game::{GameStateManager, Stage};
use crate::history::{hand_id_for_today, ActionRecord, BlindPost, HandRecord};
use crate::player::{Player, PlayerAction, SeatedPlayer};
use crate::pot::{verify_conservation, Contribution, Distribution, PotCalculator, PotWinners};
use crate::run_it_twice::{
    aggregate, check_eligibility, generate_boards, resolve, PersistenceCallback, RunItTwiceState,
    RunRecord,
};
use crate::table::{HandResult, TableState};
use crate::variant::{rules_for, Variant, VariantRules};

/// Authoritative engine for one table.
///
/// Every mutating call runs to completion before returning. A rejected call
/// (any [`GameError`] other than [`GameError::Fault`]) leaves the table
/// exactly as it was.
///
/// # Examples
///
/// ```
/// use riverrun_engine::config::TableConfig;
/// use riverrun_engine::engine::PokerEngine;
/// use riverrun_engine::player::{PlayerAction, SeatedPlayer};
///
/// let config = TableConfig::new("t1", 5, 10).with_seed(7);
/// let seats = vec![
///     SeatedPlayer::new("a", "Alice", 500, 0),
///     SeatedPlayer::new("b", "Bob", 500, 1),
/// ];
/// let mut engine = PokerEngine::new(config, seats).unwrap();
/// engine.start_new_hand().unwrap();
///
/// // heads-up: the dealer posts the small blind and acts first
/// let first = engine.get_state().active_player.clone().unwrap();
/// engine.handle_action(PlayerAction::fold(first)).unwrap();
/// assert_eq!(engine.get_state().total_chips(), 1000);
/// ```
pub struct PokerEngine {
    state: TableState,
    /// Applied at the next `start_new_hand`.
    next_rules: EngineConfig,
    time_bank_secs: u32,
    deck: Deck,
    rng: Box<dyn RngCore + Send>,
    /// Table chips before the current hand's blinds.
    hand_start_chips: u64,
    record: Option<HandRecord>,
    persistence: Option<(String, PersistenceCallback)>,
}

impl fmt::Debug for PokerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PokerEngine")
            .field("state", &self.state)
            .field("next_rules", &self.next_rules)
            .field("deck_remaining", &self.deck.remaining())
            .field("persistence", &self.persistence.as_ref().map(|(id, _)| id))
            .finish_non_exhaustive()
    }
}

impl PokerEngine {
    pub fn new(config: TableConfig, seats: Vec<SeatedPlayer>) -> GameResult<Self> {
        config.validate().map_err(|e| GameError::InvalidSetup {
            reason: e.to_string(),
        })?;
        for (i, s) in seats.iter().enumerate() {
            if seats[..i].iter().any(|o| o.id == s.id) {
                return Err(GameError::InvalidSetup {
                    reason: format!("duplicate player id {}", s.id),
                });
            }
            if seats[..i].iter().any(|o| o.seat == s.seat) {
                return Err(GameError::InvalidSetup {
                    reason: format!("seat {} is taken twice", s.seat),
                });
            }
        }
        let rules = rules_for(config.engine.variant);
        if seats.len() > rules.max_players() {
            return Err(GameError::TooManyPlayers {
                variant: rules.name().to_string(),
                max: rules.max_players(),
                seated: seats.len(),
            });
        }

        let mut players: Vec<Player> = seats
            .iter()
            .map(|s| Player::new(s, config.time_bank_secs))
            .collect();
        players.sort_by_key(|p| p.seat);
        // the first rotation moves the button onto the lowest seat
        let dealer_position = players.last().map_or(0, |p| p.seat);

        let rng: Box<dyn RngCore + Send> = match config.seed {
            Some(seed) => Box::new(ChaCha20Rng::seed_from_u64(seed)),
            None => Box::new(ChaCha20Rng::from_os_rng()),
        };

        let state = TableState {
            table_id: config.table_id.clone(),
            variant: config.engine.variant,
            betting_mode: config.engine.betting_mode,
            stage: Stage::Waiting,
            players,
            active_player: None,
            pot: 0,
            community_cards: Vec::new(),
            current_bet: 0,
            min_raise: config.big_blind,
            dealer_position,
            small_blind: config.small_blind,
            big_blind: config.big_blind,
            hand_number: 0,
            results: Vec::new(),
            run_it_twice: None,
        };
        let hand_start_chips = state.total_chips();
        Ok(Self {
            state,
            next_rules: config.engine,
            time_bank_secs: config.time_bank_secs,
            deck: Deck::new(),
            rng,
            hand_start_chips,
            record: None,
            persistence: None,
        })
    }

    /// Replaces the randomness source used for hand seeds and run boards.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Replaces the deck, e.g. with [`Deck::stacked`].
    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.deck = deck;
        self
    }

    /// Read-only view of the table.
    pub fn get_state(&self) -> &TableState {
        &self.state
    }

    /// Owned copy of the table for serialization.
    pub fn snapshot(&self) -> TableState {
        self.state.clone()
    }

    /// Record of the current (or last finished) hand.
    pub fn hand_record(&self) -> Option<&HandRecord> {
        self.record.as_ref()
    }

    pub fn time_bank_secs(&self) -> u32 {
        self.time_bank_secs
    }

    pub fn set_variant(&mut self, variant: Variant) {
        self.next_rules.variant = variant;
        tracing::debug!(table_id = %self.state.table_id, %variant, "variant queued for next hand");
    }

    pub fn set_betting_mode(&mut self, mode: BettingMode) {
        self.next_rules.betting_mode = mode;
        tracing::debug!(table_id = %self.state.table_id, %mode, "betting mode queued for next hand");
    }

    /// Puts the button on `seat` between hands; the next hand rotates on
    /// from there. Lets a caller carry the button over from a previous
    /// engine instance.
    pub fn set_dealer_position(&mut self, seat: usize) -> GameResult<()> {
        if self.state.hand_in_progress() {
            return Err(GameError::HandInProgress);
        }
        self.state.dealer_position = seat;
        Ok(())
    }

    fn gsm(&self) -> GameStateManager {
        GameStateManager::for_state(&self.state)
    }

    fn betting(&self) -> BettingManager {
        BettingManager::new(
            self.state.small_blind,
            self.state.big_blind,
            self.state.betting_mode,
        )
    }

    /// Runs `f` and rolls the table, deck and hand record back if it fails.
    fn transact<T>(&mut self, f: impl FnOnce(&mut Self) -> GameResult<T>) -> GameResult<T> {
        let state = self.state.clone();
        let deck = self.deck.clone();
        let record = self.record.clone();
        let hand_start_chips = self.hand_start_chips;
        let res = f(self);
        if res.is_err() {
            self.state = state;
            self.deck = deck;
            self.record = record;
            self.hand_start_chips = hand_start_chips;
        }
        res
    }

    /// Rotates the button, shuffles, deals the first street, posts blinds
    /// and opens the first betting round.
    pub fn start_new_hand(&mut self) -> GameResult<()> {
        if self.state.hand_in_progress() {
            return Err(GameError::HandInProgress);
        }
        self.transact(Self::deal_new_hand)?;
        self.persistence = None;
        Ok(())
    }

    fn deal_new_hand(&mut self) -> GameResult<()> {
        self.state.variant = self.next_rules.variant;
        self.state.betting_mode = self.next_rules.betting_mode;
        self.state.players.retain(|p| !p.departed);

        let gsm = self.gsm();
        let rules = gsm.rules();
        if self.state.players.len() > rules.max_players() {
            return Err(GameError::TooManyPlayers {
                variant: rules.name().to_string(),
                max: rules.max_players(),
                seated: self.state.players.len(),
            });
        }
        gsm.reset_player_states(&mut self.state);
        if self.state.players.iter().filter(|p| !p.sitting_out).count() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }

        gsm.rotate_dealer_button(&mut self.state);
        self.state.hand_number += 1;
        self.state.stage = rules.first_stage();
        self.state.pot = 0;
        self.state.community_cards.clear();
        self.state.results.clear();
        self.state.run_it_twice = None;
        self.hand_start_chips = self.state.total_chips();

        let seed = self.rng.next_u64();
        self.deck.reset_deck(&mut ChaCha20Rng::seed_from_u64(seed));
        self.deal_stage_cards()?;

        let (small, big) = gsm
            .blind_positions(&self.state)
            .ok_or(GameError::NotEnoughPlayers)?;
        let (sb, bb) = self.betting().post_blinds(&mut self.state.players, small, big);
        self.state.current_bet = self.state.big_blind;
        self.state.min_raise = self.state.big_blind;

        let blinds = vec![
            BlindPost {
                player_id: self.state.players[small].id.clone(),
                amount: sb,
            },
            BlindPost {
                player_id: self.state.players[big].id.clone(),
                amount: bb,
            },
        ];
        self.record = Some(HandRecord {
            hand_id: hand_id_for_today(self.state.hand_number),
            table_id: self.state.table_id.clone(),
            hand_number: self.state.hand_number,
            seed: Some(seed),
            variant: self.state.variant,
            betting_mode: self.state.betting_mode,
            dealer_seat: self.state.dealer_position,
            blinds,
            actions: Vec::new(),
            board: Vec::new(),
            run_boards: Vec::new(),
            results: Vec::new(),
            ts: None,
        });

        tracing::info!(
            table_id = %self.state.table_id,
            hand_number = self.state.hand_number,
            variant = %self.state.variant,
            dealer = self.state.dealer_position,
            seed,
            "hand started"
        );

        gsm.start_betting_round(&mut self.state);
        if self.state.active_player.is_none() {
            // blinds alone put everyone but one player all-in
            self.close_betting_round()?;
        }
        Ok(())
    }

    /// Applies one player action. The only mutating entry point while
    /// betting is open.
    pub fn handle_action(&mut self, action: PlayerAction) -> GameResult<()> {
        match self.state.stage {
            Stage::Showdown => return Err(GameError::HandAlreadySettled),
            Stage::Waiting => return Err(GameError::NoHandInProgress),
            _ => {}
        }
        let idx = self
            .state
            .index_of(&action.player_id)
            .ok_or_else(|| GameError::PlayerNotFound(action.player_id.clone()))?;

        let bm = self.betting();
        let pending = self.state.pending_bets();
        let ctx = BettingContext {
            active_player: self.state.active_player.as_deref(),
            current_bet: self.state.current_bet,
            min_raise: self.state.min_raise,
            pot: self.state.pot,
            pending,
        };
        let validated = match bm.validate(&self.state.players[idx], &action, &ctx) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    table_id = %self.state.table_id,
                    player_id = %action.player_id,
                    error = %e,
                    "action rejected"
                );
                return Err(e);
            }
        };
        let ctx = BettingContext::<'static> {
            active_player: None,
            current_bet: ctx.current_bet,
            min_raise: ctx.min_raise,
            pot: ctx.pot,
            pending,
        };

        self.transact(|engine| {
            let outcome = bm.apply(&mut engine.state.players[idx], validated, &ctx);
            if outcome.new_total > engine.state.current_bet {
                engine.state.current_bet = outcome.new_total;
                if outcome.full_raise {
                    engine.state.min_raise = outcome.raise_increment;
                    for (i, p) in engine.state.players.iter_mut().enumerate() {
                        if i != idx {
                            p.has_acted = false;
                        }
                    }
                }
            }

            tracing::debug!(
                table_id = %engine.state.table_id,
                player_id = %action.player_id,
                stage = ?engine.state.stage,
                action = ?validated,
                added = outcome.added,
                all_in = outcome.went_all_in,
                "action applied"
            );
            if let Some(rec) = engine.record.as_mut() {
                rec.actions.push(ActionRecord {
                    stage: engine.state.stage,
                    action,
                    committed: outcome.added,
                    total_bet: outcome.new_total,
                    all_in: outcome.went_all_in,
                });
            }
            engine.progress(idx)
        })
    }

    /// Legal bounds for `player_id`, who must be the player to act.
    pub fn legal_actions(&self, player_id: &str) -> GameResult<LegalActions> {
        if !self.state.hand_in_progress() {
            return Err(GameError::NoHandInProgress);
        }
        let player = self
            .state
            .player(player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        if self.state.active_player.as_deref() != Some(player_id) {
            return Err(GameError::NotYourTurn {
                expected: self.state.active_player.clone(),
                actual: player_id.to_string(),
            });
        }
        let ctx = BettingContext {
            active_player: Some(player_id),
            current_bet: self.state.current_bet,
            min_raise: self.state.min_raise,
            pot: self.state.pot,
            pending: self.state.pending_bets(),
        };
        Ok(self.betting().legal_actions(player, &ctx))
    }

    /// Settles immediately when a single player is left in the hand.
    /// Returns whether it settled; calling it again is a no-op.
    pub fn ensure_win_by_fold_if_single(&mut self) -> GameResult<bool> {
        if !self.state.hand_in_progress() {
            return Ok(false);
        }
        match self.gsm().sole_survivor(&self.state) {
            Some(winner) => self.transact(|engine| engine.settle_by_fold(winner)).map(|_| true),
            None => Ok(false),
        }
    }

    /// Removes a player. During a hand the player is folded (chips already
    /// wagered stay in the pot) and leaves the roster when the next hand
    /// starts.
    pub fn remove_player(&mut self, player_id: &str) -> GameResult<()> {
        let idx = self
            .state
            .index_of(player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        if !self.state.hand_in_progress() {
            self.state.players.remove(idx);
            tracing::info!(table_id = %self.state.table_id, player_id, "player left the table");
            return Ok(());
        }

        self.transact(|engine| {
            let was_folded = engine.state.players[idx].is_folded;
            let p = &mut engine.state.players[idx];
            p.departed = true;
            p.is_folded = true;
            tracing::info!(table_id = %engine.state.table_id, player_id, "player left mid-hand");
            if was_folded {
                return Ok(());
            }
            if let Some(rec) = engine.record.as_mut() {
                rec.actions.push(ActionRecord {
                    stage: engine.state.stage,
                    action: PlayerAction::fold(player_id),
                    committed: 0,
                    total_bet: engine.state.players[idx].current_bet,
                    all_in: false,
                });
            }

            let gsm = engine.gsm();
            let active = engine
                .state
                .active_player
                .as_deref()
                .and_then(|id| engine.state.index_of(id));
            match active {
                Some(a)
                    if a != idx
                        && gsm.sole_survivor(&engine.state).is_none()
                        && gsm.needs_to_act(&engine.state, a) =>
                {
                    Ok(())
                }
                Some(a) => engine.progress(a),
                None if gsm.sole_survivor(&engine.state).is_some() => engine.progress(idx),
                None => Ok(()),
            }
        })
    }

    /// Deals the next street while an all-in runout is paused. Settles once
    /// the last street is out.
    pub fn reveal_next_street(&mut self) -> GameResult<()> {
        self.require_runout()?;
        self.transact(Self::deal_runout_street)
    }

    /// Deals every remaining street of a paused all-in runout and settles.
    pub fn run_out(&mut self) -> GameResult<()> {
        self.require_runout()?;
        self.transact(|engine| {
            while engine.state.awaiting_runout() {
                engine.deal_runout_street()?;
            }
            Ok(())
        })
    }

    fn require_runout(&self) -> GameResult<()> {
        match self.state.stage {
            Stage::Showdown => Err(GameError::HandAlreadySettled),
            Stage::Waiting => Err(GameError::NoHandInProgress),
            _ if !self.state.awaiting_runout() => {
                Err(GameError::invalid("betting is still open on this street"))
            }
            _ => Ok(()),
        }
    }

    fn deal_runout_street(&mut self) -> GameResult<()> {
        if self.state.run_it_twice.take().is_some() {
            tracing::debug!(
                table_id = %self.state.table_id,
                "run it twice boards discarded by a live street"
            );
        }
        let gsm = self.gsm();
        let stage = gsm.move_to_next_stage(&mut self.state);
        self.deal_stage_cards()?;
        tracing::debug!(table_id = %self.state.table_id, ?stage, "runout street dealt");
        if gsm.rules().next_stage(stage) == Stage::Showdown {
            self.settle_showdown()?;
        }
        Ok(())
    }

    /// Validates an all-in standoff and prepares `runs` boards. Without
    /// `seeds` each board's seed is drawn from the engine's randomness.
    pub fn enable_run_it_twice(
        &mut self,
        runs: usize,
        seeds: Option<Vec<u64>>,
    ) -> GameResult<&RunItTwiceState> {
        check_eligibility(&self.state, runs)?;
        let seeds = match seeds {
            Some(s) if s.len() != runs => {
                return Err(GameError::rit(format!(
                    "{} seed(s) given for {runs} runs",
                    s.len()
                )))
            }
            Some(s) => s,
            None => (0..runs).map(|_| self.rng.next_u64()).collect(),
        };
        let board_size = self.gsm().rules().board_size();
        let boards = generate_boards(
            &self.state.community_cards,
            self.deck.undealt(),
            board_size,
            &seeds,
        )?;
        tracing::info!(table_id = %self.state.table_id, runs, ?seeds, "run it twice enabled");
        let rit = self.state.run_it_twice.insert(RunItTwiceState {
            enabled: true,
            runs_requested: runs,
            seeds,
            boards,
            results: Vec::new(),
            pot_distribution: Default::default(),
        });
        Ok(&*rit)
    }

    /// Settles the hand on every prepared board and ends it.
    pub fn run_it_twice_now(&mut self) -> GameResult<()> {
        if self.state.stage == Stage::Showdown {
            return Err(GameError::HandAlreadySettled);
        }
        let community = &self.state.community_cards;
        let (runs, boards) = match &self.state.run_it_twice {
            Some(rit) if rit.enabled && rit.boards.iter().all(|b| b.starts_with(community)) => {
                (rit.runs_requested, rit.boards.clone())
            }
            _ => return Err(GameError::RunItTwiceNotEnabled),
        };
        check_eligibility(&self.state, runs)?;

        self.transact(|engine| {
            engine.gsm().sweep_bets(&mut engine.state);
            let results = resolve(&engine.state, &boards)?;
            let totals = aggregate(&results);
            let paid: u64 = totals.values().sum();
            verify_conservation(engine.state.pot, paid)?;

            let rules = engine.gsm().rules();
            let first_board = boards.first().cloned().unwrap_or_default();
            let mut hand_results = Vec::new();
            for p in engine.state.players.iter_mut() {
                let won = totals.get(&p.id).copied().unwrap_or(0);
                p.add_chips(won);
                if p.in_hand() {
                    hand_results.push(showdown_result(rules, p, &first_board, won));
                }
            }
            engine.state.pot = 0;
            if let Some(rit) = engine.state.run_it_twice.as_mut() {
                rit.results = results;
                rit.pot_distribution = totals;
            }
            if let Some(rec) = engine.record.as_mut() {
                rec.run_boards = boards.clone();
            }
            engine.finish_hand(hand_results)
        })?;

        tracing::info!(table_id = %self.state.table_id, runs, "hand settled over multiple boards");
        self.notify_persistence();
        Ok(())
    }

    /// Registers the hook called once per run board after the current hand
    /// settles. It is dropped when the next hand starts.
    pub fn configure_run_it_twice_persistence(
        &mut self,
        hand_id: impl Into<String>,
        callback: PersistenceCallback,
    ) {
        self.persistence = Some((hand_id.into(), callback));
    }

    fn notify_persistence(&mut self) {
        let Some((hand_id, callback)) = self.persistence.as_mut() else {
            return;
        };
        let Some(rit) = self.state.run_it_twice.as_ref() else {
            return;
        };
        for run in &rit.results {
            let record = RunRecord::new(hand_id, run);
            match catch_unwind(AssertUnwindSafe(|| callback(&record))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(
                    hand_id = %hand_id,
                    board_number = run.board_number,
                    error = %e,
                    "run persistence failed"
                ),
                Err(_) => tracing::warn!(
                    hand_id = %hand_id,
                    board_number = run.board_number,
                    "run persistence panicked"
                ),
            }
        }
    }

    /// Fixes the undealt community cards of a hand that ended early so they
    /// can be shown without affecting the result.
    pub fn prepare_rabbit_hunt(&mut self) -> GameResult<RabbitPreview> {
        match self.state.stage {
            Stage::Showdown => {}
            Stage::Waiting => return Err(GameError::NoHandInProgress),
            _ => return Err(GameError::HandInProgress),
        }
        if !self.gsm().rules().uses_board() {
            return Err(GameError::invalid("rabbit hunting needs a shared board"));
        }
        let known: Vec<Card> = self
            .state
            .players
            .iter()
            .flat_map(|p| p.hole_cards.iter().copied())
            .collect();
        let preview = self
            .deck
            .prepare_rabbit_preview(&self.state.community_cards, &known)
            .inspect_err(|f| tracing::error!(fault = %f, "rabbit preview failed"))?;
        Ok(preview.clone())
    }

    /// Cards `street` would have shown, from the prepared preview.
    pub fn rabbit_hunt(&self, street: BoardStreet) -> GameResult<Vec<Card>> {
        self.deck
            .preview_rabbit_hunt(street)
            .ok_or_else(|| GameError::invalid("no rabbit hunt prepared for this hand"))
    }

    /// Moves the turn on from `from`, closing the round when nobody is left
    /// to act.
    fn progress(&mut self, from: usize) -> GameResult<()> {
        let gsm = self.gsm();
        if let Some(winner) = gsm.sole_survivor(&self.state) {
            return self.settle_by_fold(winner);
        }
        match gsm.find_next_active_player(&self.state, from) {
            Some(next) => {
                self.state.active_player = Some(self.state.players[next].id.clone());
                Ok(())
            }
            None => self.close_betting_round(),
        }
    }

    /// Advances streets until someone has to act, the runout pauses, or
    /// the hand reaches showdown.
    fn close_betting_round(&mut self) -> GameResult<()> {
        let gsm = self.gsm();
        loop {
            self.state.active_player = None;
            let last_stage = gsm.rules().next_stage(self.state.stage) == Stage::Showdown;
            if last_stage {
                return self.settle_showdown();
            }
            if !gsm.betting_possible(&self.state) {
                gsm.sweep_bets(&mut self.state);
                tracing::debug!(
                    table_id = %self.state.table_id,
                    stage = ?self.state.stage,
                    "betting closed, awaiting runout"
                );
                return Ok(());
            }
            let stage = gsm.move_to_next_stage(&mut self.state);
            self.deal_stage_cards()?;
            gsm.start_betting_round(&mut self.state);
            tracing::debug!(table_id = %self.state.table_id, ?stage, "stage opened");
            if self.state.active_player.is_some() {
                return Ok(());
            }
        }
    }

    /// Deals what the current stage calls for, starting left of the button.
    fn deal_stage_cards(&mut self) -> GameResult<()> {
        let gsm = self.gsm();
        let plan = gsm.rules().deal_plan(self.state.stage);
        let n = self.state.players.len();
        let start = gsm.dealer_index(&self.state).unwrap_or(0);
        let order: Vec<usize> = (1..=n)
            .map(|k| (start + k) % n)
            .filter(|&i| self.state.players[i].in_hand())
            .collect();

        // all down cards go out before the up cards
        for round in 0..plan.down + plan.up {
            let face_up = round >= plan.down;
            for &i in &order {
                let card = self.draw()?;
                self.state.players[i].give_card(card, face_up);
            }
        }
        let board = self
            .deck
            .deal_cards(plan.community)
            .inspect_err(|f| tracing::error!(fault = %f, "deck exhausted mid-hand"))?;
        self.state.community_cards.extend(board);
        if let Some(rec) = self.record.as_mut() {
            rec.board = self.state.community_cards.clone();
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<Card, EngineFault> {
        self.deck
            .deal_card()
            .inspect_err(|f| tracing::error!(fault = %f, "deck exhausted mid-hand"))
    }

    fn settle_by_fold(&mut self, winner: usize) -> GameResult<()> {
        self.gsm().sweep_bets(&mut self.state);
        let contributions = Contribution::from_players(&self.state.players);
        let dist = PotCalculator::settle(&contributions, |eligible| PotWinners {
            high: eligible.to_vec(),
            low: Vec::new(),
        })?;
        self.pay_out(&dist)?;
        let winner = &self.state.players[winner];
        let results = vec![HandResult {
            player_id: winner.id.clone(),
            description: "Won uncontested".to_string(),
            strength_rank: None,
            win_amount: dist.amount_for(&winner.id),
        }];
        tracing::info!(
            table_id = %self.state.table_id,
            player_id = %winner.id,
            amount = dist.total(),
            "hand won by fold"
        );
        self.finish_hand(results)
    }

    fn settle_showdown(&mut self) -> GameResult<()> {
        let gsm = self.gsm();
        let rules = gsm.rules();
        gsm.sweep_bets(&mut self.state);
        let contributions = Contribution::from_players(&self.state.players);
        let dist = {
            let players = &self.state.players;
            let board = &self.state.community_cards;
            PotCalculator::settle(&contributions, |eligible| {
                gsm.showdown_winners(players, board, eligible)
            })?
        };
        self.pay_out(&dist)?;

        let board = &self.state.community_cards;
        let results: Vec<HandResult> = self
            .state
            .players
            .iter()
            .filter(|p| p.in_hand())
            .map(|p| showdown_result(rules, p, board, dist.amount_for(&p.id)))
            .collect();
        tracing::info!(
            table_id = %self.state.table_id,
            pot = dist.total(),
            winners = ?dist.per_player(),
            "hand settled at showdown"
        );
        self.finish_hand(results)
    }

    fn pay_out(&mut self, dist: &Distribution) -> GameResult<()> {
        for award in &dist.awards {
            let p = self
                .state
                .players
                .iter_mut()
                .find(|p| p.id == award.player_id)
                .ok_or(EngineFault::Internal("award for a player who is not seated"))?;
            p.add_chips(award.amount);
        }
        verify_conservation(self.state.pot, dist.total())?;
        self.state.pot = 0;
        Ok(())
    }

    /// Ends the hand and checks that the table holds exactly the chips it
    /// started the hand with.
    fn finish_hand(&mut self, results: Vec<HandResult>) -> GameResult<()> {
        let stacks: u64 = self.state.players.iter().map(|p| p.stack).sum();
        if stacks != self.hand_start_chips || self.state.pending_bets() != 0 {
            tracing::error!(
                table_id = %self.state.table_id,
                expected = self.hand_start_chips,
                stacks,
                "table chips changed over the hand"
            );
            return Err(EngineFault::ChipConservation {
                wagered: self.hand_start_chips,
                distributed: stacks,
            }
            .into());
        }
        self.state.stage = Stage::Showdown;
        self.state.active_player = None;
        self.state.current_bet = 0;
        for p in self.state.players.iter_mut() {
            p.has_acted = false;
        }
        if let Some(rec) = self.record.as_mut() {
            rec.results = results.clone();
            rec.stamp();
        }
        self.state.results = results;
        Ok(())
    }
}

/// Result line for a player who reached showdown; hi-lo variants append
/// the qualifying low.
fn showdown_result(
    rules: &dyn VariantRules,
    player: &Player,
    board: &[Card],
    win_amount: u64,
) -> HandResult {
    let strength = rules.evaluate_high(&player.hole_cards, board);
    let mut description = strength.describe();
    if let Some(low) = rules.evaluate_low(&player.hole_cards, board) {
        description = format!("{description} / {}", low.describe());
    }
    HandResult {
        player_id: player.id.clone(),
        description,
        strength_rank: Some(strength.rank()),
        win_amount,
    }
}
