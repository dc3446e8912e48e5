mod common;

use common::{engine, rigged, seats};
use riverrun_engine::config::TableConfig;
use riverrun_engine::engine::PokerEngine;
use riverrun_engine::errors::GameError;
use riverrun_engine::game::Stage;
use riverrun_engine::player::{PlayerAction, SeatedPlayer};
use riverrun_engine::variant::Variant;

fn check_or_call(engine: &mut PokerEngine) {
    while let Some(actor) = engine.get_state().active_player.clone() {
        let legal = engine.legal_actions(&actor).unwrap();
        let action = if legal.can_check {
            PlayerAction::check(actor)
        } else {
            PlayerAction::call(actor)
        };
        engine.handle_action(action).unwrap();
    }
}

#[test]
fn first_hand_puts_button_on_lowest_seat() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 3);
    e.start_new_hand().unwrap();
    let s = e.get_state();
    assert_eq!(s.dealer_position, 0);
    assert_eq!(s.stage, Stage::Preflop);
    assert_eq!(s.player("b").unwrap().current_bet, 5);
    assert_eq!(s.player("c").unwrap().current_bet, 10);
    assert_eq!(s.active_player.as_deref(), Some("a"));
    assert_eq!(s.current_bet, 10);
    assert!(s.players.iter().all(|p| p.hole_cards.len() == 2));
    assert_eq!(s.total_chips(), 1500);
}

#[test]
fn heads_up_dealer_posts_small_blind_and_acts_first() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b"], 500, 3);
    e.start_new_hand().unwrap();
    let s = e.get_state();
    assert_eq!(s.dealer_position, 0);
    assert_eq!(s.player("a").unwrap().current_bet, 5);
    assert_eq!(s.player("b").unwrap().current_bet, 10);
    assert_eq!(s.active_player.as_deref(), Some("a"));
}

#[test]
fn checked_down_hand_reaches_showdown() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 11);
    e.start_new_hand().unwrap();
    check_or_call(&mut e);

    let s = e.get_state();
    assert_eq!(s.stage, Stage::Showdown);
    assert_eq!(s.community_cards.len(), 5);
    assert_eq!(s.pot, 0);
    assert_eq!(s.results.len(), 3);
    assert_eq!(s.results.iter().map(|r| r.win_amount).sum::<u64>(), 30);
    assert!(s.results.iter().all(|r| r.strength_rank.is_some()));
    assert_eq!(s.total_chips(), 1500);

    let err = e.handle_action(PlayerAction::check("a")).unwrap_err();
    assert_eq!(err, GameError::HandAlreadySettled);
}

#[test]
fn postflop_action_starts_left_of_button() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 5);
    e.start_new_hand().unwrap();
    e.handle_action(PlayerAction::call("a")).unwrap();
    e.handle_action(PlayerAction::call("b")).unwrap();
    e.handle_action(PlayerAction::check("c")).unwrap();

    let s = e.get_state();
    assert_eq!(s.stage, Stage::Flop);
    assert_eq!(s.community_cards.len(), 3);
    assert_eq!(s.pot, 30);
    assert_eq!(s.current_bet, 0);
    assert_eq!(s.active_player.as_deref(), Some("b"));
}

#[test]
fn rejected_actions_leave_state_untouched() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 5);
    e.start_new_hand().unwrap();
    let before = e.snapshot();

    let err = e.handle_action(PlayerAction::check("b")).unwrap_err();
    assert!(matches!(err, GameError::NotYourTurn { .. }));
    let err = e.handle_action(PlayerAction::check("a")).unwrap_err();
    assert!(matches!(err, GameError::InvalidAction { .. }));
    let err = e.handle_action(PlayerAction::raise("a", 15)).unwrap_err();
    assert!(matches!(err, GameError::InvalidAction { .. }));
    let err = e.handle_action(PlayerAction::fold("zed")).unwrap_err();
    assert_eq!(err, GameError::PlayerNotFound("zed".into()));

    assert_eq!(e.snapshot(), before);
}

#[test]
fn raise_reopens_action_and_sets_min_raise() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 5);
    e.start_new_hand().unwrap();
    e.handle_action(PlayerAction::raise("a", 40)).unwrap();
    let s = e.get_state();
    assert_eq!(s.current_bet, 40);
    assert_eq!(s.min_raise, 30);
    assert_eq!(s.active_player.as_deref(), Some("b"));

    let legal = e.legal_actions("b").unwrap();
    assert_eq!(legal.call_amount, 35);
    assert_eq!(legal.min_raise_to, 70);
    e.handle_action(PlayerAction::fold("b")).unwrap();
    e.handle_action(PlayerAction::call("c")).unwrap();

    let s = e.get_state();
    assert_eq!(s.stage, Stage::Flop);
    assert_eq!(s.pot, 85);
    assert!(s.player("b").unwrap().is_folded);
}

#[test]
fn short_all_in_does_not_reopen_raising() {
    let config = TableConfig::new("short", 5, 10).with_seed(5);
    let seats = vec![
        SeatedPlayer::new("a", "A", 500, 0),
        SeatedPlayer::new("b", "B", 500, 1),
        SeatedPlayer::new("c", "C", 130, 2),
    ];
    let mut e = PokerEngine::new(config, seats).unwrap();
    e.start_new_hand().unwrap();
    e.handle_action(PlayerAction::raise("a", 100)).unwrap();
    e.handle_action(PlayerAction::call("b")).unwrap();
    // +30 over 100 is short of the 90 minimum raise
    e.handle_action(PlayerAction::raise("c", 130)).unwrap();
    let s = e.get_state();
    assert!(s.player("c").unwrap().is_all_in);
    assert_eq!(s.current_bet, 130);
    assert_eq!(s.min_raise, 90);

    let before = e.snapshot();
    let err = e.handle_action(PlayerAction::raise("a", 400)).unwrap_err();
    assert!(matches!(err, GameError::InvalidAction { .. }));
    assert_eq!(e.snapshot(), before);
    assert!(!e.legal_actions("a").unwrap().can_raise);

    e.handle_action(PlayerAction::call("a")).unwrap();
    assert!(!e.legal_actions("b").unwrap().can_raise);
    e.handle_action(PlayerAction::call("b")).unwrap();

    let s = e.get_state();
    assert_eq!(s.stage, Stage::Flop);
    assert_eq!(s.pot, 390);
    assert_eq!(s.active_player.as_deref(), Some("b"));
    assert!(e.legal_actions("b").unwrap().can_raise);
}

#[test]
fn everyone_folding_to_big_blind_settles_immediately() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 5);
    e.start_new_hand().unwrap();
    e.handle_action(PlayerAction::fold("a")).unwrap();
    e.handle_action(PlayerAction::fold("b")).unwrap();

    let s = e.get_state();
    assert_eq!(s.stage, Stage::Showdown);
    assert!(s.community_cards.is_empty());
    assert_eq!(s.player("c").unwrap().stack, 505);
    assert_eq!(s.player("b").unwrap().stack, 495);
    assert_eq!(s.results.len(), 1);
    assert_eq!(s.results[0].strength_rank, None);
    assert_eq!(s.results[0].win_amount, 15);
}

#[test]
fn ensure_win_by_fold_is_idempotent() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b"], 500, 5);
    e.start_new_hand().unwrap();
    assert!(!e.ensure_win_by_fold_if_single().unwrap());
    e.handle_action(PlayerAction::fold("a")).unwrap();
    let settled = e.snapshot();

    assert!(!e.ensure_win_by_fold_if_single().unwrap());
    assert!(!e.ensure_win_by_fold_if_single().unwrap());
    assert_eq!(e.snapshot(), settled);
    assert_eq!(settled.player("b").unwrap().stack, 505);
}

#[test]
fn button_moves_and_stacks_carry_between_hands() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 9);
    e.start_new_hand().unwrap();
    assert_eq!(
        e.start_new_hand().unwrap_err(),
        GameError::HandInProgress
    );
    e.handle_action(PlayerAction::fold("a")).unwrap();
    e.handle_action(PlayerAction::fold("b")).unwrap();

    e.start_new_hand().unwrap();
    let s = e.get_state();
    assert_eq!(s.hand_number, 2);
    assert_eq!(s.dealer_position, 1);
    assert_eq!(s.player("c").unwrap().current_bet, 5);
    assert_eq!(s.player("a").unwrap().current_bet, 10);
    assert_eq!(s.total_chips(), 1500);
}

#[test]
fn dealer_can_be_carried_over_from_another_engine() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 9);
    e.set_dealer_position(1).unwrap();
    e.start_new_hand().unwrap();
    assert_eq!(e.get_state().dealer_position, 2);
    assert_eq!(e.set_dealer_position(0), Err(GameError::HandInProgress));
}

#[test]
fn variant_change_waits_for_next_hand() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b"], 500, 2);
    e.start_new_hand().unwrap();
    e.set_variant(Variant::Omaha);
    assert_eq!(e.get_state().variant, Variant::TexasHoldem);
    assert!(e.get_state().players.iter().all(|p| p.hole_cards.len() == 2));

    e.handle_action(PlayerAction::fold("a")).unwrap();
    e.start_new_hand().unwrap();
    assert_eq!(e.get_state().variant, Variant::Omaha);
    assert!(e.get_state().players.iter().all(|p| p.hole_cards.len() == 4));
}

#[test]
fn broke_player_is_dealt_out() {
    let config = TableConfig::new("t", 5, 10).with_seed(4);
    let players = vec![
        SeatedPlayer::new("a", "A", 500, 0),
        SeatedPlayer::new("b", "B", 0, 1),
        SeatedPlayer::new("c", "C", 500, 2),
    ];
    let mut e = PokerEngine::new(config, players).unwrap();
    e.start_new_hand().unwrap();
    let s = e.get_state();
    let b = s.player("b").unwrap();
    assert!(b.sitting_out);
    assert!(b.hole_cards.is_empty());
    // heads-up between a and c: a is the button and small blind
    assert_eq!(s.player("a").unwrap().current_bet, 5);
    assert_eq!(s.player("c").unwrap().current_bet, 10);
}

#[test]
fn not_enough_players_is_rejected_without_changes() {
    let mut e = engine(Variant::TexasHoldem, &["a"], 500, 1);
    let before = e.snapshot();
    assert_eq!(e.start_new_hand(), Err(GameError::NotEnoughPlayers));
    assert_eq!(e.snapshot(), before);
}

#[test]
fn removing_the_actor_passes_the_turn() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 6);
    e.start_new_hand().unwrap();
    e.remove_player("a").unwrap();
    let s = e.get_state();
    assert!(s.player("a").unwrap().is_folded);
    assert!(s.player("a").unwrap().departed);
    assert_eq!(s.active_player.as_deref(), Some("b"));

    e.handle_action(PlayerAction::fold("b")).unwrap();
    assert_eq!(e.get_state().stage, Stage::Showdown);

    e.start_new_hand().unwrap();
    assert_eq!(e.get_state().players.len(), 2);
    assert!(e.get_state().player("a").is_none());
}

#[test]
fn duplicate_seats_are_invalid_setup() {
    let mut players = seats(&["a", "b"], 100);
    players[1].seat = 0;
    let err = PokerEngine::new(TableConfig::default(), players).unwrap_err();
    assert!(matches!(err, GameError::InvalidSetup { .. }));
}

#[test]
fn seven_stud_table_is_capped() {
    let ids = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let config = TableConfig::default().with_variant(Variant::SevenCardStud);
    let err = PokerEngine::new(config, seats(&ids, 100)).unwrap_err();
    assert!(matches!(err, GameError::TooManyPlayers { max: 7, .. }));
}

#[test]
fn hand_record_tracks_actions_and_board() {
    let mut e = rigged(Variant::TexasHoldem, &["a", "b"], 500, "2c 3c 4c 5c");
    e.start_new_hand().unwrap();
    e.handle_action(PlayerAction::call("a").at(1_700_000_000_000)).unwrap();
    e.handle_action(PlayerAction::check("b")).unwrap();

    let rec = e.hand_record().unwrap();
    assert_eq!(rec.hand_number, 1);
    assert_eq!(rec.blinds.len(), 2);
    assert_eq!(rec.actions.len(), 2);
    assert_eq!(rec.actions[0].committed, 5);
    assert_eq!(rec.actions[0].action.timestamp, 1_700_000_000_000);
    assert_eq!(rec.board.len(), 3);
    assert!(!rec.is_complete());

    check_or_call(&mut e);
    let rec = e.hand_record().unwrap();
    assert!(rec.is_complete());
    assert_eq!(rec.board.len(), 5);
    let line = rec.to_json_line().unwrap();
    assert!(!line.contains('\n'));
    assert!(line.contains("\"variant\":\"texas-holdem\""));
}

#[test]
fn state_snapshot_serializes_wire_names() {
    let mut e = engine(Variant::OmahaHiLo, &["a", "b"], 500, 2);
    e.start_new_hand().unwrap();
    let json = serde_json::to_value(e.snapshot()).unwrap();
    assert_eq!(json["variant"], "omaha-hi-lo");
    assert_eq!(json["betting_mode"], "no-limit");
    assert_eq!(json["stage"], "preflop");
    assert_eq!(json["active_player"], "a");
    assert!(json.get("run_it_twice").is_none());
}
