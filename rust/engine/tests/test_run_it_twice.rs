mod common;

use std::sync::{Arc, Mutex};

use common::{cards, engine, rigged, TestLogSubscriber};
use riverrun_engine::engine::PokerEngine;
use riverrun_engine::errors::GameError;
use riverrun_engine::game::Stage;
use riverrun_engine::hand::evaluate_omaha_low_hand;
use riverrun_engine::player::PlayerAction;
use riverrun_engine::run_it_twice::{PersistenceCallback, RunRecord};
use riverrun_engine::variant::Variant;
use tracing::Level;

/// Everyone all-in preflop; the hand pauses before the flop.
fn all_in_standoff(ids: &[&str], seed: u64) -> PokerEngine {
    let mut e = engine(Variant::TexasHoldem, ids, 500, seed);
    e.start_new_hand().unwrap();
    let first = e.get_state().active_player.clone().unwrap();
    e.handle_action(PlayerAction::raise(first, 500)).unwrap();
    while let Some(actor) = e.get_state().active_player.clone() {
        e.handle_action(PlayerAction::call(actor)).unwrap();
    }
    assert!(e.get_state().awaiting_runout());
    e
}

type HookResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

fn hook(f: impl FnMut(&RunRecord) -> HookResult + Send + 'static) -> PersistenceCallback {
    Box::new(f)
}

#[test]
fn two_runs_split_the_pot_exactly() {
    let mut e = all_in_standoff(&["a", "b"], 8);
    let rit = e.enable_run_it_twice(2, Some(vec![11, 22])).unwrap();
    assert_eq!(rit.boards.len(), 2);
    assert!(rit.boards.iter().all(|b| b.len() == 5));

    e.run_it_twice_now().unwrap();
    let s = e.get_state();
    assert_eq!(s.stage, Stage::Showdown);
    assert_eq!(s.pot, 0);
    assert!(s.players.iter().all(|p| p.current_bet == 0));
    assert_eq!(s.total_chips(), 1000);

    let rit = s.run_it_twice.as_ref().unwrap();
    assert_eq!(rit.results.len(), 2);
    assert_eq!(rit.results[0].pot_amount, 500);
    assert_eq!(rit.results[1].pot_amount, 500);
    let awarded: u64 = rit
        .results
        .iter()
        .flat_map(|r| &r.winners)
        .map(|w| w.amount)
        .sum();
    assert_eq!(awarded, 1000);
    assert_eq!(rit.pot_distribution.values().sum::<u64>(), 1000);
}

#[test]
fn three_runs_conserve_chips() {
    let mut e = all_in_standoff(&["a", "b", "c"], 3);
    e.enable_run_it_twice(3, None).unwrap();
    e.run_it_twice_now().unwrap();

    let s = e.get_state();
    let rit = s.run_it_twice.as_ref().unwrap();
    assert_eq!(rit.seeds.len(), 3);
    assert_eq!(
        rit.results.iter().map(|r| r.pot_amount).collect::<Vec<_>>(),
        vec![500, 500, 500]
    );
    assert_eq!(s.pot, 0);
    assert_eq!(s.total_chips(), 1500);
    assert_eq!(e.hand_record().unwrap().run_boards.len(), 3);
}

#[test]
fn odd_pot_puts_extra_chip_on_first_board() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b", "c"], 500, 4);
    e.start_new_hand().unwrap();
    e.handle_action(PlayerAction::raise("a", 500)).unwrap();
    e.handle_action(PlayerAction::fold("b")).unwrap();
    e.handle_action(PlayerAction::call("c")).unwrap();
    assert_eq!(e.get_state().pot, 1005);

    e.enable_run_it_twice(2, Some(vec![5, 6])).unwrap();
    e.run_it_twice_now().unwrap();
    let s = e.get_state();
    let rit = s.run_it_twice.as_ref().unwrap();
    assert_eq!(rit.results[0].pot_amount, 503);
    assert_eq!(rit.results[1].pot_amount, 502);
    assert_eq!(s.total_chips(), 1500);
}

#[test]
fn same_seeds_replay_the_same_boards() {
    let boards = |seed| {
        let mut e = all_in_standoff(&["a", "b"], 8);
        let rit = e.enable_run_it_twice(2, Some(vec![seed, seed + 1])).unwrap();
        rit.boards.clone()
    };
    assert_eq!(boards(40), boards(40));
}

#[test]
fn boards_never_reuse_dealt_cards() {
    let mut e = all_in_standoff(&["a", "b", "c"], 13);
    let dealt: Vec<_> = e
        .get_state()
        .players
        .iter()
        .flat_map(|p| p.hole_cards.clone())
        .collect();
    let rit = e.enable_run_it_twice(3, Some(vec![1, 2, 3])).unwrap();
    for board in &rit.boards {
        assert!(board.iter().all(|c| !dealt.contains(c)));
    }
}

#[test]
fn open_betting_is_not_eligible() {
    let mut e = engine(Variant::TexasHoldem, &["a", "b"], 500, 1);
    e.start_new_hand().unwrap();
    let before = e.snapshot();
    let err = e.enable_run_it_twice(2, None).unwrap_err();
    assert!(matches!(err, GameError::RunItTwiceNotEligible { .. }));
    assert_eq!(e.snapshot(), before);

    assert_eq!(e.run_it_twice_now(), Err(GameError::RunItTwiceNotEnabled));
}

#[test]
fn run_count_and_seed_count_are_validated() {
    let mut e = all_in_standoff(&["a", "b"], 2);
    assert!(matches!(
        e.enable_run_it_twice(3, None),
        Err(GameError::RunItTwiceNotEligible { .. })
    ));
    assert!(matches!(
        e.enable_run_it_twice(1, None),
        Err(GameError::RunItTwiceNotEligible { .. })
    ));
    assert!(matches!(
        e.enable_run_it_twice(2, Some(vec![1])),
        Err(GameError::RunItTwiceNotEligible { .. })
    ));
    assert!(e.get_state().run_it_twice.is_none());
}

#[test]
fn stud_has_no_board_to_run() {
    let mut e = engine(Variant::SevenCardStud, &["a", "b"], 500, 2);
    e.start_new_hand().unwrap();
    e.handle_action(PlayerAction::raise("a", 500)).unwrap();
    e.handle_action(PlayerAction::call("b")).unwrap();
    assert!(e.get_state().awaiting_runout());
    assert!(matches!(
        e.enable_run_it_twice(2, None),
        Err(GameError::RunItTwiceNotEligible { .. })
    ));
    e.run_out().unwrap();
    let s = e.get_state();
    assert!(s.players.iter().all(|p| p.hole_cards.len() == 7));
    assert_eq!(s.total_chips(), 1000);
}

#[test]
fn persistence_hook_sees_every_run() {
    let seen: Arc<Mutex<Vec<RunRecord>>> = Arc::default();
    let sink = seen.clone();
    let mut e = all_in_standoff(&["a", "b"], 8);
    e.configure_run_it_twice_persistence(
        "hand-1",
        hook(move |rec| {
            sink.lock().unwrap().push(rec.clone());
            Ok(())
        }),
    );
    e.enable_run_it_twice(2, Some(vec![1, 2])).unwrap();
    e.run_it_twice_now().unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].hand_id, "hand-1");
    assert_eq!(seen[0].board_number, 1);
    assert_eq!(seen[1].board_number, 2);
    assert_eq!(seen[0].pot_amount + seen[1].pot_amount, 1000);
}

#[test]
fn failing_persistence_is_logged_not_fatal() {
    let logs = TestLogSubscriber::new();
    let mut e = all_in_standoff(&["a", "b"], 8);
    e.configure_run_it_twice_persistence(
        "hand-2",
        hook(|rec| {
            if rec.board_number == 1 {
                Err("storage offline".into())
            } else {
                panic!("storage exploded")
            }
        }),
    );
    e.enable_run_it_twice(2, Some(vec![1, 2])).unwrap();
    logs.capture(|| e.run_it_twice_now()).unwrap();

    let s = e.get_state();
    assert_eq!(s.stage, Stage::Showdown);
    assert_eq!(s.total_chips(), 1000);
    let warnings = logs.at_level(Level::WARN);
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].message.contains("persistence failed"));
    assert!(warnings[0]
        .fields
        .iter()
        .any(|(k, v)| k == "error" && v.contains("storage offline")));
    assert!(warnings[1].message.contains("panicked"));
}

#[test]
fn revealing_a_street_discards_prepared_boards() {
    let mut e = all_in_standoff(&["a", "b"], 8);
    e.enable_run_it_twice(2, Some(vec![1, 2])).unwrap();
    e.reveal_next_street().unwrap();

    assert!(e.get_state().run_it_twice.is_none());
    assert_eq!(e.run_it_twice_now(), Err(GameError::RunItTwiceNotEnabled));
    assert_eq!(e.get_state().stage, Stage::Flop);

    let flop = e.get_state().community_cards.clone();
    let rit = e.enable_run_it_twice(2, Some(vec![1, 2])).unwrap();
    assert!(rit.boards.iter().all(|b| b.starts_with(&flop)));
    e.run_it_twice_now().unwrap();
    let s = e.get_state();
    assert_eq!(s.community_cards, flop);
    assert_eq!(s.total_chips(), 1000);
}

#[test]
fn persistence_hook_is_scoped_to_one_hand() {
    let seen: Arc<Mutex<Vec<RunRecord>>> = Arc::default();
    let sink = seen.clone();
    let mut e = engine(Variant::TexasHoldem, &["a", "b"], 500, 8);
    e.start_new_hand().unwrap();
    e.configure_run_it_twice_persistence(
        "first-hand",
        hook(move |rec| {
            sink.lock().unwrap().push(rec.clone());
            Ok(())
        }),
    );
    let first = e.get_state().active_player.clone().unwrap();
    e.handle_action(PlayerAction::fold(first)).unwrap();

    e.start_new_hand().unwrap();
    let first = e.get_state().active_player.clone().unwrap();
    e.handle_action(PlayerAction::raise(first, 10_000)).unwrap();
    let second = e.get_state().active_player.clone().unwrap();
    e.handle_action(PlayerAction::call(second)).unwrap();
    e.enable_run_it_twice(2, Some(vec![3, 4])).unwrap();
    e.run_it_twice_now().unwrap();

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(e.get_state().total_chips(), 1000);
}

#[test]
fn hi_lo_run_results_show_the_low() {
    // b is dealt first: b Ac 2c 9d 9s, a Kh Kd Qh Qs
    let order = "Ac Kh 2c Kd 9d Qh 9s Qs 3h 4d 5c";
    let mut e = rigged(Variant::OmahaHiLo, &["a", "b"], 500, order);
    e.start_new_hand().unwrap();
    e.handle_action(PlayerAction::call("a")).unwrap();
    e.handle_action(PlayerAction::check("b")).unwrap();
    assert_eq!(e.get_state().community_cards, cards("3h 4d 5c"));
    e.handle_action(PlayerAction::bet("b", 490)).unwrap();
    e.handle_action(PlayerAction::call("a")).unwrap();
    assert!(e.get_state().awaiting_runout());

    e.enable_run_it_twice(2, Some(vec![7, 8])).unwrap();
    e.run_it_twice_now().unwrap();
    let s = e.get_state();
    let board = &s.run_it_twice.as_ref().unwrap().boards[0];
    let b = s.results.iter().find(|r| r.player_id == "b").unwrap();
    let low = evaluate_omaha_low_hand(&s.player("b").unwrap().hole_cards, board).unwrap();
    assert_eq!(low.describe(), "5-4-3-2-A low");
    assert!(b.description.ends_with(" / 5-4-3-2-A low"), "{}", b.description);
    let a = s.results.iter().find(|r| r.player_id == "a").unwrap();
    assert!(!a.description.contains(" / "));
    assert_eq!(s.total_chips(), 1000);
}
