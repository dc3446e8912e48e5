//! Variant rules.
//!
//! Every variant-dependent decision (which streets exist, what each street
//! deals, how a player's best hand is picked, whether the pot splits hi-lo)
//! lives behind [`VariantRules`]. The rest of the engine asks
//! [`rules_for`] and never matches on [`Variant`] itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::game::Stage;
use crate::hand::{
    evaluate_hand, evaluate_low_hand, evaluate_omaha_hand, evaluate_omaha_low_hand,
    HandStrength, LowHand,
};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    #[default]
    TexasHoldem,
    Omaha,
    OmahaHiLo,
    SevenCardStud,
    SevenCardStudHiLo,
    FiveCardStud,
}

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::TexasHoldem,
        Variant::Omaha,
        Variant::OmahaHiLo,
        Variant::SevenCardStud,
        Variant::SevenCardStudHiLo,
        Variant::FiveCardStud,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Variant::TexasHoldem => "texas-holdem",
            Variant::Omaha => "omaha",
            Variant::OmahaHiLo => "omaha-hi-lo",
            Variant::SevenCardStud => "seven-card-stud",
            Variant::SevenCardStudHiLo => "seven-card-stud-hi-lo",
            Variant::FiveCardStud => "five-card-stud",
        }
    }

    pub fn rules(self) -> &'static dyn VariantRules {
        rules_for(self)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.id() == s)
            .ok_or_else(|| format!("unknown variant '{s}'"))
    }
}

/// Cards dealt when a stage opens.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DealPlan {
    /// Face-down cards per player.
    pub down: usize,
    /// Face-up cards per player (stud).
    pub up: usize,
    /// Shared board cards.
    pub community: usize,
}

/// Variant-specific dealing, staging and hand selection.
pub trait VariantRules: Send + Sync + fmt::Debug {
    fn variant(&self) -> Variant;

    /// The display name of this variant
    fn name(&self) -> &'static str;

    /// Betting stages in dealing order; showdown follows the last one.
    fn stages(&self) -> &'static [Stage];

    fn deal_plan(&self, stage: Stage) -> DealPlan;

    /// Seats the deck can serve for a full hand.
    fn max_players(&self) -> usize;

    /// Whether the variant deals a shared board.
    fn uses_board(&self) -> bool {
        true
    }

    /// Best high hand for `hole` (all of a player's own cards) and `board`.
    fn evaluate_high(&self, hole: &[Card], board: &[Card]) -> HandStrength;

    /// Best qualifying low, `None` for high-only variants or when no low
    /// qualifies.
    fn evaluate_low(&self, _hole: &[Card], _board: &[Card]) -> Option<LowHand> {
        None
    }

    fn is_hi_lo(&self) -> bool {
        false
    }

    fn first_stage(&self) -> Stage {
        self.stages()[0]
    }

    /// Stage after `stage`; [`Stage::Showdown`] after the last betting stage.
    fn next_stage(&self, stage: Stage) -> Stage {
        let stages = self.stages();
        match stages.iter().position(|s| *s == stage) {
            Some(i) if i + 1 < stages.len() => stages[i + 1],
            _ => Stage::Showdown,
        }
    }

    /// Total board cards dealt once every stage has opened.
    fn board_size(&self) -> usize {
        self.stages()
            .iter()
            .map(|s| self.deal_plan(*s).community)
            .sum()
    }

    /// Cards each player holds at showdown.
    fn cards_per_player(&self) -> usize {
        self.stages()
            .iter()
            .map(|s| {
                let plan = self.deal_plan(*s);
                plan.down + plan.up
            })
            .sum()
    }
}

const HOLDEM_STAGES: [Stage; 4] = [Stage::Preflop, Stage::Flop, Stage::Turn, Stage::River];
const SEVEN_STUD_STAGES: [Stage; 5] = [
    Stage::ThirdStreet,
    Stage::FourthStreet,
    Stage::FifthStreet,
    Stage::SixthStreet,
    Stage::SeventhStreet,
];
const FIVE_STUD_STAGES: [Stage; 4] = [
    Stage::SecondStreet,
    Stage::ThirdStreet,
    Stage::FourthStreet,
    Stage::FifthStreet,
];

fn board_plan(stage: Stage, hole_cards: usize) -> DealPlan {
    match stage {
        Stage::Preflop => DealPlan {
            down: hole_cards,
            ..DealPlan::default()
        },
        Stage::Flop => DealPlan {
            community: 3,
            ..DealPlan::default()
        },
        Stage::Turn | Stage::River => DealPlan {
            community: 1,
            ..DealPlan::default()
        },
        _ => DealPlan::default(),
    }
}

fn omaha_high(hole: &[Card], board: &[Card]) -> HandStrength {
    evaluate_omaha_hand(hole, board).unwrap_or_else(|| {
        let all: Vec<Card> = hole.iter().chain(board).copied().collect();
        evaluate_hand(&all)
    })
}

/// Texas Hold'em - two hole cards, any five of seven.
#[derive(Debug, Clone, Default)]
pub struct TexasHoldem;

impl VariantRules for TexasHoldem {
    fn variant(&self) -> Variant {
        Variant::TexasHoldem
    }

    fn name(&self) -> &'static str {
        "Texas Hold'em"
    }

    fn stages(&self) -> &'static [Stage] {
        &HOLDEM_STAGES
    }

    fn deal_plan(&self, stage: Stage) -> DealPlan {
        board_plan(stage, 2)
    }

    fn max_players(&self) -> usize {
        10
    }

    fn evaluate_high(&self, hole: &[Card], board: &[Card]) -> HandStrength {
        let all: Vec<Card> = hole.iter().chain(board).copied().collect();
        evaluate_hand(&all)
    }
}

/// Omaha - four hole cards, must use exactly 2
#[derive(Debug, Clone, Default)]
pub struct Omaha;

impl VariantRules for Omaha {
    fn variant(&self) -> Variant {
        Variant::Omaha
    }

    fn name(&self) -> &'static str {
        "Omaha"
    }

    fn stages(&self) -> &'static [Stage] {
        &HOLDEM_STAGES
    }

    fn deal_plan(&self, stage: Stage) -> DealPlan {
        board_plan(stage, 4)
    }

    fn max_players(&self) -> usize {
        10
    }

    fn evaluate_high(&self, hole: &[Card], board: &[Card]) -> HandStrength {
        omaha_high(hole, board)
    }
}

/// Omaha Hi-Lo (eight or better).
#[derive(Debug, Clone, Default)]
pub struct OmahaHiLo;

impl VariantRules for OmahaHiLo {
    fn variant(&self) -> Variant {
        Variant::OmahaHiLo
    }

    fn name(&self) -> &'static str {
        "Omaha Hi-Lo"
    }

    fn stages(&self) -> &'static [Stage] {
        &HOLDEM_STAGES
    }

    fn deal_plan(&self, stage: Stage) -> DealPlan {
        board_plan(stage, 4)
    }

    fn max_players(&self) -> usize {
        10
    }

    fn evaluate_high(&self, hole: &[Card], board: &[Card]) -> HandStrength {
        omaha_high(hole, board)
    }

    fn evaluate_low(&self, hole: &[Card], board: &[Card]) -> Option<LowHand> {
        evaluate_omaha_low_hand(hole, board)
    }

    fn is_hi_lo(&self) -> bool {
        true
    }
}

fn seven_stud_plan(stage: Stage) -> DealPlan {
    match stage {
        Stage::ThirdStreet => DealPlan {
            down: 2,
            up: 1,
            community: 0,
        },
        Stage::FourthStreet | Stage::FifthStreet | Stage::SixthStreet => DealPlan {
            up: 1,
            ..DealPlan::default()
        },
        Stage::SeventhStreet => DealPlan {
            down: 1,
            ..DealPlan::default()
        },
        _ => DealPlan::default(),
    }
}

/// Seven-Card Stud - best five of a player's seven cards, no board.
#[derive(Debug, Clone, Default)]
pub struct SevenCardStud;

impl VariantRules for SevenCardStud {
    fn variant(&self) -> Variant {
        Variant::SevenCardStud
    }

    fn name(&self) -> &'static str {
        "Seven-Card Stud"
    }

    fn stages(&self) -> &'static [Stage] {
        &SEVEN_STUD_STAGES
    }

    fn deal_plan(&self, stage: Stage) -> DealPlan {
        seven_stud_plan(stage)
    }

    fn max_players(&self) -> usize {
        // 7 x 7 = 49 cards
        7
    }

    fn uses_board(&self) -> bool {
        false
    }

    fn evaluate_high(&self, hole: &[Card], _board: &[Card]) -> HandStrength {
        evaluate_hand(hole)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SevenCardStudHiLo;

impl VariantRules for SevenCardStudHiLo {
    fn variant(&self) -> Variant {
        Variant::SevenCardStudHiLo
    }

    fn name(&self) -> &'static str {
        "Seven-Card Stud Hi-Lo"
    }

    fn stages(&self) -> &'static [Stage] {
        &SEVEN_STUD_STAGES
    }

    fn deal_plan(&self, stage: Stage) -> DealPlan {
        seven_stud_plan(stage)
    }

    fn max_players(&self) -> usize {
        7
    }

    fn uses_board(&self) -> bool {
        false
    }

    fn evaluate_high(&self, hole: &[Card], _board: &[Card]) -> HandStrength {
        evaluate_hand(hole)
    }

    fn evaluate_low(&self, hole: &[Card], _board: &[Card]) -> Option<LowHand> {
        evaluate_low_hand(hole)
    }

    fn is_hi_lo(&self) -> bool {
        true
    }
}

/// Five-Card Stud - one down card, four up cards.
#[derive(Debug, Clone, Default)]
pub struct FiveCardStud;

impl VariantRules for FiveCardStud {
    fn variant(&self) -> Variant {
        Variant::FiveCardStud
    }

    fn name(&self) -> &'static str {
        "Five-Card Stud"
    }

    fn stages(&self) -> &'static [Stage] {
        &FIVE_STUD_STAGES
    }

    fn deal_plan(&self, stage: Stage) -> DealPlan {
        match stage {
            Stage::SecondStreet => DealPlan {
                down: 1,
                up: 1,
                community: 0,
            },
            Stage::ThirdStreet | Stage::FourthStreet | Stage::FifthStreet => DealPlan {
                up: 1,
                ..DealPlan::default()
            },
            _ => DealPlan::default(),
        }
    }

    fn max_players(&self) -> usize {
        10
    }

    fn uses_board(&self) -> bool {
        false
    }

    fn evaluate_high(&self, hole: &[Card], _board: &[Card]) -> HandStrength {
        evaluate_hand(hole)
    }
}

static TEXAS_HOLDEM: TexasHoldem = TexasHoldem;
static OMAHA: Omaha = Omaha;
static OMAHA_HI_LO: OmahaHiLo = OmahaHiLo;
static SEVEN_CARD_STUD: SevenCardStud = SevenCardStud;
static SEVEN_CARD_STUD_HI_LO: SevenCardStudHiLo = SevenCardStudHiLo;
static FIVE_CARD_STUD: FiveCardStud = FiveCardStud;

pub fn rules_for(variant: Variant) -> &'static dyn VariantRules {
    match variant {
        Variant::TexasHoldem => &TEXAS_HOLDEM,
        Variant::Omaha => &OMAHA,
        Variant::OmahaHiLo => &OMAHA_HI_LO,
        Variant::SevenCardStud => &SEVEN_CARD_STUD,
        Variant::SevenCardStudHiLo => &SEVEN_CARD_STUD_HI_LO,
        Variant::FiveCardStud => &FIVE_CARD_STUD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;
    use crate::hand::Category;

    #[test]
    fn stage_tables_end_in_showdown() {
        let holdem = rules_for(Variant::TexasHoldem);
        assert_eq!(holdem.next_stage(Stage::River), Stage::Showdown);
        assert_eq!(holdem.next_stage(Stage::Preflop), Stage::Flop);

        let stud = rules_for(Variant::SevenCardStud);
        assert_eq!(stud.first_stage(), Stage::ThirdStreet);
        assert_eq!(stud.next_stage(Stage::SixthStreet), Stage::SeventhStreet);
        assert_eq!(stud.next_stage(Stage::SeventhStreet), Stage::Showdown);

        let five = rules_for(Variant::FiveCardStud);
        assert_eq!(five.next_stage(Stage::FifthStreet), Stage::Showdown);
    }

    #[test]
    fn card_totals_per_variant() {
        assert_eq!(rules_for(Variant::TexasHoldem).board_size(), 5);
        assert_eq!(rules_for(Variant::Omaha).cards_per_player(), 4);
        assert_eq!(rules_for(Variant::SevenCardStud).cards_per_player(), 7);
        assert_eq!(rules_for(Variant::SevenCardStud).board_size(), 0);
        assert_eq!(rules_for(Variant::FiveCardStud).cards_per_player(), 5);
    }

    #[test]
    fn omaha_must_use_two_hole_cards() {
        // four hearts in hand and one on board is not a flush in Omaha
        let hole = parse_cards("Ah Kh Qh Jh").unwrap();
        let board = parse_cards("2h 7c 8d 9s 3c").unwrap();
        let omaha = rules_for(Variant::Omaha).evaluate_high(&hole, &board);
        let holdem = rules_for(Variant::TexasHoldem).evaluate_high(&hole, &board);
        assert_eq!(omaha.category, Category::HighCard);
        assert_eq!(holdem.category, Category::Flush);
    }

    #[test]
    fn wire_names_parse() {
        for v in Variant::ALL {
            assert_eq!(v.id().parse::<Variant>().unwrap(), v);
            assert_eq!(rules_for(v).variant(), v);
        }
        assert!("razz".parse::<Variant>().is_err());
    }
}
