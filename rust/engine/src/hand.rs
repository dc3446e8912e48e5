use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::cards::{Card, Rank, Suit};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Category {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::HighCard => "High Card",
            Category::OnePair => "Pair",
            Category::TwoPair => "Two Pair",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::FourOfAKind => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
        }
    }
}

/// Strength of a high hand. Two strengths compare equal exactly when the
/// hands split a pot, so suits never take part in the comparison.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct HandStrength {
    pub category: Category,
    // kickers: ordered high -> low for tiebreaks
    pub kickers: [u8; 5],
}

impl HandStrength {
    /// Numeric category, 0 (high card) through 8 (straight flush).
    pub fn rank(&self) -> u8 {
        self.category as u8
    }

    pub fn describe(&self) -> String {
        let top = Rank::from_u8(self.kickers[0]).map(rank_name);
        match (self.category, top) {
            (Category::StraightFlush, Some("Ace")) => "Royal Flush".to_string(),
            (Category::HighCard, Some(r)) => format!("High Card, {r}"),
            (Category::OnePair, Some(r)) => format!("Pair of {}", plural(r)),
            (Category::ThreeOfAKind, Some(r)) => format!("Three of a Kind, {}", plural(r)),
            (Category::FourOfAKind, Some(r)) => format!("Four of a Kind, {}", plural(r)),
            (Category::Straight | Category::StraightFlush | Category::Flush, Some(r)) => {
                format!("{}, {r} high", self.category.name())
            }
            (cat, _) => cat.name().to_string(),
        }
    }
}

impl Ord for HandStrength {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_hands(self, other)
    }
}

impl PartialOrd for HandStrength {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn rank_name(r: Rank) -> &'static str {
    match r {
        Rank::Two => "Two",
        Rank::Three => "Three",
        Rank::Four => "Four",
        Rank::Five => "Five",
        Rank::Six => "Six",
        Rank::Seven => "Seven",
        Rank::Eight => "Eight",
        Rank::Nine => "Nine",
        Rank::Ten => "Ten",
        Rank::Jack => "Jack",
        Rank::Queen => "Queen",
        Rank::King => "King",
        Rank::Ace => "Ace",
    }
}

fn plural(name: &str) -> String {
    if name == "Six" {
        "Sixes".to_string()
    } else {
        format!("{name}s")
    }
}

/// Best high hand that can be made from any subset of `cards`.
///
/// Works for any card count. With fewer than five cards only pairs, trips
/// and quads can form and missing kickers are zero, which is what stud
/// uses to rank exposed cards.
pub fn evaluate_hand(cards: &[Card]) -> HandStrength {
    // Count ranks and suits
    let mut rank_counts = [0u8; 15]; // 2..14 used
    let mut suit_counts = [0u8; 4];
    let mut by_suit: [Vec<u8>; 4] = [vec![], vec![], vec![], vec![]];
    for &c in cards.iter() {
        let r = c.rank.value();
        rank_counts[r as usize] += 1;
        let s = suit_index(c.suit);
        suit_counts[s] += 1;
        by_suit[s].push(r);
    }

    let flush_suit = suit_counts.iter().position(|&count| count >= 5);

    // Straight flush
    if let Some(s) = flush_suit {
        by_suit[s].sort_unstable();
        by_suit[s].dedup();
        if let Some(high) = detect_straight_high(&by_suit[s]) {
            return HandStrength {
                category: Category::StraightFlush,
                kickers: [high, 0, 0, 0, 0],
            };
        }
    }

    if let Some((quad, kicker)) = detect_quads(&rank_counts) {
        return HandStrength {
            category: Category::FourOfAKind,
            kickers: [quad, kicker, 0, 0, 0],
        };
    }

    if let Some((trip, pair)) = detect_full_house(&rank_counts) {
        return HandStrength {
            category: Category::FullHouse,
            kickers: [trip, pair, 0, 0, 0],
        };
    }

    if let Some(s) = flush_suit {
        let mut ranks = by_suit[s].clone();
        ranks.sort_unstable_by(|a, b| b.cmp(a));
        let mut k = [0u8; 5];
        k.copy_from_slice(&ranks[..5]);
        return HandStrength {
            category: Category::Flush,
            kickers: k,
        };
    }

    let uniq: Vec<u8> = (2..=14u8).filter(|&r| rank_counts[r as usize] > 0).collect();
    if let Some(high) = detect_straight_high(&uniq) {
        return HandStrength {
            category: Category::Straight,
            kickers: [high, 0, 0, 0, 0],
        };
    }

    // Three / Two pair / One pair / High card
    let (trip_ranks, pair_ranks, singles) = classify_multiples(&rank_counts);
    if let Some(&t) = trip_ranks.first() {
        let k = with_kickers(&[t], &rank_counts, 2);
        return HandStrength {
            category: Category::ThreeOfAKind,
            kickers: k,
        };
    }
    if pair_ranks.len() >= 2 {
        // a third pair can still play as the kicker
        let k = with_kickers(&[pair_ranks[0], pair_ranks[1]], &rank_counts, 1);
        return HandStrength {
            category: Category::TwoPair,
            kickers: k,
        };
    }
    if let Some(&p) = pair_ranks.first() {
        let k = with_kickers(&[p], &rank_counts, 3);
        return HandStrength {
            category: Category::OnePair,
            kickers: k,
        };
    }

    let mut k = [0u8; 5];
    for (slot, r) in k.iter_mut().zip(singles.iter()) {
        *slot = *r;
    }
    HandStrength {
        category: Category::HighCard,
        kickers: k,
    }
}

pub fn compare_hands(a: &HandStrength, b: &HandStrength) -> Ordering {
    match a.category.cmp(&b.category) {
        Ordering::Equal => a.kickers.cmp(&b.kickers),
        ord => ord,
    }
}

/// Omaha high: exactly two of the hole cards and three of the board.
/// `None` when there are not enough cards to form such a hand.
pub fn evaluate_omaha_hand(hole: &[Card], board: &[Card]) -> Option<HandStrength> {
    let mut best: Option<HandStrength> = None;
    for h in combinations(hole, 2) {
        for b in combinations(board, 3) {
            let five = [h[0], h[1], b[0], b[1], b[2]];
            let strength = evaluate_hand(&five);
            if best.as_ref().map_or(true, |cur| strength > *cur) {
                best = Some(strength);
            }
        }
    }
    best
}

/// A qualifying ace-to-five low: five distinct ranks, all eight or lower.
/// Straights and flushes do not count against a low.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LowHand {
    /// Low values sorted highest first, Ace = 1 (e.g. `[8, 6, 4, 3, 1]`).
    pub ranks: [u8; 5],
}

impl LowHand {
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .ranks
            .iter()
            .map(|&r| if r == 1 { "A".to_string() } else { r.to_string() })
            .collect();
        format!("{} low", parts.join("-"))
    }

    fn from_low_values(mut values: Vec<u8>) -> Option<LowHand> {
        values.sort_unstable();
        values.dedup();
        if values.len() < 5 || values[4] > 8 {
            return None;
        }
        Some(LowHand {
            ranks: [values[4], values[3], values[2], values[1], values[0]],
        })
    }
}

/// `Greater` when `a` is the better (lower) low.
pub fn compare_low_hands(a: &LowHand, b: &LowHand) -> Ordering {
    b.ranks.cmp(&a.ranks)
}

/// Best eight-or-better low from any five of `cards` (stud hi-lo).
pub fn evaluate_low_hand(cards: &[Card]) -> Option<LowHand> {
    let values: Vec<u8> = cards
        .iter()
        .map(|c| c.rank.low_value())
        .filter(|&v| v <= 8)
        .collect();
    LowHand::from_low_values(values)
}

/// Omaha low: exactly two hole cards and three board cards.
pub fn evaluate_omaha_low_hand(hole: &[Card], board: &[Card]) -> Option<LowHand> {
    let mut best: Option<LowHand> = None;
    for h in combinations(hole, 2) {
        for b in combinations(board, 3) {
            let values: Vec<u8> = h.iter().chain(b.iter()).map(|c| c.rank.low_value()).collect();
            let Some(low) = LowHand::from_low_values(values) else {
                continue;
            };
            if best
                .as_ref()
                .map_or(true, |cur| compare_low_hands(&low, cur).is_gt())
            {
                best = Some(low);
            }
        }
    }
    best
}

/// All k-element subsets of `items`, preserving input order.
pub fn combinations<T: Copy>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k == 0 {
        return vec![vec![]];
    }
    if items.len() < k {
        return vec![];
    }
    let first = items[0];
    let rest = &items[1..];
    let mut result: Vec<Vec<T>> = combinations(rest, k - 1)
        .into_iter()
        .map(|mut combo| {
            combo.insert(0, first);
            combo
        })
        .collect();
    result.extend(combinations(rest, k));
    result
}

fn suit_index(s: Suit) -> usize {
    match s {
        Suit::Clubs => 0,
        Suit::Diamonds => 1,
        Suit::Hearts => 2,
        Suit::Spades => 3,
    }
}

fn detect_straight_high(sorted_unique_ranks: &[u8]) -> Option<u8> {
    if sorted_unique_ranks.is_empty() {
        return None;
    }
    let mut v = sorted_unique_ranks.to_vec();
    v.sort_unstable();
    // Ace-low straight support: treat Ace as 1 additionally
    if v.binary_search(&14).is_ok() {
        v.insert(0, 1);
    }

    let mut run = 1;
    let mut best_high = 0u8;
    for i in 1..v.len() {
        if v[i] == v[i - 1] + 1 {
            run += 1;
            if run >= 5 {
                best_high = v[i];
            }
        } else if v[i] != v[i - 1] {
            run = 1;
        }
    }
    (best_high != 0).then_some(best_high)
}

fn detect_quads(rank_counts: &[u8; 15]) -> Option<(u8, u8)> {
    let quad = (2..=14u8).rev().find(|&r| rank_counts[r as usize] >= 4)?;
    let kicker = (2..=14u8)
        .rev()
        .find(|&r| r != quad && rank_counts[r as usize] > 0)
        .unwrap_or(0);
    Some((quad, kicker))
}

fn detect_full_house(rank_counts: &[u8; 15]) -> Option<(u8, u8)> {
    let trip = (2..=14u8).rev().find(|&r| rank_counts[r as usize] == 3)?;
    let pair = (2..=14u8)
        .rev()
        .find(|&r| r != trip && rank_counts[r as usize] >= 2)?;
    Some((trip, pair))
}

/// Rank groups, each sorted high -> low.
fn classify_multiples(rank_counts: &[u8; 15]) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut trips = vec![];
    let mut pairs = vec![];
    let mut singles = vec![];
    for r in (2..=14u8).rev() {
        match rank_counts[r as usize] {
            3 => trips.push(r),
            2 => pairs.push(r),
            1 => singles.push(r),
            _ => {}
        }
    }
    (trips, pairs, singles)
}

/// `made` followed by the `n` highest other ranks present.
fn with_kickers(made: &[u8], rank_counts: &[u8; 15], n: usize) -> [u8; 5] {
    let mut k = [0u8; 5];
    k[..made.len()].copy_from_slice(made);
    let rest = (2..=14u8)
        .rev()
        .filter(|r| !made.contains(r) && rank_counts[*r as usize] > 0)
        .take(n);
    for (slot, r) in k[made.len()..].iter_mut().zip(rest) {
        *slot = r;
    }
    k
}
