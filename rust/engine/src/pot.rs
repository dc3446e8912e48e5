//! Side-pot construction and distribution.
//!
//! Every settlement path (showdown, win by fold, each run of a run-it-twice
//! board) ends up in [`PotCalculator::settle`] or [`PotCalculator::distribute`],
//! so odd chips and eligibility are handled in exactly one place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::EngineFault;
use crate::player::{Player, PlayerId};

/// One player's chips committed over the whole hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub player_id: PlayerId,
    pub seat: usize,
    pub amount: u64,
    pub folded: bool,
}

impl Contribution {
    pub fn new(player_id: impl Into<PlayerId>, seat: usize, amount: u64, folded: bool) -> Self {
        Self {
            player_id: player_id.into(),
            seat,
            amount,
            folded,
        }
    }

    pub fn from_players(players: &[Player]) -> Vec<Contribution> {
        players
            .iter()
            .filter(|p| !p.sitting_out)
            .map(|p| Contribution::new(p.id.clone(), p.seat, p.total_contributed, p.is_folded))
            .collect()
    }
}

/// One layer of the pot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: u64,
    /// Players who can win this layer, in seating order.
    pub eligible: Vec<PlayerId>,
    /// How many players put chips into this layer.
    pub contributors: usize,
}

impl Pot {
    /// Only one player reached this level: the chips go straight back.
    pub fn is_uncalled(&self) -> bool {
        self.contributors == 1
    }
}

/// Winners of one pot as decided by the hand evaluator, in seating order.
/// `low` stays empty when no qualifying low exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PotWinners {
    pub high: Vec<PlayerId>,
    pub low: Vec<PlayerId>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AwardKind {
    High,
    Low,
    /// Sole eligible player after everyone else folded.
    Uncontested,
    /// Unmatched chips returned to the player who bet them.
    Uncalled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub pot_index: usize,
    pub player_id: PlayerId,
    pub amount: u64,
    pub kind: AwardKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub awards: Vec<Award>,
}

impl Distribution {
    pub fn total(&self) -> u64 {
        self.awards.iter().map(|a| a.amount).sum()
    }

    /// Chips won per player across all pots.
    pub fn per_player(&self) -> BTreeMap<PlayerId, u64> {
        let mut totals = BTreeMap::new();
        for a in &self.awards {
            *totals.entry(a.player_id.clone()).or_insert(0) += a.amount;
        }
        totals
    }

    pub fn amount_for(&self, player_id: &str) -> u64 {
        self.awards
            .iter()
            .filter(|a| a.player_id == player_id)
            .map(|a| a.amount)
            .sum()
    }
}

/// Splits `amount` into `parts` shares by floor division; the first share
/// takes the remainder.
pub fn split_evenly(amount: u64, parts: usize) -> Vec<u64> {
    if parts == 0 {
        return Vec::new();
    }
    let n = parts as u64;
    let mut shares = vec![amount / n; parts];
    shares[0] += amount % n;
    shares
}

/// Pots built from a hand's contributions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotCalculator {
    pots: Vec<Pot>,
    wagered: u64,
}

impl PotCalculator {
    pub fn from_contributions(contributions: &[Contribution]) -> Self {
        let mut ordered: Vec<&Contribution> = contributions.iter().collect();
        ordered.sort_by_key(|c| c.seat);

        let mut levels: Vec<u64> = ordered
            .iter()
            .map(|c| c.amount)
            .filter(|&a| a > 0)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut pots: Vec<Pot> = Vec::with_capacity(levels.len());
        let mut prev = 0u64;
        for level in levels {
            let reached: Vec<&&Contribution> =
                ordered.iter().filter(|c| c.amount >= level).collect();
            let amount = (level - prev) * reached.len() as u64;
            let eligible: Vec<PlayerId> = reached
                .iter()
                .filter(|c| !c.folded)
                .map(|c| c.player_id.clone())
                .collect();
            prev = level;

            if eligible.is_empty() {
                // everyone at this level folded; the layer below is a superset
                if let Some(last) = pots.last_mut() {
                    last.amount += amount;
                    continue;
                }
                let live: Vec<PlayerId> = ordered
                    .iter()
                    .filter(|c| !c.folded)
                    .map(|c| c.player_id.clone())
                    .collect();
                pots.push(Pot {
                    amount,
                    eligible: live,
                    contributors: reached.len(),
                });
                continue;
            }
            pots.push(Pot {
                amount,
                eligible,
                contributors: reached.len(),
            });
        }

        Self {
            pots,
            wagered: contributions.iter().map(|c| c.amount).sum(),
        }
    }

    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }

    pub fn wagered(&self) -> u64 {
        self.wagered
    }

    pub fn main_pot(&self) -> u64 {
        self.pots.first().map_or(0, |p| p.amount)
    }

    pub fn side_pots(&self) -> Vec<u64> {
        self.pots.iter().skip(1).map(|p| p.amount).collect()
    }

    /// The same pots scaled to one of `runs` boards. Each layer is split
    /// with [`split_evenly`], so run 0 carries every layer's odd chips.
    pub fn for_run(&self, run: usize, runs: usize) -> Vec<Pot> {
        self.pots
            .iter()
            .map(|p| Pot {
                amount: split_evenly(p.amount, runs).get(run).copied().unwrap_or(0),
                ..p.clone()
            })
            .collect()
    }

    /// Awards `pots` using `winners_of`, which is only consulted for pots
    /// with more than one eligible player.
    pub fn distribute<F>(pots: &[Pot], mut winners_of: F) -> Distribution
    where
        F: FnMut(&[PlayerId]) -> PotWinners,
    {
        let mut dist = Distribution::default();
        for (pot_index, pot) in pots.iter().enumerate() {
            if pot.amount == 0 {
                continue;
            }
            if let [only] = pot.eligible.as_slice() {
                dist.awards.push(Award {
                    pot_index,
                    player_id: only.clone(),
                    amount: pot.amount,
                    kind: if pot.is_uncalled() {
                        AwardKind::Uncalled
                    } else {
                        AwardKind::Uncontested
                    },
                });
                continue;
            }

            let winners = winners_of(&pot.eligible);
            let high = in_seat_order(&winners.high, &pot.eligible);
            let low = in_seat_order(&winners.low, &pot.eligible);
            let (high_share, low_share) = if low.is_empty() {
                (pot.amount, 0)
            } else {
                let low_half = pot.amount / 2;
                (pot.amount - low_half, low_half)
            };
            award_split(&mut dist, pot_index, &high, high_share, AwardKind::High);
            award_split(&mut dist, pot_index, &low, low_share, AwardKind::Low);
        }
        dist
    }

    /// Builds the pots, distributes them and checks that every wagered chip
    /// was handed out exactly once.
    pub fn settle<F>(contributions: &[Contribution], winners_of: F) -> Result<Distribution, EngineFault>
    where
        F: FnMut(&[PlayerId]) -> PotWinners,
    {
        let calc = Self::from_contributions(contributions);
        let dist = Self::distribute(&calc.pots, winners_of);
        verify_conservation(calc.wagered, dist.total())?;
        Ok(dist)
    }
}

/// Fails loudly when chips were created or lost during settlement.
pub fn verify_conservation(wagered: u64, distributed: u64) -> Result<(), EngineFault> {
    if wagered == distributed {
        return Ok(());
    }
    tracing::error!(wagered, distributed, "chip conservation violated during settlement");
    Err(EngineFault::ChipConservation {
        wagered,
        distributed,
    })
}

fn in_seat_order(winners: &[PlayerId], eligible: &[PlayerId]) -> Vec<PlayerId> {
    eligible
        .iter()
        .filter(|id| winners.contains(id))
        .cloned()
        .collect()
}

fn award_split(
    dist: &mut Distribution,
    pot_index: usize,
    winners: &[PlayerId],
    amount: u64,
    kind: AwardKind,
) {
    if amount == 0 || winners.is_empty() {
        return;
    }
    for (id, share) in winners.iter().zip(split_evenly(amount, winners.len())) {
        dist.awards.push(Award {
            pot_index,
            player_id: id.clone(),
            amount: share,
            kind,
        });
    }
}
