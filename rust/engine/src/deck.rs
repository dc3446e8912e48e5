use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::cards::{full_deck, Card};
use crate::errors::EngineFault;

/// Community-card streets a rabbit hunt can reveal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardStreet {
    Flop,
    Turn,
    River,
}

impl BoardStreet {
    /// Board slots this street occupies.
    pub fn slots(self) -> std::ops::Range<usize> {
        match self {
            BoardStreet::Flop => 0..3,
            BoardStreet::Turn => 3..4,
            BoardStreet::River => 4..5,
        }
    }
}

/// Projected five-card board built from the cards nobody has seen yet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RabbitPreview {
    pub board: Vec<Card>,
    /// How many leading cards of `board` were actually dealt in the hand.
    pub revealed: usize,
}

/// The live deck of a hand. Cards are dealt from the top (index 0 of the
/// remaining slice); the order is fixed once [`Deck::reset_deck`] runs.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
    stacked: Option<Vec<Card>>,
    preview: Option<RabbitPreview>,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    pub fn new() -> Self {
        Self {
            cards: full_deck(),
            position: 0,
            stacked: None,
            preview: None,
        }
    }

    /// A deck that always resets to `order` (top card first) instead of
    /// shuffling. Used to replay recorded hands and to rig test scenarios.
    /// Cards missing from `order` follow it in canonical order.
    pub fn stacked(order: Vec<Card>) -> Self {
        let mut cards = order.clone();
        for c in full_deck() {
            if !cards.contains(&c) {
                cards.push(c);
            }
        }
        Self {
            cards: cards.clone(),
            position: 0,
            stacked: Some(cards),
            preview: None,
        }
    }

    /// Rebuilds the full 52 cards and shuffles them with `rng`.
    pub fn reset_deck(&mut self, rng: &mut dyn RngCore) {
        match &self.stacked {
            Some(order) => self.cards = order.clone(),
            None => {
                self.cards = full_deck();
                self.cards.shuffle(rng);
            }
        }
        self.position = 0;
        self.preview = None;
    }

    pub fn deal_card(&mut self) -> Result<Card, EngineFault> {
        match self.cards.get(self.position) {
            Some(&c) => {
                self.position += 1;
                Ok(c)
            }
            None => Err(EngineFault::DeckExhausted {
                needed: 1,
                remaining: 0,
            }),
        }
    }

    pub fn deal_cards(&mut self, n: usize) -> Result<Vec<Card>, EngineFault> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(EngineFault::DeckExhausted {
                needed: n,
                remaining,
            });
        }
        let dealt = self.cards[self.position..self.position + n].to_vec();
        self.position += n;
        Ok(dealt)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }

    /// Cards not yet dealt, in dealing order.
    pub fn undealt(&self) -> &[Card] {
        &self.cards[self.position.min(self.cards.len())..]
    }

    /// Builds the rabbit-hunt projection for a hand that ended with
    /// `community` on the board. `known` lists every other card that has
    /// been exposed (hole cards shown at the table); those never appear in
    /// the projection. The live deck is left untouched.
    pub fn prepare_rabbit_preview(
        &mut self,
        community: &[Card],
        known: &[Card],
    ) -> Result<&RabbitPreview, EngineFault> {
        let missing = 5usize.saturating_sub(community.len());
        let unseen: Vec<Card> = self
            .undealt()
            .iter()
            .copied()
            .filter(|c| !community.contains(c) && !known.contains(c))
            .take(missing)
            .collect();
        if unseen.len() < missing {
            return Err(EngineFault::DeckExhausted {
                needed: missing,
                remaining: unseen.len(),
            });
        }
        let mut board: Vec<Card> = community.iter().copied().take(5).collect();
        board.extend(unseen);
        Ok(self.preview.insert(RabbitPreview {
            board,
            revealed: community.len().min(5),
        }))
    }

    /// Cards `street` would have shown. Repeated calls return the same cards.
    pub fn preview_rabbit_hunt(&self, street: BoardStreet) -> Option<Vec<Card>> {
        let preview = self.preview.as_ref()?;
        preview.board.get(street.slots()).map(<[Card]>::to_vec)
    }

    pub fn rabbit_preview(&self) -> Option<&RabbitPreview> {
        self.preview.as_ref()
    }
}
