// A seat at the table. Humans and automated players share this one type; who makes a seat's
// decisions is carried by `PlayerKind` and resolved by the engine.

use crate::types::{tally, Card, Colour, Tally};

use serde::Serialize;

// Cards in a full hand.
pub const HAND_SIZE: usize = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum PlayerKind {
    // Choices arrive from outside: a network session or the local console.
    Human,
    // Choices are computed by the engine's strategy.
    Automated,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub name: String,
    pub kind: PlayerKind,
    pub hand: Vec<Card>,
    pub collected: Vec<Card>,
}

impl Player {
    pub fn new(name: impl Into<String>, kind: PlayerKind, hand: Vec<Card>) -> Self {
        Player {
            name: name.into(),
            kind,
            hand,
            collected: Vec::new(),
        }
    }

    pub fn is_human(&self) -> bool {
        self.kind == PlayerKind::Human
    }

    pub fn tally(&self) -> Tally {
        tally(&self.collected)
    }

    pub fn has_all_colours(&self) -> bool {
        Colour::ALL
            .iter()
            .all(|colour| self.collected.iter().any(|c| c.colour == *colour))
    }

    // Removes the card at a 0-based hand position. Callers validate the index.
    pub fn take_from_hand(&mut self, index: usize) -> Card {
        self.hand.remove(index)
    }

    // Drops the cards at the given hand positions and moves the rest of the hand into the
    // collection. Returns the dropped cards.
    pub fn discard_and_keep_rest(&mut self, discards: &[usize]) -> Vec<Card> {
        let mut dropped = Vec::with_capacity(discards.len());
        for (i, card) in self.hand.drain(..).enumerate() {
            if discards.contains(&i) {
                dropped.push(card);
            } else {
                self.collected.push(card);
            }
        }
        dropped
    }
}

// Generated names for automated seats, e.g. "AI 1".
pub fn automated_name(n: usize) -> String {
    format!("AI {}", n)
}
