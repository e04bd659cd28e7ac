// The finite supply of cards for one game.

use crate::types::{Card, Colour, MAX_VALUE};

use rand::seq::SliceRandom;
use rand::Rng;

// Number of cards in a full deck: one per (colour, value) pair.
pub const DECK_SIZE: usize = Colour::ALL.len() * (MAX_VALUE as usize + 1);

#[derive(Debug)]
pub struct Deck {
    // The top of the deck is the end of the vector.
    cards: Vec<Card>,
}

impl Deck {
    // A full deck, permuted once with the given generator.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = full_deck();
        cards.shuffle(rng);
        Deck { cards }
    }

    // A deck that deals the given cards in order, first card first.
    #[cfg(test)]
    pub fn stacked(mut cards: Vec<Card>) -> Self {
        cards.reverse();
        Deck { cards }
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    // Draws up to `n` cards, fewer if the deck runs out.
    pub fn draw_many(&mut self, n: usize) -> Vec<Card> {
        (0..n).map_while(|_| self.draw()).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// Populate a vector with one card for every colour and value.
fn full_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);

    for colour in Colour::ALL {
        for value in 0..=MAX_VALUE {
            deck.push(Card::new(value, colour));
        }
    }

    deck
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn full_deck_has_every_pair_once() {
        let mut deck = Deck::shuffled(&mut StdRng::seed_from_u64(7));
        assert_eq!(deck.len(), 66);

        let drawn = deck.draw_many(100);
        assert_eq!(drawn.len(), 66);
        assert!(deck.is_empty());
        assert_eq!(deck.draw(), None);

        let unique: HashSet<_> = drawn.iter().copied().collect();
        assert_eq!(unique.len(), 66);
    }

    #[test]
    fn same_seed_gives_same_order() {
        let a = Deck::shuffled(&mut StdRng::seed_from_u64(42)).draw_many(66);
        let b = Deck::shuffled(&mut StdRng::seed_from_u64(42)).draw_many(66);
        assert_eq!(a, b);
    }

    #[test]
    fn stacked_deck_deals_in_order() {
        let mut deck = Deck::stacked(vec![Card::new(1, Colour::Red), Card::new(2, Colour::Blue)]);
        assert_eq!(deck.draw(), Some(Card::new(1, Colour::Red)));
        assert_eq!(deck.draw(), Some(Card::new(2, Colour::Blue)));
        assert!(deck.is_empty());
    }
}
