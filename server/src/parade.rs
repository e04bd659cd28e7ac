// The shared line of face-up cards, and the rule deciding which of them a played card collects.

use crate::types::{show_line, Card};

// Number of cards dealt face up before the first turn.
pub const INITIAL_LINE: usize = 6;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParadeLine {
    // In play order: the most recently played card is last.
    cards: Vec<Card>,
}

impl ParadeLine {
    pub fn new(cards: Vec<Card>) -> Self {
        ParadeLine { cards }
    }

    #[cfg(test)]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    // The cards that `card` would collect, in line order, without changing the line.
    //
    // The last `card.value` cards are out of reach. Of the rest, a card is taken if it shares the
    // played card's colour or its value is no greater than the played card's.
    pub fn preview(&self, card: Card) -> Vec<Card> {
        self.collectable(card).map(|i| self.cards[i]).collect()
    }

    // Removes and returns the cards `card` collects, then appends `card` to the end of the line.
    pub fn collect(&mut self, card: Card) -> Vec<Card> {
        let taken: Vec<usize> = self.collectable(card).collect();

        let mut collected = Vec::with_capacity(taken.len());
        let mut kept = Vec::with_capacity(self.cards.len() + 1 - taken.len());
        let mut next = taken.iter().peekable();
        for (i, c) in self.cards.drain(..).enumerate() {
            if next.peek() == Some(&&i) {
                next.next();
                collected.push(c);
            } else {
                kept.push(c);
            }
        }

        kept.push(card);
        self.cards = kept;

        collected
    }

    // Indices of collectable cards. Empty when the protected zone covers the whole line.
    fn collectable(&self, card: Card) -> impl Iterator<Item = usize> + '_ {
        let reachable = self.cards.len().saturating_sub(usize::from(card.value));
        self.cards[..reachable]
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.colour == card.colour || c.value <= card.value)
            .map(|(i, _)| i)
    }
}

impl std::fmt::Display for ParadeLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&show_line(&self.cards))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour::*;

    fn c(value: u8, colour: crate::types::Colour) -> Card {
        Card::new(value, colour)
    }

    fn sample_line() -> ParadeLine {
        ParadeLine::new(vec![
            c(5, Red),
            c(3, Blue),
            c(0, Green),
            c(7, Orange),
            c(2, Grey),
            c(9, Purple),
        ])
    }

    #[test]
    fn collects_by_colour_or_lower_value_outside_protected_zone() {
        let mut line = sample_line();

        let collected = line.collect(c(2, Red));

        assert_eq!(collected, vec![c(5, Red), c(0, Green)]);
        assert_eq!(
            line.cards(),
            &[c(3, Blue), c(7, Orange), c(2, Grey), c(9, Purple), c(2, Red)]
        );
    }

    #[test]
    fn value_at_least_line_length_collects_nothing() {
        for value in [6, 7, 10] {
            let mut line = sample_line();
            let collected = line.collect(c(value, Red));

            assert!(collected.is_empty());
            assert_eq!(line.len(), 7);
            assert_eq!(line.cards()[..6], sample_line().cards()[..]);
            assert_eq!(line.cards()[6], c(value, Red));
        }
    }

    #[test]
    fn zero_scans_the_whole_line() {
        let mut line = sample_line();

        // Only the green 0 qualifies by value; red 5 qualifies by colour.
        let collected = line.collect(c(0, Red));

        assert_eq!(collected, vec![c(5, Red), c(0, Green)]);
        assert_eq!(line.len(), 5);
    }

    #[test]
    fn zero_of_a_shared_colour_takes_every_match() {
        let mut line = ParadeLine::new(vec![c(4, Blue), c(8, Blue), c(6, Red)]);

        let collected = line.collect(c(0, Blue));

        assert_eq!(collected, vec![c(4, Blue), c(8, Blue)]);
        assert_eq!(line.cards(), &[c(6, Red), c(0, Blue)]);
    }

    #[test]
    fn protected_zone_shields_matching_cards() {
        let mut line = ParadeLine::new(vec![c(9, Grey), c(1, Red), c(1, Red)]);

        // Value 2 protects the two reds at the end.
        let collected = line.collect(c(2, Red));

        assert!(collected.is_empty());
        assert_eq!(line.len(), 4);
    }

    #[test]
    fn duplicate_cards_are_removed_individually() {
        let mut line = ParadeLine::new(vec![c(1, Red), c(8, Grey), c(1, Red), c(9, Blue)]);

        let collected = line.collect(c(1, Green));

        assert_eq!(collected, vec![c(1, Red), c(1, Red)]);
        assert_eq!(line.cards(), &[c(8, Grey), c(9, Blue), c(1, Green)]);
    }

    #[test]
    fn preview_matches_collect_without_mutating() {
        let line = sample_line();
        let preview = line.preview(c(2, Red));
        assert_eq!(line, sample_line());

        let mut played = sample_line();
        assert_eq!(played.collect(c(2, Red)), preview);
    }
}
