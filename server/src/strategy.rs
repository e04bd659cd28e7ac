// Decision making for automated seats.

use crate::parade::ParadeLine;
use crate::types::{tally, Card};

// Computes the choices of an automated seat. The engine owns one of these and consults it
// whenever an automated player has to act.
pub trait Strategy: Send {
    // 0-based position in `hand` of the card to play. `hand` is never empty.
    fn choose_card(&self, hand: &[Card], line: &ParadeLine) -> usize;

    // 0-based positions in `hand` of the `keep` cards to add to the collection at game end; the
    // rest of the hand is discarded. Positions are distinct.
    fn choose_keepers(&self, hand: &[Card], collected: &[Card], keep: usize) -> Vec<usize>;
}

// Plays whatever picks up the fewest points right now, and keeps cards that reinforce the colours
// it already holds the most of.
#[derive(Clone, Copy, Debug, Default)]
pub struct Greedy;

impl Strategy for Greedy {
    fn choose_card(&self, hand: &[Card], line: &ParadeLine) -> usize {
        debug_assert!(!hand.is_empty());

        let mut best = 0;
        let mut best_points = u32::MAX;
        for (i, card) in hand.iter().enumerate() {
            let points: u32 = line
                .preview(*card)
                .iter()
                .map(|c| u32::from(c.value))
                .sum();
            // Strict comparison: the earliest card wins ties.
            if points < best_points {
                best = i;
                best_points = points;
            }
        }

        best
    }

    fn choose_keepers(&self, hand: &[Card], collected: &[Card], keep: usize) -> Vec<usize> {
        let mut counts: Vec<u32> = tally(collected).iter().map(|(n, _)| *n).collect();
        let mut kept: Vec<usize> = Vec::with_capacity(keep);

        for _ in 0..keep.min(hand.len()) {
            let available: Vec<usize> = (0..hand.len()).filter(|i| !kept.contains(i)).collect();

            // Prefer the colour held most often; only colours already held count.
            let mut pick: Option<(usize, u32)> = None;
            for &i in &available {
                let n = counts[hand[i].colour.index()];
                if n > 0 && pick.map_or(true, |(_, best)| n > best) {
                    pick = Some((i, n));
                }
            }

            // No overlap with the collection: fall back to the cheapest card.
            let index = match pick {
                Some((i, _)) => i,
                None => available
                    .iter()
                    .copied()
                    .min_by_key(|&i| hand[i].value)
                    .unwrap_or_default(),
            };

            counts[hand[index].colour.index()] += 1;
            kept.push(index);
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour::*;

    fn c(value: u8, colour: crate::types::Colour) -> Card {
        Card::new(value, colour)
    }

    #[test]
    fn plays_the_card_collecting_the_fewest_points() {
        let line = ParadeLine::new(vec![c(5, Red), c(3, Blue), c(0, Green), c(7, Orange)]);
        let hand = [
            // Collects red 5 and green 0: 5 points.
            c(0, Red),
            // Collects green 0 and orange 7: 7 points.
            c(0, Orange),
            // Only red 5 is in reach, and it does not qualify: 0 points.
            c(3, Grey),
        ];

        assert_eq!(Greedy.choose_card(&hand, &line), 2);
    }

    #[test]
    fn ties_go_to_the_first_card() {
        let line = ParadeLine::new(vec![c(9, Red)]);
        let hand = [c(5, Blue), c(6, Green), c(7, Grey)];
        assert_eq!(Greedy.choose_card(&hand, &line), 0);
    }

    #[test]
    fn keeps_cards_of_the_most_collected_colour() {
        let collected = [c(1, Red), c(2, Red), c(4, Blue)];
        let hand = [c(9, Green), c(8, Blue), c(7, Red), c(0, Grey)];

        let kept = Greedy.choose_keepers(&hand, &collected, 2);

        // Red (2 held) first, then blue (1 held) over colours not held at all.
        assert_eq!(kept, vec![2, 1]);
    }

    #[test]
    fn kept_cards_reinforce_their_own_colour() {
        let collected = [c(1, Red), c(2, Blue)];
        let hand = [c(5, Blue), c(6, Red), c(3, Blue)];

        let kept = Greedy.choose_keepers(&hand, &collected, 2);

        // Blue 5 wins the first tie by position, after which blue leads.
        assert_eq!(kept, vec![0, 2]);
    }

    #[test]
    fn falls_back_to_lowest_values_without_overlap() {
        let collected = [c(1, Red)];
        let hand = [c(9, Green), c(2, Blue), c(4, Grey), c(3, Orange)];

        let kept = Greedy.choose_keepers(&hand, &collected, 2);

        assert_eq!(kept, vec![1, 3]);
    }
}
