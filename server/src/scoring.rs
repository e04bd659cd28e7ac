// Final scores from the players' collections. Lower is better.

use crate::types::{Colour, Tally};

// Scores each player, in seating order, from their per-colour tallies.
//
// For each colour a player normally scores the face values of their cards. A player with a
// majority of that colour instead scores one point per card. With two players a majority needs at
// least two more cards than the opponent; with more players it is everyone holding the highest
// count, unless every player holds that count.
pub fn score(tallies: &[Tally]) -> Vec<u32> {
    if tallies.len() == 2 {
        return score_pair(&tallies[0], &tallies[1]);
    }

    let mut scores = vec![0; tallies.len()];
    for colour in Colour::ALL {
        let c = colour.index();
        let max = tallies.iter().map(|t| t[c].0).max().unwrap_or(0);
        let shared_by_all = tallies.iter().all(|t| t[c].0 == max);

        for (score, tally) in scores.iter_mut().zip(tallies) {
            let (count, points) = tally[c];
            *score += if count == max && !shared_by_all {
                count
            } else {
                points
            };
        }
    }

    scores
}

fn score_pair(a: &Tally, b: &Tally) -> Vec<u32> {
    let mut scores = vec![0, 0];
    for colour in Colour::ALL {
        let c = colour.index();
        let (a_count, a_points) = a[c];
        let (b_count, b_points) = b[c];

        if a_count.abs_diff(b_count) <= 1 {
            scores[0] += a_points;
            scores[1] += b_points;
        } else if a_count > b_count {
            scores[0] += a_count;
            scores[1] += b_points;
        } else {
            scores[0] += a_points;
            scores[1] += b_count;
        }
    }
    scores
}

// Seats holding the lowest score. Ties give several winners.
pub fn winners(scores: &[u32]) -> Vec<usize> {
    let Some(lowest) = scores.iter().min() else {
        return Vec::new();
    };

    scores
        .iter()
        .enumerate()
        .filter(|(_, s)| *s == lowest)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{tally, Card, Colour::*};

    fn cards(pairs: &[(u8, crate::types::Colour)]) -> Vec<Card> {
        pairs.iter().map(|(v, c)| Card::new(*v, *c)).collect()
    }

    #[test]
    fn two_players_within_one_card_both_score_points() {
        let a = tally(&cards(&[(5, Red), (6, Red), (7, Red)]));
        let b = tally(&cards(&[(1, Red), (2, Red), (3, Red)]));
        assert_eq!(score(&[a, b]), vec![18, 6]);

        let a = tally(&cards(&[(5, Red), (6, Red)]));
        let b = tally(&cards(&[(1, Red), (2, Red), (3, Red)]));
        assert_eq!(score(&[a, b]), vec![11, 6]);
    }

    #[test]
    fn two_player_majority_scores_card_count() {
        let a = tally(&cards(&[(9, Blue), (9, Blue), (8, Blue), (7, Blue), (6, Blue)]));
        let b = tally(&cards(&[(4, Blue), (3, Blue)]));
        assert_eq!(score(&[a, b]), vec![5, 7]);

        // Same the other way round.
        assert_eq!(score(&[b, a]), vec![7, 5]);
    }

    #[test]
    fn many_players_universal_tie_scores_points() {
        let empty = tally(&[]);
        assert_eq!(score(&[empty, empty, empty]), vec![0, 0, 0]);

        let a = tally(&cards(&[(4, Green)]));
        let b = tally(&cards(&[(6, Green)]));
        let c = tally(&cards(&[(8, Green)]));
        assert_eq!(score(&[a, b, c]), vec![4, 6, 8]);
    }

    #[test]
    fn many_players_every_holder_of_the_maximum_is_penalised() {
        let a = tally(&cards(&[(9, Grey), (9, Grey)]));
        let b = tally(&cards(&[(8, Grey), (7, Grey)]));
        let c = tally(&cards(&[(10, Grey)]));
        // Two of three players share the maximum: both score their count.
        assert_eq!(score(&[a, b, c]), vec![2, 2, 10]);
    }

    #[test]
    fn many_players_single_leader() {
        let a = tally(&cards(&[(1, Orange), (2, Orange), (3, Orange)]));
        let b = tally(&[]);
        let c = tally(&cards(&[(10, Orange)]));
        let d = tally(&cards(&[(10, Purple)]));
        assert_eq!(score(&[a, b, c, d]), vec![3, 0, 10, 1]);
    }

    #[test]
    fn scores_sum_over_colours() {
        let a = tally(&cards(&[(3, Red), (4, Blue)]));
        let b = tally(&cards(&[(5, Red), (6, Red), (7, Red), (2, Blue)]));
        // Red: 1 vs 3 -> b scores its count. Blue: 1 vs 1 -> points.
        assert_eq!(score(&[a, b]), vec![7, 5]);
    }

    #[test]
    fn lowest_score_wins_and_ties_share() {
        assert_eq!(winners(&[12, 7, 30]), vec![1]);
        assert_eq!(winners(&[7, 12, 7]), vec![0, 2]);
        assert!(winners(&[]).is_empty());
    }
}
