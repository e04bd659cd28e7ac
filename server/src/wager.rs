// The side bet played alongside the parade: each cycle of turns, human players wager on the
// points they collect in that cycle landing closest to a target without going over.

use crate::types::Card;

use serde::Serialize;

pub const MINIMUM_BID: u32 = 10;
pub const TARGET_SCORE: u32 = 15;
pub const STARTING_BANKROLL: u32 = 1000;
// Paid once, at the end of the game, to each human winner of the parade itself.
pub const PARADE_BONUS: u32 = 800;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Account {
    pub seat: usize,
    pub bankroll: u32,
    pub wager: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RoundResult {
    // The listed seats were closest to the target with the given score.
    Winners { seats: Vec<usize>, score: u32 },
    // Every player went over the target.
    AllBust,
    // Every player tied for closest.
    Push,
}

// Bankrolls and current wagers of the human seats.
#[derive(Clone, Debug)]
pub struct WagerBook {
    accounts: Vec<Account>,
}

impl WagerBook {
    pub fn new(human_seats: impl IntoIterator<Item = usize>) -> Self {
        WagerBook {
            accounts: human_seats
                .into_iter()
                .map(|seat| Account {
                    seat,
                    bankroll: STARTING_BANKROLL,
                    wager: 0,
                })
                .collect(),
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, seat: usize) -> Option<&Account> {
        self.accounts.iter().find(|a| a.seat == seat)
    }

    // First seat at or after `from` that takes part in wagering.
    pub fn next_seat(&self, from: usize) -> Option<usize> {
        self.accounts.iter().map(|a| a.seat).find(|s| *s >= from)
    }

    pub fn can_bid(&self, seat: usize) -> bool {
        self.account(seat).is_some_and(|a| a.bankroll >= MINIMUM_BID)
    }

    pub fn place(&mut self, seat: usize, wager: u32) {
        if let Some(account) = self.accounts.iter_mut().find(|a| a.seat == seat) {
            debug_assert!(wager <= account.bankroll);
            account.wager = wager;
        }
    }

    // Settles one cycle from the cards each seat collected during it; `hauls` is indexed by seat.
    // Winners gain their own wager and everyone else loses theirs. Wagers are cleared afterwards.
    pub fn settle(&mut self, hauls: &[Vec<Card>]) -> RoundResult {
        let scores: Vec<(usize, u32)> = self
            .accounts
            .iter()
            .map(|a| {
                let haul = hauls.get(a.seat).map(Vec::as_slice).unwrap_or_default();
                (a.seat, haul.iter().map(|c| u32::from(c.value)).sum())
            })
            .collect();

        let result = round_result(&scores);
        if let RoundResult::Winners { seats, .. } = &result {
            for account in &mut self.accounts {
                if seats.contains(&account.seat) {
                    account.bankroll += account.wager;
                } else {
                    account.bankroll = account.bankroll.saturating_sub(account.wager);
                }
            }
        }

        self.void();
        result
    }

    // Drops the current wagers without settling them.
    pub fn void(&mut self) {
        for account in &mut self.accounts {
            account.wager = 0;
        }
    }

    pub fn award_bonus(&mut self, seats: &[usize]) {
        for account in &mut self.accounts {
            if seats.contains(&account.seat) {
                account.bankroll += PARADE_BONUS;
            }
        }
    }

    #[cfg(test)]
    pub fn accounts_mut(&mut self) -> &mut [Account] {
        &mut self.accounts
    }

    // Seats with the highest bankroll.
    pub fn leaders(&self) -> Vec<usize> {
        let Some(top) = self.accounts.iter().map(|a| a.bankroll).max() else {
            return Vec::new();
        };
        self.accounts
            .iter()
            .filter(|a| a.bankroll == top)
            .map(|a| a.seat)
            .collect()
    }
}

// Picks the seats whose score is closest to the target without exceeding it.
pub fn round_result(scores: &[(usize, u32)]) -> RoundResult {
    let Some(best) = scores
        .iter()
        .map(|(_, s)| *s)
        .filter(|s| *s <= TARGET_SCORE)
        .max()
    else {
        return RoundResult::AllBust;
    };

    let seats: Vec<usize> = scores
        .iter()
        .filter(|(_, s)| *s == best)
        .map(|(seat, _)| *seat)
        .collect();

    if seats.len() == scores.len() {
        return RoundResult::Push;
    }

    RoundResult::Winners { seats, score: best }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour::*;

    fn haul(values: &[u8]) -> Vec<Card> {
        values.iter().map(|v| Card::new(*v, Red)).collect()
    }

    fn bankrolls(book: &WagerBook) -> Vec<u32> {
        book.accounts().iter().map(|a| a.bankroll).collect()
    }

    #[test]
    fn everyone_over_target_changes_nothing() {
        let mut book = WagerBook::new([0, 1]);
        book.place(0, 100);
        book.place(1, 50);

        let result = book.settle(&[haul(&[9, 8]), haul(&[10, 10])]);

        assert_eq!(result, RoundResult::AllBust);
        assert_eq!(bankrolls(&book), vec![1000, 1000]);
    }

    #[test]
    fn closest_under_target_wins_own_wager_others_lose_theirs() {
        let mut book = WagerBook::new([0, 1, 2]);
        book.place(0, 100);
        book.place(1, 50);
        book.place(2, 20);

        let result = book.settle(&[haul(&[7, 7]), haul(&[10]), haul(&[9, 9])]);

        assert_eq!(
            result,
            RoundResult::Winners {
                seats: vec![0],
                score: 14
            }
        );
        assert_eq!(bankrolls(&book), vec![1100, 950, 980]);
        assert!(book.accounts().iter().all(|a| a.wager == 0));
    }

    #[test]
    fn tie_among_some_players_pays_each_winner() {
        let mut book = WagerBook::new([0, 1, 2]);
        book.place(0, 10);
        book.place(1, 30);
        book.place(2, 40);

        let result = book.settle(&[haul(&[5]), haul(&[2, 3]), haul(&[1])]);

        assert_eq!(
            result,
            RoundResult::Winners {
                seats: vec![0, 1],
                score: 5
            }
        );
        assert_eq!(bankrolls(&book), vec![1010, 1030, 960]);
    }

    #[test]
    fn tie_among_all_players_is_a_push() {
        let mut book = WagerBook::new([0, 1]);
        book.place(0, 10);
        book.place(1, 30);

        assert_eq!(book.settle(&[haul(&[4]), haul(&[4])]), RoundResult::Push);
        assert_eq!(bankrolls(&book), vec![1000, 1000]);
    }

    #[test]
    fn only_human_seats_take_part() {
        // Seat 1 is automated: its haul is ignored.
        let mut book = WagerBook::new([0, 2]);
        book.place(0, 10);
        book.place(2, 10);

        let result = book.settle(&[haul(&[3]), haul(&[10, 5]), haul(&[10, 10])]);

        assert_eq!(
            result,
            RoundResult::Winners {
                seats: vec![0],
                score: 3
            }
        );
        assert_eq!(book.next_seat(1), Some(2));
        assert_eq!(book.next_seat(3), None);
    }

    #[test]
    fn bonus_and_leaders() {
        let mut book = WagerBook::new([0, 1]);
        book.award_bonus(&[1]);
        assert_eq!(book.leaders(), vec![1]);

        book.award_bonus(&[0]);
        assert_eq!(book.leaders(), vec![0, 1]);
    }

    #[test]
    fn small_bankroll_cannot_bid() {
        let mut book = WagerBook::new([0]);
        assert!(book.can_bid(0));

        book.accounts[0].bankroll = MINIMUM_BID - 1;
        assert!(!book.can_bid(0));
        assert!(!book.can_bid(5));
    }
}
