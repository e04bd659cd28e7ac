// The turn engine: deals the game, sequences turns, runs automated seats, latches the final round
// and settles the end of the game. It never waits on anything itself. Whenever a human has to
// decide, `next_request` hands back a `Request` and the caller answers it through `submit`.

use crate::deck::Deck;
use crate::error::InputError;
use crate::parade::{ParadeLine, INITIAL_LINE};
use crate::player::{Player, PlayerKind, HAND_SIZE};
use crate::scoring;
use crate::strategy::{Greedy, Strategy};
use crate::table::Sink;
use crate::types::{show_by_colour, show_line, show_numbered, Card};
use crate::wager::{RoundResult, WagerBook, MINIMUM_BID, PARADE_BONUS, TARGET_SCORE};

use log::{debug, info};
use serde::Serialize;

// Once the final round has begun, the game ends when no hand holds more than this many cards.
pub const FINAL_HAND_LIMIT: usize = 4;

// Cards every player throws away at the end of the game.
pub const DISCARDS: usize = 2;

pub const MAX_PLAYERS: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    PlayCard { hand_size: usize },
    // `nth` is 1 for the first discard and 2 for the second.
    Discard { nth: usize, hand_size: usize },
    Wager { minimum: u32, maximum: u32 },
}

// A decision the engine is waiting on from the human in `seat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    pub seat: usize,
    pub kind: RequestKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerResult {
    pub name: String,
    pub score: u32,
    pub bankroll: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameOutcome {
    pub players: Vec<PlayerResult>,
    // Lowest parade score; several on a tie.
    pub winners: Vec<String>,
    // Highest bankroll when wagers were played, otherwise empty.
    pub wager_winners: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    // Collecting wagers from human seats, starting at `seat`.
    Wagering { seat: usize },
    // The active seat plays a card.
    Turn,
    // End of game: `seat` throws away cards. `first` holds a human's first pick.
    Discarding { seat: usize, first: Option<usize> },
    Done,
}

pub struct TurnEngine {
    players: Vec<Player>,
    deck: Deck,
    line: ParadeLine,
    discarded: Vec<Card>,

    active: usize,
    round: u32,
    final_round: bool,
    phase: Phase,

    // Set whenever the phase or the acting seat changes, so the next step is announced once.
    announce_due: bool,

    // Cards each seat collected during the current cycle of turns. Only used for wagers.
    hauls: Vec<Vec<Card>>,
    wagers: Option<WagerBook>,

    strategy: Box<dyn Strategy>,
    outcome: Option<GameOutcome>,
}

impl TurnEngine {
    // Deals the parade line and every hand from `deck`. Seats play in the given order.
    pub fn new(seats: Vec<(String, PlayerKind)>, mut deck: Deck, with_wagers: bool) -> Self {
        debug_assert!((2..=MAX_PLAYERS).contains(&seats.len()));

        let line = ParadeLine::new(deck.draw_many(INITIAL_LINE));
        let players: Vec<Player> = seats
            .into_iter()
            .map(|(name, kind)| Player::new(name, kind, deck.draw_many(HAND_SIZE)))
            .collect();

        let wagers = with_wagers.then(|| {
            WagerBook::new(
                players
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.is_human())
                    .map(|(i, _)| i),
            )
        });

        let mut engine = TurnEngine {
            hauls: vec![Vec::new(); players.len()],
            players,
            deck,
            line,
            discarded: Vec::new(),
            active: 0,
            round: 1,
            final_round: false,
            phase: Phase::Turn,
            announce_due: true,
            wagers,
            strategy: Box::new(Greedy),
            outcome: None,
        };
        engine.begin_cycle();
        engine
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[cfg(test)]
    pub fn line(&self) -> &ParadeLine {
        &self.line
    }

    #[cfg(test)]
    pub fn active_seat(&self) -> usize {
        self.active
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    #[cfg(test)]
    pub fn is_final_round(&self) -> bool {
        self.final_round
    }

    #[cfg(test)]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::Done
    }

    #[cfg(test)]
    pub fn wagers(&self) -> Option<&WagerBook> {
        self.wagers.as_ref()
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    // Every card in the game, wherever it currently is. Always equals the size of the deal.
    #[cfg(test)]
    pub fn card_count(&self) -> usize {
        self.deck.len()
            + self.line.len()
            + self.discarded.len()
            + self
                .players
                .iter()
                .map(|p| p.hand.len() + p.collected.len())
                .sum::<usize>()
    }

    // The decision currently awaited from a human, if any. Has no side effects.
    pub fn pending(&self) -> Option<Request> {
        match self.phase {
            Phase::Turn => {
                let player = &self.players[self.active];
                player.is_human().then(|| Request {
                    seat: self.active,
                    kind: RequestKind::PlayCard {
                        hand_size: player.hand.len(),
                    },
                })
            }
            Phase::Discarding { seat, first } => {
                let player = self.players.get(seat)?;
                (player.is_human() && player.hand.len() > DISCARDS).then(|| Request {
                    seat,
                    kind: RequestKind::Discard {
                        nth: if first.is_some() { 2 } else { 1 },
                        hand_size: player.hand.len(),
                    },
                })
            }
            Phase::Wagering { seat } => {
                let book = self.wagers.as_ref()?;
                let seat = book.next_seat(seat)?;
                let account = book.account(seat)?;
                book.can_bid(seat).then(|| Request {
                    seat,
                    kind: RequestKind::Wager {
                        minimum: MINIMUM_BID,
                        maximum: account.bankroll,
                    },
                })
            }
            Phase::Done => None,
        }
    }

    // Runs the game forward until a human has to decide, and returns that decision. Returns
    // `None` once the game is over and scored.
    pub fn next_request(&mut self, sink: &mut dyn Sink) -> Option<Request> {
        loop {
            if let Some(request) = self.pending() {
                if self.announce_due {
                    self.announce(request.seat, sink);
                }
                return Some(request);
            }

            match self.phase {
                Phase::Done => return None,

                Phase::Turn => {
                    let seat = self.active;
                    if self.announce_due {
                        self.announce(seat, sink);
                    }
                    let index = self
                        .strategy
                        .choose_card(&self.players[seat].hand, &self.line);
                    self.play(index, sink);
                }

                Phase::Discarding { seat, .. } if seat >= self.players.len() => {
                    self.finish(sink);
                }

                Phase::Discarding { seat, .. } => {
                    let hand = &self.players[seat].hand;
                    let discards: Vec<usize> = if hand.len() <= DISCARDS {
                        (0..hand.len()).collect()
                    } else {
                        let keep = hand.len() - DISCARDS;
                        let keepers = self.strategy.choose_keepers(
                            hand,
                            &self.players[seat].collected,
                            keep,
                        );
                        (0..hand.len()).filter(|i| !keepers.contains(i)).collect()
                    };
                    self.discard(seat, &discards, sink);
                }

                Phase::Wagering { seat } => {
                    let next = self.wagers.as_ref().and_then(|book| book.next_seat(seat));
                    match next {
                        None => {
                            self.announce_wagers(sink);
                            self.phase = Phase::Turn;
                            self.announce_due = true;
                        }
                        // Only reached when the seat cannot afford the minimum bid.
                        Some(seat) => {
                            if let Some(book) = self.wagers.as_mut() {
                                book.place(seat, 0);
                            }
                            sink.tell(
                                &self.players[seat].name,
                                "You don't have enough money to bet anymore. Focus on the parade!",
                            );
                            self.phase = Phase::Wagering { seat: seat + 1 };
                            self.announce_due = true;
                        }
                    }
                }
            }
        }
    }

    // The private lines shown to the human who must answer `request`.
    pub fn prompt(&self, request: &Request) -> Vec<String> {
        let player = &self.players[request.seat];
        match request.kind {
            RequestKind::PlayCard { hand_size } => vec![
                format!("Your hand: {}", show_numbered(&player.hand)),
                format!("Choose a card to play (1-{}):", hand_size),
            ],
            RequestKind::Discard { nth, hand_size } => vec![
                format!("Your collected cards: {}", show_by_colour(&player.collected)),
                format!("Your hand: {}", show_numbered(&player.hand)),
                format!(
                    "Choose the {} card to discard (1-{}):",
                    if nth == 1 { "1st" } else { "2nd" },
                    hand_size
                ),
            ],
            RequestKind::Wager { minimum, maximum } => vec![
                format!("Your current bankroll is ${}.", maximum),
                format!("Enter your wager (${} to ${}):", minimum, maximum),
            ],
        }
    }

    // Applies a human's 1-based answer to the pending request. An invalid answer changes nothing.
    pub fn submit(&mut self, answer: i64, sink: &mut dyn Sink) -> Result<(), InputError> {
        let request = self.pending().ok_or(InputError::NotExpected)?;

        match (request.kind, self.phase) {
            (RequestKind::PlayCard { hand_size }, _) => {
                let index = to_index(answer, hand_size)?;
                self.play(index, sink);
            }

            (RequestKind::Discard { hand_size, .. }, Phase::Discarding { seat, first }) => {
                let index = to_index(answer, hand_size)?;
                match first {
                    None => {
                        self.phase = Phase::Discarding {
                            seat,
                            first: Some(index),
                        };
                    }
                    Some(first) if first == index => return Err(InputError::SameCard),
                    Some(first) => self.discard(seat, &[first, index], sink),
                }
            }

            (RequestKind::Wager { minimum, maximum }, _) => {
                let wager = u32::try_from(answer)
                    .ok()
                    .filter(|w| (minimum..=maximum).contains(w))
                    .ok_or(InputError::WagerOutOfRange { minimum, maximum })?;
                if let Some(book) = self.wagers.as_mut() {
                    book.place(request.seat, wager);
                }
                debug!("{} wagers {}", self.players[request.seat].name, wager);
                self.phase = Phase::Wagering {
                    seat: request.seat + 1,
                };
                self.announce_due = true;
            }

            (RequestKind::Discard { .. }, _) => return Err(InputError::NotExpected),
        }

        Ok(())
    }

    // Starts a cycle of turns at seat 0, collecting wagers first when they are played.
    fn begin_cycle(&mut self) {
        for haul in &mut self.hauls {
            haul.clear();
        }
        self.phase = if self.wagers.is_some() {
            Phase::Wagering { seat: 0 }
        } else {
            Phase::Turn
        };
        self.announce_due = true;
    }

    // The active seat plays the card at `index` in their hand.
    fn play(&mut self, index: usize, sink: &mut dyn Sink) {
        let seat = self.active;
        let card = self.players[seat].take_from_hand(index);
        let collected = self.line.collect(card);

        let name = self.players[seat].name.clone();
        sink.broadcast(&format!("{} has played {}.", name, card));
        if collected.is_empty() {
            sink.broadcast(&format!("{} collects nothing.", name));
        } else {
            sink.broadcast(&format!("{} collects {}", name, show_line(&collected)));
        }
        debug!(
            "Round {}: {} played {} and collected {} card(s)",
            self.round,
            name,
            card,
            collected.len()
        );

        self.hauls[seat].extend_from_slice(&collected);
        let player = &mut self.players[seat];
        player.collected.extend(collected);
        if !self.final_round {
            if let Some(drawn) = self.deck.draw() {
                player.hand.push(drawn);
            }
        }

        self.end_turn(sink);
    }

    fn end_turn(&mut self, sink: &mut dyn Sink) {
        let seat = self.active;
        let cycle_complete = seat + 1 == self.players.len();
        if cycle_complete {
            self.settle_cycle(sink);
        }

        if !self.final_round {
            if let Some(reason) = self.final_round_trigger() {
                info!("Final round begins: {}", reason);
                self.final_round = true;
                sink.broadcast(&format!("Final round begins! {}", reason));
                if !cycle_complete {
                    self.void_cycle(sink);
                }
                // The final round always starts over from the first seat.
                self.active = 0;
                self.round += 1;
                self.begin_cycle();
                return;
            }
        } else if self
            .players
            .iter()
            .all(|p| p.hand.len() <= FINAL_HAND_LIMIT)
        {
            info!("Parade over after {} rounds", self.round);
            if !cycle_complete {
                self.void_cycle(sink);
            }
            sink.clear();
            sink.broadcast(&format!(
                "The parade is over! Everyone discards {} cards; the rest of each hand is collected.",
                DISCARDS
            ));
            self.phase = Phase::Discarding {
                seat: 0,
                first: None,
            };
            self.announce_due = true;
            return;
        }

        self.active = (seat + 1) % self.players.len();
        if self.active == 0 {
            self.round += 1;
            self.begin_cycle();
        } else {
            self.announce_due = true;
        }
    }

    fn final_round_trigger(&self) -> Option<String> {
        if let Some(player) = self.players.iter().find(|p| p.has_all_colours()) {
            return Some(format!("{} has collected all colours!", player.name));
        }
        if self.deck.is_empty() {
            return Some("The deck is empty!".to_string());
        }
        None
    }

    fn settle_cycle(&mut self, sink: &mut dyn Sink) {
        let Some(book) = self.wagers.as_mut() else {
            return;
        };

        sink.broadcast("===== THE BETTING ROUND IS OVER =====");
        sink.broadcast(&format!("Target score: {}", TARGET_SCORE));

        match book.settle(&self.hauls) {
            RoundResult::AllBust => {
                sink.broadcast("All players busted! No winners this round.");
            }
            RoundResult::Push => {
                sink.broadcast("There is a tie! Nobody wins this round.");
            }
            RoundResult::Winners { seats, score } => {
                let names = self.names(&seats);
                sink.broadcast(&format!("{} wins with a score of {}!", names, score));
            }
        }
        self.show_bankrolls(sink);
    }

    fn void_cycle(&mut self, sink: &mut dyn Sink) {
        if let Some(book) = self.wagers.as_mut() {
            book.void();
            sink.broadcast("The unfinished betting round is called off; all wagers are returned.");
        }
    }

    // Throws away the cards at `discards` from the seat's hand and collects the rest.
    fn discard(&mut self, seat: usize, discards: &[usize], sink: &mut dyn Sink) {
        let dropped = self.players[seat].discard_and_keep_rest(discards);
        sink.broadcast(&format!(
            "{} discards {}",
            self.players[seat].name,
            show_line(&dropped)
        ));
        self.discarded.extend(dropped);

        self.phase = Phase::Discarding {
            seat: seat + 1,
            first: None,
        };
        self.announce_due = true;
    }

    fn finish(&mut self, sink: &mut dyn Sink) {
        let tallies: Vec<_> = self.players.iter().map(Player::tally).collect();
        let scores = scoring::score(&tallies);
        let winners = scoring::winners(&scores);

        sink.clear();
        sink.broadcast("Final collections:");
        self.show_collections(sink);
        for (player, score) in self.players.iter().zip(&scores) {
            sink.broadcast(&format!("{}'s score: {}", player.name, score));
        }

        let names = self.names(&winners);
        if winners.len() == self.players.len() {
            sink.broadcast("Oh no, a massive tie!");
        } else if winners.len() == 1 {
            sink.broadcast(&format!("{} has won the parade!", names));
        } else {
            sink.broadcast(&format!("{} have won the parade!", names));
        }

        let mut wager_winners = Vec::new();
        if let Some(book) = self.wagers.as_mut() {
            book.award_bonus(&winners);
            let human_winners: Vec<usize> = winners
                .iter()
                .copied()
                .filter(|s| book.account(*s).is_some())
                .collect();
            if !human_winners.is_empty() {
                sink.broadcast(&format!(
                    "{} wins an extra ${} for winning the parade!",
                    self.names(&human_winners),
                    PARADE_BONUS
                ));
            }
            self.show_bankrolls(sink);

            let leaders = self.wagers.as_ref().map(WagerBook::leaders).unwrap_or_default();
            if !leaders.is_empty() {
                sink.broadcast(&format!(
                    "Congratulations {} for winning the betting with ${}!",
                    self.names(&leaders),
                    self.bankroll(leaders[0]).unwrap_or_default()
                ));
            }
            wager_winners = leaders
                .iter()
                .map(|s| self.players[*s].name.clone())
                .collect();
        }

        let players = self
            .players
            .iter()
            .zip(&scores)
            .enumerate()
            .map(|(seat, (player, score))| PlayerResult {
                name: player.name.clone(),
                score: *score,
                bankroll: self.bankroll(seat),
            })
            .collect();

        self.outcome = Some(GameOutcome {
            players,
            winners: winners
                .iter()
                .map(|s| self.players[*s].name.clone())
                .collect(),
            wager_winners,
        });
        self.phase = Phase::Done;
    }

    fn announce(&mut self, seat: usize, sink: &mut dyn Sink) {
        self.announce_due = false;
        let name = self.players[seat].name.clone();

        match self.phase {
            Phase::Turn => {
                sink.clear();
                if self.final_round {
                    sink.broadcast(&format!("===== {}'s turn (Final turn) =====", name));
                } else {
                    sink.broadcast(&format!("===== {}'s turn (Turn {}) =====", name, self.round));
                }
                sink.broadcast(&format!("Current parade line: {}", self.line));
                self.show_collections(sink);
            }
            Phase::Discarding { .. } => {
                sink.broadcast(&format!("{}: discard {} cards!", name, DISCARDS));
            }
            Phase::Wagering { .. } => {
                sink.broadcast(&format!("{}'s turn to place a bet.", name));
            }
            Phase::Done => {}
        }
    }

    fn announce_wagers(&self, sink: &mut dyn Sink) {
        let Some(book) = self.wagers.as_ref() else {
            return;
        };
        sink.broadcast("ALL BETS ARE IN!");
        for account in book.accounts() {
            sink.broadcast(&format!(
                "|| {} has placed the bet ${}. ||",
                self.players[account.seat].name, account.wager
            ));
        }
    }

    fn show_collections(&self, sink: &mut dyn Sink) {
        for player in &self.players {
            sink.broadcast(&format!(
                "{}'s collected cards: {}",
                player.name,
                show_by_colour(&player.collected)
            ));
        }
    }

    fn show_bankrolls(&self, sink: &mut dyn Sink) {
        let Some(book) = self.wagers.as_ref() else {
            return;
        };
        for account in book.accounts() {
            sink.broadcast(&format!(
                " >>> {}: ${}",
                self.players[account.seat].name, account.bankroll
            ));
        }
    }

    fn bankroll(&self, seat: usize) -> Option<u32> {
        self.wagers
            .as_ref()
            .and_then(|book| book.account(seat))
            .map(|a| a.bankroll)
    }

    fn names(&self, seats: &[usize]) -> String {
        seats
            .iter()
            .map(|s| self.players[*s].name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// Converts a 1-based answer into a 0-based position among `len` options.
fn to_index(answer: i64, len: usize) -> Result<usize, InputError> {
    usize::try_from(answer)
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
        .ok_or(InputError::OutOfRange { max: len })
}

// Seats for a game: the given humans in order, then `ai` automated players.
pub fn seating(humans: Vec<String>, ai: usize) -> Vec<(String, PlayerKind)> {
    humans
        .into_iter()
        .map(|name| (name, PlayerKind::Human))
        .chain((1..=ai).map(|n| (crate::player::automated_name(n), PlayerKind::Automated)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DECK_SIZE;
    use crate::table::Transcript;
    use crate::types::Colour::{self, *};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(seed: u64) -> Deck {
        Deck::shuffled(&mut StdRng::seed_from_u64(seed))
    }

    fn humans(n: usize) -> Vec<(String, PlayerKind)> {
        seating((0..n).map(|i| format!("p{}", i)).collect(), 0)
    }

    // A short deck with three colours only, so nobody can ever hold all six.
    fn three_colour_deck(len: usize) -> Deck {
        let cards = [Red, Blue, Green]
            .iter()
            .flat_map(|colour: &Colour| (0..=10).map(move |v| Card::new(v, *colour)))
            .take(len)
            .collect();
        Deck::stacked(cards)
    }

    // Answers every request with the first option (and the second for a second discard).
    fn answer_first(engine: &mut TurnEngine, sink: &mut Transcript) -> Option<Request> {
        let request = engine.next_request(sink)?;
        let answer = match request.kind {
            RequestKind::Discard { nth: 2, .. } => 2,
            RequestKind::Wager { minimum, .. } => i64::from(minimum),
            _ => 1,
        };
        engine.submit(answer, sink).expect("valid answer");
        Some(request)
    }

    #[test]
    fn deals_line_and_hands() {
        let engine = TurnEngine::new(seating(vec!["ann".into()], 2), seeded(1), false);

        assert_eq!(engine.line().len(), 6);
        assert!(engine.players().iter().all(|p| p.hand.len() == 5));
        assert_eq!(engine.players()[1].name, "AI 1");
        assert_eq!(engine.players()[2].kind, PlayerKind::Automated);
        assert_eq!(engine.card_count(), DECK_SIZE);
        assert_eq!(engine.active_seat(), 0);
        assert!(!engine.is_final_round());
    }

    #[test]
    fn automated_game_runs_to_the_end() {
        for seed in 0..20 {
            let mut engine = TurnEngine::new(seating(Vec::new(), 4), seeded(seed), false);
            let mut sink = Transcript::default();

            assert_eq!(engine.next_request(&mut sink), None);

            assert!(engine.is_over());
            assert!(engine.is_final_round());
            assert_eq!(engine.card_count(), DECK_SIZE);
            assert!(engine.players().iter().all(|p| p.hand.is_empty()));
            assert_eq!(engine.discarded.len(), 4 * DISCARDS);

            let outcome = engine.outcome().expect("scored");
            assert_eq!(outcome.players.len(), 4);
            assert!(!outcome.winners.is_empty());
            assert!(outcome.wager_winners.is_empty());
        }
    }

    #[test]
    fn cards_are_conserved_in_every_state() {
        let mut engine = TurnEngine::new(humans(3), seeded(9), false);
        let mut sink = Transcript::default();

        while answer_first(&mut engine, &mut sink).is_some() {
            assert_eq!(engine.card_count(), DECK_SIZE);
        }
        assert!(engine.is_over());
        assert_eq!(engine.card_count(), DECK_SIZE);
    }

    #[test]
    fn invalid_answers_change_nothing() {
        let mut engine = TurnEngine::new(humans(2), seeded(3), false);
        let mut sink = Transcript::default();

        let request = engine.next_request(&mut sink).expect("request");
        assert_eq!(request.kind, RequestKind::PlayCard { hand_size: 5 });
        let hand = engine.players()[0].hand.clone();

        for bad in [0, 6, -1, i64::MAX] {
            assert_eq!(
                engine.submit(bad, &mut sink),
                Err(InputError::OutOfRange { max: 5 })
            );
        }

        assert_eq!(engine.pending(), Some(request));
        assert_eq!(engine.players()[0].hand, hand);
        assert_eq!(engine.line().len(), 6);

        engine.submit(5, &mut sink).expect("valid");
        assert_eq!(engine.active_seat(), 1);
        assert_eq!(engine.line().cards().last(), Some(&hand[4]));
    }

    #[test]
    fn final_round_restarts_from_first_seat() {
        // 6 in the line and 15 in hands leave 2 to draw: seat 1 empties the deck.
        let mut engine = TurnEngine::new(humans(3), three_colour_deck(23), false);
        let mut sink = Transcript::default();

        answer_first(&mut engine, &mut sink);
        assert!(!engine.is_final_round());
        assert_eq!(engine.active_seat(), 1);

        answer_first(&mut engine, &mut sink);
        assert!(engine.is_final_round());
        // Seat 2 would be next in the normal order.
        assert_eq!(engine.active_seat(), 0);
        assert!(!engine.is_over());
        assert!(sink.saw("Final round begins! The deck is empty!"));

        // Everyone plays once more without drawing, then the game ends.
        for seat in 0..3 {
            assert_eq!(engine.active_seat(), seat);
            let request = answer_first(&mut engine, &mut sink).expect("turn");
            assert_eq!(request.seat, seat);
            assert!(engine.is_final_round());
        }

        let request = engine.next_request(&mut sink).expect("discard");
        assert_eq!(
            request,
            Request {
                seat: 0,
                kind: RequestKind::Discard {
                    nth: 1,
                    hand_size: 4
                }
            }
        );
    }

    #[test]
    fn latch_is_set_by_any_player_and_restarts_at_seat_zero() {
        let mut engine = TurnEngine::new(seating(Vec::new(), 3), seeded(5), false);
        let mut sink = Transcript::default();

        // Seat 2 already holds every colour before seat 0 plays.
        for colour in Colour::ALL {
            engine.players[2].collected.push(Card::new(0, colour));
        }

        engine.play(0, &mut sink);

        assert!(engine.is_final_round());
        assert_eq!(engine.active_seat(), 0);
        assert!(sink.saw("Final round begins! AI 3 has collected all colours!"));
        assert!(!engine.is_over());
    }

    #[test]
    fn game_does_not_end_on_the_latching_turn() {
        // 6 + 10 dealt leaves one card: seat 0 empties the deck while both hands hold 5.
        let mut engine = TurnEngine::new(humans(2), three_colour_deck(17), false);
        let mut sink = Transcript::default();

        answer_first(&mut engine, &mut sink);
        assert!(engine.is_final_round());
        assert!(!engine.is_over());
        assert_eq!(engine.active_seat(), 0);
        assert!(engine.players().iter().all(|p| p.hand.len() == 5));
    }

    #[test]
    fn discards_need_two_different_cards() {
        let mut engine = TurnEngine::new(humans(2), three_colour_deck(17), false);
        let mut sink = Transcript::default();

        // Latching turn, then one final turn each.
        for _ in 0..3 {
            answer_first(&mut engine, &mut sink);
        }

        let request = engine.next_request(&mut sink).expect("discard");
        assert_eq!(request.kind, RequestKind::Discard { nth: 1, hand_size: 4 });
        engine.submit(3, &mut sink).expect("first discard");

        let request = engine.next_request(&mut sink).expect("second discard");
        assert_eq!(request.kind, RequestKind::Discard { nth: 2, hand_size: 4 });
        assert_eq!(engine.submit(3, &mut sink), Err(InputError::SameCard));
        assert_eq!(engine.submit(9, &mut sink), Err(InputError::OutOfRange { max: 4 }));

        let hand = engine.players()[0].hand.clone();
        let before = engine.players()[0].collected.len();
        engine.submit(1, &mut sink).expect("second discard");

        let player = &engine.players()[0];
        assert!(player.hand.is_empty());
        assert_eq!(player.collected.len(), before + 2);
        assert_eq!(&player.collected[before..], &[hand[1], hand[3]]);

        // Seat 1 next, then the game is scored.
        while answer_first(&mut engine, &mut sink).is_some() {}
        assert!(engine.is_over());
        assert_eq!(engine.card_count(), 17);
    }

    #[test]
    fn wagers_are_collected_from_humans_each_cycle() {
        let seats = seating(vec!["ann".into(), "bob".into()], 1);
        let mut engine = TurnEngine::new(seats, seeded(11), true);
        let mut sink = Transcript::default();

        let request = engine.next_request(&mut sink).expect("wager");
        assert_eq!(
            request,
            Request {
                seat: 0,
                kind: RequestKind::Wager {
                    minimum: 10,
                    maximum: 1000
                }
            }
        );
        assert_eq!(
            engine.submit(5, &mut sink),
            Err(InputError::WagerOutOfRange {
                minimum: 10,
                maximum: 1000
            })
        );
        assert_eq!(
            engine.submit(1001, &mut sink),
            Err(InputError::WagerOutOfRange {
                minimum: 10,
                maximum: 1000
            })
        );
        engine.submit(100, &mut sink).expect("wager");

        let request = engine.next_request(&mut sink).expect("wager");
        assert_eq!(request.seat, 1);
        engine.submit(50, &mut sink).expect("wager");

        // The automated seat never wagers; play starts with seat 0.
        let request = engine.next_request(&mut sink).expect("turn");
        assert_eq!(request.kind, RequestKind::PlayCard { hand_size: 5 });
        assert!(sink.saw("ALL BETS ARE IN!"));
        assert_eq!(engine.wagers().expect("book").account(0).map(|a| a.wager), Some(100));
    }

    fn bankrolls(engine: &TurnEngine) -> Vec<u32> {
        let book = engine.wagers().expect("book");
        book.accounts().iter().map(|a| a.bankroll).collect()
    }

    #[test]
    fn completed_cycle_pays_out_from_its_hauls() {
        let cards = vec![
            // Parade line.
            Card::new(1, Red),
            Card::new(2, Red),
            Card::new(3, Blue),
            Card::new(4, Blue),
            Card::new(5, Green),
            Card::new(6, Green),
            // p0's hand.
            Card::new(0, Red),
            Card::new(7, Grey),
            Card::new(8, Grey),
            Card::new(9, Grey),
            Card::new(10, Grey),
            // p1's hand.
            Card::new(10, Green),
            Card::new(7, Purple),
            Card::new(8, Purple),
            Card::new(9, Purple),
            Card::new(10, Purple),
            // Draw pile.
            Card::new(1, Orange),
            Card::new(2, Orange),
            Card::new(3, Orange),
        ];
        let mut engine = TurnEngine::new(humans(2), Deck::stacked(cards), true);
        let mut sink = Transcript::default();

        engine.next_request(&mut sink).expect("wager");
        engine.submit(100, &mut sink).expect("wager");
        engine.next_request(&mut sink).expect("wager");
        engine.submit(50, &mut sink).expect("wager");

        // The red 0 takes both red cards; the green 10 protects the whole line.
        let request = engine.next_request(&mut sink).expect("turn");
        assert_eq!(request.seat, 0);
        engine.submit(1, &mut sink).expect("play");
        assert!(sink.saw("p0 collects [red 1] [red 2]"));
        let request = engine.next_request(&mut sink).expect("turn");
        assert_eq!(request.seat, 1);
        engine.submit(1, &mut sink).expect("play");
        assert!(sink.saw("p1 collects nothing."));

        assert!(sink.saw("===== THE BETTING ROUND IS OVER ====="));
        assert!(sink.saw("p0 wins with a score of 3!"));
        assert_eq!(bankrolls(&engine), vec![1100, 950]);
        assert!(!engine.is_final_round());

        // The next cycle asks for fresh wagers against the new bankrolls.
        assert_eq!(
            engine.next_request(&mut sink),
            Some(Request {
                seat: 0,
                kind: RequestKind::Wager {
                    minimum: 10,
                    maximum: 1100
                }
            })
        );
    }

    #[test]
    fn cycle_cut_short_by_the_final_round_returns_wagers() {
        let mut engine = TurnEngine::new(humans(2), three_colour_deck(17), true);
        let mut sink = Transcript::default();

        engine.next_request(&mut sink).expect("wager");
        engine.submit(100, &mut sink).expect("wager");
        engine.next_request(&mut sink).expect("wager");
        engine.submit(50, &mut sink).expect("wager");

        // Seat 0 draws the last card, so the final round starts before seat 1 plays.
        let request = engine.next_request(&mut sink).expect("turn");
        assert_eq!(request.seat, 0);
        engine.submit(1, &mut sink).expect("play");

        assert!(engine.is_final_round());
        assert!(sink.saw("Final round begins! The deck is empty!"));
        assert!(sink.saw("The unfinished betting round is called off; all wagers are returned."));
        assert!(!sink.saw("===== THE BETTING ROUND IS OVER ====="));
        assert_eq!(bankrolls(&engine), vec![1000, 1000]);
        assert!(engine
            .wagers()
            .expect("book")
            .accounts()
            .iter()
            .all(|a| a.wager == 0));

        assert_eq!(
            engine.next_request(&mut sink),
            Some(Request {
                seat: 0,
                kind: RequestKind::Wager {
                    minimum: 10,
                    maximum: 1000
                }
            })
        );
    }

    #[test]
    fn broke_players_wager_nothing_without_being_asked() {
        let mut engine = TurnEngine::new(humans(2), seeded(13), true);
        let mut sink = Transcript::default();
        engine.wagers.as_mut().expect("book").accounts_mut()[0].bankroll = MINIMUM_BID - 1;

        let request = engine.next_request(&mut sink).expect("wager");

        assert_eq!(request.seat, 1);
        assert!(sink.told(
            "p0",
            "You don't have enough money to bet anymore. Focus on the parade!"
        ));
        assert_eq!(engine.wagers().expect("book").account(0).map(|a| a.wager), Some(0));
    }

    #[test]
    fn wager_game_reports_bankrolls() {
        let mut engine = TurnEngine::new(humans(2), seeded(17), true);
        let mut sink = Transcript::default();

        while answer_first(&mut engine, &mut sink).is_some() {}

        let outcome = engine.outcome().expect("scored");
        assert!(outcome.players.iter().all(|p| p.bankroll.is_some()));
        assert!(!outcome.wager_winners.is_empty());
        assert_eq!(engine.card_count(), DECK_SIZE);

        // Parade winners got the bonus on top of whatever the rounds left them.
        let best = outcome.players.iter().filter_map(|p| p.bankroll).max();
        for name in &outcome.wager_winners {
            let player = outcome.players.iter().find(|p| &p.name == name).expect("player");
            assert_eq!(player.bankroll, best);
        }
    }

    #[test]
    fn outcome_uses_the_scoring_rules() {
        let mut engine = TurnEngine::new(seating(Vec::new(), 3), seeded(21), false);
        let mut sink = Transcript::default();
        engine.next_request(&mut sink);

        let tallies: Vec<_> = engine.players().iter().map(Player::tally).collect();
        let scores = scoring::score(&tallies);
        let outcome = engine.outcome().expect("scored");

        let reported: Vec<u32> = outcome.players.iter().map(|p| p.score).collect();
        assert_eq!(reported, scores);
        let winners: Vec<String> = scoring::winners(&scores)
            .iter()
            .map(|s| engine.players()[*s].name.clone())
            .collect();
        assert_eq!(outcome.winners, winners);
    }

    #[test]
    fn no_request_once_over() {
        let mut engine = TurnEngine::new(seating(Vec::new(), 2), seeded(2), false);
        let mut sink = Transcript::default();
        assert_eq!(engine.next_request(&mut sink), None);
        assert_eq!(engine.submit(1, &mut sink), Err(InputError::NotExpected));
    }
}
