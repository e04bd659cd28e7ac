// Datatypes shared by the engine, the scoring rules and the transport.

use std::fmt;

use serde::{Deserialize, Serialize};

// Highest face value in the deck; faces run from 0 to this inclusive.
pub const MAX_VALUE: u8 = 10;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colour {
    Red,
    Blue,
    Purple,
    Green,
    Grey,
    Orange,
}

impl Colour {
    // Fixed order used for dealing, tallies and score breakdowns.
    pub const ALL: [Colour; 6] = [
        Colour::Red,
        Colour::Blue,
        Colour::Purple,
        Colour::Green,
        Colour::Grey,
        Colour::Orange,
    ];

    // Position of this colour in `ALL`, for indexing per-colour arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Colour::Red => "red",
            Colour::Blue => "blue",
            Colour::Purple => "purple",
            Colour::Green => "green",
            Colour::Grey => "grey",
            Colour::Orange => "orange",
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// A card is a plain value: two cards with the same value and colour are interchangeable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Card {
    // Invariant: in [0..=MAX_VALUE].
    pub value: u8,
    pub colour: Colour,
}

impl Card {
    pub fn new(value: u8, colour: Colour) -> Self {
        debug_assert!(value <= MAX_VALUE);
        Card { value, colour }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.colour, self.value)
    }
}

// Per-colour (card count, point sum) over a set of cards, indexed by `Colour::index`.
pub type Tally = [(u32, u32); 6];

pub fn tally(cards: &[Card]) -> Tally {
    let mut tally = [(0, 0); 6];
    for card in cards {
        let entry = &mut tally[card.colour.index()];
        entry.0 += 1;
        entry.1 += u32::from(card.value);
    }
    tally
}

// Renders cards as a single line, e.g. "[red 5] [blue 3]".
pub fn show_line(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "(none)".to_string();
    }

    cards
        .iter()
        .map(|c| format!("[{}]", c))
        .collect::<Vec<_>>()
        .join(" ")
}

// Renders cards with 1-based positions so a player can pick one, e.g. "1) red 5  2) blue 3".
pub fn show_numbered(cards: &[Card]) -> String {
    cards
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}) {}", i + 1, c))
        .collect::<Vec<_>>()
        .join("  ")
}

// Renders a collection grouped by colour in the fixed colour order.
pub fn show_by_colour(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "(nothing collected)".to_string();
    }

    Colour::ALL
        .iter()
        .filter_map(|colour| {
            let mut values: Vec<u8> = cards
                .iter()
                .filter(|c| c.colour == *colour)
                .map(|c| c.value)
                .collect();
            if values.is_empty() {
                return None;
            }
            values.sort_unstable();
            let values = values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",");
            Some(format!("{}: {}", colour, values))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
