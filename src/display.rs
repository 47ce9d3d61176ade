//! Human-readable rendering of layouts and solutions.
//!
//! The board dump is used by verbose logging and by the CLI; the solution
//! trace is the program's main output.

use crate::card::{Card, Suit};
use crate::moves::Move;
use crate::tableau::{NUM_COLS, Tableau};

/// Render the buffer slots on one line. Slots beyond the current capacity
/// that are empty are shown as `xx`.
///
/// Example: `Buffer: [r3] [  ] [xx]`
pub fn render_buffer(tab: &Tableau) -> String {
    let mut s = String::from("Buffer:");
    let mut free = tab.buffer_capacity as usize - tab.buffer_len().min(tab.buffer_capacity as usize);
    for slot in &tab.buffer {
        let cell = match slot {
            Some(card) => card.short_str(),
            None if free > 0 => {
                free -= 1;
                "  ".to_string()
            }
            None => "xx".to_string(),
        };
        s.push_str(&format!(" [{cell:>2}]"));
    }
    s
}

/// Render the foundation row: top card of each suit, then the collected
/// colors and whether the flower is still in play.
///
/// Example: `Foundations: [r2] [  ] [b1]  Collected: G  Flower: in play`
pub fn render_foundations(tab: &Tableau) -> String {
    let mut s = String::from("Foundations:");
    for suit in Suit::ALL {
        match tab.foundations[suit.index()] {
            0 => s.push_str(" [  ]"),
            rank => s.push_str(&format!(" [{}]", Card::numbered(suit, rank))),
        }
    }

    let collected: String = Suit::ALL
        .into_iter()
        .filter(|suit| tab.collected[suit.index()])
        .map(|suit| Card::color(suit).short_str())
        .collect();
    s.push_str("  Collected: ");
    s.push_str(if collected.is_empty() { "-" } else { collected.as_str() });
    s.push_str(if tab.flower_present {
        "  Flower: in play"
    } else {
        "  Flower: gone"
    });
    s
}

/// Render all columns as a multi-line grid.
///
/// Each cell is four characters wide. Row 0 holds the bottom card of every
/// column, so the exposed card of each column is the last one printed in
/// it, as on the physical table.
pub fn render_columns(tab: &Tableau) -> String {
    let mut s = String::new();

    s.push_str("Columns:\n");
    s.push_str("      ");
    for col_idx in 0..NUM_COLS {
        s.push_str(&format!(" C{} ", col_idx + 1));
    }
    s.push('\n');

    let max_height = tab.columns.iter().map(Vec::len).max().unwrap_or(0);
    for row in 0..max_height {
        s.push_str("      ");
        for col in &tab.columns {
            match col.get(row) {
                Some(card) => s.push_str(&format!("{:>3} ", card.short_str())),
                None => s.push_str("    "),
            }
        }
        s.push('\n');
    }

    s
}

/// Render a full layout: foundations, buffer, then columns.
pub fn render_tableau(tab: &Tableau) -> String {
    let mut s = String::new();

    s.push_str(&render_foundations(tab));
    s.push('\n');
    s.push_str(&render_buffer(tab));
    s.push('\n');
    s.push('\n');
    s.push_str(&render_columns(tab));

    s
}

pub fn print_tableau(tab: &Tableau) {
    println!("{}", render_tableau(tab));
}

/// One `Step N: <move>` line per move, numbered from 1.
pub fn render_solution(moves: &[Move]) -> String {
    moves
        .iter()
        .enumerate()
        .map(|(i, mv)| format!("Step {}: {}\n", i + 1, mv))
        .collect()
}

pub fn print_solution(moves: &[Move]) {
    print!("{}", render_solution(moves));
}
