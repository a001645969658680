//! Board occupancy and the rules of stone placement.
//!
//! A [`Board`] is a plain value: every rules operation borrows one board and
//! returns a fresh one, so an illegal move can never disturb the caller's copy.
//! Ko is not enforced; a record may legally contain any capture sequence.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::COLUMN_LETTERS;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// The SGF property name for a move of this color.
    pub fn sgf_tag(self) -> &'static str {
        match self {
            Color::Black => "B",
            Color::White => "W",
        }
    }

    /// Color that plays the move at 0-based `index`. Black opens an even game;
    /// White opens once handicap stones are down.
    pub fn to_move(index: usize, handicap: usize) -> Color {
        let first = if handicap >= 2 {
            Color::White
        } else {
            Color::Black
        };
        if index % 2 == 0 { first } else { first.opponent() }
    }

    /// Parse `b`/`black`/`w`/`white`, ignoring case.
    pub fn parse(s: &str) -> Option<Color> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sgf_tag())
    }
}

/// A grid intersection. Row 0 is the top edge, column 0 the left edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Why the rules engine refused a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("point is off the board")]
    OffBoard,
    #[error("point is not empty")]
    Occupied,
    #[error("suicide")]
    Suicide,
}

/// The outcome of a legal placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub board: Board,
    /// Points emptied by the move, sorted.
    pub captured: Vec<Point>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, p: Point) -> usize {
        p.row * self.size + p.col
    }

    pub fn contains(&self, p: Point) -> bool {
        p.row < self.size && p.col < self.size
    }

    pub fn get(&self, p: Point) -> Option<Color> {
        if !self.contains(p) {
            return None;
        }
        self.cells[self.idx(p)]
    }

    /// Put a stone down (or clear a point) without applying any rules.
    /// Used for setup stones such as handicap.
    pub fn set(&mut self, p: Point, color: Option<Color>) {
        if self.contains(p) {
            let i = self.idx(p);
            self.cells[i] = color;
        }
    }

    /// All stones on the board in row-major order.
    pub fn stones(&self) -> impl Iterator<Item = (Point, Color)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, c)| {
            c.map(|color| (Point::new(i / self.size, i % self.size), color))
        })
    }

    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    fn neighbors(&self, p: Point) -> std::vec::IntoIter<Point> {
        let s = self.size;
        let mut v = Vec::with_capacity(4);
        if p.row > 0 {
            v.push(Point::new(p.row - 1, p.col));
        }
        if p.row + 1 < s {
            v.push(Point::new(p.row + 1, p.col));
        }
        if p.col > 0 {
            v.push(Point::new(p.row, p.col - 1));
        }
        if p.col + 1 < s {
            v.push(Point::new(p.row, p.col + 1));
        }
        v.into_iter()
    }

    /// Breadth-first flood fill of the same-colored stones connected to `start`.
    /// Empty when `start` holds no stone.
    pub fn group(&self, start: Point) -> Vec<Point> {
        let Some(color) = self.get(start) else {
            return Vec::new();
        };
        let mut visited = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();
        visited[self.idx(start)] = true;

        while let Some(p) = queue.pop_front() {
            out.push(p);
            for n in self.neighbors(p) {
                let ni = self.idx(n);
                if !visited[ni] && self.cells[ni] == Some(color) {
                    visited[ni] = true;
                    queue.push_back(n);
                }
            }
        }
        out
    }

    /// Number of distinct empty points adjacent to any stone of `group`.
    pub fn liberties(&self, group: &[Point]) -> usize {
        let mut seen = vec![false; self.cells.len()];
        let mut libs = 0;
        for &p in group {
            for n in self.neighbors(p) {
                let ni = self.idx(n);
                if self.cells[ni].is_none() && !seen[ni] {
                    seen[ni] = true;
                    libs += 1;
                }
            }
        }
        libs
    }

    /// Color of the stones surrounding an empty point, if every orthogonal
    /// neighbor on the board is a stone of that one color. May be a false eye.
    pub fn eye_color(&self, p: Point) -> Option<Color> {
        if !self.contains(p) || self.get(p).is_some() {
            return None;
        }
        let mut eye = None;
        for n in self.neighbors(p) {
            let c = self.get(n)?;
            match eye {
                None => eye = Some(c),
                Some(e) if e != c => return None,
                Some(_) => {}
            }
        }
        eye
    }

    /// Whether `color` may play at `p`.
    pub fn is_legal(&self, p: Point, color: Color) -> bool {
        self.apply_move(p, color).is_ok()
    }

    /// Place a stone of `color` at `p`, resolving captures before checking
    /// for suicide. `self` is never modified.
    pub fn apply_move(&self, p: Point, color: Color) -> Result<Placement, IllegalMove> {
        if !self.contains(p) {
            return Err(IllegalMove::OffBoard);
        }
        if self.get(p).is_some() {
            return Err(IllegalMove::Occupied);
        }

        let mut board = self.clone();
        let idx = board.idx(p);
        board.cells[idx] = Some(color);

        let opp = color.opponent();
        let mut checked = vec![false; board.cells.len()];
        let mut captured: Vec<Point> = Vec::new();
        for n in board.neighbors(p) {
            if board.get(n) != Some(opp) || checked[board.idx(n)] {
                continue;
            }
            let group = board.group(n);
            for &s in &group {
                checked[board.idx(s)] = true;
            }
            if board.liberties(&group) == 0 {
                captured.extend(group);
            }
        }
        for &c in &captured {
            let i = board.idx(c);
            board.cells[i] = None;
        }

        if captured.is_empty() {
            let own = board.group(p);
            if board.liberties(&own) == 0 {
                return Err(IllegalMove::Suicide);
            }
        }

        captured.sort_unstable();
        Ok(Placement { board, captured })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: String = COLUMN_LETTERS[..self.size.min(COLUMN_LETTERS.len())]
            .iter()
            .map(|&c| format!("{} ", c as char))
            .collect();
        writeln!(f, "   {}", header.trim_end())?;
        for row in 0..self.size {
            write!(f, "{:>2} ", self.size - row)?;
            for col in 0..self.size {
                let ch = match self.get(Point::new(row, col)) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                if col + 1 < self.size {
                    write!(f, "{ch} ")?;
                } else {
                    write!(f, "{ch}")?;
                }
            }
            writeln!(f, " {}", self.size - row)?;
        }
        writeln!(f, "   {}", header.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_stones(size: usize, black: &[(usize, usize)], white: &[(usize, usize)]) -> Board {
        let mut b = Board::new(size);
        for &(r, c) in black {
            b.set(Point::new(r, c), Some(Color::Black));
        }
        for &(r, c) in white {
            b.set(Point::new(r, c), Some(Color::White));
        }
        b
    }

    #[test]
    fn test_group_of_empty_point_is_empty() {
        let b = Board::new(9);
        assert!(b.group(Point::new(4, 4)).is_empty());
    }

    #[test]
    fn test_group_follows_orthogonal_links_only() {
        // Diagonal stone at (1,1) is not part of the group.
        let b = with_stones(9, &[(0, 0), (0, 1), (1, 1), (2, 2)], &[]);
        let mut g = b.group(Point::new(0, 0));
        g.sort();
        assert_eq!(g, vec![Point::new(0, 0), Point::new(0, 1), Point::new(1, 1)]);
    }

    #[test]
    fn test_liberties_counts_shared_points_once() {
        let b = with_stones(9, &[(4, 4), (4, 5)], &[]);
        let g = b.group(Point::new(4, 4));
        assert_eq!(b.liberties(&g), 6);
    }

    #[test]
    fn test_corner_stone_has_two_liberties() {
        let b = with_stones(9, &[(0, 0)], &[]);
        assert_eq!(b.liberties(&b.group(Point::new(0, 0))), 2);
    }

    #[test]
    fn test_apply_move_does_not_touch_original() {
        let b = Board::new(9);
        let placed = b.apply_move(Point::new(2, 2), Color::Black).unwrap();
        assert_eq!(b.stone_count(), 0);
        assert_eq!(placed.board.stone_count(), 1);
    }

    #[test]
    fn test_off_board_rejected() {
        let b = Board::new(9);
        assert_eq!(
            b.apply_move(Point::new(9, 0), Color::Black),
            Err(IllegalMove::OffBoard)
        );
    }

    #[test]
    fn test_suicide_in_corner() {
        let b = with_stones(9, &[(0, 1), (1, 0)], &[]);
        assert_eq!(
            b.apply_move(Point::new(0, 0), Color::White),
            Err(IllegalMove::Suicide)
        );
        // Filling one's own last eye is just as illegal when nothing is captured.
        let b = with_stones(9, &[(0, 1), (1, 0)], &[(0, 2), (1, 1), (2, 0)]);
        assert_eq!(
            b.apply_move(Point::new(0, 0), Color::Black),
            Err(IllegalMove::Suicide)
        );
    }

    #[test]
    fn test_display_marks_stones() {
        let b = with_stones(9, &[(0, 0)], &[(8, 8)]);
        let s = b.to_string();
        assert!(s.contains(" 9 X . ."));
        assert!(s.contains(". O 1"));
        assert!(s.starts_with("   A B C D E F G H J"));
    }
}
