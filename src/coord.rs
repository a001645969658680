//! Conversions between grid points and the notations that name them.
//!
//! - Human notation: a column letter `A`-`T` (skipping `I`) and a row number
//!   counted up from the bottom edge, so `A19` is the top-left corner of a
//!   19x19 board.
//! - SGF notation: two lowercase letters, column then row, counted from the
//!   top-left corner with no skipped letter. The empty pair means pass.
//! - Pixels: [`PixelGrid`] maps pointer positions to the nearest intersection.
//!
//! Everything here is total: malformed input yields `None` or an empty string.

use crate::board::Point;
use crate::constants::{
    COLUMN_LETTERS, HANDICAP_FULL_LAYOUT_MIN, HANDICAP_INSET_LARGE, HANDICAP_INSET_SMALL,
    HANDICAP_MIN_BOARD,
};

/// Parse human notation such as `"D4"` or `"q16"`.
///
/// Returns `None` for `pass`, `resign`, malformed text and points that fall
/// outside a board of `board_size`.
pub fn human_to_grid(text: &str, board_size: usize) -> Option<Point> {
    let text = text.trim();
    let bytes = text.as_bytes();
    if bytes.len() < 2 {
        return None;
    }

    let letter = bytes[0].to_ascii_uppercase();
    let col = COLUMN_LETTERS.iter().position(|&c| c == letter)?;
    if col >= board_size {
        return None;
    }

    let digits = &text[1..];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: usize = digits.parse().ok()?;
    if number == 0 || number > board_size {
        return None;
    }

    Some(Point::new(board_size - number, col))
}

/// Format a point in human notation. Empty when the point is off the board.
pub fn grid_to_human(p: Point, board_size: usize) -> String {
    if p.row >= board_size || p.col >= board_size || p.col >= COLUMN_LETTERS.len() {
        return String::new();
    }
    format!("{}{}", COLUMN_LETTERS[p.col] as char, board_size - p.row)
}

/// Format a point as an SGF letter pair, e.g. row 3, col 15 -> `"pd"`.
pub fn grid_to_sgf(p: Point) -> String {
    if p.row >= 26 || p.col >= 26 {
        return String::new();
    }
    let col = (b'a' + p.col as u8) as char;
    let row = (b'a' + p.row as u8) as char;
    format!("{col}{row}")
}

/// Parse an SGF letter pair.
///
/// The empty pair, and `tt` on boards of 19 or less, are passes and give `None`,
/// as does anything outside the board.
pub fn sgf_to_grid(text: &str, board_size: usize) -> Option<Point> {
    let bytes = text.trim().as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    if board_size <= 19 && bytes == b"tt" {
        return None;
    }
    let col = sgf_letter(bytes[0])?;
    let row = sgf_letter(bytes[1])?;
    if row >= board_size || col >= board_size {
        return None;
    }
    Some(Point::new(row, col))
}

fn sgf_letter(b: u8) -> Option<usize> {
    b.is_ascii_lowercase().then(|| (b - b'a') as usize)
}

/// Standard handicap stone placement for `count` stones.
///
/// Corners come first (bottom-left, top-right, top-left, bottom-right); on
/// boards of 13 and larger, edge midpoints and the centre follow. Counts
/// outside `2..=9` give no stones, boards below 7 get none, and boards below
/// 13 never get more than the four corners.
pub fn handicap_points(board_size: usize, count: usize) -> Vec<Point> {
    if !(2..=9).contains(&count) || board_size < HANDICAP_MIN_BOARD {
        return Vec::new();
    }
    let inset = if board_size >= HANDICAP_FULL_LAYOUT_MIN {
        HANDICAP_INSET_LARGE
    } else {
        HANDICAP_INSET_SMALL
    };
    let near = inset;
    let far = board_size - 1 - inset;
    let mid = board_size / 2;

    let corners = [
        Point::new(far, near),  // D4
        Point::new(near, far),  // Q16
        Point::new(near, near), // D16
        Point::new(far, far),   // Q4
    ];
    if board_size < HANDICAP_FULL_LAYOUT_MIN {
        return corners[..count.min(4)].to_vec();
    }

    let center = Point::new(mid, mid);
    let left = Point::new(mid, near);
    let right = Point::new(mid, far);
    let bottom = Point::new(far, mid);
    let top = Point::new(near, mid);

    let mut points = corners[..count.min(4)].to_vec();
    match count {
        5 => points.push(center),
        6 => points.extend([left, right]),
        7 => points.extend([left, right, center]),
        8 => points.extend([left, right, bottom, top]),
        9 => points.extend([left, right, bottom, top, center]),
        _ => {}
    }
    points
}

/// Geometry of a rendered board, for mapping pointer positions to points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelGrid {
    pub board_size: usize,
    /// Distance from the canvas edge to the first line.
    pub margin: f64,
    /// Distance between adjacent lines.
    pub spacing: f64,
}

impl PixelGrid {
    pub fn new(board_size: usize, margin: f64, spacing: f64) -> Self {
        Self {
            board_size,
            margin,
            spacing,
        }
    }

    /// Nearest intersection to `(x, y)`, or `None` when the position is more
    /// than half a spacing outside the board.
    pub fn to_grid(&self, x: f64, y: f64) -> Option<Point> {
        if self.spacing <= 0.0 {
            return None;
        }
        let col = ((x - self.margin) / self.spacing).round();
        let row = ((y - self.margin) / self.spacing).round();
        let max = (self.board_size as f64) - 1.0;
        if !(0.0..=max).contains(&col) || !(0.0..=max).contains(&row) {
            return None;
        }
        Some(Point::new(row as usize, col as usize))
    }

    /// Canvas position of the centre of `p`.
    pub fn to_pixel(&self, p: Point) -> (f64, f64) {
        (
            self.margin + p.col as f64 * self.spacing,
            self.margin + p.row as f64 * self.spacing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_roundtrip_all_sizes() {
        for size in [9, 13, 19] {
            for row in 0..size {
                for col in 0..size {
                    let p = Point::new(row, col);
                    let s = grid_to_human(p, size);
                    assert_eq!(human_to_grid(&s, size), Some(p), "roundtrip failed for {s}");
                }
            }
        }
    }

    #[test]
    fn test_human_skips_i() {
        assert_eq!(human_to_grid("H5", 19).unwrap().col + 1, human_to_grid("J5", 19).unwrap().col);
        assert_eq!(human_to_grid("I5", 19), None);
    }

    #[test]
    fn test_human_rows_count_from_bottom() {
        assert_eq!(human_to_grid("A19", 19), Some(Point::new(0, 0)));
        assert_eq!(human_to_grid("a1", 19), Some(Point::new(18, 0)));
        assert_eq!(human_to_grid("D4", 19), Some(Point::new(15, 3)));
        assert_eq!(human_to_grid("Q16", 19), Some(Point::new(3, 15)));
    }

    #[test]
    fn test_human_rejects_bad_input() {
        for s in ["pass", "resign", "", "D", "D0", "D20", "T5x", "Z1"] {
            assert_eq!(human_to_grid(s, 19), None, "{s} should not parse");
        }
        assert_eq!(human_to_grid("K5", 9), None);
        assert_eq!(grid_to_human(Point::new(9, 0), 9), "");
    }

    #[test]
    fn test_sgf_letters() {
        assert_eq!(grid_to_sgf(Point::new(3, 15)), "pd");
        assert_eq!(sgf_to_grid("pd", 19), Some(Point::new(3, 15)));
        assert_eq!(sgf_to_grid("", 19), None);
        assert_eq!(sgf_to_grid("tt", 19), None);
        assert_eq!(sgf_to_grid("ss", 19), Some(Point::new(18, 18)));
        assert_eq!(sgf_to_grid("jj", 9), None);
    }

    #[test]
    fn test_handicap_19() {
        let names: Vec<String> = handicap_points(19, 9)
            .into_iter()
            .map(|p| grid_to_human(p, 19))
            .collect();
        assert_eq!(
            names,
            ["D4", "Q16", "D16", "Q4", "D10", "Q10", "K4", "K16", "K10"]
        );
        let five: Vec<String> = handicap_points(19, 5)
            .into_iter()
            .map(|p| grid_to_human(p, 19))
            .collect();
        assert_eq!(five, ["D4", "Q16", "D16", "Q4", "K10"]);
    }

    #[test]
    fn test_handicap_small_board_corners_only() {
        let pts = handicap_points(9, 9);
        assert_eq!(pts.len(), 4);
        assert_eq!(grid_to_human(pts[0], 9), "C3");
        assert_eq!(grid_to_human(pts[1], 9), "G7");
        assert!(handicap_points(19, 1).is_empty());
        assert!(handicap_points(19, 10).is_empty());
    }

    #[test]
    fn test_handicap_tiny_boards_get_none() {
        for size in 2..7 {
            assert!(handicap_points(size, 4).is_empty(), "size {size}");
            assert!(handicap_points(size, 2).is_empty(), "size {size}");
        }
        let mut seven = handicap_points(7, 4);
        assert_eq!(seven.len(), 4);
        seven.sort();
        seven.dedup();
        assert_eq!(seven.len(), 4);
    }

    #[test]
    fn test_pixel_grid() {
        let g = PixelGrid::new(19, 20.0, 30.0);
        assert_eq!(g.to_grid(20.0, 20.0), Some(Point::new(0, 0)));
        assert_eq!(g.to_grid(61.0, 34.0), Some(Point::new(0, 1)));
        assert_eq!(g.to_grid(4.0, 20.0), None);
        let p = Point::new(3, 15);
        let (x, y) = g.to_pixel(p);
        assert_eq!(g.to_grid(x, y), Some(p));
    }
}
