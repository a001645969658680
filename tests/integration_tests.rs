//! Integration tests for goban-record
//!
//! Rules, coordinates, the move tree and sessions, exercised through the
//! public API only.

use goban_record::board::{Board, Color, IllegalMove, Point};
use goban_record::coord::{
    PixelGrid, grid_to_human, grid_to_sgf, handicap_points, human_to_grid, sgf_to_grid,
};
use goban_record::oracle::{Diagnostics, OracleResponse};
use goban_record::quality::{Indicator, QualityConfig};
use goban_record::session::{MoveError, Session};
use goban_record::tree::{Analysis, GameTree, Move, MoveKind};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

fn pt(text: &str) -> Point {
    human_to_grid(text, 19).unwrap()
}

/// Place stones directly, without rules, on a 19x19 board.
fn setpos(black: &[&str], white: &[&str]) -> Board {
    let mut board = Board::new(19);
    for s in black {
        board.set(pt(s), Some(Color::Black));
    }
    for s in white {
        board.set(pt(s), Some(Color::White));
    }
    board
}

fn response(mv: &str, win_prob: f64, score: f64) -> OracleResponse {
    OracleResponse {
        suggested_move: mv.to_string(),
        diagnostics: Diagnostics {
            win_prob: Some(win_prob),
            score: Some(score),
            candidates: Vec::new(),
        },
    }
}

// =============================================================================
// Coordinate tests
// =============================================================================

#[test]
fn test_human_and_grid_agree_on_corners() {
    assert_eq!(human_to_grid("A19", 19), Some(Point::new(0, 0)));
    assert_eq!(human_to_grid("T1", 19), Some(Point::new(18, 18)));
    assert_eq!(human_to_grid("D4", 19), Some(Point::new(15, 3)));
    assert_eq!(grid_to_human(Point::new(3, 15), 19), "Q16");
}

#[test]
fn test_column_i_is_skipped() {
    assert_eq!(human_to_grid("I5", 19), None);
    assert_eq!(human_to_grid("J5", 19), Some(Point::new(14, 8)));
    assert_eq!(grid_to_human(Point::new(0, 8), 9), "J9");
}

#[test]
fn test_out_of_range_rows_rejected() {
    assert_eq!(human_to_grid("A0", 19), None);
    assert_eq!(human_to_grid("A20", 19), None);
    assert_eq!(human_to_grid("K1", 9), None);
    assert_eq!(human_to_grid("", 19), None);
}

#[test]
fn test_sgf_coordinates() {
    assert_eq!(grid_to_sgf(Point::new(3, 15)), "pd");
    assert_eq!(sgf_to_grid("pd", 19), Some(Point::new(3, 15)));
    assert_eq!(sgf_to_grid("tt", 19), None);
    assert_eq!(sgf_to_grid("", 19), None);
}

#[test]
fn test_pixel_grid_snaps_to_nearest_point() {
    let grid = PixelGrid::new(19, 20.0, 30.0);
    assert_eq!(grid.to_pixel(Point::new(0, 0)), (20.0, 20.0));
    assert_eq!(grid.to_grid(52.0, 18.0), Some(Point::new(0, 1)));
    assert_eq!(grid.to_grid(-100.0, 20.0), None);
}

#[test]
fn test_handicap_order() {
    let four: Vec<String> = handicap_points(19, 4)
        .into_iter()
        .map(|p| grid_to_human(p, 19))
        .collect();
    assert_eq!(four, ["D4", "Q16", "D16", "Q4"]);
    assert_eq!(handicap_points(19, 9).len(), 9);
    assert_eq!(handicap_points(9, 9).len(), 4);
    assert!(handicap_points(19, 1).is_empty());
}

// =============================================================================
// Rules tests
// =============================================================================

#[test]
fn test_occupied_point_leaves_board_unchanged() {
    let board = setpos(&["D4"], &[]);
    let before = board.clone();
    assert_eq!(
        board.apply_move(pt("D4"), Color::White),
        Err(IllegalMove::Occupied)
    );
    assert_eq!(board, before);
}

#[test]
fn test_single_stone_capture() {
    let board = setpos(&["C4", "E4", "D5"], &["D4"]);
    let placed = board.apply_move(pt("D3"), Color::Black).unwrap();
    assert_eq!(placed.captured, vec![pt("D4")]);
    assert_eq!(placed.board.get(pt("D4")), None);
    assert_eq!(placed.board.stone_count(), 4);
}

#[test]
fn test_one_move_captures_two_groups() {
    // White stones on A1 and C1 each have one liberty left: B1.
    let board = setpos(&["A2", "C2", "D1"], &["A1", "C1"]);
    let placed = board.apply_move(pt("B1"), Color::Black).unwrap();
    assert_eq!(placed.captured, vec![pt("A1"), pt("C1")]);
}

#[test]
fn test_capture_is_not_suicide() {
    // B1 has no empty neighbor, but playing it captures A1.
    let board = setpos(&["A2", "B2", "C1"], &["A1", "D1", "C2"]);
    let white = board.apply_move(pt("B1"), Color::White);
    assert!(white.is_ok(), "capturing B1 should be legal for white");
    let black_suicide =
        setpos(&[], &["A1", "A2", "B2", "C1"]).apply_move(pt("B1"), Color::Black);
    assert_eq!(black_suicide, Err(IllegalMove::Suicide));
}

#[test]
fn test_surrounded_group_is_captured() {
    let board = setpos(
        &["C4", "C5", "D6", "E6", "F5", "F4", "D3"],
        &["D4", "D5", "E5", "E4"],
    );
    let placed = board.apply_move(pt("E3"), Color::Black).unwrap();
    assert_eq!(placed.captured.len(), 4);
    assert!(placed.board.get(pt("E5")).is_none());
}

// =============================================================================
// Move tree tests
// =============================================================================

#[test]
fn test_second_child_does_not_replace_main_line() {
    let mut tree = GameTree::new();
    let a = tree.add_move(Move::new(MoveKind::Play(pt("D4")), Color::Black));
    tree.back();
    let b = tree.add_move(Move::new(MoveKind::Play(pt("Q16")), Color::Black));
    assert_ne!(a, b);
    let root = tree.node(tree.root());
    assert_eq!(root.children(), &[a, b]);
    assert_eq!(root.main_line_child(), Some(a));
    assert!(!tree.is_on_main_line(b));
}

#[test]
fn test_replaying_a_move_reenters_existing_node() {
    let mut tree = GameTree::new();
    let a = tree.add_move(Move::new(MoveKind::Play(pt("D4")), Color::Black));
    tree.back();
    let again = tree.add_move(Move::new(MoveKind::Play(pt("D4")), Color::Black));
    assert_eq!(a, again);
    assert_eq!(tree.len(), 2);
}

// =============================================================================
// Session tests
// =============================================================================

#[test]
fn test_illegal_move_is_rejected_and_not_recorded() {
    let mut s = Session::new(19, 0, 7.5);
    s.play("D4").unwrap();
    assert!(matches!(
        s.play("D4"),
        Err(MoveError::Illegal(IllegalMove::Occupied))
    ));
    assert!(matches!(s.play("Z99"), Err(MoveError::Notation(_))));
    assert_eq!(s.ply(), 1);
}

#[test]
fn test_go_to_ply_and_back_to_end() {
    let mut s = Session::new(19, 0, 7.5);
    for m in ["D4", "Q16", "D16", "Q4"] {
        s.play(m).unwrap();
    }
    s.go_to_ply(2);
    assert_eq!(s.move_list(), ["D4", "Q16"]);
    assert_eq!(s.board().stone_count(), 2);
    s.go_to_ply(100);
    assert_eq!(s.ply(), 4);
}

#[test]
fn test_remove_last_move_keeps_continuation() {
    let mut s = Session::new(19, 0, 7.5);
    s.play("D4").unwrap();
    s.play("Q16").unwrap();
    assert!(s.remove_last_move());
    assert_eq!(s.ply(), 1);
    assert_eq!(s.variations(), ["Q16"]);
    assert!(s.forward());
    assert_eq!(s.move_list(), ["D4", "Q16"]);
}

#[test]
fn test_variation_and_return_to_main_line() {
    let mut s = Session::new(19, 0, 7.5);
    for m in ["D4", "Q16", "D16"] {
        s.play(m).unwrap();
    }
    s.go_to_ply(1);
    s.play("C3").unwrap();
    s.play("E5").unwrap();
    assert!(!s.is_on_main_line());

    s.return_to_main_line();
    assert!(s.is_on_main_line());
    assert_eq!(s.move_list(), ["D4", "Q16"]);

    s.back();
    assert_eq!(s.variations(), ["Q16", "C3"]);
    assert!(s.select_variation(1));
    assert_eq!(s.move_list(), ["D4", "C3"]);
}

#[test]
fn test_handicap_game_starts_with_white() {
    let mut s = Session::new(19, 2, 0.5);
    assert_eq!(s.board().stone_count(), 2);
    assert_eq!(s.next_color(), Color::White);
    s.play("C3").unwrap();
    assert_eq!(s.board().get(pt("C3")), Some(Color::White));
}

#[test]
fn test_stale_suggestion_is_discarded() {
    let mut s = Session::new(19, 0, 7.5);
    s.play("D4").unwrap();
    let ticket = s.analysis_ticket();

    // The player moves on before the oracle answers.
    s.play("Q16").unwrap();
    let answer = response("D16", 0.5, 0.0);
    assert!(s.apply_analysis(ticket, &answer));
    assert_eq!(s.play_suggestion(ticket, &answer), Ok(None));
    assert_eq!(s.move_list(), ["D4", "Q16"]);

    // The evaluation still lands on the move it was asked about.
    assert!(s.moves()[0].analysis.is_some());
    assert!(s.moves()[1].analysis.is_none());
}

#[test]
fn test_answer_for_replaced_game_is_dropped() {
    let mut s = Session::new(19, 0, 7.5);
    s.play("D4").unwrap();
    let ticket = s.analysis_ticket();
    s.new_game(19, 0, 7.5);
    s.play("D4").unwrap();
    assert!(!s.apply_analysis(ticket, &response("Q16", 0.5, 0.0)));
    assert!(s.moves()[0].analysis.is_none());
}

#[test]
fn test_suggestion_carries_evaluation() {
    let mut s = Session::new(19, 0, 7.5);
    s.play("D4").unwrap();
    let ticket = s.analysis_ticket();
    let answer = response("Q16", 0.48, -0.5);
    s.apply_analysis(ticket, &answer);
    let id = s.play_suggestion(ticket, &answer).unwrap();
    assert!(id.is_some());
    assert_eq!(
        s.last_move().and_then(|m| m.analysis),
        Some(Analysis {
            win_prob: 0.48,
            score: -0.5
        })
    );
}

#[test]
fn test_last_move_indicator_rates_player_move() {
    let config = QualityConfig::default();
    let mut s = Session::new(19, 0, 7.5);
    let evals = [(0.5, 0.5), (0.5, 0.5), (0.5, 0.5)];
    for (m, (p, sc)) in ["D4", "Q16", "D16"].into_iter().zip(evals) {
        s.play(m).unwrap();
        let ticket = s.analysis_ticket();
        s.apply_analysis(ticket, &response("pass", p, sc));
    }
    assert_eq!(s.last_move_indicator(&config), Some(Indicator::Good));

    // White throws away ten points.
    s.play("Q4").unwrap();
    let ticket = s.analysis_ticket();
    s.apply_analysis(ticket, &response("pass", 0.9, 10.5));
    assert_eq!(s.last_move_indicator(&config), Some(Indicator::Bad));
}
