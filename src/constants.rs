//! Defaults for board geometry, records and move-quality scoring.
//!
//! Board size is a runtime value (9, 13 and 19 are all common), so unlike a
//! playing engine nothing here fixes the geometry at compile time.

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN).
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Largest board the coordinate alphabets can express.
pub const MAX_BOARD_SIZE: usize = 25;

/// Column letters in human notation. `I` is skipped to avoid confusion with `J`.
pub const COLUMN_LETTERS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Handicap stones sit this far in from the edge on boards of 13 and up.
pub const HANDICAP_INSET_LARGE: usize = 3;

/// Handicap inset for boards smaller than 13.
pub const HANDICAP_INSET_SMALL: usize = 2;

/// Smallest board that takes handicap stones at all. Below this the corner
/// points crowd together or coincide.
pub const HANDICAP_MIN_BOARD: usize = 7;

/// Smallest board with edge and centre handicap points.
pub const HANDICAP_FULL_LAYOUT_MIN: usize = 13;

// =============================================================================
// Game Record Defaults
// =============================================================================

/// Komi used when a record omits it or it cannot be parsed.
pub const DEFAULT_KOMI: f64 = 7.5;

/// SGF file format version written to the `FF` tag.
pub const SGF_FORMAT: u32 = 4;

/// Program name written to the `SO` tag.
pub const PROGRAM_NAME: &str = "goban-record";

/// Prefix marking the root comment that carries the analysis payload.
pub const ANALYSIS_MARKER: &str = "goban-analysis:";

// =============================================================================
// Move Quality Parameters
// =============================================================================

/// Probabilities are clamped to `[LOGIT_EPSILON, 1 - LOGIT_EPSILON]` before `ln`.
pub const LOGIT_EPSILON: f64 = 1e-6;

/// Log-odds lost per point of score. Empirical, not a law of the game.
pub const ODDS_PER_POINT: f64 = 0.12;

/// Badness at or above which a move is a blunder.
pub const BLUNDER_THRES: f64 = 8.0;

/// Badness at or above which a move is a mistake.
pub const MISTAKE_THRES: f64 = 4.0;

/// Default minimum badness for a move to be listed at all.
pub const LISTING_THRES: f64 = 3.0;

/// Bin edges for the 4-tier indicator shown after the player's own move.
pub const INDICATOR_BINS: [f64; 3] = [2.0, 4.0, 8.0];
