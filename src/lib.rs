//! goban-record: Go rules and game records with move-quality review.
//!
//! Games are kept as a tree of moves with one main line and any number of
//! variations. Positions are rebuilt from the tree by the rules engine, games
//! are read from and written to SGF, and moves that carry an evaluation from
//! an analysis oracle can be graded by how much they cost.
//!
//! ## Modules
//!
//! - [`constants`] - Board limits, SGF constants and quality thresholds
//! - [`board`] - Board occupancy, captures and suicide
//! - [`coord`] - Human, SGF, grid and pixel coordinates; handicap points
//! - [`tree`] - The move tree and its cursor
//! - [`quality`] - Move-quality metric and bad-move annotations
//! - [`sgf`] - SGF reading and writing with an embedded analysis payload
//! - [`oracle`] - Move-oracle request/response types and a local oracle
//! - [`session`] - A game being played or reviewed
//! - [`gtp`] - Go Text Protocol front-end
//!
//! ## Example
//!
//! ```
//! use goban_record::quality::QualityConfig;
//! use goban_record::session::Session;
//!
//! let mut game = Session::new(19, 0, 7.5);
//! game.play("Q16").unwrap();
//! game.play("D4").unwrap();
//!
//! let sgf = game.to_sgf(&QualityConfig::default());
//! let loaded = Session::load_sgf(&sgf).unwrap();
//! assert_eq!(loaded.move_list(), ["Q16", "D4"]);
//! ```

pub mod board;
pub mod constants;
pub mod coord;
pub mod gtp;
pub mod oracle;
pub mod quality;
pub mod session;
pub mod sgf;
pub mod tree;
