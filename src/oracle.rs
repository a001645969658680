//! The move-suggestion oracle seen from the engine side.
//!
//! The oracle itself (a remote analysis server) is not part of this crate.
//! What lives here is the shape of its request and response, an [`Oracle`]
//! trait for whatever transport delivers them, and [`RandomOracle`], a local
//! stand-in for demos and self-play.
//!
//! Field names follow the analysis server's JSON. Alternative spellings are
//! accepted on input:
//!
//! ```json
//! {"bot_move": "Q16",
//!  "diagnostics": {"winprob": 0.54, "score": 1.5,
//!                  "best_ten": [{"move": "Q16", "psv": 812}]}}
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Point};
use crate::constants::ODDS_PER_POINT;
use crate::coord::{grid_to_human, handicap_points, human_to_grid};
use crate::tree::{Analysis, MoveKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub board_size: usize,
    /// Moves so far in human notation, `pass` included.
    pub moves: Vec<String>,
    pub komi: f64,
    pub handicap: usize,
    /// Setup stones in human notation. When both are empty, `handicap`
    /// stones go on the standard points.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup_black: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup_white: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "move")]
    pub mv: String,
    /// Relative weight of the candidate; larger is preferred.
    #[serde(rename = "psv", alias = "share", default)]
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Black's probability of winning.
    #[serde(rename = "winprob", alias = "win_prob", default)]
    pub win_prob: Option<f64>,
    /// Black's expected lead in points.
    #[serde(alias = "expected_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "best_ten", alias = "candidates", default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleResponse {
    #[serde(rename = "bot_move", alias = "suggested_move")]
    pub suggested_move: String,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl OracleResponse {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("malformed oracle response")
    }

    /// The evaluation, when both probability and score are present and the
    /// probability is a real probability.
    pub fn analysis(&self) -> Option<Analysis> {
        let win_prob = self.diagnostics.win_prob.filter(|p| (0.0..=1.0).contains(p))?;
        let score = self.diagnostics.score.filter(|s| s.is_finite())?;
        Some(Analysis { win_prob, score })
    }
}

/// Anything that can answer a move request.
pub trait Oracle {
    fn request_move(&mut self, request: &OracleRequest) -> Result<OracleResponse>;
}

/// Rebuild the board described by a request.
fn replay(request: &OracleRequest) -> Result<Board> {
    let size = request.board_size;
    let mut board = Board::new(size);
    if request.setup_black.is_empty() && request.setup_white.is_empty() {
        for p in handicap_points(size, request.handicap) {
            board.set(p, Some(Color::Black));
        }
    }
    for (color, stones) in [
        (Color::Black, &request.setup_black),
        (Color::White, &request.setup_white),
    ] {
        for text in stones {
            let p = human_to_grid(text, size)
                .with_context(|| format!("unreadable setup stone {text:?}"))?;
            board.set(p, Some(color));
        }
    }
    for (i, text) in request.moves.iter().enumerate() {
        let kind = MoveKind::parse(text, size)
            .with_context(|| format!("unreadable move {text:?} at ply {}", i + 1))?;
        match kind {
            MoveKind::Play(p) => {
                let color = Color::to_move(i, request.handicap);
                board = board
                    .apply_move(p, color)
                    .with_context(|| format!("illegal move {text} at ply {}", i + 1))?
                    .board;
            }
            MoveKind::Pass => {}
            MoveKind::Resign => bail!("game already resigned at ply {}", i + 1),
        }
    }
    Ok(board)
}

/// Plays a uniformly random legal move that does not fill one of its own
/// eyes, and reports a crude stone-count evaluation.
pub struct RandomOracle {
    rng: fastrand::Rng,
}

impl Default for RandomOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomOracle {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Oracle for RandomOracle {
    fn request_move(&mut self, request: &OracleRequest) -> Result<OracleResponse> {
        let board = replay(request)?;
        let size = request.board_size;
        let color = Color::to_move(request.moves.len(), request.handicap);

        let legal: Vec<Point> = (0..size * size)
            .map(|i| Point::new(i / size, i % size))
            .filter(|&p| board.eye_color(p) != Some(color) && board.is_legal(p, color))
            .collect();

        let suggested_move = if legal.is_empty() {
            "pass".to_string()
        } else {
            grid_to_human(legal[self.rng.usize(..legal.len())], size)
        };

        let (black, white) = board.stones().fold((0.0, 0.0), |(b, w), (_, c)| match c {
            Color::Black => (b + 1.0, w),
            Color::White => (b, w + 1.0),
        });
        let score = black - white - request.komi;
        let win_prob = 1.0 / (1.0 + (-ODDS_PER_POINT * score).exp());

        let mut candidates: Vec<Candidate> = (0..legal.len().min(5))
            .map(|_| Candidate {
                mv: grid_to_human(legal[self.rng.usize(..legal.len())], size),
                share: self.rng.f64(),
            })
            .collect();
        candidates.sort_by(|a, b| b.share.total_cmp(&a.share));

        Ok(OracleResponse {
            suggested_move,
            diagnostics: Diagnostics {
                win_prob: Some(win_prob),
                score: Some(score),
                candidates,
            },
        })
    }
}
