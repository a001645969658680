//! Move quality from consecutive oracle evaluations.
//!
//! A move's *badness* adds the score it gave away to the win-probability it
//! gave away, the latter converted to points through its log-odds:
//!
//! ```text
//! points_lost = max(0, prev_score - cur_score)
//! odds_points = max(0, logit(prev_p) - logit(cur_p)) / odds_per_point
//! badness     = points_lost + odds_points
//! ```
//!
//! Both evaluations are first turned to the mover's point of view, so a
//! positive badness always means the mover made things worse for themselves.

use serde::{Deserialize, Serialize};

use crate::board::Color;
use crate::constants::{
    BLUNDER_THRES, INDICATOR_BINS, LISTING_THRES, LOGIT_EPSILON, MISTAKE_THRES, ODDS_PER_POINT,
};
use crate::tree::{Agent, Analysis, Move, MoveKind};

/// User-adjustable scoring settings.
///
/// ```
/// use goban_record::quality::QualityConfig;
///
/// let config = QualityConfig::default().with_threshold(5.0);
/// assert_eq!(config.threshold, 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityConfig {
    /// Minimum badness for a move to be listed.
    pub threshold: f64,
    /// Log-odds that count as one point of score.
    pub odds_per_point: f64,
    pub blunder: f64,
    pub mistake: f64,
    /// Edges between the four indicator tiers.
    pub indicator_bins: [f64; 3],
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            threshold: LISTING_THRES,
            odds_per_point: ODDS_PER_POINT,
            blunder: BLUNDER_THRES,
            mistake: MISTAKE_THRES,
            indicator_bins: INDICATOR_BINS,
        }
    }
}

impl QualityConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_odds_per_point(mut self, odds_per_point: f64) -> Self {
        self.odds_per_point = odds_per_point;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveQuality {
    pub points_lost: f64,
    pub odds_points: f64,
    pub badness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Inaccuracy,
    Mistake,
    Blunder,
}

/// Four-tier marker for the player's latest move, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Indicator {
    Good,
    Fair,
    Poor,
    Bad,
}

/// One listed move in a reviewed game. This is the shape stored in the SGF
/// analysis payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAnnotation {
    /// 1-based move number.
    pub ply: usize,
    #[serde(rename = "move")]
    pub mv: String,
    pub color: Color,
    pub badness: f64,
    pub severity: Severity,
}

/// `ln(p / (1 - p))` with `p` clamped away from 0 and 1.
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPSILON, 1.0 - LOGIT_EPSILON);
    (p / (1.0 - p)).ln()
}

/// Badness of going from `prev` to `cur` when `mover` made the move.
pub fn badness_between(
    prev: Analysis,
    cur: Analysis,
    mover: Color,
    config: &QualityConfig,
) -> MoveQuality {
    let (prev_p, cur_p, prev_s, cur_s) = match mover {
        Color::Black => (prev.win_prob, cur.win_prob, prev.score, cur.score),
        Color::White => (
            1.0 - prev.win_prob,
            1.0 - cur.win_prob,
            -prev.score,
            -cur.score,
        ),
    };

    let points_lost = (prev_s - cur_s).max(0.0);
    let odds_loss = (-(logit(cur_p) - logit(prev_p))).max(0.0);
    let odds_points = odds_loss / config.odds_per_point;
    MoveQuality {
        points_lost,
        odds_points,
        badness: points_lost + odds_points,
    }
}

/// Quality of `moves[i]`, or `None` when there is no usable signal: either
/// move is a pass or resignation, either evaluation is missing, or `i <= 1`.
pub fn move_quality(moves: &[Move], i: usize, config: &QualityConfig) -> Option<MoveQuality> {
    if i <= 1 || i >= moves.len() {
        return None;
    }
    let (prev, cur) = (&moves[i - 1], &moves[i]);
    if !matches!(prev.kind, MoveKind::Play(_)) || !matches!(cur.kind, MoveKind::Play(_)) {
        return None;
    }
    Some(badness_between(prev.analysis?, cur.analysis?, cur.color, config))
}

/// Severity of a badness value, `None` below the listing threshold.
pub fn classify(badness: f64, config: &QualityConfig) -> Option<Severity> {
    if badness < config.threshold {
        return None;
    }
    Some(if badness >= config.blunder {
        Severity::Blunder
    } else if badness >= config.mistake {
        Severity::Mistake
    } else {
        Severity::Inaccuracy
    })
}

pub fn indicator(badness: f64, config: &QualityConfig) -> Indicator {
    let [fair, poor, bad] = config.indicator_bins;
    if badness >= bad {
        Indicator::Bad
    } else if badness >= poor {
        Indicator::Poor
    } else if badness >= fair {
        Indicator::Fair
    } else {
        Indicator::Good
    }
}

/// Every move at or above the threshold, in game order.
pub fn annotate(moves: &[Move], board_size: usize, config: &QualityConfig) -> Vec<QualityAnnotation> {
    (0..moves.len())
        .filter_map(|i| {
            let q = move_quality(moves, i, config)?;
            let severity = classify(q.badness, config)?;
            Some(QualityAnnotation {
                ply: i + 1,
                mv: moves[i].kind.to_human(board_size),
                color: moves[i].color,
                badness: q.badness,
                severity,
            })
        })
        .collect()
}

/// Indicator for the most recent move the player made themselves.
/// Oracle moves are never rated.
pub fn last_move_indicator(moves: &[Move], config: &QualityConfig) -> Option<Indicator> {
    let i = moves.iter().rposition(|m| m.agent == Agent::Player)?;
    let q = move_quality(moves, i, config)?;
    Some(indicator(q.badness, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Point;

    fn eval(win_prob: f64, score: f64) -> Analysis {
        Analysis { win_prob, score }
    }

    fn played(col: usize, color: Color, a: Option<Analysis>) -> Move {
        let mut m = Move::new(MoveKind::Play(Point::new(0, col)), color);
        m.analysis = a;
        m
    }

    #[test]
    fn test_logit_is_clamped() {
        assert_eq!(logit(0.5), 0.0);
        assert!(logit(0.0).is_finite());
        assert!(logit(1.0).is_finite());
        assert!((logit(1.0) + logit(0.0)).abs() < 1e-9);
    }

    #[test]
    fn test_unchanged_evaluation_is_zero() {
        let c = QualityConfig::default();
        for color in [Color::Black, Color::White] {
            let q = badness_between(eval(0.6, 3.0), eval(0.6, 3.0), color, &c);
            assert_eq!(q.badness, 0.0);
        }
    }

    #[test]
    fn test_improvement_is_not_negative() {
        let c = QualityConfig::default();
        let q = badness_between(eval(0.4, -2.0), eval(0.7, 5.0), Color::Black, &c);
        assert_eq!(q.badness, 0.0);
    }

    #[test]
    fn test_white_perspective_is_flipped() {
        let c = QualityConfig::default();
        // Black's chances rise after White's move: bad for White.
        let q = badness_between(eval(0.5, 0.0), eval(0.6, 2.0), Color::White, &c);
        assert!((q.points_lost - 2.0).abs() < 1e-9);
        assert!(q.odds_points > 0.0);
        let expected = (logit(0.6) - logit(0.5)) / 0.12;
        assert!((q.odds_points - expected).abs() < 1e-9);
        // The same change is free for Black.
        let q = badness_between(eval(0.5, 0.0), eval(0.6, 2.0), Color::Black, &c);
        assert_eq!(q.badness, 0.0);
    }

    #[test]
    fn test_no_signal_cases() {
        let c = QualityConfig::default();
        let a = Some(eval(0.5, 0.0));
        let moves = vec![
            played(0, Color::Black, a),
            played(1, Color::White, a),
            played(2, Color::Black, None),
            played(3, Color::White, a),
            Move::new(MoveKind::Pass, Color::Black),
            played(5, Color::White, a),
        ];
        assert!(move_quality(&moves, 1, &c).is_none());
        assert!(move_quality(&moves, 2, &c).is_none());
        assert!(move_quality(&moves, 3, &c).is_none());
        assert!(move_quality(&moves, 4, &c).is_none());
        assert!(move_quality(&moves, 5, &c).is_none());
        assert!(move_quality(&moves, 9, &c).is_none());
    }

    #[test]
    fn test_classify_tiers() {
        let c = QualityConfig::default();
        assert_eq!(classify(9.0, &c), Some(Severity::Blunder));
        assert_eq!(classify(8.0, &c), Some(Severity::Blunder));
        assert_eq!(classify(5.0, &c), Some(Severity::Mistake));
        assert_eq!(classify(3.5, &c), Some(Severity::Inaccuracy));
        assert_eq!(classify(2.9, &c), None);

        let strict = c.with_threshold(6.0);
        assert_eq!(classify(5.0, &strict), None);
        assert_eq!(classify(7.0, &strict), Some(Severity::Mistake));
    }

    #[test]
    fn test_indicator_bins() {
        let c = QualityConfig::default();
        assert_eq!(indicator(0.0, &c), Indicator::Good);
        assert_eq!(indicator(2.0, &c), Indicator::Fair);
        assert_eq!(indicator(4.0, &c), Indicator::Poor);
        assert_eq!(indicator(12.0, &c), Indicator::Bad);
    }

    #[test]
    fn test_last_move_indicator_skips_oracle_moves() {
        let c = QualityConfig::default();
        let moves = vec![
            played(0, Color::Black, Some(eval(0.5, 0.0))),
            played(1, Color::White, Some(eval(0.5, 0.0))),
            played(2, Color::Black, Some(eval(0.2, -9.0))),
            played(3, Color::White, Some(eval(0.2, -9.0))).with_agent(Agent::Oracle),
        ];
        assert_eq!(last_move_indicator(&moves, &c), Some(Indicator::Bad));
    }

    #[test]
    fn test_annotate_lists_bad_moves() {
        let c = QualityConfig::default();
        let moves = vec![
            played(0, Color::Black, Some(eval(0.5, 0.0))),
            played(1, Color::White, Some(eval(0.5, 0.0))),
            played(2, Color::Black, Some(eval(0.5, 0.0))),
            played(3, Color::White, Some(eval(0.5, 0.5))),
            played(4, Color::Black, Some(eval(0.2, -10.0))),
        ];
        let notes = annotate(&moves, 19, &c);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].ply, 5);
        assert_eq!(notes[0].mv, "E19");
        assert_eq!(notes[0].severity, Severity::Blunder);
    }
}
