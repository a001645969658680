//! A game being played or reviewed.
//!
//! The session owns the move tree and the cursor into it. The board is never
//! stored: every query replays the path from the root through the rules
//! engine, so what is shown always matches the line being viewed.
//!
//! Oracle answers arrive after the move they evaluate has been recorded. An
//! [`AnalysisTicket`] names the node a request was made for; answers are
//! written to that node, and dropped when the game has since been replaced.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::{Board, Color, IllegalMove, Point};
use crate::constants::{DEFAULT_BOARD_SIZE, DEFAULT_KOMI};
use crate::coord::{grid_to_human, handicap_points};
use crate::oracle::{OracleRequest, OracleResponse};
use crate::quality::{self, Indicator, MoveQuality, QualityAnnotation, QualityConfig};
use crate::sgf::{self, GameInfo, GameRecord, RecordedMove, SgfError};
use crate::tree::{Agent, Analysis, GameTree, Move, MoveKind, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("unreadable move {0:?}")]
    Notation(String),
    #[error("illegal move: {0}")]
    Illegal(#[from] IllegalMove),
    #[error("game is over")]
    GameOver,
}

/// Identifies the node an oracle request was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    node: NodeId,
    epoch: u64,
}

impl AnalysisTicket {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

pub struct Session {
    tree: GameTree,
    info: GameInfo,
    /// Bumped on every new game so tickets for an old tree are recognised.
    epoch: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE, 0, DEFAULT_KOMI)
    }
}

impl Session {
    /// Start a game with the standard handicap layout. Handicap counts that
    /// produce no stones are treated as an even game.
    pub fn new(board_size: usize, handicap: usize, komi: f64) -> Self {
        let setup_black = handicap_points(board_size, handicap);
        Self {
            tree: GameTree::new(),
            info: GameInfo {
                board_size,
                handicap: setup_black.len(),
                setup_black,
                komi,
                ..GameInfo::default()
            },
            epoch: 0,
        }
    }

    /// Discard the current game and start an empty one.
    pub fn new_game(&mut self, board_size: usize, handicap: usize, komi: f64) {
        let epoch = self.epoch + 1;
        *self = Self::new(board_size, handicap, komi);
        self.epoch = epoch;
        info!(board_size, handicap = self.info.handicap, komi, "new game");
    }

    pub fn board_size(&self) -> usize {
        self.info.board_size
    }

    pub fn handicap(&self) -> usize {
        self.info.handicap
    }

    pub fn komi(&self) -> f64 {
        self.info.komi
    }

    pub fn set_komi(&mut self, komi: f64) {
        self.info.komi = komi;
    }

    pub fn info(&self) -> &GameInfo {
        &self.info
    }

    pub fn set_players(&mut self, black: impl Into<String>, white: impl Into<String>) {
        self.info.black = black.into();
        self.info.white = white.into();
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    // =========================================================================
    // Position queries
    // =========================================================================

    /// Empty board with the setup stones placed.
    fn setup_board(&self) -> Board {
        let mut board = Board::new(self.board_size());
        for &p in &self.info.setup_black {
            board.set(p, Some(Color::Black));
        }
        for &p in &self.info.setup_white {
            board.set(p, Some(Color::White));
        }
        board
    }

    /// Board after the moves leading to `node`.
    ///
    /// # Panics
    /// If a recorded move no longer replays legally, which would mean the tree
    /// was corrupted.
    pub fn board_at(&self, node: NodeId) -> Board {
        let mut board = self.setup_board();
        for id in self.tree.path_to_root(node) {
            let Some(mv) = self.tree.node(id).mv() else {
                continue;
            };
            if let MoveKind::Play(p) = mv.kind {
                board = match board.apply_move(p, mv.color) {
                    Ok(placed) => placed.board,
                    Err(e) => panic!("recorded move at {p:?} does not replay: {e}"),
                };
            }
        }
        board
    }

    pub fn board(&self) -> Board {
        self.board_at(self.tree.current())
    }

    pub fn ply(&self) -> usize {
        self.tree.ply()
    }

    pub fn next_color(&self) -> Color {
        Color::to_move(self.ply(), self.handicap())
    }

    /// Whether [`play_point`](Self::play_point) would accept `p` for the side
    /// to move. Two passes do not block play; only a resignation does.
    pub fn is_legal(&self, p: Point) -> bool {
        !self.is_resigned() && self.board().is_legal(p, self.next_color())
    }

    fn is_resigned(&self) -> bool {
        self.last_move().is_some_and(|m| m.kind == MoveKind::Resign)
    }

    /// Moves along the current path.
    pub fn moves(&self) -> Vec<Move> {
        self.tree.moves().cloned().collect()
    }

    /// Moves along the current path in human notation.
    pub fn move_list(&self) -> Vec<String> {
        let size = self.board_size();
        self.tree.moves().map(|m| m.kind.to_human(size)).collect()
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.tree.node(self.tree.current()).mv()
    }

    /// A resignation, or two passes in a row, ends the game.
    pub fn is_game_over(&self) -> bool {
        let moves: Vec<&Move> = self.tree.moves().collect();
        match moves.as_slice() {
            [.., last] if last.kind == MoveKind::Resign => true,
            [.., a, b] => a.kind.is_pass() && b.kind.is_pass(),
            _ => false,
        }
    }

    // =========================================================================
    // Playing
    // =========================================================================

    /// Play `text` (`"D4"`, `"pass"` or `"resign"`) for the side to move.
    pub fn play(&mut self, text: &str) -> Result<NodeId, MoveError> {
        let kind = MoveKind::parse(text, self.board_size())
            .ok_or_else(|| MoveError::Notation(text.to_string()))?;
        self.play_kind(kind, Agent::Player)
    }

    pub fn play_point(&mut self, p: Point) -> Result<NodeId, MoveError> {
        self.play_kind(MoveKind::Play(p), Agent::Player)
    }

    /// Play `kind` for the side to move, recording who chose it.
    ///
    /// Only resignation blocks further play; after two passes play may resume.
    pub fn play_kind(&mut self, kind: MoveKind, agent: Agent) -> Result<NodeId, MoveError> {
        if self.is_resigned() {
            return Err(MoveError::GameOver);
        }
        let color = self.next_color();
        if let MoveKind::Play(p) = kind {
            self.board().apply_move(p, color)?;
        }
        let id = self.tree.add_move(Move::new(kind, color).with_agent(agent));
        debug!(
            ply = self.ply(),
            %color,
            mv = %kind.to_human(self.board_size()),
            "move recorded"
        );
        Ok(id)
    }

    /// Play `text` for `color`, inserting a pass first if it is the other
    /// side's turn.
    pub fn play_as(&mut self, color: Color, text: &str) -> Result<NodeId, MoveError> {
        if color == self.next_color() {
            return self.play(text);
        }
        let kind = MoveKind::parse(text, self.board_size())
            .ok_or_else(|| MoveError::Notation(text.to_string()))?;
        if let MoveKind::Play(p) = kind {
            // A pass leaves the board unchanged, so legality can be checked now.
            self.board().apply_move(p, color)?;
        }
        self.play_kind(MoveKind::Pass, Agent::Player)?;
        self.play_kind(kind, Agent::Player)
    }

    /// Attach a free-text comment to the current move. Returns `false` at
    /// the root, which has no move.
    pub fn set_comment(&mut self, text: impl Into<String>) -> bool {
        let current = self.tree.current();
        match self.tree.move_mut(current) {
            Some(mv) => {
                let text = text.into();
                mv.comment = (!text.trim().is_empty()).then_some(text);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn back(&mut self) -> bool {
        self.tree.back()
    }

    pub fn forward(&mut self) -> bool {
        self.tree.forward()
    }

    pub fn go_to_ply(&mut self, n: usize) {
        self.tree.go_to_ply(n);
    }

    pub fn return_to_main_line(&mut self) {
        self.tree.return_to_main_line();
    }

    /// Step back one move. The move stays in the tree and is re-entered by
    /// playing it again.
    pub fn remove_last_move(&mut self) -> bool {
        self.tree.back()
    }

    pub fn is_on_main_line(&self) -> bool {
        self.tree.is_on_main_line(self.tree.current())
    }

    /// Continuations recorded after the current position, main line first
    /// in creation order.
    pub fn variations(&self) -> Vec<String> {
        let size = self.board_size();
        self.tree
            .node(self.tree.current())
            .children()
            .iter()
            .filter_map(|&c| self.tree.node(c).mv())
            .map(|m| m.kind.to_human(size))
            .collect()
    }

    /// Enter the `index`-th recorded continuation.
    pub fn select_variation(&mut self, index: usize) -> bool {
        let Some(&child) = self.tree.node(self.tree.current()).children().get(index) else {
            return false;
        };
        let Some(mv) = self.tree.node(child).mv().cloned() else {
            return false;
        };
        self.tree.add_move(mv);
        true
    }

    // =========================================================================
    // Move quality
    // =========================================================================

    /// Quality of the move at 0-based `index` on the current path.
    pub fn move_quality(&self, index: usize, config: &QualityConfig) -> Option<MoveQuality> {
        quality::move_quality(&self.moves(), index, config)
    }

    /// Moves on the current path at or above `config.threshold`.
    pub fn bad_moves(&self, config: &QualityConfig) -> Vec<QualityAnnotation> {
        quality::annotate(&self.moves(), self.board_size(), config)
    }

    pub fn last_move_indicator(&self, config: &QualityConfig) -> Option<Indicator> {
        quality::last_move_indicator(&self.moves(), config)
    }

    // =========================================================================
    // Oracle round trip
    // =========================================================================

    pub fn oracle_request(&self) -> OracleRequest {
        OracleRequest {
            board_size: self.board_size(),
            moves: self.move_list(),
            komi: self.komi(),
            handicap: self.handicap(),
            setup_black: self.setup_texts(&self.info.setup_black),
            setup_white: self.setup_texts(&self.info.setup_white),
        }
    }

    fn setup_texts(&self, points: &[Point]) -> Vec<String> {
        let size = self.board_size();
        points.iter().map(|&p| grid_to_human(p, size)).collect()
    }

    /// Ticket for a request about the current position.
    pub fn analysis_ticket(&self) -> AnalysisTicket {
        AnalysisTicket {
            node: self.tree.current(),
            epoch: self.epoch,
        }
    }

    fn is_live(&self, ticket: AnalysisTicket) -> bool {
        ticket.epoch == self.epoch && self.tree.contains(ticket.node)
    }

    /// Store the oracle's evaluation on the ticket's node.
    ///
    /// Returns `false` when the answer was discarded: its game is gone, the
    /// ticket names the root, or the response carries no usable evaluation.
    pub fn apply_analysis(&mut self, ticket: AnalysisTicket, response: &OracleResponse) -> bool {
        if !self.is_live(ticket) {
            debug!(node = ticket.node.index(), "discarding analysis for a replaced game");
            return false;
        }
        let Some(analysis) = response.analysis() else {
            return false;
        };
        match self.tree.move_mut(ticket.node) {
            Some(mv) => {
                mv.analysis = Some(analysis);
                true
            }
            None => false,
        }
    }

    /// Play the oracle's suggested move, provided the cursor has not moved
    /// since the ticket was issued.
    ///
    /// The new node takes the response's evaluation: the value of the
    /// position before the oracle's best move is the value after it.
    pub fn play_suggestion(
        &mut self,
        ticket: AnalysisTicket,
        response: &OracleResponse,
    ) -> Result<Option<NodeId>, MoveError> {
        if !self.is_live(ticket) || self.tree.current() != ticket.node {
            debug!(node = ticket.node.index(), "discarding stale suggestion");
            return Ok(None);
        }
        let kind = MoveKind::parse(&response.suggested_move, self.board_size())
            .ok_or_else(|| MoveError::Notation(response.suggested_move.clone()))?;
        let id = self.play_kind(kind, Agent::Oracle)?;
        if let (Some(mv), Some(analysis)) = (self.tree.move_mut(id), response.analysis()) {
            mv.analysis = Some(analysis);
        }
        Ok(Some(id))
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// The current path as a game record, with bad-move annotations when
    /// there are any.
    pub fn to_record(&self, config: &QualityConfig) -> GameRecord {
        let size = self.board_size();
        let moves = self
            .tree
            .moves()
            .map(|m| RecordedMove {
                mv: m.kind.to_human(size),
                win_prob: m.analysis.map(|a| a.win_prob),
                score: m.analysis.map(|a| a.score),
                comment: m.comment.clone(),
            })
            .collect();
        let annotations = self.bad_moves(config);
        GameRecord {
            info: self.info.clone(),
            moves,
            annotations: (!annotations.is_empty()).then_some(annotations),
        }
    }

    pub fn to_sgf(&self, config: &QualityConfig) -> String {
        sgf::serialize(&self.to_record(config))
    }

    /// Rebuild a session from a record.
    ///
    /// Replay stops at the first move that cannot be played; everything
    /// before it is kept. A result of `X+R` adds the loser's resignation.
    pub fn from_record(record: &GameRecord) -> Session {
        let info = &record.info;
        let mut session = Session::new(info.board_size, info.handicap, info.komi);
        if !info.setup_black.is_empty() || !info.setup_white.is_empty() {
            session.info = info.clone();
        } else {
            session.info = GameInfo {
                handicap: session.info.handicap,
                setup_black: session.info.setup_black.clone(),
                ..info.clone()
            };
        }

        for (i, rec) in record.moves.iter().enumerate() {
            let id = match session.play(&rec.mv) {
                Ok(id) => id,
                Err(e) => {
                    warn!(ply = i + 1, mv = %rec.mv, error = %e, "stopping replay");
                    break;
                }
            };
            if let Some(mv) = session.tree.move_mut(id) {
                mv.comment = rec.comment.clone();
                if let (Some(win_prob), Some(score)) = (rec.win_prob, rec.score) {
                    mv.analysis = Some(Analysis { win_prob, score });
                }
            }
        }

        let resigned = info
            .result
            .as_deref()
            .is_some_and(|r| r.trim().to_ascii_uppercase().ends_with("+R"));
        if resigned && info.winner() == Some(session.next_color().opponent()) {
            if let Err(e) = session.play_kind(MoveKind::Resign, Agent::Player) {
                warn!(error = %e, "could not record resignation");
            }
        }
        session
    }

    pub fn load_sgf(text: &str) -> Result<Session, SgfError> {
        let record = sgf::deserialize(text)?;
        Ok(Session::from_record(&record))
    }

    /// Replace the current game with one read from SGF. Tickets issued for
    /// the old game go stale. On error the current game is untouched.
    pub fn load_game(&mut self, text: &str) -> Result<(), SgfError> {
        let mut loaded = Session::load_sgf(text)?;
        loaded.epoch = self.epoch + 1;
        *self = loaded;
        info!(
            board_size = self.board_size(),
            moves = self.ply(),
            "game loaded"
        );
        Ok(())
    }
}
