//! Reading and writing game records in SGF (Smart Game Format).
//!
//! Only the main line is exchanged: on output the given move path is written
//! as a single sequence, and on input the first variation is followed at every
//! branch point.
//!
//! Two conventions ride on top of plain SGF comments:
//!
//! - A move's oracle evaluation is written as `C[P:<black win %> S:<black lead>]`
//!   unless the move already has a free-text comment.
//! - Reviewed-move annotations are stored as JSON in a root-level comment that
//!   starts with [`ANALYSIS_MARKER`].

use std::fmt::Write as _;

use thiserror::Error;
use tracing::{debug, warn};

use crate::board::{Color, Point};
use crate::constants::{
    ANALYSIS_MARKER, DEFAULT_BOARD_SIZE, DEFAULT_KOMI, MAX_BOARD_SIZE, PROGRAM_NAME, SGF_FORMAT,
};
use crate::coord::{grid_to_human, grid_to_sgf, handicap_points, sgf_to_grid};
use crate::quality::QualityAnnotation;
use crate::tree::MoveKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SgfError {
    #[error("no game tree found in record")]
    NoGameTree,
}

/// Header information of a game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameInfo {
    pub board_size: usize,
    pub komi: f64,
    /// Handicap count, `0` for an even game. White moves first from 2 up.
    pub handicap: usize,
    /// Setup stones (`AB`/`AW`) on the board before the first move.
    pub setup_black: Vec<Point>,
    pub setup_white: Vec<Point>,
    pub black: String,
    pub white: String,
    /// Raw `RE` value such as `"B+R"` or `"W+3.5"`.
    pub result: Option<String>,
    pub date: Option<String>,
    pub source: Option<String>,
}

impl Default for GameInfo {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            komi: DEFAULT_KOMI,
            handicap: 0,
            setup_black: Vec::new(),
            setup_white: Vec::new(),
            black: String::new(),
            white: String::new(),
            result: None,
            date: None,
            source: None,
        }
    }
}

impl GameInfo {
    /// Winner named by the first letter of the result, if any.
    pub fn winner(&self) -> Option<Color> {
        let first = self.result.as_deref()?.trim().chars().next()?;
        match first.to_ascii_lowercase() {
            'b' => Some(Color::Black),
            'w' => Some(Color::White),
            _ => None,
        }
    }
}

/// One ply of a record, in human notation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordedMove {
    /// `"D4"`, `"pass"` or `"resign"`.
    pub mv: String,
    pub win_prob: Option<f64>,
    pub score: Option<f64>,
    pub comment: Option<String>,
}

impl RecordedMove {
    pub fn new(mv: impl Into<String>) -> Self {
        Self {
            mv: mv.into(),
            ..Default::default()
        }
    }

    fn inserted_pass() -> Self {
        Self {
            mv: "pass".into(),
            win_prob: Some(0.0),
            score: Some(0.0),
            comment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameRecord {
    pub info: GameInfo,
    pub moves: Vec<RecordedMove>,
    pub annotations: Option<Vec<QualityAnnotation>>,
}

impl GameRecord {
    pub fn move_texts(&self) -> Vec<String> {
        self.moves.iter().map(|m| m.mv.clone()).collect()
    }
}

// =============================================================================
// Writing
// =============================================================================

/// Escape text for use inside an SGF property value.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Write `record` as SGF text.
///
/// Colors follow ply parity. A `resign` ends the move list and sets the result
/// to a win for the other color.
pub fn serialize(record: &GameRecord) -> String {
    let info = &record.info;
    let size = info.board_size;

    let resigned = record
        .moves
        .iter()
        .position(|m| m.mv.eq_ignore_ascii_case("resign"));
    let result = match resigned {
        Some(i) => Some(format!("{}+R", Color::to_move(i, info.handicap).opponent())),
        None => info.result.clone(),
    };

    let mut out = String::new();
    let _ = write!(out, "(;FF[{SGF_FORMAT}]GM[1]CA[UTF-8]SZ[{size}]");
    let _ = write!(
        out,
        "SO[{}]",
        escape(info.source.as_deref().unwrap_or(PROGRAM_NAME))
    );
    if !info.black.is_empty() {
        let _ = write!(out, "PB[{}]", escape(&info.black));
    }
    if !info.white.is_empty() {
        let _ = write!(out, "PW[{}]", escape(&info.white));
    }
    let _ = write!(out, "KM[{}]", info.komi);
    if let Some(date) = &info.date {
        let _ = write!(out, "DT[{}]", escape(date));
    }
    if info.handicap >= 2 {
        let _ = write!(out, "HA[{}]", info.handicap);
    }
    let black_setup = if info.setup_black.is_empty() {
        handicap_points(size, info.handicap)
    } else {
        info.setup_black.clone()
    };
    for (tag, stones) in [("AB", &black_setup), ("AW", &info.setup_white)] {
        if !stones.is_empty() {
            out.push_str(tag);
            for &p in stones {
                let _ = write!(out, "[{}]", grid_to_sgf(p));
            }
        }
    }
    if let Some(result) = &result {
        let _ = write!(out, "RE[{}]", escape(result));
    }
    if let Some(notes) = record.annotations.as_ref().filter(|n| !n.is_empty()) {
        match serde_json::to_string(notes) {
            Ok(json) => {
                let _ = write!(out, "C[{}]", escape(&format!("{ANALYSIS_MARKER}{json}")));
            }
            Err(e) => warn!(error = %e, "could not encode analysis payload"),
        }
    }
    out.push('\n');

    for (i, m) in record.moves.iter().enumerate() {
        let color = Color::to_move(i, info.handicap);
        let Some(kind) = MoveKind::parse(&m.mv, size) else {
            warn!(ply = i + 1, mv = %m.mv, "unreadable move written as pass");
            let _ = writeln!(out, ";{}[]", color.sgf_tag());
            continue;
        };
        if kind == MoveKind::Resign {
            break;
        }
        let coord = kind.point().map(grid_to_sgf).unwrap_or_default();
        let _ = write!(out, ";{}[{coord}]", color.sgf_tag());

        match (&m.comment, m.win_prob, m.score) {
            (Some(c), _, _) if !c.is_empty() => {
                let _ = write!(out, "C[{}]", escape(c));
            }
            (_, Some(p), Some(s)) => {
                let _ = write!(out, "C[P:{:.1} S:{:.1}]", p * 100.0, s);
            }
            _ => {}
        }
        out.push('\n');
    }
    out.push_str(")\n");
    out
}

// =============================================================================
// Reading
// =============================================================================

#[derive(Debug, Default)]
struct Node {
    props: Vec<(String, Vec<String>)>,
}

impl Node {
    fn first(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }

    fn values(&self, name: &str) -> impl Iterator<Item = &str> {
        self.props
            .iter()
            .filter(move |(k, _)| k == name)
            .flat_map(|(_, v)| v.iter().map(String::as_str))
    }
}

/// Single-pass reader. Lenient: stray characters are skipped and an
/// unterminated value or tree simply ends at the end of input.
struct Reader<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    /// Read the main line of the game tree whose `(` has already been
    /// consumed.
    ///
    /// Variations always follow a sequence's nodes, so the first `(` met is
    /// the first variation and is simply entered. The first `)` closes the
    /// innermost variation on the main line, which ends it; later siblings are
    /// never read. Stack use does not grow with nesting.
    fn main_line(&mut self) -> Vec<Node> {
        let mut nodes = Vec::new();
        loop {
            self.skip_ws();
            match self.chars.next() {
                Some(';') => nodes.push(self.node()),
                Some(')') | None => return nodes,
                Some(_) => {}
            }
        }
    }

    fn node(&mut self) -> Node {
        let mut node = Node::default();
        loop {
            self.skip_ws();
            match self.chars.peek() {
                Some(c) if c.is_ascii_alphabetic() => {
                    let mut ident = String::new();
                    while let Some(&c) = self.chars.peek() {
                        if !c.is_ascii_alphabetic() {
                            break;
                        }
                        // Old FF[3] files spell identifiers like `AddBlack`.
                        if c.is_ascii_uppercase() {
                            ident.push(c);
                        }
                        self.chars.next();
                    }
                    let mut values = Vec::new();
                    loop {
                        self.skip_ws();
                        if self.chars.peek() != Some(&'[') {
                            break;
                        }
                        self.chars.next();
                        values.push(self.value());
                    }
                    node.props.push((ident, values));
                }
                _ => return node,
            }
        }
    }

    /// Read a value whose `[` has already been consumed, removing escapes.
    fn value(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.chars.next() {
            match c {
                ']' => break,
                '\\' => match self.chars.next() {
                    // Escaped line break is a soft break and disappears.
                    Some('\n') => {
                        if self.chars.peek() == Some(&'\r') {
                            self.chars.next();
                        }
                    }
                    Some('\r') => {
                        if self.chars.peek() == Some(&'\n') {
                            self.chars.next();
                        }
                    }
                    Some(e) => out.push(e),
                    None => break,
                },
                c => out.push(c),
            }
        }
        out
    }
}

/// Split a per-move comment into the `P:`/`S:` evaluation or free text.
fn parse_comment(text: &str) -> (Option<f64>, Option<f64>, Option<String>) {
    let mut prob = None;
    let mut score = None;
    for token in text.split_whitespace() {
        if let Some(v) = token.strip_prefix("P:") {
            prob = v.parse::<f64>().ok().map(|pct| pct / 100.0);
        } else if let Some(v) = token.strip_prefix("S:") {
            score = v.parse::<f64>().ok();
        }
    }
    if let (Some(p), Some(s)) = (prob, score) {
        return (Some(p), Some(s), None);
    }
    let text = text.trim();
    let comment = (!text.is_empty()).then(|| text.to_string());
    (None, None, comment)
}

fn parse_annotations(root: &Node) -> Option<Vec<QualityAnnotation>> {
    let payload = root
        .values("C")
        .find_map(|c| c.trim_start().strip_prefix(ANALYSIS_MARKER))?;
    match serde_json::from_str(payload) {
        Ok(notes) => Some(notes),
        Err(e) => {
            warn!(error = %e, "dropping unreadable analysis payload");
            None
        }
    }
}

/// Points listed under a setup property, expanding `aa:cc` rectangles.
/// Off-board and unreadable values are skipped.
fn setup_points(root: &Node, name: &str, board_size: usize) -> Vec<Point> {
    let mut points = Vec::new();
    for value in root.values(name) {
        let (from, to) = value.split_once(':').unwrap_or((value, value));
        let (Some(a), Some(b)) = (sgf_to_grid(from, board_size), sgf_to_grid(to, board_size))
        else {
            debug!(property = name, value, "skipping setup value");
            continue;
        };
        for row in a.row.min(b.row)..=a.row.max(b.row) {
            for col in a.col.min(b.col)..=a.col.max(b.col) {
                points.push(Point::new(row, col));
            }
        }
    }
    points.sort_unstable();
    points.dedup();
    points
}

fn parse_info(root: &Node) -> GameInfo {
    let defaults = GameInfo::default();
    let text = |name: &str| root.first(name).map(|s| s.trim().to_string());
    let board_size = root
        .first("SZ")
        .and_then(|s| s.split(':').next())
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&n| (1..=MAX_BOARD_SIZE).contains(&n))
        .unwrap_or(defaults.board_size);
    let komi = root
        .first("KM")
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|k| k.is_finite())
        .unwrap_or(DEFAULT_KOMI);
    let declared = root
        .first("HA")
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let setup_white = setup_points(root, "AW", board_size);
    let mut setup_black = setup_points(root, "AB", board_size);
    // Without explicit stones HA means the standard layout. The count is
    // what actually lands on the board, so that move colours match replay.
    let handicap = if setup_black.is_empty() {
        setup_black = handicap_points(board_size, declared);
        setup_black.len()
    } else if declared >= 2 {
        declared
    } else {
        0
    };

    GameInfo {
        board_size,
        komi,
        handicap,
        setup_black,
        setup_white,
        black: text("PB").unwrap_or_default(),
        white: text("PW").unwrap_or_default(),
        result: text("RE").filter(|s| !s.is_empty()),
        date: text("DT").filter(|s| !s.is_empty()),
        source: text("SO").filter(|s| !s.is_empty()),
    }
}

/// Read an SGF record.
///
/// Missing header values fall back to defaults. Whenever a move's color breaks
/// strict alternation, a pass (with a zero evaluation) is inserted before it.
pub fn deserialize(text: &str) -> Result<GameRecord, SgfError> {
    let start = text.find('(').ok_or(SgfError::NoGameTree)?;
    let nodes = Reader::new(&text[start + 1..]).main_line();
    let root = nodes.first().ok_or(SgfError::NoGameTree)?;

    let info = parse_info(root);
    let annotations = parse_annotations(root);
    let size = info.board_size;

    let mut moves: Vec<RecordedMove> = Vec::new();
    for node in &nodes {
        let played = [Color::Black, Color::White]
            .into_iter()
            .find_map(|c| node.first(c.sgf_tag()).map(|v| (c, v)));
        let Some((color, value)) = played else {
            continue;
        };

        if color != Color::to_move(moves.len(), info.handicap) {
            debug!(ply = moves.len() + 1, "color out of turn, inserting pass");
            moves.push(RecordedMove::inserted_pass());
        }

        let mv = sgf_to_grid(value, size)
            .map(|p| grid_to_human(p, size))
            .unwrap_or_else(|| "pass".into());
        let (win_prob, score, comment) = node
            .values("C")
            .next()
            .map(parse_comment)
            .unwrap_or_default();
        moves.push(RecordedMove {
            mv,
            win_prob,
            score,
            comment,
        });
    }

    Ok(GameRecord {
        info,
        moves,
        annotations,
    })
}
