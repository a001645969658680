//! Go Text Protocol (GTP) front-end.
//!
//! Lets GTP-speaking tools (GoGui, Sabaki, regression scripts) drive a
//! [`Session`]. Moves asked of the engine with `genmove` are answered by an
//! [`Oracle`]; the answer's evaluation is recorded on the position it was
//! asked about.
//!
//! ## Supported Commands
//!
//! Standard: `protocol_version`, `name`, `version`, `known_command`,
//! `list_commands`, `quit`, `boardsize`, `clear_board`, `komi`,
//! `fixed_handicap`, `play`, `genmove`, `undo`, `showboard`, `loadsgf`,
//! `printsgf`.
//!
//! Review extensions: `back`, `forward`, `goto <ply>`, `mainline`,
//! `variations`, `badmoves [threshold]`.
//!
//! ## Example
//!
//! ```ignore
//! use goban_record::gtp::GtpEngine;
//! let mut engine = GtpEngine::new();
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::{debug, warn};

use crate::board::Color;
use crate::constants::{MAX_BOARD_SIZE, PROGRAM_NAME};
use crate::coord::{grid_to_human, handicap_points};
use crate::oracle::{Oracle, RandomOracle};
use crate::quality::QualityConfig;
use crate::session::Session;

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "back",
    "badmoves",
    "boardsize",
    "clear_board",
    "fixed_handicap",
    "forward",
    "genmove",
    "goto",
    "known_command",
    "komi",
    "list_commands",
    "loadsgf",
    "mainline",
    "name",
    "play",
    "printsgf",
    "protocol_version",
    "quit",
    "showboard",
    "undo",
    "variations",
    "version",
];

pub struct GtpEngine {
    session: Session,
    oracle: Box<dyn Oracle>,
    quality: QualityConfig,
}

impl Default for GtpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GtpEngine {
    /// Engine on an empty 19x19 board answering `genmove` with random moves.
    pub fn new() -> Self {
        Self::with_oracle(Box::new(RandomOracle::new()))
    }

    pub fn with_oracle(oracle: Box<dyn Oracle>) -> Self {
        Self {
            session: Session::default(),
            oracle,
            quality: QualityConfig::default(),
        }
    }

    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the GTP command loop on stdin and stdout.
    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run_with<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];
            debug!(%command, ?args, "gtp command");

            let (success, message) = self.execute(&command, args);
            if !success {
                warn!(%command, %message, "gtp command failed");
            }
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            write!(output, "{prefix}{id_str} {message}\n\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute a GTP command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, PROGRAM_NAME.to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "boardsize" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<usize>() {
                    Ok(size) if (2..=MAX_BOARD_SIZE).contains(&size) => {
                        let komi = self.session.komi();
                        self.session.new_game(size, 0, komi);
                        (true, String::new())
                    }
                    _ => (false, "unacceptable size".to_string()),
                }
            }

            "clear_board" => {
                let (size, komi) = (self.session.board_size(), self.session.komi());
                self.session.new_game(size, 0, komi);
                (true, String::new())
            }

            "komi" => match args.first().map(|a| a.parse::<f64>()) {
                Some(Ok(komi)) if komi.is_finite() => {
                    self.session.set_komi(komi);
                    (true, String::new())
                }
                Some(_) => (false, "syntax error".to_string()),
                None => (false, "missing argument".to_string()),
            },

            "fixed_handicap" => {
                let Some(Ok(count)) = args.first().map(|a| a.parse::<usize>()) else {
                    return (false, "syntax error".to_string());
                };
                if !self.session.tree().is_empty() {
                    return (false, "board not empty".to_string());
                }
                let size = self.session.board_size();
                let points = handicap_points(size, count);
                if points.len() != count {
                    return (false, "invalid handicap".to_string());
                }
                let komi = self.session.komi();
                self.session.new_game(size, count, komi);
                let vertices: Vec<String> =
                    points.into_iter().map(|p| grid_to_human(p, size)).collect();
                (true, vertices.join(" "))
            }

            "play" => {
                let [color, vertex, ..] = args else {
                    return (false, "missing arguments".to_string());
                };
                let Some(color) = Color::parse(color) else {
                    return (false, "syntax error".to_string());
                };
                match self.session.play_as(color, vertex) {
                    Ok(_) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "genmove" => {
                let Some(color) = args.first().and_then(|c| Color::parse(c)) else {
                    return (false, "syntax error".to_string());
                };
                self.genmove(color)
            }

            "undo" => {
                if self.session.remove_last_move() {
                    (true, String::new())
                } else {
                    (false, "cannot undo".to_string())
                }
            }

            "showboard" => (true, format!("\n{}", self.session.board())),

            "loadsgf" => {
                let Some(path) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let text = match std::fs::read_to_string(path) {
                    Ok(t) => t,
                    Err(e) => return (false, format!("cannot load file: {e}")),
                };
                match self.session.load_game(&text) {
                    Ok(()) => {
                        // `loadsgf file n` stops before move n.
                        if let Some(Ok(n)) = args.get(1).map(|a| a.parse::<usize>()) {
                            self.session.go_to_ply(n.saturating_sub(1));
                        }
                        (true, String::new())
                    }
                    Err(e) => (false, format!("cannot load file: {e}")),
                }
            }

            "printsgf" => {
                let text = self.session.to_sgf(&self.quality);
                match args.first() {
                    Some(path) => match std::fs::write(path, text) {
                        Ok(()) => (true, String::new()),
                        Err(e) => (false, format!("cannot save file: {e}")),
                    },
                    None => (true, text.trim_end().to_string()),
                }
            }

            "back" => (self.session.back(), String::new()),

            "forward" => (self.session.forward(), String::new()),

            "goto" => match args.first().map(|a| a.parse::<usize>()) {
                Some(Ok(n)) => {
                    self.session.go_to_ply(n);
                    (true, self.session.ply().to_string())
                }
                _ => (false, "syntax error".to_string()),
            },

            "mainline" => {
                self.session.return_to_main_line();
                (true, self.session.ply().to_string())
            }

            "variations" => (true, self.session.variations().join(" ")),

            "badmoves" => {
                let config = match args.first().map(|a| a.parse::<f64>()) {
                    Some(Ok(t)) => self.quality.with_threshold(t),
                    Some(Err(_)) => return (false, "syntax error".to_string()),
                    None => self.quality,
                };
                let lines: Vec<String> = self
                    .session
                    .bad_moves(&config)
                    .iter()
                    .map(|a| {
                        format!(
                            "{} {} {} {:.1} {:?}",
                            a.ply, a.color, a.mv, a.badness, a.severity
                        )
                    })
                    .collect();
                (true, lines.join("\n"))
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }

    /// Ask the oracle for a move for `color` and play it.
    fn genmove(&mut self, color: Color) -> (bool, String) {
        if color != self.session.next_color() {
            if let Err(e) = self.session.play_as(color.opponent(), "pass") {
                return (false, e.to_string());
            }
        }

        let ticket = self.session.analysis_ticket();
        let request = self.session.oracle_request();
        let response = match self.oracle.request_move(&request) {
            Ok(r) => r,
            Err(e) => return (false, format!("oracle failed: {e:#}")),
        };
        self.session.apply_analysis(ticket, &response);
        match self.session.play_suggestion(ticket, &response) {
            Ok(_) => (true, response.suggested_move.to_lowercase()),
            Err(e) => (false, e.to_string()),
        }
    }
}
