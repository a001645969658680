//! goban-record command line.
//!
//! ## Usage
//!
//! - `goban-record gtp` - Start a GTP server for GUI integration
//! - `goban-record replay game.sgf --ply 40` - Show the position after a move
//! - `goban-record review game.sgf` - List the costly moves of a game
//! - `goban-record demo` - Play a short game against the random oracle

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use goban_record::constants::{DEFAULT_KOMI, LISTING_THRES, MAX_BOARD_SIZE};
use goban_record::gtp::GtpEngine;
use goban_record::oracle::{Oracle, RandomOracle};
use goban_record::quality::QualityConfig;
use goban_record::session::Session;

/// Go rules engine and game-record reviewer
#[derive(Parser)]
#[command(name = "goban-record")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) server for use with GUI applications
    Gtp {
        /// Seed for the random oracle answering genmove
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the board of an SGF game
    Replay {
        file: PathBuf,
        /// Number of moves to replay; the whole game when omitted
        #[arg(long)]
        ply: Option<usize>,
    },
    /// List moves that lost at least `threshold` points
    Review {
        file: PathBuf,
        #[arg(long, default_value_t = LISTING_THRES)]
        threshold: f64,
    },
    /// Let the random oracle play itself and print the record
    Demo {
        #[arg(long, default_value_t = 30)]
        moves: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 9)]
        size: usize,
        #[arg(long, default_value_t = DEFAULT_KOMI)]
        komi: f64,
        #[arg(long, default_value_t = 0)]
        handicap: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Gtp { seed }) => {
            let oracle = match seed {
                Some(s) => RandomOracle::with_seed(s),
                None => RandomOracle::new(),
            };
            GtpEngine::with_oracle(Box::new(oracle)).run()
        }
        Some(Commands::Replay { file, ply }) => run_replay(&file, ply),
        Some(Commands::Review { file, threshold }) => run_review(&file, threshold),
        Some(Commands::Demo {
            moves,
            seed,
            size,
            komi,
            handicap,
        }) => run_demo(moves, seed, Session::new(size, handicap, komi)),
        None => run_demo(30, None, Session::new(9, 0, DEFAULT_KOMI)),
    }
}

fn load(file: &Path) -> Result<Session> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let session = Session::load_sgf(&text)
        .with_context(|| format!("cannot parse {}", file.display()))?;
    info!(file = %file.display(), moves = session.ply(), "loaded game");
    Ok(session)
}

fn run_replay(file: &Path, ply: Option<usize>) -> Result<()> {
    let mut session = load(file)?;
    if let Some(n) = ply {
        session.go_to_ply(n);
    }
    let info = session.info();
    println!("{} (B) vs {} (W), komi {}", info.black, info.white, info.komi);
    println!("Move {}, {} to play\n", session.ply(), session.next_color());
    println!("{}", session.board());
    Ok(())
}

fn run_review(file: &Path, threshold: f64) -> Result<()> {
    let session = load(file)?;
    let config = QualityConfig::default().with_threshold(threshold);
    let bad = session.bad_moves(&config);
    if bad.is_empty() {
        println!("No moves lost {threshold} points or more.");
        return Ok(());
    }
    for a in bad {
        println!(
            "{:>4}. {} {:<5} lost {:>5.1}  {:?}",
            a.ply, a.color, a.mv, a.badness, a.severity
        );
    }
    Ok(())
}

fn run_demo(moves: usize, seed: Option<u64>, mut session: Session) -> Result<()> {
    let size = session.board_size();
    anyhow::ensure!(
        (2..=MAX_BOARD_SIZE).contains(&size),
        "board size must be between 2 and {MAX_BOARD_SIZE}"
    );
    let mut oracle = match seed {
        Some(s) => RandomOracle::with_seed(s),
        None => RandomOracle::new(),
    };
    session.set_players("random", "random");

    for _ in 0..moves {
        if session.is_game_over() {
            break;
        }
        let ticket = session.analysis_ticket();
        let response = oracle.request_move(&session.oracle_request())?;
        session.apply_analysis(ticket, &response);
        session.play_suggestion(ticket, &response)?;
    }

    println!("{}", session.board());
    print!("{}", session.to_sgf(&QualityConfig::default()));
    Ok(())
}
