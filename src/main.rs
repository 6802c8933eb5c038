mod error;
mod expander;
mod grammar;
mod pump;
mod queue;
mod scorer;
mod successor;
mod testgen;
mod tree;

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use grammar::Grammar;
use pump::GuessPump;
use queue::DEFAULT_MAX_SIZE;

#[derive(Parser)]
#[command(author, version, about = "Ranked password-guess enumeration over a probabilistic context-free grammar")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (error, warn, info, debug, trace). Overrides RUST_LOG.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Streams guesses from a grammar, highest probability first.
    Guess {
        /// Path to a grammar serialized as JSON (see `grammar::Grammar`).
        grammar: PathBuf,
        /// Stop after emitting this many guesses.
        #[arg(short, long)]
        limit: Option<usize>,
        /// Queue max_size before a trim is triggered (§4.5).
        #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
        max_size: usize,
    },
    /// Scores passwords read from STDIN (one per line) against a trained
    /// scorer, printing `password\tcategory\tprobability`.
    Score {
        /// Path to a serialized scorer (see `scorer::Scorer`).
        tables: PathBuf,
    },
    /// Generates a random test grammar and writes it as JSON.
    GenGrammar {
        /// Number of leaf non-terminals to generate.
        #[arg(long, default_value_t = 8)]
        leaves: usize,
        /// Maximum replacements per leaf non-terminal.
        #[arg(long, default_value_t = 4)]
        max_replacements: usize,
        /// RNG seed, for reproducible fixtures.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Output path; writes to STDOUT if omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    match cli.command {
        Command::Guess { grammar, limit, max_size } => run_guess(&grammar, limit, max_size),
        Command::Score { tables } => run_score(&tables),
        Command::GenGrammar { leaves, max_replacements, seed, output } => {
            run_gen_grammar(leaves, max_replacements, seed, output)
        }
    }
}

fn run_guess(path: &PathBuf, limit: Option<usize>, max_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let grammar = Grammar::from_reader(file)?;
    info!("loaded grammar with {} non-terminals", grammar.len());

    let pump = GuessPump::new(&grammar, max_size)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut emitted = 0usize;
    for guess in pump {
        let guess = guess?;
        writeln!(out, "{guess}")?;
        emitted += 1;
        if limit.is_some_and(|n| emitted >= n) {
            break;
        }
    }
    info!("emitted {emitted} guesses");
    Ok(())
}

fn run_score(tables_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(tables_path)?;
    let mut loaded_scorer: scorer::Scorer = serde_json::from_reader(file)?;
    loaded_scorer.train_multiword_detector();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let password = line?;
        let (category, probability) = loaded_scorer.score(&password);
        println!("{password}\t{}\t{probability}", category.as_char());
    }
    Ok(())
}

fn run_gen_grammar(
    leaves: usize,
    max_replacements: usize,
    seed: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let grammar = testgen::generate(leaves, max_replacements, seed);
    let json = serde_json::to_string_pretty(grammar.non_terminals())?;
    match output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
