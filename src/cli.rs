use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use semdb::config::Backend;
use semdb::{Config, CorpusService, SearchOptions};

#[derive(Parser)]
#[command(name = "semdb")]
#[command(about = "Semantic vector store with cosine-similarity search")]
pub struct Cli {
    /// TOML config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use a file store at this path (overrides the config)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Without a command an interactive session is started
    #[command(subcommand)]
    pub command: Option<TopCommand>,
}

#[derive(Subcommand)]
pub enum TopCommand {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    #[command(flatten)]
    Op(Command),
}

/// Operations available both as one-shot subcommands and inside the REPL.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Insert or replace a vector
    Insert {
        id: String,
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f32>,
    },
    /// Search for the most similar vectors
    Search {
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f32>,
        /// Number of results (defaults to the configured k)
        #[arg(short = 'k', long = "top-k")]
        top_k: Option<usize>,
        /// Fail when nothing matches
        #[arg(long)]
        require_results: bool,
    },
    /// Print a stored vector
    Get { id: String },
    /// Print every stored vector
    List,
    /// Print the number of stored vectors
    Count,
    /// Delete a vector (succeeds if absent)
    Delete { id: String },
}

/// One line typed into the REPL.
#[derive(Parser, Debug)]
#[command(name = "semdb", no_binary_name = true)]
struct ReplLine {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Folds `--db` into the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.db {
            config.store.backend = Backend::File;
            config.store.path = path.clone();
        }
    }
}

/// REPL mode - interactive session over one service
pub fn run_repl(service: &CorpusService) -> anyhow::Result<()> {
    println!("semdb - Semantic Vector Store");
    println!("Type 'help' for commands, 'exit' or 'quit' to quit\n");

    let stdin = io::stdin();
    loop {
        print!("semdb> ");
        io::stdout().flush().context("flushing prompt")?;

        let mut input = String::new();
        if stdin.read_line(&mut input).context("reading input")? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input == "exit" || input == "quit" {
            println!("Goodbye!");
            break;
        }

        if input == "help" {
            print_help();
            continue;
        }

        let command = match parse_line(input) {
            Ok(cmd) => cmd,
            Err(error) => {
                eprintln!("{error}");
                continue;
            }
        };

        if let Err(error) = execute(service, command) {
            eprintln!("Error: {error:#}");
        }
    }

    Ok(())
}

fn parse_line(input: &str) -> Result<Command, clap::Error> {
    ReplLine::try_parse_from(input.split_whitespace()).map(|line| line.command)
}

pub fn execute(service: &CorpusService, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Get { id } => match service.get(&id)? {
            Some(vector) => println!("Vector '{}': {:?}", id, vector),
            None => println!("Vector '{}' not found", id),
        },

        Command::List => {
            let entries = service.list()?;
            if entries.is_empty() {
                println!("Database is empty");
            } else {
                println!("Stored vectors:");
                for entry in &entries {
                    println!("  {}: {:?}", entry.id, entry.vector);
                }
                println!("Total: {} vectors", entries.len());
            }
        }

        Command::Count => println!("{}", service.count()?),

        Command::Insert { id, values } => {
            service.add(id.clone(), values)?;
            println!("Upserted vector with id: {}", id);
        }

        Command::Search { values, top_k, require_results } => {
            let options = SearchOptions {
                k: top_k.unwrap_or(service.default_k()),
                require_results,
            };
            let results = service.search_with(&values, options)?;
            if results.is_empty() {
                println!("No results found");
            } else {
                println!("Top {} results:", results.len());
                for (rank, hit) in results.iter().enumerate() {
                    println!("{}. ID: {}, Score: {:.4}", rank + 1, hit.id, hit.score);
                }
            }
        }

        Command::Delete { id } => {
            service.remove(&id)?;
            println!("Deleted vector with id: {}", id);
        }
    }

    Ok(())
}

fn print_help() {
    let help = ReplLine::command().render_long_help();
    println!("{help}");
    println!("  help        Show this help");
    println!("  exit, quit  Leave the session");
}
