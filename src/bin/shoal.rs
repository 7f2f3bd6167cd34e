use std::fs;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use shoal_lang::repl::Repl;
use shoal_lang::{parser, ScopeTree, Typechecker};

#[derive(Parser)]
#[command(name = "shoal")]
#[command(about = "Shoal language type checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and type-check a script.
    Check {
        input: PathBuf,
    },
    /// Start an interactive session.
    Repl,
}

fn main() -> ExitCode {
    shoal_lang::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check { input } => check_file(&input),
        Commands::Repl => run_repl(),
    }
}

fn check_file(input: &PathBuf) -> ExitCode {
    let file = input.display().to_string();
    let result = (|| {
        let source = fs::read_to_string(input)?;
        let program = parser::parse(&source)?;
        let search_dir = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut checker = Typechecker::new(search_dir);
        let mut scope = ScopeTree::new();
        checker.check_program(&program, &mut scope)
    })();

    match result {
        Ok((types, _)) => {
            if !types.is_empty() {
                println!("{}", types.to_string().green());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.report(&file).red());
            ExitCode::FAILURE
        }
    }
}

fn run_repl() -> ExitCode {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut repl = Repl::new(".");
    match repl.run(BufReader::new(stdin.lock()), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.report("<repl>").red());
            ExitCode::FAILURE
        }
    }
}
