//! Interactive read-check loop.
//!
//! Input accumulates across lines while the parser reports that the
//! construct is still open, so multi-line functions and blocks can be
//! typed naturally. Bindings, checked modules, and struct definitions
//! persist across rounds in one long-lived scope.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use colored::Colorize;
use log::debug;

use crate::error::Result;
use crate::parser;
use crate::symbol_table::ScopeTree;
use crate::typechecker::Typechecker;
use crate::types::TypeList;

const PROMPT: &str = ">> ";
const CONTINUATION: &str = ".. ";

pub struct Repl {
    checker: Typechecker,
    scope: ScopeTree,
    buffer: String,
}

impl Repl {
    pub fn new(search_dir: impl Into<PathBuf>) -> Self {
        Self {
            checker: Typechecker::new(search_dir),
            scope: ScopeTree::new(),
            buffer: String::new(),
        }
    }

    /// Feeds one line into the session. Returns `None` while the buffered
    /// input is still an open construct, otherwise the check result for
    /// the completed chunk.
    pub fn feed(&mut self, line: &str) -> Option<Result<TypeList>> {
        self.buffer.push_str(line);
        self.buffer.push('\n');

        let program = match parser::parse(&self.buffer) {
            Ok(program) => program,
            Err(e) if e.is_incomplete() => {
                debug!("awaiting more input ({} bytes buffered)", self.buffer.len());
                return None;
            }
            Err(e) => {
                self.buffer.clear();
                return Some(Err(e));
            }
        };
        self.buffer.clear();

        let result = self
            .checker
            .check_program(&program, &mut self.scope)
            .map(|(types, _)| types);
        Some(result)
    }

    /// True while the session is waiting for the rest of a construct.
    pub fn pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Drives the session over arbitrary reader/writer pairs.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<()> {
        let mut line = String::new();
        loop {
            let prompt = if self.pending() { CONTINUATION } else { PROMPT };
            write!(output, "{}", prompt)?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(());
            }

            match self.feed(line.trim_end_matches('\n')) {
                None => {}
                Some(Ok(types)) => {
                    if !types.is_empty() {
                        writeln!(output, "{}", types.to_string().green())?;
                    }
                }
                Some(Err(e)) => {
                    writeln!(output, "{}", e.report("<repl>").red())?;
                }
            }
        }
    }
}
