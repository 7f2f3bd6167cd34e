pub mod ast;
pub mod builtins;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod symbol_table;
pub mod token;
pub mod typechecker;
pub mod types;

// Export common types to avoid import conflicts
pub use error::{ErrorKind, Result, ShoalError};
pub use symbol_table::ScopeTree;
pub use typechecker::{Completeness, Typechecker};
pub use types::{Type, TypeList};

/// Initializes env_logger once; respects RUST_LOG.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .try_init();
}
