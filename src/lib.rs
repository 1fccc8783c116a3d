// Lox Interpreter Library
//
// Scanner, recursive-descent parser and tree-walking interpreter for the Lox
// language: literals, arithmetic, comparison and equality, variables, blocks,
// and print/expression statements.

// Public modules
pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod scanner;
pub mod token;
pub mod value;

// Re-export commonly used items
pub use ast::{BinaryOp, Expr, Stmt, UnaryOp};
pub use environment::{Environment, EnvironmentError};
pub use error::{DiagnosticStyle, ErrorKind, Location, LoxError, Span};
pub use interpreter::{interpret, Interpreter};
pub use parser::{parse, Parser, MAX_NESTING};
pub use scanner::{scan, Scanner};
pub use token::{Token, TokenType};
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{run, run_in, RunOptions, RunStatus};
