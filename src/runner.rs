use crate::ast::Stmt;
use crate::ast_printer;
use crate::environment::Environment;
use crate::error::{DiagnosticStyle, LoxError};
use crate::interpreter::Interpreter;
use crate::parser::parse;
use crate::scanner::scan;
use std::io::Write;
use tracing::{info, warn};

/// Driver settings collected from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub style: DiagnosticStyle,
    pub dump_tokens: bool,
    pub dump_ast: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    StaticError,
    RuntimeError,
}

impl RunStatus {
    /// Conventional sysexits codes: 65 for bad input data, 70 for internal failure.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::StaticError => 65,
            RunStatus::RuntimeError => 70,
        }
    }
}

/// Runs a whole program in a fresh environment.
pub fn run<W: Write>(source: &str, filename: Option<&str>, options: &RunOptions, out: &mut W) -> RunStatus {
    let mut environment = Environment::new();
    run_in(source, filename, options, &mut environment, out)
}

/// Runs `source` against an existing environment, so bindings carry over between calls.
pub fn run_in<W: Write>(
    source: &str,
    filename: Option<&str>,
    options: &RunOptions,
    environment: &mut Environment,
    out: &mut W,
) -> RunStatus {
    let statements = match front_end(source, filename, options, out) {
        Some(statements) => statements,
        None => return RunStatus::StaticError,
    };

    let mut interpreter = Interpreter::new(environment, out);
    match interpreter.interpret(&statements) {
        Ok(()) => RunStatus::Success,
        Err(error) => {
            report(&error, source, filename, options.style);
            RunStatus::RuntimeError
        }
    }
}

/// Scans and parses `source`, reporting every static diagnostic. Returns `None`
/// when any were found; such a program must not be evaluated.
pub(crate) fn front_end<W: Write>(
    source: &str,
    filename: Option<&str>,
    options: &RunOptions,
    out: &mut W,
) -> Option<Vec<Stmt>> {
    let (tokens, scan_errors) = scan(source);

    if options.dump_tokens {
        for token in &tokens {
            if let Err(e) = writeln!(out, "{}", token) {
                warn!("failed to write token dump: {}", e);
                break;
            }
        }
    }

    let (statements, parse_errors) = parse(tokens);

    let diagnostics: Vec<&LoxError> = scan_errors.iter().chain(parse_errors.iter()).collect();
    if !diagnostics.is_empty() {
        info!(count = diagnostics.len(), "static errors, skipping evaluation");
        for error in diagnostics {
            report(error, source, filename, options.style);
        }
        return None;
    }

    if options.dump_ast {
        for statement in &statements {
            if let Err(e) = writeln!(out, "{}", ast_printer::print_stmt(statement)) {
                warn!("failed to write AST dump: {}", e);
                break;
            }
        }
    }

    Some(statements)
}

pub(crate) fn report(error: &LoxError, source: &str, filename: Option<&str>, style: DiagnosticStyle) {
    if let Err(e) = error.report(source, filename, style) {
        warn!("failed to render diagnostic: {}", e);
        eprintln!("{}", error);
    }
}
