use crate::ast::{Expr, Stmt};
use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::runner::{self, RunOptions};
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Interactive prompt. Bindings persist between lines and errors never end the
/// session.
pub fn start(options: &RunOptions) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(stdin.lock(), stdout.lock(), options)
}

/// Reads lines from `input` until EOF or `exit`/`quit`, evaluating each one.
pub fn run_session<R: BufRead, W: Write>(mut input: R, mut out: W, options: &RunOptions) -> io::Result<()> {
    writeln!(out, "Lox Interpreter v{}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "Type 'exit' or press Ctrl+D to quit")?;
    writeln!(out)?;

    let mut environment = Environment::new();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // EOF reached (Ctrl+D or piped input ended)
            writeln!(out)?;
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            writeln!(out, "Goodbye!")?;
            break;
        }

        run_line(line, &mut environment, &mut out, options);
    }

    debug!("repl session ended");
    Ok(())
}

fn run_line<W: Write>(source: &str, environment: &mut Environment, out: &mut W, options: &RunOptions) {
    let statements = match runner::front_end(source, None, options, out) {
        Some(statements) => statements,
        None => return,
    };

    // A lone expression (other than an assignment) echoes its value
    if let [Stmt::Expression { expr }] = statements.as_slice() {
        if !matches!(expr, Expr::Assign { .. }) {
            let result = Interpreter::new(environment, &mut *out).evaluate(expr);
            match result {
                Ok(value) => {
                    if let Err(e) = writeln!(out, "{}", value) {
                        debug!("failed to echo value: {}", e);
                    }
                }
                Err(error) => runner::report(&error, source, None, options.style),
            }
            return;
        }
    }

    if let Err(error) = Interpreter::new(environment, out).interpret(&statements) {
        runner::report(&error, source, None, options.style);
    }
}
