use clap::{value_parser, Arg, ArgAction, Command};
use lox::{DiagnosticStyle, RunOptions, RunStatus};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use tracing::{debug, error, Level};

/// sysexits' EX_USAGE: bad arguments or unreadable input.
const EXIT_USAGE: i32 = 64;

fn main() {
    let matches = Command::new("lox")
        .about("A tree-walking interpreter for the Lox language")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the scanned tokens before running")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ast")
                .long("ast")
                .help("Print the parsed statements before running")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("errors")
                .long("errors")
                .help("How diagnostics are rendered")
                .value_name("STYLE")
                .value_parser(value_parser!(DiagnosticStyle))
                .default_value("pretty"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log output (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count),
        )
        .try_get_matches()
        .unwrap_or_else(|e| {
            // --help and --version land here too, on stdout
            let _ = e.print();
            process::exit(if e.use_stderr() { EXIT_USAGE } else { 0 });
        });

    init_logging(matches.get_count("verbose"));

    let options = RunOptions {
        style: matches
            .get_one::<DiagnosticStyle>("errors")
            .copied()
            .unwrap_or_default(),
        dump_tokens: matches.get_flag("tokens"),
        dump_ast: matches.get_flag("ast"),
    };
    debug!(?options, "options parsed");

    match matches.get_one::<String>("file") {
        Some(file_path) if !matches.get_flag("interactive") => {
            let status = run_file(file_path, &options);
            process::exit(status);
        }
        _ => {
            if let Err(e) = lox::start_repl(&options) {
                error!("repl terminated: {}", e);
                process::exit(EXIT_USAGE);
            }
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_file(path: &str, options: &RunOptions) -> i32 {
    let path = Path::new(path);

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return EXIT_USAGE;
        }
    };

    let filename = path.display().to_string();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let status = lox::run(&source, Some(&filename), options, &mut out);
    if let Err(e) = out.flush() {
        error!("failed to flush output: {}", e);
    }
    if status != RunStatus::Success {
        debug!(code = status.exit_code(), "run failed");
    }
    status.exit_code()
}
