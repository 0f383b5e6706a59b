//! Byte-range extraction CLI.
//!
//! Runs a find/skip/take program against a file (or stdin) and writes the
//! committed byte ranges to stdout. Clauses are separated by `::` and commit
//! atomically; the run succeeds when at least one clause commits.
//!
//! # Output Format
//!
//! Raw extracted bytes on stdout, in staging order. Diagnostics on stderr.
//!
//! # Exit Codes
//!
//! - `0`: Success (at least one clause committed)
//! - `1`: Program failed (every clause failed)
//! - `2`: Invalid arguments or parse error
//! - `10`: I/O error opening the input

use std::io::{self, BufWriter};
use std::process::ExitCode;

use carve_rs::{parse_program, run_program, EngineError, FileView};

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS] <operations...>

OPTIONS:
    -i, --input <path>      Read input from path (default: stdin)
    --                      Treat subsequent arguments as operations
    --help, -h              Show this help message

OPERATIONS:
    find [to <loc>] <pattern>       search between cursor and loc (default EOF);
                                    forward if loc >= cursor, else backward
    skip <n>[b|l|c]                 move the cursor forward n units
    take <[+|-]n>[b|l|c]            extract n units anchored at the cursor
    take to <loc>                   extract between cursor and loc
    take until <pattern> [at <loc>] extract forward up to a match
    label <NAME>                    remember the cursor position
    goto <loc>                      move the cursor to loc
    ::                              clause separator (clauses commit atomically)

LOCATIONS:
    cursor, BOF, EOF, match-start, match-end, line-start, line-end, <NAME>
    each with an optional signed offset, e.g. EOF-20b, match-end +2l",
        exe.to_string_lossy()
    );
}

fn main() -> ExitCode {
    let mut args = std::env::args_os();
    let exe = args.next().unwrap_or_else(|| "carve-rs".into());
    let mut input: Option<std::path::PathBuf> = None;
    let mut tokens: Vec<String> = Vec::new();
    let mut ops_only = false;

    while let Some(arg) = args.next() {
        if !ops_only {
            if let Some(flag) = arg.to_str() {
                match flag {
                    "--" => {
                        ops_only = true;
                        continue;
                    }
                    "-i" | "--input" => {
                        let Some(path) = args.next() else {
                            eprintln!("{flag} needs a path");
                            return ExitCode::from(2);
                        };
                        input = Some(path.into());
                        continue;
                    }
                    "--help" | "-h" => {
                        print_usage(&exe);
                        return ExitCode::SUCCESS;
                    }
                    _ => {}
                }
                if let Some(path) = flag.strip_prefix("--input=") {
                    input = Some(path.into());
                    continue;
                }
                if flag.starts_with("--") {
                    eprintln!("unknown flag: {flag}");
                    print_usage(&exe);
                    return ExitCode::from(2);
                }
            }
        }
        match arg.into_string() {
            Ok(tok) => tokens.push(tok),
            Err(bad) => {
                eprintln!("operation is not valid UTF-8: {:?}", bad.to_string_lossy());
                return ExitCode::from(2);
            }
        }
    }

    if tokens.is_empty() {
        print_usage(&exe);
        return ExitCode::from(2);
    }

    let program = match parse_program(&tokens) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("carve-rs: {err}");
            return ExitCode::from(2);
        }
    };

    let view = match &input {
        Some(path) => FileView::open(path),
        None => FileView::from_stdin(),
    };
    let mut view = match view {
        Ok(view) => view,
        Err(err) => {
            eprintln!("carve-rs: cannot open input: {err}");
            return ExitCode::from(10);
        }
    };

    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);
    match run_program(&program, &mut view, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(EngineError::Io(err)) => {
            eprintln!("carve-rs: {err}");
            ExitCode::from(10)
        }
        Err(err) => {
            eprintln!("carve-rs: {err}");
            ExitCode::FAILURE
        }
    }
}
