use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sable::{Interpreter, SableError, Value};

/// Evaluation runs on its own thread so deep recursion has room.
const EVAL_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "sable", about = "Sable: a small Lisp with overload dispatch")]
struct Cli {
    /// File to execute
    file: Option<PathBuf>,

    /// Evaluate an expression
    #[arg(short, long)]
    eval: Option<String>,

    /// Maximum nesting of call evaluation
    #[arg(long, env = "SABLE_MAX_DEPTH")]
    max_depth: Option<usize>,

    /// Start without the standard library
    #[arg(long)]
    no_stdlib: bool,

    /// Log definitions and dispatch decisions (overrides SABLE_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let worker = std::thread::Builder::new()
        .name("sable-eval".into())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || run(&cli));
    let outcome = match worker {
        Ok(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(SableError::eval("evaluator thread panicked"))),
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(hint) = e.hint() {
                eprintln!("  hint: {hint}");
            }
            if let Some(trace) = e.stack_trace() {
                eprint!("{trace}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SABLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> sable::Result<()> {
    if cli.file.is_none() && cli.eval.is_none() {
        return Err(SableError::eval(
            "nothing to run: pass a file or --eval <expr>",
        ));
    }

    let mut builder = Interpreter::builder().with_stdlib(!cli.no_stdlib);
    if let Some(depth) = cli.max_depth {
        builder = builder.max_depth(depth);
    }
    let interpreter = builder.build();

    if let Some(file) = &cli.file {
        interpreter.load_file(file)?;
    }

    if let Some(expr) = &cli.eval {
        let val = interpreter.eval_str(expr)?;
        if !matches!(val, Value::Nil) {
            println!("{val}");
        }
    }

    Ok(())
}
