//! nanoscheme command-line.
//!
//! When called without arguments it drops into an interactive
//! read-evaluate-print loop.
//!
//! When called with file arguments, every `.scm` file is evaluated in order
//! against a single shared global environment, so definitions in one file are
//! visible to the next.

use std::fs;

use anyhow::{Context, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use nscm::ast::Value;
use nscm::evaluator::{self, Environment};
use nscm::parser;

const HELP: &str = "\
nscm - nanoscheme, a small Scheme-like expression language

Usage:
  nscm              start the interactive REPL
  nscm FILE.scm...  evaluate each file in order (shared global environment)
  nscm --help       show this message

The REPL reads one expression per line; an empty line or 'exit' leaves.
";

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        run_repl()
    } else if args[0] == "--help" {
        print!("{HELP}");
        Ok(())
    } else {
        run_files(&args)
    }
}

/// Evaluate each file's top-level forms in order against one shared global
/// frame. Unreadable or wrongly-named files abort with exit code 1; parse and
/// evaluation failures are diagnosed and skipped.
fn run_files(paths: &[String]) -> anyhow::Result<()> {
    let env = evaluator::create_global_env();

    for path in paths {
        if !path.ends_with(".scm") {
            bail!("{path}: expected a .scm file");
        }
        let source =
            fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;

        let forms = match parser::parse_program(&source) {
            Ok(forms) => forms,
            Err(e) => {
                eprintln!("{path}: {e}");
                continue;
            }
        };

        for form in &forms {
            print_result(evaluator::eval(form, &env), path);
        }
    }

    Ok(())
}

fn print_result(result: Result<Value, nscm::Error>, source_name: &str) {
    match result {
        Ok(Value::Unspecified) => {} // define and set! print nothing
        Ok(value) => println!("{value}"),
        Err(e) => eprintln!("{source_name}: {e}"),
    }
}

/// The interactive loop. One expression per line; the global environment
/// persists across iterations, so a define in one input is visible in the
/// next. Evaluation failures print a diagnostic and the loop resumes.
fn run_repl() -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new().context("could not initialize the line editor")?;
    let env: Environment = evaluator::create_global_env();

    loop {
        match rl.readline("nscm> ") {
            Ok(line) => {
                if line.is_empty() || line.trim() == "exit" {
                    break;
                }
                let _ = rl.add_history_entry(line.as_str());

                match parser::parse_form(&line).and_then(|expr| evaluator::eval(&expr, &env)) {
                    Ok(Value::Unspecified) => {}
                    Ok(value) => println!("{value}"),
                    Err(e) => println!("{e}"),
                }
            }

            // Ctrl-C / Ctrl-D end the session like an explicit exit
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => return Err(err).context("failed to read input"),
        }
    }

    Ok(())
}
