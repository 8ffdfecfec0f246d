//! Interactive loop and script runner for the interpreter.
//!
//! With no file arguments, runs a rustyline-backed REPL: each line is
//! read, expanded, analyzed, evaluated, and its value printed.
//! Definitions and macros persist between lines. With file arguments,
//! each file is loaded and evaluated in order; only `log` output and
//! errors are printed.

use std::fs;
use std::process;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use schemin::Error;
use schemin::ast::Value;
use schemin::evaluator::Interpreter;
use schemin::reader;

/// Library of derived forms loaded into every fresh interpreter.
const PRELUDE: &str = include_str!("../../prelude.scm");

fn main() {
    let mut load_prelude = true;
    let mut files: Vec<String> = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--no-prelude" => load_prelude = false,
            _ => files.push(arg),
        }
    }

    let interp = Interpreter::new();
    interp
        .global_env()
        .register_builtin_function("help", print_help);

    if load_prelude && let Err(e) = interp.eval_program(PRELUDE) {
        eprintln!("Error loading prelude: {e}");
        process::exit(1);
    }

    if files.is_empty() {
        run_repl(&interp);
    } else {
        for file in &files {
            if let Err(message) = run_file(&interp, file) {
                eprintln!("{file}: {message}");
                process::exit(1);
            }
        }
    }
}

/// Load and evaluate one script file. Values are discarded; `log`
/// output goes to stdout as a side effect.
fn run_file(interp: &Interpreter, path: &str) -> Result<(), String> {
    let source = fs::read_to_string(path).map_err(|e| e.to_string())?;
    interp.eval_program(&source).map_err(|e| e.to_string())?;
    Ok(())
}

fn run_repl(interp: &Interpreter) {
    println!("Schemin - a minimal Scheme interpreter");
    println!("Enter expressions like: (+ 1 2)");
    println!("Type (help) for an overview, :quit or Ctrl+D to exit.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Could not initialize line editor: {e}");
            return;
        }
    };

    loop {
        match rl.readline("schemin> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                // An error aborts the current line only; established
                // definitions and macros survive
                if let Err(e) = eval_line(interp, line) {
                    println!("Error: {e}");
                }
            }

            Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

/// Evaluate every form on the line, printing each value. The `()`
/// results of definition forms are not echoed.
fn eval_line(interp: &Interpreter, line: &str) -> Result<(), Error> {
    for form in reader::read_program(line)? {
        let value = interp.eval(&form)?;
        if !matches!(value, Value::Nil) {
            println!("{value}");
        }
    }
    Ok(())
}

fn print_help(_args: Vec<Value>) -> Result<Value, Error> {
    println!("Schemin - a minimal Scheme dialect:");
    println!("  Atoms:        42, 2.5, \"text\", #t/#f, symbols");
    println!("  Special forms: quote, if, and, or, define, set!, lambda,");
    println!("                begin, define-macro, quasiquote");
    println!("  Procedures:   + - * / abs sqrt remainder modulo floor");
    println!("                ceiling truncate round < > <= >= =");
    println!("                cons car cdr list length append");
    println!("                null? pair? list? symbol? procedure?");
    println!("                eq? eqv? not apply log error");
    println!();
    println!("Examples:");
    println!("  (define (fact n) (if (< n 2) 1 (* n (fact (- n 1)))))");
    println!("  (fact 5)");
    println!("  `(a ,@(list 1 2 3) b)");
    println!();
    println!("  :quit / :exit / Ctrl+D exits the interpreter.");

    Ok(Value::Nil)
}
