use conslisp::ast::Value;
use conslisp::evaluator::{self, Environment};
use conslisp::rep;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::any::Any;
use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process;
use std::thread;

/// Worker stack size in MiB when `CONSLISP_STACK_MB` is not set
const DEFAULT_STACK_MB: usize = 256;

fn worker_stack_size_bytes() -> Result<usize, String> {
    let mb = match env::var("CONSLISP_STACK_MB") {
        Ok(v) => v
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("invalid CONSLISP_STACK_MB: {v}"))?,
        Err(env::VarError::NotPresent) => DEFAULT_STACK_MB,
        Err(e) => return Err(format!("invalid CONSLISP_STACK_MB: {e}")),
    };
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| format!("invalid CONSLISP_STACK_MB: {mb}"))
}

fn main() {
    let stack_size = match worker_stack_size_bytes() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // Deep recursion in user code runs on this thread's stack, not main's.
    let handle = thread::Builder::new()
        .name("conslisp-repl".to_string())
        .stack_size(stack_size)
        .spawn(|| {
            if io::stdin().is_terminal() {
                run_repl()
            } else {
                run_piped()
            }
        });

    let result = match handle {
        Ok(handle) => handle.join().unwrap_or_else(|panic_info| {
            eprintln!("The REPL encountered an unexpected error and must exit.");
            Err(panic_message(panic_info.as_ref()))
        }),
        Err(e) => Err(format!("failed to start worker thread: {e}")),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic_info.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = panic_info.downcast_ref::<String>() {
        msg.clone()
    } else {
        "Unknown panic occurred".to_owned()
    }
}

/// What the session loop should do after one input line
enum LineOutcome {
    Continue,
    Quit,
}

/// Handle a meta-command or evaluate `line` and print its value.
fn handle_line(line: &str, env: &Environment) -> LineOutcome {
    match line.trim() {
        ":help" => print_help(),
        ":env" => print_environment(env),
        ":quit" | ":exit" => return LineOutcome::Quit,
        // A blank line is still evaluated and prints its read error.
        _ => println!("{}", rep(line, env)),
    }
    LineOutcome::Continue
}

/// Interactive session on a terminal, with line editing and history
fn run_repl() -> Result<(), String> {
    let mut rl =
        DefaultEditor::new().map_err(|e| format!("could not initialize line editor: {e}"))?;
    let env = evaluator::create_global_env();

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                if let LineOutcome::Quit = handle_line(&line, &env) {
                    break;
                }
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(err) => return Err(format!("line editor failed: {err}")),
        }
    }
    Ok(())
}

/// Session over redirected stdin; the prompt is still written before every line.
fn run_piped() -> Result<(), String> {
    let env = evaluator::create_global_env();
    let mut lines = io::stdin().lock().lines();

    loop {
        print!("> ");
        io::stdout()
            .flush()
            .map_err(|e| format!("could not write prompt: {e}"))?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(|e| format!("read error: {e}"))?;
        if let LineOutcome::Quit = handle_line(&line, &env) {
            break;
        }
    }
    Ok(())
}

fn print_help() {
    println!("conslisp, a minimal Lisp interpreter:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+D     - Exit the interpreter");
    println!();
    println!("Special forms: quote ('x), if, lambda, defun, setq");
    println!("Functions: car cdr cons eq atom numberp symbolp + - * / mod");
    println!();
    println!("Examples:");
    println!("  (+ 1 2 3)");
    println!("  (defun sq (x) (* x x))");
    println!("  (sq 4)");
    println!("  (car '(a b c))");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.bindings();

    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();
    for (name, value) in bindings {
        match value {
            Value::NativeFunction { .. } => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in functions ({}):", builtins.len());
        let mut col = 0;
        for name in builtins {
            print!("  {name:<10}");
            col += 1;
            if col % 6 == 0 {
                println!();
            }
        }
        if col % 6 != 0 {
            println!();
        }
    }

    if !user_defined.is_empty() {
        println!("Bound values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}
