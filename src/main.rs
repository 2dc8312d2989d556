use std::io;
use std::path::PathBuf;
use std::process;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use glint_lang::Glint;

const HISTORY_FILE: &str = ".glint_history";

fn history_path() -> Option<PathBuf> {
    home::home_dir().map(|dir| dir.join(HISTORY_FILE))
}

fn run_prompt() {
    let mut glint = Glint::new(io::stdout());
    let mut editor = DefaultEditor::new().expect("line editor to initialize");

    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                glint.run_line(&line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error reading input: {err}");
                break;
            }
        }
    }

    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match args.len() {
        1 => run_prompt(),
        2 => Glint::new(io::stdout()).run_file(&args[1]),
        _ => {
            println!("Usage: glint [script]");
            process::exit(64);
        }
    }
}
