//! Terminal helpers for the client.

use std::io::Write;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

pub const USERNAME_PROMPT: &str = "Enter your username: ";
pub const INPUT_PROMPT: &str = "> ";

/// Redisplay the prompt after printing a message
pub fn redisplay_prompt() {
    print!("{}", INPUT_PROMPT);
    std::io::stdout().flush().ok();
}

/// Read terminal input on a blocking thread.
///
/// The first line is read with the username prompt, the rest with the
/// input prompt. The channel closes on Ctrl+C, Ctrl+D or a readline error.
pub fn spawn_readline() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let mut prompt = USERNAME_PROMPT;
        loop {
            match rl.readline(prompt) {
                Ok(line) => {
                    if prompt == INPUT_PROMPT && !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                    }
                    if input_tx.send(line).is_err() {
                        break;
                    }
                    prompt = INPUT_PROMPT;
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::debug!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::debug!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
