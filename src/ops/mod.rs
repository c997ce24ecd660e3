use serde::Serialize;

use crate::config::{Cli, Command, CounselorCommand, NoteCommand};

mod counselors;
mod notes;

pub use counselors::{
    cmd_counselors_create, cmd_counselors_delete, cmd_counselors_get, cmd_counselors_list,
    cmd_counselors_update,
};
pub use notes::{cmd_notes_create, cmd_notes_list};

pub const EXIT_INVALID_ARGS: i32 = 2;
pub const EXIT_CONFIG_MISSING: i32 = 3;
pub const EXIT_API_ERROR: i32 = 4;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub async fn run(cli: Cli) -> Result<(), ExitError> {
    let config = cli.config;
    match cli.command {
        Command::Counselors(cmd) => match cmd {
            CounselorCommand::List => cmd_counselors_list(&config).await,
            CounselorCommand::Get(args) => cmd_counselors_get(&config, args).await,
            CounselorCommand::Create(args) => cmd_counselors_create(&config, args).await,
            CounselorCommand::Update(args) => cmd_counselors_update(&config, args).await,
            CounselorCommand::Delete(args) => cmd_counselors_delete(&config, args).await,
        },
        Command::Notes(cmd) => match cmd {
            NoteCommand::List => cmd_notes_list(&config).await,
            NoteCommand::Create(args) => cmd_notes_create(&config, args).await,
        },
    }
}

/// Prints the store state to stdout so callers can pipe it.
fn print_state<T: Serialize>(state: &T) -> Result<(), ExitError> {
    let s = serde_json::to_string_pretty(state)
        .map_err(|e| ExitError::new(EXIT_API_ERROR, format!("encode_state: {e}")))?;
    println!("{s}");
    Ok(())
}
