use clap::{Parser, Subcommand};
use clio::Input;

use crate::shell::Action;

#[derive(Debug, Parser)]
#[command(name = "studio-admin", about = "Studio administration console")]
pub struct Opt {
    /// Config file path
    #[arg(short, long, value_parser)]
    pub config: Option<Input>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Logs in, optionally keeping the session for later runs
    Login {
        email: String,
        password: String,
        /// Keep the session across console restarts
        #[arg(short, long)]
        remember: bool,
    },
    /// Logs out clearing stored session
    Logout,
    /// Re-verifies the stored session
    Refresh,
    /// Shows current session
    Status,
    /// Opens a console page
    Open { path: String },
    /// Interactive console reading commands from the standard input (default)
    Shell,
}

impl Command {
    /// Action to execute, `None` for the interactive shell
    pub fn action(self) -> Option<Action> {
        match self {
            Self::Login {
                email,
                password,
                remember,
            } => Some(Action::Login {
                email,
                password,
                remember,
            }),
            Self::Logout => Some(Action::Logout),
            Self::Refresh => Some(Action::Refresh),
            Self::Status => Some(Action::Status),
            Self::Open { path } => Some(Action::Open(path)),
            Self::Shell => None,
        }
    }
}
