//! Text console over the session controller

use std::str::FromStr;

use color_eyre::Result;
use studio_auth::identity::{Credentials, IdentityService};
use studio_auth::route::{self, Navigation, Route};
use studio_auth::session::{Session, SessionController, Status};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// Builtin accounts of the mock identity service, listed on the login page
const DEMO_ACCOUNTS: &[(&str, &str, &str)] = &[
    ("Administrator", "admin@aiagent-studio-x.local", "DevAdmin2026!"),
    ("Test user", "testuser@aiagent-studio-x.local", "TestUser2026!"),
];

const USAGE: &[&str] = &[
    "login <email> <password> [--remember]   log in",
    "logout                                  log out",
    "refresh                                 re-verify the session",
    "status                                  show the session",
    "open <path>                             open a page",
    "menu                                    list pages",
    "help                                    show this help",
    "quit                                    leave the console",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("No command given, type `help` to list commands")]
    Empty,
}

/// Single console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login {
        email: String,
        password: String,
        remember: bool,
    },
    Logout,
    Refresh,
    Status,
    Open(String),
    Menu,
    Help,
    Quit,
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(command) = words.next() else {
            return Err(Error::Empty);
        };
        let args: Vec<_> = words.collect();

        let action = match (command, args.as_slice()) {
            ("login", [email, password, flags @ ..]) => {
                let remember = match flags {
                    [] => false,
                    ["--remember" | "-r"] => true,
                    _ => return Err(Error::Usage(USAGE[0])),
                };

                Self::Login {
                    email: (*email).to_owned(),
                    password: (*password).to_owned(),
                    remember,
                }
            }
            ("login", _) => return Err(Error::Usage(USAGE[0])),
            ("logout", []) => Self::Logout,
            ("refresh", []) => Self::Refresh,
            ("status", []) => Self::Status,
            ("open", [path]) => Self::Open((*path).to_owned()),
            ("open", _) => return Err(Error::Usage(USAGE[4])),
            ("menu", []) => Self::Menu,
            ("help", _) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            (command, _) => return Err(Error::UnknownCommand(command.to_owned())),
        };

        Ok(action)
    }
}

/// Console state: the session controller and the currently shown page
pub struct Shell<I> {
    controller: SessionController<I>,
    location: Route,
}

impl<I: IdentityService> Shell<I> {
    pub fn new(controller: SessionController<I>) -> Self {
        Self {
            controller,
            location: Route::Login,
        }
    }

    /// Executes single action returning lines to display
    pub async fn execute(&mut self, action: Action) -> Vec<String> {
        match action {
            Action::Login {
                email,
                password,
                remember,
            } => {
                let credentials = Credentials::new(email, password).remember_me(remember);
                match self.controller.login(&credentials).await {
                    Ok(user) => {
                        let mut lines = vec![format!(
                            "Logged in as {} <{}> ({})",
                            user.name, user.email, user.role
                        )];
                        lines.extend(self.open(Route::HOME.path()));
                        lines
                    }
                    Err(err) => vec![format!("Error: {err}")],
                }
            }
            Action::Logout => {
                if let Err(err) = self.controller.logout().await {
                    warn!(%err, "Identity service logout failed");
                }
                let mut lines = vec!["Logged out".to_owned()];
                lines.extend(self.open(Route::Login.path()));
                lines
            }
            Action::Refresh => {
                self.controller.refresh_user().await;
                let mut lines = self.status();
                lines.extend(self.open(self.location.path()));
                lines
            }
            Action::Status => self.status(),
            Action::Open(path) => self.open(&path),
            Action::Menu => self.menu(),
            Action::Help => USAGE.iter().map(|line| (*line).to_owned()).collect(),
            Action::Quit => vec![],
        }
    }

    fn status(&self) -> Vec<String> {
        let session = self.controller.session();
        let line = match (session.status(), session.user()) {
            (Status::Loading, _) => "Loading...".to_owned(),
            (Status::Authenticated, Some(user)) => format!(
                "Logged in as {} <{}> ({})",
                user.name, user.email, user.role
            ),
            _ => "Not logged in".to_owned(),
        };

        vec![line]
    }

    fn open(&mut self, path: &str) -> Vec<String> {
        let session = self.controller.session();

        match route::navigate(path, &session) {
            Navigation::Wait => vec!["Loading...".to_owned()],
            Navigation::Render(route) => {
                self.location = route;
                render(route, &session)
            }
            Navigation::Redirect(route) => {
                self.location = route;
                let mut lines = vec![format!("Redirected to {route}")];
                lines.extend(render(route, &session));
                lines
            }
        }
    }

    fn menu(&self) -> Vec<String> {
        Route::MENU
            .into_iter()
            .map(|route| {
                let marker = if route == self.location { '*' } else { ' ' };
                format!("{marker} {:<10} {}", route.path(), route.title())
            })
            .collect()
    }

    /// Reads commands line by line until the input ends or `quit` is given
    pub async fn run(
        &mut self,
        input: impl AsyncBufRead + Unpin,
        mut output: impl AsyncWrite + Unpin,
    ) -> Result<()> {
        let mut lines = input.lines();

        let initial = self.open("/");
        write_lines(&mut output, &initial).await?;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let reply = match line.parse::<Action>() {
                Ok(Action::Quit) => break,
                Ok(action) => self.execute(action).await,
                Err(err) => vec![err.to_string()],
            };
            write_lines(&mut output, &reply).await?;
        }

        Ok(())
    }
}

pub async fn write_lines(output: &mut (impl AsyncWrite + Unpin), lines: &[String]) -> Result<()> {
    for line in lines {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }
    output.flush().await?;
    Ok(())
}

/// Renders page content for the session
fn render(route: Route, session: &Session) -> Vec<String> {
    let mut lines = vec![];
    if let Some(user) = session.user() {
        lines.push(format!("[{}] {} <{}>", route.title(), user.name, user.email));
    } else {
        lines.push(format!("[{}]", route.title()));
    }

    match (route, session.user()) {
        (Route::Login, _) => {
            lines.push(format!("Sign in to access the admin console: {}", USAGE[0]));
            lines.push("Demo accounts:".to_owned());
            lines.extend(DEMO_ACCOUNTS.iter().map(|(label, email, password)| {
                format!("  {label:<14} {email} / {password}")
            }));
        }
        (Route::Dashboard, Some(user)) => lines.push(format!("Welcome back, {}", user.name)),
        (Route::Dashboard, None) => lines.push("Welcome back".to_owned()),
        (Route::Prompts, _) => lines.push("Prompt management is coming soon".to_owned()),
        (Route::Users, _) => lines.push("User management is coming soon".to_owned()),
        (Route::Settings, _) => lines.push("System settings are coming soon".to_owned()),
    }

    lines
}
