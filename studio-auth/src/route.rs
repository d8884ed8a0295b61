//! Console destinations and access control

use crate::session::Session;

/// Console destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Prompts,
    Users,
    Settings,
}

impl Route {
    /// Every destination
    pub const ALL: [Route; 5] = [
        Route::Login,
        Route::Dashboard,
        Route::Prompts,
        Route::Users,
        Route::Settings,
    ];

    /// Primary protected destination, also the target of any unknown path
    pub const HOME: Route = Route::Prompts;

    /// Destinations listed in the navigation menu
    pub const MENU: [Route; 3] = [Route::Prompts, Route::Users, Route::Settings];

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::Prompts => "/prompts",
            Self::Users => "/users",
            Self::Settings => "/settings",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Dashboard => "Dashboard",
            Self::Prompts => "Prompt management",
            Self::Users => "User management",
            Self::Settings => "System settings",
        }
    }

    /// Whether the route requires an authenticated session
    pub fn is_protected(self) -> bool {
        self != Self::Login
    }

    /// Exact path match
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Route for a path, unknown paths resolve to [`Route::HOME`]
    pub fn resolve(path: &str) -> Self {
        Self::from_path(path).unwrap_or(Self::HOME)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Guard decision for protected content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Session is still loading, show a waiting indicator
    Pending,
    /// Not authenticated, go to the given route instead
    Redirect(Route),
    /// Protected content may be shown
    Granted,
}

/// Decides access to protected content for the session
pub fn guard(session: &Session) -> Access {
    if session.is_loading() {
        Access::Pending
    } else if !session.is_authenticated() {
        Access::Redirect(Route::Login)
    } else {
        Access::Granted
    }
}

/// Outcome of navigating to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Wait for the session to settle
    Wait,
    /// Show the route
    Render(Route),
    /// Access denied, show another route instead
    Redirect(Route),
}

/// Resolves `path` and applies the guard to protected destinations
pub fn navigate(path: &str, session: &Session) -> Navigation {
    let route = Route::resolve(path);
    if !route.is_protected() {
        return Navigation::Render(route);
    }

    match guard(session) {
        Access::Pending => Navigation::Wait,
        Access::Redirect(target) => Navigation::Redirect(target),
        Access::Granted => Navigation::Render(route),
    }
}
