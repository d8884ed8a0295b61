//! Session lifecycle
//!
//! [`SessionController`] owns the only [`Session`] of the application. Every change of the
//! session is published over a watch channel, so the UI side can observe it and re-evaluate the
//! route guard without reaching to any global state.
//!
//! The session is mirrored into [`Storage`] as the persisted record: token and user are always
//! written and cleared together, in the scope selected by the remember-me flag, while the flag
//! itself is always durable.

use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::identity::{self, AuthResponse, Credentials, IdentityService, Token};
use crate::storage::{Scope, Storage};
use crate::user::User;

/// Storage key of the access token
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key of the authenticated user
pub const USER_KEY: &str = "user_data";
/// Storage key of the remember-me flag, always in the durable scope
pub const REMEMBER_ME_KEY: &str = "remember_me";

/// Both scopes, in the order the persisted record is looked up
const SCOPES: [Scope; 2] = [Scope::Durable, Scope::Session];

/// Token together with the user it was issued for
#[derive(Debug, Clone, PartialEq)]
struct Authenticated {
    token: Token,
    user: User,
}

/// In-memory authentication state
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    authenticated: Option<Authenticated>,
    is_loading: bool,
}

/// Coarse session state as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Loading,
    Authenticated,
    Anonymous,
}

impl Session {
    /// Session before restoration - empty and loading
    pub fn new() -> Self {
        Self {
            authenticated: None,
            is_loading: true,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.authenticated.as_ref().map(|auth| &auth.user)
    }

    pub fn token(&self) -> Option<&Token> {
        self.authenticated.as_ref().map(|auth| &auth.token)
    }

    /// True iff both user and token are present
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn status(&self) -> Status {
        match (self.is_loading, self.is_authenticated()) {
            (true, _) => Status::Loading,
            (false, true) => Status::Authenticated,
            (false, false) => Status::Anonymous,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Owner of the application session
pub struct SessionController<I> {
    identity: I,
    storage: Storage,
    state: watch::Sender<Session>,
}

impl<I: IdentityService> SessionController<I> {
    /// Creates controller with an empty, loading session
    ///
    /// Nothing is restored until [`initialize`](Self::initialize) is called.
    pub fn new(identity: I, storage: Storage) -> Self {
        Self {
            identity,
            storage,
            state: watch::Sender::new(Session::new()),
        }
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    fn set_loading(&self, is_loading: bool) {
        self.state.send_if_modified(|session| {
            let modified = session.is_loading != is_loading;
            session.is_loading = is_loading;
            modified
        });
    }

    /// Restores the session from the persisted record
    ///
    /// Runs once at startup. Any problem with the stored record or its verification is only
    /// logged - the session just stays anonymous and the record is discarded.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        self.set_loading(true);

        if let Some((scope, token)) = self.stored_record() {
            match self.identity.verify_token(&token).await {
                Ok(user) => {
                    self.storage.set(USER_KEY, &user, scope);
                    info!(user_id = %user.id, %scope, "Session restored from storage");
                    self.state.send_modify(|session| {
                        session.authenticated = Some(Authenticated { token, user });
                    });
                }
                Err(err) => {
                    warn!(%err, "Stored token verification failed, clearing storage");
                    self.clear_record();
                }
            }
        }

        self.set_loading(false);
    }

    /// Finds the persisted token, checking the durable scope first
    ///
    /// A scope holding only half of the record (or an unreadable value) is cleaned up and
    /// skipped.
    fn stored_record(&self) -> Option<(Scope, Token)> {
        for scope in SCOPES {
            let token = self.storage.get::<Token>(TOKEN_KEY, scope);
            let user = self.storage.get::<User>(USER_KEY, scope);

            match (token, user) {
                (Some(token), Some(_)) => return Some((scope, token)),
                (None, None)
                    if !self.storage.contains(TOKEN_KEY, scope)
                        && !self.storage.contains(USER_KEY, scope) => {}
                _ => {
                    warn!(%scope, "Incomplete session record in storage, discarding");
                    self.storage.remove(TOKEN_KEY, scope);
                    self.storage.remove(USER_KEY, scope);
                }
            }
        }

        None
    }

    /// Removes token and user from both scopes
    fn clear_record(&self) {
        for scope in SCOPES {
            self.storage.remove(TOKEN_KEY, scope);
            self.storage.remove(USER_KEY, scope);
        }
    }

    /// Scope the user data belongs to according to the stored remember-me flag
    fn remembered_scope(&self) -> Scope {
        match self.storage.get::<bool>(REMEMBER_ME_KEY, Scope::Durable) {
            Some(true) => Scope::Durable,
            _ => Scope::Session,
        }
    }

    /// Logs in with given credentials
    ///
    /// On failure the error from the identity service is returned unchanged, and neither the
    /// session nor the storage is touched.
    #[instrument(skip_all, fields(email = %credentials.email, remember_me = credentials.remember_me))]
    pub async fn login(&self, credentials: &Credentials) -> identity::Result<User> {
        self.set_loading(true);
        let result = self.identity.login(credentials).await;

        let result = match result {
            Ok(AuthResponse { token, user }) => {
                let (scope, stale) = match credentials.remember_me {
                    true => (Scope::Durable, Scope::Session),
                    false => (Scope::Session, Scope::Durable),
                };

                self.storage.remove(TOKEN_KEY, stale);
                self.storage.remove(USER_KEY, stale);
                self.storage.set(TOKEN_KEY, &token, scope);
                self.storage.set(USER_KEY, &user, scope);
                self.storage
                    .set(REMEMBER_ME_KEY, &credentials.remember_me, Scope::Durable);

                info!(user_id = %user.id, %scope, "Login successful");
                self.state.send_modify(|session| {
                    session.authenticated = Some(Authenticated {
                        token,
                        user: user.clone(),
                    });
                });

                Ok(user)
            }
            Err(err) => {
                error!(%err, "Login error");
                Err(err)
            }
        };

        self.set_loading(false);
        result
    }

    /// Logs out
    ///
    /// Local state is authoritative: the session and the persisted record are cleared even if
    /// the identity service fails, the failure is returned afterwards.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> identity::Result<()> {
        self.set_loading(true);
        let result = self.identity.logout().await;

        self.clear_record();
        self.state.send_modify(|session| {
            session.authenticated = None;
            session.is_loading = false;
        });

        match &result {
            Ok(()) => info!("Logout successful"),
            Err(err) => error!(%err, "Logout error, local session cleared anyway"),
        }

        result
    }

    /// Re-verifies the current token refreshing the user data
    ///
    /// Does nothing without a token. If the token is no longer valid the session is terminated
    /// with [`logout`](Self::logout) - the verification error is never returned.
    #[instrument(skip(self))]
    pub async fn refresh_user(&self) {
        let Some(token) = self.state.borrow().token().cloned() else {
            return;
        };

        self.set_loading(true);
        match self.identity.verify_token(&token).await {
            Ok(user) => {
                let scope = self.remembered_scope();
                self.storage.set(USER_KEY, &user, scope);
                info!(user_id = %user.id, %scope, "User refreshed");

                self.state.send_modify(|session| {
                    if let Some(auth) = &mut session.authenticated {
                        auth.user = user;
                    }
                    session.is_loading = false;
                });
            }
            Err(err) => {
                error!(%err, "Refresh user error, logging out");
                if let Err(err) = self.logout().await {
                    error!(%err, "Logout after failed refresh failed");
                }
            }
        }
    }
}
