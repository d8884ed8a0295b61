//! Authentication session lifecycle for the studio admin console
//!
//! The crate is split the same way the data flows: [`storage`] persists the session record,
//! [`identity`] talks to the identity backend, [`session`] owns the single in-memory session and
//! orchestrates both, and [`route`] decides what may be shown for a given session.

pub mod identity;
pub mod route;
pub mod session;
pub mod storage;
pub mod user;

pub use identity::{AuthResponse, Credentials, IdentityService, MockIdentity, Token};
pub use route::{Access, Navigation, Route};
pub use session::{Session, SessionController, Status};
pub use storage::{Scope, Storage};
pub use user::{Role, User, UserId};
