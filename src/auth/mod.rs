pub mod middleware;
pub mod session;

pub use middleware::{login_redirect, session_middleware, AuthenticatedParticipant, SessionState};
pub use session::{SessionError, SessionService, SESSION_COOKIE};
