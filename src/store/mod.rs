//! Session store: the token record and user profile live client-side in an
//! encrypted cookie with an absolute retention window.

pub mod cookie;

pub use cookie::{SessionEnvelope, SessionStore, SESSION_COOKIE};
