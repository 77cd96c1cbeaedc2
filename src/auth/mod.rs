//! Sign-in policy, post-auth redirects and collaborator admission rules.

pub mod gate;
pub mod guard;
pub mod redirect;

pub use gate::SignInGate;
pub use guard::{calendar_credentials, mail_credentials, CalendarCredentials, MailCredentials};
pub use redirect::normalize_redirect;
