//! Types stored in the session and shown to the user.

pub mod notice;
pub mod session;

pub use notice::{Notice, NoticeKind};
pub use session::{CurrentUser, SessionContext, keys as session_keys};
