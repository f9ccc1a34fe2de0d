mod session;

pub use session::{SessionClient, SessionCookieStore};
