mod cookie_jar;

pub use cookie_jar::{CookieJar, CookieJarStore, DEFAULT_COOKIE_DIR};
