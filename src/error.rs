use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// 登录后探测接口返回 `{}`：密码错误或开启了两步验证，两者无法区分
    #[error(
        "Invalid login or password or 2FA is enabled (https://id.yandex.ru/security/enter-methods)."
    )]
    Authorization,

    #[error("Error: {status}. Message: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected payload: {0}")]
    Validation(#[from] serde_json::Error),

    #[error("Cookie storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    #[error("Invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Redirect error: {0}")]
    Redirect(String),
}

impl Error {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }
}
