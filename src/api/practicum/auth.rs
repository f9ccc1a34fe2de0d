use super::PracticumClient;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// 只在首次登录时使用，不会写入磁盘
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Serialize, Debug)]
struct LoginApiBody<'a> {
    login: &'a str,
    #[serde(rename = "passwd")]
    password: &'a str,
}

impl PracticumClient {
    /// 有保存的 Cookie 时直接使用，不检查是否过期；否则提交登录表单
    pub(super) async fn authenticate(&self, credentials: Credentials) -> Result<()> {
        if let Some(jar) = self.store.load(&self.key).await? {
            self.session.cookies().restore(&jar);
            info!(login = %credentials.login, "使用已保存的 Cookie，跳过登录");
            return Ok(());
        }

        info!(login = %credentials.login, "未找到保存的 Cookie，开始登录");
        let body = LoginApiBody {
            login: &credentials.login,
            password: &credentials.password,
        };
        self.post(&self.endpoints.auth, &body).await?;

        if !self.is_authorized().await? {
            warn!(login = %credentials.login, "登录失败");
            return Err(Error::Authorization);
        }

        self.store
            .save(&self.key, &self.session.cookies().snapshot())
            .await?;
        info!(login = %credentials.login, "登录成功");
        Ok(())
    }
}
