mod auth;
mod models;

use crate::api::network::SessionClient;
use crate::api::storage::{CookieJarStore, DEFAULT_COOKIE_DIR};
use crate::error::{Error, Result};
use reqwest::{IntoUrl, Response, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub use auth::Credentials;
pub use models::{Course, Lesson, MeResponse, Profession, ProfileResponse};

const UNKNOWN_ERROR: &str = "Unknown error.";

/// 接口地址，`profession` 中的 `{slug}` 会被替换
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: String,
    pub accounts: String,
    pub me: String,
    pub profession: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            auth: "https://passport.yandex.ru/passport?mode=auth".to_string(),
            accounts: "https://api.passport.yandex.ru/all_accounts".to_string(),
            me: "https://practicum.yandex.ru/api/users/me/".to_string(),
            profession: "https://practicum.yandex.ru/api/v2/profiles/{slug}/".to_string(),
        }
    }
}

impl Endpoints {
    pub fn profession_url(&self, slug: &str) -> String {
        self.profession.replace("{slug}", slug)
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub cookie_dir: PathBuf,
    /// 覆盖默认的 `<login>.json` 文件名
    pub dump_file: Option<String>,
    pub endpoints: Endpoints,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            cookie_dir: PathBuf::from(DEFAULT_COOKIE_DIR),
            dump_file: None,
            endpoints: Endpoints::default(),
        }
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    errors: Option<ErrorDetail>,
}

#[derive(Deserialize, Default)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// 从 `{"errors": {"message": ...}}` 中取出错误信息，取不到时返回默认值
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.errors)
        .and_then(|e| e.message)
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// 非 200 的响应一律转为 `Error::Api`，否则原样返回
pub async fn check_response(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status == StatusCode::OK {
        return Ok(resp);
    }

    let url = resp.url().clone();
    let body = resp.text().await.unwrap_or_default();
    let message = extract_error_message(&body);
    warn!(%url, status = status.as_u16(), error = %message, "接口返回错误");

    Err(Error::api(status.as_u16(), message))
}

pub struct PracticumClient {
    session: SessionClient,
    store: CookieJarStore,
    endpoints: Endpoints,
    key: String,
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("store", &self.store)
            .field("endpoints", &self.endpoints)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    /// 使用默认配置连接：`cookies/<login>.json` 和正式环境地址
    pub async fn new(login: &str, password: &str) -> Result<Self> {
        Self::connect(Credentials::new(login, password), ClientOptions::default()).await
    }

    /// 创建客户端并完成认证；有保存的 Cookie 时不会发出任何请求
    pub async fn connect(credentials: Credentials, options: ClientOptions) -> Result<Self> {
        let store = CookieJarStore::open(&options.cookie_dir).await?;
        let key = CookieJarStore::key_for(&credentials.login, options.dump_file.as_deref());

        let client = PracticumClient {
            session: SessionClient::new(),
            store,
            endpoints: options.endpoints,
            key,
        };
        client.authenticate(credentials).await?;
        Ok(client)
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    pub fn store(&self) -> &CookieJarStore {
        &self.store
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// 当前账号对应的 Cookie 文件名
    pub fn session_key(&self) -> &str {
        &self.key
    }

    async fn get<U: IntoUrl>(&self, url: U) -> Result<Response> {
        check_response(self.session.get(url).await?).await
    }

    async fn post<U: IntoUrl, T: serde::Serialize + ?Sized>(
        &self,
        url: U,
        data: &T,
    ) -> Result<Response> {
        check_response(self.session.post(url, data).await?).await
    }

    /// 账号列表接口在未登录时返回 `{}`
    pub async fn is_authorized(&self) -> Result<bool> {
        let text = self.get(&self.endpoints.accounts).await?.text().await?;
        Ok(text != "{}")
    }

    pub async fn get_professions(&self) -> Result<Vec<Profession>> {
        let body = self.get(&self.endpoints.me).await?.text().await?;
        let me: MeResponse = serde_json::from_str(&body)?;
        let mut professions = me.into_professions()?;
        debug!(count = professions.len(), "已获取订阅的职业");

        for profession in professions.iter_mut() {
            profession.courses = Some(self.get_courses(profession).await?);
        }

        info!(count = professions.len(), "职业列表加载完成");
        Ok(professions)
    }

    pub async fn get_courses(&self, profession: &Profession) -> Result<Vec<Course>> {
        let url = self.endpoints.profession_url(&profession.slug);
        let body = self.get(url).await?.text().await?;
        let profile: ProfileResponse = serde_json::from_str(&body)?;
        let courses = profile.into_courses()?;
        debug!(slug = %profession.slug, count = courses.len(), "已获取课程");
        Ok(courses)
    }
}
