use crate::error::{Error, Result};
use ahash::RandomState;
use bytes::{BufMut, BytesMut};
use cookie::Cookie;
use cookie::time::{Duration, OffsetDateTime};
use dashmap::DashMap;
use fake_user_agent::get_chrome_rua;
use reqwest::{
    Client, IntoUrl, Method, Response, StatusCode,
    header::{CONTENT_TYPE, COOKIE, HeaderValue, LOCATION, SET_COOKIE, USER_AGENT},
};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::sync::{
    Arc, LazyLock,
    atomic::{AtomicU64, Ordering},
};
use tracing::{debug, trace, warn};
use url::Url;

const MAX_REDIRECTS: u8 = 20;

/// 从磁盘恢复的 Cookie 没有域信息，对所有 host 生效
const ANY_DOMAIN: &str = "";

static GLOBAL_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .tcp_keepalive(std::time::Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::none()) // 必须手动处理重定向，才能跨请求同步 Cookie
        .build()
        .unwrap_or_default()
});

struct StoredCookie {
    value: Arc<str>,
    // 写入顺序，展平时同名 Cookie 以最后写入的为准
    seq: u64,
}

pub struct SessionCookieStore {
    // Key: domain, Value: Map<cookie_name, cookie_value>
    raw_data: DashMap<SmolStr, DashMap<SmolStr, StoredCookie>, RandomState>,
    counter: AtomicU64,
}

impl Default for SessionCookieStore {
    fn default() -> Self {
        Self::new()
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    if domain == ANY_DOMAIN || host == domain {
        return true;
    }
    host.len() > domain.len()
        && host.ends_with(domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

/// `Max-Age <= 0` 或 `Expires` 已过期的 Cookie 表示删除
fn is_expired(cookie: &Cookie<'_>) -> bool {
    if let Some(max_age) = cookie.max_age() {
        return max_age <= Duration::ZERO;
    }
    cookie
        .expires_datetime()
        .is_some_and(|at| at <= OffsetDateTime::now_utc())
}

impl SessionCookieStore {
    pub fn new() -> Self {
        Self {
            raw_data: DashMap::with_hasher(RandomState::default()),
            counter: AtomicU64::new(0),
        }
    }

    /// 拼出发往 `host` 的 Cookie 头，没有匹配的 Cookie 时返回 None
    pub fn get_header(&self, host: &str) -> Option<HeaderValue> {
        let mut buf = BytesMut::new();

        for domain_ref in self.raw_data.iter() {
            if !domain_matches(host, domain_ref.key()) {
                continue;
            }
            for item in domain_ref.value().iter() {
                let (k, v) = (item.key(), &item.value().value);

                if HeaderValue::from_str(k).is_err() || HeaderValue::from_str(v).is_err() {
                    warn!(domain = %domain_ref.key(), name = %k, "Cookie 含有非法字符，已跳过");
                    continue;
                }

                if !buf.is_empty() {
                    buf.put_slice(b"; ");
                }
                buf.put_slice(k.as_bytes());
                buf.put_u8(b'=');
                buf.put_slice(v.as_bytes());
            }
        }

        if buf.is_empty() {
            return None;
        }
        HeaderValue::from_maybe_shared(buf.freeze()).ok()
    }

    /// 解析一条 Set-Cookie，优先使用其 Domain 属性；已过期的 Cookie 会被删除
    pub fn add_cookie_str(&self, host: &str, cookie_str: &str) {
        if let Ok(cookie) = Cookie::parse(cookie_str) {
            let domain = cookie
                .domain()
                .map(|d| d.trim_start_matches('.'))
                .filter(|d| !d.is_empty())
                .unwrap_or(host);

            if is_expired(&cookie) {
                trace!(domain, name = cookie.name(), "删除过期 Cookie");
                self.remove(domain, cookie.name());
                return;
            }

            trace!(domain, name = cookie.name(), "收到 Cookie");
            self.set(domain, cookie.name(), cookie.value());
        }
    }

    pub fn set(&self, domain: &str, key: &str, value: &str) {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let domain_map = self.raw_data.entry(SmolStr::new(domain)).or_default();
        domain_map.insert(
            SmolStr::new(key),
            StoredCookie {
                value: Arc::from(value),
                seq,
            },
        );
    }

    pub fn remove(&self, domain: &str, key: &str) {
        if let Some(domain_map) = self.raw_data.get(domain) {
            domain_map.remove(key);
        }
    }

    pub fn get(&self, domain: &str, key: &str) -> Option<Arc<str>> {
        self.raw_data
            .get(domain)
            .and_then(|domain_store| domain_store.get(key).map(|v| v.value().value.clone()))
    }

    /// 展平为 name -> value，同名 Cookie 取最后写入的值
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let mut latest: BTreeMap<String, (u64, Arc<str>)> = BTreeMap::new();
        for domain_ref in self.raw_data.iter() {
            for item in domain_ref.value().iter() {
                let stored = item.value();
                match latest.get(item.key().as_str()) {
                    Some((seq, _)) if *seq > stored.seq => {}
                    _ => {
                        latest.insert(item.key().to_string(), (stored.seq, stored.value.clone()));
                    }
                }
            }
        }
        latest
            .into_iter()
            .map(|(k, (_, v))| (k, v.to_string()))
            .collect()
    }

    pub fn restore(&self, cookies: &BTreeMap<String, String>) {
        for (k, v) in cookies {
            self.set(ANY_DOMAIN, k, v);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw_data.iter().all(|d| d.value().is_empty())
    }
}

pub struct SessionClient {
    cookie_store: Arc<SessionCookieStore>,
    ua: HeaderValue,
}

impl Default for SessionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClient {
    pub fn new() -> Self {
        Self {
            cookie_store: Arc::new(SessionCookieStore::new()),
            ua: HeaderValue::from_static(get_chrome_rua()),
        }
    }

    pub fn cookies(&self) -> &SessionCookieStore {
        &self.cookie_store
    }

    /// 执行带 Cookie 同步和手动重定向的请求
    async fn request_internal(
        &self,
        mut method: Method,
        mut url: Url,
        mut body: Option<String>,
    ) -> Result<Response> {
        let mut redirect_count = 0;

        loop {
            if redirect_count > MAX_REDIRECTS {
                return Err(Error::Redirect(format!("重定向次数过多: {url}")));
            }

            debug!(%method, %url, "发送请求");

            let mut builder = GLOBAL_CLIENT
                .request(method.clone(), url.clone())
                .header(USER_AGENT, &self.ua);

            if let Some(c) = self
                .cookie_store
                .get_header(url.host_str().unwrap_or_default())
            {
                builder = builder.header(COOKIE, c);
            }

            if let Some(ref b) = body {
                builder = builder
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(b.clone());
            }

            let resp = builder.send().await?;

            for cookie in resp.headers().get_all(SET_COOKIE) {
                if let Ok(c_str) = cookie.to_str() {
                    self.cookie_store
                        .add_cookie_str(resp.url().host_str().unwrap_or_default(), c_str);
                }
            }

            if resp.status().is_redirection()
                && let Some(loc) = resp.headers().get(LOCATION)
            {
                let loc = loc
                    .to_str()
                    .map_err(|e| Error::Redirect(format!("无效的 Location 头: {e}")))?;
                let next_url = resp.url().join(loc)?;

                match resp.status() {
                    // 301, 302, 303: 转为 GET 并丢弃 Body
                    StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER => {
                        method = Method::GET;
                        body = None;
                    }
                    // 307, 308: 保持原有的 Method 和 Body
                    StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => {}
                    _ => return Ok(resp),
                }

                trace!(from = %url, to = %next_url, "跟随重定向");
                url = next_url;
                redirect_count += 1;
                continue;
            }
            return Ok(resp);
        }
    }

    pub async fn get<U: IntoUrl>(&self, url: U) -> Result<Response> {
        let url = url.into_url()?;
        self.request_internal(Method::GET, url, None).await
    }

    pub async fn post<U: IntoUrl, T: serde::Serialize + ?Sized>(
        &self,
        url: U,
        data: &T,
    ) -> Result<Response> {
        let url = url.into_url()?;
        let body = serde_urlencoded::to_string(data)?;
        self.request_internal(Method::POST, url, Some(body)).await
    }

    pub fn get_cookie(&self, key: &str, url: &Url) -> Option<Arc<str>> {
        self.cookie_store
            .get(url.host_str().unwrap_or_default(), key)
    }
}
