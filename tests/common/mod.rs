#![allow(dead_code)]

use axum::{
    Form, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use practicum_client::Endpoints;
use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, Once,
    atomic::{AtomicUsize, Ordering},
};

pub const SESSION_COOKIE: &str = "Session_id";
pub const VALID_SESSION: &str = "valid-session";
pub const PASSWORD: &str = "correct horse";

pub struct ServerState {
    pub hits: AtomicUsize,
    pub logins: Mutex<Vec<HashMap<String, String>>>,
    pub me_body: Mutex<String>,
    pub profiles: Mutex<HashMap<String, (u16, String)>>,
}

impl Default for ServerState {
    fn default() -> Self {
        ServerState {
            hits: AtomicUsize::new(0),
            logins: Mutex::new(Vec::new()),
            me_body: Mutex::new(r#"{"subscriptions": []}"#.to_string()),
            profiles: Mutex::new(HashMap::new()),
        }
    }
}

pub struct TestServer {
    pub base: String,
    pub state: Arc<ServerState>,
}

impl TestServer {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            auth: format!("{}/passport?mode=auth", self.base),
            accounts: format!("{}/all_accounts", self.base),
            me: format!("{}/api/users/me/", self.base),
            profession: format!("{}/api/v2/profiles/{{slug}}/", self.base),
        }
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn set_me(&self, body: &str) {
        *self.state.me_body.lock().unwrap() = body.to_string();
    }

    pub fn set_profile(&self, slug: &str, status: u16, body: &str) {
        self.state
            .profiles
            .lock()
            .unwrap()
            .insert(slug.to_string(), (status, body.to_string()));
    }
}

fn has_session(headers: &HeaderMap) -> bool {
    let expected = format!("{SESSION_COOKIE}={VALID_SESSION}");
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split("; ").any(|c| c == expected))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        r#"{"errors":{"message":"Authentication required"}}"#,
    )
        .into_response()
}

async fn passport(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.logins.lock().unwrap().push(form.clone());

    if form.get("login").map(String::as_str) == Some("blocked") {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"errors":{"message":"try later"}}"#,
        )
            .into_response();
    }

    if form.get("passwd").map(String::as_str) != Some(PASSWORD) {
        return (StatusCode::OK, "<html>wrong password</html>").into_response();
    }

    // 登录成功后跳转，会话 Cookie 在跳转目标上下发
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, "/passport/finish"),
            (header::SET_COOKIE, "yandexuid=42; Path=/"),
        ],
    )
        .into_response()
}

async fn passport_finish(State(state): State<Arc<ServerState>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={VALID_SESSION}; Path=/; HttpOnly"),
        )],
        "<html>welcome</html>",
    )
        .into_response()
}

async fn all_accounts(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if has_session(&headers) {
        (StatusCode::OK, r#"{"accounts":[1]}"#).into_response()
    } else {
        (StatusCode::OK, "{}").into_response()
    }
}

async fn me(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if !has_session(&headers) {
        return unauthorized();
    }
    let body = state.me_body.lock().unwrap().clone();
    (StatusCode::OK, body).into_response()
}

async fn profile(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if !has_session(&headers) {
        return unauthorized();
    }
    match state.profiles.lock().unwrap().get(&slug).cloned() {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            r#"{"errors":{"message":"bad slug"}}"#,
        )
            .into_response(),
    }
}

async fn temporary_redirect(State(state): State<Arc<ServerState>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::TEMPORARY_REDIRECT,
        [(header::LOCATION, "/echo/form")],
    )
        .into_response()
}

async fn permanent_redirect(State(state): State<Arc<ServerState>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::PERMANENT_REDIRECT,
        [(header::LOCATION, "/echo/form")],
    )
        .into_response()
}

async fn see_other(State(state): State<Arc<ServerState>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::SEE_OTHER, [(header::LOCATION, "/echo/method")]).into_response()
}

/// 只接受 POST，回显表单中的 login
async fn echo_form(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let login = form.get("login").cloned().unwrap_or_default();
    (StatusCode::OK, format!("POST login={login}")).into_response()
}

async fn echo_method(State(state): State<Arc<ServerState>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, "GET").into_response()
}

async fn redirect_loop(State(state): State<Arc<ServerState>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::FOUND, [(header::LOCATION, "/loop")]).into_response()
}

static NO_PROXY: Once = Once::new();

pub async fn spawn() -> TestServer {
    // 本地测试服务器不能走系统代理
    NO_PROXY.call_once(|| unsafe {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        std::env::set_var("no_proxy", "127.0.0.1,localhost");
    });

    let state = Arc::new(ServerState::default());
    let app = Router::new()
        .route("/passport", post(passport))
        .route("/passport/finish", get(passport_finish))
        .route("/all_accounts", get(all_accounts))
        .route("/api/users/me/", get(me))
        .route("/api/v2/profiles/:slug/", get(profile))
        .route("/echo/307", post(temporary_redirect))
        .route("/echo/308", post(permanent_redirect))
        .route("/echo/303", post(see_other))
        .route("/echo/form", post(echo_form))
        .route("/echo/method", get(echo_method))
        .route("/loop", get(redirect_loop))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{addr}"),
        state,
    }
}
