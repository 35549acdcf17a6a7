//! Testing utilities for moodcheck workspace
//!
//! Shared fixtures, gateway builders and an in-process stub of the remote
//! survey API whose behavior (healthy, slow, failing, garbage) can be
//! switched while a test runs.

#![allow(missing_docs)]

use moodcheck_core::{report, ProfileDraft, RemoteTimeouts, ResponseRecord, Score, UserProfile};
use moodcheck_gateway::{PersistenceGateway, RemoteStore};
use moodcheck_store::LocalStore;
use parking_lot::Mutex;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

/// How the stub server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubMode {
    /// Follow the contract
    Healthy,
    /// Follow the contract after sleeping
    Slow(Duration),
    /// Answer every request with this status
    Failing(u16),
    /// Answer 200 with a body that is not JSON
    Garbage,
}

#[derive(Debug)]
struct StubState {
    mode: Mutex<StubMode>,
    users: Mutex<Vec<UserProfile>>,
    responses: Mutex<Vec<ResponseRecord>>,
    next_id: AtomicI64,
    hits: AtomicUsize,
}

impl StubState {
    fn new(mode: StubMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            users: Mutex::new(Vec::new()),
            responses: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            hits: AtomicUsize::new(0),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Apply the current mode; `Some` short-circuits the handler
    async fn intercept(&self) -> Option<Response> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock();
        match mode {
            StubMode::Healthy => None,
            StubMode::Slow(delay) => {
                tokio::time::sleep(delay).await;
                None
            }
            StubMode::Failing(status) => Some(error_reply(status, "stub failure")),
            StubMode::Garbage => Some(
                warp::reply::with_status("<html>oops</html>", StatusCode::OK).into_response(),
            ),
        }
    }
}

/// In-process stub of the remote survey API
///
/// Shuts down when dropped.
#[derive(Debug)]
pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubServer {
    /// Start a healthy stub on an ephemeral port
    ///
    /// Must be called inside a tokio runtime.
    pub fn start() -> Self {
        Self::start_with(StubMode::Healthy)
    }

    /// Start a stub in the given mode
    pub fn start_with(mode: StubMode) -> Self {
        let state = Arc::new(StubState::new(mode));
        let (tx, rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(routes(state.clone()))
            .bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                let _ = rx.await;
            });
        tokio::spawn(server);

        Self {
            addr,
            state,
            shutdown: Some(tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_mode(&self, mode: StubMode) {
        *self.state.mode.lock() = mode;
    }

    /// Requests received so far
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn users(&self) -> Vec<UserProfile> {
        self.state.users.lock().clone()
    }

    pub fn responses(&self) -> Vec<ResponseRecord> {
        self.state.responses.lock().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn with_state(
    state: Arc<StubState>,
) -> impl Filter<Extract = (Arc<StubState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn routes(
    state: Arc<StubState>,
) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
    let login = warp::path!("api" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_login);

    let response = warp::path!("api" / "response")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_response);

    let report = warp::path!("api" / "admin" / "responses")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_report);

    login.or(response).unify().or(report).unify()
}

async fn handle_login(
    body: serde_json::Value,
    state: Arc<StubState>,
) -> Result<Response, Infallible> {
    if let Some(reply) = state.intercept().await {
        return Ok(reply);
    }

    let draft: ProfileDraft = match serde_json::from_value(body) {
        Ok(draft) => draft,
        Err(e) => return Ok(error_reply(400, &e.to_string())),
    };
    let profile = draft.into_profile(state.next_id());
    state.users.lock().push(profile.clone());
    Ok(warp::reply::json(&profile).into_response())
}

async fn handle_response(
    body: serde_json::Value,
    state: Arc<StubState>,
) -> Result<Response, Infallible> {
    if let Some(reply) = state.intercept().await {
        return Ok(reply);
    }

    let field = |name: &str| body.get(name).and_then(serde_json::Value::as_i64);
    let (Some(user_id), Some(question_id), Some(score)) =
        (field("user_id"), field("question_id"), field("score"))
    else {
        return Ok(error_reply(400, "Missing fields"));
    };

    let record = ResponseRecord {
        id: state.next_id(),
        user_id,
        question_id,
        score,
        timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    let id = record.id;
    state.responses.lock().push(record);
    Ok(warp::reply::json(&json!({ "id": id, "status": "saved" })).into_response())
}

async fn handle_report(state: Arc<StubState>) -> Result<Response, Infallible> {
    if let Some(reply) = state.intercept().await {
        return Ok(reply);
    }

    let users = state.users.lock().clone();
    let responses = state.responses.lock().clone();
    let rows = report::assemble(&users, &responses);
    Ok(warp::reply::json(&rows).into_response())
}

fn error_reply(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status).into_response()
}

/// Base URL on which nothing is listening
pub fn unreachable_base_url() -> String {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);
    format!("http://127.0.0.1:{port}")
}

/// Short deadlines so fallback tests stay fast
pub fn fast_timeouts() -> RemoteTimeouts {
    RemoteTimeouts::uniform(250)
}

/// Gateway whose remote is unreachable, over an in-memory local store
pub fn offline_gateway() -> PersistenceGateway {
    gateway_for_url(&unreachable_base_url(), fast_timeouts())
}

/// Gateway pointing at `base_url`, over an in-memory local store
pub fn gateway_for_url(base_url: &str, timeouts: RemoteTimeouts) -> PersistenceGateway {
    let remote = RemoteStore::new(base_url, timeouts).unwrap();
    PersistenceGateway::new(Arc::new(remote), Arc::new(LocalStore::in_memory()))
}

/// Gateway pointing at a stub server
pub fn gateway_for(server: &StubServer, timeouts: RemoteTimeouts) -> PersistenceGateway {
    gateway_for_url(&server.base_url(), timeouts)
}

pub fn sample_draft() -> ProfileDraft {
    ProfileDraft::new("Mia", "🐱", "3", "girl")
}

pub fn sample_profile(id: i64, name: &str) -> UserProfile {
    ProfileDraft::new(name, "🐻", "2", "boy").into_profile(id)
}

pub fn sample_record(id: i64, user_id: i64, question_id: i64, timestamp: &str) -> ResponseRecord {
    ResponseRecord {
        id,
        user_id,
        question_id,
        score: 3,
        timestamp: timestamp.to_string(),
    }
}

pub fn score(value: i64) -> Score {
    Score::new(value).unwrap()
}
