//! In-process HTTP endpoint standing in for a RESTful light.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Debug)]
struct Shared {
    /// Body returned from GET
    status: Mutex<Value>,
    /// Status code returned from POST
    post_status: Mutex<StatusCode>,
    /// Bodies received by POST
    posts: Mutex<Vec<Value>>,
}

pub struct MockEndpoint {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockEndpoint {
    pub async fn start(status: Value) -> Self {
        let shared = Arc::new(Shared {
            status: Mutex::new(status),
            post_status: Mutex::new(StatusCode::OK),
            posts: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/light", get(get_status).post(post_command))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, shared }
    }

    pub fn url(&self) -> String {
        format!("http://{}/light", self.addr)
    }

    pub fn set_status(&self, status: Value) {
        *self.shared.status.lock().unwrap() = status;
    }

    pub fn respond_to_posts_with(&self, code: StatusCode) {
        *self.shared.post_status.lock().unwrap() = code;
    }

    pub fn posts(&self) -> Vec<Value> {
        self.shared.posts.lock().unwrap().clone()
    }
}

async fn get_status(State(shared): State<Arc<Shared>>) -> Json<Value> {
    Json(shared.status.lock().unwrap().clone())
}

async fn post_command(State(shared): State<Arc<Shared>>, Json(body): Json<Value>) -> StatusCode {
    shared.posts.lock().unwrap().push(body);
    *shared.post_status.lock().unwrap()
}

/// A URL on which nothing is listening
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/light", addr)
}
