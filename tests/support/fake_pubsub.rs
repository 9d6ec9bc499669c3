//! Minimal Pub/Sub emulator over a raw `TcpListener`.
//!
//! One request per connection (`Connection: close`). Implements the admin
//! routes the provisioner uses, with configurable page size and per-name
//! rejections.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct State {
    topics: Vec<String>,
    subscriptions: Vec<Value>,
    rejections: HashMap<String, (u16, String)>,
    page_size: usize,
    requests: Vec<RecordedRequest>,
}

pub struct FakePubSub {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    handle: JoinHandle<()>,
}

impl FakePubSub {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State {
            page_size: 100,
            ..State::default()
        }));

        let shared = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let state = Arc::clone(&shared);
                tokio::spawn(async move {
                    let _ = serve(socket, state).await;
                });
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// `host:port` to put in the config document.
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    pub fn set_page_size(&self, size: usize) {
        self.state.lock().page_size = size.max(1);
    }

    pub fn reject(&self, name: &str, status: u16, message: &str) {
        self.state
            .lock()
            .rejections
            .insert(name.to_string(), (status, message.to_string()));
    }

    pub fn seed_topic(&self, project: &str, name: &str) {
        self.state
            .lock()
            .topics
            .push(format!("projects/{project}/topics/{name}"));
    }

    pub fn topics(&self) -> Vec<String> {
        self.state.lock().topics.clone()
    }

    pub fn subscription(&self, name: &str) -> Option<Value> {
        self.state
            .lock()
            .subscriptions
            .iter()
            .find(|s| s["name"].as_str().is_some_and(|n| n.ends_with(&format!("/{name}"))))
            .cloned()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn count(&self, method: &str, path_prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(path_prefix))
            .count()
    }
}

impl Drop for FakePubSub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut socket: TcpStream, state: Arc<Mutex<State>>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or("/").to_string();
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target, None),
    };
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let request = RecordedRequest {
        method,
        path,
        query,
        body,
    };
    let (status, payload) = {
        let mut state = state.lock();
        state.requests.push(request.clone());
        route(&mut state, &request)
    };

    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Error",
    };
    let body = payload.to_string();
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn error(status: u16, code: &str, message: &str) -> (u16, Value) {
    (
        status,
        json!({"error": {"code": status, "message": message, "status": code}}),
    )
}

fn route(state: &mut State, request: &RecordedRequest) -> (u16, Value) {
    let segments: Vec<&str> = request.path.trim_matches('/').split('/').collect();
    match (request.method.as_str(), segments.as_slice()) {
        ("GET", [""]) => (200, json!("Ok")),
        ("PUT", ["v1", "projects", project, "topics", name]) => {
            if !is_valid_name(name) {
                return error(400, "INVALID_ARGUMENT", "Invalid resource name");
            }
            if let Some((status, message)) = state.rejections.get(*name) {
                return error(*status, "INVALID_ARGUMENT", message);
            }
            let full = format!("projects/{project}/topics/{name}");
            if state.topics.contains(&full) {
                return error(409, "ALREADY_EXISTS", "Topic already exists");
            }
            state.topics.push(full.clone());
            (200, json!({ "name": full }))
        }
        ("PUT", ["v1", "projects", project, "subscriptions", name]) => {
            if !is_valid_name(name) {
                return error(400, "INVALID_ARGUMENT", "Invalid resource name");
            }
            if let Some((status, message)) = state.rejections.get(*name) {
                return error(*status, "INVALID_ARGUMENT", message);
            }
            let full = format!("projects/{project}/subscriptions/{name}");
            if state
                .subscriptions
                .iter()
                .any(|s| s["name"].as_str() == Some(full.as_str()))
            {
                return error(409, "ALREADY_EXISTS", "Subscription already exists");
            }
            let mut body: Value = serde_json::from_str(&request.body).unwrap_or(Value::Null);
            let topic = body["topic"].as_str().unwrap_or_default().to_string();
            if !state.topics.contains(&topic) {
                return error(404, "NOT_FOUND", "Topic not found");
            }
            body["name"] = json!(full);
            state.subscriptions.push(body.clone());
            (200, body)
        }
        ("GET", ["v1", "projects", project, "topics"]) => {
            let prefix = format!("projects/{project}/");
            let all: Vec<Value> = state
                .topics
                .iter()
                .filter(|t| t.starts_with(&prefix))
                .map(|t| json!({ "name": t }))
                .collect();
            (200, page(all, "topics", state.page_size, request.query.as_deref()))
        }
        ("GET", ["v1", "projects", project, "subscriptions"]) => {
            let prefix = format!("projects/{project}/");
            let all: Vec<Value> = state
                .subscriptions
                .iter()
                .filter(|s| s["name"].as_str().is_some_and(|n| n.starts_with(&prefix)))
                .cloned()
                .collect();
            (
                200,
                page(all, "subscriptions", state.page_size, request.query.as_deref()),
            )
        }
        _ => error(404, "NOT_FOUND", "Not found"),
    }
}

/// Resource-name grammar the emulator enforces, checked on the decoded segment.
fn is_valid_name(segment: &str) -> bool {
    let name = percent_decode(segment);
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || "-_.~+%".contains(c))
}

fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| segment.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) => {
                decoded.push(byte);
                i += 3;
            }
            None => {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn page(all: Vec<Value>, key: &str, size: usize, query: Option<&str>) -> Value {
    let start = query
        .and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("pageToken=")))
        .and_then(|token| token.parse::<usize>().ok())
        .unwrap_or(0);
    let end = (start + size).min(all.len());
    let items: Vec<Value> = all.get(start..end).map(<[Value]>::to_vec).unwrap_or_default();

    let mut page = serde_json::Map::new();
    page.insert(key.to_string(), Value::Array(items));
    if end < all.len() {
        page.insert("nextPageToken".to_string(), json!(end.to_string()));
    }
    Value::Object(page)
}
