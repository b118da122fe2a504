//! Stub remote store for tests.
//!
//! Serves scripted replies per `(method, path)` from a background thread
//! and records every request it sees.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tiny_http::{Header, Response, Server};

/// Scripted reply for one route.
#[derive(Debug, Clone)]
pub(crate) struct Reply {
    method: &'static str,
    path: &'static str,
    status: u16,
    body: String,
}

impl Reply {
    pub(crate) fn new(method: &'static str, path: &'static str, status: u16, body: &str) -> Self {
        Self {
            method,
            path,
            status,
            body: body.to_string(),
        }
    }

    pub(crate) fn json(
        method: &'static str,
        path: &'static str,
        status: u16,
        body: serde_json::Value,
    ) -> Self {
        Self::new(method, path, status, &body.to_string())
    }
}

/// A request as the stub saw it.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: String,
    /// Path without query string.
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl Recorded {
    pub(crate) fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

pub(crate) struct StubServer {
    server: Arc<Server>,
    addr: SocketAddr,
    log: Arc<Mutex<Vec<Recorded>>>,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    pub(crate) fn start(replies: Vec<Reply>) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let log = Arc::clone(&log);
            thread::spawn(move || serve(&server, &replies, &log))
        };

        Self {
            server,
            addr,
            log,
            handle: Some(handle),
        }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.log.lock().clone()
    }

    pub(crate) fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.log
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(server: &Server, replies: &[Reply], log: &Mutex<Vec<Recorded>>) {
    for mut request in server.incoming_requests() {
        let method = request.method().to_string();
        let (path, query) = match request.url().split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (request.url().to_string(), None),
        };
        let authorization = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Authorization"))
            .map(|h| h.value.as_str().to_string());
        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);

        log.lock().push(Recorded {
            method: method.clone(),
            path: path.clone(),
            query,
            authorization,
            body,
        });

        let reply = replies
            .iter()
            .find(|r| r.method == method && r.path == path);
        let response = match reply {
            Some(reply) => Response::from_string(reply.body.clone()).with_status_code(reply.status),
            None => Response::from_string("no route").with_status_code(404),
        };
        let content_type =
            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
        let _ = request.respond(response.with_header(content_type));
    }
}
