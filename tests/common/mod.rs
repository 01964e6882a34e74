#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use ebook_portal::{
    PortalApi,
    session::{Navigator, Session},
    storage::MemoryStore,
};
use poem::{
    Endpoint, EndpointExt, IntoResponse, Response, Route, Server, http::StatusCode,
    listener::TcpAcceptor,
};
use serde_json::Value;

/// One request as the fake backend saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Seen {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Debug, Default)]
pub struct Recorder {
    requests: Mutex<Vec<Seen>>,
}

impl Recorder {
    pub fn all(&self) -> Vec<Seen> {
        self.requests.lock().unwrap().clone()
    }

    pub fn only(&self) -> Seen {
        let all = self.all();
        assert_eq!(all.len(), 1, "expected exactly one request, got {all:?}");
        all.into_iter().next().unwrap()
    }
}

pub struct FakeBackend {
    pub origin: String,
    pub recorder: Arc<Recorder>,
}

/// Serve `route` on an ephemeral port, recording every request before it is handled.
pub async fn spawn(route: Route) -> FakeBackend {
    let recorder = Arc::new(Recorder::default());
    let rec = recorder.clone();
    let app = route.around(move |ep, mut req| {
        let rec = rec.clone();
        async move {
            let body = req.take_body().into_vec().await?;
            {
                let header = |name: &str| {
                    req.headers()
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                let seen = Seen {
                    method: req.method().to_string(),
                    path: req.uri().path().to_string(),
                    query: req.uri().query().map(str::to_string),
                    authorization: header("authorization"),
                    content_type: header("content-type"),
                    body: body.clone(),
                };
                rec.requests.lock().unwrap().push(seen);
            }
            req.set_body(body);
            Ok(ep.call(req).await?.into_response())
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = TcpAcceptor::from_tokio(listener).unwrap();
    tokio::spawn(Server::new_with_acceptor(acceptor).run(app));

    FakeBackend {
        origin: format!("http://{addr}"),
        recorder,
    }
}

pub fn json(status: StatusCode, body: Value) -> Response {
    Response::builder()
        .status(status)
        .content_type("application/json")
        .body(body.to_string())
}

#[derive(Debug)]
pub struct RecordingNavigator {
    route: Mutex<String>,
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn new(route: &str) -> Arc<Self> {
        Arc::new(RecordingNavigator {
            route: Mutex::new(route.to_string()),
            redirects: AtomicUsize::new(0),
        })
    }

    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }

    pub fn route(&self) -> String {
        self.route.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_route(&self) -> String {
        self.route()
    }

    fn redirect(&self, route: &str) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
        *self.route.lock().unwrap() = route.to_string();
    }
}

pub struct Harness {
    pub api: PortalApi,
    pub session: Session,
    pub store: Arc<MemoryStore>,
    pub navigator: Arc<RecordingNavigator>,
}

/// Client pointed at `origin` with the given keys preloaded into the session store.
pub fn harness(origin: &str, values: &[(&str, &str)], timeout: Duration) -> Harness {
    harness_at(origin, values, timeout, "/admin/ebooks")
}

/// Same as [`harness`], with the navigator starting on `route`.
pub fn harness_at(
    origin: &str,
    values: &[(&str, &str)],
    timeout: Duration,
    route: &str,
) -> Harness {
    let store = Arc::new(MemoryStore::with_values(values.iter().copied()));
    let navigator = RecordingNavigator::new(route);
    let session = Session::new(store.clone(), navigator.clone(), "/login");
    // the origin is given with an /api suffix to exercise the stripping
    let api = PortalApi::new(&format!("{origin}/api/"), session.clone(), timeout).unwrap();
    Harness {
        api,
        session,
        store,
        navigator,
    }
}

pub const ADMIN_USER: &str = r#"{"_id":"u1","name":"Ada","email":"ada@example.com","role":"admin"}"#;
