// ABOUTME: Test support utilities.
// ABOUTME: Scripted probes, fake pushers, flaky pointer backends and a local health server.

use async_trait::async_trait;
use bytes::Bytes;
use cutover::config::DeploymentConfig;
use cutover::deploy::DeploymentCoordinator;
use cutover::events::MemorySink;
use cutover::health::{HealthProbe, HealthVerifier, ProbeError, ProbeResponse};
use cutover::pointer::{
    EnvironmentPointer, EnvironmentPointerStore, MemoryPointerStore, PointerBackend, PointerError,
};
use cutover::push::{ArtifactPusher, PushError, PushTarget};
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("cutover=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Config with short timings, parsed from YAML like a real file.
#[allow(dead_code)]
pub fn test_config(extra: &str) -> DeploymentConfig {
    let yaml = format!(
        r#"
domain: example.test
switch_delay: 0s
health:
  timeout: 1s
  retries: 3
  interval: 1s
push:
  command: "true"
{extra}
"#
    );
    DeploymentConfig::from_yaml(&yaml).unwrap()
}

#[allow(dead_code)]
pub fn healthy() -> ProbeResponse {
    ProbeResponse::new(200, r#"{"status":"healthy"}"#)
}

#[allow(dead_code)]
pub fn unhealthy() -> ProbeResponse {
    ProbeResponse::new(503, r#"{"status":"unhealthy"}"#)
}

/// One scripted probe result.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Step {
    Respond(ProbeResponse),
    Fail(String),
    /// Never answers; the verifier's timeout has to fire.
    Hang,
}

/// Probe that replays a script, then keeps answering unhealthy.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    steps: Mutex<VecDeque<Step>>,
    urls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedProbe {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: ProbeResponse) -> Self {
        Self::new(std::iter::repeat_n(Step::Respond(response), 64))
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<ProbeResponse, ProbeError> {
        self.urls.lock().unwrap().push(url.to_string());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(ProbeError::Request(message)),
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(unhealthy()),
        }
    }
}

/// Pusher that records targets and fails on request.
#[derive(Debug, Default)]
pub struct FakePusher {
    pub fail_push: AtomicBool,
    pub fail_finalize: AtomicBool,
    pushes: Mutex<Vec<PushTarget>>,
    finalizes: AtomicUsize,
}

#[allow(dead_code)]
impl FakePusher {
    pub fn failing_push() -> Self {
        let pusher = Self::default();
        pusher.fail_push.store(true, Ordering::SeqCst);
        pusher
    }

    pub fn failing_finalize() -> Self {
        let pusher = Self::default();
        pusher.fail_finalize.store(true, Ordering::SeqCst);
        pusher
    }

    pub fn pushes(&self) -> Vec<PushTarget> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn finalize_count(&self) -> usize {
        self.finalizes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactPusher for FakePusher {
    async fn push(&self, target: &PushTarget) -> Result<(), PushError> {
        self.pushes.lock().unwrap().push(target.clone());
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(PushError::Rejected("registry refused the artifact".to_string()));
        }
        Ok(())
    }

    async fn finalize(&self, _target: &PushTarget) -> Result<(), PushError> {
        self.finalizes.fetch_add(1, Ordering::SeqCst);
        if self.fail_finalize.load(Ordering::SeqCst) {
            return Err(PushError::Rejected("cleanup hook failed".to_string()));
        }
        Ok(())
    }
}

/// In-memory backend whose writes can be switched off.
#[derive(Debug, Default)]
pub struct FlakyBackend {
    pub inner: MemoryPointerStore,
    pub fail_writes: AtomicBool,
}

#[allow(dead_code)]
impl FlakyBackend {
    pub fn with_active(name: &str) -> Self {
        Self {
            inner: MemoryPointerStore::with_active(name),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn active(&self) -> Option<String> {
        self.inner.snapshot().map(|p| p.active_environment)
    }
}

#[async_trait]
impl PointerBackend for FlakyBackend {
    async fn read(&self) -> Result<Option<EnvironmentPointer>, PointerError> {
        self.inner.read().await
    }

    async fn replace(&self, pointer: &EnvironmentPointer) -> Result<(), PointerError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PointerError::Unavailable {
                message: "store is read-only".to_string(),
            });
        }
        self.inner.replace(pointer).await
    }
}

/// Coordinator wired to fakes, with handles to inspect them.
#[allow(dead_code)]
pub struct Harness {
    pub coordinator: DeploymentCoordinator,
    pub backend: Arc<FlakyBackend>,
    pub probe: Arc<ScriptedProbe>,
    pub pusher: Arc<FakePusher>,
    pub events: Arc<MemorySink>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(config: DeploymentConfig, probe: ScriptedProbe, pusher: FakePusher) -> Self {
        Self::with_backend(config, probe, pusher, FlakyBackend::default())
    }

    pub fn with_backend(
        config: DeploymentConfig,
        probe: ScriptedProbe,
        pusher: FakePusher,
        backend: FlakyBackend,
    ) -> Self {
        let config = Arc::new(config);
        let backend = Arc::new(backend);
        let probe = Arc::new(probe);
        let pusher = Arc::new(pusher);
        let events = Arc::new(MemorySink::new());

        let pointer = EnvironmentPointerStore::new(backend.clone(), config.roles().clone());
        let verifier = HealthVerifier::new(config.clone(), probe.clone()).with_sink(events.clone());
        let coordinator = DeploymentCoordinator::new(config, pointer, verifier, pusher.clone())
            .with_sink(events.clone());

        Self {
            coordinator,
            backend,
            probe,
            pusher,
            events,
        }
    }

    /// Default config, healthy probe, succeeding pusher, pointer on blue.
    pub fn healthy() -> Self {
        Self::with_backend(
            test_config(""),
            ScriptedProbe::always(healthy()),
            FakePusher::default(),
            FlakyBackend::with_active("blue"),
        )
    }

    pub fn active(&self) -> Option<String> {
        self.backend.active()
    }
}

/// Local HTTP health endpoint whose answer can be toggled.
#[allow(dead_code)]
pub struct HealthServer {
    pub addr: SocketAddr,
    healthy: Arc<AtomicBool>,
    hits: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl HealthServer {
    /// Bind to an ephemeral port and serve until the runtime shuts down.
    pub async fn start(healthy: bool) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let flag = Arc::new(AtomicBool::new(healthy));
        let hits = Arc::new(AtomicUsize::new(0));

        let (server_flag, server_hits) = (flag.clone(), hits.clone());
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let (flag, hits) = (server_flag.clone(), server_hits.clone());
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let healthy = flag.load(Ordering::SeqCst);
                        hits.fetch_add(1, Ordering::SeqCst);
                        async move { Ok::<_, Infallible>(health_response(req.uri().path(), healthy)) }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self {
            addr,
            healthy: flag,
            hits,
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Value for `environments.host_template` that routes every role here.
    pub fn host_template(&self) -> String {
        self.addr.to_string()
    }
}

#[allow(dead_code)]
fn health_response(path: &str, healthy: bool) -> Response<Full<Bytes>> {
    let (status, body) = match (path, healthy) {
        ("/health", true) => (200, r#"{"status":"healthy"}"#),
        ("/health", false) => (503, r#"{"status":"unhealthy"}"#),
        _ => (404, "not found"),
    };
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}
