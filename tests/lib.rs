//! Shared fakes for the behavioral test suite.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sinotick_core::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ProviderId, ProviderPolicy, Router,
    Transport,
};

/// Deterministic HTTP fake: hands out scripted responses in order and
/// records every request it saw. An exhausted script answers `{}` so a
/// miscounted test fails in the normalizer instead of hanging.
pub struct ScriptedHttpClient {
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new(script: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Script built from successful JSON bodies only.
    pub fn ok_json(bodies: &[&str]) -> Arc<Self> {
        Self::new(
            bodies
                .iter()
                .map(|body| Ok(HttpResponse::ok_json(*body)))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().expect("seen lock").len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().expect("seen lock").clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.seen.lock().expect("seen lock").push(request);
        let next = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::ok_json("{}")));
        Box::pin(async move { next })
    }
}

/// Transport with zero pacing and instant retries for every provider.
pub fn offline_transport(client: Arc<ScriptedHttpClient>) -> Arc<Transport> {
    let policies = ProviderId::ALL
        .iter()
        .map(|provider| ProviderPolicy::unthrottled(*provider))
        .collect();
    Arc::new(Transport::with_policies(client, policies))
}

/// Fully wired router over the scripted client.
pub fn offline_router(client: Arc<ScriptedHttpClient>) -> Router {
    Router::with_default_sources(offline_transport(client))
}
