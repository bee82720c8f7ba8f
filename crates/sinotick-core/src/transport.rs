use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{TransportError, TransportFailure};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::provider_policy::ProviderPolicy;
use crate::retry::{RetryPolicy, RetryState};
use crate::throttling::ProviderGate;
use crate::ProviderId;

/// Resilient transport shared by every adapter.
///
/// One call = pacing gate, then the retry state machine over the HTTP
/// client. Only 2xx responses come back; anything else settles into a
/// [`TransportError`] carrying the attempt count and the final cause.
/// All waits are tokio sleeps, so dropping the returned future cancels
/// the exchange without leaking a retry loop.
#[derive(Clone)]
pub struct Transport {
    client: Arc<dyn HttpClient>,
    gate: ProviderGate,
    policies: HashMap<ProviderId, ProviderPolicy>,
    timeout_override_ms: Option<u64>,
}

impl Transport {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self::with_policies(client, ProviderPolicy::defaults())
    }

    pub fn with_policies(client: Arc<dyn HttpClient>, policies: Vec<ProviderPolicy>) -> Self {
        let gate = ProviderGate::new(&policies);
        let policies = policies
            .into_iter()
            .map(|policy| (policy.provider, policy))
            .collect();

        Self {
            client,
            gate,
            policies,
            timeout_override_ms: None,
        }
    }

    /// Caller-supplied timeout that wins over the adapters' per-endpoint
    /// defaults.
    pub fn with_timeout_override_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_override_ms = timeout_ms;
        self
    }

    pub async fn execute(
        &self,
        provider: ProviderId,
        mut request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        if let Some(timeout_ms) = self.timeout_override_ms {
            request.timeout_ms = timeout_ms;
        }

        self.wait_for_slot(provider).await;

        let policy = self.retry_policy(provider);
        let mut state = RetryState::Idle;
        let mut outcome: Result<HttpResponse, TransportFailure> =
            Err(TransportFailure::Other(String::from("request not attempted")));

        loop {
            state = match state {
                RetryState::Idle => policy.begin(),
                RetryState::Attempting { attempt } => {
                    debug!(provider = %provider, attempt, url = %request.url, "issuing request");
                    match self.attempt(&request).await {
                        Ok(response) => {
                            outcome = Ok(response);
                            policy.on_success(attempt)
                        }
                        Err(failure) => {
                            let next = policy.on_failure(attempt, &failure);
                            outcome = Err(failure);
                            next
                        }
                    }
                }
                RetryState::RetryScheduled { attempt, delay } => {
                    if let Err(failure) = &outcome {
                        warn!(
                            provider = %provider,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            %failure,
                            "transient failure, retry scheduled"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Succeeded { attempts } => {
                    debug!(provider = %provider, attempts, "request succeeded");
                    return outcome.map_err(|last| TransportError {
                        provider,
                        attempts,
                        last,
                    });
                }
                RetryState::Failed { attempts } => {
                    let last = match outcome {
                        Err(failure) => failure,
                        Ok(_) => TransportFailure::Other(String::from("retry state diverged")),
                    };
                    warn!(provider = %provider, attempts, %last, "request failed");
                    return Err(TransportError {
                        provider,
                        attempts,
                        last,
                    });
                }
            };
        }
    }

    async fn wait_for_slot(&self, provider: ProviderId) {
        loop {
            match self.gate.acquire(provider) {
                Ok(()) => return,
                Err(wait) => {
                    debug!(
                        provider = %provider,
                        wait_ms = wait.as_millis() as u64,
                        "pacing gate engaged"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    async fn attempt(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        match self.client.execute(request.clone()).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(TransportFailure::Status(response.status)),
            Err(err) => Err(TransportFailure::from(err)),
        }
    }

    fn retry_policy(&self, provider: ProviderId) -> RetryPolicy {
        self.policies
            .get(&provider)
            .map(|policy| policy.retry.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::http_client::HttpError;

    struct ScriptedHttpClient {
        script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn new(script: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().expect("seen lock").len()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>,
        > {
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

    fn unthrottled_transport(client: Arc<ScriptedHttpClient>) -> Transport {
        let policies = ProviderId::ALL
            .iter()
            .map(|provider| ProviderPolicy::unthrottled(*provider))
            .collect();
        Transport::with_policies(client, policies)
    }

    fn status(code: u16) -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse {
            status: code,
            body: String::new(),
        })
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let client = ScriptedHttpClient::new(vec![
            Err(HttpError::timeout("deadline exceeded")),
            Err(HttpError::reset("connection reset by peer")),
            Ok(HttpResponse::ok_json("{\"ok\":true}")),
        ]);
        let transport = unthrottled_transport(client.clone());

        let response = transport
            .execute(ProviderId::Tencent, HttpRequest::get("https://q.test/a"))
            .await
            .expect("third attempt must succeed");

        assert_eq!(response.status, 200);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn exhaustion_reports_the_attempt_budget() {
        let client = ScriptedHttpClient::new(vec![
            Err(HttpError::timeout("t1")),
            Err(HttpError::timeout("t2")),
            Err(HttpError::timeout("t3")),
            Err(HttpError::timeout("t4")),
        ]);
        let transport = unthrottled_transport(client.clone());

        let err = transport
            .execute(ProviderId::Tencent, HttpRequest::get("https://q.test/a"))
            .await
            .expect_err("retries must be exhausted");

        assert_eq!(err.attempts, 4);
        assert_eq!(err.last, TransportFailure::Timeout);
        assert_eq!(client.calls(), 4);
    }

    #[tokio::test]
    async fn non_retryable_status_fails_without_a_second_call() {
        let client = ScriptedHttpClient::new(vec![status(404)]);
        let transport = unthrottled_transport(client.clone());

        let err = transport
            .execute(ProviderId::EastMoney, HttpRequest::get("https://q.test/a"))
            .await
            .expect_err("404 is not retryable");

        assert_eq!(err.attempts, 1);
        assert_eq!(err.last, TransportFailure::Status(404));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn forbidden_is_treated_as_a_rate_limit_ban() {
        let client = ScriptedHttpClient::new(vec![status(403), status(200)]);
        let transport = unthrottled_transport(client.clone());

        let response = transport
            .execute(ProviderId::EastMoney, HttpRequest::get("https://q.test/a"))
            .await
            .expect("second attempt must succeed");

        assert_eq!(response.status, 200);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn timeout_override_rewrites_adapter_defaults() {
        let client = ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json("{}"))]);
        let transport = unthrottled_transport(client.clone()).with_timeout_override_ms(Some(2_000));

        transport
            .execute(
                ProviderId::Tencent,
                HttpRequest::get("https://q.test/a").with_timeout_ms(15_000),
            )
            .await
            .expect("must succeed");

        let seen = client.seen.lock().expect("seen lock");
        assert_eq!(seen[0].timeout_ms, 2_000);
    }
}
