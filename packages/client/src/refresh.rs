//! Serialization of concurrent token refreshes
//!
//! When several in-flight requests fail with 401 at once, exactly one refresh
//! exchange runs. The first failure triggers it; the rest queue and are
//! replayed in arrival order with the new token once the exchange settles.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;

use crate::credentials::{CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS};
use crate::error::{ClientError, ClientResult};
use crate::models::{RefreshRequest, TokenPair};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// A request parked while a refresh is outstanding
struct PendingRequest {
    request: ApiRequest,
    tx: oneshot::Sender<ClientResult<ApiResponse>>,
}

/// Refresh progress flag plus the queue of parked requests
///
/// Invariant: the queue is only non-empty while `refreshing` is true.
#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: VecDeque<PendingRequest>,
}

/// What a 401 recovery attempt turned into, decided under the state lock
enum Role {
    /// This failure starts the exchange; the receiver delivers the new token
    /// and the request is kept out of the queue to replay itself
    Trigger {
        request: ApiRequest,
        rx: oneshot::Receiver<ClientResult<String>>,
    },
    /// An exchange is already outstanding; the receiver delivers the replay result
    Waiter(oneshot::Receiver<ClientResult<ApiResponse>>),
}

/// Serializes 401 recovery into a single refresh exchange
pub struct RefreshGate {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshGate {
    pub fn new(transport: Arc<dyn HttpTransport>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            store,
            state: Arc::new(Mutex::new(RefreshState::default())),
        }
    }

    /// Recover from an unauthorized response by refreshing and replaying
    ///
    /// The request is marked as retried before anything else so it can never
    /// re-enter the gate. Resolves with the replayed response, or with the
    /// refresh failure if the exchange could not produce a usable token.
    pub async fn recover(&self, mut request: ApiRequest) -> ClientResult<ApiResponse> {
        request.retried = true;

        // The trigger-or-queue decision and the flag flip are one critical
        // section; the lock is never held across an await.
        let role = {
            let mut state = lock_state(&self.state);
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(PendingRequest { request, tx });
                tracing::debug!(queued = state.waiters.len(), "Request parked behind refresh");
                Role::Waiter(rx)
            } else {
                state.refreshing = true;
                let (tx, rx) = oneshot::channel();
                self.spawn_exchange(tx);
                Role::Trigger { request, rx }
            }
        };

        match role {
            Role::Trigger { mut request, rx } => {
                let token = rx
                    .await
                    .map_err(|_| ClientError::session_expired("Refresh task terminated"))??;
                request.set_bearer(&token);
                self.transport.execute(&request).await
            }
            Role::Waiter(rx) => rx
                .await
                .map_err(|_| ClientError::session_expired("Refresh task terminated"))?,
        }
    }

    /// Run the exchange on its own task so a cancelled caller cannot leave the
    /// gate stuck in the refreshing state
    fn spawn_exchange(&self, trigger_tx: oneshot::Sender<ClientResult<String>>) {
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let outcome = run_exchange(transport.as_ref(), store.as_ref()).await;

            // Clear the flag and take the queue together, before settling
            // anyone, so the next 401 starts a fresh exchange.
            let waiters = {
                let mut state = lock_state(&state);
                state.refreshing = false;
                std::mem::take(&mut state.waiters)
            };

            match outcome {
                Ok(token) => {
                    tracing::info!(replayed = waiters.len() + 1, "Token refresh succeeded");
                    let _ = trigger_tx.send(Ok(token.clone()));
                    // Issuing every resubmission from this one task keeps the
                    // replays in queue order regardless of scheduler.
                    for PendingRequest { mut request, tx } in waiters {
                        request.set_bearer(&token);
                        let _ = tx.send(transport.execute(&request).await);
                    }
                }
                Err(err) => {
                    tracing::warn!(rejected = waiters.len() + 1, "Token refresh failed: {}", err);
                    if let Err(clear_err) = store.remove_all(&SESSION_KEYS).await {
                        tracing::warn!("Failed to clear credentials: {}", clear_err);
                    }
                    for waiter in waiters {
                        let _ = waiter.tx.send(Err(err.clone()));
                    }
                    let _ = trigger_tx.send(Err(err));
                }
            }
        });
    }
}

/// Exchange the stored refresh token for a new pair and persist it
///
/// Every failure here, including a missing token and a failed persist, is a
/// session-expired error: the caller cannot recover without logging in again.
async fn run_exchange(
    transport: &dyn HttpTransport,
    store: &dyn CredentialStore,
) -> ClientResult<String> {
    let refresh_token = store
        .get(REFRESH_TOKEN_KEY)
        .await
        .map_err(|e| ClientError::session_expired(format!("Could not read refresh token: {}", e)))?
        .ok_or_else(|| ClientError::session_expired("No refresh token available"))?;

    tracing::debug!("Exchanging refresh token");
    let body = serde_json::to_value(RefreshRequest { refresh_token })
        .map_err(|e| ClientError::session_expired(format!("Could not encode exchange: {}", e)))?;

    let response = transport
        .execute(&ApiRequest::post("/auth/refresh").with_body(body))
        .await
        .map_err(|e| ClientError::session_expired(format!("Refresh exchange failed: {}", e)))?;

    let pair: TokenPair = response
        .decode()
        .map_err(|e| ClientError::session_expired(format!("Malformed refresh response: {}", e)))?;

    store
        .set(ACCESS_TOKEN_KEY, &pair.access_token)
        .await
        .map_err(|e| ClientError::session_expired(format!("Could not persist tokens: {}", e)))?;
    store
        .set(REFRESH_TOKEN_KEY, &pair.refresh_token)
        .await
        .map_err(|e| ClientError::session_expired(format!("Could not persist tokens: {}", e)))?;

    Ok(pair.access_token)
}

/// Poisoning cannot corrupt the flag-and-queue pair, so recover the guard
/// rather than wedging every future request.
fn lock_state(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
