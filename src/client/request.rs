//! MCP Client Request Management
//!
//! This module implements the request tracking and correlation system for the MCP client.
//! It generates request IDs, tracks pending requests, and matches responses to their
//! corresponding requests.

use std::collections::HashMap;
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError, atomic::{ AtomicI64, Ordering } };
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::{ Instant, sleep_until, timeout_at };
use tracing::{ debug, warn };

use crate::errors::Error;
use crate::messages::{ Request, RequestId, Response };
use crate::transport::Transport;

type PendingMap = HashMap<RequestId, oneshot::Sender<Response>>;

fn lock(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Manager for handling requests and correlating them with responses
pub struct RequestManager {
    /// Counter for generating unique request IDs
    request_id_counter: AtomicI64,

    /// Map of pending requests by their ID
    pending_requests: Arc<Mutex<PendingMap>>,

    /// Default timeout for requests
    default_timeout: Duration,
}

impl RequestManager {
    /// Create a new request manager
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            request_id_counter: AtomicI64::new(1),
            pending_requests: Arc::new(Mutex::new(HashMap::new())),
            default_timeout,
        }
    }

    /// Timeout applied when a call does not supply one
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Generate a new unique request ID
    pub fn generate_id(&self) -> RequestId {
        self.request_id_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Register a pending request and get a receiver for its response
    pub fn register_request(&self, id: RequestId) -> oneshot::Receiver<Response> {
        let (tx, rx) = oneshot::channel();
        lock(&self.pending_requests).insert(id, tx);
        rx
    }

    /// Deposit a response into its pending slot
    ///
    /// Returns false when no request with that id is waiting.
    pub fn complete_request(&self, response: Response) -> bool {
        let Some(id) = response.id else {
            warn!("Dropping response without id");
            return false;
        };

        let sender = lock(&self.pending_requests).remove(&id);
        match sender {
            Some(sender) => {
                if sender.send(response).is_err() {
                    debug!("Request {} was abandoned before its response arrived", id);
                    return false;
                }
                debug!("Completed request {}", id);
                true
            }
            None => {
                warn!("Received response for unknown request ID: {}", id);
                false
            }
        }
    }

    /// Number of requests still waiting
    pub fn pending_count(&self) -> usize {
        lock(&self.pending_requests).len()
    }

    /// Drop every pending slot, returning how many there were
    pub fn clear(&self) -> usize {
        let mut pending = lock(&self.pending_requests);
        let count = pending.len();
        pending.clear();
        count
    }

    /// Send a request and wait for its response
    ///
    /// The pending entry is removed on every exit path, including when the
    /// returned future is dropped. A slot cleared by `clear` is not answered
    /// early; the caller times out at its deadline.
    pub async fn send_request<T>(
        &self,
        transport: &T,
        method: &str,
        params: Option<Value>,
        timeout: Option<Duration>
    ) -> Result<Value, Error>
        where T: Transport + ?Sized
    {
        let id = self.generate_id();
        let response_rx = self.register_request(id);

        let pending = self.pending_requests.clone();
        let _cleanup = scopeguard::guard((), move |_| {
            lock(&pending).remove(&id);
        });

        transport.send(&Request::new(id, method, params).into()).await?;

        let timeout = timeout.unwrap_or(self.default_timeout);
        let deadline = Instant::now() + timeout;

        match timeout_at(deadline, response_rx).await {
            Ok(Ok(response)) => response.into_result(),
            Ok(Err(_)) => {
                sleep_until(deadline).await;
                Err(Error::Timeout(format!("{} (id {}) after {:?}", method, id, timeout)))
            }
            Err(_) => {
                warn!("Request {} ({}) timed out after {:?}", id, method, timeout);
                Err(Error::Timeout(format!("{} (id {}) after {:?}", method, id, timeout)))
            }
        }
    }
}
