//! Controllable token issuer and mode source mocks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use net_controller::errors::NetError;
use net_controller::session::{
    ConnectionMode, MintError, MintedToken, ModeSource, TokenMinter,
};

/// Mock token issuer: succeeds by default, can be told to fail with a given
/// provider message or to delay each mint.
#[derive(Debug, Clone, Default)]
pub struct MockMinter {
    inner: Arc<Mutex<MinterInner>>,
}

#[derive(Debug, Default)]
struct MinterInner {
    fail_with: Option<String>,
    delay: Option<Duration>,
    mints: u64,
    last_request: Option<(String, String)>,
}

impl MockMinter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A minter that fails every mint with the given provider message.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let minter = Self::default();
        minter.inner.lock().unwrap().fail_with = Some(message.into());
        minter
    }

    /// Delay every mint, for cancellation/fencing tests.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.inner.lock().unwrap().delay = Some(delay);
        self
    }

    /// Flip failure behavior at runtime.
    pub fn set_failing(&self, message: Option<String>) {
        self.inner.lock().unwrap().fail_with = message;
    }

    /// Number of mint calls observed (including failures).
    #[must_use]
    pub fn mint_count(&self) -> u64 {
        self.inner.lock().unwrap().mints
    }

    /// The `(room_name, identity)` of the most recent mint call.
    #[must_use]
    pub fn last_request(&self) -> Option<(String, String)> {
        self.inner.lock().unwrap().last_request.clone()
    }
}

#[async_trait]
impl TokenMinter for MockMinter {
    async fn mint(&self, room_name: &str, identity: &str) -> Result<MintedToken, MintError> {
        let (fail_with, delay, count) = {
            let mut inner = self.inner.lock().unwrap();
            inner.mints += 1;
            inner.last_request = Some((room_name.to_string(), identity.to_string()));
            (inner.fail_with.clone(), inner.delay, inner.mints)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match fail_with {
            Some(message) => Err(MintError(message)),
            None => Ok(MintedToken {
                value: format!("mock-token-{count}"),
            }),
        }
    }
}

/// Mode source whose value and availability can be flipped mid-test.
#[derive(Debug, Clone)]
pub struct SwitchableModeSource {
    inner: Arc<Mutex<ModeInner>>,
}

#[derive(Debug)]
struct ModeInner {
    mode: ConnectionMode,
    failing: bool,
    fetches: u64,
}

impl SwitchableModeSource {
    #[must_use]
    pub fn new(mode: ConnectionMode) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ModeInner {
                mode,
                failing: false,
                fetches: 0,
            })),
        }
    }

    pub fn set_mode(&self, mode: ConnectionMode) {
        self.inner.lock().unwrap().mode = mode;
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }

    /// Number of fetches observed, for cache assertions.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.inner.lock().unwrap().fetches
    }
}

#[async_trait]
impl ModeSource for SwitchableModeSource {
    async fn current_mode(&self) -> Result<ConnectionMode, NetError> {
        let mut inner = self.inner.lock().unwrap();
        inner.fetches += 1;
        if inner.failing {
            Err(NetError::Internal("mode source unavailable".to_string()))
        } else {
            Ok(inner.mode)
        }
    }
}
