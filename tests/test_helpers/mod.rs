//! Shared helpers for integration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};
use feebell::delivery::crypto::decrypt;
use feebell::delivery::domain::NotificationPayload;
use feebell::subscription::domain::{AuthSecret, TenantId, UserId};
use feebell::subscription::services::{
    BrowserSubscription, BrowserSubscriptionKeys, SubscribeRequest,
};
use p256::SecretKey;
use p256::elliptic_curve::rand_core::{OsRng, RngCore};
use p256::elliptic_curve::sec1::ToEncodedPoint;

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Guard that applies a scoped environment variable update.
pub struct EnvVarGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Sets multiple environment variables for the guard lifetime.
    pub fn set_many(changes: &[(OsString, Option<OsString>)]) -> Self {
        let lock = env_lock();
        let mut previous = Vec::with_capacity(changes.len());

        for (key, value) in changes {
            previous.push((key.clone(), env::var_os(key)));
            unsafe {
                // SAFETY: the global mutex serializes environment mutations in tests.
                match value {
                    Some(new_value) => env::set_var(key, new_value),
                    None => env::remove_var(key),
                }
            }
        }

        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            unsafe {
                // SAFETY: the global mutex serializes environment mutations in tests.
                match value {
                    Some(previous) => env::set_var(&key, &previous),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A browser that subscribed to push and keeps its private keys.
pub struct SimulatedBrowser {
    secret: SecretKey,
    auth: [u8; 16],
    endpoint: String,
}

impl SimulatedBrowser {
    /// Creates a browser with fresh keys for an endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let mut auth = [0_u8; 16];
        OsRng.fill_bytes(&mut auth);
        Self {
            secret: SecretKey::random(&mut OsRng),
            auth,
            endpoint: endpoint.into(),
        }
    }

    /// Returns the push endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns what `PushSubscription.toJSON()` would produce.
    pub fn subscription_json(&self) -> BrowserSubscription {
        BrowserSubscription {
            endpoint: self.endpoint.clone(),
            keys: BrowserSubscriptionKeys {
                p256dh: BASE64URL.encode(self.secret.public_key().to_encoded_point(false)),
                auth: BASE64URL.encode(self.auth),
            },
        }
    }

    /// Builds a subscribe request for this browser.
    pub fn subscribe_request(
        &self,
        owner_id: UserId,
        tenant_id: Option<TenantId>,
    ) -> SubscribeRequest {
        let request = SubscribeRequest::from_browser(owner_id, self.subscription_json());
        tenant_id
            .into_iter()
            .fold(request, SubscribeRequest::with_tenant)
    }

    /// Decrypts a push message body and parses the notification inside.
    ///
    /// # Errors
    ///
    /// Returns an error when the body cannot be decrypted or parsed.
    pub fn open(&self, body: &[u8]) -> Result<NotificationPayload, eyre::Report> {
        let auth_secret = AuthSecret::from_bytes(&self.auth)?;
        let plaintext = decrypt(body, &self.secret, &auth_secret)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}
