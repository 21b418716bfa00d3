//! Feed configuration loaded from the environment
//!
//! Required:
//! - `API_KEY`, `SECRET_KEY`, `PASSPHRASE`, `SVC_ACCOUNTID`
//!
//! Optional:
//! - `PRIME_WS_URL` (default `wss://ws-feed.prime.coinbase.com`)
//! - `PRIME_PRODUCT_IDS` comma separated (default `BTC-USD`)
//! - `PRIME_MAX_RECONNECT_ATTEMPTS` (default 10)
//! - `PRIME_INITIAL_RECONNECT_DELAY_MS` (default 1000)
//! - `PRIME_CONNECT_TIMEOUT_SECS` (default 30)

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use url::Url;

use bba_core::{FeedError, FeedResult};

use crate::auth::Credentials;

/// Coinbase Prime market-data WebSocket endpoint
pub const PRIME_WS_URL: &str = "wss://ws-feed.prime.coinbase.com";

/// Level-2 channel name
pub const L2_CHANNEL: &str = "l2_data";

/// Max reconnect attempts
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// First backoff delay
pub const INITIAL_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// How long a connect may take before it counts as failed
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// The venue rejects subscriptions with more products than this
pub const MAX_PRODUCTS_PER_CONNECTION: usize = 10;

const REQUIRED_VARS: [&str; 4] = ["API_KEY", "SECRET_KEY", "PASSPHRASE", "SVC_ACCOUNTID"];

/// Everything the supervisor needs to run one feed session
#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub ws_url: String,
    pub channel: String,
    pub credentials: Credentials,
    pub product_ids: Vec<String>,
    pub max_reconnect_attempts: u32,
    pub initial_reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl FeedConfig {
    /// Config with default tunables for the given credentials and products
    pub fn new(credentials: Credentials, product_ids: Vec<String>) -> Self {
        Self {
            ws_url: PRIME_WS_URL.to_string(),
            channel: L2_CHANNEL.to_string(),
            credentials,
            product_ids,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            initial_reconnect_delay: INITIAL_RECONNECT_DELAY,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> FeedResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Every missing required variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> FeedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<String> = REQUIRED_VARS
            .into_iter()
            .filter(|&name| get(name).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(FeedError::MissingEnv(missing));
        }

        let credentials = Credentials::new(
            get("API_KEY").unwrap_or_default(),
            get("SECRET_KEY").unwrap_or_default(),
            get("PASSPHRASE").unwrap_or_default(),
            get("SVC_ACCOUNTID").unwrap_or_default(),
        );

        let product_ids: Vec<String> = match get("PRIME_PRODUCT_IDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
            None => vec!["BTC-USD".to_string()],
        };
        if product_ids.is_empty() {
            return Err(FeedError::config("PRIME_PRODUCT_IDS contains no product ids"));
        }
        if product_ids.len() > MAX_PRODUCTS_PER_CONNECTION {
            warn!(
                "{} products configured; the venue accepts at most {} per connection",
                product_ids.len(),
                MAX_PRODUCTS_PER_CONNECTION
            );
        }

        let ws_url = get("PRIME_WS_URL").unwrap_or_else(|| PRIME_WS_URL.to_string());
        validate_ws_url(&ws_url)?;

        let max_reconnect_attempts =
            parse_var(&get, "PRIME_MAX_RECONNECT_ATTEMPTS")?.unwrap_or(MAX_RECONNECT_ATTEMPTS);
        let initial_reconnect_delay = parse_var::<u64>(&get, "PRIME_INITIAL_RECONNECT_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(INITIAL_RECONNECT_DELAY);
        let connect_timeout = parse_var::<u64>(&get, "PRIME_CONNECT_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(CONNECT_TIMEOUT);

        Ok(Self {
            ws_url,
            channel: L2_CHANNEL.to_string(),
            credentials,
            product_ids,
            max_reconnect_attempts,
            initial_reconnect_delay,
            connect_timeout,
        })
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, name: &str) -> FeedResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| FeedError::config(format!("Invalid {}='{}': {}", name, raw, e)))
        })
        .transpose()
}

fn validate_ws_url(raw: &str) -> FeedResult<()> {
    let url = Url::parse(raw)
        .map_err(|e| FeedError::config(format!("Invalid PRIME_WS_URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(FeedError::config(format!(
            "PRIME_WS_URL must use ws or wss, got '{}'",
            other
        ))),
    }
}
