//! Subscription authentication for the Prime WebSocket feed
//!
//! Subscribe requests carry an HMAC-SHA256 signature over
//! `{channel}{api_key}{account_id}{timestamp}{product_ids...}` keyed with the
//! raw secret, base64 (standard alphabet) encoded.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use bba_core::{FeedError, FeedResult};

use crate::types::SubscribeRequest;

type HmacSha256 = Hmac<Sha256>;

/// API credentials for the authenticated feed
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    pub account_id: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            passphrase: passphrase.into(),
            account_id: account_id.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Compute the subscription signature.
///
/// Deterministic for identical inputs. Only an empty secret is rejected.
pub fn sign(
    channel: &str,
    api_key: &str,
    secret_key: &str,
    account_id: &str,
    timestamp: &str,
    product_ids: &[String],
) -> FeedResult<String> {
    if secret_key.trim().is_empty() {
        return Err(FeedError::signing("secret key is empty"));
    }

    let mut message = String::with_capacity(
        channel.len() + api_key.len() + account_id.len() + timestamp.len() + 16 * product_ids.len(),
    );
    message.push_str(channel);
    message.push_str(api_key);
    message.push_str(account_id);
    message.push_str(timestamp);
    for id in product_ids {
        message.push_str(id);
    }

    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| FeedError::signing(format!("Failed to create HMAC: {}", e)))?;
    mac.update(message.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build a signed subscribe request for the given timestamp (unix seconds)
pub fn build_subscribe_request(
    credentials: &Credentials,
    channel: &str,
    product_ids: &[String],
    timestamp: i64,
) -> FeedResult<SubscribeRequest> {
    let timestamp = timestamp.to_string();
    let signature = sign(
        channel,
        &credentials.api_key,
        &credentials.secret_key,
        &credentials.account_id,
        &timestamp,
        product_ids,
    )?;

    Ok(SubscribeRequest {
        msg_type: "subscribe".to_string(),
        channel: channel.to_string(),
        access_key: credentials.api_key.clone(),
        api_key_id: credentials.account_id.clone(),
        timestamp,
        passphrase: credentials.passphrase.clone(),
        signature,
        product_ids: product_ids.to_vec(),
    })
}

/// JSON text of a signed subscribe request
pub fn build_subscribe_message(
    credentials: &Credentials,
    channel: &str,
    product_ids: &[String],
    timestamp: i64,
) -> FeedResult<String> {
    let request = build_subscribe_request(credentials, channel, product_ids, timestamp)?;
    serde_json::to_string(&request)
        .map_err(|e| FeedError::signing(format!("Failed to serialize subscribe request: {}", e)))
}

/// Subscribe message signed with the current wall-clock time
pub fn subscribe_message_now(
    credentials: &Credentials,
    channel: &str,
    product_ids: &[String],
) -> FeedResult<String> {
    build_subscribe_message(credentials, channel, product_ids, Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products() -> Vec<String> {
        vec!["BTC-USD".to_string()]
    }

    fn sig(ts: &str) -> String {
        sign("l2_data", "test_key", "test_secret", "test_account", ts, &products()).unwrap()
    }

    #[test]
    fn test_signature_is_deterministic() {
        let first = sig("1234567890");
        let second = sig("1234567890");
        assert_eq!(first, second);
        // 32-byte MAC, padded base64
        assert_eq!(first.len(), 44);
        assert!(STANDARD.decode(&first).is_ok());
    }

    #[test]
    fn test_matches_manual_hmac_over_concatenation() {
        let mut mac = HmacSha256::new_from_slice(b"test_secret").unwrap();
        mac.update(b"l2_datatest_keytest_account1234567890BTC-USD");
        let expected = STANDARD.encode(mac.finalize().into_bytes());

        assert_eq!(sig("1234567890"), expected);
    }

    #[test]
    fn test_every_field_changes_signature() {
        let base = sig("1234567890");
        let p = products();

        assert_ne!(base, sig("1234567891"));
        assert_ne!(base, sign("l2_datx", "test_key", "test_secret", "test_account", "1234567890", &p).unwrap());
        assert_ne!(base, sign("l2_data", "test_kez", "test_secret", "test_account", "1234567890", &p).unwrap());
        assert_ne!(base, sign("l2_data", "test_key", "test_secreu", "test_account", "1234567890", &p).unwrap());
        assert_ne!(base, sign("l2_data", "test_key", "test_secret", "test_accounu", "1234567890", &p).unwrap());
        assert_ne!(
            base,
            sign("l2_data", "test_key", "test_secret", "test_account", "1234567890", &["ETH-USD".to_string()]).unwrap()
        );
    }

    #[test]
    fn test_product_order_matters() {
        let ab = vec!["BTC-USD".to_string(), "ETH-USD".to_string()];
        let ba = vec!["ETH-USD".to_string(), "BTC-USD".to_string()];
        assert_ne!(
            sign("l2_data", "k", "s", "a", "1", &ab).unwrap(),
            sign("l2_data", "k", "s", "a", "1", &ba).unwrap()
        );
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = sign("l2_data", "k", "  ", "a", "1", &products()).unwrap_err();
        assert!(matches!(err, FeedError::Signing(_)));
    }

    #[test]
    fn test_subscribe_request_fields() {
        let creds = Credentials::new("key", "secret", "pass", "acct");
        let request = build_subscribe_request(&creds, "l2_data", &products(), 1700000000).unwrap();
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();

        assert_eq!(json["type"], "subscribe");
        assert_eq!(json["channel"], "l2_data");
        assert_eq!(json["access_key"], "key");
        assert_eq!(json["api_key_id"], "acct");
        assert_eq!(json["timestamp"], "1700000000");
        assert_eq!(json["passphrase"], "pass");
        assert_eq!(json["product_ids"], serde_json::json!(["BTC-USD"]));
        assert_eq!(
            json["signature"],
            sign("l2_data", "key", "secret", "acct", "1700000000", &products()).unwrap()
        );
    }

    #[test]
    fn test_subscribe_message_is_request_json() {
        let creds = Credentials::new("key", "secret", "pass", "acct");
        let text = build_subscribe_message(&creds, "l2_data", &products(), 1700000000).unwrap();
        let parsed: SubscribeRequest = serde_json::from_str(&text).unwrap();

        assert_eq!(
            parsed,
            build_subscribe_request(&creds, "l2_data", &products(), 1700000000).unwrap()
        );
        assert!(text.starts_with(r#"{"type":"subscribe","channel":"l2_data""#));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("key-123", "secret-456", "pass-789", "acct");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("key-123"));
        assert!(!debug.contains("secret-456"));
        assert!(!debug.contains("pass-789"));
        assert!(debug.contains("acct"));
    }
}
