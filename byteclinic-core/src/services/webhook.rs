// byteclinic-core/src/services/webhook.rs
//
// Payment-confirmation webhook from the provider. This is the only
// writer of the used flag: a completed checkout session carrying a
// redemption code flips it true, exactly once. Issuance, redemption and
// checkout-session creation never touch it.

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{info, warn};

use crate::codegen::normalize_code;
use crate::repositories::PaymentCodeRepo;
use crate::Error;

type HmacSha256 = Hmac<Sha256>;

/// Events older than this are rejected as replays.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Deserialize)]
struct ProviderEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: ProviderEventData,
}

#[derive(Debug, Deserialize)]
struct ProviderEventData {
    object: ProviderEventObject,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProviderEventObject {
    client_reference_id: Option<String>,
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ProviderEventObject {
    fn code(&self) -> Option<&str> {
        self.client_reference_id.as_deref().or_else(|| {
            self.metadata
                .as_ref()
                .and_then(|m| m.get("code"))
                .and_then(|v| v.as_str())
        })
    }
}

pub struct WebhookService {
    codes: Arc<dyn PaymentCodeRepo + Send + Sync>,
    signing_secret: String,
}

impl WebhookService {
    pub fn new(codes: Arc<dyn PaymentCodeRepo + Send + Sync>, signing_secret: &str) -> Self {
        Self {
            codes,
            signing_secret: signing_secret.to_string(),
        }
    }

    /// Verify the `t=...,v1=...` signature header and apply the event.
    pub async fn handle_event(&self, payload: &[u8], signature_header: &str) -> Result<(), Error> {
        self.verify_signature_at(payload, signature_header, Utc::now().timestamp())?;

        let event: ProviderEvent = serde_json::from_slice(payload)?;
        if event.event_type != "checkout.session.completed" {
            info!("ignoring provider event {}", event.event_type);
            return Ok(());
        }

        let Some(code) = event.data.object.code() else {
            warn!("completed checkout session carried no redemption code");
            return Ok(());
        };
        let code = normalize_code(code);

        match self.codes.get_by_code(&code).await? {
            Some(found) if found.used => {
                // Redelivered event; the transition already happened.
                info!("payment code {} already marked used", code);
            }
            Some(_) => {
                self.codes.mark_used(&code).await?;
                info!("payment code {} marked used after completed payment", code);
            }
            None => {
                // Retrying the delivery cannot fix an unknown code, so
                // acknowledge and leave a trace.
                warn!("completed payment referenced unknown code {}", code);
            }
        }
        Ok(())
    }

    fn verify_signature_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<(), Error> {
        let mut timestamp: Option<i64> = None;
        let mut signatures: Vec<&str> = Vec::new();
        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            Error::Unauthenticated("malformed webhook signature header".into())
        })?;
        if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(Error::Unauthenticated(
                "webhook signature timestamp outside tolerance".into(),
            ));
        }

        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|e| Error::Config(format!("webhook secret unusable: {e}")))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if signatures.iter().any(|sig| constant_time_eq(sig, &expected)) {
            Ok(())
        } else {
            Err(Error::Unauthenticated("webhook signature mismatch".into()))
        }
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
