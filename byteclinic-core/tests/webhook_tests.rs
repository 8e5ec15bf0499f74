// tests/webhook_tests.rs

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use byteclinic_core::models::PaymentCode;
use byteclinic_core::repositories::PaymentCodeRepo;
use byteclinic_core::services::WebhookService;
use byteclinic_core::Error;

type HmacSha256 = Hmac<Sha256>;

const SECRET: &str = "whsec_test123secret456";

#[derive(Default)]
struct MemoryCodeRepo {
    rows: DashMap<String, PaymentCode>,
    mark_used_calls: Mutex<Vec<String>>,
}

impl MemoryCodeRepo {
    fn seed(&self, code: &str, used: bool) {
        let mut row = PaymentCode::new(code, 10.0, "seeded", "price_seeded");
        row.used = used;
        self.rows.insert(code.to_string(), row);
    }
}

#[async_trait]
impl PaymentCodeRepo for MemoryCodeRepo {
    async fn create(&self, code: &PaymentCode) -> Result<(), Error> {
        self.rows.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<PaymentCode>, Error> {
        Ok(self.rows.get(code).map(|r| r.clone()))
    }

    async fn mark_used(&self, code: &str) -> Result<(), Error> {
        self.mark_used_calls.lock().unwrap().push(code.to_string());
        if let Some(mut row) = self.rows.get_mut(code) {
            row.used = true;
        }
        Ok(())
    }

    async fn delete(&self, payment_code_id: Uuid) -> Result<(), Error> {
        self.rows
            .retain(|_, row| row.payment_code_id != payment_code_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PaymentCode>, Error> {
        Ok(self.rows.iter().map(|r| r.clone()).collect())
    }
}

fn sign(payload: &[u8], timestamp: i64) -> String {
    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac =
        HmacSha256::new_from_slice(SECRET.as_bytes()).expect("HMAC can take key of any size");
    mac.update(signed_payload.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn completed_event(code: &str) -> Vec<u8> {
    serde_json::json!({
        "type": "checkout.session.completed",
        "data": { "object": { "client_reference_id": code } }
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn completed_checkout_marks_code_used() -> Result<(), Error> {
    let repo = Arc::new(MemoryCodeRepo::default());
    repo.seed("SCRN4999", false);
    let service = WebhookService::new(repo.clone(), SECRET);

    let payload = completed_event("SCRN4999");
    service.handle_event(&payload, &sign(&payload, now())).await?;

    assert!(repo.get_by_code("SCRN4999").await?.unwrap().used);
    Ok(())
}

#[tokio::test]
async fn redelivered_event_does_not_retransition() -> Result<(), Error> {
    let repo = Arc::new(MemoryCodeRepo::default());
    repo.seed("SCRN4999", true);
    let service = WebhookService::new(repo.clone(), SECRET);

    let payload = completed_event("SCRN4999");
    service.handle_event(&payload, &sign(&payload, now())).await?;

    // Still used, and the repo was not asked to write again.
    assert!(repo.get_by_code("SCRN4999").await?.unwrap().used);
    assert!(repo.mark_used_calls.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn code_is_normalized_before_marking() -> Result<(), Error> {
    let repo = Arc::new(MemoryCodeRepo::default());
    repo.seed("SCRN4999", false);
    let service = WebhookService::new(repo.clone(), SECRET);

    let payload = completed_event(" scrn4999 ");
    service.handle_event(&payload, &sign(&payload, now())).await?;

    assert!(repo.get_by_code("SCRN4999").await?.unwrap().used);
    Ok(())
}

#[tokio::test]
async fn metadata_code_is_a_fallback_reference() -> Result<(), Error> {
    let repo = Arc::new(MemoryCodeRepo::default());
    repo.seed("SCRN4999", false);
    let service = WebhookService::new(repo.clone(), SECRET);

    let payload = serde_json::json!({
        "type": "checkout.session.completed",
        "data": { "object": { "metadata": { "code": "SCRN4999" } } }
    })
    .to_string()
    .into_bytes();
    service.handle_event(&payload, &sign(&payload, now())).await?;

    assert!(repo.get_by_code("SCRN4999").await?.unwrap().used);
    Ok(())
}

#[tokio::test]
async fn unknown_code_is_acknowledged_without_writes() -> Result<(), Error> {
    // Retrying the delivery cannot fix an unknown reference, so the event
    // is accepted and only logged.
    let repo = Arc::new(MemoryCodeRepo::default());
    let service = WebhookService::new(repo.clone(), SECRET);

    let payload = completed_event("NOPENOPE");
    service.handle_event(&payload, &sign(&payload, now())).await?;

    assert!(repo.mark_used_calls.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn unrelated_events_are_ignored() -> Result<(), Error> {
    let repo = Arc::new(MemoryCodeRepo::default());
    repo.seed("SCRN4999", false);
    let service = WebhookService::new(repo.clone(), SECRET);

    let payload = serde_json::json!({
        "type": "invoice.paid",
        "data": { "object": { "client_reference_id": "SCRN4999" } }
    })
    .to_string()
    .into_bytes();
    service.handle_event(&payload, &sign(&payload, now())).await?;

    assert!(!repo.get_by_code("SCRN4999").await?.unwrap().used);
    Ok(())
}

#[tokio::test]
async fn tampered_payload_is_rejected() {
    let repo = Arc::new(MemoryCodeRepo::default());
    repo.seed("SCRN4999", false);
    let service = WebhookService::new(repo.clone(), SECRET);

    let payload = completed_event("SCRN4999");
    let header = sign(&payload, now());
    let tampered = completed_event("OTHRCODE");

    let r = service.handle_event(&tampered, &header).await;
    assert!(matches!(r, Err(Error::Unauthenticated(_))));
    assert!(!repo.get_by_code("SCRN4999").await.unwrap().unwrap().used);
}

#[tokio::test]
async fn stale_timestamp_is_rejected() {
    let repo = Arc::new(MemoryCodeRepo::default());
    let service = WebhookService::new(repo, SECRET);

    let payload = completed_event("SCRN4999");
    // Ten minutes old, beyond the five-minute tolerance.
    let header = sign(&payload, now() - 600);

    let r = service.handle_event(&payload, &header).await;
    assert!(matches!(r, Err(Error::Unauthenticated(_))));
}

#[tokio::test]
async fn malformed_signature_header_is_rejected() {
    let repo = Arc::new(MemoryCodeRepo::default());
    let service = WebhookService::new(repo, SECRET);

    let payload = completed_event("SCRN4999");
    for header in ["", "v1=abcdef", "t=notanumber,v1=abcdef"] {
        let r = service.handle_event(&payload, header).await;
        assert!(matches!(r, Err(Error::Unauthenticated(_))), "header {header:?}");
    }
}
