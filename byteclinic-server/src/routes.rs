// byteclinic-server/src/routes.rs
//
// JSON request handlers. Every route answers OPTIONS pre-flight through
// the permissive CORS layer; acceptable here because card data never
// passes through this service, only through the provider's hosted page.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use byteclinic_common::models::Caller;
use byteclinic_common::Error;
use byteclinic_core::provider::{CheckoutMode, CheckoutSessionRequest};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/functions/create-payment-code", post(create_payment_code))
        .route("/functions/verify-payment-code", post(verify_payment_code))
        .route("/functions/promote-admin", post(promote_admin))
        .route("/functions/manage-admins", post(manage_admins))
        .route("/functions/stripe-checkout", post(stripe_checkout))
        .route("/webhooks/stripe", post(stripe_webhook))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Wrapper so core errors map onto HTTP statuses in one place.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyUsed(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn caller_from_headers(state: &AppState, headers: &HeaderMap) -> Result<Caller, Error> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(Caller::Anonymous);
    };
    let value = value
        .to_str()
        .map_err(|_| Error::InvalidInput("malformed authorization header".into()))?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Ok(Caller::Anonymous);
    }
    state.sessions.verify(token).await
}

/// Accepts the price as a JSON number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Number(f64),
    Text(String),
}

impl PriceField {
    fn parse(self) -> Result<f64, Error> {
        match self {
            PriceField::Number(n) => Ok(n),
            PriceField::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::InvalidInput("invalid price".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateCodeRequest {
    price: Option<PriceField>,
    description: Option<String>,
}

async fn create_payment_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers).await?;

    let (Some(price), Some(description)) = (body.price, body.description) else {
        return Err(Error::InvalidInput("price and description are required".into()).into());
    };
    let price = price.parse()?;

    let code = state.issuance.issue(&caller, price, &description).await?;
    Ok(Json(json!({ "success": true, "code": code })))
}

#[derive(Debug, Deserialize)]
struct VerifyCodeRequest {
    code: Option<String>,
}

async fn verify_payment_code(
    State(state): State<AppState>,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(code) = body.code else {
        return Err(Error::InvalidInput("payment code is required".into()).into());
    };

    let found = state.redemption.redeem(&code).await?;
    Ok(Json(json!({ "success": true, "code": found })))
}

#[derive(Debug, Deserialize)]
struct PromoteRequest {
    #[serde(rename = "masterKey")]
    master_key: Option<String>,
}

async fn promote_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PromoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers).await?;

    let Some(master_key) = body.master_key else {
        return Err(Error::InvalidInput("master key is required".into()).into());
    };

    state.admin_gate.promote(&caller, &master_key).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Successfully promoted to admin"
    })))
}

#[derive(Debug, Deserialize)]
struct ManageAdminsRequest {
    action: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<Uuid>,
    #[serde(rename = "masterKey")]
    master_key: Option<String>,
}

async fn manage_admins(
    State(state): State<AppState>,
    Json(body): Json<ManageAdminsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(action), Some(user_id), Some(master_key)) =
        (body.action, body.user_id, body.master_key)
    else {
        return Err(
            Error::InvalidInput("action, userId and masterKey are required".into()).into(),
        );
    };

    let message = match action.as_str() {
        "add" => {
            state.admin_gate.grant(&master_key, user_id, user_id).await?;
            format!("Added {user_id} as admin")
        }
        "remove" => {
            state.admin_gate.revoke(&master_key, user_id).await?;
            format!("Removed {user_id} from admin")
        }
        _ => {
            return Err(
                Error::InvalidInput("invalid action, use \"add\" or \"remove\"".into()).into(),
            )
        }
    };

    Ok(Json(json!({ "success": true, "message": message })))
}

#[derive(Debug, Deserialize)]
struct CheckoutRequest {
    price_id: Option<String>,
    mode: Option<String>,
    success_url: Option<String>,
    cancel_url: Option<String>,
    code: Option<String>,
}

async fn stripe_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from_headers(&state, &headers).await?;

    let (Some(price_id), Some(success_url), Some(cancel_url)) =
        (body.price_id, body.success_url, body.cancel_url)
    else {
        return Err(Error::InvalidInput(
            "price_id, success_url and cancel_url are required".into(),
        )
        .into());
    };
    let mode = match body.mode.as_deref() {
        Some("payment") | None => CheckoutMode::Payment,
        Some("subscription") => CheckoutMode::Subscription,
        Some(other) => {
            return Err(Error::InvalidInput(format!("unknown checkout mode {other}")).into())
        }
    };

    let url = state
        .checkout
        .create_session(
            &caller,
            CheckoutSessionRequest {
                price_id,
                mode,
                success_url,
                cancel_url,
                reference_code: body.code,
            },
        )
        .await?;

    Ok(Json(json!({ "url": url })))
}

async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::InvalidInput("missing stripe-signature header".into()))?;

    state.webhook.handle_event(&body, signature).await?;
    Ok(Json(json!({ "received": true })))
}
