use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::tier::{self, TierPlan};
use crate::models::user::{SubscriptionStatus, SubscriptionTier, User};
use crate::services::gate;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Stripe Price ID for the chosen plan.
    pub price_id: String,
    /// Target tier: "reflect", "heal" or "thrive".
    pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionInfo {
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub remaining_trial_days: i64,
    pub stripe_customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RedeemReferralRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct RedeemReferralResponse {
    pub trial_ends_at: chrono::DateTime<Utc>,
    pub remaining_trial_days: i64,
}

/// Public pricing catalog.
pub async fn list_tiers() -> Json<&'static [TierPlan]> {
    Json(tier::catalog())
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<SubscriptionInfo>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(SubscriptionInfo {
        tier: user.tier,
        status: user.status,
        remaining_trial_days: gate::remaining_trial_days(user.trial_ends_at, Utc::now()),
        stripe_customer_id: user.stripe_customer_id,
    }))
}

/// Redeem another user's referral code for a one-week trial extension.
pub async fn redeem_referral(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<RedeemReferralRequest>,
) -> AppResult<Json<RedeemReferralResponse>> {
    let code = body.code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(AppError::Validation("Referral code is required".into()));
    }

    let referrer_id = sqlx::query_scalar::<_, uuid::Uuid>(
        "SELECT id FROM users WHERE referral_code = $1",
    )
    .bind(&code)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Referral code not found".into()))?;

    if referrer_id == auth_user.id {
        return Err(AppError::Validation("You cannot redeem your own code".into()));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let now = Utc::now();
    let new_end = gate::apply_referral_benefit(user.trial_ends_at, now);

    sqlx::query(
        "UPDATE users SET trial_ends_at = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(user.id)
    .bind(new_end)
    .execute(&state.db)
    .await?;

    tracing::info!(user_id = %user.id, referrer_id = %referrer_id, "Referral redeemed");

    Ok(Json(RedeemReferralResponse {
        trial_ends_at: new_end,
        remaining_trial_days: gate::remaining_trial_days(Some(new_end), now),
    }))
}

pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateCheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    let target = SubscriptionTier::from_plan_id(&body.plan)
        .filter(|t| t.is_paid())
        .ok_or_else(|| AppError::Validation("Unknown plan".into()))?;

    if state.config.stripe_secret_key.is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!("Stripe not configured")));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_one(&state.db)
        .await?;

    let customer_id = if let Some(cid) = &user.stripe_customer_id {
        cid.clone()
    } else {
        let client = reqwest::Client::new();
        let resp = client
            .post("https://api.stripe.com/v1/customers")
            .header(
                "Authorization",
                format!("Bearer {}", state.config.stripe_secret_key),
            )
            .form(&[("email", user.email.as_str()), ("name", user.name.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Stripe error: {}", e)))?;

        let customer: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Stripe parse error: {}", e)))?;

        let cid = customer["id"]
            .as_str()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("No customer ID from Stripe")))?
            .to_string();

        sqlx::query("UPDATE users SET stripe_customer_id = $2 WHERE id = $1")
            .bind(auth_user.id)
            .bind(&cid)
            .execute(&state.db)
            .await?;

        cid
    };

    let plan_id = body.plan.to_ascii_lowercase();
    let client = reqwest::Client::new();
    let resp = client
        .post("https://api.stripe.com/v1/checkout/sessions")
        .header(
            "Authorization",
            format!("Bearer {}", state.config.stripe_secret_key),
        )
        .form(&[
            ("customer", customer_id.as_str()),
            ("mode", "subscription"),
            ("line_items[0][price]", &body.price_id),
            ("line_items[0][quantity]", "1"),
            ("metadata[tier]", plan_id.as_str()),
            (
                "success_url",
                &format!("{}/subscription?success=true", state.config.frontend_url),
            ),
            (
                "cancel_url",
                &format!("{}/subscription?canceled=true", state.config.frontend_url),
            ),
        ])
        .send()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stripe error: {}", e)))?;

    let session: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stripe parse error: {}", e)))?;

    let url = session["url"]
        .as_str()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("No checkout URL from Stripe")))?
        .to_string();

    tracing::info!(user_id = %auth_user.id, plan = %body.plan, tier = ?target, "Checkout session created");

    Ok(Json(CheckoutResponse { checkout_url: url }))
}

/// Verify Stripe webhook signature.
/// Header format: t=timestamp,v1=signature[,v1=signature...]
fn verify_stripe_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<(), AppError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let mut kv = part.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(ts)) => timestamp = Some(ts),
            (Some("v1"), Some(sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let ts = timestamp
        .ok_or_else(|| AppError::Validation("Missing timestamp in Stripe-Signature".into()))?;

    if signatures.is_empty() {
        return Err(AppError::Validation(
            "Missing v1 signature in Stripe-Signature".into(),
        ));
    }

    // Construct the signed payload: "timestamp.payload"
    let signed_payload = format!("{}.{}", ts, String::from_utf8_lossy(payload));

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid webhook secret")))?;
    mac.update(signed_payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks
    let valid = signatures.iter().any(|sig| {
        sig.len() == expected.len()
            && sig
                .as_bytes()
                .iter()
                .zip(expected.as_bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    });

    if !valid {
        return Err(AppError::Validation("Invalid Stripe webhook signature".into()));
    }

    // Timestamp must be within tolerance (5 minutes)
    if let Ok(ts_secs) = ts.parse::<i64>() {
        let now = Utc::now().timestamp();
        let tolerance = 300;
        if (now - ts_secs).abs() > tolerance {
            return Err(AppError::Validation(
                "Stripe webhook timestamp outside tolerance".into(),
            ));
        }
    }

    Ok(())
}

pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    if !state.config.stripe_webhook_secret.is_empty() {
        let sig_header = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Validation("Missing Stripe-Signature header".into()))?;

        verify_stripe_signature(&body, sig_header, &state.config.stripe_webhook_secret)?;
    } else {
        tracing::warn!("Stripe webhook secret not configured, signature verification skipped");
    }

    let event: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;

    let event_id = event["id"].as_str().unwrap_or("");
    let event_type = event["type"].as_str().unwrap_or("");

    // Dedup row and state change commit together: if the update fails,
    // the rollback also drops the dedup row, so Stripe's retry is
    // reprocessed instead of being answered as a duplicate.
    let mut tx = state.db.begin().await?;

    if !event_id.is_empty() {
        let inserted = sqlx::query(
            "INSERT INTO stripe_events (event_id, event_type) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(event_type)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tracing::debug!(event_id = event_id, "Stripe event already processed, skipping");
            return Ok(Json(serde_json::json!({ "received": true, "duplicate": true })));
        }
    }

    tracing::info!(event_type = event_type, event_id = event_id, "Stripe webhook received");

    match plan_event_action(&event) {
        Some(EventAction::ActivateTier { customer_id, tier }) => {
            sqlx::query(
                r#"
                UPDATE users SET
                    tier = $2,
                    status = 'active',
                    updated_at = NOW()
                WHERE stripe_customer_id = $1
                "#,
            )
            .bind(&customer_id)
            .bind(tier)
            .execute(&mut *tx)
            .await?;
        }
        Some(EventAction::SetStatus { customer_id, status }) => {
            sqlx::query(
                r#"
                UPDATE users SET
                    status = $2::subscription_status,
                    updated_at = NOW()
                WHERE stripe_customer_id = $1
                "#,
            )
            .bind(&customer_id)
            .bind(status)
            .execute(&mut *tx)
            .await?;
        }
        Some(EventAction::Downgrade { customer_id }) => {
            sqlx::query(
                r#"
                UPDATE users SET
                    tier = 'explore',
                    status = 'canceled',
                    updated_at = NOW()
                WHERE stripe_customer_id = $1
                "#,
            )
            .bind(&customer_id)
            .execute(&mut *tx)
            .await?;
        }
        None => {
            tracing::debug!(event_type = event_type, "Unhandled Stripe event");
        }
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "received": true })))
}

/// What a Stripe event should do to the user row, decoupled from the
/// SQL that applies it.
#[derive(Debug, PartialEq)]
enum EventAction {
    ActivateTier {
        customer_id: String,
        tier: SubscriptionTier,
    },
    SetStatus {
        customer_id: String,
        status: &'static str,
    },
    Downgrade {
        customer_id: String,
    },
}

fn plan_event_action(event: &serde_json::Value) -> Option<EventAction> {
    let object = &event["data"]["object"];
    let customer_id = object["customer"].as_str().unwrap_or("").to_string();

    match event["type"].as_str().unwrap_or("") {
        "checkout.session.completed" => {
            let tier = object["metadata"]["tier"]
                .as_str()
                .and_then(SubscriptionTier::from_plan_id)
                .filter(|t| t.is_paid())
                .unwrap_or(SubscriptionTier::Reflect);
            Some(EventAction::ActivateTier { customer_id, tier })
        }
        "customer.subscription.updated" => {
            let status = match object["status"].as_str().unwrap_or("active") {
                "active" => "active",
                "trialing" => "trialing",
                "past_due" => "past_due",
                "canceled" => "canceled",
                _ => "inactive",
            };
            Some(EventAction::SetStatus { customer_id, status })
        }
        "customer.subscription.deleted" => Some(EventAction::Downgrade { customer_id }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], ts: i64, secret: &str) -> String {
        let signed = format!("{}.{}", ts, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let payload = br#"{"id":"evt_1"}"#;
        let ts = Utc::now().timestamp();
        let sig = sign(payload, ts, "whsec_test");
        let header = format!("t={},v1={}", ts, sig);
        assert!(verify_stripe_signature(payload, &header, "whsec_test").is_ok());
    }

    #[test]
    fn tampered_payload_fails() {
        let ts = Utc::now().timestamp();
        let sig = sign(br#"{"id":"evt_1"}"#, ts, "whsec_test");
        let header = format!("t={},v1={}", ts, sig);
        assert!(verify_stripe_signature(br#"{"id":"evt_2"}"#, &header, "whsec_test").is_err());
    }

    #[test]
    fn stale_timestamp_fails() {
        let payload = br#"{"id":"evt_1"}"#;
        let ts = Utc::now().timestamp() - 3600;
        let sig = sign(payload, ts, "whsec_test");
        let header = format!("t={},v1={}", ts, sig);
        assert!(verify_stripe_signature(payload, &header, "whsec_test").is_err());
    }

    #[test]
    fn missing_parts_fail() {
        let payload = br#"{}"#;
        assert!(verify_stripe_signature(payload, "v1=abc", "s").is_err());
        assert!(verify_stripe_signature(payload, "t=123", "s").is_err());
    }

    #[test]
    fn checkout_completed_activates_the_metadata_tier() {
        let event = serde_json::json!({
            "type": "checkout.session.completed",
            "data": { "object": {
                "customer": "cus_1",
                "metadata": { "tier": "heal" },
            }},
        });
        assert_eq!(
            plan_event_action(&event),
            Some(EventAction::ActivateTier {
                customer_id: "cus_1".into(),
                tier: SubscriptionTier::Heal,
            })
        );
    }

    #[test]
    fn checkout_with_missing_or_free_metadata_defaults_to_reflect() {
        for metadata in [
            serde_json::json!({}),
            serde_json::json!({ "tier": "explore" }),
            serde_json::json!({ "tier": "bogus" }),
        ] {
            let event = serde_json::json!({
                "type": "checkout.session.completed",
                "data": { "object": { "customer": "cus_1", "metadata": metadata } },
            });
            assert_eq!(
                plan_event_action(&event),
                Some(EventAction::ActivateTier {
                    customer_id: "cus_1".into(),
                    tier: SubscriptionTier::Reflect,
                })
            );
        }
    }

    #[test]
    fn subscription_status_changes_map_to_known_values() {
        let event = serde_json::json!({
            "type": "customer.subscription.updated",
            "data": { "object": { "customer": "cus_2", "status": "unpaid" } },
        });
        assert_eq!(
            plan_event_action(&event),
            Some(EventAction::SetStatus {
                customer_id: "cus_2".into(),
                status: "inactive",
            })
        );
    }

    #[test]
    fn subscription_deleted_downgrades() {
        let event = serde_json::json!({
            "type": "customer.subscription.deleted",
            "data": { "object": { "customer": "cus_3" } },
        });
        assert_eq!(
            plan_event_action(&event),
            Some(EventAction::Downgrade {
                customer_id: "cus_3".into(),
            })
        );
    }

    #[test]
    fn unrelated_events_plan_nothing() {
        let event = serde_json::json!({
            "type": "invoice.finalized",
            "data": { "object": { "customer": "cus_4" } },
        });
        assert_eq!(plan_event_action(&event), None);
    }
}
