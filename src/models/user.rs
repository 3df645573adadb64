use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::services::gate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub referral_code: String,
    pub audio_plays_today: i32,
    pub audio_plays_date: Option<NaiveDate>,
    pub language: String,
    pub notifications_enabled: bool,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "subscription_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Explore,
    Reflect,
    Heal,
    Thrive,
}

impl SubscriptionTier {
    /// Explore is the free tier; everything above it is paid.
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Explore)
    }

    pub fn from_plan_id(plan: &str) -> Option<Self> {
        match plan {
            "explore" => Some(Self::Explore),
            "reflect" => Some(Self::Reflect),
            "heal" => Some(Self::Heal),
            "thrive" => Some(Self::Thrive),
            _ => None,
        }
    }
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        Self::Explore
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Inactive,
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        Self::Trialing
    }
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub remaining_trial_days: i64,
    pub referral_code: String,
    pub language: String,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        let remaining_trial_days = gate::remaining_trial_days(u.trial_ends_at, Utc::now());
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            tier: u.tier,
            status: u.status,
            trial_ends_at: u.trial_ends_at,
            remaining_trial_days,
            referral_code: u.referral_code,
            language: u.language,
            notifications_enabled: u.notifications_enabled,
            created_at: u.created_at,
        }
    }
}
