//! Subscription and trial gating.
//!
//! Pure decision functions over a snapshot of the user's subscription
//! state. Handlers pass `Utc::now()`; tests pass fixed instants. None of
//! these touch the database: counter updates are the caller's job.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::user::SubscriptionTier;

/// Days added to the trial per redeemed referral.
pub const REFERRAL_EXTENSION_DAYS: i64 = 7;
/// Length of a generated referral code.
pub const REFERRAL_CODE_LEN: usize = 8;

/// Any paid tier chats freely; the free tier only while the trial runs.
pub fn can_access_chat(
    tier: SubscriptionTier,
    trial_ends_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    if tier.is_paid() {
        return true;
    }
    trial_ends_at.map(|ends| now < ends).unwrap_or(false)
}

/// Whole days of trial left, rounded up, floored at zero. Zero when no
/// trial end is set.
pub fn remaining_trial_days(trial_ends_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(ends) = trial_ends_at else {
        return 0;
    };
    let secs = (ends - now).num_seconds();
    if secs <= 0 {
        0
    } else {
        (secs + 86_399) / 86_400
    }
}

/// Extend the trial end by one referral increment. An expired or unset
/// trial extends from `now`, so a redeemed code always grants usable time.
pub fn apply_referral_benefit(
    trial_ends_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    trial_ends_at.unwrap_or(now) + Duration::days(REFERRAL_EXTENSION_DAYS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayDenial {
    /// Premium-only clip, free-tier listener.
    PremiumOnly,
    /// Free-tier daily quota already consumed.
    QuotaReached,
}

impl PlayDenial {
    pub fn message(&self) -> &'static str {
        match self {
            PlayDenial::PremiumOnly => "This audio boost requires a paid subscription",
            PlayDenial::QuotaReached => "Daily free audio play limit reached",
        }
    }
}

/// Admission check for playing an audio clip. Paid tiers are unlimited;
/// the free tier gets `quota` plays per day and no premium clips.
pub fn check_audio_play(
    tier: SubscriptionTier,
    plays_today: i32,
    clip_is_premium: bool,
    quota: i32,
) -> Result<(), PlayDenial> {
    if tier.is_paid() {
        return Ok(());
    }
    if clip_is_premium {
        return Err(PlayDenial::PremiumOnly);
    }
    if plays_today >= quota {
        return Err(PlayDenial::QuotaReached);
    }
    Ok(())
}

/// Generate a shareable referral code: 8 uppercase alphanumerics.
pub fn generate_referral_code() -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn paid_tiers_always_chat() {
        let now = at(0);
        for tier in [
            SubscriptionTier::Reflect,
            SubscriptionTier::Heal,
            SubscriptionTier::Thrive,
        ] {
            assert!(can_access_chat(tier, None, now));
            assert!(can_access_chat(tier, Some(at(-1)), now));
        }
    }

    #[test]
    fn free_tier_chats_only_inside_trial() {
        let now = at(0);
        assert!(can_access_chat(SubscriptionTier::Explore, Some(at(1)), now));
        assert!(!can_access_chat(SubscriptionTier::Explore, Some(at(0)), now));
        assert!(!can_access_chat(SubscriptionTier::Explore, Some(at(-1)), now));
        assert!(!can_access_chat(SubscriptionTier::Explore, None, now));
    }

    #[test]
    fn remaining_days_round_up_and_clamp_at_zero() {
        let now = at(0);
        assert_eq!(remaining_trial_days(None, now), 0);
        assert_eq!(remaining_trial_days(Some(at(-5)), now), 0);
        assert_eq!(remaining_trial_days(Some(at(1)), now), 1);
        assert_eq!(remaining_trial_days(Some(at(86_400)), now), 1);
        assert_eq!(remaining_trial_days(Some(at(86_401)), now), 2);
        assert_eq!(remaining_trial_days(Some(at(7 * 86_400)), now), 7);
    }

    #[test]
    fn remaining_days_never_increase_as_time_advances() {
        let ends = Some(at(3 * 86_400 + 7_000));
        let mut prev = i64::MAX;
        for step in 0..10 {
            let days = remaining_trial_days(ends, at(step * 40_000));
            assert!(days <= prev);
            assert!(days >= 0);
            prev = days;
        }
    }

    #[test]
    fn referral_twice_adds_fourteen_days() {
        let now = at(0);
        let base = at(2 * 86_400);
        let once = apply_referral_benefit(Some(base), now);
        let twice = apply_referral_benefit(Some(once), now);
        assert_eq!(twice - base, Duration::days(14));
    }

    #[test]
    fn referral_on_unset_trial_starts_from_now() {
        let now = at(0);
        assert_eq!(apply_referral_benefit(None, now), now + Duration::days(7));
    }

    #[test]
    fn free_tier_quota_denies_third_play() {
        let r = check_audio_play(SubscriptionTier::Explore, 2, false, 2);
        assert_eq!(r, Err(PlayDenial::QuotaReached));
        assert!(check_audio_play(SubscriptionTier::Explore, 1, false, 2).is_ok());
    }

    #[test]
    fn premium_clip_denied_for_free_tier_regardless_of_quota() {
        let r = check_audio_play(SubscriptionTier::Explore, 0, true, 2);
        assert_eq!(r, Err(PlayDenial::PremiumOnly));
    }

    #[test]
    fn paid_tier_plays_anything() {
        assert!(check_audio_play(SubscriptionTier::Thrive, 999, true, 2).is_ok());
    }

    #[test]
    fn referral_codes_are_eight_uppercase_alphanumerics() {
        for _ in 0..50 {
            let code = generate_referral_code();
            assert_eq!(code.len(), REFERRAL_CODE_LEN);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}
