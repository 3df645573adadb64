use serde::Serialize;

use crate::models::user::SubscriptionTier;

/// Static pricing catalog shown on the pricing page and used to resolve
/// checkout plan ids. Prices are in the smallest currency unit per month.
#[derive(Debug, Clone, Serialize)]
pub struct TierPlan {
    pub id: SubscriptionTier,
    pub name: &'static str,
    pub price: u32,
    pub description: &'static str,
    pub features: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_benefit: Option<&'static str>,
}

pub fn catalog() -> &'static [TierPlan] {
    PLANS
}

static PLANS: &[TierPlan] = &[
    TierPlan {
        id: SubscriptionTier::Explore,
        name: "Explore",
        price: 0,
        description: "Start your mental wellness journey",
        features: &[
            "AI chat access for 1 week",
            "Basic mood tracking",
            "Limited journal entries",
            "Access to free audio boosts",
        ],
        referral_benefit: None,
    },
    TierPlan {
        id: SubscriptionTier::Reflect,
        name: "Reflect",
        price: 599,
        description: "Build self-awareness and track patterns",
        features: &[
            "Unlimited AI chat access",
            "Full mood tracking & notifications",
            "Unlimited journal entries",
            "Basic burnout analytics",
            "1-week free extension on referral",
        ],
        referral_benefit: Some("1 week free"),
    },
    TierPlan {
        id: SubscriptionTier::Heal,
        name: "Heal",
        price: 999,
        description: "Gain deeper insights and support",
        features: &[
            "Everything in Reflect",
            "Personalized session summaries",
            "Advanced burnout analytics",
            "Weekly & monthly mood trends",
            "Priority chat support",
        ],
        referral_benefit: Some("1 week free"),
    },
    TierPlan {
        id: SubscriptionTier::Thrive,
        name: "Thrive",
        price: 1499,
        description: "Maximum support for optimal wellbeing",
        features: &[
            "Everything in Heal",
            "Advanced burnout prediction",
            "Deeper personalized insights",
            "Mood trigger analysis",
            "Custom action plans",
            "VIP support access",
        ],
        referral_benefit: Some("1 week free"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explore_is_the_only_free_plan() {
        for plan in catalog() {
            assert_eq!(plan.price == 0, !plan.id.is_paid());
        }
    }

    #[test]
    fn paid_plans_carry_referral_benefit() {
        for plan in catalog().iter().filter(|p| p.id.is_paid()) {
            assert!(plan.referral_benefit.is_some());
        }
    }
}
