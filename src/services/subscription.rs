//! Feature gate driven by the cached subscription status string.

/// Subscription status as cached by the profile screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Paid or trial subscription in effect.
    Active,
    /// Explicitly without a subscription.
    NotSubscribed,
    /// Any other value; battles stay available and the server has the final say.
    Unknown(String),
}

impl SubscriptionStatus {
    /// Interpret a cached status string.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw
            .trim()
            .to_ascii_lowercase()
            .replace([' ', '-'], "_");

        match normalized.as_str() {
            "active" | "subscribed" | "trialing" | "trial" => Self::Active,
            "not_subscribed" | "notsubscribed" | "unsubscribed" | "inactive" | "expired"
            | "canceled" | "cancelled" | "none" => Self::NotSubscribed,
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    /// Whether solo battles may be started.
    pub fn allows_battles(&self) -> bool {
        !matches!(self, Self::NotSubscribed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_subscribed_variants_block() {
        for raw in ["not_subscribed", "Not Subscribed", "notSubscribed", "expired", "none"] {
            assert_eq!(
                SubscriptionStatus::parse(raw),
                SubscriptionStatus::NotSubscribed,
                "{raw}"
            );
            assert!(!SubscriptionStatus::parse(raw).allows_battles());
        }
    }

    #[test]
    fn active_and_unknown_allow() {
        assert_eq!(SubscriptionStatus::parse("active"), SubscriptionStatus::Active);
        assert!(SubscriptionStatus::parse("trialing").allows_battles());

        let unknown = SubscriptionStatus::parse(" gold ");
        assert_eq!(unknown, SubscriptionStatus::Unknown("gold".into()));
        assert!(unknown.allows_battles());
    }
}
