use std::time::SystemTime;

use serde::{Deserialize, Serialize};

pub trait TimeLimited {
    fn set_validity(&mut self, until: SystemTime);
    fn check_validity(&self) -> bool;
}

/// Claim carried in the bearer token - identifies the calling user.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiClaim {
    pub sub: String,
    pub exp: u64,
}

impl ApiClaim {
    /// New claim with zero validity, expiration is set when token is issued.
    pub fn new_expired(sub: impl ToString) -> Self {
        Self {
            sub: sub.to_string(),
            exp: 0,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

impl TimeLimited for ApiClaim {
    fn set_validity(&mut self, until: SystemTime) {
        self.exp = until
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs();
    }

    fn check_validity(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        self.exp > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_user_id() {
        let claim = ApiClaim::new_expired(42);
        assert_eq!(claim.user_id(), Some(42));
        assert!(!claim.check_validity());

        let claim = ApiClaim::new_expired("not-a-number");
        assert_eq!(claim.user_id(), None);
    }

    #[test]
    fn test_claim_validity() {
        let mut claim = ApiClaim::new_expired(1);
        claim.set_validity(SystemTime::now() + std::time::Duration::from_secs(60));
        assert!(claim.check_validity());
    }
}
