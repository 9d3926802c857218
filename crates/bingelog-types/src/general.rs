use std::str::FromStr;

use garde::Validate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Validate, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[garde(transparent)]
pub struct ValidEmail(#[garde(email)] String);

impl ValidEmail {
    /// Canonical form - domain part lowercased, local part kept as is.
    pub fn normalized(&self) -> String {
        match self.0.rsplit_once('@') {
            Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
            None => self.0.clone(),
        }
    }
}

impl FromStr for ValidEmail {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let email = ValidEmail(s.to_string());
        email.validate()?;
        Ok(email)
    }
}

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use fake::Fake as _;
    use quickcheck::Arbitrary;
    use quickcheck_macros::quickcheck;

    use super::*;

    impl Arbitrary for ValidEmail {
        fn arbitrary(_g: &mut quickcheck::Gen) -> Self {
            let email: String = fake::faker::internet::en::SafeEmail().fake();
            ValidEmail(email)
        }
    }

    #[quickcheck]
    fn test_valid_email_arbitrary(valid_email: ValidEmail) {
        assert!(valid_email.validate().is_ok());
    }

    #[quickcheck]
    fn test_normalized_domain_is_lowercase(valid_email: ValidEmail) {
        let normalized = valid_email.normalized();
        let domain = normalized.rsplit_once('@').unwrap().1;
        assert_eq!(domain, domain.to_lowercase());
    }

    #[test]
    fn test_valid_email() {
        let email = ValidEmail::from_str("admin@localhost").unwrap();
        assert_eq!(email.as_ref(), "admin@localhost");
    }

    #[test]
    fn test_invalid_email() {
        let email = ValidEmail::from_str("admin");
        assert!(email.is_err());

        let email = ValidEmail::from_str("");
        assert!(email.is_err());
    }

    #[test]
    fn test_normalized() {
        let email = ValidEmail::from_str("Test@AKSHAYDEV.COM").unwrap();
        assert_eq!(email.normalized(), "Test@akshaydev.com");
    }
}
