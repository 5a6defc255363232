use regex::Regex;

use crate::core::error::MatchingError;

/// Domain accepted when none is configured
pub const DEFAULT_INSTITUTION_DOMAIN: &str = "hec.edu";

/// Institutional email rule: `[A-Za-z0-9._%+-]+@<domain>`, domain matched exactly
#[derive(Debug, Clone)]
pub struct EmailRule {
    domain: String,
    pattern: Regex,
}

impl EmailRule {
    pub fn new(domain: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"^[a-zA-Z0-9._%+-]+@{}$",
            regex::escape(domain)
        ))?;
        Ok(Self {
            domain: domain.to_string(),
            pattern,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_valid(&self, email: &str) -> bool {
        self.pattern.is_match(email)
    }

    /// Reject emails outside the institution before any collaborator is called
    pub fn check(&self, email: &str) -> Result<(), MatchingError> {
        if self.is_valid(email) {
            Ok(())
        } else {
            Err(MatchingError::InvalidEmailDomain(email.to_string()))
        }
    }
}

impl Default for EmailRule {
    fn default() -> Self {
        // The default domain is a fixed literal, escaped above
        Self::new(DEFAULT_INSTITUTION_DOMAIN).expect("default email pattern is valid")
    }
}
