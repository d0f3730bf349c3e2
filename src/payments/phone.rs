//! Phone number normalization for mobile-money pushes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneRules {
    /// Canonical country code, without `+`
    pub country_code: String,
    /// Local trunk prefix replaced by the country code
    pub trunk_prefix: String,
    /// Neighbouring country codes rewritten to `country_code` (sandbox only)
    pub remap_prefixes: Vec<String>,
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self {
            country_code: "254".to_string(),
            trunk_prefix: "0".to_string(),
            remap_prefixes: vec!["255".to_string()],
        }
    }
}

impl PhoneRules {
    /// Rewrite `phone` into `<country code><subscriber number>`.
    ///
    /// Already canonical numbers come back unchanged.
    pub fn normalize(&self, phone: &str, remap: bool) -> String {
        let mut digits: String = phone
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        if let Some(stripped) = digits.strip_prefix('+') {
            digits = stripped.to_string();
        }

        if !self.trunk_prefix.is_empty() {
            if let Some(local) = digits.strip_prefix(self.trunk_prefix.as_str()) {
                digits = format!("{}{}", self.country_code, local);
            }
        }

        if remap {
            for prefix in &self.remap_prefixes {
                if prefix == &self.country_code {
                    continue;
                }
                if let Some(rest) = digits.strip_prefix(prefix.as_str()) {
                    digits = format!("{}{}", self.country_code, rest);
                    break;
                }
            }
        }

        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_plus() {
        let rules = PhoneRules::default();
        assert_eq!(rules.normalize("+254712345678", true), "254712345678");
    }

    #[test]
    fn test_rewrites_trunk_prefix() {
        let rules = PhoneRules::default();
        assert_eq!(rules.normalize("0712345678", true), "254712345678");
        assert_eq!(rules.normalize("0712 345-678", false), "254712345678");
    }

    #[test]
    fn test_remaps_neighbour_prefix_in_sandbox() {
        let rules = PhoneRules::default();
        assert_eq!(rules.normalize("255712345678", true), "254712345678");
        assert_eq!(rules.normalize("+255712345678", true), "254712345678");
    }

    #[test]
    fn test_live_keeps_foreign_numbers() {
        let rules = PhoneRules::default();
        assert_eq!(rules.normalize("255712345678", false), "255712345678");
    }

    #[test]
    fn test_idempotent_on_canonical_numbers() {
        let rules = PhoneRules::default();
        for input in ["+254712345678", "0712345678", "255712345678", "254712345678"] {
            let once = rules.normalize(input, true);
            assert_eq!(rules.normalize(&once, true), once);
            assert_eq!(once, "254712345678");
        }
    }
}
