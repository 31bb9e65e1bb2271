use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartnerId(pub String);

impl std::fmt::Display for PartnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A recovery organization. The `slug` doubles as the partner's login code
/// and the identifying code spoken during phone intake; it is unique and
/// matched case-insensitively. Partners are deactivated, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    pub slug: String,
    pub contact_email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Partner {
    /// Canonical slug form used for lookups.
    pub fn normalize_slug(raw: &str) -> String {
        raw.trim().to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::Partner;

    #[test]
    fn slug_normalization_trims_and_lowercases() {
        assert_eq!(Partner::normalize_slug("  Acme-Tissue "), "acme-tissue");
        assert_eq!(Partner::normalize_slug("ACME-TISSUE"), "acme-tissue");
    }
}
