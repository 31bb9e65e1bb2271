use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuidelineId(pub String);

impl std::fmt::Display for GuidelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One admin-managed screening rule. Active guidelines are assembled into
/// the policy document handed to the evaluation model, ordered by
/// `sort_order` then title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningGuideline {
    pub id: GuidelineId,
    pub title: String,
    pub category: String,
    pub content: String,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
