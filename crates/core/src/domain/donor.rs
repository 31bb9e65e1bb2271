use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DonorId(pub String);

impl std::fmt::Display for DonorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonorStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl DonorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "under_review" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeMethod {
    Manual,
    Phone,
}

impl IntakeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Phone => "phone",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "manual" => Some(Self::Manual),
            "phone" => Some(Self::Phone),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub const WIRE_VALUES: &'static [&'static str] = &["male", "female", "unknown"];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodType {
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

impl BloodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "A+" => Some(Self::APositive),
            "A-" => Some(Self::ANegative),
            "B+" => Some(Self::BPositive),
            "B-" => Some(Self::BNegative),
            "AB+" => Some(Self::AbPositive),
            "AB-" => Some(Self::AbNegative),
            "O+" => Some(Self::OPositive),
            "O-" => Some(Self::ONegative),
            _ => None,
        }
    }

    pub const WIRE_VALUES: &'static [&'static str] =
        &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TissueType {
    Cornea,
    Skin,
    Bone,
    HeartValve,
    Tendon,
    Vein,
    Other,
}

impl TissueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cornea => "cornea",
            Self::Skin => "skin",
            Self::Bone => "bone",
            Self::HeartValve => "heart_valve",
            Self::Tendon => "tendon",
            Self::Vein => "vein",
            Self::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "cornea" => Some(Self::Cornea),
            "skin" => Some(Self::Skin),
            "bone" => Some(Self::Bone),
            "heart_valve" => Some(Self::HeartValve),
            "tendon" => Some(Self::Tendon),
            "vein" => Some(Self::Vein),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub const WIRE_VALUES: &'static [&'static str] =
        &["cornea", "skin", "bone", "heart_valve", "tendon", "vein", "other"];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TissueCondition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl TissueCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "poor" => Some(Self::Poor),
            _ => None,
        }
    }

    pub const WIRE_VALUES: &'static [&'static str] = &["excellent", "good", "fair", "poor"];
}

/// A donor record as submitted by a recovery partner or extracted from a
/// phone-intake call. All clinical fields are optional: phone intake in
/// particular routinely produces partial records that a human completes
/// during review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub id: DonorId,
    pub partner_id: crate::domain::partner::PartnerId,
    pub status: DonorStatus,
    pub intake_method: IntakeMethod,
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub age_years: Option<u16>,
    pub sex: Option<Sex>,
    pub blood_type: Option<BloodType>,
    pub cause_of_death: Option<String>,
    pub date_of_death: Option<NaiveDate>,
    pub tissue_type: Option<TissueType>,
    pub tissue_condition: Option<TissueCondition>,
    pub consent_obtained: Option<bool>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donor {
    pub fn can_transition_to(&self, next: DonorStatus) -> bool {
        matches!(
            (self.status, next),
            (DonorStatus::Draft, DonorStatus::Submitted)
                | (DonorStatus::Submitted, DonorStatus::UnderReview)
                | (DonorStatus::UnderReview, DonorStatus::Approved)
                | (DonorStatus::UnderReview, DonorStatus::Rejected)
        )
    }

    pub fn transition_to(&mut self, next: DonorStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidDonorTransition { from: self.status, to: next })
    }
}
