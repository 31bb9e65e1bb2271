//! Prompt composition and argument validation for donor screening.
//!
//! The policy document and the stored guideline snapshot are both derived
//! from the same ordered [`GuidelineSection`] list, so what the model saw
//! and what the audit trail records can never drift apart.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::donor::Donor;
use crate::domain::guideline::ScreeningGuideline;
use crate::domain::screening::{Concern, Severity, Verdict};
use crate::tool::{ArgumentError, ToolSpec};

pub const SYSTEM_PROMPT: &str = "You are a conservative clinical screening specialist for a \
tissue donation program. Evaluate the donor profile against the screening policy holistically. \
Write your reasoning in plain, non-clinical language a coordinator can act on: 3 to 5 sentences, \
no markdown headers. When data is missing, ambiguous, or borderline, choose needs_review rather \
than guessing. Never invent facts that are not in the profile.";

const EMPTY_POLICY_FALLBACK: &str = "No screening guidelines are currently configured. Evaluate \
the donor against generally accepted tissue donation best practice and flag anything a \
conservative reviewer would question.";

const SECTION_DIVIDER: &str = "\n\n---\n\n";

/// One policy fragment in prompt order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineSection {
    pub title: String,
    pub category: String,
    pub content: String,
}

impl From<&ScreeningGuideline> for GuidelineSection {
    fn from(guideline: &ScreeningGuideline) -> Self {
        Self {
            title: guideline.title.clone(),
            category: guideline.category.clone(),
            content: guideline.content.clone(),
        }
    }
}

/// Renders the policy document handed to the model. An empty section list
/// yields the fixed fallback instruction, never an empty prompt.
pub fn compose_policy_document(sections: &[GuidelineSection]) -> String {
    if sections.is_empty() {
        return EMPTY_POLICY_FALLBACK.to_string();
    }

    sections
        .iter()
        .map(|section| {
            format!("## {} ({})\n\n{}", section.title, section.category, section.content)
        })
        .collect::<Vec<_>>()
        .join(SECTION_DIVIDER)
}

/// JSON form of the sections, stored verbatim on the screening result.
pub fn snapshot_json(sections: &[GuidelineSection]) -> String {
    serde_json::to_string(sections).unwrap_or_else(|_| "[]".to_string())
}

/// Renders the donor profile body. Absent fields are printed as
/// "not recorded" so the model sees the gap instead of a silent omission.
pub fn donor_profile(donor: &Donor, partner_name: &str) -> String {
    fn opt(value: Option<String>) -> String {
        value.unwrap_or_else(|| "not recorded".to_string())
    }

    let mut lines = Vec::new();
    lines.push(format!("Full name: {}", opt(donor.full_name.clone())));
    lines.push(format!("Recovery partner: {partner_name}"));
    lines.push(format!("Intake method: {}", donor.intake_method.as_str()));
    lines.push(format!(
        "Date of birth: {}",
        opt(donor.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()))
    ));
    lines.push(format!("Age: {}", opt(donor.age_years.map(|a| format!("{a} years")))));
    lines.push(format!("Sex: {}", opt(donor.sex.map(|s| s.as_str().to_string()))));
    lines.push(format!(
        "Blood type: {}",
        opt(donor.blood_type.map(|b| b.as_str().to_string()))
    ));
    lines.push(format!("Cause of death: {}", opt(donor.cause_of_death.clone())));
    lines.push(format!(
        "Date of death: {}",
        opt(donor.date_of_death.map(|d| d.format("%Y-%m-%d").to_string()))
    ));
    lines.push(format!(
        "Tissue type: {}",
        opt(donor.tissue_type.map(|t| t.as_str().to_string()))
    ));
    lines.push(format!(
        "Tissue condition: {}",
        opt(donor.tissue_condition.map(|c| c.as_str().to_string()))
    ));
    lines.push(format!(
        "Consent obtained: {}",
        opt(donor.consent_obtained.map(|c| if c { "yes".to_string() } else { "no".to_string() }))
    ));
    if let Some(notes) = &donor.notes {
        if !notes.trim().is_empty() {
            lines.push(format!("Notes: {notes}"));
        }
    }

    lines.join("\n")
}

/// Combined user prompt for one evaluation run.
pub fn evaluation_prompt(policy_document: &str, profile: &str) -> String {
    format!("# Screening policy\n\n{policy_document}\n\n# Donor profile\n\n{profile}")
}

pub fn evaluation_tool() -> ToolSpec {
    ToolSpec {
        name: "record_screening_evaluation",
        description: "Record the screening evaluation for the donor profile. Always call this \
                      tool exactly once with the complete evaluation.",
        parameters: json!({
            "type": "object",
            "properties": {
                "verdict": {
                    "type": "string",
                    "enum": Verdict::WIRE_VALUES,
                    "description": "Overall screening outcome. Use needs_review when uncertain."
                },
                "confidence": {
                    "type": "number",
                    "minimum": 0.0,
                    "maximum": 1.0,
                    "description": "Confidence in the verdict, 0 to 1."
                },
                "reasoning": {
                    "type": "string",
                    "description": "Plain-language explanation, 3 to 5 sentences, no markdown."
                },
                "concerns": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "concern": { "type": "string" },
                            "severity": { "type": "string", "enum": Severity::WIRE_VALUES },
                            "guideline_ref": { "type": ["string", "null"] }
                        },
                        "required": ["concern", "severity"]
                    }
                },
                "missing_data": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Names of profile fields that were absent or unusable."
                }
            },
            "required": ["verdict", "confidence", "reasoning", "concerns", "missing_data"]
        }),
    }
}

/// Validated evaluation arguments, ready to persist.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasoning: String,
    pub concerns: Vec<Concern>,
    pub missing_data: Vec<String>,
}

/// Validates the model's tool arguments against the declared schema. The
/// provider's adherence is not trusted: enum membership and the confidence
/// range are checked here, and violations are rejected, never clamped.
pub fn parse_evaluation(arguments: &Value) -> Result<Evaluation, ArgumentError> {
    let verdict_raw = require_str(arguments, "verdict")?;
    let verdict = Verdict::parse(verdict_raw).ok_or_else(|| ArgumentError::Invalid {
        field: "verdict",
        detail: format!("`{verdict_raw}` is not one of {:?}", Verdict::WIRE_VALUES),
    })?;

    let confidence = arguments
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or(ArgumentError::Missing("confidence"))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ArgumentError::Invalid {
            field: "confidence",
            detail: format!("{confidence} is outside 0..=1"),
        });
    }

    let reasoning = require_str(arguments, "reasoning")?.to_string();
    if reasoning.trim().is_empty() {
        return Err(ArgumentError::Invalid {
            field: "reasoning",
            detail: "must not be empty".to_string(),
        });
    }

    let mut concerns = Vec::new();
    for (index, entry) in require_array(arguments, "concerns")?.iter().enumerate() {
        let concern = entry
            .get("concern")
            .and_then(Value::as_str)
            .ok_or(ArgumentError::Missing("concerns[].concern"))?
            .to_string();
        let severity_raw = entry
            .get("severity")
            .and_then(Value::as_str)
            .ok_or(ArgumentError::Missing("concerns[].severity"))?;
        let severity = Severity::parse(severity_raw).ok_or_else(|| ArgumentError::Invalid {
            field: "concerns[].severity",
            detail: format!("entry {index}: `{severity_raw}` is not one of {:?}", Severity::WIRE_VALUES),
        })?;
        let guideline_ref = entry
            .get("guideline_ref")
            .and_then(Value::as_str)
            .map(str::to_string);
        concerns.push(Concern { concern, severity, guideline_ref });
    }

    let missing_data = require_array(arguments, "missing_data")?
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or(ArgumentError::Missing("missing_data[]"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Evaluation { verdict, confidence, reasoning, concerns, missing_data })
}

fn require_str<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, ArgumentError> {
    value.get(field).and_then(Value::as_str).ok_or(ArgumentError::Missing(field))
}

fn require_array<'a>(value: &'a Value, field: &'static str) -> Result<&'a Vec<Value>, ArgumentError> {
    value.get(field).and_then(Value::as_array).ok_or(ArgumentError::Missing(field))
}
