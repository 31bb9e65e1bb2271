//! Prompt composition and argument validation for phone-intake extraction.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::donor::{BloodType, Sex, TissueCondition, TissueType};
use crate::tool::{ArgumentError, ToolSpec};

pub const SYSTEM_PROMPT: &str = "You extract structured donor intake data from a phone call \
transcript for a tissue donation program. Report only what the caller clearly stated. Use null \
for any field that is not explicitly mentioned in the transcript. Never infer, guess, or \
normalize beyond the allowed values.";

/// One utterance from the provider's structured transcript.
#[derive(Clone, Debug, Deserialize)]
pub struct TranscriptTurn {
    pub role: String,
    pub content: String,
}

/// Prefers the structured turn list, falls back to the flat transcript
/// string. Returns `None` when neither carries any text.
pub fn build_transcript_text(
    turns: Option<&[TranscriptTurn]>,
    flat: Option<&str>,
) -> Option<String> {
    if let Some(turns) = turns {
        if !turns.is_empty() {
            let text = turns
                .iter()
                .map(|turn| format!("{}: {}", turn.role, turn.content))
                .collect::<Vec<_>>()
                .join("\n");
            if !text.trim().is_empty() {
                return Some(text);
            }
        }
    }

    flat.map(str::trim).filter(|text| !text.is_empty()).map(str::to_string)
}

pub fn extraction_prompt(transcript_text: &str) -> String {
    format!("# Call transcript\n\n{transcript_text}")
}

pub fn extraction_tool() -> ToolSpec {
    ToolSpec {
        name: "record_intake_extraction",
        description: "Record the donor intake fields extracted from the call transcript. Always \
                      call this tool exactly once. Use null for anything not clearly stated.",
        parameters: json!({
            "type": "object",
            "properties": {
                "partner_code": {
                    "type": "string",
                    "description": "The identifying partner code the caller spoke."
                },
                "full_name": { "type": ["string", "null"] },
                "date_of_birth": {
                    "type": ["string", "null"],
                    "description": "ISO date, YYYY-MM-DD."
                },
                "sex": { "type": ["string", "null"], "enum": nullable(Sex::WIRE_VALUES) },
                "blood_type": {
                    "type": ["string", "null"],
                    "enum": nullable(BloodType::WIRE_VALUES)
                },
                "cause_of_death": { "type": ["string", "null"] },
                "date_of_death": {
                    "type": ["string", "null"],
                    "description": "ISO date, YYYY-MM-DD."
                },
                "tissue_type": {
                    "type": ["string", "null"],
                    "enum": nullable(TissueType::WIRE_VALUES)
                },
                "tissue_condition": {
                    "type": ["string", "null"],
                    "enum": nullable(TissueCondition::WIRE_VALUES)
                }
            },
            "required": ["partner_code"]
        }),
    }
}

fn nullable(values: &'static [&'static str]) -> Vec<Value> {
    values
        .iter()
        .map(|value| Value::String((*value).to_string()))
        .chain(std::iter::once(Value::Null))
        .collect()
}

/// Validated extraction arguments. Every field except the partner code may
/// be absent.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedIntake {
    pub partner_code: String,
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub blood_type: Option<BloodType>,
    pub cause_of_death: Option<String>,
    pub date_of_death: Option<NaiveDate>,
    pub tissue_type: Option<TissueType>,
    pub tissue_condition: Option<TissueCondition>,
}

/// Validates the model's extraction arguments. A missing or empty
/// `partner_code` is a schema violation, distinct from the later lookup
/// failing to match an active partner.
pub fn parse_extraction(arguments: &Value) -> Result<ExtractedIntake, ArgumentError> {
    let partner_code = arguments
        .get("partner_code")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or(ArgumentError::Missing("partner_code"))?
        .to_string();

    Ok(ExtractedIntake {
        partner_code,
        full_name: optional_str(arguments, "full_name"),
        date_of_birth: optional_date(arguments, "date_of_birth")?,
        sex: optional_enum(arguments, "sex", Sex::parse, Sex::WIRE_VALUES)?,
        blood_type: optional_enum(arguments, "blood_type", BloodType::parse, BloodType::WIRE_VALUES)?,
        cause_of_death: optional_str(arguments, "cause_of_death"),
        date_of_death: optional_date(arguments, "date_of_death")?,
        tissue_type: optional_enum(arguments, "tissue_type", TissueType::parse, TissueType::WIRE_VALUES)?,
        tissue_condition: optional_enum(
            arguments,
            "tissue_condition",
            TissueCondition::parse,
            TissueCondition::WIRE_VALUES,
        )?,
    })
}

fn optional_str(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn optional_date(value: &Value, field: &'static str) -> Result<Option<NaiveDate>, ArgumentError> {
    match value.get(field).and_then(Value::as_str).map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ArgumentError::Invalid {
                field,
                detail: format!("`{raw}` is not a YYYY-MM-DD date"),
            }),
    }
}

fn optional_enum<T>(
    value: &Value,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
    allowed: &'static [&'static str],
) -> Result<Option<T>, ArgumentError> {
    match value.get(field).and_then(Value::as_str) {
        None => Ok(None),
        Some(raw) => parse(raw).map(Some).ok_or_else(|| ArgumentError::Invalid {
            field,
            detail: format!("`{raw}` is not one of {allowed:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{build_transcript_text, parse_extraction, TranscriptTurn};
    use crate::domain::donor::{BloodType, Sex};
    use crate::tool::ArgumentError;

    fn turn(role: &str, content: &str) -> TranscriptTurn {
        TranscriptTurn { role: role.to_string(), content: content.to_string() }
    }

    #[test]
    fn structured_turns_win_over_flat_transcript() {
        let turns = vec![turn("agent", "Which partner are you calling from?"), turn("user", "Acme Tissue, code acme-tissue.")];
        let text = build_transcript_text(Some(&turns), Some("flat fallback")).unwrap();

        assert!(text.starts_with("agent: Which partner"));
        assert!(text.contains("user: Acme Tissue"));
        assert!(!text.contains("flat fallback"));
    }

    #[test]
    fn flat_transcript_used_when_turns_absent_or_empty() {
        assert_eq!(
            build_transcript_text(None, Some("  hello there ")).as_deref(),
            Some("hello there")
        );
        assert_eq!(build_transcript_text(Some(&[]), Some("hello")).as_deref(), Some("hello"));
    }

    #[test]
    fn no_transcript_material_yields_none() {
        assert!(build_transcript_text(None, None).is_none());
        assert!(build_transcript_text(Some(&[]), Some("   ")).is_none());
    }

    #[test]
    fn parse_accepts_minimal_arguments() {
        let arguments = json!({ "partner_code": "acme-tissue" });

        let extracted = parse_extraction(&arguments).unwrap();
        assert_eq!(extracted.partner_code, "acme-tissue");
        assert!(extracted.full_name.is_none());
        assert!(extracted.blood_type.is_none());
    }

    #[test]
    fn parse_resolves_enums_and_dates() {
        let arguments = json!({
            "partner_code": "acme-tissue",
            "full_name": "Jordan Reyes",
            "sex": "female",
            "blood_type": "AB-",
            "date_of_birth": "1961-03-14"
        });

        let extracted = parse_extraction(&arguments).unwrap();
        assert_eq!(extracted.sex, Some(Sex::Female));
        assert_eq!(extracted.blood_type, Some(BloodType::AbNegative));
        assert_eq!(extracted.date_of_birth.unwrap().to_string(), "1961-03-14");
    }

    #[test]
    fn parse_rejects_missing_partner_code() {
        assert!(matches!(
            parse_extraction(&json!({ "full_name": "Jordan Reyes" })),
            Err(ArgumentError::Missing("partner_code"))
        ));
        assert!(matches!(
            parse_extraction(&json!({ "partner_code": "  " })),
            Err(ArgumentError::Missing("partner_code"))
        ));
    }

    #[test]
    fn parse_rejects_unknown_enum_value() {
        let arguments = json!({ "partner_code": "acme-tissue", "blood_type": "purple" });

        assert!(matches!(
            parse_extraction(&arguments),
            Err(ArgumentError::Invalid { field: "blood_type", .. })
        ));
    }

    #[test]
    fn parse_rejects_malformed_date() {
        let arguments = json!({ "partner_code": "acme-tissue", "date_of_death": "last Tuesday" });

        assert!(matches!(
            parse_extraction(&arguments),
            Err(ArgumentError::Invalid { field: "date_of_death", .. })
        ));
    }
}
