use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Store-assigned identifier for a submitted application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value the service selectors use to mean "requested".
pub const AFFIRMATIVE: &str = "Yes";

/// Raw form payload exactly as the intake UI posts it.
///
/// Every field is optional at this layer so that a missing value surfaces as a
/// schema violation naming the field instead of an opaque JSON error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationSubmission {
    #[serde(deserialize_with = "loose_text")]
    pub business_name: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub full_name: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub age: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub mobile: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub address: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub city: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub state: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub postal_code: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub country: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub education: Option<String>,
    pub business_type: Option<Vec<String>>,
    #[serde(deserialize_with = "loose_text")]
    pub status: Option<String>,
    pub legal_entity: Option<Vec<String>>,
    #[serde(deserialize_with = "loose_text")]
    pub business_description: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub product_description: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub novelty: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub team_size: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub competitors: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub market_size: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub market_survey: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub validation_survey: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub project_cost_estimate: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub revenue_model: Option<String>,
    pub costs: Option<CostSubmission>,
    pub total_cost: Option<NumericInput>,
    #[serde(deserialize_with = "loose_text")]
    pub machinery_needed: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub lab_access: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub library_access: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub technical_consulting: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub market_assessment: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub techno_economic: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub process_development: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub product_evaluation: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ipr_assistance: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub advisory_services: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub branding_marketing: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub any_other: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub any_other_explanation: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref1_name: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref1_org: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref1_address: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref1_phone: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref1_email: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref2_name: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref2_org: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref2_address: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref2_phone: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub ref2_email: Option<String>,
    pub declaration: Option<bool>,
    #[serde(deserialize_with = "loose_text")]
    pub date: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub place: Option<String>,
}

/// Cost break-up as posted; each line may arrive as a number or numeric string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostSubmission {
    pub pre_op: Option<NumericInput>,
    pub prototype: Option<NumericInput>,
    pub marketing: Option<NumericInput>,
    pub equipment: Option<NumericInput>,
    pub capital: Option<NumericInput>,
    pub other: Option<NumericInput>,
}

/// Number-ish input from an HTML form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// Coerce to a finite number; blank text counts as absent.
    pub fn coerce(&self) -> Option<f64> {
        let value = match self {
            NumericInput::Number(value) => *value,
            NumericInput::Text(raw) => raw.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, NumericInput::Text(raw) if raw.trim().is_empty())
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Integer(i64),
        Float(f64),
        Flag(bool),
    }

    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(value.map(|loose| match loose {
        Loose::Text(text) => text,
        Loose::Integer(number) => number.to_string(),
        Loose::Float(number) => number.to_string(),
        Loose::Flag(flag) => flag.to_string(),
    }))
}

/// The validated, durable content of one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    pub business_name: String,
    pub applicant: Applicant,
    pub business_type: Vec<String>,
    pub status: String,
    pub legal_entity: Vec<String>,
    pub narrative: Narrative,
    pub costs: CostBreakdown,
    pub total_cost: f64,
    pub machinery_needed: String,
    pub services: ServiceRequests,
    pub references: [Reference; 2],
    pub declaration: bool,
    pub date: String,
    pub place: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub full_name: String,
    pub age: String,
    pub mobile: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub education: String,
}

/// Free-text answers describing the venture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub business_description: String,
    pub product_description: String,
    pub novelty: String,
    pub team_size: String,
    pub competitors: String,
    pub market_size: String,
    pub market_survey: String,
    pub validation_survey: String,
    pub project_cost_estimate: String,
    pub revenue_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub pre_op: f64,
    pub prototype: f64,
    pub marketing: f64,
    pub equipment: f64,
    pub capital: f64,
    pub other: f64,
}

impl CostBreakdown {
    /// Sum of the six lines, with binary rounding noise below a millionth removed.
    pub fn total(&self) -> f64 {
        let sum =
            self.pre_op + self.prototype + self.marketing + self.equipment + self.capital + self.other;
        let scaled = sum * 1e6;
        if scaled.is_finite() {
            scaled.round() / 1e6
        } else {
            sum
        }
    }
}

/// Yes/No answers for the services the foundation offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequests {
    pub lab_access: String,
    pub library_access: String,
    pub technical_consulting: String,
    pub market_assessment: String,
    pub techno_economic: String,
    pub process_development: String,
    pub product_evaluation: String,
    pub ipr_assistance: String,
    pub advisory_services: String,
    pub branding_marketing: String,
    pub any_other: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_other_explanation: Option<String>,
}

impl ServiceRequests {
    pub fn wants_other(&self) -> bool {
        self.any_other.trim() == AFFIRMATIVE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub organization: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

/// A durable application; never modified after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub form: ApplicationForm,
}

impl ApplicationRecord {
    pub fn applicant(&self) -> &Applicant {
        &self.form.applicant
    }
}
