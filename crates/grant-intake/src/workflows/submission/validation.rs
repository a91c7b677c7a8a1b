use std::fmt;

use tracing::warn;

use super::domain::{
    Applicant, ApplicationForm, ApplicationSubmission, CostBreakdown, CostSubmission, Narrative,
    NumericInput, Reference, ServiceRequests,
};

/// Tolerance when comparing the caller's total against the recomputed sum.
const TOTAL_TOLERANCE: f64 = 0.005;

/// Reasons a payload is refused before anything is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission failed validation: {}", describe(.violations))]
    SchemaViolation { violations: Vec<FieldViolation> },
    #[error("the declaration must be accepted before an application can be stored")]
    DeclarationNotAccepted,
}

impl SubmissionError {
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            SubmissionError::SchemaViolation { violations } => violations,
            SubmissionError::DeclarationNotAccepted => &[],
        }
    }
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One offending field, named by its wire (camelCase) path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub problem: ViolationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    NotNumeric,
    Negative,
    InvalidEmail,
    OutOfRange,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let problem = match self.problem {
            ViolationKind::Missing => "is required",
            ViolationKind::NotNumeric => "must be a number",
            ViolationKind::Negative => "must not be negative",
            ViolationKind::InvalidEmail => "must be an email address",
            ViolationKind::OutOfRange => "is out of range",
        };
        write!(f, "{} {}", self.field, problem)
    }
}

/// Accumulates every problem in one pass over the payload.
#[derive(Debug, Default)]
struct Collector {
    violations: Vec<FieldViolation>,
}

impl Collector {
    fn flag(&mut self, field: &'static str, problem: ViolationKind) {
        self.violations.push(FieldViolation { field, problem });
    }

    fn text(&mut self, field: &'static str, value: Option<String>) -> String {
        match value {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                self.flag(field, ViolationKind::Missing);
                String::new()
            }
        }
    }

    fn amount(&mut self, field: &'static str, value: Option<&NumericInput>) -> f64 {
        let Some(input) = value.filter(|input| !input.is_blank()) else {
            self.flag(field, ViolationKind::Missing);
            return 0.0;
        };
        match input.coerce() {
            Some(amount) if amount < 0.0 => {
                self.flag(field, ViolationKind::Negative);
                0.0
            }
            Some(amount) => amount,
            None => {
                self.flag(field, ViolationKind::NotNumeric);
                0.0
            }
        }
    }

    fn email(&mut self, field: &'static str, value: Option<String>) -> String {
        let email = self.text(field, value);
        if !email.is_empty() && !looks_like_email(&email) {
            self.flag(field, ViolationKind::InvalidEmail);
        }
        email.trim().to_string()
    }
}

fn looks_like_email(raw: &str) -> bool {
    let raw = raw.trim();
    match raw.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !raw.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Validate a raw submission and produce the form that will be stored.
///
/// The submitted `totalCost` must be present but the stored value is always the
/// sum of the six cost lines.
pub fn form_from_submission(
    submission: ApplicationSubmission,
) -> Result<ApplicationForm, SubmissionError> {
    let mut check = Collector::default();
    let s = submission;

    let business_name = check.text("businessName", s.business_name);
    let applicant = Applicant {
        full_name: check.text("fullName", s.full_name),
        age: check.text("age", s.age),
        mobile: check.text("mobile", s.mobile),
        email: check.email("email", s.email),
        address: check.text("address", s.address),
        city: check.text("city", s.city),
        state: check.text("state", s.state),
        postal_code: check.text("postalCode", s.postal_code),
        country: check.text("country", s.country),
        education: check.text("education", s.education),
    };

    let narrative = Narrative {
        business_description: check.text("businessDescription", s.business_description),
        product_description: check.text("productDescription", s.product_description),
        novelty: check.text("novelty", s.novelty),
        team_size: check.text("teamSize", s.team_size),
        competitors: check.text("competitors", s.competitors),
        market_size: check.text("marketSize", s.market_size),
        market_survey: check.text("marketSurvey", s.market_survey),
        validation_survey: check.text("validationSurvey", s.validation_survey),
        project_cost_estimate: check.text("projectCostEstimate", s.project_cost_estimate),
        revenue_model: check.text("revenueModel", s.revenue_model),
    };

    let costs = cost_breakdown(&mut check, s.costs.as_ref());
    let submitted_total = check.amount("totalCost", s.total_cost.as_ref());
    let total_cost = costs.total();
    if !total_cost.is_finite() {
        check.flag("totalCost", ViolationKind::OutOfRange);
    }
    let machinery_needed = check.text("machineryNeeded", s.machinery_needed);

    let services = ServiceRequests {
        lab_access: check.text("labAccess", s.lab_access),
        library_access: check.text("libraryAccess", s.library_access),
        technical_consulting: check.text("technicalConsulting", s.technical_consulting),
        market_assessment: check.text("marketAssessment", s.market_assessment),
        techno_economic: check.text("technoEconomic", s.techno_economic),
        process_development: check.text("processDevelopment", s.process_development),
        product_evaluation: check.text("productEvaluation", s.product_evaluation),
        ipr_assistance: check.text("iprAssistance", s.ipr_assistance),
        advisory_services: check.text("advisoryServices", s.advisory_services),
        branding_marketing: check.text("brandingMarketing", s.branding_marketing),
        any_other: check.text("anyOther", s.any_other),
        any_other_explanation: s
            .any_other_explanation
            .filter(|value| !value.trim().is_empty()),
    };
    if services.wants_other() && services.any_other_explanation.is_none() {
        check.flag("anyOtherExplanation", ViolationKind::Missing);
    }

    let references = [
        Reference {
            name: check.text("ref1Name", s.ref1_name),
            organization: check.text("ref1Org", s.ref1_org),
            address: check.text("ref1Address", s.ref1_address),
            phone: check.text("ref1Phone", s.ref1_phone),
            email: check.text("ref1Email", s.ref1_email),
        },
        Reference {
            name: check.text("ref2Name", s.ref2_name),
            organization: check.text("ref2Org", s.ref2_org),
            address: check.text("ref2Address", s.ref2_address),
            phone: check.text("ref2Phone", s.ref2_phone),
            email: check.text("ref2Email", s.ref2_email),
        },
    ];

    if s.declaration.is_none() {
        check.flag("declaration", ViolationKind::Missing);
    }
    let date = check.text("date", s.date);
    let place = check.text("place", s.place);

    if !check.violations.is_empty() {
        return Err(SubmissionError::SchemaViolation {
            violations: check.violations,
        });
    }

    if s.declaration != Some(true) {
        return Err(SubmissionError::DeclarationNotAccepted);
    }

    if (total_cost - submitted_total).abs() > TOTAL_TOLERANCE {
        warn!(
            submitted = submitted_total,
            recomputed = total_cost,
            "submitted total cost disagrees with cost lines; storing recomputed total"
        );
    }

    Ok(ApplicationForm {
        business_name,
        applicant,
        business_type: s.business_type.unwrap_or_default(),
        status: s.status.unwrap_or_default(),
        legal_entity: s.legal_entity.unwrap_or_default(),
        narrative,
        costs,
        total_cost,
        machinery_needed,
        services,
        references,
        declaration: true,
        date,
        place,
    })
}

fn cost_breakdown(check: &mut Collector, costs: Option<&CostSubmission>) -> CostBreakdown {
    let Some(costs) = costs else {
        check.flag("costs", ViolationKind::Missing);
        return CostBreakdown {
            pre_op: 0.0,
            prototype: 0.0,
            marketing: 0.0,
            equipment: 0.0,
            capital: 0.0,
            other: 0.0,
        };
    };

    CostBreakdown {
        pre_op: check.amount("costs.preOp", costs.pre_op.as_ref()),
        prototype: check.amount("costs.prototype", costs.prototype.as_ref()),
        marketing: check.amount("costs.marketing", costs.marketing.as_ref()),
        equipment: check.amount("costs.equipment", costs.equipment.as_ref()),
        capital: check.amount("costs.capital", costs.capital.as_ref()),
        other: check.amount("costs.other", costs.other.as_ref()),
    }
}
