use super::ComposeError;
use crate::workflows::submission::domain::{ApplicationRecord, Reference};

pub const FOUNDATION: &str = "PSNA Technology Foundation";

/// One numbered heading of the printed application.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub number: u8,
    pub title: &'static str,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Free text; embedded line breaks are kept.
    Paragraph(String),
    Field { label: String, value: String },
    /// Visually separated cluster of fields, one per reference.
    Group(Vec<Block>),
}

fn field(label: impl Into<String>, value: impl Into<String>) -> Block {
    Block::Field {
        label: label.into(),
        value: value.into(),
    }
}

fn paragraph(value: impl Into<String>) -> Block {
    Block::Paragraph(normalize_breaks(&value.into()))
}

fn normalize_breaks(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

/// Plain number as stored: no grouping, symbol, or rounding.
pub fn format_amount(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ComposeError> {
    if value.trim().is_empty() {
        Err(ComposeError::IncompleteRecord { field })
    } else {
        Ok(value)
    }
}

fn amount(field: &'static str, value: f64) -> Result<String, ComposeError> {
    if value.is_finite() {
        Ok(format_amount(value))
    } else {
        Err(ComposeError::IncompleteRecord { field })
    }
}

/// Map a record onto the fixed twenty-section outline.
///
/// Fails on the first templated field that is blank rather than printing an
/// empty line where content was promised.
pub fn build_sections(record: &ApplicationRecord) -> Result<Vec<Section>, ComposeError> {
    let form = &record.form;
    let applicant = &form.applicant;
    let narrative = &form.narrative;
    let costs = &form.costs;
    let services = &form.services;

    let mut sections = Vec::with_capacity(20);
    let mut push = |title: &'static str, blocks: Vec<Block>| {
        let number = sections.len() as u8 + 1;
        sections.push(Section {
            number,
            title,
            blocks,
        });
    };

    push(
        "Name of the Business",
        vec![paragraph(required("businessName", &form.business_name)?)],
    );
    push(
        "Primary Applicant / Entrepreneur",
        vec![
            field("Full Name", required("fullName", &applicant.full_name)?),
            field("Age", required("age", &applicant.age)?),
            field("Mobile Number", required("mobile", &applicant.mobile)?),
            field("Email ID", required("email", &applicant.email)?),
            field("Postal Address", required("address", &applicant.address)?),
            field("City", required("city", &applicant.city)?),
            field("State", required("state", &applicant.state)?),
            field("Postal Code", required("postalCode", &applicant.postal_code)?),
            field("Country", required("country", &applicant.country)?),
            field(
                "Highest Education",
                required("education", &applicant.education)?,
            ),
        ],
    );
    push(
        "Type of the Business",
        vec![paragraph(form.business_type.join(", "))],
    );
    push(
        "Present status of the business",
        vec![paragraph(form.status.as_str())],
    );
    push(
        "Legal entity (Startup Only)",
        vec![paragraph(form.legal_entity.join(", "))],
    );
    push(
        "Brief description of the business",
        vec![paragraph(required(
            "businessDescription",
            &narrative.business_description,
        )?)],
    );
    push(
        "Brief description of product/Service offered",
        vec![paragraph(required(
            "productDescription",
            &narrative.product_description,
        )?)],
    );
    push(
        "Novelty of your product/Service",
        vec![paragraph(required("novelty", &narrative.novelty)?)],
    );
    push(
        "Team / Number of the employees",
        vec![paragraph(required("teamSize", &narrative.team_size)?)],
    );
    push(
        "Competitors & Competitive Advantage",
        vec![paragraph(required("competitors", &narrative.competitors)?)],
    );
    push(
        "Potential market size",
        vec![paragraph(required("marketSize", &narrative.market_size)?)],
    );
    push(
        "Market survey details",
        vec![paragraph(required("marketSurvey", &narrative.market_survey)?)],
    );
    push(
        "Validation survey/Research",
        vec![paragraph(required(
            "validationSurvey",
            &narrative.validation_survey,
        )?)],
    );
    push(
        "Estimated project cost",
        vec![paragraph(required(
            "projectCostEstimate",
            &narrative.project_cost_estimate,
        )?)],
    );
    push(
        "Revenue model",
        vec![paragraph(required("revenueModel", &narrative.revenue_model)?)],
    );
    push(
        "Break-up",
        vec![
            field(
                "Pre-operative expenses (Rs.)",
                amount("costs.preOp", costs.pre_op)?,
            ),
            field(
                "Prototype Development cost (Rs.)",
                amount("costs.prototype", costs.prototype)?,
            ),
            field(
                "Test & Marketing cost (Rs.)",
                amount("costs.marketing", costs.marketing)?,
            ),
            field(
                "Equipment cost (Rs.)",
                amount("costs.equipment", costs.equipment)?,
            ),
            field(
                "Working Capital cost (Rs.)",
                amount("costs.capital", costs.capital)?,
            ),
            field(
                "Other Requirements (Rs.)",
                amount("costs.other", costs.other)?,
            ),
            field("Total cost (Rs.)", amount("totalCost", form.total_cost)?),
        ],
    );
    push(
        "Machinery / Capital item needed",
        vec![paragraph(required("machineryNeeded", &form.machinery_needed)?)],
    );

    let mut requested = vec![
        field("Laboratory access", required("labAccess", &services.lab_access)?),
        field(
            "Library access",
            required("libraryAccess", &services.library_access)?,
        ),
        field(
            "Technical Consulting",
            required("technicalConsulting", &services.technical_consulting)?,
        ),
        field(
            "Market Assessment",
            required("marketAssessment", &services.market_assessment)?,
        ),
        field(
            "Techno-Economic",
            required("technoEconomic", &services.techno_economic)?,
        ),
        field(
            "Process Development",
            required("processDevelopment", &services.process_development)?,
        ),
        field(
            "Product Evaluation",
            required("productEvaluation", &services.product_evaluation)?,
        ),
        field(
            "IPR Assistance",
            required("iprAssistance", &services.ipr_assistance)?,
        ),
        field(
            "Advisory Services",
            required("advisoryServices", &services.advisory_services)?,
        ),
        field(
            "Branding/Marketing",
            required("brandingMarketing", &services.branding_marketing)?,
        ),
        field("Any Other", required("anyOther", &services.any_other)?),
    ];
    if services.wants_other() {
        let explanation = services.any_other_explanation.as_deref().unwrap_or_default();
        requested.push(field(
            "Explanation",
            normalize_breaks(required("anyOtherExplanation", explanation)?),
        ));
    }
    push(SERVICES_TITLE, requested);

    push(
        "References",
        vec![
            reference_group(1, &form.references[0])?,
            reference_group(2, &form.references[1])?,
        ],
    );
    push(
        "Declaration",
        vec![
            field(
                "Agreed to Declaration",
                if form.declaration { "Yes" } else { "No" },
            ),
            field("Date", required("date", &form.date)?),
            field("Place", required("place", &form.place)?),
        ],
    );

    Ok(sections)
}

const SERVICES_TITLE: &str = "Services expected from PSNA Technology Foundation";

fn reference_group(position: u8, reference: &Reference) -> Result<Block, ComposeError> {
    let (name, org, address, phone, email) = if position == 1 {
        ("ref1Name", "ref1Org", "ref1Address", "ref1Phone", "ref1Email")
    } else {
        ("ref2Name", "ref2Org", "ref2Address", "ref2Phone", "ref2Email")
    };

    Ok(Block::Group(vec![
        field(
            format!("Reference {position} - Name"),
            required(name, &reference.name)?,
        ),
        field(
            "Organization / Designation",
            required(org, &reference.organization)?,
        ),
        field("Address", required(address, &reference.address)?),
        field("Phone Number", required(phone, &reference.phone)?),
        field("Email ID", required(email, &reference.email)?),
    ]))
}

/// Text a reader sees, one line per heading, paragraph line, or field.
pub fn visible_text(sections: &[Section]) -> String {
    fn walk(block: &Block, out: &mut String) {
        match block {
            Block::Paragraph(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Block::Field { label, value } => {
                out.push_str(label);
                out.push_str(": ");
                out.push_str(value);
                out.push('\n');
            }
            Block::Group(blocks) => blocks.iter().for_each(|inner| walk(inner, out)),
        }
    }

    let mut out = format!("{FOUNDATION} - Application\n");
    for section in sections {
        out.push_str(&format!("{}. {}\n", section.number, section.title));
        for block in &section.blocks {
            walk(block, &mut out);
        }
    }
    out
}
