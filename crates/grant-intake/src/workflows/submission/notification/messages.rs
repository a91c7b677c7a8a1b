use std::fmt::Write as _;

use super::OutboundMessage;
use crate::workflows::submission::composer::html::escape_html;
use crate::workflows::submission::domain::ApplicationRecord;

/// Identity outbound mail is sent as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

/// Confirmation for the applicant: receipt plus the download link.
pub fn applicant_message(
    record: &ApplicationRecord,
    download_link: &str,
    sender: &Sender,
) -> OutboundMessage {
    let applicant = record.applicant();
    let link = escape_html(download_link);
    let mut body = String::new();
    writeln!(body, "<p>Dear {},</p>", escape_html(&applicant.full_name)).expect("write greeting");
    body.push_str(
        "<p>Thank you for submitting your application. We have successfully received it.</p>\n",
    );
    body.push_str(
        "<p>You can view and download a copy of your submitted application by clicking the link below:</p>\n",
    );
    writeln!(
        body,
        "<p><a href=\"{link}\" style=\"padding: 10px 15px; background-color: #007bff; color: white; text-decoration: none; border-radius: 5px;\">Download Your Application PDF</a></p>"
    )
    .expect("write download button");
    writeln!(body, "<p>If the button does not work, copy this address into your browser: {link}</p>")
        .expect("write plain link");
    body.push_str("<p>We will review your application and get back to you soon.</p>\n");
    writeln!(
        body,
        "<p>Best regards,<br>The {} Team</p>",
        escape_html(&sender.name)
    )
    .expect("write signature");

    OutboundMessage {
        from_name: sender.name.clone(),
        from_address: sender.address.clone(),
        to: applicant.email.clone(),
        reply_to: None,
        subject: format!("Your Application to {}", sender.name),
        html_body: body,
    }
}

/// Summary for the administrator. Replies go straight to the applicant.
pub fn admin_message(
    record: &ApplicationRecord,
    download_link: &str,
    sender: &Sender,
    admin_email: &str,
) -> OutboundMessage {
    let applicant = record.applicant();
    let name = escape_html(&applicant.full_name);
    let business = escape_html(&record.form.business_name);
    let email = escape_html(&applicant.email);
    let link = escape_html(download_link);

    let mut body = String::new();
    body.push_str("<p>A new application has been submitted.</p>\n");
    writeln!(body, "<p><strong>Applicant Name:</strong> {name}</p>").expect("write name");
    writeln!(body, "<p><strong>Business Name:</strong> {business}</p>").expect("write business");
    writeln!(
        body,
        "<p><strong>Applicant's Email (for reference):</strong> {email}</p>"
    )
    .expect("write email");
    writeln!(body, "<p><strong>Application ID:</strong> {}</p>", record.id).expect("write id");
    body.push_str(
        "<p>You can download their complete application PDF by clicking the link below:</p>\n",
    );
    writeln!(
        body,
        "<p><a href=\"{link}\" style=\"padding: 10px 15px; background-color: #28a745; color: white; text-decoration: none; border-radius: 5px;\">Download Application PDF</a></p>"
    )
    .expect("write download button");
    writeln!(
        body,
        "<hr>\n<p><em>To respond, just click \"Reply\" in your email client. You will be replying directly to {name} ({email}).</em></p>"
    )
    .expect("write reply hint");

    OutboundMessage {
        from_name: format!("{} (Application)", applicant.full_name),
        from_address: sender.address.clone(),
        to: admin_email.to_string(),
        reply_to: Some(applicant.email.clone()),
        subject: format!(
            "New Application Received from {} ({})",
            applicant.full_name, record.form.business_name
        ),
        html_body: body,
    }
}
