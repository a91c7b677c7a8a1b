use std::sync::Arc;

use super::common::*;
use crate::workflows::submission::notification::{
    admin_message, applicant_message, Recipient, TransportError,
};

const LINK: &str = "https://grants.psna.example/api/download-pdf/6d1f3c52-8a44-4f0e-9d57-3a3b0f0c9e21";

#[test]
fn applicant_mail_carries_link_and_foundation_subject() {
    let message = applicant_message(&record(), LINK, &sender());
    assert_eq!(message.to, APPLICANT_EMAIL);
    assert_eq!(message.subject, "Your Application to PSNA Technology Foundation");
    assert_eq!(message.from_name, "PSNA Technology Foundation");
    assert_eq!(message.reply_to, None);
    assert!(message.html_body.contains("Dear Asha Raman,"));
    assert!(message.html_body.contains(&format!("href=\"{LINK}\"")));
}

#[test]
fn admin_mail_replies_to_applicant_and_names_business() {
    let record = record();
    let message = admin_message(&record, LINK, &sender(), ADMIN_EMAIL);
    assert_eq!(message.to, ADMIN_EMAIL);
    assert_eq!(message.reply_to.as_deref(), Some(APPLICANT_EMAIL));
    assert_eq!(message.from_name, "Asha Raman (Application)");
    assert_eq!(message.from_address, "intake@psna.example");
    assert_eq!(
        message.subject,
        "New Application Received from Asha Raman (Kiln Works Ceramics)"
    );
    assert!(message.html_body.contains("Kiln Works Ceramics"));
    assert!(message.html_body.contains(APPLICANT_EMAIL));
    assert!(message.html_body.contains(record.id.as_str()));
    assert!(message.html_body.contains(LINK));
}

#[test]
fn applicant_values_are_escaped_in_mail_bodies() {
    let mut form = form();
    form.business_name = "<b>Tiles & Co</b>".to_string();
    let message = admin_message(&record_from(form), LINK, &sender(), ADMIN_EMAIL);
    assert!(message.html_body.contains("&lt;b&gt;Tiles &amp; Co&lt;/b&gt;"));
    assert!(!message.html_body.contains("<b>Tiles"));
}

#[tokio::test]
async fn applicant_is_notified_before_administrator() {
    let transport = Arc::new(RecordingTransport::default());
    let report = dispatcher(transport.clone())
        .notify(&record(), LINK)
        .await
        .expect("both delivered");

    let recipients: Vec<_> = transport
        .attempts()
        .into_iter()
        .map(|message| message.to)
        .collect();
    assert_eq!(recipients, vec![APPLICANT_EMAIL, ADMIN_EMAIL]);
    assert!(report.all_delivered());
    assert!(report.failed_recipients().is_empty());
}

#[tokio::test]
async fn admin_failure_is_partial_and_reported() {
    let transport = Arc::new(RecordingTransport::refusing(&[ADMIN_EMAIL]));
    let failed = dispatcher(transport.clone())
        .notify(&record(), LINK)
        .await
        .expect_err("admin refused");

    assert!(failed.report.applicant.delivered());
    assert_eq!(failed.report.failed_recipients(), vec![Recipient::Administrator]);
    assert_eq!(
        failed.report.admin.error,
        Some(TransportError::Relay("550 mailbox unavailable".to_string()))
    );
    assert!(failed.to_string().contains("administrator <admin@psna.example>"));
}

#[tokio::test]
async fn applicant_failure_still_attempts_administrator() {
    let transport = Arc::new(RecordingTransport::refusing(&[APPLICANT_EMAIL]));
    let failed = dispatcher(transport.clone())
        .notify(&record(), LINK)
        .await
        .expect_err("applicant refused");

    assert_eq!(transport.attempts().len(), 2);
    assert!(failed.report.admin.delivered());
    assert_eq!(failed.report.failed_recipients(), vec![Recipient::Applicant]);
}

#[tokio::test]
async fn each_notification_is_attempted_once() {
    let transport = Arc::new(RecordingTransport::refusing(&[APPLICANT_EMAIL, ADMIN_EMAIL]));
    let failed = dispatcher(transport.clone())
        .notify(&record(), LINK)
        .await
        .expect_err("both refused");

    assert_eq!(transport.attempts().len(), 2);
    assert_eq!(
        failed.report.failed_recipients(),
        vec![Recipient::Applicant, Recipient::Administrator]
    );
}
