//! Grant application intake: validate, store, notify, and render on demand.
//!
//! Rendering is deferred to download time; the submission path only stores the
//! record and mails the link.

pub mod composer;
pub mod domain;
pub mod notification;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use composer::{
    compose, ComposeError, ComposedDocument, DocumentComposer, DocumentRenderer, HttpPdfRenderer,
    PageLayout, RenderError, RenderRequest, RenderedDocument,
};
pub use domain::{
    Applicant, ApplicationForm, ApplicationId, ApplicationRecord, ApplicationSubmission,
    CostBreakdown, CostSubmission, Narrative, NumericInput, Reference, ServiceRequests,
};
pub use notification::{
    DeliveryFailed, DeliveryReport, MailTransport, NotificationDispatcher, OutboundMessage,
    Recipient, RecipientOutcome, Sender, SmtpMailTransport, TransportError,
};
pub use repository::{
    ApplicationRepository, InMemoryApplicationRepository, JsonFileRepository, RepositoryError,
};
pub use router::submission_router;
pub use service::{SubmissionOutcome, SubmissionState, SubmissionWorkflow, WorkflowError};
pub use validation::{form_from_submission, FieldViolation, SubmissionError, ViolationKind};
