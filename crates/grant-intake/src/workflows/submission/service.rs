use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use super::composer::{ComposeError, DocumentComposer, RenderedDocument};
use super::domain::{ApplicationId, ApplicationRecord, ApplicationSubmission};
use super::notification::{DeliveryFailed, DeliveryReport, NotificationDispatcher, Recipient};
use super::repository::{ApplicationRepository, RepositoryError};
use super::validation::{form_from_submission, SubmissionError};
use crate::config::LinkConfig;

/// Where a submission ended up.
///
/// `Received -> Stored -> Notified -> Complete` on the happy path; `StoreFailed`
/// is terminal with no record, `NotifyFailed` is terminal with a durable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Received,
    Stored,
    Notified,
    Complete,
    StoreFailed,
    NotifyFailed,
}

impl SubmissionState {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionState::Received => "received",
            SubmissionState::Stored => "stored",
            SubmissionState::Notified => "notified",
            SubmissionState::Complete => "complete",
            SubmissionState::StoreFailed => "store_failed",
            SubmissionState::NotifyFailed => "notify_failed",
        }
    }
}

/// A submission that reached the store.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub application_id: ApplicationId,
    pub state: SubmissionState,
    pub download_link: String,
    pub delivery: Result<DeliveryReport, DeliveryFailed>,
}

impl SubmissionOutcome {
    pub fn failed_recipients(&self) -> Vec<Recipient> {
        match &self.delivery {
            Ok(_) => Vec::new(),
            Err(failed) => failed.report.failed_recipients(),
        }
    }
}

/// Error raised by the submission workflow.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("no application with id {0}")]
    NotFound(ApplicationId),
}

/// Sequences store, link, and notification; renders on demand for downloads.
pub struct SubmissionWorkflow<R> {
    repository: Arc<R>,
    composer: DocumentComposer,
    dispatcher: NotificationDispatcher,
    links: LinkConfig,
    store_timeout: Duration,
}

impl<R> SubmissionWorkflow<R>
where
    R: ApplicationRepository + 'static,
{
    pub fn new(
        repository: Arc<R>,
        composer: DocumentComposer,
        dispatcher: NotificationDispatcher,
        links: LinkConfig,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            composer,
            dispatcher,
            links,
            store_timeout,
        }
    }

    pub fn links(&self) -> &LinkConfig {
        &self.links
    }

    /// Validate and store a submission, then notify both recipients.
    ///
    /// Once the record is stored the call succeeds even if mail fails; the
    /// outcome carries `NotifyFailed` and the per-recipient report instead.
    pub async fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<SubmissionOutcome, WorkflowError> {
        info!(state = SubmissionState::Received.label(), "submission received");

        let form = form_from_submission(submission).inspect_err(|err| {
            warn!(state = SubmissionState::StoreFailed.label(), %err, "submission rejected");
        })?;

        let record = self
            .bounded(self.repository.insert(form))
            .await
            .inspect_err(|err| {
                error!(state = SubmissionState::StoreFailed.label(), %err, "store write failed");
            })?;
        info!(
            application_id = %record.id,
            state = SubmissionState::Stored.label(),
            "application stored"
        );

        let download_link = self.links.download_link(&record.id);
        let delivery = self.dispatcher.notify(&record, &download_link).await;
        let state = match &delivery {
            Ok(_) => {
                info!(
                    application_id = %record.id,
                    state = SubmissionState::Notified.label(),
                    "notifications delivered"
                );
                SubmissionState::Complete
            }
            Err(failed) => {
                warn!(
                    application_id = %record.id,
                    state = SubmissionState::NotifyFailed.label(),
                    err = %failed,
                    "application stored but notification incomplete"
                );
                SubmissionState::NotifyFailed
            }
        };

        Ok(SubmissionOutcome {
            application_id: record.id,
            state,
            download_link,
            delivery,
        })
    }

    /// Look up a record without rendering it.
    pub async fn get(&self, id: &ApplicationId) -> Result<ApplicationRecord, WorkflowError> {
        self.bounded(self.repository.fetch(id))
            .await?
            .ok_or_else(|| WorkflowError::NotFound(id.clone()))
    }

    /// Render the stored record behind a download link.
    ///
    /// Unknown ids return `NotFound` without touching the renderer.
    pub async fn fetch_document(
        &self,
        id: &ApplicationId,
    ) -> Result<RenderedDocument, WorkflowError> {
        let record = self.get(id).await?;
        let document = self.composer.render(&record).await.inspect_err(|err| {
            error!(application_id = %id, %err, "document rendering failed");
        })?;
        info!(
            application_id = %id,
            bytes = document.bytes.len(),
            "document rendered"
        );
        Ok(document)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, RepositoryError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout(self.store_timeout)),
        }
    }
}
