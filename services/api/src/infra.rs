use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use grant_intake::config::{AppConfig, StoreConfig};
use grant_intake::error::AppError;
use grant_intake::workflows::submission::{
    ApplicationForm, ApplicationId, ApplicationRecord, ApplicationRepository, DocumentComposer,
    HttpPdfRenderer, InMemoryApplicationRepository, JsonFileRepository, NotificationDispatcher,
    RepositoryError, Sender, SmtpMailTransport, SubmissionWorkflow,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store selected by `STORE_URL`.
#[derive(Clone)]
pub(crate) enum ConfiguredRepository {
    Memory(InMemoryApplicationRepository),
    Files(JsonFileRepository),
}

impl ConfiguredRepository {
    pub(crate) async fn from_config(store: &StoreConfig) -> Result<Self, RepositoryError> {
        match store {
            StoreConfig::Memory => Ok(Self::Memory(InMemoryApplicationRepository::default())),
            StoreConfig::Directory(root) => {
                Ok(Self::Files(JsonFileRepository::open(root.clone()).await?))
            }
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Files(_) => "files",
        }
    }
}

#[async_trait]
impl ApplicationRepository for ConfiguredRepository {
    async fn insert(&self, form: ApplicationForm) -> Result<ApplicationRecord, RepositoryError> {
        match self {
            Self::Memory(inner) => inner.insert(form).await,
            Self::Files(inner) => inner.insert(form).await,
        }
    }

    async fn fetch(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        match self {
            Self::Memory(inner) => inner.fetch(id).await,
            Self::Files(inner) => inner.fetch(id).await,
        }
    }
}

/// Wire the store, renderer, and mail relay named in the configuration.
pub(crate) async fn build_workflow(
    config: &AppConfig,
) -> Result<SubmissionWorkflow<ConfiguredRepository>, AppError> {
    let repository = ConfiguredRepository::from_config(&config.store).await?;
    let renderer = HttpPdfRenderer::new(&config.renderer.endpoint);
    let transport = SmtpMailTransport::from_config(&config.mail)?;
    let sender = Sender {
        name: config.mail.sender_name.clone(),
        address: config.mail.sender_address.clone(),
    };

    tracing::debug!(
        store = repository.kind(),
        renderer = %config.renderer.endpoint,
        smtp_host = %config.mail.smtp_host,
        "collaborators configured"
    );

    Ok(SubmissionWorkflow::new(
        Arc::new(repository),
        DocumentComposer::new(Arc::new(renderer), config.timeouts.render),
        NotificationDispatcher::new(
            Arc::new(transport),
            sender,
            config.mail.admin_email.clone(),
            config.timeouts.mail,
        ),
        config.links.clone(),
        config.timeouts.store,
    ))
}
