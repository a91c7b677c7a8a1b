use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::Utc;
use serde_json::{json, Value};

use crate::config::LinkConfig;
use crate::workflows::submission::composer::{
    DocumentComposer, DocumentRenderer, RenderError, RenderRequest,
};
use crate::workflows::submission::domain::{
    ApplicationForm, ApplicationId, ApplicationRecord, ApplicationSubmission,
};
use crate::workflows::submission::notification::{
    MailTransport, NotificationDispatcher, OutboundMessage, Sender, TransportError,
};
use crate::workflows::submission::repository::{
    ApplicationRepository, InMemoryApplicationRepository, RepositoryError,
};
use crate::workflows::submission::service::SubmissionWorkflow;
use crate::workflows::submission::validation::form_from_submission;

pub(super) const ADMIN_EMAIL: &str = "admin@psna.example";
pub(super) const APPLICANT_EMAIL: &str = "asha.raman@example.com";
pub(super) const BASE_URL: &str = "https://grants.psna.example";

pub(super) fn payload() -> Value {
    json!({
        "businessName": "Kiln Works Ceramics",
        "fullName": "Asha Raman",
        "age": "34",
        "mobile": "9876543210",
        "email": APPLICANT_EMAIL,
        "address": "12 Temple Road",
        "city": "Dindigul",
        "state": "Tamil Nadu",
        "postalCode": "624622",
        "country": "India",
        "education": "B.E. Ceramic Technology",
        "businessType": ["Manufacturing", "Services"],
        "status": "Prototype ready",
        "legalEntity": ["LLP"],
        "businessDescription": "Small-batch glazed tiles.\nSold to regional builders.",
        "productDescription": "Heat-reflective roof tiles",
        "novelty": "Locally sourced reflective glaze",
        "teamSize": "4",
        "competitors": "Two national brands; we are cheaper to ship",
        "marketSize": "Regional housing starts",
        "marketSurvey": "Surveyed 40 contractors",
        "validationSurvey": "Pilot roof on campus hostel",
        "projectCostEstimate": "8000",
        "revenueModel": "Direct sales to contractors",
        "costs": {
            "preOp": 1000,
            "prototype": 2000,
            "marketing": 500,
            "equipment": 1500,
            "capital": 3000,
            "other": 0
        },
        "totalCost": 8000,
        "machineryNeeded": "Second kiln",
        "labAccess": "Yes",
        "libraryAccess": "No",
        "technicalConsulting": "Yes",
        "marketAssessment": "No",
        "technoEconomic": "No",
        "processDevelopment": "Yes",
        "productEvaluation": "Yes",
        "iprAssistance": "No",
        "advisoryServices": "Yes",
        "brandingMarketing": "No",
        "anyOther": "No",
        "anyOtherExplanation": "",
        "ref1Name": "Dr. K. Iyer",
        "ref1Org": "Materials Lab / Professor",
        "ref1Address": "PSNA College Campus",
        "ref1Phone": "0451-2554032",
        "ref1Email": "kiyer@example.edu",
        "ref2Name": "M. Selvam",
        "ref2Org": "Selvam Builders / Partner",
        "ref2Address": "4 Market Street",
        "ref2Phone": "9443012345",
        "ref2Email": "selvam@example.com",
        "declaration": true,
        "date": "2025-03-14",
        "place": "Dindigul"
    })
}

pub(super) fn submission_from(value: Value) -> ApplicationSubmission {
    serde_json::from_value(value).expect("fixture payload parses")
}

pub(super) fn submission() -> ApplicationSubmission {
    submission_from(payload())
}

pub(super) fn payload_without(field: &str) -> Value {
    let mut value = payload();
    if let Some((parent, child)) = field.split_once('.') {
        value[parent]
            .as_object_mut()
            .expect("nested object")
            .remove(child);
    } else {
        value.as_object_mut().expect("object").remove(field);
    }
    value
}

pub(super) fn form() -> ApplicationForm {
    form_from_submission(submission()).expect("fixture validates")
}

pub(super) fn record_from(form: ApplicationForm) -> ApplicationRecord {
    let now = Utc::now();
    ApplicationRecord {
        id: ApplicationId("6d1f3c52-8a44-4f0e-9d57-3a3b0f0c9e21".to_string()),
        created_at: now,
        updated_at: now,
        form,
    }
}

pub(super) fn record() -> ApplicationRecord {
    record_from(form())
}

/// Text a reader would see in markup: tags dropped, entities decoded.
pub(super) fn visible_text(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    let mut in_style = false;
    let lower = markup.to_ascii_lowercase();
    for (index, c) in markup.char_indices() {
        if lower[index..].starts_with("<style") {
            in_style = true;
        }
        if in_style && lower[index..].starts_with("</style>") {
            in_style = false;
        }
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if in_tag || in_style => {}
            other => text.push(other),
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Renderer stub returning the markup it was given, with a call counter.
#[derive(Default)]
pub(super) struct EchoRenderer {
    calls: AtomicUsize,
    fail: bool,
}

impl EchoRenderer {
    pub(super) fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentRenderer for EchoRenderer {
    async fn render(&self, request: RenderRequest<'_>) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RenderError::Rejected {
                status: 503,
                detail: "chromium crashed".to_string(),
            });
        }
        Ok(request.markup.as_bytes().to_vec())
    }
}

/// Renderer that never answers.
pub(super) struct StalledRenderer;

#[async_trait]
impl DocumentRenderer for StalledRenderer {
    async fn render(&self, _request: RenderRequest<'_>) -> Result<Vec<u8>, RenderError> {
        std::future::pending::<()>().await;
        Ok(Vec::new())
    }
}

/// Mail transport stub recording every attempt; refuses listed addresses.
#[derive(Default)]
pub(super) struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    refuse: Vec<String>,
}

impl RecordingTransport {
    pub(super) fn refusing(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            refuse: addresses.iter().map(|value| value.to_string()).collect(),
        }
    }

    pub(super) fn attempts(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(message.clone());
        if self.refuse.iter().any(|address| address == &message.to) {
            return Err(TransportError::Relay("550 mailbox unavailable".to_string()));
        }
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

#[async_trait]
impl ApplicationRepository for UnavailableRepository {
    async fn insert(&self, _form: ApplicationForm) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn fetch(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Repository serving a fixed record, whatever it contains.
pub(super) struct FixedRepository(pub(super) ApplicationRecord);

#[async_trait]
impl ApplicationRepository for FixedRepository {
    async fn insert(&self, _form: ApplicationForm) -> Result<ApplicationRecord, RepositoryError> {
        Ok(self.0.clone())
    }

    async fn fetch(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok((id == &self.0.id).then(|| self.0.clone()))
    }
}

pub(super) fn sender() -> Sender {
    Sender {
        name: "PSNA Technology Foundation".to_string(),
        address: "intake@psna.example".to_string(),
    }
}

pub(super) fn dispatcher(transport: Arc<RecordingTransport>) -> NotificationDispatcher {
    NotificationDispatcher::new(transport, sender(), ADMIN_EMAIL, Duration::from_secs(1))
}

pub(super) fn build_workflow<R>(
    repository: Arc<R>,
    renderer: Arc<dyn DocumentRenderer>,
    transport: Arc<RecordingTransport>,
) -> SubmissionWorkflow<R>
where
    R: ApplicationRepository + 'static,
{
    SubmissionWorkflow::new(
        repository,
        DocumentComposer::new(renderer, Duration::from_secs(1)),
        dispatcher(transport),
        LinkConfig::new(BASE_URL).expect("valid base url"),
        Duration::from_secs(1),
    )
}

pub(super) struct Harness {
    pub(super) workflow: Arc<SubmissionWorkflow<InMemoryApplicationRepository>>,
    pub(super) repository: Arc<InMemoryApplicationRepository>,
    pub(super) renderer: Arc<EchoRenderer>,
    pub(super) transport: Arc<RecordingTransport>,
}

pub(super) fn harness_with(transport: RecordingTransport) -> Harness {
    let repository = Arc::new(InMemoryApplicationRepository::default());
    let renderer = Arc::new(EchoRenderer::default());
    let transport = Arc::new(transport);
    let workflow = Arc::new(build_workflow(
        repository.clone(),
        renderer.clone(),
        transport.clone(),
    ));
    Harness {
        workflow,
        repository,
        renderer,
        transport,
    }
}

pub(super) fn harness() -> Harness {
    harness_with(RecordingTransport::default())
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}
