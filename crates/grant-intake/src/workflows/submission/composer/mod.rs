//! Record to printable document.
//!
//! Composition is a pure function of the stored record: sections are built,
//! serialised to markup, and only then handed to the external renderer.

pub mod html;
pub mod renderer;
pub mod sections;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use super::domain::ApplicationRecord;
pub use renderer::{DocumentRenderer, HttpPdfRenderer, PageLayout, RenderError, RenderRequest};
pub use sections::{Block, Section};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("record is missing required field `{field}`")]
    IncompleteRecord { field: &'static str },
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Sections plus the markup derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDocument {
    pub sections: Vec<Section>,
    pub markup: String,
}

impl ComposedDocument {
    pub fn visible_text(&self) -> String {
        sections::visible_text(&self.sections)
    }
}

/// Rendered bytes ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Build the sections and markup for a record without rendering.
pub fn compose(record: &ApplicationRecord) -> Result<ComposedDocument, ComposeError> {
    let sections = sections::build_sections(record)?;
    let markup = html::render_markup(&sections);
    Ok(ComposedDocument { sections, markup })
}

/// `Application-<fullName>.pdf`, with header-breaking characters replaced.
pub fn attachment_filename(full_name: &str) -> String {
    let cleaned: String = full_name
        .trim()
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' | ':' | ';' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("Application-{cleaned}.pdf")
}

pub struct DocumentComposer {
    renderer: Arc<dyn DocumentRenderer>,
    layout: PageLayout,
    timeout: Duration,
}

impl DocumentComposer {
    pub fn new(renderer: Arc<dyn DocumentRenderer>, timeout: Duration) -> Self {
        Self {
            renderer,
            layout: PageLayout::A4,
            timeout,
        }
    }

    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Compose and render one record. Every call re-renders; nothing is cached.
    pub async fn render(
        &self,
        record: &ApplicationRecord,
    ) -> Result<RenderedDocument, ComposeError> {
        let composed = compose(record).inspect_err(|err| {
            error!(application_id = %record.id, %err, "stored record cannot be composed");
        })?;
        debug!(
            application_id = %record.id,
            markup_bytes = composed.markup.len(),
            "composed application document"
        );

        let request = RenderRequest {
            markup: &composed.markup,
            layout: self.layout,
        };
        let bytes = match tokio::time::timeout(self.timeout, self.renderer.render(request)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(RenderError::Timeout(self.timeout).into()),
        };

        Ok(RenderedDocument {
            filename: attachment_filename(&record.applicant().full_name),
            content_type: PDF_CONTENT_TYPE,
            bytes,
        })
    }
}
