use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use url::Url;

/// Paper and margin settings handed to the renderer with every page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Paper size in inches (width, height).
    pub paper_inches: (f32, f32),
    pub margin_px: u32,
    pub print_background: bool,
}

impl PageLayout {
    pub const A4: PageLayout = PageLayout {
        paper_inches: (8.27, 11.7),
        margin_px: 40,
        print_background: true,
    };

    pub fn margin_inches(&self) -> f32 {
        self.margin_px as f32 / 96.0
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::A4
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub markup: &'a str,
    pub layout: PageLayout,
}

/// Black-box HTML to fixed-layout document converter.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, request: RenderRequest<'_>) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer unreachable: {0}")]
    Transport(String),
    #[error("renderer rejected the page with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
    #[error("renderer did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

/// Client for a headless-Chromium conversion service speaking the Gotenberg
/// `forms/chromium/convert/html` protocol.
#[derive(Debug, Clone)]
pub struct HttpPdfRenderer {
    client: reqwest::Client,
    convert_url: String,
}

impl HttpPdfRenderer {
    pub fn new(endpoint: &Url) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: &Url) -> Self {
        let convert_url = format!(
            "{}/forms/chromium/convert/html",
            endpoint.as_str().trim_end_matches('/')
        );
        Self {
            client,
            convert_url,
        }
    }

    pub fn convert_url(&self) -> &str {
        &self.convert_url
    }
}

fn layout_fields(layout: &PageLayout) -> Vec<(&'static str, String)> {
    let margin = format!("{:.3}", layout.margin_inches());
    vec![
        ("paperWidth", format!("{:.2}", layout.paper_inches.0)),
        ("paperHeight", format!("{:.2}", layout.paper_inches.1)),
        ("marginTop", margin.clone()),
        ("marginBottom", margin.clone()),
        ("marginLeft", margin.clone()),
        ("marginRight", margin),
        ("printBackground", layout.print_background.to_string()),
    ]
}

#[async_trait]
impl DocumentRenderer for HttpPdfRenderer {
    async fn render(&self, request: RenderRequest<'_>) -> Result<Vec<u8>, RenderError> {
        let page = Part::bytes(request.markup.as_bytes().to_vec())
            .file_name("index.html")
            .mime_str(mime::TEXT_HTML_UTF_8.as_ref())
            .map_err(|err| RenderError::Transport(err.to_string()))?;
        let form = layout_fields(&request.layout)
            .into_iter()
            .fold(Form::new().part("files", page), |form, (name, value)| {
                form.text(name, value)
            });

        let response = self
            .client
            .post(&self.convert_url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| RenderError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RenderError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| RenderError::Transport(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_url_ignores_trailing_slash() {
        let renderer = HttpPdfRenderer::new(&Url::parse("http://renderer:3000/").unwrap());
        assert_eq!(
            renderer.convert_url(),
            "http://renderer:3000/forms/chromium/convert/html"
        );
    }

    #[test]
    fn a4_layout_uses_uniform_margins() {
        let fields = layout_fields(&PageLayout::A4);
        let lookup = |key: &str| {
            fields
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.clone())
                .unwrap()
        };
        assert_eq!(lookup("paperWidth"), "8.27");
        assert_eq!(lookup("paperHeight"), "11.70");
        assert_eq!(lookup("marginTop"), "0.417");
        assert_eq!(lookup("marginTop"), lookup("marginLeft"));
        assert_eq!(lookup("printBackground"), "true");
    }
}
