use std::fmt::Write as _;

use super::sections::{Block, Section, FOUNDATION};

const STYLESHEET: &str = r#"
body { font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; margin: 40px; font-size: 14px; line-height: 1.6; }
h1 { color: #333; text-align: center; border-bottom: 2px solid #333; padding-bottom: 10px; }
h3 { color: #555; border-bottom: 1px solid #eee; padding-bottom: 5px; margin-top: 30px; }
.section { margin-bottom: 25px; page-break-inside: avoid; break-inside: avoid; }
.field { margin-bottom: 10px; white-space: pre-wrap; }
.field strong { display: inline-block; width: 250px; color: #555; }
p { white-space: pre-wrap; margin: 0; }
.ref-group { border-top: 1px dashed #ccc; padding-top: 15px; margin-top: 15px; }
"#;

/// Full printable page for the renderer.
pub fn render_markup(sections: &[Section]) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    writeln!(
        html,
        "<title>{} - Application</title>",
        escape_html(FOUNDATION)
    )
    .expect("write title");
    writeln!(html, "<style>{STYLESHEET}</style>\n</head>\n<body>").expect("write head");
    writeln!(html, "<h1>{} - Application</h1>", escape_html(FOUNDATION)).expect("write heading");

    for section in sections {
        html.push_str("<div class=\"section\">\n");
        writeln!(
            html,
            "<h3>{}. {}</h3>",
            section.number,
            escape_html(section.title)
        )
        .expect("write section heading");
        for block in &section.blocks {
            write_block(&mut html, block);
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn write_block(html: &mut String, block: &Block) {
    match block {
        Block::Paragraph(text) => {
            writeln!(html, "<p>{}</p>", escape_html(text)).expect("write paragraph");
        }
        Block::Field { label, value } => {
            writeln!(
                html,
                "<div class=\"field\"><strong>{}:</strong> {}</div>",
                escape_html(label),
                escape_html(value)
            )
            .expect("write field");
        }
        Block::Group(blocks) => {
            html.push_str("<div class=\"ref-group\">\n");
            for inner in blocks {
                write_block(html, inner);
            }
            html.push_str("</div>\n");
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_text_cannot_inject_markup() {
        let sections = vec![Section {
            number: 1,
            title: "Name of the Business",
            blocks: vec![Block::Paragraph("<script>alert('x')</script>".to_string())],
        }];
        let html = render_markup(&sections);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn every_section_avoids_page_breaks() {
        let sections = vec![
            Section {
                number: 1,
                title: "One",
                blocks: Vec::new(),
            },
            Section {
                number: 2,
                title: "Two",
                blocks: vec![Block::Group(vec![Block::Field {
                    label: "Reference 1 - Name".to_string(),
                    value: "K. Iyer".to_string(),
                }])],
            },
        ];
        let html = render_markup(&sections);
        assert_eq!(html.matches("<div class=\"section\">").count(), 2);
        assert!(html.contains("page-break-inside: avoid"));
        assert!(html.contains("<div class=\"ref-group\">"));
        assert!(html.contains("<strong>Reference 1 - Name:</strong> K. Iyer"));
    }
}
