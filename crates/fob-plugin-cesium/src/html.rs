//! HTML tags injected into every entry document.

use crate::options::CesiumPluginOptions;
use crate::overrides::BASE_URL_CONSTANT;
use crate::session::Session;
use crate::staging::PREBUILT_SCRIPT;
use serde::Serialize;

/// Widget stylesheet below the Cesium base URL
pub const WIDGETS_STYLESHEET: &str = "Widgets/widgets.css";

/// A single tag to inject into `<head>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlTag {
    pub tag: &'static str,
    /// Attributes in output order
    pub attrs: Vec<(&'static str, String)>,
    /// Inline content (scripts only)
    pub children: Option<String>,
}

impl HtmlTag {
    pub fn stylesheet(href: String) -> Self {
        Self {
            tag: "link",
            attrs: vec![("rel", "stylesheet".to_string()), ("href", href)],
            children: None,
        }
    }

    pub fn script(src: String) -> Self {
        Self {
            tag: "script",
            attrs: vec![("src", src)],
            children: None,
        }
    }

    pub fn inline_script(code: String) -> Self {
        Self {
            tag: "script",
            attrs: Vec::new(),
            children: Some(code),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Render the tag as HTML
    pub fn render(&self) -> String {
        let mut out = format!("<{}", self.tag);
        for (name, value) in &self.attrs {
            out.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
        }
        out.push('>');

        if self.tag == "link" {
            return out;
        }
        if let Some(children) = &self.children {
            out.push_str(children);
        }
        out.push_str(&format!("</{}>", self.tag));
        out
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Compute the tags for one HTML document.
///
/// The stylesheet always comes first. The prebuilt script is added only when
/// the library is loaded as a global in a build, so the global exists before
/// any bundled code runs.
pub fn html_tags(session: &Session, options: &CesiumPluginOptions) -> Vec<HtmlTag> {
    let mut tags = vec![HtmlTag::stylesheet(session.asset_url(WIDGETS_STYLESHEET))];

    if options.base_url_script {
        // A JSON string literal is valid JavaScript; escape `</` so it cannot close the tag.
        let literal = serde_json::Value::String(session.public_url())
            .to_string()
            .replace("</", "<\\/");
        tags.push(HtmlTag::inline_script(format!(
            "window.{BASE_URL_CONSTANT} = {literal};"
        )));
    }

    if session.mode().is_build() && options.externalizes_library() {
        tags.push(HtmlTag::script(session.asset_url(PREBUILT_SCRIPT)));
    }

    tags
}

/// Insert rendered tags before `</head>`, or at the top when there is no head.
pub fn inject_tags(html: &str, tags: &[HtmlTag]) -> String {
    if tags.is_empty() {
        return html.to_string();
    }

    let rendered = tags
        .iter()
        .map(HtmlTag::render)
        .collect::<Vec<_>>()
        .join("\n");

    let lower = html.to_ascii_lowercase();
    match lower.find("</head>") {
        Some(index) => format!("{}{}\n{}", &html[..index], rendered, &html[index..]),
        None => format!("{rendered}\n{html}"),
    }
}
