//! Sender signature block.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Structured signature appended to every campaign body.
///
/// Empty fields are left out of the rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signature {
    /// Person signing the message.
    pub name: String,
    /// Job title.
    pub title: String,
    /// Phone numbers, one line each.
    pub phones: Vec<String>,
    /// Contact address shown as a `mailto:` link.
    pub email: String,
    /// Website, with or without scheme.
    pub website: String,
    /// Company name.
    pub company: String,
    /// Postal address.
    pub address: String,
    /// Small print at the bottom.
    pub disclaimer: String,
    /// Accent color for the name and company (CSS color).
    pub accent_color: Option<String>,
    /// Logo image embedded inline above the name, if the file exists.
    pub logo_path: Option<PathBuf>,
}

const DEFAULT_ACCENT: &str = "#97B900";

impl Signature {
    /// Returns true when there is nothing to render.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.title.is_empty()
            && self.phones.is_empty()
            && self.email.is_empty()
            && self.website.is_empty()
            && self.company.is_empty()
            && self.address.is_empty()
            && self.disclaimer.is_empty()
    }

    /// Renders the signature as an HTML fragment.
    ///
    /// `logo_cid` is the content id of an inline logo part; when given, an
    /// `<img src="cid:...">` is placed above the name.
    #[must_use]
    pub fn to_html(&self, logo_cid: Option<&str>) -> String {
        let accent = escape_html(self.accent_color.as_deref().unwrap_or(DEFAULT_ACCENT));
        let mut html = String::from(
            "<br><br>\n<div style=\"font-family: Arial, sans-serif; font-size: 12px; color: #333;\">\n",
        );

        if let Some(cid) = logo_cid {
            let alt = if self.company.is_empty() { "logo" } else { &self.company };
            let _ = writeln!(
                html,
                "<img src=\"cid:{}\" alt=\"{}\" style=\"width:180px;\"><br><br>",
                escape_html(cid),
                escape_html(alt)
            );
        }
        if !self.name.is_empty() {
            let _ = writeln!(
                html,
                "<b style=\"color:{accent}; font-size:14px;\">{}</b><br>",
                escape_html(&self.name)
            );
        }
        if !self.title.is_empty() {
            let _ = writeln!(html, "{}<br><br>", escape_html(&self.title));
        }
        for phone in &self.phones {
            let _ = writeln!(html, "Tel: {}<br>", escape_html(phone));
        }
        if !self.email.is_empty() {
            let email = escape_html(&self.email);
            let _ = writeln!(html, "<a href=\"mailto:{email}\">{email}</a><br>");
        }
        if !self.website.is_empty() {
            let shown = escape_html(strip_scheme(&self.website));
            let _ = writeln!(
                html,
                "<a href=\"{}\">{shown}</a><br><br>",
                escape_html(&with_scheme(&self.website))
            );
        }
        if !self.company.is_empty() {
            let _ = writeln!(
                html,
                "<b style=\"color:{accent};\">{}</b><br>",
                escape_html(&self.company)
            );
        }
        if !self.address.is_empty() {
            let _ = writeln!(html, "{}<br><br>", escape_html(&self.address));
        }
        if !self.disclaimer.is_empty() {
            let _ = writeln!(
                html,
                "<small style=\"color:gray;\">{}</small>",
                escape_html(&self.disclaimer)
            );
        }

        html.push_str("</div>\n");
        html
    }

    /// Renders the signature as plain text, preceded by the `-- ` delimiter.
    #[must_use]
    pub fn to_text(&self) -> String {
        let website = strip_scheme(&self.website);
        let lines = [self.name.as_str(), self.title.as_str()]
            .into_iter()
            .chain(self.phones.iter().map(String::as_str))
            .chain([
                self.email.as_str(),
                website,
                self.company.as_str(),
                self.address.as_str(),
            ])
            .filter(|line| !line.is_empty());

        let mut text = String::from("\n\n-- \n");
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        if !self.disclaimer.is_empty() {
            text.push('\n');
            text.push_str(&self.disclaimer);
            text.push('\n');
        }
        text
    }
}

fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Escapes text for use in HTML content and attribute values.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn signature() -> Signature {
        Signature {
            name: "Huseyin POLAT".into(),
            title: "Export Sales Representative".into(),
            phones: vec!["+90 531 765 69 60".into(), "+90 850 420 27 00".into()],
            email: "export1@example.com".into(),
            website: "https://www.example.com".into(),
            company: "Şekeroğlu A.Ş.".into(),
            address: "Sanayi Mah. 27110 Şehitkamil / Gaziantep".into(),
            disclaimer: "This email is confidential.".into(),
            accent_color: None,
            logo_path: None,
        }
    }

    #[test]
    fn test_html_contains_every_field() {
        let html = signature().to_html(None);
        assert!(html.contains("<b style=\"color:#97B900; font-size:14px;\">Huseyin POLAT</b>"));
        assert!(html.contains("Tel: +90 531 765 69 60<br>"));
        assert!(html.contains("<a href=\"mailto:export1@example.com\">export1@example.com</a>"));
        assert!(html.contains("<a href=\"https://www.example.com\">www.example.com</a>"));
        assert!(html.contains("Şekeroğlu A.Ş."));
        assert!(html.contains("<small style=\"color:gray;\">This email is confidential.</small>"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_html_logo_uses_cid() {
        let html = signature().to_html(Some("logo.1@example.com"));
        assert!(html.contains("<img src=\"cid:logo.1@example.com\" alt=\"Şekeroğlu A.Ş.\""));
        assert!(html.find("<img").unwrap() < html.find("Huseyin").unwrap());
    }

    #[test]
    fn test_html_escapes_text() {
        let sig = Signature {
            company: "Smith & <Sons>".into(),
            ..Signature::default()
        };
        assert!(sig.to_html(None).contains("Smith &amp; &lt;Sons&gt;"));
    }

    #[test]
    fn test_text_rendering_skips_empty_fields() {
        let sig = Signature {
            name: "Huseyin POLAT".into(),
            website: "www.example.com".into(),
            ..Signature::default()
        };
        assert_eq!(sig.to_text(), "\n\n-- \nHuseyin POLAT\nwww.example.com\n");

        let bare = Signature {
            website: "example.com".into(),
            ..Signature::default()
        };
        assert!(bare.to_html(None).contains("href=\"https://example.com\""));
    }

    #[test]
    fn test_is_empty() {
        assert!(Signature::default().is_empty());
        assert!(!signature().is_empty());
    }
}
