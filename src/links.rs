//! Hyperlink extraction from message bodies
//!
//! Bodies arrive from the bridge as plain text, but HTML messages frequently
//! leak anchor markup through. Both shapes are handled: `<a href="...">`
//! anchors keep their link text, bare URLs use the URL itself as text.
//! Results are deduplicated by href and bounded.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::EmailLink;

/// Upper bound on extracted links per message
const MAX_LINKS: usize = 20;

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#)
        .expect("anchor regex is valid")
});

static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>\)\]\}\x22']+").expect("url regex is valid"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"));

/// Extract up to [`MAX_LINKS`] hyperlinks from a message body
pub fn extract_links(body: &str) -> Vec<EmailLink> {
    let mut links: Vec<EmailLink> = Vec::new();

    for captures in ANCHOR_RE.captures_iter(body) {
        let href = captures[1].trim().to_owned();
        let text = TAG_RE.replace_all(&captures[2], "").trim().to_owned();
        push_link(
            &mut links,
            if text.is_empty() { href.clone() } else { text },
            href,
        );
        if links.len() >= MAX_LINKS {
            return links;
        }
    }

    for found in BARE_URL_RE.find_iter(body) {
        let href = trim_trailing_punctuation(found.as_str()).to_owned();
        push_link(&mut links, href.clone(), href);
        if links.len() >= MAX_LINKS {
            break;
        }
    }

    links
}

fn push_link(links: &mut Vec<EmailLink>, text: String, href: String) {
    if href.is_empty() || links.iter().any(|link| link.href == href) {
        return;
    }
    links.push(EmailLink { text, href });
}

/// URLs at sentence ends drag punctuation along; strip it
fn trim_trailing_punctuation(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}
