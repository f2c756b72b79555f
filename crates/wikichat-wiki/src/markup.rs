//! Candidate extraction from rendered disambiguation pages.
//!
//! A disambiguation page lists one meaning per `<li>`; the first link of
//! each item names the candidate article. Table-of-contents items are not
//! candidates.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<li\b([^>]*)>").expect("Invalid list item regex"));

/// End of the current item's own content: its close tag or a nested item.
static ITEM_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</li\s*>|<li\b").expect("Invalid item end regex"));

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>(.*?)</a\s*>").expect("Invalid anchor regex"));

static CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*["']([^"']*)["']"#).expect("Invalid class regex")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid tag regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("Invalid entity regex")
});

/// Text of the first link in every list item, in document order.
pub(crate) fn list_item_links(html: &str) -> Vec<String> {
    let mut links = Vec::new();
    for item in LIST_ITEM.captures_iter(html) {
        let (Some(tag), Some(attrs)) = (item.get(0), item.get(1)) else {
            continue;
        };
        if is_toc_item(attrs.as_str()) {
            continue;
        }
        let rest = &html[tag.end()..];
        let content = match ITEM_END.find(rest) {
            Some(end) => &rest[..end.start()],
            None => rest,
        };
        let Some(label) = ANCHOR.captures(content).and_then(|a| a.get(1)) else {
            continue;
        };
        let text = decode_entities(&TAG.replace_all(label.as_str(), ""));
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            links.push(text);
        }
    }
    links
}

fn is_toc_item(attrs: &str) -> bool {
    CLASS_ATTR
        .captures(attrs)
        .and_then(|c| c.get(1))
        .is_some_and(|class| class.as_str().contains("tocsection"))
}

/// Decode the character references MediaWiki emits in link text.
///
/// Unknown named entities are left as written.
fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = if let Some(hex) =
                        name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"))
                    {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        name.strip_prefix('#').and_then(|dec| dec.parse().ok())
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
