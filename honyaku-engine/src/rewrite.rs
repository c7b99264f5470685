use crate::dom::{html_to_dom, serialize_dom};
use crate::error::Result;
use crate::translator::SharedTranslator;
use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, NodeData};
use std::cell::RefCell;
use tracing::warn;

/// Outcome counters for one page's rewrite pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteSummary {
    pub nodes_translated: usize,
    pub nodes_failed: usize,
}

/// Elements whose text children are never visible on the rendered page.
fn is_invisible_container(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "noscript" | "template")
}

fn walk_text_nodes<F>(node: &Handle, hidden: bool, f: &mut F)
where
    F: FnMut(&RefCell<StrTendril>),
{
    match node.data {
        NodeData::Text { ref contents } => {
            if !hidden {
                f(contents);
            }
        }
        NodeData::Element { ref name, .. } => {
            let hidden = hidden || is_invisible_container(name.local.as_ref());
            for child in node.children.borrow().iter() {
                walk_text_nodes(child, hidden, f);
            }
        }
        _ => {
            for child in node.children.borrow().iter() {
                walk_text_nodes(child, hidden, f);
            }
        }
    }
}

/// Gathers the trimmed contents of every visible, non-empty text node in
/// document order.
pub fn collect_texts(body: &[u8], charset: Option<&str>) -> Result<Vec<String>> {
    let dom = html_to_dom(body, charset)?;
    let mut texts = Vec::new();
    walk_text_nodes(&dom.document, false, &mut |contents| {
        let text = contents.borrow();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            texts.push(trimmed.to_string());
        }
    });
    Ok(texts)
}

/// Re-parses the page and substitutes the i-th visible text node with the
/// i-th translation, keeping the node's original whitespace framing. `None`
/// entries leave the node untouched.
///
/// Traversal order matches [`collect_texts`] because both walk fresh parses
/// of the same bytes.
pub fn apply_translations(
    body: &[u8],
    charset: Option<&str>,
    translations: &[Option<String>],
) -> Result<Vec<u8>> {
    let dom = html_to_dom(body, charset)?;
    let mut idx = 0;
    walk_text_nodes(&dom.document, false, &mut |contents| {
        let current = contents.borrow().to_string();
        if current.trim().is_empty() {
            return;
        }
        if let Some(Some(translated)) = translations.get(idx) {
            let leading = &current[..current.len() - current.trim_start().len()];
            let trailing = &current[current.trim_end().len()..];
            let mut tendril = contents.borrow_mut();
            tendril.clear();
            tendril.push_slice(leading);
            tendril.push_slice(translated);
            tendril.push_slice(trailing);
        }
        idx += 1;
    });
    serialize_dom(dom)
}

/// Rewrites one fetched page through the Translator.
///
/// Every visible text node is offered to the Translator exactly once. A
/// failed node keeps its original text and is counted in the summary; it
/// never aborts the rest of the page.
pub async fn rewrite_page(
    url: &str,
    body: &[u8],
    charset: Option<&str>,
    translator: &SharedTranslator,
    target_lang: &str,
) -> Result<(Vec<u8>, RewriteSummary)> {
    let texts = collect_texts(body, charset)?;

    let mut summary = RewriteSummary::default();
    let mut translations: Vec<Option<String>> = Vec::with_capacity(texts.len());
    for text in &texts {
        match translator.translate(text, target_lang).await {
            Ok(translated) => {
                summary.nodes_translated += 1;
                translations.push(Some(translated));
            }
            Err(e) => {
                summary.nodes_failed += 1;
                warn!("Translation failed for {:?} on {}: {}", text, url, e);
                translations.push(None);
            }
        }
    }

    let rewritten = apply_translations(body, charset, &translations)?;
    Ok((rewritten, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_visible_text_in_document_order() {
        let html = b"<html><body><h1>Title</h1><p>First</p><p>Second</p></body></html>";
        let texts = collect_texts(html, None).unwrap();
        assert_eq!(texts, vec!["Title", "First", "Second"]);
    }

    #[test]
    fn skips_whitespace_only_nodes() {
        let html = b"<html><body><p>  </p><p>Real</p>\n\n</body></html>";
        let texts = collect_texts(html, None).unwrap();
        assert_eq!(texts, vec!["Real"]);
    }

    #[test]
    fn skips_script_and_style_contents() {
        let html = b"<html><head><style>body { color: red }</style></head>\
            <body><script>var x = 1;</script><p>Shown</p></body></html>";
        let texts = collect_texts(html, None).unwrap();
        assert_eq!(texts, vec!["Shown"]);
    }

    #[test]
    fn applies_translations_preserving_markup() {
        let html = b"<html><body><p>Hello</p><p>World</p></body></html>";
        let translations = vec![
            Some("\u{3053}\u{3093}\u{306b}\u{3061}\u{306f}".to_string()),
            None,
        ];
        let out = apply_translations(html, None, &translations).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("<p>\u{3053}\u{3093}\u{306b}\u{3061}\u{306f}</p>"));
        assert!(out.contains("<p>World</p>"));
    }

    #[test]
    fn keeps_whitespace_framing_around_translated_text() {
        let html = b"<html><body><p>\n  Hello\n</p></body></html>";
        let out =
            apply_translations(html, None, &[Some("Bonjour".to_string())]).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("\n  Bonjour\n"));
    }

    #[test]
    fn no_translations_round_trips_the_tree() {
        let html = b"<html><body><div id=\"a\"><p>Text</p></div></body></html>";
        let out = apply_translations(html, None, &[None]).unwrap();
        let expected = serialize_dom(html_to_dom(html, None).unwrap()).unwrap();
        assert_eq!(out, expected);
    }
}
