use crate::error::Result;
use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{RcDom, SerializableHandle};

/// Parses HTML bytes into a DOM, honoring a declared charset when one is known.
pub fn html_to_dom(data: &[u8], charset: Option<&str>) -> Result<RcDom> {
    let s: String = match charset.and_then(|label| Encoding::for_label(label.as_bytes())) {
        Some(encoding) => {
            let (decoded, _, _) = encoding.decode(data);
            decoded.into_owned()
        }
        None => String::from_utf8_lossy(data).into_owned(),
    };

    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())?;
    Ok(dom)
}

/// Serializes a DOM back into UTF-8 HTML bytes.
pub fn serialize_dom(dom: RcDom) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = dom.document.into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;
    Ok(buf)
}

/// Pulls the charset label out of a Content-Type header value.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("charset="))
        .map(|label| label.trim_matches('"'))
}
