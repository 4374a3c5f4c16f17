// src/ingest/decode.rs
//! Turn raw feed bytes into UTF-8 text before parsing.
//!
//! Detection order: byte-order mark, then the `encoding` pseudo-attribute of
//! the XML declaration, then UTF-8.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::OnceCell;
use regex::bytes::Regex;

use crate::error::FeedError;

/// Declared or sniffed encoding of a raw document.
pub fn detect_encoding(bytes: &[u8]) -> Result<&'static Encoding, FeedError> {
    if let Some((enc, _bom_len)) = Encoding::for_bom(bytes) {
        return Ok(enc);
    }

    static RE_DECL: OnceCell<Regex> = OnceCell::new();
    let re = RE_DECL.get_or_init(|| {
        Regex::new(r#"^\s*<\?xml[^>]*?\sencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
            .expect("static encoding regex")
    });

    // The declaration is ASCII in every encoding we can honor.
    let head = &bytes[..bytes.len().min(256)];
    match re.captures(head).and_then(|c| c.get(1)) {
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| FeedError::Decode(String::from_utf8_lossy(label.as_bytes()).into())),
        None => Ok(UTF_8),
    }
}

/// Decode a raw document to text. Malformed sequences become U+FFFD.
pub fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>, FeedError> {
    let enc = detect_encoding(bytes)?;
    let (text, actual, had_errors) = enc.decode(bytes);
    if had_errors {
        tracing::warn!(
            target: "ingest",
            encoding = actual.name(),
            "feed contained byte sequences invalid for its encoding"
        );
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_16LE, WINDOWS_1252};

    #[test]
    fn defaults_to_utf8_without_declaration() {
        assert_eq!(detect_encoding(b"<a/>").unwrap(), UTF_8);
    }

    #[test]
    fn honours_declared_legacy_encoding() {
        let doc = br#"<?xml version="1.0" encoding="ISO-8859-1"?><a/>"#;
        // WHATWG maps latin-1 labels to windows-1252.
        assert_eq!(detect_encoding(doc).unwrap(), WINDOWS_1252);
    }

    #[test]
    fn bom_wins_over_declaration() {
        let mut doc = vec![0xFF, 0xFE];
        for b in "<a/>".bytes() {
            doc.extend_from_slice(&[b, 0]);
        }
        assert_eq!(detect_encoding(&doc).unwrap(), UTF_16LE);
        assert_eq!(decode_document(&doc).unwrap(), "<a/>");
    }

    #[test]
    fn unknown_label_is_an_error() {
        let doc = br#"<?xml version="1.0" encoding="x-klingon"?><a/>"#;
        assert!(matches!(detect_encoding(doc), Err(FeedError::Decode(_))));
    }

    #[test]
    fn decodes_windows_1252_accents() {
        let (bytes, _, _) = WINDOWS_1252
            .encode(r#"<?xml version="1.0" encoding="windows-1252"?><c>poupée</c>"#);
        let text = decode_document(&bytes).unwrap();
        assert!(text.contains("poupée"));
    }
}
