use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Response body as text, borrowed when the bytes were already clean UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBody<'a> {
    pub text: Cow<'a, str>,
    pub encoding: &'static Encoding,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("body is not valid {0}")]
    Malformed(&'static str),
}

/// Decode a response body. A BOM wins, then the Content-Type charset; bodies
/// without either are read as UTF-8 when valid and sniffed otherwise.
pub fn decode_body<'a>(
    bytes: &'a [u8],
    content_type: Option<&str>,
) -> Result<DecodedBody<'a>, DecodeError> {
    let fallback = content_type
        .and_then(declared_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or_else(|| sniff(bytes));

    // `decode` honours a BOM over `fallback` and reports what it used.
    let (text, used, had_errors) = fallback.decode(bytes);
    if had_errors {
        return Err(DecodeError::Malformed(used.name()));
    }
    Ok(DecodedBody {
        text,
        encoding: used,
    })
}

fn sniff(bytes: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn declared_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\''].as_ref()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn honors_declared_charset() {
        let bytes = [b'"', 0xB3, b'"'];
        let decoded = decode_body(&bytes, Some("application/json; Charset=\"ISO-8859-2\"")).unwrap();
        assert_eq!(decoded.text, "\"ł\"");
        assert_eq!(decoded.encoding.name(), "ISO-8859-2");
    }

    #[test]
    fn utf8_without_header_is_borrowed() {
        let body = "[\"Składniki\"]".as_bytes();
        let decoded = decode_body(body, None).unwrap();
        assert!(matches!(decoded.text, Cow::Borrowed("[\"Składniki\"]")));
        assert_eq!(decoded.encoding, UTF_8);
    }

    #[test]
    fn bom_overrides_declared_charset() {
        let decoded = decode_body(b"\xEF\xBB\xBF[\"\xC5\x82\"]", Some("application/json; charset=latin2"))
            .unwrap();
        assert_eq!(decoded.text, "[\"ł\"]");
        assert_eq!(decoded.encoding, UTF_8);
    }

    #[test]
    fn invalid_bytes_for_declared_charset_fail() {
        let err = decode_body(&[b'[', 0xC3, b']'], Some("application/json; charset=utf-8"))
            .unwrap_err();
        assert_eq!(err, DecodeError::Malformed("UTF-8"));
    }
}
