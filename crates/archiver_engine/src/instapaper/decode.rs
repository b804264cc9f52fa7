use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use crate::SourceError;

/// Decode `get_text` bytes into UTF-8: BOM -> Content-Type charset -> chardetng guess.
pub(crate) fn decode_text(bytes: &[u8], content_type: Option<&str>) -> Result<String, SourceError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, encoding);
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn extract_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\''].as_ref()))
    })
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<String, SourceError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(SourceError::Decode(format!(
            "text is not valid {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}
