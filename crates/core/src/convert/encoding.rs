//! Text encoding detection.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1252};
use tracing::debug;

use super::ConvertError;

/// Tried in order after the detector's guess.
const FALLBACK_ENCODINGS: &[&Encoding] = &[UTF_8, WINDOWS_1252, ISO_8859_15];

/// Decode subtitle bytes without assuming UTF-8.
///
/// A byte order mark wins outright. Otherwise the detector's guess is tried
/// first, then the fallbacks; the first strict decode (no replacement
/// characters) is returned.
pub fn decode(bytes: &[u8]) -> Result<String, ConvertError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        if let Some(text) =
            encoding.decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        {
            debug!(encoding = encoding.name(), "Decoded subtitle using BOM");
            return Ok(text.into_owned());
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(None, true);

    for encoding in std::iter::once(guessed).chain(FALLBACK_ENCODINGS.iter().copied()) {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            debug!(
                encoding = encoding.name(),
                guessed = guessed.name(),
                "Decoded subtitle"
            );
            return Ok(text.into_owned());
        }
    }

    Err(ConvertError::Undecodable)
}
