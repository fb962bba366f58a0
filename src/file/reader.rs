//! Decoding stored files for in-browser viewing.
//!
//! Text detection order: byte order mark, strict UTF-8, then a scored pass
//! over common legacy encodings. Images are never decoded as text.

use encoding_rs::{
    CoderResult, DecoderResult, Encoding, BIG5, EUC_KR, GB18030, SHIFT_JIS, UTF_8, WINDOWS_1252,
};

use crate::file::storage::extension_of;

/// Extensions rendered as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg"];

/// Legacy encodings tried after UTF-8, in tie-break order.
const CANDIDATES: &[&Encoding] = &[GB18030, BIG5, SHIFT_JIS, EUC_KR, WINDOWS_1252];

/// Bytes inspected when ranking candidates.
const SAMPLE_LEN: usize = 64 * 1024;

/// Candidates scoring below this are treated as binary noise.
const MIN_SCORE: f64 = 0.6;

/// Viewable content of a file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    /// Decoded text.
    Text {
        text: String,
        /// Name of the encoding that was used.
        encoding: &'static str,
        /// True when undecodable bytes were replaced.
        lossy: bool,
    },
    /// An image, to be shown via the download route.
    Image { mime_type: String },
}

/// Check whether a filename has an image extension.
pub fn is_image(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Turn stored bytes into viewable content. Never fails.
pub fn read_content(filename: &str, bytes: &[u8]) -> FileContent {
    if is_image(filename) {
        let mime_type = mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string();
        return FileContent::Image { mime_type };
    }

    let (text, encoding, lossy) = decode_text(bytes);
    FileContent::Text {
        text,
        encoding: encoding.name(),
        lossy,
    }
}

/// Decode bytes of unknown encoding.
pub fn decode_text(bytes: &[u8]) -> (String, &'static Encoding, bool) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, lossy) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text.into_owned(), encoding, lossy);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), UTF_8, false);
    }

    let sample = &bytes[..bytes.len().min(SAMPLE_LEN)];
    let truncated = sample.len() < bytes.len();

    let mut ranked: Vec<(&'static Encoding, f64)> = CANDIDATES
        .iter()
        .filter_map(|encoding| {
            decode_strict(encoding, sample, !truncated)
                .map(|text| (*encoding, score(encoding, &text)))
        })
        .filter(|(_, score)| *score >= MIN_SCORE)
        .collect();
    // Stable sort keeps candidate order on equal scores.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (encoding, score) in ranked {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            tracing::debug!(encoding = encoding.name(), score, "Detected text encoding");
            return (text.into_owned(), encoding, false);
        }
    }

    let text = String::from_utf8_lossy(bytes);
    (text.into_owned(), UTF_8, true)
}

/// Decode without replacement. `last = false` tolerates a cut-off sequence
/// at the end of the input.
fn decode_strict(encoding: &'static Encoding, bytes: &[u8], last: bool) -> Option<String> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder.max_utf8_buffer_length_without_replacement(bytes.len())?;
    let mut text = String::with_capacity(capacity);
    match decoder.decode_to_string_without_replacement(bytes, &mut text, last) {
        (DecoderResult::InputEmpty, _) => Some(text),
        _ => None,
    }
}

/// Average plausibility of the decoded characters, between 0 and 1.
fn score(encoding: &'static Encoding, text: &str) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for ch in text.chars() {
        total += char_weight(encoding, ch);
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

fn char_weight(encoding: &'static Encoding, ch: char) -> f64 {
    match ch as u32 {
        0x09 | 0x0A | 0x0D => 1.0,
        0x20..=0x7E => 1.0,
        0x00..=0x1F | 0x7F..=0x9F => 0.0,
        0xFFFD | 0xE000..=0xF8FF => 0.0,
        0xD7 | 0xF7 => 0.2,
        0xC0..=0xFF => 0.8,
        0xA0..=0xBF => 0.2,
        0x2000..=0x206F => 0.8,
        0x3000..=0x303F | 0xFF01..=0xFF60 => 1.0,
        0x3040..=0x30FF => 1.0,
        0xFF61..=0xFF9F => 0.3,
        0xAC00..=0xD7A3 | 0x4E00..=0x9FFF => {
            if in_common_plane(encoding, ch) {
                1.0
            } else {
                0.2
            }
        }
        _ => 0.5,
    }
}

/// For GB18030 and EUC-KR, characters outside the original two-byte
/// GB2312 / KS X 1001 tables are rare in real text.
fn in_common_plane(encoding: &'static Encoding, ch: char) -> bool {
    if encoding != GB18030 && encoding != EUC_KR {
        return true;
    }
    let mut buf = [0u8; 4];
    let mut encoder = encoding.new_encoder();
    let mut out = [0u8; 8];
    let (result, _, written, _) =
        encoder.encode_from_utf8(ch.encode_utf8(&mut buf), &mut out, true);
    result == CoderResult::InputEmpty && written == 2 && out[..2].iter().all(|b| *b >= 0xA1)
}
