//! PlantUML text encoding.
//!
//! PlantUML servers accept a diagram inside the URL path: the UTF-8 source is
//! compressed with raw DEFLATE and written out with PlantUML's own 64-symbol
//! alphabet. Servers decode this exact format, so the bit layout here must not
//! drift.

use std::io::{Read, Write};
use std::string::FromUtf8Error;

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use thiserror::Error;

use super::{DiagramError, DiagramId, DiagramKind, DiagramRenderer, RenderedDiagram};
use crate::theme::Theme;

/// Public PlantUML server.
pub const DEFAULT_SERVER: &str = "https://www.plantuml.com/plantuml";

/// Symbol for each 6-bit value: `0-9`, `A-Z`, `a-z`, `-`, `_`.
const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("deflate failed: {0}")]
    Compress(#[source] std::io::Error),

    #[error("inflate failed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("invalid symbol {0:?} in encoded diagram")]
    InvalidSymbol(char),

    #[error("encoded length {0} is not a multiple of 4")]
    Truncated(usize),

    #[error("decoded diagram is not UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Encode diagram source into PlantUML's URL form.
///
/// ```
/// let encoded = markpane::diagram::plantuml::encode("@startuml\nA->B\n@enduml").unwrap();
/// assert!(!encoded.is_empty());
/// assert_eq!(encoded.len() % 4, 0);
/// ```
///
/// # Errors
/// Returns [`CodecError::Compress`] if the deflate stream cannot be written.
pub fn encode(source: &str) -> Result<String, CodecError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(source.as_bytes())
        .map_err(CodecError::Compress)?;
    let compressed = encoder.finish().map_err(CodecError::Compress)?;
    Ok(encode64(&compressed))
}

/// Build `<server>/svg/<encoded>` for `source`.
///
/// # Errors
/// Propagates encoding failures from [`encode`].
pub fn svg_url(server: &str, source: &str) -> Result<String, CodecError> {
    let encoded = encode(source)?;
    Ok(format!("{}/svg/{encoded}", server.trim_end_matches('/')))
}

/// Reverse [`encode`]: alphabet lookup, then inflate.
///
/// # Errors
/// Fails on symbols outside the alphabet, a length that is not a multiple of
/// four, a corrupt deflate stream, or non-UTF-8 output.
pub fn decode(encoded: &str) -> Result<String, CodecError> {
    let sextets = encoded
        .chars()
        .map(|ch| decode6bit(ch).ok_or(CodecError::InvalidSymbol(ch)))
        .collect::<Result<Vec<u8>, _>>()?;
    if sextets.len() % 4 != 0 {
        return Err(CodecError::Truncated(sextets.len()));
    }

    let mut compressed = Vec::with_capacity(sextets.len() / 4 * 3);
    for group in sextets.chunks_exact(4) {
        let (c1, c2, c3, c4) = (group[0], group[1], group[2], group[3]);
        compressed.push((c1 << 2) | (c2 >> 4));
        compressed.push(((c2 & 0x0F) << 4) | (c3 >> 2));
        compressed.push(((c3 & 0x03) << 6) | c4);
    }

    // Padding bytes after the final deflate block are never read.
    let mut decoder = DeflateDecoder::new(compressed.as_slice());
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(CodecError::Decompress)?;
    Ok(String::from_utf8(bytes)?)
}

fn encode64(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b1 = chunk[0];
        let b2 = chunk.get(1).copied().unwrap_or(0);
        let b3 = chunk.get(2).copied().unwrap_or(0);
        out.push(encode6bit(b1 >> 2));
        out.push(encode6bit(((b1 & 0x03) << 4) | (b2 >> 4)));
        out.push(encode6bit(((b2 & 0x0F) << 2) | (b3 >> 6)));
        out.push(encode6bit(b3 & 0x3F));
    }
    out
}

const fn encode6bit(value: u8) -> char {
    ALPHABET[(value & 0x3F) as usize] as char
}

const fn decode6bit(ch: char) -> Option<u8> {
    let value = match ch {
        '0'..='9' => ch as u32 - '0' as u32,
        'A'..='Z' => ch as u32 - 'A' as u32 + 10,
        'a'..='z' => ch as u32 - 'a' as u32 + 36,
        '-' => 62,
        '_' => 63,
        _ => return None,
    };
    #[allow(clippy::cast_possible_truncation)]
    Some(value as u8)
}

/// Renders PlantUML sections as `<img>` references to a PlantUML server.
#[derive(Debug, Clone)]
pub struct PlantUmlRenderer {
    server: String,
}

impl PlantUmlRenderer {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
        }
    }
}

impl Default for PlantUmlRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER)
    }
}

impl DiagramRenderer for PlantUmlRenderer {
    fn kind(&self) -> DiagramKind {
        DiagramKind::PlantUml
    }

    fn render(&self, id: &DiagramId, source: &str) -> Result<RenderedDiagram, DiagramError> {
        let url = svg_url(&self.server, source)?;
        tracing::debug!(%id, bytes = source.len(), "encoded plantuml diagram");
        Ok(RenderedDiagram::Image {
            url,
            alt: format!("PlantUML diagram {id}"),
        })
    }

    // Dark pages invert the image with CSS; the URL is theme independent.
    fn set_theme(&mut self, _theme: Theme) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_alphabet(s: &str) -> bool {
        s.bytes().all(|b| ALPHABET.contains(&b))
    }

    #[test]
    fn test_alphabet_order() {
        assert_eq!(encode6bit(0), '0');
        assert_eq!(encode6bit(9), '9');
        assert_eq!(encode6bit(10), 'A');
        assert_eq!(encode6bit(35), 'Z');
        assert_eq!(encode6bit(36), 'a');
        assert_eq!(encode6bit(61), 'z');
        assert_eq!(encode6bit(62), '-');
        assert_eq!(encode6bit(63), '_');
    }

    #[test]
    fn test_decode6bit_inverts_encode6bit() {
        for value in 0..64u8 {
            assert_eq!(decode6bit(encode6bit(value)), Some(value));
        }
        assert_eq!(decode6bit('?'), None);
        assert_eq!(decode6bit('='), None);
        assert_eq!(decode6bit('+'), None);
    }

    #[test]
    fn test_encode64_full_group() {
        // 0xFF 0xFF 0xFF -> four 63s
        assert_eq!(encode64(&[0xFF, 0xFF, 0xFF]), "____");
        assert_eq!(encode64(&[0, 0, 0]), "0000");
    }

    #[test]
    fn test_encode64_pads_with_zero_symbols() {
        // One byte: 0b111111_11 -> 63, 0b11_0000 -> 48, then two zero sextets.
        assert_eq!(encode64(&[0xFF]), "_m00");
        // Two bytes keep the trailing zero sextet too.
        assert_eq!(encode64(&[0xFF, 0xFF]), "__y0");
    }

    #[test]
    fn test_encode64_output_length() {
        for n in 0..20 {
            let data = vec![0xA5u8; n];
            assert_eq!(encode64(&data).len(), n.div_ceil(3) * 4);
        }
    }

    #[test]
    fn test_encode_sample_diagram_uses_alphabet_only() {
        let encoded = encode("@startuml\nA->B\n@enduml").unwrap();
        assert!(!encoded.is_empty());
        assert!(is_alphabet(&encoded), "unexpected symbol in {encoded}");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let source = "@startuml\nAlice -> Bob: Hello\n@enduml";
        assert_eq!(encode(source).unwrap(), encode(source).unwrap());
    }

    #[test]
    fn test_round_trip_empty() {
        let encoded = encode("").unwrap();
        assert_eq!(decode(&encoded).unwrap(), "");
    }

    #[test]
    fn test_round_trip_multibyte() {
        let source = "@startuml\nアリス -> ボブ: こんにちは 🎉\n@enduml";
        assert_eq!(decode(&encode(source).unwrap()).unwrap(), source);
    }

    #[test]
    fn test_round_trip_control_and_delimiter_characters() {
        let source = "a\u{0}b\u{1}markpane:0:mermaid-0\u{2}___DIAGRAM___";
        assert_eq!(decode(&encode(source).unwrap()).unwrap(), source);
    }

    #[test]
    fn test_svg_url_shape() {
        let url = svg_url("https://example.com/plantuml/", "@startuml\nA->B\n@enduml").unwrap();
        let encoded = url
            .strip_prefix("https://example.com/plantuml/svg/")
            .expect("url prefix");
        assert!(is_alphabet(encoded));
    }

    #[test]
    fn test_decode_rejects_foreign_symbol() {
        assert!(matches!(decode("ab?d"), Err(CodecError::InvalidSymbol('?'))));
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        assert!(matches!(decode("abc"), Err(CodecError::Truncated(3))));
    }

    #[test]
    fn test_renderer_produces_image() {
        let renderer = PlantUmlRenderer::new("http://localhost:8080");
        let id = DiagramId::new(DiagramKind::PlantUml, 0);
        let out = renderer.render(&id, "@startuml\nA->B\n@enduml").unwrap();
        match out {
            RenderedDiagram::Image { url, alt } => {
                assert!(url.starts_with("http://localhost:8080/svg/"));
                assert_eq!(alt, "PlantUML diagram plantuml-0");
            }
            RenderedDiagram::Markup { .. } => panic!("expected image"),
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip_arbitrary_text(source in any::<String>()) {
                let encoded = encode(&source).unwrap();
                prop_assert!(is_alphabet(&encoded));
                prop_assert_eq!(encoded.len() % 4, 0);
                prop_assert_eq!(decode(&encoded).unwrap(), source);
            }
        }
    }
}
