//! WinAnsiEncoding (cp1252) helpers shared by measurement and content-stream
//! encoding. Both the standard fonts and embedded simple TrueType fonts are
//! written with `/Encoding /WinAnsiEncoding`, so one byte per glyph.

const CP1252_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

pub(crate) fn encode_char(ch: char) -> Option<u8> {
    match ch {
        '\u{0020}'..='\u{007E}' => Some(ch as u8),
        '\u{00A0}'..='\u{00FF}' => Some(ch as u8),
        _ => CP1252_HIGH
            .iter()
            .find(|(_, c)| *c == ch)
            .map(|(byte, _)| *byte),
    }
}

pub(crate) fn decode_byte(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E | 0xA0..=0xFF => Some(byte as char),
        _ => CP1252_HIGH
            .iter()
            .find(|(b, _)| *b == byte)
            .map(|(_, ch)| *ch),
    }
}

/// Encodes text to WinAnsi bytes; characters outside the code page become `?`.
/// Line breaks and tabs collapse to spaces.
pub(crate) fn encode_lossy(text: &str) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(text.len());
    let mut replaced = 0usize;
    for ch in text.chars() {
        let ch = if ch.is_whitespace() && ch != '\u{00A0}' {
            ' '
        } else {
            ch
        };
        match encode_char(ch) {
            Some(byte) => out.push(byte),
            None => {
                replaced += 1;
                out.push(b'?');
            }
        }
    }
    (out, replaced)
}

/// Literal string body for a content stream, with PDF escapes applied and
/// high bytes written as octal.
pub(crate) fn pdf_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b if b < 0x20 || b >= 0x7f => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_and_cp1252_extensions_round_trip() {
        for ch in ['A', 'ñ', 'É', '\u{2019}', '\u{2014}', '\u{20AC}'] {
            let byte = encode_char(ch).expect("encodable");
            assert_eq!(decode_byte(byte), Some(ch));
        }
        assert_eq!(encode_char('\u{4E2D}'), None);
    }

    #[test]
    fn encode_lossy_counts_replacements() {
        let (bytes, replaced) = encode_lossy("Año\t\u{4E2D}");
        assert_eq!(bytes, vec![b'A', 0xF1, b'o', b' ', b'?']);
        assert_eq!(replaced, 1);
    }

    #[test]
    fn pdf_literal_escapes_delimiters_and_high_bytes() {
        assert_eq!(pdf_literal(b"a(b)\\"), "a\\(b\\)\\\\");
        assert_eq!(pdf_literal(&[0xF1]), "\\361");
    }
}
