//! Baseline font for text overlays
//!
//! Text overlays use the standard Helvetica font with WinAnsiEncoding. It is
//! one of the 14 standard fonts every conforming reader provides, so no font
//! program has to be embedded and one font dictionary serves every page.

use lopdf::{Dictionary, Object};

/// PostScript name of the baseline font
pub const BASELINE_FONT: &str = "Helvetica";

/// Build the font dictionary for the baseline font
pub fn baseline_font_dictionary() -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"Font".to_vec()));
    dict.set("Subtype", Object::Name(b"Type1".to_vec()));
    dict.set("BaseFont", Object::Name(BASELINE_FONT.as_bytes().to_vec()));
    dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    dict
}

/// Encoded text plus the number of characters that had no WinAnsi code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub bytes: Vec<u8>,
    pub replaced: usize,
}

impl EncodedText {
    /// Hex string operand for `Tj`, e.g. `<48656C6C6F>`
    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(self.bytes.len() * 2 + 2);
        hex.push('<');
        for byte in &self.bytes {
            hex.push_str(&format!("{byte:02X}"));
        }
        hex.push('>');
        hex
    }
}

/// Encode a single line of text to WinAnsi (Windows-1252)
///
/// Characters outside the encoding become `?`. Tabs become spaces; other
/// control characters are dropped.
pub fn encode_win_ansi(text: &str) -> EncodedText {
    let mut bytes = Vec::with_capacity(text.len());
    let mut replaced = 0;

    for c in text.chars() {
        match win_ansi_code(c) {
            Some(code) => bytes.push(code),
            None if c == '\t' => bytes.push(b' '),
            None if c.is_control() => {}
            None => {
                bytes.push(b'?');
                replaced += 1;
            }
        }
    }

    EncodedText { bytes, replaced }
}

fn win_ansi_code(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => {
            let byte = match c {
                '€' => 0x80,
                '‚' => 0x82,
                'ƒ' => 0x83,
                '„' => 0x84,
                '…' => 0x85,
                '†' => 0x86,
                '‡' => 0x87,
                'ˆ' => 0x88,
                '‰' => 0x89,
                'Š' => 0x8A,
                '‹' => 0x8B,
                'Œ' => 0x8C,
                'Ž' => 0x8E,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '˜' => 0x98,
                '™' => 0x99,
                'š' => 0x9A,
                '›' => 0x9B,
                'œ' => 0x9C,
                'ž' => 0x9E,
                'Ÿ' => 0x9F,
                _ => return None,
            };
            Some(byte)
        }
    }
}
