//! Text sanitising for the single-byte PDF text encoding.
//!
//! The report uses the PDF base-14 fonts with `WinAnsiEncoding`, so every
//! string drawn on a page must fit in one byte per character. This module
//! folds typographic punctuation down to ASCII, maps the Unicode bullet to
//! the WinAnsi bullet code, drops emphasis tags the model leaves behind, and
//! replaces everything else above U+00FF with `?`.
//!
//! The result is still a Rust `String`, but every `char` in it is in
//! U+0000..=U+00FF and maps 1:1 onto the byte the PDF writer emits
//! (see [`crate::pipeline::pdf::encode_text`]).

/// Byte used for a bullet in `WinAnsiEncoding`.
pub const WINANSI_BULLET: u8 = 0x95;

/// Character standing in for [`WINANSI_BULLET`] inside sanitised strings.
pub const BULLET: char = '\u{0095}';

/// Substitute for characters the encoding cannot represent.
pub const PLACEHOLDER: char = '?';

/// Emphasis tokens removed verbatim. Other tags are left for the generic
/// tag stripper in the parser.
const EMPHASIS_TAGS: [&str; 4] = ["<strong>", "</strong>", "<b>", "</b>"];

/// Sanitise `text` for drawing with a WinAnsi base-14 font.
///
/// Total and pure: never fails, and `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = text
        .replace('\u{2013}', "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', &BULLET.to_string());

    // Removing one token can splice another together ("<str<b>ong>"), so
    // strip until nothing changes.
    loop {
        let before = s.len();
        for tag in EMPHASIS_TAGS {
            s = s.replace(tag, "");
        }
        if s.len() == before {
            break;
        }
    }

    s.chars()
        .map(|c| if is_encodable(c) { c } else { PLACEHOLDER })
        .collect()
}

/// Whether `c` survives the single-byte encoding unchanged.
pub fn is_encodable(c: char) -> bool {
    (c as u32) <= 0xFF
}
