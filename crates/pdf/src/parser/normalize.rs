use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(char, &str); 5] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Normalization applied identically to both extraction passes.
///
/// NFC, ligature expansion and removal of U+FFFD. Whitespace is left alone:
/// the flat text must keep its own spacing so section slices read naturally.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfc() {
        match LIGATURES.iter().find(|(lig, _)| *lig == ch) {
            Some((_, expanded)) => out.push_str(expanded),
            None if ch == '\u{FFFD}' => {}
            None => out.push(ch),
        }
    }
    out
}
