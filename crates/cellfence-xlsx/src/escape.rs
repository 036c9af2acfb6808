//! Text escaping shared by the reader and writer
//!
//! SpreadsheetML has two layers: ordinary XML entity escaping, and the
//! `_xHHHH_` form used for characters XML 1.0 cannot carry (most control
//! characters). A literal `_xHHHH_` in cell text is itself protected by
//! escaping its leading underscore as `_x005F_`.

/// Escape text for element content and attribute values
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether `<t>` content needs `xml:space="preserve"`
pub(crate) fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) || s.contains('\n')
}

/// Apply `_xHHHH_` escaping for cell text
pub(crate) fn encode_excel_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if c == '_' && escape_code_at(&s[i..]).is_some() {
            out.push_str("_x005F_");
        } else if is_xml_restricted(c) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Undo `_xHHHH_` escaping; malformed sequences are left as they are
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('_') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match escape_code_at(tail).and_then(char::from_u32) {
            Some(decoded) => {
                out.push(decoded);
                rest = &tail[7..];
            }
            None => {
                out.push('_');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// The code point of an `_xHHHH_` sequence at the start of `s`
fn escape_code_at(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.len() < 7 || bytes[0] != b'_' || bytes[1] != b'x' || bytes[6] != b'_' {
        return None;
    }
    let hex = &s[2..6];
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn is_xml_restricted(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_control_characters() {
        assert_eq!(decode_excel_escapes("hello_x000d_world"), "hello\rworld");
        assert_eq!(decode_excel_escapes("col1_x0009_col2"), "col1\tcol2");
        assert_eq!(
            decode_excel_escapes("line1_x000D__x000A_line2"),
            "line1\r\nline2"
        );
    }

    #[test]
    fn test_decode_escaped_underscore() {
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
        assert_eq!(decode_excel_escapes("_x005F_x0041_"), "_x0041_");
    }

    #[test]
    fn test_decode_leaves_partial_sequences() {
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
        assert_eq!(decode_excel_escapes("a_b_c"), "a_b_c");
        assert_eq!(decode_excel_escapes("_xZZZZ_"), "_xZZZZ_");
    }

    #[test]
    fn test_encode_protects_literal_sequences() {
        assert_eq!(encode_excel_escapes("_x0041_"), "_x005F_x0041_");
        assert_eq!(encode_excel_escapes("bell\u{7}"), "bell_x0007_");
        assert_eq!(encode_excel_escapes("tab\tstays"), "tab\tstays");
        assert_eq!(decode_excel_escapes(&encode_excel_escapes("_x0041_\u{1}")), "_x0041_\u{1}");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
    }

    #[test]
    fn test_space_preserve() {
        assert!(needs_space_preserve(" lead"));
        assert!(needs_space_preserve("trail "));
        assert!(needs_space_preserve("two\nlines"));
        assert!(!needs_space_preserve("plain text"));
    }
}
