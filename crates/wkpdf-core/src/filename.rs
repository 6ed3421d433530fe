//! Filename handling for the `Content-Disposition` header.
//!
//! Browsers disagree on a lot of edge cases in this header, so the filename
//! is reduced to a conservative quoted-string: separators and quotes are
//! dropped, control characters are removed and non-ASCII characters are
//! replaced. The real name survives in an RFC 5987 `filename*` parameter.

/// Character used in place of non-ASCII characters.
const REPLACEMENT: char = '_';

/// Remove characters that can never appear in a header parameter.
fn strip_unsafe(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !matches!(c, ';' | '"') && !c.is_control())
        .collect()
}

/// Sanitize a filename for use in the `Content-Disposition` header.
///
/// Returns the filename as a double-quoted string containing only printable
/// ASCII, with backslashes escaped.
pub fn content_disposition_filename(filename: &str) -> String {
    let mut quoted = String::with_capacity(filename.len() + 2);
    quoted.push('"');
    for c in strip_unsafe(filename).chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            c if c.is_ascii() => quoted.push(c),
            _ => quoted.push(REPLACEMENT),
        }
    }
    quoted.push('"');
    quoted
}

/// Build the full `Content-Disposition` value for a download.
///
/// Returns `None` for an empty filename, in which case the header should be
/// omitted so the client displays the document inline.
pub fn content_disposition(filename: &str) -> Option<String> {
    if filename.is_empty() {
        return None;
    }

    let mut value = format!("attachment; filename={}", content_disposition_filename(filename));

    let stripped = strip_unsafe(filename);
    if !stripped.is_ascii() {
        value.push_str("; filename*=UTF-8''");
        value.push_str(&urlencoding::encode(&stripped));
    }

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Extract the `filename` parameter the way an HTTP client would,
    /// unescaping the quoted-string.
    fn parse_filename_param(header: &str) -> Option<String> {
        let start = header.find("filename=\"")? + "filename=\"".len();
        let mut out = String::new();
        let mut chars = header[start..].chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => out.push(chars.next()?),
                '"' => return Some(out),
                c => out.push(c),
            }
        }
        None
    }

    #[test]
    fn test_plain_filename() {
        assert_eq!(content_disposition_filename("report.pdf"), "\"report.pdf\"");
        assert_eq!(
            content_disposition("report.pdf").as_deref(),
            Some("attachment; filename=\"report.pdf\"")
        );
    }

    #[test]
    fn test_spaces_are_preserved() {
        let header = content_disposition("report 1.pdf").unwrap();
        assert_eq!(header, "attachment; filename=\"report 1.pdf\"");
        assert_eq!(parse_filename_param(&header).as_deref(), Some("report 1.pdf"));
    }

    #[test]
    fn test_quotes_and_separators_removed() {
        let sanitized = content_disposition_filename("a\"b;c.pdf");
        assert_eq!(sanitized, "\"abc.pdf\"");

        let inner = &sanitized[1..sanitized.len() - 1];
        assert!(!inner.contains('"'));
        assert!(!inner.contains(';'));
    }

    #[test]
    fn test_control_characters_removed() {
        let header = content_disposition("evil\r\nSet-Cookie: x\t.pdf").unwrap();
        assert!(!header.chars().any(char::is_control));
        assert_eq!(
            parse_filename_param(&header).as_deref(),
            Some("evilSet-Cookie: x.pdf")
        );
    }

    #[test]
    fn test_backslash_round_trips() {
        let header = content_disposition("back\\slash.pdf").unwrap();
        assert_eq!(header, "attachment; filename=\"back\\\\slash.pdf\"");
        assert_eq!(parse_filename_param(&header).as_deref(), Some("back\\slash.pdf"));
    }

    #[test]
    fn test_non_ascii_fallback() {
        let header = content_disposition("résumé.pdf").unwrap();
        assert!(header.is_ascii());
        assert_eq!(parse_filename_param(&header).as_deref(), Some("r_sum_.pdf"));
        assert!(header.ends_with("; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"));
    }

    #[test]
    fn test_empty_filename() {
        assert_eq!(content_disposition_filename(""), "\"\"");
        assert_eq!(content_disposition(""), None);
    }

    #[test]
    fn test_hostile_names_always_parse() {
        let names = [
            "\"\"\"",
            ";;;",
            "\\\"",
            "tab\there",
            "日本語.pdf",
            "mixed \"quote\"; and\u{7f}del.pdf",
        ];
        for name in names {
            let header = content_disposition(name).unwrap();
            let parsed = parse_filename_param(&header).unwrap();
            assert!(!parsed.contains('"'), "{name:?} -> {parsed:?}");
            assert!(!parsed.chars().any(char::is_control), "{name:?} -> {parsed:?}");
            assert!(header.is_ascii());
        }
    }
}
