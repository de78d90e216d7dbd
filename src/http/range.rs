//! HTTP Range request parsing module
//!
//! Single-range `bytes=` parsing per RFC 7233. Ranges are resolved
//! against the concrete file size at parse time, so downstream code
//! only ever sees inclusive start/end byte positions.

/// A byte range resolved against the file size, both bounds inclusive.
/// Construction guarantees `start <= end < file_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

/// Outcome of parsing a `Range` header against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedRange {
    /// No header, non-bytes unit, or malformed value: serve the full body
    Full,
    /// A single satisfiable range
    Partial(ByteRange),
    /// Syntactically valid but unsatisfiable: respond 416
    Unsatisfiable,
}

/// Parse an HTTP `Range` header value.
///
/// Supported forms:
/// - `bytes=start-end`
/// - `bytes=start-` (open-ended)
/// - `bytes=-suffix` (last suffix bytes)
///
/// Multi-range requests and malformed values are ignored rather than
/// rejected; the caller serves the full content.
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> ParsedRange {
    let Some(header) = range_header else {
        return ParsedRange::Full;
    };

    let Some(spec) = header.strip_prefix("bytes=") else {
        return ParsedRange::Full; // not a bytes unit
    };

    // Single ranges only
    if spec.contains(',') {
        return ParsedRange::Full;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return ParsedRange::Full;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        parse_suffix_range(end_str, file_size)
    } else {
        parse_bounded_range(start_str, end_str, file_size)
    }
}

/// Parse a suffix range such as `-500` (the last 500 bytes).
fn parse_suffix_range(suffix_str: &str, file_size: usize) -> ParsedRange {
    let Ok(suffix) = suffix_str.parse::<usize>() else {
        return ParsedRange::Full;
    };

    if suffix == 0 || file_size == 0 {
        return ParsedRange::Unsatisfiable;
    }

    // A suffix longer than the file covers the whole file
    ParsedRange::Partial(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

/// Parse a `start-` or `start-end` range.
fn parse_bounded_range(start_str: &str, end_str: &str, file_size: usize) -> ParsedRange {
    let Ok(start) = start_str.parse::<usize>() else {
        return ParsedRange::Full;
    };

    if start >= file_size {
        return ParsedRange::Unsatisfiable;
    }

    let end = if end_str.is_empty() {
        file_size - 1
    } else {
        let Ok(end) = end_str.parse::<usize>() else {
            return ParsedRange::Full;
        };
        if end < start {
            return ParsedRange::Unsatisfiable;
        }
        // Clamp to the last byte
        end.min(file_size - 1)
    };

    ParsedRange::Partial(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), ParsedRange::Full);
    }

    #[test]
    fn test_bounded_range() {
        let parsed = parse_range_header(Some("bytes=0-9"), 100);
        assert_eq!(parsed, ParsedRange::Partial(ByteRange { start: 0, end: 9 }));
    }

    #[test]
    fn test_open_range() {
        assert_eq!(
            parse_range_header(Some("bytes=50-"), 100),
            ParsedRange::Partial(ByteRange { start: 50, end: 99 })
        );
    }

    #[test]
    fn test_end_clamped_to_file_size() {
        assert_eq!(
            parse_range_header(Some("bytes=90-200"), 100),
            ParsedRange::Partial(ByteRange { start: 90, end: 99 })
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range_header(Some("bytes=-20"), 100),
            ParsedRange::Partial(ByteRange { start: 80, end: 99 })
        );
        // A suffix longer than the file covers the whole file
        assert_eq!(
            parse_range_header(Some("bytes=-500"), 100),
            ParsedRange::Partial(ByteRange { start: 0, end: 99 })
        );
    }

    #[test]
    fn test_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=200-"), 100),
            ParsedRange::Unsatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=30-20"), 100),
            ParsedRange::Unsatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=-0"), 100),
            ParsedRange::Unsatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=0-"), 0),
            ParsedRange::Unsatisfiable
        );
    }

    #[test]
    fn test_malformed_ignored() {
        assert_eq!(parse_range_header(Some("bytes=a-b"), 100), ParsedRange::Full);
        assert_eq!(
            parse_range_header(Some("bytes=0-9,20-29"), 100),
            ParsedRange::Full
        );
        assert_eq!(parse_range_header(Some("items=0-9"), 100), ParsedRange::Full);
    }
}
