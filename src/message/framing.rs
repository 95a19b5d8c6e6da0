//! Splits a buffer containing one or more concatenated JSON objects into
//! the byte ranges of each top-level object.
//!
//! Used when a transport frames multiple envelopes into a single chunk.
//! Behavior is defined only for syntactically valid input: unbalanced
//! braces or an unterminated string produce `None` rather than a partial
//! split.

/// Split `buf` into the byte ranges `[start, end)` of each top-level JSON
/// object it contains, in order.
///
/// Returns `None` if `buf` does not consist solely of whitespace-separated
/// top-level objects, or if braces never balance (truncated/malformed
/// input).
pub fn split_json_objects(buf: &[u8]) -> Option<Vec<(usize, usize)>> {
    let mut ranges = Vec::new();
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut start: Option<usize> = None;

    for (i, &byte) in buf.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
                if depth == 0 {
                    let s = start.take()?;
                    ranges.push((s, i + 1));
                }
            }
            b' ' | b'\t' | b'\r' | b'\n' if depth == 0 => {}
            _ if depth == 0 => return None,
            _ => {}
        }
    }

    if depth != 0 || in_string {
        return None;
    }
    Some(ranges)
}
