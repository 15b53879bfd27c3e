//! Bounded field splitting for GFA lines
//!
//! Every line handler extracts its fields through [`split_fields`]. GFA line
//! kinds have a known minimum field count, but the final field (a sequence or
//! a path string) may carry embedded structure, so splitting stops after
//! `max_tokens` instead of tokenizing the remainder of the line.

use crate::gfa::ParseErr;

/// Outcome of a bounded split: the extracted tokens plus the byte cursor
/// just past the last consumed token.
#[derive(Debug)]
pub struct SplitResult {
    pub tokens: Vec<String>,
    pub consumed: usize,
}

/// Split up to `max_tokens` delimiter-separated fields out of one line's
/// byte span.
///
/// A token ends at `delimiter`, at the first of the `fallbacks` characters,
/// or at the end of the span; the latter two retain the current token and
/// stop the scan. An empty token also stops the scan, without being
/// retained. Each token is an owned copy, so the backing buffer can be
/// released independently of the parse result.
pub fn split_fields(
    bytes: &[u8],
    delimiter: u8,
    fallbacks: &[u8],
    max_tokens: usize,
) -> Result<SplitResult, ParseErr> {
    let mut tokens = Vec::with_capacity(max_tokens);
    let mut pos = 0;

    while tokens.len() < max_tokens && pos < bytes.len() {
        let start = pos;
        let mut at_fallback = false;
        while pos < bytes.len() {
            let b = bytes[pos];
            if b == delimiter {
                break;
            }
            if fallbacks.contains(&b) {
                at_fallback = true;
                break;
            }
            pos += 1;
        }

        if pos == start {
            // empty field: stop without retaining it
            break;
        }

        let token = std::str::from_utf8(&bytes[start..pos])
            .map_err(|_| ParseErr::InvalidUtf8)?
            .to_owned();
        tokens.push(token);

        let at_end = pos == bytes.len();
        if !at_end {
            pos += 1; // step over the delimiter or fallback character
        }
        if at_fallback || at_end {
            break;
        }
    }

    Ok(SplitResult {
        tokens,
        consumed: pos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_tab_delimited_fields() {
        let res = split_fields(b"S\t11\tACGT", b'\t', &[], 3).unwrap();
        assert_eq!(res.tokens, vec!["S", "11", "ACGT"]);
        assert_eq!(res.consumed, 9);
    }

    #[test]
    fn truncates_at_max_tokens() {
        // trailing optional tags are left untokenized
        let res = split_fields(b"S\t11\tACGT\tLN:i:4\tRC:i:0", b'\t', &[], 3).unwrap();
        assert_eq!(res.tokens, vec!["S", "11", "ACGT"]);
        assert_eq!(&b"S\t11\tACGT\tLN:i:4\tRC:i:0"[res.consumed..], b"LN:i:4\tRC:i:0");
    }

    #[test]
    fn fallback_terminates_final_token() {
        let res = split_fields(b"P\tref1\t1+,2+\nL\t1", b'\t', &[b'\n'], 5).unwrap();
        assert_eq!(res.tokens, vec!["P", "ref1", "1+,2+"]);
    }

    #[test]
    fn retains_unterminated_final_token() {
        let res = split_fields(b"H\tVN:Z:1.0", b'\t', &[], 2).unwrap();
        assert_eq!(res.tokens, vec!["H", "VN:Z:1.0"]);
    }

    #[test]
    fn empty_field_stops_scan() {
        let res = split_fields(b"L\t\t+", b'\t', &[], 5).unwrap();
        assert_eq!(res.tokens, vec!["L"]);
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(split_fields(&[b'S', b'\t', 0xff, 0xfe], b'\t', &[], 3).is_err());
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        let res = split_fields(b"", b'\t', &[], 3).unwrap();
        assert!(res.tokens.is_empty());
        assert_eq!(res.consumed, 0);
    }
}
