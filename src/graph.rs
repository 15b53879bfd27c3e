//! Bidirected graph model and the segment/link line handlers
//!
//! Vertices keep their file-native numeric IDs: the vertex table is sparse,
//! indexed directly by ID, so lookup never searches. Edges record which side
//! (left or right) of each bidirected vertex they attach to.

use crate::gfa::ParseErr;
use crate::index::{LineKind, TAB};
use crate::split::split_fields;

/// The two sides of a vertex in a bidirected graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A segment: numeric ID plus its sequence, when labels were requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub id: u32,
    pub seq: Option<String>,
}

/// A link between two vertex ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub v1_id: u32,
    pub v1_side: Side,
    pub v2_id: u32,
    pub v2_side: Side,
}

const EXPECTED_S_LINE_TOKENS: usize = 3;
const S_LINE_V_ID_IDX: usize = 1;
const S_LINE_SEQ_IDX: usize = 2;

const EXPECTED_L_LINE_TOKENS: usize = 5;
const L_LINE_V1_ID_IDX: usize = 1;
const L_LINE_V1_STRAND_IDX: usize = 2;
const L_LINE_V2_ID_IDX: usize = 3;
const L_LINE_V2_STRAND_IDX: usize = 4;

/// Parse one S line into a [`Vertex`]. The sequence token is dropped right
/// after tokenizing unless `keep_label` is set.
pub fn parse_segment(line: &[u8], keep_label: bool) -> Result<Vertex, ParseErr> {
    let res = split_fields(line, TAB, &[], EXPECTED_S_LINE_TOKENS)?;
    if res.tokens.len() < EXPECTED_S_LINE_TOKENS {
        return Err(ParseErr::NotEnoughFields {
            kind: LineKind::Segment,
            found: res.tokens.len(),
        });
    }
    let mut tokens = res.tokens;

    let id = tokens[S_LINE_V_ID_IDX]
        .parse::<u32>()
        .map_err(ParseErr::InvalidField)?;
    let seq = keep_label.then(|| tokens.swap_remove(S_LINE_SEQ_IDX));

    Ok(Vertex { id, seq })
}

fn strand_symbol(token: &str) -> Result<char, ParseErr> {
    match token.chars().next() {
        Some(c @ ('+' | '-')) => Ok(c),
        Some(c) => Err(ParseErr::InvalidStrand(c)),
        None => Err(ParseErr::InvalidStrand(' ')),
    }
}

/// Parse one L line into an [`Edge`].
///
/// A self-loop is representable in a bidirected graph only when both strand
/// symbols match (`L 1 + 1 +` or `L 1 - 1 -`); those always attach
/// `(Left, Right)`. Mixed-strand self-loops are rejected.
pub fn parse_link(line: &[u8]) -> Result<Edge, ParseErr> {
    let res = split_fields(line, TAB, &[], EXPECTED_L_LINE_TOKENS)?;
    if res.tokens.len() < EXPECTED_L_LINE_TOKENS {
        return Err(ParseErr::NotEnoughFields {
            kind: LineKind::Link,
            found: res.tokens.len(),
        });
    }
    let tokens = res.tokens;

    let v1_id = tokens[L_LINE_V1_ID_IDX]
        .parse::<u32>()
        .map_err(ParseErr::InvalidField)?;
    let v2_id = tokens[L_LINE_V2_ID_IDX]
        .parse::<u32>()
        .map_err(ParseErr::InvalidField)?;
    let v1_strand = strand_symbol(&tokens[L_LINE_V1_STRAND_IDX])?;
    let v2_strand = strand_symbol(&tokens[L_LINE_V2_STRAND_IDX])?;

    let (v1_side, v2_side) = if v1_id == v2_id {
        if v1_strand != v2_strand {
            return Err(ParseErr::MixedSelfLoop(v1_id));
        }
        (Side::Left, Side::Right)
    } else {
        (
            if v1_strand == '+' { Side::Right } else { Side::Left },
            if v2_strand == '+' { Side::Left } else { Side::Right },
        )
    };

    Ok(Edge {
        v1_id,
        v1_side,
        v2_id,
        v2_side,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_segment_with_label() {
        let v = parse_segment(b"S\t11\tACGT", true).unwrap();
        assert_eq!(v.id, 11);
        assert_eq!(v.seq.as_deref(), Some("ACGT"));
    }

    #[test]
    fn parse_segment_without_label() {
        let v = parse_segment(b"S\t11\tACGT", false).unwrap();
        assert_eq!(v.id, 11);
        assert_eq!(v.seq, None);
    }

    #[test]
    fn parse_segment_ignores_optional_tags() {
        let v = parse_segment(b"S\t11\tACGT\tLN:i:4", true).unwrap();
        assert_eq!(v.seq.as_deref(), Some("ACGT"));
    }

    #[test]
    fn parse_segment_rejects_short_line() {
        assert!(matches!(
            parse_segment(b"S\t11", true),
            Err(ParseErr::NotEnoughFields { .. })
        ));
    }

    #[test]
    fn parse_segment_rejects_bad_id() {
        assert!(matches!(
            parse_segment(b"S\televen\tACGT", true),
            Err(ParseErr::InvalidField(_))
        ));
    }

    #[test]
    fn link_strand_to_side_mapping() {
        let e = parse_link(b"L\t1\t+\t2\t+\t0M").unwrap();
        assert_eq!(
            e,
            Edge {
                v1_id: 1,
                v1_side: Side::Right,
                v2_id: 2,
                v2_side: Side::Left,
            }
        );

        let e = parse_link(b"L\t1\t-\t2\t-\t0M").unwrap();
        assert_eq!(e.v1_side, Side::Left);
        assert_eq!(e.v2_side, Side::Right);

        let e = parse_link(b"L\t1\t+\t2\t-\t0M").unwrap();
        assert_eq!(e.v1_side, Side::Right);
        assert_eq!(e.v2_side, Side::Right);
    }

    #[test]
    fn link_without_overlap_field() {
        // the overlap column is past the tokenization bound
        assert!(parse_link(b"L\t1\t+\t2\t+").is_ok());
    }

    #[test]
    fn matching_strand_self_loops() {
        for line in [&b"L\t5\t+\t5\t+\t0M"[..], &b"L\t5\t-\t5\t-\t0M"[..]] {
            let e = parse_link(line).unwrap();
            assert_eq!((e.v1_side, e.v2_side), (Side::Left, Side::Right));
        }
    }

    #[test]
    fn mixed_strand_self_loops_rejected() {
        for line in [&b"L\t5\t+\t5\t-\t0M"[..], &b"L\t5\t-\t5\t+\t0M"[..]] {
            assert!(matches!(parse_link(line), Err(ParseErr::MixedSelfLoop(5))));
        }
    }

    #[test]
    fn link_rejects_bad_strand() {
        assert!(matches!(
            parse_link(b"L\t1\t*\t2\t+\t0M"),
            Err(ParseErr::InvalidStrand('*'))
        ));
    }
}
