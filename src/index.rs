//! Structural scan and line indexing
//!
//! Parsing runs two sequential passes over the mapped bytes before any field
//! is interpreted. Pass 1 ([`scan_structure`]) classifies every line by its
//! leading tag, counts lines per kind, detects the GFA version and tracks the
//! numeric vertex-ID range. Pass 2 ([`index_lines`]) records a [`LineSpan`]
//! per line into per-kind arrays sized exactly from the pass-1 counts. The
//! spans feed the population workers, which never re-scan line boundaries.

use crate::gfa::ParseErr;
use crate::split::split_fields;
use log::info;

pub const TAB: u8 = b'\t';
pub const NEWLINE: u8 = b'\n';

/// GFA format versions this parser accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfaVersion {
    V1_0,
    V1_1,
}

/// Header version token → version, as a compile-time table.
pub const GFA_VERSION_TAGS: [(&str, GfaVersion); 2] = [
    ("VN:Z:1.0", GfaVersion::V1_0),
    ("VN:Z:1.1", GfaVersion::V1_1),
];

impl GfaVersion {
    pub fn from_tag(tag: &str) -> Option<GfaVersion> {
        GFA_VERSION_TAGS
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| *v)
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            GfaVersion::V1_0 => "VN:Z:1.0",
            GfaVersion::V1_1 => "VN:Z:1.1",
        }
    }
}

/// The recognized line kinds. Any other leading tag aborts the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Segment,
    Link,
    Path,
    Walk,
}

impl LineKind {
    pub fn from_tag(tag: u8) -> Option<LineKind> {
        match tag {
            b'H' => Some(LineKind::Header),
            b'S' => Some(LineKind::Segment),
            b'L' => Some(LineKind::Link),
            b'P' => Some(LineKind::Path),
            b'W' => Some(LineKind::Walk),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LineKind::Header => "H",
            LineKind::Segment => "S",
            LineKind::Link => "L",
            LineKind::Path => "P",
            LineKind::Walk => "W",
        }
    }
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A view into one line of the mapped buffer. Never copies the backing
/// bytes; handlers copy out only the tokens they retain.
#[derive(Debug, Clone, Copy)]
pub struct LineSpan {
    pub start: usize,
    pub len: u32,
}

impl LineSpan {
    pub fn bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.start..self.start + self.len as usize]
    }
}

/// Pass-1 output: per-kind line counts, detected version and vertex-ID range.
#[derive(Debug)]
pub struct ScanSummary {
    pub version: Option<GfaVersion>,
    pub segment_count: usize,
    pub link_count: usize,
    pub path_count: usize,
    pub walk_count: usize,
    pub min_vertex_id: u32,
    pub max_vertex_id: u32,
}

impl Default for ScanSummary {
    fn default() -> Self {
        ScanSummary {
            version: None,
            segment_count: 0,
            link_count: 0,
            path_count: 0,
            walk_count: 0,
            min_vertex_id: u32::MAX,
            max_vertex_id: 0,
        }
    }
}

impl ScanSummary {
    pub fn line_count(&self) -> usize {
        self.segment_count + self.link_count + self.path_count + self.walk_count
    }
}

/// Pass-2 output: per-kind spans, in file order within each kind.
#[derive(Debug, Default)]
pub struct LineIndex {
    pub segments: Vec<LineSpan>,
    pub links: Vec<LineSpan>,
    pub paths: Vec<LineSpan>,
    pub walks: Vec<LineSpan>,
}

const EXPECTED_H_LINE_TOKENS: usize = 2;
const H_LINE_VERSION_IDX: usize = 1;

/// Extract the numeric vertex ID from an S line (second tab field).
fn segment_vertex_id(line: &[u8]) -> Result<u32, ParseErr> {
    let mut fields = line.split(|&b| b == TAB);
    fields.next(); // tag
    let id_field = fields.next().ok_or(ParseErr::NotEnoughFields {
        kind: LineKind::Segment,
        found: 1,
    })?;
    std::str::from_utf8(id_field)
        .map_err(|_| ParseErr::InvalidUtf8)?
        .parse::<u32>()
        .map_err(ParseErr::InvalidField)
}

fn header_version(line: &[u8]) -> Result<GfaVersion, ParseErr> {
    let res = split_fields(line, TAB, &[NEWLINE], EXPECTED_H_LINE_TOKENS)?;
    if res.tokens.len() < EXPECTED_H_LINE_TOKENS {
        return Err(ParseErr::NotEnoughFields {
            kind: LineKind::Header,
            found: res.tokens.len(),
        });
    }
    let tag = &res.tokens[H_LINE_VERSION_IDX];
    match GfaVersion::from_tag(tag) {
        Some(version) => {
            info!("Detected GFA version: {}", version.as_tag());
            Ok(version)
        }
        None => Err(ParseErr::UnsupportedVersion(tag.clone())),
    }
}

fn next_line_end(buf: &[u8], pos: usize) -> usize {
    buf[pos..]
        .iter()
        .position(|&b| b == NEWLINE)
        .map(|i| pos + i)
        .unwrap_or(buf.len())
}

/// Pass 1: classify every line, inspecting only the leading tag byte (plus
/// the version token of H lines and the ID field of S lines).
pub fn scan_structure(buf: &[u8]) -> Result<ScanSummary, ParseErr> {
    let mut summary = ScanSummary::default();
    let mut pos = 0;
    let mut line_no = 1; // line numbers in errors are 1-based

    while pos < buf.len() {
        let end = next_line_end(buf, pos);
        let line = &buf[pos..end];

        match line.first().copied().and_then(LineKind::from_tag) {
            Some(LineKind::Segment) => {
                summary.segment_count += 1;
                let id = segment_vertex_id(line)?;
                if id > summary.max_vertex_id {
                    summary.max_vertex_id = id;
                }
                if id < summary.min_vertex_id {
                    summary.min_vertex_id = id;
                }
            }
            Some(LineKind::Link) => summary.link_count += 1,
            Some(LineKind::Path) => summary.path_count += 1,
            Some(LineKind::Walk) => summary.walk_count += 1,
            Some(LineKind::Header) => summary.version = Some(header_version(line)?),
            None => {
                return Err(ParseErr::UnknownLineType {
                    tag: line.first().copied().unwrap_or(NEWLINE) as char,
                    line: line_no,
                })
            }
        }

        pos = end + 1;
        line_no += 1;
    }

    Ok(summary)
}

/// Pass 2: re-walk the buffer and record every line's span, partitioned by
/// kind. This pass reads only line boundaries and the tag byte; field
/// contents are left to the population workers.
pub fn index_lines(buf: &[u8], summary: &ScanSummary) -> Result<LineIndex, ParseErr> {
    let mut index = LineIndex {
        segments: Vec::with_capacity(summary.segment_count),
        links: Vec::with_capacity(summary.link_count),
        paths: Vec::with_capacity(summary.path_count),
        walks: Vec::with_capacity(summary.walk_count),
    };

    let mut pos = 0;
    let mut line_no = 1;

    while pos < buf.len() {
        let end = next_line_end(buf, pos);
        let span = LineSpan {
            start: pos,
            len: (end - pos) as u32,
        };

        match buf[pos..end].first().copied().and_then(LineKind::from_tag) {
            Some(LineKind::Segment) => index.segments.push(span),
            Some(LineKind::Link) => index.links.push(span),
            Some(LineKind::Path) => index.paths.push(span),
            Some(LineKind::Walk) => index.walks.push(span),
            Some(LineKind::Header) => {}
            None => {
                return Err(ParseErr::UnknownLineType {
                    tag: buf[pos..end].first().copied().unwrap_or(NEWLINE) as char,
                    line: line_no,
                })
            }
        }

        pos = end + 1;
        line_no += 1;
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GFA: &[u8] = b"H\tVN:Z:1.0\nS\t1\tAAA\nS\t2\tGG\nL\t1\t+\t2\t+\t0M\nP\tref1\t1+,2+\t*\n";

    #[test]
    fn scan_counts_and_version() {
        let summary = scan_structure(GFA).unwrap();
        assert_eq!(summary.version, Some(GfaVersion::V1_0));
        assert_eq!(summary.segment_count, 2);
        assert_eq!(summary.link_count, 1);
        assert_eq!(summary.path_count, 1);
        assert_eq!(summary.walk_count, 0);
    }

    #[test]
    fn scan_tracks_vertex_id_bounds() {
        let summary = scan_structure(b"S\t7\tA\nS\t3\tC\nS\t12\tG\n").unwrap();
        assert_eq!(summary.min_vertex_id, 3);
        assert_eq!(summary.max_vertex_id, 12);
    }

    #[test]
    fn scan_rejects_unknown_tag() {
        let err = scan_structure(b"H\tVN:Z:1.0\nX\tfoo\n").unwrap_err();
        match err {
            ParseErr::UnknownLineType { tag, line } => {
                assert_eq!(tag, 'X');
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn scan_rejects_blank_line() {
        assert!(scan_structure(b"S\t1\tAAA\n\nS\t2\tGG\n").is_err());
    }

    #[test]
    fn scan_rejects_unsupported_version() {
        let err = scan_structure(b"H\tVN:Z:2.0\n").unwrap_err();
        assert!(matches!(err, ParseErr::UnsupportedVersion(v) if v == "VN:Z:2.0"));
    }

    #[test]
    fn scan_rejects_non_numeric_segment_id() {
        assert!(scan_structure(b"S\tseg1\tAAA\n").is_err());
    }

    #[test]
    fn walk_version_detected() {
        let summary = scan_structure(b"H\tVN:Z:1.1\nW\tchm13\t0\tChr1\t0\t5\t>1>2\n").unwrap();
        assert_eq!(summary.version, Some(GfaVersion::V1_1));
        assert_eq!(summary.walk_count, 1);
    }

    #[test]
    fn index_partitions_spans_by_kind() {
        let summary = scan_structure(GFA).unwrap();
        let index = index_lines(GFA, &summary).unwrap();
        assert_eq!(index.segments.len(), 2);
        assert_eq!(index.links.len(), 1);
        assert_eq!(index.paths.len(), 1);
        assert!(index.walks.is_empty());

        assert_eq!(index.segments[0].bytes(GFA), b"S\t1\tAAA");
        assert_eq!(index.segments[1].bytes(GFA), b"S\t2\tGG");
        assert_eq!(index.links[0].bytes(GFA), b"L\t1\t+\t2\t+\t0M");
        assert_eq!(index.paths[0].bytes(GFA), b"P\tref1\t1+,2+\t*");
    }

    #[test]
    fn index_handles_missing_trailing_newline() {
        let gfa = b"S\t1\tAAA\nS\t2\tGG";
        let summary = scan_structure(gfa).unwrap();
        let index = index_lines(gfa, &summary).unwrap();
        assert_eq!(index.segments[1].bytes(gfa), b"S\t2\tGG");
    }

    #[test]
    fn version_tag_round_trip() {
        for (tag, version) in GFA_VERSION_TAGS {
            assert_eq!(GfaVersion::from_tag(tag), Some(version));
            assert_eq!(version.as_tag(), tag);
        }
        assert_eq!(GfaVersion::from_tag("VN:Z:0.9"), None);
    }
}
