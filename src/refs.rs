//! Reference (path/walk) model and the P/W line handlers
//!
//! GFA encodes a reference traversal two ways: P lines (`1+,2+` steps) and
//! W lines (`>1>2` steps). Both produce the same structure here: a
//! [`Reference`] with an identity (PanSN-structured or raw) and a
//! [`RefWalk`] of `(vertex, strand)` steps. Walk arrays are allocated once,
//! after a step-counting pre-scan of the data field, then filled in a single
//! forward pass.

use crate::gfa::ParseErr;
use crate::index::{LineKind, NEWLINE, TAB};
use crate::split::split_fields;

pub const PANSN_DELIMITER: char = '#';

const P_LINE_FORWARD_SYMBOL: char = '+';
const P_LINE_REVERSE_SYMBOL: char = '-';
const W_LINE_FORWARD_SYMBOL: char = '>';
const W_LINE_REVERSE_SYMBOL: char = '<';

/// Traversal orientation of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// Reference identity: a structured PanSN name (`sample#haplotype#contig`)
/// or an opaque raw name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefName {
    PanSn {
        sample: String,
        haplotype: u32,
        contig: String,
    },
    Raw(String),
}

/// A reference identity plus its display tag, cached at construction.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefId {
    name: RefName,
    tag: String,
}

impl RefId {
    /// Build an identity from a P-line name. The name is structured only if
    /// it splits into exactly three non-empty `#`-separated parts with a
    /// purely numeric middle part; anything else (wrong part count, embedded
    /// delimiter pushing the count past three, non-numeric haplotype)
    /// degrades to [`RefName::Raw`].
    pub fn from_path_name(name: &str) -> RefId {
        match parse_pansn(name) {
            Some((sample, haplotype, contig)) => RefId::new_pansn(sample, haplotype, contig),
            None => RefId::new_raw(name),
        }
    }

    /// Build an identity from the three W-line name columns. A non-numeric
    /// haplotype column degrades to a raw identity over the sample column.
    pub fn from_walk_columns(sample: &str, haplotype: &str, contig: &str) -> RefId {
        match parse_numeric(haplotype) {
            Some(hap) => RefId::new_pansn(sample.to_owned(), hap, contig.to_owned()),
            None => RefId::new_raw(sample),
        }
    }

    fn new_pansn(sample: String, haplotype: u32, contig: String) -> RefId {
        let tag = format!("{sample}{PANSN_DELIMITER}{haplotype}{PANSN_DELIMITER}{contig}");
        RefId {
            name: RefName::PanSn {
                sample,
                haplotype,
                contig,
            },
            tag,
        }
    }

    fn new_raw(name: &str) -> RefId {
        RefId {
            name: RefName::Raw(name.to_owned()),
            tag: name.to_owned(),
        }
    }

    pub fn name(&self) -> &RefName {
        &self.name
    }

    pub fn is_pansn(&self) -> bool {
        matches!(self.name, RefName::PanSn { .. })
    }

    /// The display tag: `sample#haplotype#contig` for structured names, the
    /// name itself for raw ones.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The sample name for structured identities; raw identities report
    /// their whole tag here.
    pub fn sample(&self) -> &str {
        match &self.name {
            RefName::PanSn { sample, .. } => sample,
            RefName::Raw(name) => name,
        }
    }

    pub fn haplotype(&self) -> Option<u32> {
        match &self.name {
            RefName::PanSn { haplotype, .. } => Some(*haplotype),
            RefName::Raw(_) => None,
        }
    }

    pub fn contig(&self) -> Option<&str> {
        match &self.name {
            RefName::PanSn { contig, .. } => Some(contig),
            RefName::Raw(_) => None,
        }
    }
}

/// Reject anything but plain ASCII digits; `str::parse` alone would accept
/// a leading `+`.
fn parse_numeric(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u32>().ok()
}

fn parse_pansn(name: &str) -> Option<(String, u32, String)> {
    let parts: Vec<&str> = name.split(PANSN_DELIMITER).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    let haplotype = parse_numeric(parts[1])?;
    Some((parts[0].to_owned(), haplotype, parts[2].to_owned()))
}

/// An ordered traversal: per-step strand and vertex ID, plus the per-step
/// genomic start coordinate once the locus pass has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefWalk {
    pub strands: Vec<Strand>,
    pub v_ids: Vec<u32>,
    /// 1-based genomic start of each step; zero until loci are assigned.
    pub loci: Vec<u32>,
    pub step_count: u32,
    /// Total traversal length in bases; zero until loci are assigned.
    pub hap_len: u32,
}

impl RefWalk {
    fn with_step_count(step_count: u32) -> RefWalk {
        let n = step_count as usize;
        RefWalk {
            strands: vec![Strand::Forward; n],
            v_ids: vec![0; n],
            loci: vec![0; n],
            step_count,
            hap_len: 0,
        }
    }
}

/// One parsed P or W line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub line_kind: LineKind,
    pub id: RefId,
    pub walk: RefWalk,
}

impl Reference {
    pub fn tag(&self) -> &str {
        self.id.tag()
    }

    pub fn step_count(&self) -> u32 {
        self.walk.step_count
    }

    pub fn hap_len(&self) -> u32 {
        self.walk.hap_len
    }

    pub fn v_ids(&self) -> &[u32] {
        &self.walk.v_ids
    }

    pub fn strands(&self) -> &[Strand] {
        &self.walk.strands
    }

    pub fn loci(&self) -> &[u32] {
        &self.walk.loci
    }
}

/// Per-line-kind parse layout: required token count, which columns carry the
/// identity, and which carries the step data.
struct RefLineMeta {
    kind: LineKind,
    required_tokens: usize,
    id_cols: &'static [usize],
    data_col: usize,
}

const P_LINE_META: RefLineMeta = RefLineMeta {
    kind: LineKind::Path,
    required_tokens: 3,
    id_cols: &[1],
    data_col: 2,
};

const W_LINE_META: RefLineMeta = RefLineMeta {
    kind: LineKind::Walk,
    required_tokens: 7,
    id_cols: &[1, 2, 3],
    data_col: 6,
};

fn ref_line_meta(kind: LineKind) -> &'static RefLineMeta {
    match kind {
        LineKind::Path => &P_LINE_META,
        _ => &W_LINE_META,
    }
}

fn is_step_symbol(kind: LineKind, c: char) -> bool {
    match kind {
        LineKind::Path => c == P_LINE_FORWARD_SYMBOL || c == P_LINE_REVERSE_SYMBOL,
        _ => c == W_LINE_FORWARD_SYMBOL || c == W_LINE_REVERSE_SYMBOL,
    }
}

/// Number of steps in a data field: one per orientation symbol.
pub fn count_steps(kind: LineKind, data: &str) -> u32 {
    data.chars().filter(|&c| is_step_symbol(kind, c)).count() as u32
}

fn push_digit(acc: u32, c: char) -> Result<u32, ParseErr> {
    let digit = c.to_digit(10).ok_or(ParseErr::InvalidStep(c))?;
    acc.checked_mul(10)
        .and_then(|a| a.checked_add(digit))
        .ok_or(ParseErr::Overflow)
}

/// Fill a pre-sized walk from a P-line data field (`1+,2-,...`): digits
/// accumulate a vertex ID, the orientation symbol flushes the step, the
/// comma advances to the next one.
fn parse_path_steps(data: &str, walk: &mut RefWalk) -> Result<(), ParseErr> {
    let mut step = 0usize;
    let mut acc: u32 = 0;
    let mut have_digits = false;
    let mut flushed = false;

    for c in data.chars() {
        match c {
            P_LINE_FORWARD_SYMBOL | P_LINE_REVERSE_SYMBOL => {
                if !have_digits || flushed {
                    return Err(ParseErr::MissingStepId);
                }
                walk.v_ids[step] = acc;
                walk.strands[step] = if c == P_LINE_FORWARD_SYMBOL {
                    Strand::Forward
                } else {
                    Strand::Reverse
                };
                acc = 0;
                have_digits = false;
                flushed = true;
            }
            ',' => {
                if !flushed {
                    return Err(ParseErr::MissingStepId);
                }
                step += 1;
                acc = 0;
                have_digits = false;
                flushed = false;
            }
            _ => {
                acc = push_digit(acc, c)?;
                have_digits = true;
            }
        }
    }

    if have_digits {
        // trailing digits with no orientation symbol
        return Err(ParseErr::MissingStepId);
    }

    Ok(())
}

/// Fill a pre-sized walk from a W-line data field (`>1<2...`): each
/// orientation symbol flushes the previous step and opens the next; the
/// trailing step flushes at end-of-field.
fn parse_walk_steps(data: &str, walk: &mut RefWalk) -> Result<(), ParseErr> {
    let mut step = 0usize;
    let mut acc: u32 = 0;
    let mut have_digits = false;
    let mut strand = Strand::Forward;

    for c in data.chars() {
        match c {
            W_LINE_FORWARD_SYMBOL | W_LINE_REVERSE_SYMBOL => {
                if step > 0 {
                    if !have_digits {
                        return Err(ParseErr::MissingStepId);
                    }
                    walk.v_ids[step - 1] = acc;
                    walk.strands[step - 1] = strand;
                }
                strand = if c == W_LINE_FORWARD_SYMBOL {
                    Strand::Forward
                } else {
                    Strand::Reverse
                };
                step += 1;
                acc = 0;
                have_digits = false;
            }
            _ => {
                acc = push_digit(acc, c)?;
                have_digits = true;
            }
        }
    }

    if step > 0 {
        if !have_digits {
            return Err(ParseErr::MissingStepId);
        }
        walk.v_ids[step - 1] = acc;
        walk.strands[step - 1] = strand;
    }

    Ok(())
}

/// Parse a data field into a freshly allocated [`RefWalk`].
pub fn parse_steps(kind: LineKind, data: &str) -> Result<RefWalk, ParseErr> {
    let mut walk = RefWalk::with_step_count(count_steps(kind, data));
    match kind {
        LineKind::Path => parse_path_steps(data, &mut walk)?,
        _ => parse_walk_steps(data, &mut walk)?,
    }
    Ok(walk)
}

/// Parse one P or W line into a [`Reference`], driven by the static
/// per-kind layout table.
pub fn parse_reference_line(line: &[u8], kind: LineKind) -> Result<Reference, ParseErr> {
    let meta = ref_line_meta(kind);

    let res = split_fields(line, TAB, &[NEWLINE], meta.required_tokens)?;
    if res.tokens.len() < meta.required_tokens {
        return Err(ParseErr::NotEnoughFields {
            kind: meta.kind,
            found: res.tokens.len(),
        });
    }
    let tokens = res.tokens;

    let id = match meta.id_cols {
        [name_col] => RefId::from_path_name(&tokens[*name_col]),
        [sample_col, hap_col, contig_col] => RefId::from_walk_columns(
            &tokens[*sample_col],
            &tokens[*hap_col],
            &tokens[*contig_col],
        ),
        _ => unreachable!("reference line layouts carry one or three id columns"),
    };

    let walk = parse_steps(meta.kind, &tokens[meta.data_col])?;

    Ok(Reference {
        line_kind: meta.kind,
        id,
        walk,
    })
}
