//! GFA parse pipeline
//!
//! [`Gfa::from_file`] memory-maps a GFA v1.0/v1.1 file and builds the full
//! in-memory graph in one call: structural scan, line indexing, concurrent
//! population of vertices/edges/references, and an optional sequential locus
//! pass. The entry point is all-or-nothing — callers get a complete,
//! internally consistent [`Gfa`] or a [`ParseErr`]; no malformed line is
//! ever skipped silently.

use crate::graph::{parse_link, parse_segment, Edge, Vertex};
use crate::index::{index_lines, scan_structure, GfaVersion, LineKind, LineSpan};
use crate::refs::{parse_reference_line, Reference};
use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::io::Error as IoError;
use std::num::ParseIntError;
use std::path::Path;

#[derive(Debug)]
pub enum ParseErr {
    Io(IoError),
    InvalidUtf8,
    UnknownLineType { tag: char, line: usize },
    UnsupportedVersion(String),
    NotEnoughFields { kind: LineKind, found: usize },
    InvalidField(ParseIntError),
    InvalidStrand(char),
    MixedSelfLoop(u32),
    VertexIdOutOfBounds { id: u32, max: u32 },
    InvalidStep(char),
    MissingStepId,
    Overflow,
    UnknownVertex(u32),
    MissingVertexLabels,
    EmptyGraph,
}

impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErr::Io(e) => write!(f, "IO error: {}", e),
            ParseErr::InvalidUtf8 => write!(f, "Invalid UTF-8 in GFA line"),
            ParseErr::UnknownLineType { tag, line } => {
                write!(f, "Unsupported line type {:?} on line {}", tag, line)
            }
            ParseErr::UnsupportedVersion(v) => write!(f, "Unsupported GFA version: {}", v),
            ParseErr::NotEnoughFields { kind, found } => {
                write!(f, "Not enough fields in {} line: found {}", kind, found)
            }
            ParseErr::InvalidField(e) => write!(f, "Invalid numeric field: {}", e),
            ParseErr::InvalidStrand(c) => write!(f, "Invalid strand symbol {:?}", c),
            ParseErr::MixedSelfLoop(id) => {
                write!(f, "Invalid self loop on vertex {}: strand symbols differ", id)
            }
            ParseErr::VertexIdOutOfBounds { id, max } => {
                write!(f, "Vertex ID {} exceeds declared maximum {}", id, max)
            }
            ParseErr::InvalidStep(c) => write!(f, "Invalid character {:?} in step data", c),
            ParseErr::MissingStepId => write!(f, "Step without a vertex ID in path/walk data"),
            ParseErr::Overflow => write!(f, "Vertex ID exceeds 32 bits"),
            ParseErr::UnknownVertex(id) => {
                write!(f, "Reference step visits undeclared vertex {}", id)
            }
            ParseErr::MissingVertexLabels => {
                write!(f, "Reference loci require vertex labels to be parsed")
            }
            ParseErr::EmptyGraph => write!(f, "GFA has no segments, links, paths or walks"),
        }
    }
}

impl std::error::Error for ParseErr {}

impl From<IoError> for ParseErr {
    fn from(e: IoError) -> Self {
        ParseErr::Io(e)
    }
}

/// What to retain while parsing. Dropping labels or references skips the
/// corresponding copies entirely.
#[derive(Debug, Clone, Copy)]
pub struct GfaConfig {
    pub include_vertex_labels: bool,
    pub include_references: bool,
}

impl Default for GfaConfig {
    fn default() -> Self {
        GfaConfig {
            include_vertex_labels: true,
            include_references: true,
        }
    }
}

/// A fully populated assembly graph.
#[derive(Debug)]
pub struct Gfa {
    pub version: Option<GfaVersion>,
    pub min_vertex_id: u32,
    pub max_vertex_id: u32,
    /// Sparse vertex table, indexed by file-native vertex ID. `None` slots
    /// are IDs no segment line declared.
    pub vertices: Vec<Option<Vertex>>,
    /// Edges in link-line order.
    pub edges: Vec<Edge>,
    /// All P-line references, then all W-line references, each group in
    /// file order.
    pub references: Vec<Reference>,
}

impl Gfa {
    /// Memory-map `path` and parse it. The mapping is released when this
    /// call returns; every string retained in the result is an owned copy.
    pub fn from_file<P: AsRef<Path>>(path: P, config: &GfaConfig) -> Result<Gfa, ParseErr> {
        let file = File::open(path)?;
        // Safety: the mapping is read-only and private to this call.
        let mmap = unsafe { Mmap::map(&file)? };
        Gfa::from_bytes(&mmap, config)
    }

    /// Parse an in-memory GFA byte buffer.
    pub fn from_bytes(buf: &[u8], config: &GfaConfig) -> Result<Gfa, ParseErr> {
        let summary = scan_structure(buf)?;
        if summary.line_count() == 0 {
            return Err(ParseErr::EmptyGraph);
        }
        let index = index_lines(buf, &summary)?;

        // Three workers over disjoint line sets, each building its own
        // output array; the nested joins are the only synchronization.
        let (vertices, (edges, references)) = rayon::join(
            || {
                populate_vertices(
                    buf,
                    &index.segments,
                    summary.max_vertex_id,
                    config.include_vertex_labels,
                )
            },
            || {
                rayon::join(
                    || populate_edges(buf, &index.links),
                    || {
                        if config.include_references {
                            populate_references(buf, &index.paths, &index.walks)
                        } else {
                            Ok(Vec::new())
                        }
                    },
                )
            },
        );
        let (vertices, edges, references) = (vertices?, edges?, references?);

        debug!(
            "populated {} vertices, {} edges, {} references",
            index.segments.len(),
            edges.len(),
            references.len()
        );

        let mut gfa = Gfa {
            version: summary.version,
            min_vertex_id: summary.min_vertex_id,
            max_vertex_id: summary.max_vertex_id,
            vertices,
            edges,
            references,
        };

        if config.include_references && config.include_vertex_labels {
            gfa.assign_reference_loci()?;
        }

        Ok(gfa)
    }

    /// Sequential post-pass: convert every reference's step sequence into
    /// cumulative 1-based genomic coordinates using the visited vertices'
    /// sequence lengths, and record the total haplotype length.
    ///
    /// Requires vertex labels; runs strictly after population since it
    /// reads across the vertex table and the reference array.
    pub fn assign_reference_loci(&mut self) -> Result<(), ParseErr> {
        let vertices = &self.vertices;
        for reference in &mut self.references {
            let walk = &mut reference.walk;
            let mut pos: u32 = 1; // DNA coordinates are 1-based
            for i in 0..walk.step_count as usize {
                walk.loci[i] = pos;
                let v_id = walk.v_ids[i];
                let vertex = vertices
                    .get(v_id as usize)
                    .and_then(|slot| slot.as_ref())
                    .ok_or(ParseErr::UnknownVertex(v_id))?;
                let seq = vertex.seq.as_ref().ok_or(ParseErr::MissingVertexLabels)?;
                pos += seq.len() as u32;
            }
            walk.hap_len = pos - 1;
        }
        Ok(())
    }

    pub fn vertex(&self, id: u32) -> Option<&Vertex> {
        self.vertices.get(id as usize).and_then(|slot| slot.as_ref())
    }

    /// Number of declared vertices (populated slots, not table length).
    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }
}

/// Segment worker: place each vertex at its own ID in the sparse table.
fn populate_vertices(
    buf: &[u8],
    spans: &[LineSpan],
    max_vertex_id: u32,
    keep_labels: bool,
) -> Result<Vec<Option<Vertex>>, ParseErr> {
    if spans.is_empty() {
        return Ok(Vec::new());
    }
    let mut table: Vec<Option<Vertex>> = vec![None; max_vertex_id as usize + 1];
    for span in spans {
        let vertex = parse_segment(span.bytes(buf), keep_labels)?;
        let id = vertex.id;
        if id > max_vertex_id {
            return Err(ParseErr::VertexIdOutOfBounds {
                id,
                max: max_vertex_id,
            });
        }
        table[id as usize] = Some(vertex);
    }
    Ok(table)
}

/// Link worker: one edge per L line, in line order.
fn populate_edges(buf: &[u8], spans: &[LineSpan]) -> Result<Vec<Edge>, ParseErr> {
    let mut edges = Vec::with_capacity(spans.len());
    for span in spans {
        edges.push(parse_link(span.bytes(buf))?);
    }
    Ok(edges)
}

/// Reference worker: all P lines, then all W lines.
fn populate_references(
    buf: &[u8],
    paths: &[LineSpan],
    walks: &[LineSpan],
) -> Result<Vec<Reference>, ParseErr> {
    let mut references = Vec::with_capacity(paths.len() + walks.len());
    for span in paths {
        references.push(parse_reference_line(span.bytes(buf), LineKind::Path)?);
    }
    for span in walks {
        references.push(parse_reference_line(span.bytes(buf), LineKind::Walk)?);
    }
    Ok(references)
}
