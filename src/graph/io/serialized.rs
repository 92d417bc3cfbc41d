//! Serialized binary graphs (`.sg` unweighted, `.wsg` weighted).
//!
//! Layout, native byte order:
//!
//! ```text
//! directed: u8 (0 or 1)
//! num_edges: i64           stored out-entries
//! num_nodes: i64
//! offsets:   [i64; n + 1]
//! neighbors: [entry; m]    entry = node id, followed by weight for .wsg
//! (directed only) offsets and neighbors of the reverse structure
//! ```
//!
//! The file length pins down the entry width, so a graph written with one node or
//! weight width is rejected (not misread) when loaded with another.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use num_traits::{One, Zero};
use rayon::prelude::*;
use tracing::info;
use zerocopy::{AsBytes, FromBytes};

use crate::error::{GraphError, Result};
use crate::graph::compressed::CompactGraph;
use crate::graph::node::{Destination, NodeId, Weight};

const HEADER_BYTES: usize = 1 + 2 * OFFSET_BYTES;
const OFFSET_BYTES: usize = core::mem::size_of::<i64>();

/// Bytes per stored neighbor entry of `D`.
fn entry_bytes<D: Destination>() -> usize {
    if D::WEIGHTED {
        <D::Node as NodeId>::WIDTH + <D::Weight as Weight>::WIDTH
    } else {
        <D::Node as NodeId>::WIDTH
    }
}

fn describe<D: Destination>() -> String {
    if D::WEIGHTED {
        format!(
            "weighted, {}-byte ids, {}-byte weights",
            <D::Node as NodeId>::WIDTH,
            <D::Weight as Weight>::WIDTH
        )
    } else {
        format!("unweighted, {}-byte ids", <D::Node as NodeId>::WIDTH)
    }
}

/// Decodes one fixed-width value; `chunk` always has exactly `size_of::<T>()` bytes.
#[inline(always)]
fn decode<T: FromBytes + Default>(chunk: &[u8]) -> T {
    T::read_from(chunk).unwrap_or_default()
}

fn decode_entry<D: Destination>(chunk: &[u8]) -> D {
    let node_width = <D::Node as NodeId>::WIDTH;
    let node: D::Node = decode(&chunk[..node_width]);
    let weight = if D::WEIGHTED {
        decode(&chunk[node_width..])
    } else {
        D::Weight::one()
    };
    D::new(node, weight)
}

struct Reader<'a> {
    path: &'a Path,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn corrupt(&self, message: impl Into<String>) -> GraphError {
        GraphError::Corrupt {
            path: self.path.to_path_buf(),
            message: message.into(),
        }
    }

    fn take(&mut self, len: usize) -> &'a [u8] {
        let out = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        out
    }

    #[allow(clippy::cast_sign_loss)]
    fn offsets(&mut self, num_nodes: usize, num_edges: usize) -> Result<Vec<usize>> {
        let raw: Vec<i64> = self
            .take((num_nodes + 1) * OFFSET_BYTES)
            .par_chunks_exact(OFFSET_BYTES)
            .map(decode::<i64>)
            .collect();
        if raw.first().copied() != Some(0) {
            return Err(self.corrupt("offsets must start at 0"));
        }
        if raw.windows(2).any(|w| w[0] > w[1]) {
            return Err(self.corrupt("offsets must be monotone"));
        }
        if raw.last().copied() != i64::try_from(num_edges).ok() {
            return Err(self.corrupt("last offset must equal edge count"));
        }
        Ok(raw.into_iter().map(|o| o as usize).collect())
    }

    fn neighbors<D: Destination>(&mut self, num_nodes: usize, num_edges: usize) -> Result<Vec<D>> {
        let neighbors: Vec<D> = self
            .take(num_edges * entry_bytes::<D>())
            .par_chunks_exact(entry_bytes::<D>())
            .map(decode_entry::<D>)
            .collect();
        let out_of_range = neighbors
            .par_iter()
            .any(|d| d.node() < <D::Node as Zero>::zero() || d.node().index() >= num_nodes);
        if out_of_range {
            return Err(self.corrupt("neighbor id out of range"));
        }
        Ok(neighbors)
    }
}

/// Loads a serialized graph.
///
/// `weighted` is the kind implied by the suffix (`.wsg`); it must match `D`.
///
/// # Errors
/// - [`GraphError::TypeWidth`] if the file kind or entry width differs from `D`
/// - [`GraphError::Corrupt`] if offsets or neighbor IDs are inconsistent
/// - [`GraphError::Io`] on read failure
pub fn read_serialized<D: Destination>(path: &Path, weighted: bool) -> Result<CompactGraph<D>> {
    if weighted != D::WEIGHTED {
        return Err(GraphError::TypeWidth {
            expected: describe::<D>(),
            found: if weighted { "weighted (.wsg)" } else { "unweighted (.sg)" }.into(),
        });
    }
    let start = Instant::now();
    let bytes = std::fs::read(path)?;
    let mut r = Reader {
        path,
        bytes: &bytes,
        pos: 0,
    };
    if bytes.len() < HEADER_BYTES {
        return Err(r.corrupt("truncated header"));
    }

    let directed = match r.take(1)[0] {
        0 => false,
        1 => true,
        other => return Err(r.corrupt(format!("invalid directed flag {other}"))),
    };
    let num_edges: i64 = decode(r.take(OFFSET_BYTES));
    let num_nodes: i64 = decode(r.take(OFFSET_BYTES));
    let (Ok(num_edges), Ok(num_nodes)) = (usize::try_from(num_edges), usize::try_from(num_nodes))
    else {
        return Err(r.corrupt("negative node or edge count"));
    };

    let directions = if directed { 2 } else { 1 };
    let body = bytes.len() - HEADER_BYTES;
    let sizes = num_nodes
        .checked_add(1)
        .and_then(|n| n.checked_mul(OFFSET_BYTES))
        .and_then(|index| {
            let entries = num_edges.checked_mul(entry_bytes::<D>())?;
            Some((index, index.checked_add(entries)?.checked_mul(directions)?))
        });
    let Some((index_bytes, expected)) = sizes else {
        return Err(r.corrupt("node or edge count overflows"));
    };
    if body != expected {
        let found = body
            .checked_sub(directions * index_bytes)
            .filter(|rest| num_edges > 0 && rest % (directions * num_edges) == 0)
            .map_or_else(
                || format!("{body} body bytes"),
                |rest| format!("{}-byte entries", rest / (directions * num_edges)),
            );
        return Err(GraphError::TypeWidth {
            expected: describe::<D>(),
            found,
        });
    }

    let out_offsets = r.offsets(num_nodes, num_edges)?;
    let out_neighbors = r.neighbors::<D>(num_nodes, num_edges)?;
    let graph = if directed {
        let in_offsets = r.offsets(num_nodes, num_edges)?;
        let in_neighbors = r.neighbors::<D>(num_nodes, num_edges)?;
        CompactGraph::from_directed_parts(out_offsets, out_neighbors, in_offsets, in_neighbors)
    } else {
        CompactGraph::from_undirected_parts(out_offsets, out_neighbors)
    };
    info!(elapsed = ?start.elapsed(), "read time");
    Ok(graph)
}

#[allow(clippy::cast_possible_wrap)]
fn write_direction<D: Destination>(
    out: &mut impl Write,
    offsets: &[usize],
    neighbors: &[D],
) -> Result<()> {
    for &o in offsets {
        out.write_all((o as i64).as_bytes())?;
    }
    for &d in neighbors {
        out.write_all(d.node().as_bytes())?;
        if D::WEIGHTED {
            out.write_all(d.weight().as_bytes())?;
        }
    }
    Ok(())
}

/// Writes `g` in serialized form (use `.wsg` for weighted graphs by convention).
///
/// # Errors
/// I/O failures.
#[allow(clippy::cast_possible_wrap)]
pub fn write_serialized<D: Destination>(g: &CompactGraph<D>, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&[u8::from(g.directed())])?;
    out.write_all((g.num_edges_directed() as i64).as_bytes())?;
    out.write_all((g.num_nodes() as i64).as_bytes())?;
    write_direction(&mut out, g.out_offsets(), g.out_neighbors())?;
    if let (Some(offsets), Some(neighbors)) = (g.in_offsets(), g.in_neighbors()) {
        write_direction(&mut out, offsets, neighbors)?;
    }
    out.flush()?;
    Ok(())
}
