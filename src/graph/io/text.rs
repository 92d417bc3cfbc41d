//! Line-oriented text formats.
//!
//! | Suffix | Line shape | Weights |
//! |--------|------------|---------|
//! | `.el` | `u v` | none (unit) |
//! | `.wel` | `u v w` | stored |
//! | `.gr` | `a u v w` (other lines ignored) | stored |
//! | `.graph` | header `n m`, then line `i` lists the 1-based neighbors of `i - 1` | unit |

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use num_traits::{One, Zero};

use crate::error::{GraphError, Result};
use crate::graph::compressed::CompactGraph;
use crate::graph::node::{Destination, EdgeList, NodeId};

/// Text flavor selected by file suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextFormat {
    /// `.el`
    EdgeList,
    /// `.wel`
    WeightedEdgeList,
    /// `.gr` (DIMACS shortest-path arcs)
    Dimacs,
    /// `.graph` (METIS adjacency)
    Metis,
}

impl TextFormat {
    /// Whether the format stores per-edge weights.
    pub fn has_weights(self) -> bool {
        matches!(self, TextFormat::WeightedEdgeList | TextFormat::Dimacs)
    }
}

struct LineCtx<'a> {
    path: &'a Path,
    line: usize,
}

impl LineCtx<'_> {
    fn error(&self, message: impl Into<String>) -> GraphError {
        GraphError::Parse {
            path: self.path.to_path_buf(),
            line: self.line,
            message: message.into(),
        }
    }

    fn field<T: FromStr>(&self, tokens: &mut SplitWhitespace<'_>, what: &str) -> Result<T> {
        let tok = tokens
            .next()
            .ok_or_else(|| self.error(format!("missing {what}")))?;
        tok.parse()
            .map_err(|_| self.error(format!("invalid {what} `{tok}`")))
    }

    fn node<N: NodeId>(&self, tokens: &mut SplitWhitespace<'_>, what: &str) -> Result<N> {
        let n: N = self.field(tokens, what)?;
        if n < <N as Zero>::zero() {
            return Err(self.error(format!("negative {what} {n}")));
        }
        Ok(n)
    }
}

/// Parses a text graph into an unsorted edge list.
///
/// Weights in the file are dropped when `D` is unweighted; unweighted formats produce
/// unit weights when `D` is weighted.
///
/// # Errors
/// I/O failures and malformed lines (reported with their one-based line number).
pub fn read_text<D: Destination>(path: &Path, format: TextFormat) -> Result<EdgeList<D>> {
    let reader = BufReader::new(File::open(path)?);
    match format {
        TextFormat::EdgeList | TextFormat::WeightedEdgeList | TextFormat::Dimacs => {
            read_arcs(path, reader, format)
        }
        TextFormat::Metis => read_metis(path, reader),
    }
}

fn read_arcs<D: Destination>(
    path: &Path,
    reader: impl BufRead,
    format: TextFormat,
) -> Result<EdgeList<D>> {
    let mut edges = EdgeList::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let ctx = LineCtx { path, line: i + 1 };
        let mut tokens = line.split_whitespace();
        if format == TextFormat::Dimacs {
            if tokens.next() != Some("a") {
                continue;
            }
        } else if line.trim().is_empty() {
            continue;
        }
        let u: D::Node = ctx.node(&mut tokens, "source")?;
        let v: D::Node = ctx.node(&mut tokens, "destination")?;
        let w: D::Weight = if format.has_weights() {
            ctx.field(&mut tokens, "weight")?
        } else {
            D::Weight::one()
        };
        edges.push((u, D::new(v, w)));
    }
    Ok(edges)
}

fn read_metis<D: Destination>(path: &Path, reader: impl BufRead) -> Result<EdgeList<D>> {
    let mut edges = EdgeList::new();
    let mut lines = reader
        .lines()
        .enumerate()
        .filter(|(_, l)| !matches!(l, Ok(l) if l.trim_start().starts_with('%')));

    let num_nodes: usize = match lines.next() {
        Some((i, header)) => {
            let header = header?;
            let ctx = LineCtx { path, line: i + 1 };
            let mut tokens = header.split_whitespace();
            let n: usize = ctx.field(&mut tokens, "node count")?;
            let _m: usize = ctx.field(&mut tokens, "edge count")?;
            n
        }
        None => return Ok(edges),
    };

    for u in 0..num_nodes {
        let Some((i, line)) = lines.next() else {
            break;
        };
        let line = line?;
        let ctx = LineCtx { path, line: i + 1 };
        let src = D::Node::from_index(u);
        let mut tokens = line.split_whitespace();
        while tokens.clone().next().is_some() {
            let v: D::Node = ctx.field(&mut tokens, "neighbor")?;
            if v <= <D::Node as Zero>::zero() {
                return Err(ctx.error(format!("neighbor {v} is not 1-based")));
            }
            edges.push((src, D::new(v - D::Node::one(), D::Weight::one())));
        }
    }
    Ok(edges)
}

/// Writes every stored out-edge as `u v` (or `u v w` for weighted graphs).
///
/// # Errors
/// I/O failures.
pub fn write_text<D: Destination>(g: &CompactGraph<D>, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for u in g.vertices() {
        for &d in g.out_neigh(u) {
            if D::WEIGHTED {
                writeln!(out, "{u} {} {}", d.node(), d.weight())?;
            } else {
                writeln!(out, "{u} {}", d.node())?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
