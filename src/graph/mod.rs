//! Graph storage, construction, and I/O.
//!
//! - `node`: node-ID, weight, and neighbor-entry traits
//! - `compressed`: the read-only `CompactGraph` kernels run on
//! - `builder`, `generator`, `io`, `source`: everything that produces one

pub mod builder;
pub mod compressed;
pub mod generator;
pub mod io;
pub mod node;
pub mod source;

pub use builder::{relabel_by_degree, Builder};
pub use compressed::CompactGraph;
pub use generator::Generator;
pub use node::{Destination, Edge, EdgeList, NodeId, Weight, WeightedNode};
pub use source::{make_graph, GraphSource};
