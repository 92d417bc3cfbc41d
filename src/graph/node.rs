//! Node, weight, and neighbor-entry types.
//!
//! A neighbor entry is either a bare node ID or a `WeightedNode`; both implement
//! [`Destination`], so a single `CompactGraph<D>` covers weighted and unweighted graphs.

use core::fmt::{Debug, Display};
use core::hash::Hash;
use core::str::FromStr;

use num_traits::{PrimInt, Signed};
use zerocopy::{AsBytes, FromBytes};

use crate::concurrency::atomic::AtomicValue;

/// Signed integer node identifier.
///
/// Negative values are reserved for per-kernel sentinels (unvisited parent, unreached depth).
/// Every node type is also its own unweighted neighbor entry, so `CompactGraph<N>` is
/// the unweighted graph over `N`.
pub trait NodeId:
    Destination<Node = Self>
    + PrimInt
    + Signed
    + AtomicValue
    + Hash
    + Debug
    + Display
    + FromStr
    + Default
    + AsBytes
    + FromBytes
    + Send
    + Sync
    + 'static
{
    /// Width in bytes, used to detect mismatched serialized graphs.
    const WIDTH: usize;

    /// Converts a non-negative ID to an array index.
    fn index(self) -> usize;

    /// Converts an array index to an ID.
    fn from_index(index: usize) -> Self;
}

macro_rules! impl_node_id {
    ($($t:ty),* $(,)?) => {$(
        impl NodeId for $t {
            const WIDTH: usize = core::mem::size_of::<$t>();

            #[inline(always)]
            fn index(self) -> usize {
                debug_assert!(self >= 0, "negative node id {self}");
                self as usize
            }

            #[inline(always)]
            fn from_index(index: usize) -> Self {
                debug_assert!(index <= <$t>::MAX as usize, "index {index} overflows node id");
                index as $t
            }
        }
    )*};
}

impl_node_id!(i32);
#[cfg(target_pointer_width = "64")]
impl_node_id!(i64);

/// Integer edge weight; distances share the weight's type.
pub trait Weight:
    PrimInt + AtomicValue + Hash + Debug + Display + FromStr + Default + AsBytes + FromBytes + Send + Sync + 'static
{
    /// Width in bytes, used to detect mismatched serialized graphs.
    const WIDTH: usize;

    /// Widens a generated weight.
    fn from_u8(value: u8) -> Self;

    /// Converts to `f64` for statistics and logging.
    fn to_f64_lossy(self) -> f64;
}

macro_rules! impl_weight {
    ($($t:ty),* $(,)?) => {$(
        impl Weight for $t {
            const WIDTH: usize = core::mem::size_of::<$t>();

            #[inline(always)]
            fn from_u8(value: u8) -> Self {
                value.into()
            }

            #[inline(always)]
            #[allow(clippy::cast_precision_loss)]
            fn to_f64_lossy(self) -> f64 {
                self as f64
            }
        }
    )*};
}

impl_weight!(i32, u32);
#[cfg(target_pointer_width = "64")]
impl_weight!(i64, u64);

/// An entry of a neighbor list.
pub trait Destination: Copy + Ord + Debug + Send + Sync + 'static {
    /// Node ID type.
    type Node: NodeId;
    /// Weight type; unweighted entries report weight one.
    type Weight: Weight;
    /// Whether entries carry a stored weight.
    const WEIGHTED: bool;

    /// Target node.
    fn node(self) -> Self::Node;

    /// Edge weight.
    fn weight(self) -> Self::Weight;

    /// Builds an entry; unweighted entries drop `weight`.
    fn new(node: Self::Node, weight: Self::Weight) -> Self;

    /// Same entry pointing at `node`.
    #[inline(always)]
    fn retarget(self, node: Self::Node) -> Self {
        Self::new(node, self.weight())
    }
}

macro_rules! impl_plain_destination {
    ($($t:ty),* $(,)?) => {$(
        impl Destination for $t {
            type Node = $t;
            type Weight = $t;
            const WEIGHTED: bool = false;

            #[inline(always)]
            fn node(self) -> $t {
                self
            }

            #[inline(always)]
            fn weight(self) -> $t {
                1
            }

            #[inline(always)]
            fn new(node: $t, _weight: $t) -> Self {
                node
            }
        }
    )*};
}

impl_plain_destination!(i32);
#[cfg(target_pointer_width = "64")]
impl_plain_destination!(i64);

/// Weighted neighbor entry.
///
/// Ordering is by node, then weight, so sorting and deduplicating by node keeps the
/// lightest parallel edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
pub struct WeightedNode<N, W> {
    /// Target node.
    pub v: N,
    /// Edge weight.
    pub w: W,
}

impl<N: NodeId, W: Weight> WeightedNode<N, W> {
    /// Creates a weighted entry.
    #[inline(always)]
    pub const fn new(v: N, w: W) -> Self {
        Self { v, w }
    }
}

impl<N: NodeId, W: Weight> Destination for WeightedNode<N, W> {
    type Node = N;
    type Weight = W;
    const WEIGHTED: bool = true;

    #[inline(always)]
    fn node(self) -> N {
        self.v
    }

    #[inline(always)]
    fn weight(self) -> W {
        self.w
    }

    #[inline(always)]
    fn new(node: N, weight: W) -> Self {
        Self { v: node, w: weight }
    }
}

impl<N: Display, W: Display> Display for WeightedNode<N, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.v, self.w)
    }
}

/// A directed edge `u -> v` as produced by readers and generators.
pub type Edge<D> = (<D as Destination>::Node, D);

/// An unsorted edge list awaiting construction.
pub type EdgeList<D> = Vec<Edge<D>>;
