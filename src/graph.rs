//! Complete-graph primitives: canonical edge enumeration, Euclidean edge
//! weights, and tour length.

use std::sync::Arc;

/// 2D city coordinates.
pub type Point = [f64; 2];

/// An undirected edge, stored normalized so that `a < b`. Both orientations
/// of a node pair map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    a: usize,
    b: usize,
}

impl EdgeKey {
    /// Build a key from either orientation of a node pair.
    ///
    /// # Panics
    /// Panics on self-loops; a complete TSP graph has none.
    pub fn new(u: usize, v: usize) -> Self {
        assert_ne!(u, v, "self-loop edge ({u}, {v})");
        EdgeKey {
            a: u.min(v),
            b: u.max(v),
        }
    }

    pub fn endpoints(&self) -> (usize, usize) {
        (self.a, self.b)
    }

    pub fn contains(&self, node: usize) -> bool {
        self.a == node || self.b == node
    }
}

/// The fully-connected edge set over `n` nodes, enumerated in canonical
/// order: (0,1), (0,2), .., (0,n-1), (1,2), ..
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSet {
    n: usize,
}

impl EdgeSet {
    pub fn new(n: usize) -> Self {
        EdgeSet { n }
    }

    pub fn n_vars(&self) -> usize {
        self.n
    }

    /// Number of edges: C(n, 2).
    pub fn len(&self) -> usize {
        self.n * (self.n - 1) / 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Edges in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        let n = self.n;
        (0..n).flat_map(move |i| (i + 1..n).map(move |j| EdgeKey { a: i, b: j }))
    }

    /// Position of `edge` in the canonical enumeration.
    pub fn index_of(&self, edge: EdgeKey) -> usize {
        debug_assert!(edge.b < self.n, "edge {edge:?} outside graph of {} nodes", self.n);
        // Edges before row `a`: sum_{k<a} (n-1-k); then offset within the row.
        let (a, b) = (edge.a, edge.b);
        a * self.n - a * (a + 1) / 2 + (b - a - 1)
    }
}

/// Per-instance edge weights, indexed by the canonical edge order of
/// [`EdgeSet`]. Computed once per instance; shared immutably between the
/// environment and stored transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeWeights {
    edges: EdgeSet,
    weights: Vec<f64>,
}

impl EdgeWeights {
    /// Compute all pairwise Euclidean distances for an instance.
    pub fn from_nodes(nodes: &[Point]) -> Self {
        let edges = EdgeSet::new(nodes.len());
        let weights = edges
            .iter()
            .map(|e| {
                let (a, b) = e.endpoints();
                distance(nodes[a], nodes[b])
            })
            .collect();
        EdgeWeights { edges, weights }
    }

    pub fn edge_set(&self) -> EdgeSet {
        self.edges
    }

    pub fn n_vars(&self) -> usize {
        self.edges.n_vars()
    }

    /// Weight of an edge, by canonical key. Either orientation of the node
    /// pair resolves here because `EdgeKey` normalizes at construction.
    pub fn get(&self, edge: EdgeKey) -> f64 {
        self.weights[self.edges.index_of(edge)]
    }

    /// Weights in canonical edge order.
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn shared(nodes: &[Point]) -> Arc<Self> {
        Arc::new(Self::from_nodes(nodes))
    }
}

pub fn distance(p: Point, q: Point) -> f64 {
    let dx = p[0] - q[0];
    let dy = p[1] - q[1];
    (dx * dx + dy * dy).sqrt()
}

/// Length of the closed tour visiting `order`, returning to its first node.
/// An order that already ends where it starts gains a zero-length closing
/// edge, so both open and pre-closed orders measure identically.
pub fn tour_length(nodes: &[Point], order: &[usize]) -> f64 {
    if order.len() < 2 {
        return 0.0;
    }
    let mut length: f64 = order
        .windows(2)
        .map(|w| distance(nodes[w[0]], nodes[w[1]]))
        .sum();
    length += distance(nodes[order[order.len() - 1]], nodes[order[0]]);
    length
}
