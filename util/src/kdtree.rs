//! # K-D Tree Implementation
//!
//! A static two dimensional [k-d tree](https://en.wikipedia.org/wiki/K-d_tree) used for nearest
//! neighbour queries over a fixed set of points.
//!
//! The tree is built once from a list of points and never modified afterwards. Points are
//! identified by their index in the list given to [`KdTree::new`], and queries return that index.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use nalgebra::Vector2;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of dimensions the tree splits on
pub const NUM_DIMS: usize = 2;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// A node in the tree, stored in a flat arena.
#[derive(Clone, Copy, Debug)]
struct KdNode {
    /// Index of the point this node splits on
    index: usize,

    /// Axis this node splits on (0 = x, 1 = y)
    axis: usize,

    /// Arena index of the left child (points with a smaller or equal coordinate on `axis`)
    left: Option<usize>,

    /// Arena index of the right child (points with a larger or equal coordinate on `axis`)
    right: Option<usize>,
}

/// An immutable 2D k-d tree.
#[derive(Clone, Debug)]
pub struct KdTree {
    /// The points in the tree, in their original order
    points: Vec<Vector2<f64>>,

    /// Node arena
    nodes: Vec<KdNode>,

    /// Arena index of the root node
    root: Option<usize>,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum KdTreeError {
    #[error("Cannot build a k-d tree from an empty set of points")]
    Empty,

    #[error("Point {0} ({1}) is not finite")]
    NonFinitePoint(usize, Vector2<f64>),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl KdTree {
    /// Build a new tree from the given points.
    ///
    /// Construction is O(N log N), each level being partitioned around its median with a linear
    /// time selection.
    pub fn new(points: Vec<Vector2<f64>>) -> Result<Self, KdTreeError> {
        if points.is_empty() {
            return Err(KdTreeError::Empty);
        }

        // NaNs would break the ordering used to partition the points
        for (i, point) in points.iter().enumerate() {
            if !(point[0].is_finite() && point[1].is_finite()) {
                return Err(KdTreeError::NonFinitePoint(i, *point));
            }
        }

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());

        let root = build(&points, &mut indices, 0, &mut nodes);

        Ok(Self {
            points,
            nodes,
            root,
        })
    }

    /// Number of points in the tree
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, the tree cannot be built from an empty set of points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find the point nearest to `query`.
    ///
    /// Returns the index of the point and the euclidean distance to it. If several points are at
    /// the same distance the one with the lowest index is returned. `None` is only returned if
    /// the query itself is not finite.
    pub fn nearest(&self, query: &Vector2<f64>) -> Option<(usize, f64)> {
        if !(query[0].is_finite() && query[1].is_finite()) {
            return None;
        }

        let mut best = Best {
            index: usize::MAX,
            dist_sq: f64::INFINITY,
        };

        self.search(self.root, query, &mut best);

        match best.index {
            usize::MAX => None,
            i => Some((i, best.dist_sq.sqrt())),
        }
    }

    fn search(&self, node: Option<usize>, query: &Vector2<f64>, best: &mut Best) {
        let node = match node {
            Some(n) => self.nodes[n],
            None => return,
        };

        let point = self.points[node.index];
        let dist_sq = (point - query).norm_squared();

        if dist_sq < best.dist_sq || (dist_sq == best.dist_sq && node.index < best.index) {
            best.index = node.index;
            best.dist_sq = dist_sq;
        }

        // Descend into the side the query lies on first
        let diff = query[node.axis] - point[node.axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        self.search(near, query, best);

        // Equal distances still have to be visited so ties resolve to the lowest index
        if diff * diff <= best.dist_sq {
            self.search(far, query, best);
        }
    }
}

/// Current best candidate during a search
struct Best {
    index: usize,
    dist_sq: f64,
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Recursively build the subtree for `indices`, returning the arena index of its root.
fn build(
    points: &[Vector2<f64>],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> Option<usize> {
    if indices.is_empty() {
        return None;
    }

    let axis = depth % NUM_DIMS;
    let median = indices.len() / 2;

    // Partition around the median, ordering by coordinate then by index so the tree is
    // deterministic for duplicate coordinates
    indices.select_nth_unstable_by(median, |a, b| {
        points[*a][axis]
            .total_cmp(&points[*b][axis])
            .then(a.cmp(b))
    });

    let id = nodes.len();
    nodes.push(KdNode {
        index: indices[median],
        axis,
        left: None,
        right: None,
    });

    let (lower, upper) = indices.split_at_mut(median);
    let left = build(points, lower, depth + 1, nodes);
    let right = build(points, &mut upper[1..], depth + 1, nodes);

    nodes[id].left = left;
    nodes[id].right = right;

    Some(id)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
