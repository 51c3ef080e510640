//! Barnes-Hut quad-tree over node positions.
//!
//! The tree aggregates point mass and center-of-mass per region so that
//! long-range repulsion can treat distant clusters as single points,
//! bringing the per-iteration repulsion cost from O(n²) down to O(n log n).
//!
//! Cells are stored in a contiguous arena addressed by integer handles and
//! tagged as either `Leaf { points }` or `Internal { children }`, avoiding
//! pointer-chasing on the rebuild that happens every iteration.
//!
//! Center-of-mass aggregates are maintained as incremental running means on
//! the insertion path. The floating-point result is therefore insertion-order
//! dependent (rounding only, not the ideal aggregate); comparisons belong
//! behind a tolerance.

/// Distance floor applied to every force denominator, guarding coincident
/// points.
pub const MIN_DISTANCE: f32 = 0.01;

/// Tuning knobs for tree construction and the repulsion query.
#[derive(Debug, Clone, Copy)]
pub struct QuadTreeConfig {
    /// Barnes-Hut accuracy parameter: recurse into a cell only while
    /// `cell_width / distance_to_center_of_mass > theta` (default: 0.5).
    pub theta: f32,
    /// Points a leaf may hold before it subdivides (default: 4).
    pub leaf_capacity: usize,
    /// Padding added to each side of the point bounding box (default: 10).
    pub padding: f32,
    /// Leaves narrower than this never subdivide, preventing unbounded
    /// recursion for near-coincident points (default: 1).
    pub min_cell_width: f32,
    /// Floor on root width/height, guarding degenerate trees when points
    /// coincide or are few (default: 100).
    pub min_extent: f32,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            theta: 0.5,
            leaf_capacity: 4,
            padding: 10.0,
            min_cell_width: 1.0,
            min_extent: 100.0,
        }
    }
}

/// A point in the tree: a node's slot, position, and mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Stable slot index of the node within the run. Used for self-force
    /// exclusion during queries.
    pub slot: usize,
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Mass.
    pub mass: f32,
}

/// Arena handle of a cell.
type CellId = usize;

const ROOT: CellId = 0;

/// One quad-tree cell: a rectangular region with mass aggregates and either
/// directly held points or four children.
struct Cell {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    /// Sum of masses of all points in this subtree.
    mass: f32,
    /// Mass-weighted mean position of all points in this subtree.
    com_x: f32,
    com_y: f32,
    kind: CellKind,
}

enum CellKind {
    Leaf { points: Vec<Particle> },
    /// Children in NW, NE, SW, SE order (x grows east, y grows south).
    Internal { children: [CellId; 4] },
}

impl Cell {
    fn leaf(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            mass: 0.0,
            com_x: 0.0,
            com_y: 0.0,
            kind: CellKind::Leaf { points: Vec::new() },
        }
    }
}

/// The Barnes-Hut spatial index.
///
/// Rebuilt from scratch every iteration (positions change each step); never
/// persisted across iterations.
pub struct QuadTree {
    cells: Vec<Cell>,
    config: QuadTreeConfig,
}

impl QuadTree {
    /// Build a tree covering all particles.
    ///
    /// The root region is the particle bounding box expanded by
    /// `config.padding` per side, with width and height floored at
    /// `config.min_extent` (grown symmetrically about the box center).
    pub fn build(particles: &[Particle], config: QuadTreeConfig) -> Self {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for p in particles {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if particles.is_empty() {
            min_x = 0.0;
            min_y = 0.0;
            max_x = 0.0;
            max_y = 0.0;
        }

        let mut x = min_x - config.padding;
        let mut y = min_y - config.padding;
        let mut width = (max_x - min_x) + 2.0 * config.padding;
        let mut height = (max_y - min_y) + 2.0 * config.padding;
        if width < config.min_extent {
            x -= (config.min_extent - width) * 0.5;
            width = config.min_extent;
        }
        if height < config.min_extent {
            y -= (config.min_extent - height) * 0.5;
            height = config.min_extent;
        }

        let mut tree = Self {
            cells: vec![Cell::leaf(x, y, width, height)],
            config,
        };
        for &p in particles {
            tree.insert(p);
        }
        tree
    }

    /// Insert one particle, updating mass and center-of-mass aggregates on
    /// the descent path.
    pub fn insert(&mut self, particle: Particle) {
        self.insert_from(ROOT, particle);
    }

    /// Aggregate mass of the whole tree.
    #[inline]
    pub fn total_mass(&self) -> f32 {
        self.cells[ROOT].mass
    }

    /// Root region as (x, y, width, height).
    #[inline]
    pub fn root_bounds(&self) -> (f32, f32, f32, f32) {
        let root = &self.cells[ROOT];
        (root.x, root.y, root.width, root.height)
    }

    /// Number of arena cells (leaves plus internal).
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Approximate repulsion force on the query point from every other
    /// particle in the tree.
    ///
    /// A cell is treated as a single aggregate point unless
    /// `cell_width / distance > theta`, in which case its children are
    /// visited. Leaf points are applied pairwise, skipping the queried slot
    /// itself. Each contribution has magnitude
    /// `repulsion * mass * other_mass / d²`, directed away from the other
    /// point, with `d` floored at [`MIN_DISTANCE`].
    pub fn repulsion(&self, slot: usize, x: f32, y: f32, mass: f32, repulsion: f32) -> (f32, f32) {
        let mut fx = 0.0;
        let mut fy = 0.0;
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let cell = &self.cells[id];
            if cell.mass <= 0.0 {
                continue;
            }
            match &cell.kind {
                CellKind::Leaf { points } => {
                    for p in points {
                        if p.slot == slot {
                            continue;
                        }
                        let (dfx, dfy) = point_repulsion(x, y, mass, p.x, p.y, p.mass, repulsion);
                        fx += dfx;
                        fy += dfy;
                    }
                }
                CellKind::Internal { children } => {
                    let dx = x - cell.com_x;
                    let dy = y - cell.com_y;
                    let d = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                    if cell.width / d > self.config.theta {
                        stack.extend_from_slice(children);
                    } else {
                        let (dfx, dfy) =
                            point_repulsion(x, y, mass, cell.com_x, cell.com_y, cell.mass, repulsion);
                        fx += dfx;
                        fy += dfy;
                    }
                }
            }
        }
        (fx, fy)
    }

    /// Descend from `start`, updating aggregates along the path, and place
    /// the particle in the leaf it lands in. Used both for public inserts
    /// (from the root) and for redistributing points after a subdivision
    /// (from a fresh child).
    fn insert_from(&mut self, start: CellId, particle: Particle) {
        let mut id = start;
        loop {
            let (mid_x, mid_y);
            {
                let cell = &mut self.cells[id];
                let total = cell.mass + particle.mass;
                if total > 0.0 {
                    // Incremental running mean; exact for the ideal aggregate,
                    // order-dependent in rounding.
                    cell.com_x += (particle.x - cell.com_x) * particle.mass / total;
                    cell.com_y += (particle.y - cell.com_y) * particle.mass / total;
                }
                cell.mass = total;
                mid_x = cell.x + cell.width * 0.5;
                mid_y = cell.y + cell.height * 0.5;
            }

            let crowded = match &mut self.cells[id].kind {
                CellKind::Internal { children } => {
                    id = children[quadrant(mid_x, mid_y, particle.x, particle.y)];
                    continue;
                }
                CellKind::Leaf { points } => {
                    points.push(particle);
                    points.len() > self.config.leaf_capacity
                }
            };

            // The width floor turns crowded narrow leaves into plain point
            // lists instead of recursing without bound.
            if crowded && self.cells[id].width > self.config.min_cell_width {
                self.subdivide(id);
            }
            return;
        }
    }

    /// Convert a leaf into an internal cell, redistributing its points into
    /// four fresh children. The cell's own aggregates already cover the
    /// points, so redistribution updates child aggregates only.
    fn subdivide(&mut self, id: CellId) {
        let (x, y, half_w, half_h) = {
            let cell = &self.cells[id];
            (cell.x, cell.y, cell.width * 0.5, cell.height * 0.5)
        };

        let base = self.cells.len();
        self.cells.push(Cell::leaf(x, y, half_w, half_h)); // NW
        self.cells.push(Cell::leaf(x + half_w, y, half_w, half_h)); // NE
        self.cells.push(Cell::leaf(x, y + half_h, half_w, half_h)); // SW
        self.cells.push(Cell::leaf(x + half_w, y + half_h, half_w, half_h)); // SE

        let children = [base, base + 1, base + 2, base + 3];
        let old = std::mem::replace(&mut self.cells[id].kind, CellKind::Internal { children });
        let CellKind::Leaf { points } = old else {
            return;
        };

        let mid_x = x + half_w;
        let mid_y = y + half_h;
        for p in points {
            self.insert_from(children[quadrant(mid_x, mid_y, p.x, p.y)], p);
        }
    }
}

/// Quadrant index for a point relative to a cell midpoint, in NW, NE, SW, SE
/// order. Coordinates exactly equal to the midpoint resolve to the
/// lower-index quadrant.
#[inline]
fn quadrant(mid_x: f32, mid_y: f32, px: f32, py: f32) -> usize {
    let east = px > mid_x;
    let south = py > mid_y;
    (south as usize) * 2 + east as usize
}

/// Inverse-square repulsion between the query point and one other point (or
/// aggregate), directed away from the other point.
#[inline]
fn point_repulsion(
    x: f32,
    y: f32,
    mass: f32,
    other_x: f32,
    other_y: f32,
    other_mass: f32,
    repulsion: f32,
) -> (f32, f32) {
    let dx = x - other_x;
    let dy = y - other_y;
    let d = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
    let magnitude = repulsion * mass * other_mass / (d * d);
    (dx / d * magnitude, dy / d * magnitude)
}
