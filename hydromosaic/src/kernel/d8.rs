//! D8 reference kernel.

use super::{EdgeInputs, KernelError, SlopeAspect, TerrainKernel, UpstreamArea};
use crate::grid::Direction;
use crate::raster::Grid;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f32::consts::FRAC_PI_4;

/// Minimum rise applied when filling depressions and flats.
pub const FLAT_EPSILON: f32 = 1e-3;

/// Aspect value of cells without a downslope neighbor.
pub const NO_FLOW: f32 = -1.0;

/// Neighbor offsets, counter-clockwise from east. Index `k` has flow
/// angle `k * PI / 4`.
const OFFSETS: [(isize, isize); 8] = [
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Steepest-descent terrain kernel working in pixel units.
#[derive(Debug, Clone, Copy, Default)]
pub struct D8Kernel;

impl D8Kernel {
    pub fn new() -> Self {
        Self
    }
}

impl TerrainKernel for D8Kernel {
    fn condition_elevation(&self, elevation: &Grid<f32>) -> Result<Grid<f32>, KernelError> {
        if !elevation.as_slice().iter().any(|z| z.is_finite()) {
            return Err(KernelError::NoData);
        }
        Ok(priority_flood(elevation))
    }

    fn slope_aspect(&self, elevation: &Grid<f32>) -> Result<SlopeAspect, KernelError> {
        let (rows, cols) = elevation.shape();
        let mut slope = Grid::filled(rows, cols, f32::NAN);
        let mut aspect = Grid::filled(rows, cols, f32::NAN);

        for r in 0..rows {
            for c in 0..cols {
                if !elevation.get(r, c).is_finite() {
                    continue;
                }
                match steepest_descent(elevation, r, c) {
                    Some((k, s)) => {
                        slope.set(r, c, s);
                        aspect.set(r, c, k as f32 * FRAC_PI_4);
                    }
                    None => {
                        slope.set(r, c, 0.0);
                        aspect.set(r, c, NO_FLOW);
                    }
                }
            }
        }
        Ok(SlopeAspect { slope, aspect })
    }

    fn upstream_area(
        &self,
        elevation: &Grid<f32>,
        aspect: &Grid<f32>,
    ) -> Result<UpstreamArea, KernelError> {
        check_shape("aspect", elevation.shape(), aspect.shape())?;
        let flow = FlowGraph::new(elevation, aspect);

        let (rows, cols) = elevation.shape();
        let mut uca = elevation.map(|z| if z.is_finite() { 1.0 } else { f32::NAN });
        for &cell in &flow.order {
            if let Some(next) = flow.receivers[cell] {
                let (r, c) = (cell / cols, cell % cols);
                let (nr, nc) = (next / cols, next % cols);
                uca.set(nr, nc, uca.get(nr, nc) + uca.get(r, c));
            }
        }

        // Corners touch three neighbors and never wait on any of them
        let todo = Grid::from_fn(rows, cols, |r, c| {
            is_ring(r, c, rows, cols)
                && !is_corner(r, c, rows, cols)
                && flow.receivers[r * cols + c].is_some()
        });
        let done = flow.done(&todo);
        Ok(UpstreamArea { uca, todo, done })
    }

    fn correct_upstream_area(
        &self,
        elevation: &Grid<f32>,
        aspect: &Grid<f32>,
        current: &UpstreamArea,
        edges: &EdgeInputs,
    ) -> Result<UpstreamArea, KernelError> {
        let shape = elevation.shape();
        check_shape("aspect", shape, aspect.shape())?;
        check_shape("uca", shape, current.uca.shape())?;
        check_shape("todo", shape, current.todo.shape())?;
        for dir in Direction::ALL {
            check_edge(dir, shape, edges)?;
        }

        let flow = FlowGraph::new(elevation, aspect);
        let (rows, cols) = shape;
        let mut uca = current.uca.clone();
        let mut todo = current.todo.clone();

        for r in 0..rows {
            for c in 0..cols {
                if !todo.get(r, c) || !is_ring(r, c, rows, cols) {
                    continue;
                }
                match resolve_cell(r, c, shape, edges) {
                    Resolution::Adopt(value) => {
                        let delta = value - uca.get(r, c);
                        if delta > 0.0 {
                            flow.propagate(&mut uca, r * cols + c, delta);
                        }
                        todo.set(r, c, false);
                    }
                    Resolution::Clear => todo.set(r, c, false),
                    Resolution::Wait => {}
                }
            }
        }

        let done = flow.done(&todo);
        Ok(UpstreamArea { uca, todo, done })
    }
}

// =============================================================================
// Boundary resolution
// =============================================================================

enum Resolution {
    /// Neighbor value is final; take it over
    Adopt(f32),
    /// Resolved without a value to receive
    Clear,
    /// Every neighbor is still working
    Wait,
}

/// Combine the verdicts of every edge a boundary cell lies on.
///
/// Any final neighbor value is adopted (the largest if several). An edge
/// whose neighbor owns the shared cell, or whose final value is nodata,
/// resolves the cell without a value. The cell keeps waiting only while
/// every edge it lies on still waits.
fn resolve_cell(r: usize, c: usize, shape: (usize, usize), edges: &EdgeInputs) -> Resolution {
    let mut adopt: Option<f32> = None;
    let mut resolved = false;

    for dir in Direction::ALL {
        let Some(i) = edge_position(r, c, shape, dir) else {
            continue;
        };
        let edge = edges.get(dir);
        if !edge.todo[i] {
            resolved = true;
            continue;
        }
        if edge.neighbor_done[i] {
            let value = edge.neighbor_values[i];
            if value.is_finite() {
                adopt = Some(adopt.map_or(value, |a| a.max(value)));
            } else {
                resolved = true;
            }
        }
    }

    match adopt {
        Some(value) => Resolution::Adopt(value),
        None if resolved => Resolution::Clear,
        None => Resolution::Wait,
    }
}

/// Index of cell `(r, c)` along the given edge, if it lies on it.
fn edge_position(r: usize, c: usize, shape: (usize, usize), dir: Direction) -> Option<usize> {
    let (rows, cols) = shape;
    match dir {
        Direction::Left if c == 0 => Some(r),
        Direction::Right if c + 1 == cols => Some(r),
        Direction::Top if r == 0 => Some(c),
        Direction::Bottom if r + 1 == rows => Some(c),
        _ => None,
    }
}

fn check_shape(
    layer: &'static str,
    expected: (usize, usize),
    found: (usize, usize),
) -> Result<(), KernelError> {
    if expected != found {
        return Err(KernelError::ShapeMismatch {
            layer,
            expected,
            found,
        });
    }
    Ok(())
}

fn check_edge(
    dir: Direction,
    shape: (usize, usize),
    edges: &EdgeInputs,
) -> Result<(), KernelError> {
    let expected = if dir.is_vertical() { shape.0 } else { shape.1 };
    let edge = edges.get(dir);
    for found in [
        edge.neighbor_values.len(),
        edge.neighbor_done.len(),
        edge.todo.len(),
    ] {
        if found != expected {
            return Err(KernelError::EdgeLength {
                direction: dir,
                expected,
                found,
            });
        }
    }
    Ok(())
}

#[inline]
fn is_ring(r: usize, c: usize, rows: usize, cols: usize) -> bool {
    r == 0 || c == 0 || r + 1 == rows || c + 1 == cols
}

#[inline]
fn is_corner(r: usize, c: usize, rows: usize, cols: usize) -> bool {
    (r == 0 || r + 1 == rows) && (c == 0 || c + 1 == cols)
}

// =============================================================================
// Flow graph
// =============================================================================

/// D8 receivers of a tile plus a processing order in which every cell
/// comes before its receiver.
struct FlowGraph {
    shape: (usize, usize),
    receivers: Vec<Option<usize>>,
    order: Vec<usize>,
}

impl FlowGraph {
    fn new(elevation: &Grid<f32>, aspect: &Grid<f32>) -> Self {
        let (rows, cols) = elevation.shape();
        let z = elevation.as_slice();

        let receivers = (0..rows * cols)
            .map(|cell| {
                let (r, c) = (cell / cols, cell % cols);
                let k = direction_index(aspect.get(r, c))?;
                let next = neighbor(r, c, k, rows, cols)?;
                // Only strictly downhill receivers keep the graph acyclic
                (z[next] < z[cell]).then_some(next)
            })
            .collect();

        let mut order: Vec<usize> = (0..rows * cols).filter(|&i| z[i].is_finite()).collect();
        order.sort_by(|&a, &b| z[b].total_cmp(&z[a]).then(a.cmp(&b)));

        Self {
            shape: (rows, cols),
            receivers,
            order,
        }
    }

    /// Ring cells without any todo cell strictly upstream inside the tile.
    fn done(&self, todo: &Grid<bool>) -> Grid<bool> {
        let (rows, cols) = self.shape;
        let mut tainted = vec![false; rows * cols];
        for &cell in &self.order {
            if let Some(next) = self.receivers[cell] {
                if todo.as_slice()[cell] || tainted[cell] {
                    tainted[next] = true;
                }
            }
        }

        let valid: Vec<bool> = {
            let mut v = vec![false; rows * cols];
            for &cell in &self.order {
                v[cell] = true;
            }
            v
        };
        Grid::from_fn(rows, cols, |r, c| {
            let i = r * cols + c;
            is_ring(r, c, rows, cols) && valid[i] && !tainted[i]
        })
    }

    /// Add `delta` to `start` and every cell downstream of it.
    fn propagate(&self, uca: &mut Grid<f32>, start: usize, delta: f32) {
        let cols = self.shape.1;
        let mut cell = Some(start);
        let mut steps = 0;
        while let Some(i) = cell {
            if steps > self.receivers.len() {
                break;
            }
            let (r, c) = (i / cols, i % cols);
            uca.set(r, c, uca.get(r, c) + delta);
            cell = self.receivers[i];
            steps += 1;
        }
    }
}

fn direction_index(aspect: f32) -> Option<usize> {
    if aspect.is_nan() || aspect < 0.0 {
        return None;
    }
    Some(((aspect / FRAC_PI_4).round() as usize) % 8)
}

fn neighbor(r: usize, c: usize, k: usize, rows: usize, cols: usize) -> Option<usize> {
    let (dr, dc) = OFFSETS[k];
    let nr = r.checked_add_signed(dr).filter(|&v| v < rows)?;
    let nc = c.checked_add_signed(dc).filter(|&v| v < cols)?;
    Some(nr * cols + nc)
}

fn steepest_descent(elevation: &Grid<f32>, r: usize, c: usize) -> Option<(usize, f32)> {
    let (rows, cols) = elevation.shape();
    let z = elevation.get(r, c);
    let mut best: Option<(usize, f32)> = None;

    for k in 0..OFFSETS.len() {
        let Some(n) = neighbor(r, c, k, rows, cols) else {
            continue;
        };
        let zn = elevation.as_slice()[n];
        if !zn.is_finite() || zn >= z {
            continue;
        }
        let distance = if k % 2 == 1 { std::f32::consts::SQRT_2 } else { 1.0 };
        let s = (z - zn) / distance;
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((k, s));
        }
    }
    best
}

// =============================================================================
// Priority flood
// =============================================================================

#[derive(PartialEq)]
struct Seed {
    z: f32,
    cell: usize,
}

impl Eq for Seed {}

impl Ord for Seed {
    // Reversed so BinaryHeap pops the lowest cell first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .z
            .total_cmp(&self.z)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for Seed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fill depressions and tilt flats so every valid cell has a strictly
/// lower path to the tile boundary or to a nodata cell.
fn priority_flood(elevation: &Grid<f32>) -> Grid<f32> {
    let (rows, cols) = elevation.shape();
    let mut z: Vec<f32> = elevation.as_slice().to_vec();
    let mut visited = vec![false; rows * cols];
    let mut heap = BinaryHeap::new();

    for r in 0..rows {
        for c in 0..cols {
            let i = r * cols + c;
            if !z[i].is_finite() {
                visited[i] = true;
                continue;
            }
            let touches_nodata = (0..OFFSETS.len()).any(|k| {
                neighbor(r, c, k, rows, cols).is_some_and(|n| !z[n].is_finite())
            });
            if is_ring(r, c, rows, cols) || touches_nodata {
                visited[i] = true;
                heap.push(Seed { z: z[i], cell: i });
            }
        }
    }

    while let Some(Seed { cell, .. }) = heap.pop() {
        let (r, c) = (cell / cols, cell % cols);
        for k in 0..OFFSETS.len() {
            let Some(n) = neighbor(r, c, k, rows, cols) else {
                continue;
            };
            if visited[n] {
                continue;
            }
            visited[n] = true;
            if z[n] <= z[cell] {
                z[n] = step_above(z[cell]);
            }
            heap.push(Seed { z: z[n], cell: n });
        }
    }

    Grid::from_fn(rows, cols, |r, c| z[r * cols + c])
}

/// Smallest practical value strictly above `z`.
fn step_above(z: f32) -> f32 {
    let raised = z + FLAT_EPSILON;
    if raised > z {
        return raised;
    }
    let bits = z.to_bits();
    if z >= 0.0 {
        f32::from_bits(bits + 1)
    } else {
        f32::from_bits(bits - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::EdgeInput;

    /// Plane sloping down towards the east.
    fn east_plane(rows: usize, cols: usize) -> Grid<f32> {
        Grid::from_fn(rows, cols, |_, c| 100.0 - c as f32)
    }

    fn run_uca(elev: &Grid<f32>) -> UpstreamArea {
        let kernel = D8Kernel::new();
        let filled = kernel.condition_elevation(elev).unwrap();
        let sa = kernel.slope_aspect(&filled).unwrap();
        kernel.upstream_area(&filled, &sa.aspect).unwrap()
    }

    /// Edge inputs that reference the tile's own boundary.
    fn own_edges(area: &UpstreamArea) -> EdgeInputs {
        let (rows, cols) = area.uca.shape();
        let mut edges = EdgeInputs::new();
        for dir in Direction::ALL {
            let cells: Vec<(usize, usize)> = match dir {
                Direction::Left => (0..rows).map(|r| (r, 0)).collect(),
                Direction::Right => (0..rows).map(|r| (r, cols - 1)).collect(),
                Direction::Top => (0..cols).map(|c| (0, c)).collect(),
                Direction::Bottom => (0..cols).map(|c| (rows - 1, c)).collect(),
            };
            edges.set(
                dir,
                EdgeInput {
                    neighbor_values: cells.iter().map(|&(r, c)| area.uca.get(r, c)).collect(),
                    neighbor_done: cells.iter().map(|&(r, c)| area.done.get(r, c)).collect(),
                    todo: vec![false; cells.len()],
                },
            );
        }
        edges
    }

    #[test]
    fn test_priority_flood_fills_pit() {
        let mut elev = Grid::filled(5, 5, 10.0f32);
        elev.set(2, 2, 1.0);
        let filled = D8Kernel::new().condition_elevation(&elev).unwrap();
        assert!(filled.get(2, 2) > 10.0);
        assert_eq!(filled.get(0, 0), 10.0);
    }

    #[test]
    fn test_priority_flood_drains_flat() {
        let elev = Grid::filled(4, 6, 5.0f32);
        let kernel = D8Kernel::new();
        let filled = kernel.condition_elevation(&elev).unwrap();
        let sa = kernel.slope_aspect(&filled).unwrap();
        for r in 1..3 {
            for c in 1..5 {
                assert!(sa.aspect.get(r, c) >= 0.0, "interior cell ({}, {}) has no outlet", r, c);
            }
        }
    }

    #[test]
    fn test_condition_rejects_all_nodata() {
        let elev = Grid::filled(2, 2, f32::NAN);
        assert_eq!(
            D8Kernel::new().condition_elevation(&elev),
            Err(KernelError::NoData)
        );
    }

    #[test]
    fn test_slope_aspect_east_plane() {
        let sa = D8Kernel::new().slope_aspect(&east_plane(3, 4)).unwrap();
        assert_eq!(sa.aspect.get(1, 1), 0.0);
        assert_eq!(sa.slope.get(1, 1), 1.0);
        // Last column has no lower neighbor
        assert_eq!(sa.aspect.get(1, 3), NO_FLOW);
        assert_eq!(sa.slope.get(1, 3), 0.0);
    }

    #[test]
    fn test_slope_aspect_prefers_diagonal_when_steeper() {
        let elev = Grid::from_fn(3, 3, |r, c| 100.0 - (r + c) as f32);
        let sa = D8Kernel::new().slope_aspect(&elev).unwrap();
        assert!((sa.aspect.get(1, 1) - 7.0 * FRAC_PI_4).abs() < 1e-6);
    }

    #[test]
    fn test_upstream_area_counts_cells() {
        let area = run_uca(&east_plane(3, 5));
        for r in 0..3 {
            for c in 0..5 {
                assert_eq!(area.uca.get(r, c), (c + 1) as f32);
            }
        }
    }

    #[test]
    fn test_initial_boundary_flags() {
        let area = run_uca(&east_plane(3, 5));
        // Left column drains inward, right column drains out
        assert!(area.todo.get(1, 0));
        assert!(!area.todo.get(1, 4));
        // Top row drains along the edge into the tile
        assert!(area.todo.get(0, 2));
        // Corners never wait, interior cells never carry flags
        assert!(!area.todo.get(0, 0));
        assert!(!area.todo.get(2, 0));
        assert!(!area.todo.get(1, 2));
        assert!(!area.done.get(1, 2));

        // Left column has nothing upstream, right column waits on it
        assert!(area.done.get(1, 0));
        assert!(!area.done.get(1, 4));
    }

    #[test]
    fn test_correction_against_own_edges_clears_everything() {
        let kernel = D8Kernel::new();
        let elev = east_plane(4, 4);
        let sa = kernel.slope_aspect(&elev).unwrap();
        let area = kernel.upstream_area(&elev, &sa.aspect).unwrap();
        assert!(area.pending() > 0);

        let corrected = kernel
            .correct_upstream_area(&elev, &sa.aspect, &area, &own_edges(&area))
            .unwrap();
        assert_eq!(corrected.pending(), 0);
        assert_eq!(corrected.uca, area.uca);
        // With no todo left every boundary cell is final
        assert!(corrected.done.get(2, 3));
    }

    #[test]
    fn test_correction_adopts_neighbor_value() {
        let kernel = D8Kernel::new();
        let elev = east_plane(3, 4);
        let sa = kernel.slope_aspect(&elev).unwrap();
        let area = kernel.upstream_area(&elev, &sa.aspect).unwrap();

        let mut edges = own_edges(&area);
        edges.set(
            Direction::Left,
            EdgeInput {
                neighbor_values: vec![10.0; 3],
                neighbor_done: vec![true; 3],
                todo: vec![true; 3],
            },
        );

        let corrected = kernel
            .correct_upstream_area(&elev, &sa.aspect, &area, &edges)
            .unwrap();
        // Middle row gains the inflow all the way downstream
        assert_eq!(corrected.uca.get(1, 0), 10.0);
        assert_eq!(corrected.uca.get(1, 3), 13.0);
        assert_eq!(corrected.pending(), 0);
    }

    #[test]
    fn test_correction_waits_for_unfinished_neighbor() {
        let kernel = D8Kernel::new();
        let elev = east_plane(3, 4);
        let sa = kernel.slope_aspect(&elev).unwrap();
        let area = kernel.upstream_area(&elev, &sa.aspect).unwrap();

        let mut edges = own_edges(&area);
        edges.set(
            Direction::Left,
            EdgeInput {
                neighbor_values: vec![10.0; 3],
                neighbor_done: vec![false; 3],
                todo: vec![true; 3],
            },
        );

        let corrected = kernel
            .correct_upstream_area(&elev, &sa.aspect, &area, &edges)
            .unwrap();
        assert!(corrected.todo.get(1, 0));
        assert_eq!(corrected.uca.get(1, 3), 4.0);
        // Right edge still waits on the pending left column
        assert!(!corrected.done.get(1, 3));
    }

    #[test]
    fn test_owned_cell_is_cleared_while_neighbor_works() {
        let kernel = D8Kernel::new();
        let elev = east_plane(3, 4);
        let sa = kernel.slope_aspect(&elev).unwrap();
        let area = kernel.upstream_area(&elev, &sa.aspect).unwrap();
        assert!(area.todo.get(1, 0));

        // Neighbor owns the shared cell and has not finished yet
        let mut edges = own_edges(&area);
        edges.set(
            Direction::Left,
            EdgeInput {
                neighbor_values: vec![10.0; 3],
                neighbor_done: vec![false; 3],
                todo: vec![false; 3],
            },
        );

        let corrected = kernel
            .correct_upstream_area(&elev, &sa.aspect, &area, &edges)
            .unwrap();
        assert!(!corrected.todo.get(1, 0));
        assert_eq!(corrected.uca.get(1, 3), 4.0);
        assert_eq!(corrected.pending(), 0);
        assert!(corrected.done.get(1, 3));
    }

    #[test]
    fn test_nodata_neighbor_value_clears_without_adopting() {
        let kernel = D8Kernel::new();
        let elev = east_plane(3, 4);
        let sa = kernel.slope_aspect(&elev).unwrap();
        let area = kernel.upstream_area(&elev, &sa.aspect).unwrap();

        let mut edges = own_edges(&area);
        edges.set(
            Direction::Left,
            EdgeInput {
                neighbor_values: vec![f32::NAN; 3],
                neighbor_done: vec![true; 3],
                todo: vec![true; 3],
            },
        );

        let corrected = kernel
            .correct_upstream_area(&elev, &sa.aspect, &area, &edges)
            .unwrap();
        assert!(!corrected.todo.get(1, 0));
        assert_eq!(corrected.uca.get(1, 3), 4.0);
        assert_eq!(corrected.pending(), 0);
    }

    #[test]
    fn test_correction_rejects_bad_edge_length() {
        let kernel = D8Kernel::new();
        let elev = east_plane(3, 4);
        let sa = kernel.slope_aspect(&elev).unwrap();
        let area = kernel.upstream_area(&elev, &sa.aspect).unwrap();

        let mut edges = own_edges(&area);
        edges.set(Direction::Top, EdgeInput::default());
        let err = kernel
            .correct_upstream_area(&elev, &sa.aspect, &area, &edges)
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::EdgeLength {
                direction: Direction::Top,
                expected: 4,
                found: 0
            }
        ));
    }

    #[test]
    fn test_upstream_area_shape_mismatch() {
        let err = D8Kernel::new()
            .upstream_area(&Grid::filled(2, 2, 1.0), &Grid::filled(2, 3, 0.0))
            .unwrap_err();
        assert!(matches!(err, KernelError::ShapeMismatch { layer: "aspect", .. }));
    }
}
