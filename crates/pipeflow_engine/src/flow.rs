//! Water flow propagation.
//!
//! Propagation runs in three passes over a grid snapshot:
//!
//! 1. **Reset** - every tile is drained; the source is re-seeded with water.
//! 2. **Flood** - breadth-first search from the source. An edge exists only
//!    when both endpoints declare the connection. Water entering a broken
//!    tile marks it leaking and goes no further.
//! 3. **Leak pass** - every watered tile (other than the endpoints) whose
//!    openings run off the grid or into a non-reciprocating neighbor is
//!    marked leaking. This pass never stops flow retroactively.
//!
//! Each pass is O(N²) and the whole propagation is idempotent.

use crate::connections::effective_connections;
use crate::direction::Direction;
use crate::grid::{Coord, Grid};
use crate::tile::TileKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, instrument, trace};

/// Summary of one propagation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowReport {
    /// Tiles reachable from the source (source included).
    pub connected_count: usize,
    /// Tiles marked leaking after the leak pass.
    pub leaking_count: usize,
    /// The inlet is connected and carries water.
    pub puzzle_complete: bool,
}

/// Recomputes `connected`, `has_water` and `leaking` for every tile.
#[instrument(skip(grid), fields(size = grid.size()))]
pub fn propagate(grid: &mut Grid) -> FlowReport {
    reset(grid);
    flood(grid);
    mark_open_ends(grid);

    let report = FlowReport {
        connected_count: grid.connected_count(),
        leaking_count: grid.leaking_count(),
        puzzle_complete: is_complete(grid),
    };
    debug!(?report, "Flow propagated");
    report
}

/// Whether the inlet currently holds water from the source.
pub fn is_complete(grid: &Grid) -> bool {
    grid.get(grid.inlet())
        .is_some_and(|inlet| inlet.connected() && inlet.has_water())
}

/// Whether the neighbor in `direction` accepts a connection from `at`.
///
/// Off-grid neighbors never accept; that is a normal "no edge" condition.
pub fn reciprocates(grid: &Grid, at: Coord, direction: Direction) -> bool {
    at.step(direction, grid.size())
        .and_then(|next| grid.get(next))
        .is_some_and(|neighbor| effective_connections(neighbor).opens(direction.opposite()))
}

/// Coordinates of watered tiles with an opening that goes nowhere.
///
/// The source and inlet are exempt: their spare opening is intentional.
#[instrument(skip(grid), fields(size = grid.size()))]
pub fn dangling_tiles(grid: &Grid) -> Vec<Coord> {
    grid.tiles()
        .iter()
        .filter(|tile| tile.has_water() && !tile.is_fixed())
        .filter(|tile| {
            effective_connections(tile)
                .directions()
                .any(|direction| !reciprocates(grid, tile.coord(), direction))
        })
        .map(|tile| tile.coord())
        .collect()
}

/// Leak pass: marks every dangling watered tile as leaking.
///
/// Returns the number of tiles leaking afterwards.
#[instrument(skip(grid), fields(size = grid.size()))]
pub fn mark_open_ends(grid: &mut Grid) -> usize {
    for at in dangling_tiles(grid) {
        if let Some(tile) = grid.tile_mut(at) {
            trace!(%at, kind = %tile.kind(), "Open connection leaks");
            tile.mark_leaking();
        }
    }
    grid.leaking_count()
}

fn reset(grid: &mut Grid) {
    for tile in grid.tiles_mut() {
        tile.drain();
        if tile.kind() == TileKind::Start {
            tile.fill();
        }
    }
}

fn flood(grid: &mut Grid) {
    let size = grid.size();
    let source = grid.source();
    let mut visited = vec![false; grid.cell_count()];
    let mut queue = VecDeque::from([source]);
    if let Some(index) = grid.index(source) {
        visited[index] = true;
    }

    while let Some(at) = queue.pop_front() {
        let Some(tile) = grid.get(at) else {
            continue;
        };

        if tile.kind() == TileKind::Broken {
            trace!(%at, "Water stops at broken pipe");
            if let Some(tile) = grid.tile_mut(at) {
                tile.mark_leaking();
            }
            continue;
        }

        for direction in effective_connections(tile).directions() {
            let Some(next) = at.step(direction, size) else {
                continue;
            };
            let Some(index) = grid.index(next) else {
                continue;
            };
            if visited[index] || !reciprocates(grid, at, direction) {
                continue;
            }

            visited[index] = true;
            if let Some(neighbor) = grid.tile_mut(next) {
                neighbor.fill();
            }
            queue.push_back(next);
        }
    }
}
