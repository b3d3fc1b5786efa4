/// Tile types, their properties and the tile grid.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use super::entity::Facing;
use super::geom::{Aabb, Vec2};

/// Direction a projectile emitter fires in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FireDir {
    Left,
    Right,
    Down,
}

impl FireDir {
    pub fn vector(self) -> Vec2 {
        match self {
            FireDir::Left => Vec2::new(-1.0, 0.0),
            FireDir::Right => Vec2::new(1.0, 0.0),
            FireDir::Down => Vec2::new(0.0, 1.0),
        }
    }

    pub fn horizontal(self) -> Option<Facing> {
        match self {
            FireDir::Left => Some(Facing::Left),
            FireDir::Right => Some(Facing::Right),
            FireDir::Down => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Ground,          // Solid floor / wall
    Spike,           // Hazard, not solid
    Emitter(FireDir),// Solid, fires projectiles
    Goal,            // Level exit
}

impl Tile {
    /// Does this tile block movement? (ground-classified geometry)
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Ground | Tile::Emitter(_))
    }

    pub fn is_spike(self) -> bool {
        matches!(self, Tile::Spike)
    }

    pub fn is_goal(self) -> bool {
        matches!(self, Tile::Goal)
    }
}

/// The effective terrain of a level.
///
/// Out of bounds: left and right edges act as walls, the sky and the
/// pit below the map are open. Falling out of the bottom is the death
/// boundary and is checked by the step function, not here.
#[derive(Clone, Debug, Default)]
pub struct TileMap {
    pub tiles: Vec<Vec<Tile>>,
    pub width: usize,
    pub height: usize,
}

impl TileMap {
    pub fn new(tiles: Vec<Vec<Tile>>) -> Self {
        let height = tiles.len();
        let width = tiles.first().map_or(0, |r| r.len());
        TileMap { tiles, width, height }
    }

    /// Tile at an integer cell, with out-of-bounds rules applied.
    #[inline]
    pub fn tile_at(&self, x: i32, y: i32) -> Tile {
        if x < 0 || x >= self.width as i32 {
            return Tile::Ground;
        }
        if y < 0 || y >= self.height as i32 {
            return Tile::Empty;
        }
        self.tiles[y as usize][x as usize]
    }

    #[inline]
    pub fn solid_at(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y).is_solid()
    }

    /// Append the boxes of every solid cell touching `region`.
    pub fn collect_solids(&self, region: Aabb, out: &mut Vec<Aabb>) {
        let (x0, y0) = (region.min.x.floor() as i32, region.min.y.floor() as i32);
        let (x1, y1) = (region.max.x.floor() as i32, region.max.y.floor() as i32);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.solid_at(x, y) {
                    out.push(Aabb::cell(x, y));
                }
            }
        }
    }

    /// Does `region` overlap any cell satisfying `pred`?
    pub fn any_cell(&self, region: Aabb, pred: impl Fn(Tile) -> bool) -> bool {
        let (x0, y0) = (region.min.x.floor() as i32, region.min.y.floor() as i32);
        let (x1, y1) = (region.max.x.floor() as i32, region.max.y.floor() as i32);
        (y0..=y1).any(|y| {
            (x0..=x1).any(|x| pred(self.tile_at(x, y)) && Aabb::cell(x, y).overlaps(&region))
        })
    }

    /// Every emitter cell in the map, row-major.
    pub fn emitters(&self) -> Vec<(i32, i32, FireDir)> {
        let mut found = vec![];
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                if let Tile::Emitter(dir) = tile {
                    found.push((x as i32, y as i32, *dir));
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(rows: &[&str]) -> TileMap {
        TileMap::new(rows.iter().map(|r| {
            r.chars().map(|c| match c {
                '#' => Tile::Ground,
                '^' => Tile::Spike,
                '>' => Tile::Emitter(FireDir::Right),
                'G' => Tile::Goal,
                _ => Tile::Empty,
            }).collect()
        }).collect())
    }

    #[test]
    fn side_edges_are_walls_and_sky_is_open() {
        let m = map(&["  ", "##"]);
        assert!(m.solid_at(-1, 0));
        assert!(m.solid_at(2, 1));
        assert!(!m.solid_at(0, -3));
        assert!(!m.solid_at(0, 5));
    }

    #[test]
    fn emitters_are_solid() {
        let m = map(&[">  "]);
        assert!(m.solid_at(0, 0));
        assert_eq!(m.emitters(), vec![(0, 0, FireDir::Right)]);
    }

    #[test]
    fn collect_solids_finds_cells_in_region() {
        let m = map(&["   ", "# #"]);
        let mut out = vec![];
        m.collect_solids(Aabb::new(Vec2::new(0.2, 0.5), Vec2::new(2.5, 1.5)), &mut out);
        assert_eq!(out, vec![Aabb::cell(0, 1), Aabb::cell(2, 1)]);
    }

    #[test]
    fn spike_query_needs_real_overlap() {
        let m = map(&[" ^ "]);
        let touching = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        assert!(!m.any_cell(touching, Tile::is_spike));
        let inside = Aabb::new(Vec2::new(0.5, 0.2), Vec2::new(1.2, 0.9));
        assert!(m.any_cell(inside, Tile::is_spike));
    }
}
