//! Dense, coordinate-addressed tile storage.
//!
//! A [`TileGrid`] holds `tiles_y * tiles_x` equally shaped HWC tiles in one
//! contiguous buffer; tile `(row, col)` lives at slot `row * tiles_x + col`.
//! The first tile stored fixes the shape for the whole grid, so a mosaic can
//! never be assembled from tiles of different sizes.
use ndarray::{Array3, ArrayView3, s};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct TileGrid {
    tiles_y: usize,
    tiles_x: usize,
    tile_shape: Option<(usize, usize, usize)>,
    data: Vec<f32>,
    filled: Vec<bool>,
}

impl TileGrid {
    /// Empty grid; storage is allocated when the first tile is inserted.
    pub fn with_shape(tiles_y: usize, tiles_x: usize) -> Self {
        Self {
            tiles_y,
            tiles_x,
            tile_shape: None,
            data: Vec::new(),
            filled: vec![false; tiles_y * tiles_x],
        }
    }

    /// Cut `image` (rows, cols, channels) into `tile_size` squares.
    /// Both image sides must be non-zero exact multiples of `tile_size`.
    pub fn split(image: &ArrayView3<f32>, tile_size: usize) -> Result<Self> {
        let (height, width, channels) = image.dim();
        if height == 0 || width == 0 || channels == 0 {
            return Err(Error::InvalidArgument {
                arg: "image",
                value: format!("empty {}x{}x{} image", height, width, channels),
            });
        }
        if tile_size == 0 || height % tile_size != 0 || width % tile_size != 0 {
            return Err(Error::TileDivision {
                height,
                width,
                tile_size,
            });
        }
        let tiles_y = height / tile_size;
        let tiles_x = width / tile_size;
        debug!(
            "Splitting {}x{}x{} image into {}x{} tiles of {}",
            height, width, channels, tiles_y, tiles_x, tile_size
        );

        let mut grid = Self::with_shape(tiles_y, tiles_x);
        for row in 0..tiles_y {
            for col in 0..tiles_x {
                let y = row * tile_size;
                let x = col * tile_size;
                grid.insert(
                    row,
                    col,
                    &image.slice(s![y..y + tile_size, x..x + tile_size, ..]),
                )?;
            }
        }
        Ok(grid)
    }

    pub fn tiles_y(&self) -> usize {
        self.tiles_y
    }

    pub fn tiles_x(&self) -> usize {
        self.tiles_x
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.filled.iter().filter(|&&f| f).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complete(&self) -> bool {
        !self.filled.is_empty() && self.filled.iter().all(|&f| f)
    }

    fn tile_len(&self) -> usize {
        self.tile_shape.map(|(h, w, c)| h * w * c).unwrap_or(0)
    }

    fn slot(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.tiles_y || col >= self.tiles_x {
            return Err(Error::TileOutOfGrid {
                row,
                col,
                tiles_y: self.tiles_y,
                tiles_x: self.tiles_x,
            });
        }
        Ok(row * self.tiles_x + col)
    }

    /// Store `tile` at `(row, col)`, replacing any previous occupant.
    pub fn insert(&mut self, row: usize, col: usize, tile: &ArrayView3<f32>) -> Result<()> {
        let slot = self.slot(row, col)?;
        let found = tile.dim();
        match self.tile_shape {
            None => {
                self.tile_shape = Some(found);
                self.data = vec![0.0; self.filled.len() * found.0 * found.1 * found.2];
            }
            Some(expected) if expected != found => {
                return Err(Error::TileShapeMismatch {
                    row,
                    col,
                    expected,
                    found,
                });
            }
            Some(_) => {}
        }

        let len = self.tile_len();
        let dst = &mut self.data[slot * len..(slot + 1) * len];
        // Iteration follows logical (row-major) order even for strided views.
        for (d, v) in dst.iter_mut().zip(tile.iter()) {
            *d = *v;
        }
        self.filled[slot] = true;
        Ok(())
    }

    /// View of the tile at `(row, col)`, if populated.
    pub fn tile(&self, row: usize, col: usize) -> Option<ArrayView3<'_, f32>> {
        let slot = self.slot(row, col).ok()?;
        if !self.filled[slot] {
            return None;
        }
        let shape = self.tile_shape?;
        let len = self.tile_len();
        ArrayView3::from_shape(shape, &self.data[slot * len..(slot + 1) * len]).ok()
    }

    /// Populated tiles with their `(row, col)`, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), ArrayView3<'_, f32>)> + '_ {
        (0..self.tiles_y)
            .flat_map(move |row| (0..self.tiles_x).map(move |col| (row, col)))
            .filter_map(move |(row, col)| self.tile(row, col).map(|t| ((row, col), t)))
    }

    /// Place every tile at `(row * tile_h, col * tile_w)` in a fresh image of
    /// `(tiles_y * tile_h, tiles_x * tile_w, channels)`. Exact placement, no blending.
    pub fn reconstruct(&self) -> Result<Array3<f32>> {
        let (th, tw, channels) = match self.tile_shape {
            Some(shape) => shape,
            None => return Err(Error::MissingTile { row: 0, col: 0 }),
        };
        let mut out = Array3::<f32>::zeros((self.tiles_y * th, self.tiles_x * tw, channels));
        for row in 0..self.tiles_y {
            for col in 0..self.tiles_x {
                let tile = self
                    .tile(row, col)
                    .ok_or(Error::MissingTile { row, col })?;
                let y = row * th;
                let x = col * tw;
                out.slice_mut(s![y..y + th, x..x + tw, ..]).assign(&tile);
            }
        }
        debug!(
            "Reconstructed {}x{} tiles into {}x{}x{}",
            self.tiles_y,
            self.tiles_x,
            out.dim().0,
            out.dim().1,
            channels
        );
        Ok(out)
    }
}
