// SPDX-License-Identifier: MPL-2.0

//! Image filters for captured photos
//!
//! Filters take a decoded image and produce a new image, or nothing when
//! the input or parameters are unusable. A [`RenderContext`] turns the
//! filter output into a displayable RGB image for the photo library.

use crate::constants::crystallize;
use crate::errors::PhotoError;
use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use tracing::debug;

/// A named single-pass image filter
pub trait ImageFilter: Send + Sync {
    /// Filter name used in logs and errors
    fn name(&self) -> &'static str;

    /// Run the filter once with the given radius parameter
    ///
    /// Returns `None` when the filter produces no output.
    fn apply(&self, input: &DynamicImage, radius: f32) -> Option<DynamicImage>;
}

/// Crystallize filter
///
/// Partitions the image into polygonal cells around jittered grid sites
/// (one site per `radius`×`radius` block) and fills each cell with the
/// color of the source pixel at its site.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrystallizeFilter;

impl CrystallizeFilter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageFilter for CrystallizeFilter {
    fn name(&self) -> &'static str {
        crystallize::NAME
    }

    fn apply(&self, input: &DynamicImage, radius: f32) -> Option<DynamicImage> {
        if !radius.is_finite() || radius < 1.0 {
            debug!(radius, "Crystallize radius out of range");
            return None;
        }

        let (width, height) = input.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let source = input.to_rgba8();
        let cells = CellGrid::new(width, height, radius);

        let colors: Vec<image::Rgba<u8>> = cells
            .sites
            .iter()
            .map(|&(x, y)| *source.get_pixel(x as u32, y as u32))
            .collect();

        let mut output = RgbaImage::new(width, height);
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            *pixel = colors[cells.nearest_site(x as f32 + 0.5, y as f32 + 0.5)];
        }

        Some(DynamicImage::ImageRgba8(output))
    }
}

/// Jittered grid of Voronoi sites
struct CellGrid {
    cell: f32,
    cols: i64,
    rows: i64,
    /// Row-major, one site per grid cell, already clamped inside the image
    sites: Vec<(f32, f32)>,
}

impl CellGrid {
    fn new(width: u32, height: u32, cell: f32) -> Self {
        let cols = (width as f32 / cell).ceil().max(1.0) as i64;
        let rows = (height as f32 / cell).ceil().max(1.0) as i64;
        let max_x = (width - 1) as f32;
        let max_y = (height - 1) as f32;

        let mut sites = Vec::with_capacity((cols * rows) as usize);
        for gy in 0..rows {
            for gx in 0..cols {
                let jx = hash01(gx, gy, 0x9e37);
                let jy = hash01(gx, gy, 0x7f4a);
                let x = ((gx as f32 + jx) * cell).min(max_x);
                let y = ((gy as f32 + jy) * cell).min(max_y);
                sites.push((x, y));
            }
        }

        Self {
            cell,
            cols,
            rows,
            sites,
        }
    }

    /// Index of the site closest to (x, y), searching the 3×3 neighbourhood
    fn nearest_site(&self, x: f32, y: f32) -> usize {
        let gx = (x / self.cell) as i64;
        let gy = (y / self.cell) as i64;

        let mut best = 0usize;
        let mut best_dist = f32::MAX;
        for ny in (gy - 1).max(0)..=(gy + 1).min(self.rows - 1) {
            for nx in (gx - 1).max(0)..=(gx + 1).min(self.cols - 1) {
                let index = (ny * self.cols + nx) as usize;
                let (sx, sy) = self.sites[index];
                let dist = (sx - x) * (sx - x) + (sy - y) * (sy - y);
                if dist < best_dist {
                    best_dist = dist;
                    best = index;
                }
            }
        }
        best
    }
}

/// Deterministic pseudo-random value in [0, 1) for a grid cell
fn hash01(x: i64, y: i64, seed: u64) -> f32 {
    let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ seed;
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    (h >> 40) as f32 / (1u64 << 24) as f32
}

/// Renders filter output into a displayable image
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext;

impl RenderContext {
    pub fn new() -> Self {
        Self
    }

    /// Render the full extent of `image` to 8-bit RGB
    pub fn render(&self, image: &DynamicImage) -> Result<RgbImage, PhotoError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PhotoError::RenderFailed(format!(
                "empty extent {}x{}",
                width, height
            )));
        }
        Ok(image.to_rgb8())
    }
}
