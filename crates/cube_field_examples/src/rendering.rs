use std::path::Path;

use cube_field::prelude::*;
use image::{Rgb, RgbImage};
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Color mapping for rendering one slice of a field.
#[derive(Clone, Debug)]
pub struct SliceRenderConfig {
    /// Pixels per grid point along each axis.
    pub scale: u32,
    /// Value range mapped onto the color ramp. Defaults to the finite range of the field.
    pub range: Option<(f64, f64)>,
    pub low_color: [u8; 3],
    pub high_color: [u8; 3],
    /// Color for infinite and NaN values.
    pub non_finite_color: [u8; 3],
}

impl Default for SliceRenderConfig {
    fn default() -> Self {
        Self {
            scale: 4,
            range: None,
            low_color: [20, 20, 60],
            high_color: [250, 230, 120],
            non_finite_color: [0, 0, 0],
        }
    }
}

impl SliceRenderConfig {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn with_colors(mut self, low: [u8; 3], high: [u8; 3]) -> Self {
        self.low_color = low;
        self.high_color = high;
        self
    }

    fn color(&self, value: f64, min: f64, max: f64) -> Rgb<u8> {
        if !value.is_finite() {
            return Rgb(self.non_finite_color);
        }
        let t = if max > min {
            ((value - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb([
            mix(self.low_color[0], self.high_color[0]),
            mix(self.low_color[1], self.high_color[1]),
            mix(self.low_color[2], self.high_color[2]),
        ])
    }
}

/// Renders the plane at third-axis index `k` of `field` to a PNG.
///
/// The first grid axis runs left to right, the second bottom to top.
pub fn render_slice_to_png(
    field: &Field<f64>,
    k: usize,
    cfg: &SliceRenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let [nx, ny, nz] = field.mesh().shape();
    anyhow::ensure!(k < nz, "slice index {} out of range (nz = {})", k, nz);

    let (min, max) = match cfg.range {
        Some(range) => range,
        None => field.finite_range().unwrap_or((0.0, 1.0)),
    };

    let scale = cfg.scale.max(1);
    let width = nx as u32 * scale;
    let height = ny as u32 * scale;
    let mut img = RgbImage::new(width, height);

    for i in 0..nx {
        for j in 0..ny {
            let value = field.get(i, j, k).copied().unwrap_or(f64::NAN);
            let color = cfg.color(value, min, max);
            let px = i as u32 * scale;
            let py = height - (j as u32 + 1) * scale;
            for dx in 0..scale {
                for dy in 0..scale {
                    img.put_pixel(px + dx, py + dy, color);
                }
            }
        }
    }

    img.save(path.as_ref())?;
    tracing::info!(
        "Rendered slice k={} ({}x{}) to '{}'.",
        k,
        width,
        height,
        path.as_ref().display()
    );
    Ok(())
}
