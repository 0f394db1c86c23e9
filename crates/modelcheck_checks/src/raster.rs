//! Raster checks.
//!
//! Raster files are inspected through a [`RasterInterface`] supplied by the
//! caller; this crate does not read rasters itself.

use crate::{Check, CheckBase};
use modelcheck_core::{Predicate, Record, Store, StoreResult};
use std::fmt;
use std::sync::Arc;

/// Read access to raster file metadata.
///
/// Methods returning `Option` yield `None` when the file cannot be read.
pub trait RasterInterface: Send + Sync + fmt::Debug {
    /// Returns true if the file exists and is a readable raster.
    fn is_valid(&self, path: &str) -> bool;

    /// Number of bands.
    fn band_count(&self, path: &str) -> Option<usize>;

    /// Returns true if the raster uses a geographic coordinate system.
    fn is_geographic(&self, path: &str) -> Option<bool>;

    /// Pixel width and height in CRS units.
    fn pixel_size(&self, path: &str) -> Option<(f64, f64)>;

    /// Minimum and maximum value of the first band.
    fn min_max(&self, path: &str) -> Option<(f64, f64)>;
}

/// Rule applied by a [`RasterCheck`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RasterRule {
    /// The file must exist and be a readable raster
    Valid,
    /// The raster must have exactly one band
    SingleBand,
    /// The raster must use a projected coordinate system
    Projected,
    /// Pixels must be square
    SquarePixels,
    /// Values must lie within a plausible range
    ValueRange { min: f64, max: f64 },
}

/// A rule on the raster referenced by a text column.
#[derive(Debug, Clone)]
pub struct RasterCheck {
    base: CheckBase,
    raster: Arc<dyn RasterInterface>,
    rule: RasterRule,
}

impl RasterCheck {
    /// Creates a new raster check on a column holding file paths.
    pub fn new(base: CheckBase, raster: Arc<dyn RasterInterface>, rule: RasterRule) -> Self {
        Self { base, raster, rule }
    }

    fn violates(&self, path: &str) -> bool {
        if self.rule == RasterRule::Valid {
            return !self.raster.is_valid(path);
        }
        // unreadable rasters are reported by the validity rule
        if !self.raster.is_valid(path) {
            return false;
        }
        match self.rule {
            RasterRule::Valid => false,
            RasterRule::SingleBand => self.raster.band_count(path).is_some_and(|n| n != 1),
            RasterRule::Projected => self.raster.is_geographic(path).unwrap_or(false),
            RasterRule::SquarePixels => self
                .raster
                .pixel_size(path)
                .is_some_and(|(w, h)| w.abs() != h.abs()),
            RasterRule::ValueRange { min, max } => self
                .raster
                .min_max(path)
                .is_some_and(|(lo, hi)| lo < min || hi > max),
        }
    }
}

impl Check for RasterCheck {
    fn base(&self) -> &CheckBase {
        &self.base
    }

    fn default_description(&self) -> String {
        let column = &self.base.column;
        match self.rule {
            RasterRule::Valid => format!("The file in {column} is not a valid raster file"),
            RasterRule::SingleBand => format!("The raster in {column} has more than one band"),
            RasterRule::Projected => {
                format!("The raster in {column} does not use a projected coordinate system")
            }
            RasterRule::SquarePixels => format!("The raster in {column} has non-square pixels"),
            RasterRule::ValueRange { min, max } => format!(
                "The raster in {column} has values outside the plausible range [{min}, {max}]"
            ),
        }
    }

    fn evaluate(&self, store: &dyn Store) -> StoreResult<Vec<Record>> {
        let column = self.base.column_name();
        let rows = store.select(&self.base.to_check_where(Predicate::not_blank(column)))?;
        Ok(rows
            .into_iter()
            .filter(|r| r.text(column).is_some_and(|path| self.violates(path.trim())))
            .collect())
    }
}
