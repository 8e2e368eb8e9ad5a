//! Grid cell metrics and the custom-property contract.

use crate::snap::Size;

/// Custom property carrying the cell width in pixels.
pub const CELL_WIDTH_PROPERTY: &str = "--grid-cell-width";

/// Custom property carrying the cell height in pixels.
pub const CELL_HEIGHT_PROPERTY: &str = "--grid-cell-height";

/// Cell width in `rem`.
const CELL_WIDTH_REM: f64 = 0.5;

/// Cell height in `rem`.
const CELL_HEIGHT_REM: f64 = 1.0;

/// Cells per side of one repeating background pattern tile.
const PATTERN_CELLS: f64 = 8.0;

/// Background grid geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMetrics {
    /// Size of one grid cell.
    pub cell: Size,
    /// Size of one repeating pattern tile.
    pub pattern: Size,
}

impl GridMetrics {
    /// Derive metrics from the document root font size in pixels.
    #[must_use]
    pub fn from_root_font_size(root_font_size: f64) -> Self {
        let cell = Size::new(root_font_size * CELL_WIDTH_REM, root_font_size * CELL_HEIGHT_REM);
        Self {
            cell,
            pattern: Size::new(cell.width * PATTERN_CELLS, cell.height * PATTERN_CELLS),
        }
    }

    /// Custom properties the grid publishes on the document root.
    #[must_use]
    pub fn custom_properties(&self) -> [(&'static str, String); 2] {
        [
            (CELL_WIDTH_PROPERTY, format!("{}px", self.cell.width)),
            (CELL_HEIGHT_PROPERTY, format!("{}px", self.cell.height)),
        ]
    }

    /// Read a cell size back from published property values.
    ///
    /// Returns `None` while either value is missing, zero or unparseable.
    #[must_use]
    pub fn cell_from_properties(width: &str, height: &str) -> Option<Size> {
        Some(Size::new(parse_dimension(width)?, parse_dimension(height)?))
    }
}

/// Parse the leading number of a CSS length such as `"8px"`.
///
/// Leading whitespace is skipped and trailing units are ignored. Zero,
/// negative and non-finite values read as "not ready" and return `None`.
#[must_use]
pub fn parse_dimension(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();

    let parsed = trimmed
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .rev()
        .find_map(|end| trimmed[..end].parse::<f64>().ok())?;

    (parsed.is_finite() && parsed > 0.0).then_some(parsed)
}
