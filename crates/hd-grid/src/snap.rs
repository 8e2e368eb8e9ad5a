//! Snap-to-grid sizing.

/// Width and height in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both axes are usable as a grid cell.
    pub(crate) fn is_valid_cell(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Round `size` up to the next whole number of `cell`s on each axis.
///
/// Returns `None` when `cell` has a zero, negative, or non-finite axis, which
/// is how an unpublished grid reads.
#[must_use]
pub fn snap_size(size: Size, cell: Size) -> Option<Size> {
    if !cell.is_valid_cell() {
        return None;
    }

    let cells_wide = (size.width / cell.width).ceil();
    let cells_tall = (size.height / cell.height).ceil();

    Some(Size::new(cells_wide * cell.width, cells_tall * cell.height))
}
