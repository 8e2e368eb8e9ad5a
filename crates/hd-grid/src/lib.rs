//! Grid helpers for the Hyperdeck decorative widgets.
//!
//! The background grid publishes its cell size as two CSS custom properties
//! (`--grid-cell-width`, `--grid-cell-height`). Consumers such as the
//! snap-to-grid layout helper poll those values until they are readable,
//! then round element sizes up to whole cells.
//!
//! - [`GridMetrics`]: cell and pattern size derived from the root font size
//! - [`snap_size`]: round a size up to the next grid boundary
//! - [`RetryPolicy`]: bounded readiness polling with an explicit give-up state

mod metrics;
mod retry;
mod snap;

pub use metrics::{CELL_HEIGHT_PROPERTY, CELL_WIDTH_PROPERTY, GridMetrics, parse_dimension};
pub use retry::{RetryOutcome, RetryPolicy};
pub use snap::{Size, snap_size};
