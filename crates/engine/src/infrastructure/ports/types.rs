//! Result types returned across port boundaries.

use farmstead_domain::TileCoord;

/// Outcome of one unordered bulk tile write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkTileResult {
    /// Number of tile updates the store reported as modifying the document.
    pub modified_count: u64,
    /// Coordinates whose conditional update matched and modified.
    pub applied: Vec<TileCoord>,
}
