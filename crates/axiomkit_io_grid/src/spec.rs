//! Grid geometry models, scalar cell values and top-level error types.

use std::fmt;

use chrono::NaiveDateTime;

////////////////////////////////////////////////////////////////////////////////
// #region GeometrySpecification

/// Zero-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SpecCellIndex {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
}

/// Rectangular extent consumed by one write.
///
/// A write touching no cells has size `(0, 0)`; a single-cell write has size `(1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpecCellSize {
    /// Number of rows.
    pub height: usize,
    /// Number of columns.
    pub width: usize,
}

/// Rectangle actually occupied by a write; the only shape formatters receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpecCellRange {
    /// Top-left cell.
    pub index: SpecCellIndex,
    /// Extent starting at `index`.
    pub size: SpecCellSize,
}

impl SpecCellIndex {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Cell `A1`.
    pub const fn origin() -> Self {
        Self { row: 0, col: 0 }
    }

    /// Translate down by `size.height` rows.
    pub const fn down(self, size: SpecCellSize) -> Self {
        Self {
            row: self.row + size.height,
            col: self.col,
        }
    }

    /// Translate right by `size.width` columns.
    pub const fn right(self, size: SpecCellSize) -> Self {
        Self {
            row: self.row,
            col: self.col + size.width,
        }
    }

    /// Translate down and right by both components of `size`.
    pub const fn offset(self, size: SpecCellSize) -> Self {
        Self {
            row: self.row + size.height,
            col: self.col + size.width,
        }
    }
}

impl fmt::Display for SpecCellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", derive_column_letters(self.col), self.row + 1)
    }
}

impl SpecCellSize {
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Size of a write that touched nothing.
    pub const fn empty() -> Self {
        Self {
            height: 0,
            width: 0,
        }
    }

    /// Size of a single-cell write.
    pub const fn one() -> Self {
        Self {
            height: 1,
            width: 1,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// Component-wise minimum.
    pub fn min(self, other: SpecCellSize) -> Self {
        Self {
            height: usize::min(self.height, other.height),
            width: usize::min(self.width, other.width),
        }
    }

    /// Component-wise sum.
    pub const fn add(self, other: SpecCellSize) -> Self {
        Self {
            height: self.height + other.height,
            width: self.width + other.width,
        }
    }

    /// Stack `other` below `self`: heights add, the wider block decides the width.
    pub fn add_height_max_width(self, other: SpecCellSize) -> Self {
        Self {
            height: self.height + other.height,
            width: usize::max(self.width, other.width),
        }
    }

    /// Place `other` right of `self`: widths add, the taller block decides the height.
    pub fn add_width_max_height(self, other: SpecCellSize) -> Self {
        Self {
            height: usize::max(self.height, other.height),
            width: self.width + other.width,
        }
    }

    /// Add `other.height`; `other.width` is ignored.
    pub const fn add_height(self, other: SpecCellSize) -> Self {
        Self {
            height: self.height + other.height,
            width: self.width,
        }
    }

    /// Add `other.width`; `other.height` is ignored.
    pub const fn add_width(self, other: SpecCellSize) -> Self {
        Self {
            height: self.height,
            width: self.width + other.width,
        }
    }
}

impl fmt::Display for SpecCellSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

impl SpecCellRange {
    pub const fn new(index: SpecCellIndex, size: SpecCellSize) -> Self {
        Self { index, size }
    }

    /// Bottom-right cell (inclusive), `None` for an empty range.
    pub fn last(&self) -> Option<SpecCellIndex> {
        if self.size.is_empty() {
            return None;
        }
        Some(SpecCellIndex::new(
            self.index.row + self.size.height - 1,
            self.index.col + self.size.width - 1,
        ))
    }

    pub fn contains(&self, index: SpecCellIndex) -> bool {
        index.row >= self.index.row
            && index.col >= self.index.col
            && index.row < self.index.row + self.size.height
            && index.col < self.index.col + self.size.width
    }

    /// Iterate cells row-major.
    pub fn iter_cells(&self) -> impl Iterator<Item = SpecCellIndex> + use<> {
        let SpecCellRange { index, size } = *self;
        (index.row..index.row + size.height).flat_map(move |n_row| {
            (index.col..index.col + size.width).map(move |n_col| SpecCellIndex::new(n_row, n_col))
        })
    }
}

impl fmt::Display for SpecCellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last() {
            Some(last) => write!(f, "{}:{}", self.index, last),
            None => write!(f, "{}:<empty>", self.index),
        }
    }
}

/// Convert a zero-based column number into spreadsheet letters (`0 -> A`, `26 -> AA`).
pub fn derive_column_letters(col: usize) -> String {
    let mut l_chars = Vec::new();
    let mut n_rest = col + 1;
    while n_rest > 0 {
        let n_digit = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_digit as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueSpecification

/// Scalar kinds a backing document must accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumValueKind {
    /// Text value.
    Text,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    LargeInteger,
    /// Floating-point number.
    Float,
    /// Calendar date/time.
    DateTime,
}

impl fmt::Display for EnumValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::LargeInteger => "large_integer",
            Self::Float => "float",
            Self::DateTime => "datetime",
        };
        f.write_str(c_name)
    }
}

/// Closed set of scalar values a cell writer can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Text value.
    Text(String),
    /// 32-bit integer value.
    Integer(i32),
    /// 64-bit integer value.
    LargeInteger(i64),
    /// Floating-point value.
    Float(f64),
    /// Date/time value without timezone.
    DateTime(NaiveDateTime),
}

impl EnumCellValue {
    pub fn kind(&self) -> EnumValueKind {
        match self {
            Self::Text(_) => EnumValueKind::Text,
            Self::Integer(_) => EnumValueKind::Integer,
            Self::LargeInteger(_) => EnumValueKind::LargeInteger,
            Self::Float(_) => EnumValueKind::Float,
            Self::DateTime(_) => EnumValueKind::DateTime,
        }
    }

    /// Numeric view of the value; `None` for text and date/time.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(val) => Some(f64::from(*val)),
            Self::LargeInteger(val) => Some(*val as f64),
            Self::Float(val) => Some(*val),
            Self::Text(_) | Self::DateTime(_) => None,
        }
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(val) => f.write_str(val),
            Self::Integer(val) => write!(f, "{val}"),
            Self::LargeInteger(val) => write!(f, "{val}"),
            Self::Float(val) => write!(f, "{val}"),
            Self::DateTime(val) => write!(f, "{}", val.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failures surfaced by writers, formatters and backing documents.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridWriteError {
    /// Value type outside the supported scalar kinds.
    #[error("Unsupported cell value kind: {kind}")]
    UnsupportedValueKind {
        /// Name of the offending type.
        kind: String,
    },
    /// Backing document cannot address this cell.
    #[error("Cell index out of bounds: {index}")]
    OutOfBounds {
        /// Rejected coordinate.
        index: SpecCellIndex,
    },
    /// Any other backing-store failure.
    #[error("Document write failed: {0}")]
    Document(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridWriteError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_arithmetic_rules() {
        let a = SpecCellSize::new(2, 3);
        let b = SpecCellSize::new(4, 1);

        assert_eq!(a.min(b), SpecCellSize::new(2, 1));
        assert_eq!(a.add(b), SpecCellSize::new(6, 4));
        assert_eq!(a.add_height_max_width(b), SpecCellSize::new(6, 3));
        assert_eq!(a.add_width_max_height(b), SpecCellSize::new(4, 4));
        assert_eq!(a.add_height(b), SpecCellSize::new(6, 3));
        assert_eq!(a.add_width(b), SpecCellSize::new(2, 4));
    }

    #[test]
    fn test_index_translation() {
        let idx = SpecCellIndex::new(1, 2);
        let size = SpecCellSize::new(3, 5);

        assert_eq!(idx.down(size), SpecCellIndex::new(4, 2));
        assert_eq!(idx.right(size), SpecCellIndex::new(1, 7));
        assert_eq!(idx.offset(size), SpecCellIndex::new(4, 7));
    }

    #[test]
    fn test_index_display_uses_a1_notation() {
        assert_eq!(SpecCellIndex::origin().to_string(), "A1");
        assert_eq!(SpecCellIndex::new(9, 25).to_string(), "Z10");
        assert_eq!(SpecCellIndex::new(0, 26).to_string(), "AA1");
        assert_eq!(SpecCellIndex::new(0, 701).to_string(), "ZZ1");
        assert_eq!(SpecCellIndex::new(0, 702).to_string(), "AAA1");
    }

    #[test]
    fn test_range_bounds_and_iteration() {
        let range = SpecCellRange::new(SpecCellIndex::new(1, 1), SpecCellSize::new(2, 2));

        assert_eq!(range.last(), Some(SpecCellIndex::new(2, 2)));
        assert!(range.contains(SpecCellIndex::new(2, 1)));
        assert!(!range.contains(SpecCellIndex::new(3, 1)));
        assert_eq!(
            range.iter_cells().collect::<Vec<_>>(),
            vec![
                SpecCellIndex::new(1, 1),
                SpecCellIndex::new(1, 2),
                SpecCellIndex::new(2, 1),
                SpecCellIndex::new(2, 2),
            ]
        );
        assert_eq!(range.to_string(), "B2:C3");

        let range_empty = SpecCellRange::new(SpecCellIndex::origin(), SpecCellSize::empty());
        assert_eq!(range_empty.last(), None);
        assert_eq!(range_empty.iter_cells().count(), 0);
    }
}
