//! Identifier widths the engine can hand back.
use std::fmt::Debug;

/// An integer type generated ids are reported in.
///
/// Stores report the first id of a statement as `i64`. The engine adds each
/// row's offset and converts the sum into `Self`, failing instead of wrapping
/// when it does not fit. Implemented for `i32`, `i64`, `u32` and `u64`, so the
/// width can follow the table's identity column.
pub trait GeneratedId: Copy + Debug + Send + Sync + 'static {
    /// `first + offset` as `Self`, or `None` if it does not fit.
    fn from_generated(first: i64, offset: u64) -> Option<Self>;
}

/// `GeneratedId` by way of a lossless `i128` sum.
macro_rules! impl_generated_id {
    ($($int:ty),*) => {
        $(
            impl GeneratedId for $int {
                fn from_generated(first: i64, offset: u64) -> Option<Self> {
                    Self::try_from(i128::from(first) + i128::from(offset)).ok()
                }
            }
        )*
    };
}

impl_generated_id!(i32, i64, u32, u64);
