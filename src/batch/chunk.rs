//! Chunk sizing and splitting.
use super::InsertError;

/// Largest number of rows whose placeholders fit under `ceiling`.
///
/// # Errors
/// Errors with [`InsertError::InvalidPlaceholderCount`] when a row has no
/// placeholders or a single row alone would exceed the ceiling.
pub fn chunk_size(placeholders: usize, ceiling: usize) -> Result<usize, InsertError> {
    match ceiling.checked_div(placeholders) {
        Some(size) if size > 0 => Ok(size),
        _ => Err(InsertError::InvalidPlaceholderCount {
            placeholders,
            ceiling,
        }),
    }
}

/// Number of statements needed to insert `items` rows.
///
/// # Errors
/// Same as [`chunk_size`].
pub fn chunk_count(items: usize, placeholders: usize, ceiling: usize) -> Result<usize, InsertError> {
    Ok(items.div_ceil(chunk_size(placeholders, ceiling)?))
}

/// Split `items` into consecutive sub-slices of at most `size` elements.
/// Returns no sub-slices when `size` is zero.
#[must_use]
pub fn sub_slice<T>(items: &[T], size: usize) -> Vec<&[T]> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).collect()
}
