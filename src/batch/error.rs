//! Errors returned by the batch insert engine.

/// Underlying failure reported by the store.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a batch insert stopped.
///
/// Every variant is terminal; nothing is retried. Store failures carry the
/// index of the chunk that failed and the number of rows `inserted` by the
/// chunks before it. With a self-managed context those rows are committed and
/// stay in the store, so a non-zero count means partial success (see
/// [`InsertError::is_partial`]). With a caller-supplied context they are still
/// pending in the caller's transaction.
#[derive(thiserror::Error, Debug)]
pub enum InsertError {
    /// The template does not contain exactly one `VALUES` marker.
    #[error("insert template must contain exactly one `VALUES` marker, found {markers}")]
    MalformedTemplate {
        /// Number of markers found.
        markers: usize,
    },

    /// A row needs no placeholders at all, or more than the ceiling allows.
    #[error("row pattern has {placeholders} placeholders but a row must bind between 1 and {ceiling} values")]
    InvalidPlaceholderCount {
        /// Placeholders in the row pattern.
        placeholders: usize,
        /// Bind-variable ceiling per statement.
        ceiling: usize,
    },

    /// The extractor returned the wrong number of values for an item.
    #[error("item {item} produced {values} bind values but the row pattern has {placeholders} placeholders")]
    ValueCountMismatch {
        /// Position of the item in the input.
        item: usize,
        /// Values the extractor returned.
        values: usize,
        /// Placeholders in the row pattern.
        placeholders: usize,
    },

    /// The store could not begin a transaction.
    #[error("chunk {chunk}: could not begin transaction ({inserted} rows already inserted): {source}")]
    Begin {
        /// Index of the failing chunk.
        chunk: usize,
        /// Rows written by earlier chunks.
        inserted: usize,
        /// Store failure.
        source: StoreError,
    },

    /// The store rejected the insert statement.
    #[error("chunk {chunk}: insert failed ({inserted} rows already inserted): {source}")]
    Exec {
        /// Index of the failing chunk.
        chunk: usize,
        /// Rows written by earlier chunks.
        inserted: usize,
        /// Store failure.
        source: StoreError,
    },

    /// The store could not commit the chunk's transaction.
    #[error("chunk {chunk}: commit failed ({inserted} rows already inserted): {source}")]
    Commit {
        /// Index of the failing chunk.
        chunk: usize,
        /// Rows written by earlier chunks.
        inserted: usize,
        /// Store failure.
        source: StoreError,
    },

    /// The statement wrote a different number of rows than it carried, so
    /// generated ids cannot be mapped back to items.
    #[error("chunk {chunk}: expected {expected} rows to be inserted but the store reported {actual} ({inserted} rows already inserted)")]
    RowCountMismatch {
        /// Index of the failing chunk.
        chunk: usize,
        /// Rows written by earlier chunks.
        inserted: usize,
        /// Rows in the statement.
        expected: usize,
        /// Rows the store reported.
        actual: u64,
    },

    /// A reconstructed id does not fit the requested identifier type. The
    /// chunk itself has already been written, so unlike the other variants
    /// `inserted` includes its rows.
    #[error("chunk {chunk}: generated id {first} + {offset} does not fit the identifier type ({inserted} rows already inserted)")]
    IdOutOfRange {
        /// Index of the failing chunk.
        chunk: usize,
        /// Rows written up to and including the failing chunk.
        inserted: usize,
        /// First generated id of the chunk.
        first: i64,
        /// Offset of the row within the chunk.
        offset: u64,
    },
}

impl InsertError {
    /// Index of the chunk that failed, for failures that happened while
    /// talking to the store.
    #[must_use]
    pub fn chunk(&self) -> Option<usize> {
        match *self {
            Self::Begin { chunk, .. }
            | Self::Exec { chunk, .. }
            | Self::Commit { chunk, .. }
            | Self::RowCountMismatch { chunk, .. }
            | Self::IdOutOfRange { chunk, .. } => Some(chunk),
            Self::MalformedTemplate { .. }
            | Self::InvalidPlaceholderCount { .. }
            | Self::ValueCountMismatch { .. } => None,
        }
    }

    /// Rows written by chunks that completed before the failure.
    #[must_use]
    pub fn inserted(&self) -> usize {
        match *self {
            Self::Begin { inserted, .. }
            | Self::Exec { inserted, .. }
            | Self::Commit { inserted, .. }
            | Self::RowCountMismatch { inserted, .. }
            | Self::IdOutOfRange { inserted, .. } => inserted,
            Self::MalformedTemplate { .. }
            | Self::InvalidPlaceholderCount { .. }
            | Self::ValueCountMismatch { .. } => 0,
        }
    }

    /// Whether earlier chunks were written before the call failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.inserted() > 0
    }
}
