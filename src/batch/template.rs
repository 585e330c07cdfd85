//! Parsing of `INSERT ... VALUES (?, ?)` templates.
use super::InsertError;

/// Marker separating the statement head from the row pattern. Case sensitive.
pub const VALUES_MARKER: &str = "VALUES";

/// An insert statement split around its `VALUES` marker.
///
/// ```
/// use sqlbatch::batch::template::Template;
///
/// let template = Template::parse("INSERT INTO t (a, b) VALUES (?, ?)").unwrap();
/// assert_eq!(template.placeholders(), 2);
/// assert_eq!(
///     template.statement(2),
///     "INSERT INTO t (a, b) VALUES (?, ?), (?, ?)"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template<'a> {
    /// Everything before the marker.
    head: &'a str,
    /// The tuple repeated once per row.
    row_pattern: &'a str,
    /// `?` count in `row_pattern`.
    placeholders: usize,
}

impl<'a> Template<'a> {
    /// Split `template` into its head and row pattern.
    ///
    /// Whitespace around the row pattern and a trailing `;` are dropped so the
    /// pattern can be repeated.
    ///
    /// # Errors
    /// Errors with [`InsertError::MalformedTemplate`] unless `VALUES` occurs
    /// exactly once.
    pub fn parse(template: &'a str) -> Result<Self, InsertError> {
        let Some((head, rest)) = template.split_once(VALUES_MARKER) else {
            return Err(InsertError::MalformedTemplate { markers: 0 });
        };
        if rest.contains(VALUES_MARKER) {
            return Err(InsertError::MalformedTemplate {
                markers: template.matches(VALUES_MARKER).count(),
            });
        }
        let row_pattern = rest.trim().trim_end_matches(';').trim_end();
        Ok(Self {
            head: head.trim_end(),
            row_pattern,
            placeholders: row_pattern.matches('?').count(),
        })
    }

    /// Number of bind values one row takes.
    #[must_use]
    pub const fn placeholders(&self) -> usize {
        self.placeholders
    }

    /// The tuple repeated once per row, e.g. `(?, ?)`.
    #[must_use]
    pub const fn row_pattern(&self) -> &'a str {
        self.row_pattern
    }

    /// Statement inserting `rows` rows: the head, the marker, then the row
    /// pattern repeated `rows` times and joined by `, `.
    #[must_use]
    pub fn statement(&self, rows: usize) -> String {
        let rows = vec![self.row_pattern; rows].join(", ");
        format!("{} {VALUES_MARKER} {rows}", self.head)
    }
}
