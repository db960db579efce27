//! Keyset seek condition

use crate::query::{QueryError, SortInstruction};
use crate::shape::{Column, SortOrder};
use crate::store::{Comparison, Predicate};

use super::CursorValues;

/// Condition selecting rows strictly after the cursor position
///
/// For sort terms `s1..sn` with cursor values `v1..vn` this is the
/// disjunction over each level `i` of
/// `s1 = v1 AND .. AND s(i-1) = v(i-1) AND si op vi`, where `op` is `>` for
/// ascending terms and `<` for descending ones. Rows tied with the cursor on
/// every term are excluded, so the last term must be unique per row for
/// pages to neither skip nor repeat rows.
///
/// Returns `None` when `sorting` is empty.
///
/// # Errors
///
/// [`QueryErrorKind::CursorMismatch`](crate::query::QueryErrorKind::CursorMismatch)
/// when the cursor lacks the key or any sort field, which happens when the
/// client changes its sort between pages.
///
/// # Example
///
/// ```rust
/// use pagewise::cursor::{seek_predicate, CursorValues};
/// use pagewise::query::SortInstruction;
/// use pagewise::shape::{Column, SortOrder};
/// use pagewise::Value;
///
/// let sorting = [
///     SortInstruction::new(Column::new("score"), "score", SortOrder::Desc),
///     SortInstruction::by_column(Column::new("id"), SortOrder::Asc),
/// ];
/// let mut values = CursorValues::new();
/// values.insert("score".to_string(), Value::Integer(10));
/// values.insert("id".to_string(), Value::Integer(7));
///
/// let predicate = seek_predicate(&sorting, &values, &Column::new("id"), "cursor")
///     .unwrap()
///     .unwrap();
/// assert_eq!(predicate.to_string(), "(score < 10 OR (score = 10 AND id > 7))");
/// ```
pub fn seek_predicate(
    sorting: &[SortInstruction],
    values: &CursorValues,
    key: &Column,
    parameter: &str,
) -> Result<Option<Predicate>, QueryError> {
    if sorting.is_empty() {
        return Ok(None);
    }

    let key_field = sorting
        .iter()
        .find(|term| term.column.name() == key.name())
        .map_or(key.name(), SortInstruction::cursor_field);
    if !values.contains_key(key_field) {
        return Err(QueryError::cursor_mismatch(parameter, key_field));
    }

    let resolved = sorting
        .iter()
        .map(|term| {
            values
                .get(term.cursor_field())
                .map(|value| (term, value))
                .ok_or_else(|| QueryError::cursor_mismatch(parameter, term.cursor_field()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let levels = (0..resolved.len())
        .map(|level| {
            let mut terms: Vec<Predicate> = resolved[..level]
                .iter()
                .map(|(term, value)| {
                    Predicate::compare(term.column.clone(), Comparison::Eq, (*value).clone())
                })
                .collect();

            let (term, value) = resolved[level];
            let op = match term.order {
                SortOrder::Asc => Comparison::Gt,
                SortOrder::Desc => Comparison::Lt,
            };
            terms.push(Predicate::compare(term.column.clone(), op, value.clone()));
            Predicate::and(terms)
        })
        .collect();

    Ok(Some(Predicate::or(levels)))
}
