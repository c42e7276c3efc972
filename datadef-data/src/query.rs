//! Backend-neutral queries over physical columns.
//!
//! [`RecordQuery::from_criteria`] translates caller-side
//! [`SearchCriteria`] (field names, typed values) into a [`RecordQuery`]
//! (column names, checked values, soft-delete filter, deterministic order).
//! SQL backends render it with [`crate::sql::QueryBuilder`]; other backends
//! evaluate it with [`RecordQuery::matches`] and [`RecordQuery::compare`].

use std::cmp::Ordering;
use std::sync::Arc;

use datadef_core::{DataError, DataResult, EntityId, FieldValue};

use crate::accessor::{FieldAccessTable, FieldAccessor};
use crate::criteria::{Restriction, SearchCriteria};
use crate::filter;
use crate::record::{RecordType, StoredRecord};

/// A predicate on one physical column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, FieldValue),
    NotEq(String, FieldValue),
    Gt(String, FieldValue),
    Ge(String, FieldValue),
    Lt(String, FieldValue),
    Le(String, FieldValue),
    Like(String, String),
    In(String, Vec<FieldValue>),
    IsNull(String),
    IsNotNull(String),
    /// The column is `NULL` or false.
    NotFlagged(String),
}

impl Condition {
    /// Evaluate against a stored record with SQL semantics: comparisons
    /// involving `NULL` or incompatible types are false.
    pub fn matches(&self, record: &StoredRecord, record_type: &RecordType) -> bool {
        let value = |col: &str| -> FieldValue {
            let raw = record.get(col).cloned().unwrap_or(FieldValue::Null);
            match record_type.column_type_of(col) {
                Some(ty) => ty.coerce(raw),
                None => raw,
            }
        };
        let cmp = |col: &str, expected: &FieldValue| value(col).compare(expected);
        match self {
            Condition::Eq(col, v) => cmp(col, v) == Some(Ordering::Equal),
            Condition::NotEq(col, v) => matches!(cmp(col, v), Some(o) if o != Ordering::Equal),
            Condition::Gt(col, v) => cmp(col, v) == Some(Ordering::Greater),
            Condition::Ge(col, v) => matches!(cmp(col, v), Some(Ordering::Greater | Ordering::Equal)),
            Condition::Lt(col, v) => cmp(col, v) == Some(Ordering::Less),
            Condition::Le(col, v) => matches!(cmp(col, v), Some(Ordering::Less | Ordering::Equal)),
            Condition::Like(col, pattern) => match value(col).as_str() {
                Some(text) => like(pattern, text),
                None => false,
            },
            Condition::In(col, values) => {
                let actual = value(col);
                values
                    .iter()
                    .any(|v| actual.compare(v) == Some(Ordering::Equal))
            }
            Condition::IsNull(col) => value(col).is_null(),
            Condition::IsNotNull(col) => !value(col).is_null(),
            Condition::NotFlagged(col) => !filter::is_flagged(record.get(col)),
        }
    }
}

/// A query over the live records of one record type.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    record_type: Arc<RecordType>,
    conditions: Vec<Condition>,
    order: Vec<(String, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl RecordQuery {
    /// All live records, unordered and unpaged.
    pub fn live(record_type: Arc<RecordType>) -> Self {
        let live = filter::live_condition(&record_type);
        Self {
            record_type,
            conditions: vec![live],
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// The live record with the given id.
    pub fn by_id(record_type: Arc<RecordType>, id: EntityId) -> Self {
        let id_column = record_type.id_column().to_string();
        Self::live(record_type)
            .filter(Condition::Eq(id_column, FieldValue::Integer(id.get())))
            .limit(1)
    }

    /// Translate search criteria through the field access table.
    ///
    /// Restriction values are coerced by column type and checked against the
    /// field type. Results are ordered by the requested fields and then by
    /// id, so paging is stable.
    ///
    /// # Errors
    ///
    /// [`DataError::UnknownField`] for names outside the definition,
    /// [`DataError::TypeMismatch`] for mistyped values,
    /// [`DataError::InvalidCriteria`] for `NULL` comparison values, an empty
    /// `In` list or `Like` on a non-textual field.
    pub fn from_criteria(
        table: &FieldAccessTable<'_>,
        record_type: Arc<RecordType>,
        criteria: &SearchCriteria,
    ) -> DataResult<Self> {
        let mut query = Self::live(record_type);
        for restriction in criteria.restrictions() {
            let accessor = table.accessor(restriction.field())?;
            query = query.filter(translate(accessor, restriction)?);
        }
        for order in criteria.orders() {
            let accessor = table.accessor(&order.field)?;
            query = query.order_by(accessor.column(), order.ascending);
        }
        let id_column = query.record_type.id_column().to_string();
        query = query.order_by(id_column, true).limit(criteria.max_results());
        if criteria.first_result() > 0 {
            query = query.offset(criteria.first_result());
        }
        Ok(query)
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order.push((column.into(), ascending));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn order(&self) -> &[(String, bool)] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Whether a stored record satisfies every condition.
    pub fn matches(&self, record: &StoredRecord) -> bool {
        self.conditions
            .iter()
            .all(|c| c.matches(record, &self.record_type))
    }

    /// Order two records by the query's sort keys. `NULL` sorts first in
    /// ascending order.
    pub fn compare(&self, a: &StoredRecord, b: &StoredRecord) -> Ordering {
        for (column, ascending) in &self.order {
            let ty = self.record_type.column_type_of(column);
            let read = |r: &StoredRecord| {
                let raw = r.get(column).cloned().unwrap_or(FieldValue::Null);
                match ty {
                    Some(t) => t.coerce(raw),
                    None => raw,
                }
            };
            let (left, right) = (read(a), read(b));
            let ord = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => left.compare(&right).unwrap_or(Ordering::Equal),
            };
            let ord = if *ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn translate(accessor: &FieldAccessor<'_>, restriction: &Restriction) -> DataResult<Condition> {
    let column = accessor.column().to_string();
    let checked = |value: &FieldValue| -> DataResult<FieldValue> {
        if value.is_null() {
            return Err(DataError::InvalidCriteria(format!(
                "null comparison on {}; use is_null",
                accessor.field().name()
            )));
        }
        let value = accessor.column_type().coerce(value.clone());
        accessor.check(&value)?;
        Ok(value)
    };
    Ok(match restriction {
        Restriction::Eq { value, .. } => Condition::Eq(column, checked(value)?),
        Restriction::Ne { value, .. } => Condition::NotEq(column, checked(value)?),
        Restriction::Gt { value, .. } => Condition::Gt(column, checked(value)?),
        Restriction::Ge { value, .. } => Condition::Ge(column, checked(value)?),
        Restriction::Lt { value, .. } => Condition::Lt(column, checked(value)?),
        Restriction::Le { value, .. } => Condition::Le(column, checked(value)?),
        Restriction::Like { pattern, .. } => {
            if !accessor.field().field_type().is_textual() {
                return Err(DataError::InvalidCriteria(format!(
                    "like on non-textual field {}",
                    accessor.field().name()
                )));
            }
            Condition::Like(column, pattern.clone())
        }
        Restriction::In { values, .. } => {
            if values.is_empty() {
                return Err(DataError::InvalidCriteria(format!(
                    "empty in-list for {}",
                    accessor.field().name()
                )));
            }
            let values = values.iter().map(checked).collect::<DataResult<Vec<_>>>()?;
            Condition::In(column, values)
        }
        Restriction::IsNull { .. } => Condition::IsNull(column),
        Restriction::IsNotNull { .. } => Condition::IsNotNull(column),
    })
}

/// SQL `LIKE`: `%` matches any run, `_` one character, ASCII letters
/// compare case-insensitively.
fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    // matched[j]: pattern[..i] matches text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;
    for p in &pattern {
        let mut next = vec![false; text.len() + 1];
        match p {
            '%' => {
                let mut any = false;
                for j in 0..=text.len() {
                    any |= matched[j];
                    next[j] = any;
                }
            }
            _ => {
                for j in 1..=text.len() {
                    let c = text[j - 1];
                    next[j] = matched[j - 1] && (*p == '_' || p.eq_ignore_ascii_case(&c));
                }
            }
        }
        matched = next;
    }
    matched[text.len()]
}
