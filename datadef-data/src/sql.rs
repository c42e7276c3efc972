//! SQL generation for [`RecordQuery`] and record mutations.
//!
//! Every identifier is validated, and quoted by default, before it reaches
//! the statement; values are never inlined and travel as bind parameters.
//!
//! # Example
//!
//! ```ignore
//! let query = RecordQuery::live(record_type)
//!     .filter(Condition::Eq("state".into(), "01pending".into()))
//!     .order_by("id", true)
//!     .limit(10);
//! let stmt = QueryBuilder::new(Dialect::Sqlite).select(&query)?;
//! // SELECT "id", "state", ... FROM "orders"
//! //   WHERE ("deleted" IS NULL OR "deleted" = 0) AND "state" = ? ORDER BY "id" ASC LIMIT 10
//! ```
use datadef_core::{DataError, DataResult, EntityId, FieldValue};

use crate::query::{Condition, RecordQuery};
use crate::record::{RecordType, StoredRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders.
    Generic,
    /// SQLite-style `?` placeholders; booleans are stored as 0/1.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }

    fn false_literal(self) -> &'static str {
        match self {
            Dialect::Sqlite | Dialect::MySql => "0",
            Dialect::Generic | Dialect::Postgres => "FALSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierPolicy {
    /// Validate identifiers and emit them as written.
    Validate,
    /// Validate identifiers and quote them in the dialect's style.
    Quote,
}

/// A statement ready for a driver: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            identifier_policy: IdentifierPolicy::Quote,
        }
    }

    /// Configure identifier quoting.
    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// `SELECT` every column of the record type, with the query's
    /// conditions, ordering and paging.
    pub fn select(&self, query: &RecordQuery) -> DataResult<SqlStatement> {
        let record_type = query.record_type();
        let columns = record_type
            .select_columns()
            .into_iter()
            .map(|c| self.ident(c, "column"))
            .collect::<DataResult<Vec<_>>>()?;
        let mut stmt = Statement::new(
            self.dialect,
            format!(
                "SELECT {} FROM {}",
                columns.join(", "),
                self.ident(record_type.table(), "table")?
            ),
        );
        self.append_where(&mut stmt, query.conditions())?;
        self.append_order(&mut stmt, query.order())?;
        self.append_limit_offset(&mut stmt, query.limit_value(), query.offset_value());
        Ok(stmt.finish())
    }

    /// `SELECT COUNT(*)` with the query's conditions; ordering and paging
    /// are ignored.
    pub fn count(&self, query: &RecordQuery) -> DataResult<SqlStatement> {
        let table = self.ident(query.record_type().table(), "table")?;
        let mut stmt = Statement::new(self.dialect, format!("SELECT COUNT(*) FROM {table}"));
        self.append_where(&mut stmt, query.conditions())?;
        Ok(stmt.finish())
    }

    /// `INSERT` a new live record. The deletion marker is always written as
    /// false; on Postgres the generated id is returned.
    pub fn insert(&self, record_type: &RecordType, values: &StoredRecord) -> DataResult<SqlStatement> {
        let table = self.ident(record_type.table(), "table")?;
        let mut stmt = Statement::new(self.dialect, String::new());
        let mut columns = Vec::with_capacity(values.len() + 1);
        let mut placeholders = Vec::with_capacity(values.len() + 1);
        for (column, value) in values.iter() {
            columns.push(self.ident(column, "column")?);
            placeholders.push(stmt.bind(value.clone()));
        }
        columns.push(self.ident(record_type.deleted_column(), "column")?);
        placeholders.push(stmt.bind(FieldValue::Boolean(false)));

        stmt.sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        if self.dialect == Dialect::Postgres {
            stmt.sql.push_str(&format!(
                " RETURNING {}",
                self.ident(record_type.id_column(), "column")?
            ));
        }
        Ok(stmt.finish())
    }

    /// `UPDATE` the given columns of one live record.
    ///
    /// # Errors
    ///
    /// [`DataError::InvalidCriteria`] when `values` is empty.
    pub fn update(
        &self,
        record_type: &RecordType,
        id: EntityId,
        values: &StoredRecord,
    ) -> DataResult<SqlStatement> {
        if values.is_empty() {
            return Err(DataError::InvalidCriteria(format!(
                "update of {} without columns",
                record_type.name()
            )));
        }
        let table = self.ident(record_type.table(), "table")?;
        let mut stmt = Statement::new(self.dialect, format!("UPDATE {table} SET "));
        let mut assignments = Vec::with_capacity(values.len());
        for (column, value) in values.iter() {
            let column = self.ident(column, "column")?;
            assignments.push(format!("{column} = {}", stmt.bind(value.clone())));
        }
        stmt.sql.push_str(&assignments.join(", "));
        self.append_where(&mut stmt, &live_by_id(record_type, id))?;
        Ok(stmt.finish())
    }

    /// Flip the deletion marker of one record, only while it is still live.
    pub fn mark_deleted(&self, record_type: &RecordType, id: EntityId) -> DataResult<SqlStatement> {
        let table = self.ident(record_type.table(), "table")?;
        let marker = self.ident(record_type.deleted_column(), "column")?;
        let mut stmt = Statement::new(self.dialect, format!("UPDATE {table} SET {marker} = "));
        let placeholder = stmt.bind(FieldValue::Boolean(true));
        stmt.sql.push_str(&placeholder);
        self.append_where(&mut stmt, &live_by_id(record_type, id))?;
        Ok(stmt.finish())
    }

    fn append_where(&self, stmt: &mut Statement, conditions: &[Condition]) -> DataResult<()> {
        if conditions.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(conditions.len());
        for cond in conditions {
            let clause = match cond {
                Condition::Eq(col, val) => self.binary(stmt, col, "=", val)?,
                Condition::NotEq(col, val) => self.binary(stmt, col, "!=", val)?,
                Condition::Gt(col, val) => self.binary(stmt, col, ">", val)?,
                Condition::Ge(col, val) => self.binary(stmt, col, ">=", val)?,
                Condition::Lt(col, val) => self.binary(stmt, col, "<", val)?,
                Condition::Le(col, val) => self.binary(stmt, col, "<=", val)?,
                Condition::Like(col, pattern) => {
                    let col = self.ident(col, "column")?;
                    let placeholder = stmt.bind(FieldValue::String(pattern.clone()));
                    format!("{col} LIKE {placeholder}")
                }
                Condition::In(col, vals) => {
                    let col = self.ident(col, "column")?;
                    let placeholders: Vec<_> = vals.iter().map(|v| stmt.bind(v.clone())).collect();
                    format!("{col} IN ({})", placeholders.join(", "))
                }
                Condition::IsNull(col) => format!("{} IS NULL", self.ident(col, "column")?),
                Condition::IsNotNull(col) => format!("{} IS NOT NULL", self.ident(col, "column")?),
                Condition::NotFlagged(col) => {
                    let col = self.ident(col, "column")?;
                    format!(
                        "({col} IS NULL OR {col} = {})",
                        self.dialect.false_literal()
                    )
                }
            };
            clauses.push(clause);
        }
        stmt.sql.push_str(" WHERE ");
        stmt.sql.push_str(&clauses.join(" AND "));
        Ok(())
    }

    fn binary(&self, stmt: &mut Statement, col: &str, op: &str, val: &FieldValue) -> DataResult<String> {
        let col = self.ident(col, "column")?;
        let placeholder = stmt.bind(val.clone());
        Ok(format!("{col} {op} {placeholder}"))
    }

    fn append_order(&self, stmt: &mut Statement, order: &[(String, bool)]) -> DataResult<()> {
        if order.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(order.len());
        for (col, asc) in order {
            let col = self.ident(col, "column")?;
            if *asc {
                clauses.push(format!("{col} ASC"));
            } else {
                clauses.push(format!("{col} DESC"));
            }
        }
        stmt.sql.push_str(" ORDER BY ");
        stmt.sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn append_limit_offset(&self, stmt: &mut Statement, limit: Option<u64>, offset: Option<u64>) {
        match (limit, offset) {
            (Some(limit), _) => stmt.sql.push_str(&format!(" LIMIT {limit}")),
            // SQLite and MySQL only accept OFFSET after a LIMIT.
            (None, Some(_)) if self.dialect == Dialect::Sqlite => stmt.sql.push_str(" LIMIT -1"),
            (None, Some(_)) if self.dialect == Dialect::MySql => {
                stmt.sql.push_str(&format!(" LIMIT {}", u64::MAX))
            }
            (None, _) => {}
        }
        if let Some(offset) = offset {
            stmt.sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    fn ident(&self, ident: &str, kind: &'static str) -> DataResult<String> {
        if !is_valid_identifier(ident) {
            return Err(DataError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        match self.identifier_policy {
            IdentifierPolicy::Quote => Ok(quote_identifier(ident, self.dialect)),
            IdentifierPolicy::Validate => Ok(ident.to_string()),
        }
    }
}

fn live_by_id(record_type: &RecordType, id: EntityId) -> Vec<Condition> {
    vec![
        Condition::Eq(record_type.id_column().to_string(), FieldValue::Integer(id.get())),
        crate::filter::live_condition(record_type),
    ]
}

struct Statement {
    dialect: Dialect,
    sql: String,
    params: Vec<FieldValue>,
}

impl Statement {
    fn new(dialect: Dialect, sql: String) -> Self {
        Self {
            dialect,
            sql,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: FieldValue) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.params.len())
    }

    fn finish(self) -> SqlStatement {
        SqlStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Whether `ident` is a plain SQL identifier: a letter or underscore
/// followed by letters, digits or underscores.
pub(crate) fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_identifier(ident: &str, dialect: Dialect) -> String {
    let quote = dialect.quote_char();
    format!("{quote}{ident}{quote}")
}
