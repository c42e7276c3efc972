use datadef_core::{DataError, DataResult, FieldValue};
use serde::Serialize;

/// A predicate on one field of the searched definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Restriction {
    Eq { field: String, value: FieldValue },
    Ne { field: String, value: FieldValue },
    Gt { field: String, value: FieldValue },
    Ge { field: String, value: FieldValue },
    Lt { field: String, value: FieldValue },
    Le { field: String, value: FieldValue },
    /// SQL `LIKE` pattern with `%` and `_` wildcards.
    Like { field: String, pattern: String },
    In { field: String, values: Vec<FieldValue> },
    IsNull { field: String },
    IsNotNull { field: String },
}

macro_rules! restriction_ctor {
    ($($fn_name:ident => $variant:ident),+ $(,)?) => {
        $(
            pub fn $fn_name(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
                Restriction::$variant {
                    field: field.into(),
                    value: value.into(),
                }
            }
        )+
    };
}

impl Restriction {
    restriction_ctor! {
        eq => Eq,
        ne => Ne,
        gt => Gt,
        ge => Ge,
        lt => Lt,
        le => Le,
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Restriction::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        Restriction::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Restriction::IsNull {
            field: field.into(),
        }
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Restriction::IsNotNull {
            field: field.into(),
        }
    }

    /// Name of the field this restriction applies to.
    pub fn field(&self) -> &str {
        match self {
            Restriction::Eq { field, .. }
            | Restriction::Ne { field, .. }
            | Restriction::Gt { field, .. }
            | Restriction::Ge { field, .. }
            | Restriction::Lt { field, .. }
            | Restriction::Le { field, .. }
            | Restriction::Like { field, .. }
            | Restriction::In { field, .. }
            | Restriction::IsNull { field }
            | Restriction::IsNotNull { field } => field,
        }
    }
}

/// Sort key of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub field: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// A paged, optionally restricted search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchCriteria {
    first_result: u64,
    max_results: u64,
    restrictions: Vec<Restriction>,
    orders: Vec<Order>,
}

impl SearchCriteria {
    /// # Errors
    ///
    /// [`DataError::InvalidCriteria`] when `max_results` is zero or the page
    /// end would not fit a signed 64-bit offset.
    pub fn new(first_result: u64, max_results: u64) -> DataResult<Self> {
        if max_results == 0 {
            return Err(DataError::InvalidCriteria(
                "max_results must be at least 1".into(),
            ));
        }
        match first_result.checked_add(max_results) {
            Some(end) if end <= i64::MAX as u64 => {}
            _ => {
                return Err(DataError::InvalidCriteria(format!(
                    "page {first_result}+{max_results} is out of range"
                )))
            }
        }
        Ok(Self {
            first_result,
            max_results,
            restrictions: Vec::new(),
            orders: Vec::new(),
        })
    }

    /// Criteria for the first `max_results` records.
    pub fn first_page(max_results: u64) -> DataResult<Self> {
        Self::new(0, max_results)
    }

    /// Criteria for zero-based page `page` of `size` records.
    pub fn page(page: u64, size: u64) -> DataResult<Self> {
        let first = page.checked_mul(size).ok_or_else(|| {
            DataError::InvalidCriteria(format!("page {page} of size {size} is out of range"))
        })?;
        Self::new(first, size)
    }

    pub fn restrict(mut self, restriction: Restriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn first_result(&self) -> u64 {
        self.first_result
    }

    pub fn max_results(&self) -> u64 {
        self.max_results
    }

    pub fn restrictions(&self) -> &[Restriction] {
        &self.restrictions
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}
