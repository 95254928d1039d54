use bson::Bson;
use serde::{Deserialize, Serialize};

use crate::errors::ActionError;
use crate::schema::{FieldPath, check_path};

// Safety limits to prevent resource abuse
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_FILTER_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    #[must_use]
    pub fn asc(field: impl Into<FieldPath>) -> Self {
        Self { field: field.into().into_string(), order: Order::Asc }
    }

    #[must_use]
    pub fn desc(field: impl Into<FieldPath>) -> Self {
        Self { field: field.into().into_string(), order: Order::Desc }
    }
}

/// Options handed to the store together with the compiled filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOptions {
    pub sort: Option<Vec<SortSpec>>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    /// Also matches documents where the field is absent.
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    In { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
    /// Some element of the array at `path` is a document matching `filter`.
    ElemMatch { path: String, filter: Box<Filter> },
}

impl Filter {
    /// A predicate no document satisfies.
    #[must_use]
    pub fn none() -> Self {
        Self::Not(Box::new(Self::True))
    }

    #[must_use]
    pub fn eq(path: &FieldPath, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.as_str().to_string(), op: CmpOp::Eq, value: value.into() }
    }

    #[must_use]
    pub fn ne(path: &FieldPath, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.as_str().to_string(), op: CmpOp::Ne, value: value.into() }
    }

    #[must_use]
    pub fn is_in<I, V>(path: &FieldPath, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Self::In { path: path.as_str().to_string(), values: values.into_iter().map(Into::into).collect() }
    }

    /// Checks every path and bound before the filter is handed to a store.
    ///
    /// # Errors
    /// `InvalidFieldPath` for malformed paths, `InvalidInput` for oversize `In` sets or
    /// filters nested deeper than the evaluator allows.
    pub fn validate(&self) -> Result<(), ActionError> {
        self.validate_at(0)
    }

    fn validate_at(&self, depth: usize) -> Result<(), ActionError> {
        if depth > MAX_FILTER_DEPTH {
            return Err(ActionError::InvalidInput(format!("filter nested deeper than {MAX_FILTER_DEPTH}")));
        }
        match self {
            Self::True => Ok(()),
            Self::And(fs) | Self::Or(fs) => fs.iter().try_for_each(|f| f.validate_at(depth + 1)),
            Self::Not(f) => f.validate_at(depth + 1),
            Self::Cmp { path, .. } => check_path(path),
            Self::In { path, values } => {
                check_path(path)?;
                if values.len() > MAX_IN_SET {
                    return Err(ActionError::InvalidInput(format!(
                        "`{path}` set has {} values, limit is {MAX_IN_SET}",
                        values.len()
                    )));
                }
                Ok(())
            }
            Self::ElemMatch { path, filter } => {
                check_path(path)?;
                filter.validate_at(depth + 1)
            }
        }
    }

    /// Short operator name used in logs.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::And(_) => "$and",
            Self::Or(_) => "$or",
            Self::Not(_) => "$not",
            Self::In { .. } => "$in",
            Self::Cmp { op: CmpOp::Eq, .. } => "$eq",
            Self::Cmp { op: CmpOp::Ne, .. } => "$ne",
            Self::ElemMatch { .. } => "$elemMatch",
        }
    }
}

/// # Errors
/// `InvalidInput` when more than the supported number of sort keys is given, or
/// `InvalidFieldPath` for a malformed sort field.
pub fn validate_sort(sort: &[SortSpec]) -> Result<(), ActionError> {
    if sort.len() > MAX_SORT_FIELDS {
        return Err(ActionError::InvalidInput(format!(
            "{} sort fields given, limit is {MAX_SORT_FIELDS}",
            sort.len()
        )));
    }
    sort.iter().try_for_each(|s| check_path(&s.field))
}
