//! Criteria composition.
//!
//! A [`Criteria`] is an AND of [`Clause`]s. Optional caller inputs become `Option<Clause>`;
//! `None` is dropped from the list, never compiled into an always-true condition.

use bson::Bson;

use crate::query::Filter;
use crate::schema::FieldPath;

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Equals { path: FieldPath, value: Bson },
    /// Field value is a member of `values`. An empty set matches nothing.
    In { path: FieldPath, values: Vec<Bson> },
    Or(Box<Clause>, Box<Clause>),
}

impl Clause {
    #[must_use]
    pub fn equals(path: impl Into<FieldPath>, value: impl Into<Bson>) -> Self {
        Self::Equals { path: path.into(), value: value.into() }
    }

    #[must_use]
    pub fn is_in<I, V>(path: impl Into<FieldPath>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Self::In { path: path.into(), values: values.into_iter().map(Into::into).collect() }
    }

    #[must_use]
    pub fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }

    #[must_use]
    pub fn to_filter(&self) -> Filter {
        match self {
            Self::Equals { path, value } => Filter::eq(path, value.clone()),
            Self::In { path, values } => Filter::is_in(path, values.iter().cloned()),
            Self::Or(a, b) => Filter::Or(vec![a.to_filter(), b.to_filter()]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    clauses: Vec<Clause>,
}

impl Criteria {
    #[must_use]
    pub const fn new() -> Self {
        Self { clauses: Vec::new() }
    }

    #[must_use]
    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Adds the clause when present; an absent clause leaves the criteria untouched.
    #[must_use]
    pub fn and_opt(self, clause: Option<Clause>) -> Self {
        match clause {
            Some(c) => self.and(c),
            None => self,
        }
    }

    /// Zero clauses compile to match-all, one to itself, more to an AND.
    #[must_use]
    pub fn compile(&self) -> Filter {
        match self.clauses.as_slice() {
            [] => Filter::True,
            [only] => only.to_filter(),
            many => Filter::And(many.iter().map(Clause::to_filter).collect()),
        }
    }
}

impl FromIterator<Option<Clause>> for Criteria {
    fn from_iter<T: IntoIterator<Item = Option<Clause>>>(iter: T) -> Self {
        Self { clauses: iter.into_iter().flatten().collect() }
    }
}

/// Folds optional clauses with the omission rule and compiles the result.
pub fn compose<I>(clauses: I) -> Filter
where
    I: IntoIterator<Item = Option<Clause>>,
{
    clauses.into_iter().collect::<Criteria>().compile()
}
