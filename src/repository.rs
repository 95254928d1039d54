//! Permission-filtered query execution over action documents.
//!
//! Every query is `criteria AND not-deleted AND auth(token)`, assembled and validated before it
//! reaches the store. Authorization is part of the predicate the store evaluates, never a filter
//! over rows already fetched.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::acl::PermissionEvaluator;
use crate::action::Action;
use crate::config::RepositoryConfig;
use crate::criteria::{Clause, Criteria};
use crate::errors::{ActionError, StoreError};
use crate::query::telemetry;
use crate::query::{Cursor, Filter, FindOptions, SortSpec, validate_sort};
use crate::schema::{ActionField, ViewField};
use crate::store::DocumentStore;
use crate::view::ViewNamespace;

/// Lazily decodes the documents of one query into [`Action`]s.
#[derive(Debug)]
pub struct ActionCursor {
    inner: Cursor,
}

impl ActionCursor {
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.inner.remaining()
    }

    /// Decodes everything left, stopping at the first document that fails to decode.
    ///
    /// # Errors
    /// Returns `ActionError::Decode` for a stored document without the action layout.
    pub fn try_collect(self) -> Result<Vec<Action>, ActionError> {
        self.collect()
    }
}

impl Iterator for ActionCursor {
    type Item = Result<Action, ActionError>;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|d| Action::from_document(&d))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Soft-deleted actions are invisible to every query.
fn not_deleted() -> Filter {
    Filter::ne(&ActionField::Deleted.path(), true)
}

/// Rejects an empty required identifier. Logged and counted like any other failed query.
fn require(op: &str, what: &str, value: &str) -> Result<(), ActionError> {
    if value.trim().is_empty() {
        let err = ActionError::InvalidInput(format!("{what} must not be empty"));
        telemetry::log_error(op, &err);
        return Err(err);
    }
    Ok(())
}

fn view_field(view: ViewNamespace, field: ViewField) -> ActionField {
    ActionField::View(view, field)
}

fn names_in(view: ViewNamespace, names: &BTreeSet<String>) -> Clause {
    Clause::is_in(view_field(view, ViewField::Name), names.iter().map(String::as_str))
}

pub struct ActionRepository<S, E> {
    store: S,
    evaluator: E,
    config: RepositoryConfig,
}

impl<S, E> ActionRepository<S, E>
where
    S: DocumentStore,
    E: PermissionEvaluator,
{
    pub const fn new(store: S, evaluator: E, config: RepositoryConfig) -> Self {
        Self { store, evaluator, config }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Assembles the full predicate for `criteria` under `token` without running it.
    ///
    /// # Errors
    /// Authorization errors from the evaluator, and input errors for malformed paths or
    /// oversize sets.
    pub fn build_filter(&self, criteria: &Criteria, token: &E::Token) -> Result<Filter, ActionError> {
        let auth = self.evaluator.auth_predicate(token)?;
        let filter = Filter::And(vec![criteria.compile(), not_deleted(), auth]);
        filter.validate()?;
        Ok(filter)
    }

    async fn dispatch(&self, op: &str, criteria: &Criteria, token: &E::Token, opts: &FindOptions) -> Result<Cursor, ActionError> {
        let result = self.dispatch_inner(op, criteria, token, opts).await;
        if let Err(e) = &result {
            telemetry::log_error(op, e);
        }
        result
    }

    async fn dispatch_inner(&self, op: &str, criteria: &Criteria, token: &E::Token, opts: &FindOptions) -> Result<Cursor, ActionError> {
        let filter = self.build_filter(criteria, token)?;
        if let Some(sort) = &opts.sort {
            validate_sort(sort)?;
        }
        let denied = matches!(&filter, Filter::And(parts) if parts.last() == Some(&Filter::none()));

        let start = Instant::now();
        let cursor = match self.config.query_timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), self.store.find(&filter, opts))
                .await
                .map_err(|_| StoreError::Timeout { after_ms: ms })??,
            None => self.store.find(&filter, opts).await?,
        };

        let count = cursor.remaining();
        let hash = telemetry::log_query(op, &filter, start.elapsed().as_millis(), count, self.config.slow_query_ms);
        telemetry::log_access(op, &hash, count, denied);
        crate::dev6!(
            "{{\"bench\":\"query\",\"op\":\"{}\",\"filter_hash\":\"{}\",\"result_count\":{},\"denied\":{}}}",
            op,
            hash,
            count,
            denied
        );
        Ok(cursor)
    }

    /// Returns at most one action.
    ///
    /// Candidates are ordered by id so a duplicate match always resolves to the same action.
    /// With `strict_unique` a duplicate is reported as `MultipleMatches` instead.
    ///
    /// # Errors
    /// Input, authorization and storage errors; never an error for "no match".
    pub async fn query_one(&self, criteria: &Criteria, token: &E::Token) -> Result<Option<Action>, ActionError> {
        // Two candidates are enough to detect a duplicate; `max_result_limit` does not apply.
        let opts = FindOptions { sort: Some(vec![SortSpec::asc(ActionField::Id)]), limit: Some(2), skip: None };
        let mut cursor = self.dispatch("query_one", criteria, token, &opts).await?;
        let found = cursor.remaining();
        if found > 1 {
            if self.config.strict_unique {
                let err = ActionError::MultipleMatches { found };
                telemetry::log_error("query_one", &err);
                return Err(err);
            }
            telemetry::log_multi_match("query_one", found);
        }
        cursor.next().map(|d| Action::from_document(&d)).transpose()
    }

    /// All matching, authorized actions. Without `sort` the store's own order is used, which
    /// callers must not rely on.
    ///
    /// # Errors
    /// Input, authorization and storage errors; an empty cursor when nothing matches.
    pub async fn query_all(
        &self,
        criteria: &Criteria,
        token: &E::Token,
        sort: Option<&[SortSpec]>,
    ) -> Result<ActionCursor, ActionError> {
        let opts = FindOptions { sort: sort.map(<[SortSpec]>::to_vec), ..FindOptions::default() };
        self.query_page(criteria, token, &opts).await
    }

    /// Like [`Self::query_all`] with skip/limit handed to the store. A caller limit above
    /// `max_result_limit` is lowered to it.
    ///
    /// # Errors
    /// See [`Self::query_all`].
    pub async fn query_page(&self, criteria: &Criteria, token: &E::Token, opts: &FindOptions) -> Result<ActionCursor, ActionError> {
        let opts = FindOptions {
            limit: opts.limit.map(|l| l.min(self.config.max_result_limit)),
            ..opts.clone()
        };
        let inner = self.dispatch("query_all", criteria, token, &opts).await?;
        Ok(ActionCursor { inner })
    }

    /// The draft action called `name` on `page_id`.
    ///
    /// # Errors
    /// `InvalidInput` for empty arguments, otherwise as [`Self::query_one`].
    pub async fn find_by_unpublished_name_and_page_id(
        &self,
        name: &str,
        page_id: &str,
        token: &E::Token,
    ) -> Result<Option<Action>, ActionError> {
        require("find_by_unpublished_name_and_page_id", "name", name)?;
        require("find_by_unpublished_name_and_page_id", "page id", page_id)?;
        let view = ViewNamespace::Unpublished;
        let criteria = Criteria::new()
            .and(Clause::equals(view_field(view, ViewField::Name), name))
            .and(Clause::equals(view_field(view, ViewField::PageId), page_id));
        self.query_one(&criteria, token).await
    }

    /// Actions on `page_id` in either view. The only query that spans both namespaces.
    ///
    /// # Errors
    /// `InvalidInput` for an empty page id, otherwise as [`Self::query_all`].
    pub async fn find_by_page_id(&self, page_id: &str, token: &E::Token) -> Result<ActionCursor, ActionError> {
        require("find_by_page_id", "page id", page_id)?;
        let criteria = Criteria::new().and(Clause::or(
            Clause::equals(view_field(ViewNamespace::Unpublished, ViewField::PageId), page_id),
            Clause::equals(view_field(ViewNamespace::Published, ViewField::PageId), page_id),
        ));
        self.query_all(&criteria, token, None).await
    }

    /// # Errors
    /// `InvalidInput` for an empty page id, otherwise as [`Self::query_all`].
    pub async fn find_by_page_id_and_view_mode(
        &self,
        page_id: &str,
        view_mode: Option<bool>,
        token: &E::Token,
    ) -> Result<ActionCursor, ActionError> {
        require("find_by_page_id_and_view_mode", "page id", page_id)?;
        let view = ViewNamespace::from_flag(view_mode);
        let criteria = Criteria::new().and(Clause::equals(view_field(view, ViewField::PageId), page_id));
        self.query_all(&criteria, token, None).await
    }

    /// Draft actions on `page_id` named in `names`, narrowed by HTTP method and the
    /// user-set-on-load flag when those are given.
    ///
    /// # Errors
    /// `InvalidInput` for an empty page id, otherwise as [`Self::query_all`].
    pub async fn find_unpublished_by_names_page_id_http_method_and_user_set_on_load(
        &self,
        names: &BTreeSet<String>,
        page_id: &str,
        http_method: Option<&str>,
        user_set_on_load: Option<bool>,
        token: &E::Token,
    ) -> Result<ActionCursor, ActionError> {
        require(
            "find_unpublished_by_names_page_id_http_method_and_user_set_on_load",
            "page id",
            page_id,
        )?;
        let view = ViewNamespace::Unpublished;
        let criteria = Criteria::new()
            .and(names_in(view, names))
            .and(Clause::equals(view_field(view, ViewField::PageId), page_id))
            .and_opt(http_method.map(|m| Clause::equals(view_field(view, ViewField::HttpMethod), m)))
            .and_opt(user_set_on_load.map(|b| Clause::equals(view_field(view, ViewField::UserSetOnLoad), b)));
        self.query_all(&criteria, token, None).await
    }

    /// Generic lookup behind list endpoints. `name` and `page_ids` narrow the selected view
    /// when given; an empty `page_ids` list is treated as not given.
    ///
    /// # Errors
    /// As [`Self::query_all`].
    pub async fn find_all_by_name_and_page_ids_and_view_mode(
        &self,
        name: Option<&str>,
        page_ids: Option<&[String]>,
        view_mode: Option<bool>,
        token: &E::Token,
        sort: Option<&[SortSpec]>,
    ) -> Result<ActionCursor, ActionError> {
        let view = ViewNamespace::from_flag(view_mode);
        let criteria = Criteria::new()
            .and_opt(name.map(|n| Clause::equals(view_field(view, ViewField::Name), n)))
            .and_opt(
                page_ids
                    .filter(|ids| !ids.is_empty())
                    .map(|ids| Clause::is_in(view_field(view, ViewField::PageId), ids.iter().map(String::as_str))),
            );
        self.query_all(&criteria, token, sort).await
    }

    /// Draft actions on `page_id` that run on page load, optionally limited to `names`.
    ///
    /// # Errors
    /// `InvalidInput` for an empty page id, otherwise as [`Self::query_all`].
    pub async fn find_unpublished_on_load_by_names_and_page_id(
        &self,
        names: Option<&BTreeSet<String>>,
        page_id: &str,
        token: &E::Token,
    ) -> Result<ActionCursor, ActionError> {
        require("find_unpublished_on_load_by_names_and_page_id", "page id", page_id)?;
        let view = ViewNamespace::Unpublished;
        let criteria = Criteria::new()
            .and_opt(names.map(|n| names_in(view, n)))
            .and(Clause::equals(view_field(view, ViewField::PageId), page_id))
            .and(Clause::equals(view_field(view, ViewField::ExecuteOnLoad), true));
        self.query_all(&criteria, token, None).await
    }

    /// # Errors
    /// `InvalidInput` for an empty application id, otherwise as [`Self::query_all`].
    pub async fn find_by_application_id(
        &self,
        application_id: &str,
        token: &E::Token,
        sort: Option<&[SortSpec]>,
    ) -> Result<ActionCursor, ActionError> {
        require("find_by_application_id", "application id", application_id)?;
        let criteria = Criteria::new().and(Clause::equals(ActionField::ApplicationId, application_id));
        self.query_all(&criteria, token, sort).await
    }

    /// # Errors
    /// `InvalidInput` for an empty application id, otherwise as [`Self::query_all`].
    pub async fn find_by_application_id_and_names_and_view_mode(
        &self,
        application_id: &str,
        names: &BTreeSet<String>,
        view_mode: Option<bool>,
        token: &E::Token,
    ) -> Result<ActionCursor, ActionError> {
        require("find_by_application_id_and_names_and_view_mode", "application id", application_id)?;
        let view = ViewNamespace::from_flag(view_mode);
        let criteria = Criteria::new()
            .and(Clause::equals(ActionField::ApplicationId, application_id))
            .and(names_in(view, names));
        self.query_all(&criteria, token, None).await
    }
}
