mod common;

use actionlite::query::SortSpec;
use actionlite::{ActionField, ActionView, RepositoryConfig, ViewField, ViewNamespace};
use common::*;
use std::collections::BTreeSet;

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn view_mode_selects_draft_or_published_copy() {
    let repo = repo_with(&[
        draft("draft-1", "app1", "getUsers", "p1"),
        published("pub-1", "app1", "getUsers", "p1"),
    ]);
    let token = read_token();

    let live = repo.find_by_page_id_and_view_mode("p1", Some(true), &token).await.unwrap();
    assert_eq!(ids(live), ["pub-1"]);

    let editing = repo.find_by_page_id_and_view_mode("p1", Some(false), &token).await.unwrap();
    assert_eq!(ids(editing), ["draft-1"]);
}

#[tokio::test]
async fn unset_view_mode_means_draft() {
    let repo = repo_with(&[
        draft("draft-1", "app1", "getUsers", "p1"),
        published("pub-1", "app1", "getUsers", "p1"),
    ]);
    let unset = repo.find_by_page_id_and_view_mode("p1", None, &read_token()).await.unwrap();
    assert_eq!(ids(unset), ["draft-1"]);
}

#[tokio::test]
async fn views_never_leak_into_each_other() {
    // Draft lives on p1, the published copy was on p9.
    let moved = readable(
        actionlite::Action::new("app1")
            .with_id("moved")
            .with_view(ViewNamespace::Unpublished, ActionView::named("q", "p1"))
            .with_view(ViewNamespace::Published, ActionView::named("q_old", "p9")),
    );
    let repo = repo_with(&[moved]);
    let t = read_token();

    assert!(ids(repo.find_by_page_id_and_view_mode("p1", Some(true), &t).await.unwrap()).is_empty());
    assert_eq!(ids(repo.find_by_page_id_and_view_mode("p9", Some(true), &t).await.unwrap()), ["moved"]);
    assert!(ids(repo.find_by_page_id_and_view_mode("p9", Some(false), &t).await.unwrap()).is_empty());

    let by_name = |n: &'static str, mode| {
        let repo = &repo;
        let t = &t;
        async move { ids(repo.find_all_by_name_and_page_ids_and_view_mode(Some(n), None, mode, t, None).await.unwrap()) }
    };
    assert!(by_name("q", Some(true)).await.is_empty());
    assert_eq!(by_name("q_old", Some(true)).await, ["moved"]);
    assert!(by_name("q_old", Some(false)).await.is_empty());

    // Only the page lookup spans both views.
    assert_eq!(ids(repo.find_by_page_id("p9", &t).await.unwrap()), ["moved"]);
    assert_eq!(ids(repo.find_by_page_id("p1", &t).await.unwrap()), ["moved"]);
}

#[tokio::test]
async fn names_lookup_returns_only_requested_names() {
    let repo = repo_with(&[
        draft("id-a", "app1", "a", "p1"),
        draft("id-b", "app1", "b", "p1"),
        draft("id-c", "app1", "c", "p1"),
        draft("id-other", "app2", "a", "p5"),
    ]);
    let cur = repo
        .find_by_application_id_and_names_and_view_mode("app1", &names(&["a", "b"]), Some(false), &read_token())
        .await
        .unwrap();
    assert_eq!(ids(cur), ["id-a", "id-b"]);

    let none = repo
        .find_by_application_id_and_names_and_view_mode("app1", &BTreeSet::new(), Some(false), &read_token())
        .await
        .unwrap();
    assert_eq!(none.remaining(), 0);
}

#[tokio::test]
async fn names_lookup_reads_the_published_view_when_asked() {
    // Draft "a" was renamed from published "old_a"; "b" only exists as a draft.
    let renamed = readable(
        actionlite::Action::new("app1")
            .with_id("id-a")
            .with_view(ViewNamespace::Unpublished, ActionView::named("a", "p1"))
            .with_view(ViewNamespace::Published, ActionView::named("old_a", "p1")),
    );
    let repo = repo_with(&[renamed, draft("id-b", "app1", "b", "p1"), published("id-c", "app2", "old_a", "p1")]);
    let t = read_token();

    let live = repo
        .find_by_application_id_and_names_and_view_mode("app1", &names(&["old_a", "b"]), Some(true), &t)
        .await
        .unwrap();
    assert_eq!(ids(live), ["id-a"]);

    let by_draft_name = repo
        .find_by_application_id_and_names_and_view_mode("app1", &names(&["a"]), Some(true), &t)
        .await
        .unwrap();
    assert_eq!(by_draft_name.remaining(), 0);

    let unset = repo
        .find_by_application_id_and_names_and_view_mode("app1", &names(&["a", "old_a"]), None, &t)
        .await
        .unwrap();
    assert_eq!(ids(unset), ["id-a"]);

    let empty = repo
        .find_by_application_id_and_names_and_view_mode("app1", &BTreeSet::new(), Some(true), &t)
        .await
        .unwrap();
    assert_eq!(empty.remaining(), 0);
}

#[tokio::test]
async fn single_lookup_by_draft_name_and_page() {
    let repo = repo_with(&[draft("x-1", "app1", "x", "pageA"), draft("y-1", "app1", "y", "pageA")]);
    let t = read_token();

    let hit = repo.find_by_unpublished_name_and_page_id("x", "pageA", &t).await.unwrap();
    assert_eq!(hit.map(|a| a.id.0), Some("x-1".to_string()));

    let miss = repo.find_by_unpublished_name_and_page_id("x", "pageB", &t).await.unwrap();
    assert!(miss.is_none());
    let miss = repo.find_by_unpublished_name_and_page_id("z", "pageA", &t).await.unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn duplicate_names_resolve_to_the_same_action_every_time() {
    let repo = repo_with(&[draft("zz-2", "app1", "x", "pageA"), draft("aa-1", "app1", "x", "pageA")]);
    let t = read_token();
    for _ in 0..5 {
        let hit = repo.find_by_unpublished_name_and_page_id("x", "pageA", &t).await.unwrap().unwrap();
        assert_eq!(hit.id.as_str(), "aa-1");
    }
}

#[tokio::test]
async fn strict_unique_reports_duplicates() {
    let config = RepositoryConfig { strict_unique: true, ..RepositoryConfig::default() };
    let repo = repo_with_config(&[draft("zz-2", "app1", "x", "pageA"), draft("aa-1", "app1", "x", "pageA")], config);
    let err = repo.find_by_unpublished_name_and_page_id("x", "pageA", &read_token()).await.unwrap_err();
    assert!(matches!(err, actionlite::ActionError::MultipleMatches { found: 2 }));
}

#[tokio::test]
async fn result_ceiling_does_not_hide_duplicates_from_single_lookups() {
    let dupes = [draft("zz-2", "app1", "x", "pageA"), draft("aa-1", "app1", "x", "pageA")];
    let config = RepositoryConfig { strict_unique: true, max_result_limit: 1, ..RepositoryConfig::default() };
    let repo = repo_with_config(&dupes, config);
    let err = repo.find_by_unpublished_name_and_page_id("x", "pageA", &read_token()).await.unwrap_err();
    assert!(matches!(err, actionlite::ActionError::MultipleMatches { found: 2 }));
}

#[tokio::test]
async fn zero_result_ceiling_still_finds_the_single_action() {
    let config = RepositoryConfig { max_result_limit: 0, ..RepositoryConfig::default() };
    let repo = repo_with_config(&[draft("x-1", "app1", "x", "pageA")], config);
    let hit = repo.find_by_unpublished_name_and_page_id("x", "pageA", &read_token()).await.unwrap();
    assert_eq!(hit.map(|a| a.id.0), Some("x-1".to_string()));
}

#[tokio::test]
async fn soft_deleted_actions_are_never_returned() {
    let gone = draft("gone", "app1", "x", "p1").mark_deleted();
    let repo = repo_with(&[gone, draft("live", "app1", "y", "p1")]);
    let t = read_token();
    assert_eq!(ids(repo.find_by_page_id("p1", &t).await.unwrap()), ["live"]);
    assert!(repo.find_by_unpublished_name_and_page_id("x", "p1", &t).await.unwrap().is_none());
}

#[tokio::test]
async fn on_load_lookup_requires_execute_on_load() {
    let mut on = draft("on", "app1", "a", "p1");
    on.unpublished_action = on.unpublished_action.map(|v| v.execute_on_load(true));
    let mut off = draft("off", "app1", "b", "p1");
    off.unpublished_action = off.unpublished_action.map(|v| v.execute_on_load(false));
    let repo = repo_with(&[on, off, draft("unset", "app1", "c", "p1")]);
    let t = read_token();

    assert_eq!(ids(repo.find_unpublished_on_load_by_names_and_page_id(None, "p1", &t).await.unwrap()), ["on"]);
    let only_b = names(&["b"]);
    assert!(ids(repo.find_unpublished_on_load_by_names_and_page_id(Some(&only_b), "p1", &t).await.unwrap()).is_empty());
    let with_a = names(&["a", "b"]);
    assert_eq!(ids(repo.find_unpublished_on_load_by_names_and_page_id(Some(&with_a), "p1", &t).await.unwrap()), ["on"]);

    // An empty set narrows to nothing; it is not the same as passing no names.
    let none = BTreeSet::new();
    assert_eq!(repo.find_unpublished_on_load_by_names_and_page_id(Some(&none), "p1", &t).await.unwrap().remaining(), 0);
}

#[tokio::test]
async fn http_method_and_user_set_on_load_narrow_only_when_given() {
    let mut get = draft("get", "app1", "a", "p1");
    get.unpublished_action = get.unpublished_action.map(|v| v.http_method("GET").user_set_on_load(true));
    let mut post = draft("post", "app1", "b", "p1");
    post.unpublished_action = post.unpublished_action.map(|v| v.http_method("POST").user_set_on_load(false));
    let repo = repo_with(&[get, post]);
    let t = read_token();
    let both = names(&["a", "b"]);

    let all = repo
        .find_unpublished_by_names_page_id_http_method_and_user_set_on_load(&both, "p1", None, None, &t)
        .await
        .unwrap();
    assert_eq!(ids(all), ["get", "post"]);

    let gets = repo
        .find_unpublished_by_names_page_id_http_method_and_user_set_on_load(&both, "p1", Some("GET"), None, &t)
        .await
        .unwrap();
    assert_eq!(ids(gets), ["get"]);

    let user_set = repo
        .find_unpublished_by_names_page_id_http_method_and_user_set_on_load(&both, "p1", Some("POST"), Some(true), &t)
        .await
        .unwrap();
    assert!(ids(user_set).is_empty());
}

#[tokio::test]
async fn application_lookup_honours_sort() {
    let repo = repo_with(&[
        draft("1", "app1", "charlie", "p1"),
        draft("2", "app1", "alpha", "p1"),
        draft("3", "app1", "bravo", "p2"),
    ]);
    let by_name = [SortSpec::asc(ActionField::View(ViewNamespace::Unpublished, ViewField::Name))];
    let cur = repo.find_by_application_id("app1", &read_token(), Some(&by_name)).await.unwrap();
    assert_eq!(ids(cur), ["2", "3", "1"]);

    let by_name_desc = [SortSpec::desc(ActionField::View(ViewNamespace::Unpublished, ViewField::Name))];
    let cur = repo.find_by_application_id("app1", &read_token(), Some(&by_name_desc)).await.unwrap();
    assert_eq!(ids(cur), ["1", "3", "2"]);
}

#[tokio::test]
async fn page_ids_filter_treats_empty_list_as_absent() {
    let repo = repo_with(&[draft("1", "app1", "a", "p1"), draft("2", "app1", "a", "p2"), draft("3", "app1", "a", "p3")]);
    let t = read_token();
    let pages = vec!["p1".to_string(), "p3".to_string()];
    let some = repo.find_all_by_name_and_page_ids_and_view_mode(Some("a"), Some(&pages), None, &t, None).await.unwrap();
    assert_eq!(ids(some), ["1", "3"]);
    let empty: Vec<String> = Vec::new();
    let all = repo.find_all_by_name_and_page_ids_and_view_mode(Some("a"), Some(&empty), None, &t, None).await.unwrap();
    assert_eq!(all.remaining(), 3);
}

#[tokio::test]
async fn paging_is_delegated_to_the_store() {
    let repo = repo_with(&[draft("1", "app1", "a", "p1"), draft("2", "app1", "b", "p1"), draft("3", "app1", "c", "p1")]);
    let criteria = actionlite::Criteria::new().and(actionlite::Clause::equals(ActionField::ApplicationId, "app1"));
    let opts = actionlite::query::FindOptions {
        sort: Some(vec![SortSpec::desc(ActionField::Id)]),
        skip: Some(1),
        limit: Some(1),
    };
    let page = repo.query_page(&criteria, &read_token(), &opts).await.unwrap();
    assert_eq!(ids(page), ["2"]);
}

#[tokio::test]
async fn concurrent_queries_do_not_interfere() {
    let mut seed = Vec::new();
    for i in 0..20 {
        seed.push(draft(&format!("a{i}"), "app1", &format!("n{i}"), if i % 2 == 0 { "even" } else { "odd" }));
    }
    let repo = std::sync::Arc::new(repo_with(&seed));
    let mut handles = Vec::new();
    for i in 0..16 {
        let repo = repo.clone();
        let page = if i % 2 == 0 { "even" } else { "odd" };
        handles.push(tokio::spawn(async move {
            repo.find_by_page_id(page, &read_token()).await.map(|c| c.count())
        }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap().unwrap(), 10);
    }
}
