#![allow(dead_code)]

use actionlite::{
    AclPermission, Action, ActionCursor, ActionRepository, ActionView, MemoryActionRepository,
    MemoryStore, PermissionToken, Policy, PolicyEvaluator, Principal, RepositoryConfig,
    ViewNamespace,
};

pub const ANN: &str = "ann@example.com";
pub const READ: &str = "read:actions";

pub fn read_token() -> PermissionToken {
    PermissionToken::new(AclPermission::ReadActions, Principal::user(ANN))
}

/// Grants `ANN` read access to the action.
pub fn readable(action: Action) -> Action {
    action.with_policy(Policy::for_users(READ, [ANN]))
}

pub fn draft(id: &str, app: &str, name: &str, page: &str) -> Action {
    readable(Action::new(app).with_id(id).with_view(ViewNamespace::Unpublished, ActionView::named(name, page)))
}

pub fn published(id: &str, app: &str, name: &str, page: &str) -> Action {
    readable(Action::new(app).with_id(id).with_view(ViewNamespace::Published, ActionView::named(name, page)))
}

pub fn seeded_store(actions: &[Action]) -> MemoryStore {
    let store = MemoryStore::new("actions");
    for a in actions {
        store.upsert_action(a).unwrap();
    }
    store
}

pub fn repo_with(actions: &[Action]) -> MemoryActionRepository {
    repo_with_config(actions, RepositoryConfig::default())
}

pub fn repo_with_config(actions: &[Action], config: RepositoryConfig) -> MemoryActionRepository {
    ActionRepository::new(seeded_store(actions), PolicyEvaluator::new(), config)
}

pub fn ids(cursor: ActionCursor) -> Vec<String> {
    cursor.try_collect().unwrap().into_iter().map(|a| a.id.0).collect()
}
