//! Hierarchy invariants exercised through CategoryService over the memory store

use std::sync::Arc;

use rstest::{fixture, rstest};

use catree::application::services::{CategoryService, HierarchyOptions};
use catree::domain::{Category, CategoryId, CategoryPatch, DomainError, NewCategory};
use catree::infrastructure::memory::{MemoryCategoryStore, MemoryItemCounter};
use catree::infrastructure::traits::CategoryStore;
use catree::util::testing;

struct Env {
    store: Arc<MemoryCategoryStore>,
    items: Arc<MemoryItemCounter>,
    service: CategoryService,
}

impl Env {
    fn root(&self, name: &str) -> Category {
        self.service
            .create(NewCategory::root(name, "tester"))
            .expect("create root")
    }

    fn child(&self, name: &str, parent: &Category) -> Category {
        self.service
            .create(NewCategory::child(name, parent.id, "tester"))
            .expect("create child")
    }

    fn parent_of(&self, id: CategoryId) -> Option<CategoryId> {
        self.store.get(id).unwrap().expect("record exists").parent_id
    }
}

#[fixture]
fn env() -> Env {
    testing::init_test_setup();
    let store = Arc::new(MemoryCategoryStore::new());
    let items = Arc::new(MemoryItemCounter::new());
    let service = CategoryService::new(store.clone(), items.clone(), HierarchyOptions::default());
    Env {
        store,
        items,
        service,
    }
}

fn domain(err: catree::ApplicationError) -> DomainError {
    err.as_domain().cloned().expect("domain error")
}

#[rstest]
fn given_electronics_and_laptops_when_making_root_child_of_leaf_then_cyclic(env: Env) {
    let electronics = env.root("Electronics");
    let laptops = env.child("Laptops", &electronics);

    let err = env
        .service
        .validate_parent_assignment(electronics.id, Some(laptops.id))
        .unwrap_err();

    assert_eq!(
        domain(err),
        DomainError::CyclicHierarchy {
            category: electronics.id,
            parent: laptops.id
        }
    );
}

#[rstest]
fn given_any_category_when_assigning_itself_then_self_parent(env: Env) {
    let electronics = env.root("Electronics");
    let unknown = CategoryId::new();

    for id in [electronics.id, unknown] {
        let err = env
            .service
            .validate_parent_assignment(id, Some(id))
            .unwrap_err();
        assert_eq!(domain(err), DomainError::SelfParent(id));
    }
}

#[rstest]
fn given_rejected_reassignment_when_updating_then_store_unchanged(env: Env) {
    let a = env.root("A");
    let b = env.child("B", &a);
    let c = env.child("C", &b);
    let before = env.store.find_all().unwrap();

    let err = env
        .service
        .update(a.id, CategoryPatch::default().parent(Some(c.id)).name("A2"))
        .unwrap_err();

    assert!(matches!(domain(err), DomainError::CyclicHierarchy { .. }));
    assert_eq!(env.store.find_all().unwrap(), before);
}

#[rstest]
fn given_missing_or_inactive_parent_when_creating_then_rejected(env: Env) {
    let ghost = CategoryId::new();
    let err = env
        .service
        .create(NewCategory::child("Orphan", ghost, "tester"))
        .unwrap_err();
    assert_eq!(domain(err), DomainError::ParentNotFound(ghost));

    let retired = env.root("Retired");
    env.service
        .update(retired.id, CategoryPatch::default().active(false))
        .unwrap();
    let err = env
        .service
        .create(NewCategory::child("Late", retired.id, "tester"))
        .unwrap_err();
    assert_eq!(domain(err), DomainError::ParentInactive(retired.id));
    assert_eq!(env.store.count().unwrap(), 1);
}

#[rstest]
fn given_missing_or_inactive_parent_when_reassigning_then_rejected(env: Env) {
    let tools = env.root("Tools");
    let drills = env.child("Drills", &tools);
    let ghost = CategoryId::new();

    let err = env
        .service
        .update(drills.id, CategoryPatch::default().parent(Some(ghost)))
        .unwrap_err();
    assert_eq!(domain(err), DomainError::ParentNotFound(ghost));

    let retired = env.root("Retired");
    env.service
        .update(retired.id, CategoryPatch::default().active(false))
        .unwrap();
    let err = env
        .service
        .update(drills.id, CategoryPatch::default().parent(Some(retired.id)))
        .unwrap_err();
    assert_eq!(domain(err), DomainError::ParentInactive(retired.id));
    assert_eq!(env.parent_of(drills.id), Some(tools.id));
}

#[rstest]
fn given_three_levels_when_deleting_middle_then_grandchild_moves_up(env: Env) {
    let a = env.root("A");
    let b = env.child("B", &a);
    let c = env.child("C", &b);

    let outcome = env.service.delete(b.id).unwrap();

    assert_eq!(outcome.reparented, vec![c.id]);
    assert_eq!(env.parent_of(c.id), Some(a.id));
    assert!(env.store.get(b.id).unwrap().is_none());
}

#[rstest]
fn given_root_with_child_when_deleting_root_then_child_becomes_root(env: Env) {
    let a = env.root("A");
    let b = env.child("B", &a);

    env.service.delete(a.id).unwrap();

    assert_eq!(env.parent_of(b.id), None);
    assert_eq!(env.service.roots().unwrap()[0].category.id, b.id);
}

#[rstest]
fn given_referencing_item_when_deleting_then_in_use_and_kept(env: Env) {
    let x = env.root("X");
    let y = env.child("Y", &x);
    env.items.set(x.id, 1).unwrap();

    let err = env.service.delete(x.id).unwrap_err();

    assert_eq!(
        domain(err),
        DomainError::CategoryInUse {
            category: x.id,
            count: 1
        }
    );
    assert!(env.store.get(x.id).unwrap().is_some());
    assert_eq!(env.parent_of(y.id), Some(x.id));
}

#[rstest]
fn given_electronics_laptops_when_resolving_path_then_root_first(env: Env) {
    let electronics = env.root("Electronics");
    let laptops = env.child("Laptops", &electronics);

    assert_eq!(
        env.service.path(laptops.id).unwrap(),
        vec!["Electronics".to_string(), "Laptops".to_string()]
    );
    assert_eq!(
        env.service.path_display(laptops.id).unwrap(),
        "Electronics > Laptops"
    );
}

#[rstest]
fn given_unchanged_store_when_building_tree_twice_then_identical(env: Env) {
    let tools = env.root("Tools");
    let electronics = env.root("Electronics");
    env.child("Phones", &electronics);
    let laptops = env.child("Laptops", &electronics);
    env.child("Gaming", &laptops);
    env.child("Drills", &tools);
    env.items.set(laptops.id, 3).unwrap();

    let first = env.service.tree(None).unwrap();
    let second = env.service.tree(None).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first[0].name, "Electronics");
    assert_eq!(first[0].children[0].name, "Laptops");
    assert_eq!(first[0].children[0].items_count, 3);
    assert_eq!(first.iter().map(|n| n.size()).sum::<usize>(), 6);
}

/// Deterministic sequence of reassignments; rejected ones must not break the forest.
#[rstest]
fn given_many_reassignments_when_applied_then_every_chain_reaches_root(env: Env) {
    let mut ids = Vec::new();
    for i in 0..12 {
        ids.push(env.root(&format!("n{i}")).id);
    }

    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    let mut accepted = 0;
    for _ in 0..300 {
        let child = ids[(next() % ids.len() as u64) as usize];
        let parent = match next() % 5 {
            0 => None,
            _ => Some(ids[(next() % ids.len() as u64) as usize]),
        };
        if env
            .service
            .update(child, CategoryPatch::default().parent(parent))
            .is_ok()
        {
            accepted += 1;
        }
    }
    assert!(accepted > 0);

    for id in &ids {
        let mut steps = 0;
        let mut current = Some(*id);
        while let Some(c) = current {
            steps += 1;
            assert!(steps <= 1000, "chain from {id} does not terminate");
            current = env.parent_of(c);
        }
    }
    assert!(env.service.verify().unwrap().is_empty());
}

#[rstest]
fn given_depth_cap_when_chain_would_exceed_then_depth_exceeded() {
    let store = Arc::new(MemoryCategoryStore::new());
    let service = CategoryService::new(
        store,
        Arc::new(MemoryItemCounter::new()),
        HierarchyOptions {
            max_depth: 2,
            ..HierarchyOptions::default()
        },
    );
    let a = service.create(NewCategory::root("A", "t")).unwrap();
    let b = service.create(NewCategory::child("B", a.id, "t")).unwrap();

    let err = service
        .create(NewCategory::child("C", b.id, "t"))
        .unwrap_err();

    assert!(matches!(domain(err), DomainError::DepthExceeded { max_depth: 2, .. }));
}
