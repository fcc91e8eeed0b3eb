//! Editing session lifecycle tests

use permtree::*;

fn setup() -> PermissionsEditor {
    setup_with(EditorConfig::default())
}

const SNAPSHOT: &str = r#"{"1": {"1": {"native": "write", "schemas": "all"}},
    "2": {"1": {"native": "none", "schemas": "all"}},
    "3": {"1": {"native": "none", "schemas": "none"}}}"#;

fn setup_with(config: EditorConfig) -> PermissionsEditor {
    open(SNAPSHOT, config)
}

const GROUPS: &str = r#"[{"id": 1, "name": "Administrators", "editable": false},
    {"id": 2, "name": "All Users", "editable": true},
    {"id": 3, "name": "Analysts"}]"#;

fn open(snapshot: &str, config: EditorConfig) -> PermissionsEditor {
    open_with_groups(snapshot, GROUPS, config)
}

fn open_with_groups(snapshot: &str, groups: &str, config: EditorConfig) -> PermissionsEditor {
    let _ = env_logger::builder().is_test(true).try_init();
    let topology = Topology::from_json(
        r#"{"databases": [
            {"id": 1, "name": "Sample", "tables": [
                {"id": 1, "display_name": "Orders", "schema": "public"},
                {"id": 2, "display_name": "People", "schema": "public"},
                {"id": 3, "display_name": "Events", "schema": "audit"}
            ]}
        ]}"#,
    )
    .unwrap();
    let groups: Vec<Group> = serde_json::from_str(groups).unwrap();
    let snapshot = PermissionsState::from_json(snapshot).unwrap();
    PermissionsEditor::new(topology, groups, snapshot, config).unwrap()
}

fn sample() -> EntityId {
    EntityId::Database { database: 1 }
}

#[test]
fn fresh_session_is_clean() {
    let e = setup();
    assert!(!e.is_dirty());
    assert!(e.diff().is_empty());
    assert_eq!(e.current(), e.original());
    assert_eq!(e.save_error(), None);
}

#[test]
fn edit_marks_dirty_and_keeps_baseline() {
    let mut e = setup();
    let before = e.original().clone();
    e.update(2, &sample(), Level::Native, Access::Write).unwrap();
    assert!(e.is_dirty());
    assert_eq!(e.original(), &before);
    assert_eq!(native_access(e.current(), 2, 1), Access::Write);
}

#[test]
fn reverting_by_hand_is_clean_again() {
    let mut e = setup();
    e.update(2, &sample(), Level::Native, Access::Read).unwrap();
    e.update(2, &sample(), Level::Native, Access::None).unwrap();
    assert!(!e.is_dirty());
}

#[test]
fn rejected_edit_leaves_working_copy() {
    let mut e = setup();
    e.update(2, &sample(), Level::Native, Access::Read).unwrap();
    let before = e.current().clone();
    let r = e.update(3, &sample(), Level::Native, Access::Write);
    assert!(matches!(r, Err(PermsError::InvalidTransition { .. })));
    assert!(matches!(e.update(1, &sample(), Level::Native, Access::None), Err(PermsError::ReadOnlyGroup(1))));
    assert_eq!(e.current(), &before);
}

#[test]
fn update_returns_post_action() {
    let mut e = setup();
    let action = e.update(3, &sample(), Level::Schemas, Access::Controlled).unwrap();
    let Some(PostAction::Navigate(route)) = action else { panic!("expected navigation") };
    assert_eq!(e.route_path(&route), "/admin/permissions/databases/1/schemas");

    let grid = e.grid(&GridScope::Schemas { database: 1 }).unwrap();
    assert_eq!(grid.rows.len(), 2);
}

#[test]
fn custom_route_base() {
    let config = EditorConfig::from_json(r#"{"route_base": "/settings/access"}"#).unwrap();
    let e = setup_with(config);
    assert_eq!(e.route_path(&Route::Databases), "/settings/access/databases");
}

#[test]
fn cancel_restores_original() {
    let mut e = setup();
    e.update(2, &sample(), Level::Schemas, Access::None).unwrap();
    e.record_save_error("timeout");
    e.cancel();
    assert!(!e.is_dirty());
    assert_eq!(e.save_error(), None);
}

#[test]
fn diff_reflects_pending_edits() {
    let mut e = setup();
    let t = EntityId::Table { database: 1, schema: "public".into(), table: 2 };
    e.update(2, &t, Level::Fields, Access::None).unwrap();
    let d = e.diff();
    assert_eq!(d.summary(), vec!["All Users will be denied access to 1 table in Sample.".to_string()]);
}

#[test]
fn save_then_commit_replaces_both_snapshots() {
    let mut e = setup();
    e.update(3, &sample(), Level::Schemas, Access::All).unwrap();
    let payload = e.prepare_save().unwrap().clone();

    // the server echoes back what it stored
    let reloaded = PermissionsState::from_json(&payload.to_json().unwrap()).unwrap();
    e.commit(reloaded).unwrap();
    assert!(!e.is_dirty());
    assert_eq!(schemas_access(e.original(), 3, 1), Access::All);
}

#[test]
fn save_error_is_kept_until_commit() {
    let mut e = setup();
    e.update(3, &sample(), Level::Schemas, Access::All).unwrap();
    e.record_save_error("conflict");
    assert_eq!(e.save_error(), Some("conflict"));
    assert!(e.is_dirty());
    let current = e.current().clone();
    e.commit(current).unwrap();
    assert_eq!(e.save_error(), None);
}

#[test]
fn inconsistent_edit_is_stale() {
    // the edit touches a database entry that already holds an illegal field value
    let snapshot = r#"{"2": {"1": {"native": "none", "schemas": {"public": {"1": "read"}}}}}"#;
    let mut e = open(snapshot, EditorConfig::default());
    let audit = EntityId::Schema { database: 1, schema: "audit".into() };
    e.update(2, &audit, Level::Tables, Access::All).unwrap();
    assert!(e.is_dirty());
    assert!(matches!(e.prepare_save(), Err(PermsError::StaleSnapshot(_))));
}

#[test]
fn untouched_inconsistency_does_not_block_save() {
    let snapshot = r#"{"2": {"1": {"native": "read", "schemas": "none"}},
        "3": {"1": {"native": "none", "schemas": "none"}}}"#;
    let mut e = open(snapshot, EditorConfig::default());
    e.update(3, &sample(), Level::Schemas, Access::All).unwrap();
    assert!(e.is_dirty());
    let payload = e.prepare_save().unwrap();
    assert_eq!(schemas_access(payload, 3, 1), Access::All);
    assert_eq!(native_access(payload, 2, 1), Access::Read);
}

#[test]
fn configured_admin_name_replaces_the_default() {
    let config = EditorConfig { admin_group_name: "Root".into(), ..Default::default() };
    let groups = r#"[{"id": 4, "name": "Root"}, {"id": 5, "name": "Administrators"}]"#;
    let mut e = open_with_groups("{}", groups, config);
    assert!(!e.groups()[0].editable);
    assert!(e.groups()[1].editable);
    assert!(matches!(e.update(4, &sample(), Level::Schemas, Access::All), Err(PermsError::ReadOnlyGroup(4))));
    e.update(5, &sample(), Level::Schemas, Access::All).unwrap();
    assert_eq!(schemas_access(e.current(), 5, 1), Access::All);
}

#[test]
fn validate_on_load_rejects_bad_snapshots() {
    let config = EditorConfig { validate_on_load: true, ..Default::default() };
    let snapshot = PermissionsState::from_json(r#"{"2": {"1": {"native": "read", "schemas": "none"}}}"#).unwrap();
    let r = PermissionsEditor::new(Topology::default(), vec![], snapshot, config);
    assert!(matches!(r, Err(PermsError::Inconsistent(_))));
}

#[test]
fn admin_group_flag_is_respected() {
    let e = setup();
    assert!(!e.groups()[0].editable);
    assert!(e.groups()[2].editable);
}
