//! Integration tests for the skill repository.
//!
//! These walk through the install / connect / disconnect / remove cycle the
//! way orchestration code drives it, and check the ordering and integrity
//! guarantees callers rely on.

use std::sync::Arc;

use skilld_core::utils::{LogLevel, RepositoryConfig};
use skilld_core::{ConfigError, Error};
use skilld_repository::{
    EntityKind, ErrorClass, ErrorKind, Operation, Repository, Skill, SkillKey, Slot, SlotKey,
    TestType,
};

fn net_repository() -> Repository {
    let repo = Repository::new();
    repo.add_type(Arc::new(TestType::new("net"))).unwrap();
    repo
}

fn keys<T>(items: &[Arc<T>], key: impl Fn(&T) -> String) -> Vec<String> {
    items.iter().map(|item| key(&**item)).collect()
}

#[test]
fn test_connect_disconnect_scenario() {
    let repo = net_repository();
    repo.add_skill(Skill::new("app1", "iface", "net")).unwrap();
    repo.add_slot(Slot::new("app2", "uplink", "net")).unwrap();

    repo.grant("app1", "iface", "app2", "uplink").unwrap();

    let granted = repo.granted_to("app2");
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0].0.key(), SlotKey::new("app2", "uplink"));
    assert_eq!(
        keys(&granted[0].1, |s| s.key().to_string()),
        vec!["app1:iface"]
    );

    let err = repo.grant("app1", "iface", "app2", "uplink").unwrap_err();
    assert_eq!(err.op, Operation::Grant);
    assert_eq!(
        err.kind,
        ErrorKind::AlreadyGranted {
            skill: SkillKey::new("app1", "iface"),
            slot: SlotKey::new("app2", "uplink"),
        }
    );

    let err = repo.remove_skill("app1", "iface").unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::InUse {
            entity: EntityKind::Skill,
            ..
        }
    ));

    repo.revoke("app1", "iface", "app2", "uplink").unwrap();
    repo.remove_skill("app1", "iface").unwrap();
    assert!(repo.skill("app1", "iface").is_none());
    assert!(repo.check_integrity());
}

#[test]
fn test_added_skill_is_returned_unchanged() {
    let repo = net_repository();
    let skill = Skill::new("app1", "iface", "net")
        .with_label("Network interface")
        .with_attr("mtu", 1500)
        .with_app("daemon");
    repo.add_skill(skill.clone()).unwrap();

    assert_eq!(*repo.skill("app1", "iface").unwrap(), skill);
    assert_eq!(repo.skills("app1").len(), 1);
}

#[test]
fn test_name_conflict_survives_interleaved_operations() {
    let repo = net_repository();
    repo.add_skill(Skill::new("app1", "iface", "net")).unwrap();

    repo.add_slot(Slot::new("app2", "uplink", "net")).unwrap();
    repo.grant("app1", "iface", "app2", "uplink").unwrap();
    repo.add_skill(Skill::new("app1", "other", "net")).unwrap();
    repo.revoke("app1", "iface", "app2", "uplink").unwrap();

    let err = repo.add_skill(Skill::new("app1", "iface", "net")).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);
    assert_eq!(
        err.to_string(),
        r#"cannot add skill, skill name "iface" is in use"#
    );
}

#[test]
fn test_grant_revoke_round_trip() {
    let repo = net_repository();
    repo.add_skill(Skill::new("app1", "iface", "net")).unwrap();
    repo.add_skill(Skill::new("app1", "lo", "net")).unwrap();
    repo.add_slot(Slot::new("app2", "uplink", "net")).unwrap();
    repo.grant("app1", "lo", "app2", "uplink").unwrap();

    let to_before = repo.granted_to("app2");
    let by_before = repo.granted_by("app1");

    repo.grant("app1", "iface", "app2", "uplink").unwrap();
    assert_eq!(repo.grant_count(), 2);
    repo.revoke("app1", "iface", "app2", "uplink").unwrap();

    assert_eq!(repo.granted_to("app2"), to_before);
    assert_eq!(repo.granted_by("app1"), by_before);
    assert_eq!(repo.grant_count(), 1);
    assert!(repo.check_integrity());
}

#[test]
fn test_remove_skill_after_revoking_every_grant() {
    let repo = net_repository();
    repo.add_skill(Skill::new("app1", "iface", "net")).unwrap();
    for consumer in ["app2", "app3", "app4"] {
        repo.add_slot(Slot::new(consumer, "uplink", "net")).unwrap();
        repo.grant("app1", "iface", consumer, "uplink").unwrap();
    }

    let by = repo.granted_by("app1");
    assert_eq!(
        keys(&by[0].1, |s| s.key().to_string()),
        vec!["app2:uplink", "app3:uplink", "app4:uplink"]
    );

    for consumer in ["app2", "app3", "app4"] {
        let err = repo.remove_skill("app1", "iface").unwrap_err();
        assert_eq!(err.class(), ErrorClass::Integrity);
        repo.revoke("app1", "iface", consumer, "uplink").unwrap();
    }
    repo.remove_skill("app1", "iface").unwrap();
}

#[test]
fn test_type_mismatch_never_mutates() {
    let repo = net_repository();
    repo.add_type(Arc::new(TestType::new("tty"))).unwrap();
    repo.add_skill(Skill::new("app1", "iface", "net")).unwrap();
    repo.add_slot(Slot::new("app2", "port", "tty")).unwrap();

    let err = repo.grant("app1", "iface", "app2", "port").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert!(repo.granted_to("app2").is_empty());
    assert!(repo.granted_by("app1").is_empty());
    assert_eq!(repo.grant_count(), 0);
    repo.remove_slot("app2", "port").unwrap();
}

#[test]
fn test_listings_sorted_by_snap_then_name() {
    let repo = net_repository();
    for (snap, name) in [("b", "x"), ("a", "y"), ("a-b", "z"), ("a", "x"), ("a1", "a")] {
        repo.add_skill(Skill::new(snap, name, "net")).unwrap();
        repo.add_slot(Slot::new(snap, name, "net")).unwrap();
    }
    let expected = vec!["a:x", "a:y", "a-b:z", "a1:a", "b:x"];

    assert_eq!(
        keys(&repo.all_skills(""), |s| s.key().to_string()),
        expected
    );
    assert_eq!(
        keys(&repo.all_slots("net"), |s| s.key().to_string()),
        expected
    );
    assert!(repo.all_slots("tty").is_empty());
    assert_eq!(keys(&repo.slots("a"), |s| s.name.clone()), vec!["x", "y"]);
}

#[test]
fn test_grant_projections_sorted() {
    let repo = net_repository();
    for name in ["c", "a", "b"] {
        repo.add_skill(Skill::new("provider", name, "net")).unwrap();
        repo.add_skill(Skill::new("alt", name, "net")).unwrap();
    }
    for name in ["z", "y"] {
        repo.add_slot(Slot::new("consumer", name, "net")).unwrap();
    }
    repo.add_slot(Slot::new("consumer", "idle", "net")).unwrap();

    repo.grant("provider", "c", "consumer", "z").unwrap();
    repo.grant("provider", "a", "consumer", "z").unwrap();
    repo.grant("alt", "b", "consumer", "z").unwrap();
    repo.grant("provider", "b", "consumer", "y").unwrap();

    let granted = repo.granted_to("consumer");
    let slots: Vec<String> = granted.iter().map(|(slot, _)| slot.name.clone()).collect();
    assert_eq!(slots, vec!["y", "z"], "slots without grants are omitted");
    assert_eq!(
        keys(&granted[1].1, |s| s.key().to_string()),
        vec!["alt:b", "provider:a", "provider:c"]
    );

    let by = repo.granted_by("provider");
    let skills: Vec<String> = by.iter().map(|(skill, _)| skill.name.clone()).collect();
    assert_eq!(skills, vec!["a", "b", "c"]);
    assert!(repo.granted_to("nobody").is_empty());
}

#[test]
fn test_self_grant_within_one_snap() {
    let repo = net_repository();
    repo.add_skill(Skill::new("app", "loop", "net")).unwrap();
    repo.add_slot(Slot::new("app", "loop", "net")).unwrap();
    repo.grant("app", "loop", "app", "loop").unwrap();
    assert_eq!(repo.granted_to("app").len(), 1);
    assert_eq!(repo.granted_by("app").len(), 1);
}

#[test]
fn test_skill_type_sanitizes_attrs() {
    let repo = Repository::new();
    let tty = TestType::new("tty").with_sanitizer(|skill| {
        match skill.attrs.get("path").and_then(|v| v.as_str()) {
            Some(path) if path.starts_with("/dev/") => Ok(()),
            Some(path) => Err(format!("{path} is not a device")),
            None => Err("path is required".to_string()),
        }
    });
    repo.add_type(Arc::new(tty)).unwrap();

    repo.add_skill(Skill::new("serial", "port", "tty").with_attr("path", "/dev/ttyS0"))
        .unwrap();
    let err = repo
        .add_skill(Skill::new("serial", "other", "tty").with_attr("path", "/etc/passwd"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"cannot add skill, skill serial:other rejected by type "tty": /etc/passwd is not a device"#
    );
    assert_eq!(repo.all_skills("tty").len(), 1);
}

#[test]
fn test_with_config() {
    let config = RepositoryConfig::default()
        .with_lock_name("skills")
        .with_mutation_log_level(LogLevel::Info);
    let repo = Repository::with_config(config.clone()).unwrap();
    repo.add_type(Arc::new(TestType::new("net"))).unwrap();
    assert_eq!(repo.config(), &config);
    assert_eq!(repo.types(), vec!["net".to_string()]);
    assert!(repo.lock_stats().acquisition_count >= 2);
}

#[test]
fn test_from_config_file() -> skilld_core::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repository.toml");
    std::fs::write(&path, "lock_name = \"skills\"\nmutation_log_level = \"info\"\n").unwrap();

    let repo = Repository::from_config_file(&path)?;
    assert_eq!(repo.config().lock_name, "skills");
    assert_eq!(repo.config().mutation_log_level, LogLevel::Info);

    repo.add_type(Arc::new(TestType::new("net")))?;
    repo.add_skill(Skill::new("app1", "iface", "net"))?;
    repo.add_slot(Slot::new("app2", "uplink", "net"))?;
    repo.grant("app1", "iface", "app2", "uplink")?;
    assert_eq!(repo.grant_count(), 1);
    Ok(())
}

#[test]
fn test_from_config_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = Repository::from_config_file(dir.path().join("missing.toml"));
    assert!(matches!(
        missing,
        Err(Error::Config(ConfigError::Io { .. }))
    ));

    let path = dir.path().join("empty-name.toml");
    std::fs::write(&path, "lock_name = \"\"\n").unwrap();
    assert!(matches!(
        Repository::from_config_file(&path),
        Err(Error::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn test_repository_errors_convert_to_root_error() {
    let repo = net_repository();
    let run = || -> skilld_core::Result<()> {
        repo.add_skill(Skill::new("app1", "iface", "net"))?;
        repo.add_skill(Skill::new("app1", "iface", "net"))?;
        Ok(())
    };
    match run() {
        Err(Error::Repository(err)) => assert_eq!(err.class(), ErrorClass::Conflict),
        other => panic!("expected a repository error, got {other:?}"),
    }
}
