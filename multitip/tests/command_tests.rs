//! Command flow tests.
//!
//! Runs the `allocate`, `snapshot` and `demo` flows against state files in
//! temporary directories.

use multitip::drivers::builtin_registry;
use multitip::drivers::simulation::PipetteAction;
use multitip::{CommandError, RackError, Session, WrapperError};
use multitip_common::config::MultitipConfig;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn allocate_with_state_override_continues_across_sessions() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("rack.bin");
    let registry = builtin_registry();

    let first = Session::new(MultitipConfig::default(), dir.path(), Some(state.clone()));
    assert_eq!(first.allocate(&registry, 4).unwrap().well.to_string(), "E1");
    assert!(state.exists());

    let second = Session::new(MultitipConfig::default(), dir.path(), Some(state.clone()));
    assert_eq!(second.allocate(&registry, 4).unwrap().well.to_string(), "A1");

    let reader = Session::new(MultitipConfig::default(), dir.path(), Some(state));
    let snapshot = reader.snapshot().unwrap();
    assert_eq!(snapshot.consumed().count(), 8);
    assert_eq!(snapshot.available_count(), 88);
}

#[test]
fn configured_state_file_is_relative_to_config_dir() {
    let dir = tempdir().unwrap();
    let mut config = MultitipConfig::default();
    config.pipette.state_file = Some(PathBuf::from("state/rack.bin"));

    let session = Session::new(config, dir.path(), None);
    let expected = dir.path().join("state/rack.bin");
    assert_eq!(session.state_file(), Some(expected.as_path()));

    session.allocate(&builtin_registry(), 1).unwrap();
    assert!(expected.exists());
    assert_eq!(session.snapshot().unwrap().consumed().count(), 1);
}

#[test]
fn state_override_wins_over_configured_file() {
    let dir = tempdir().unwrap();
    let mut config = MultitipConfig::default();
    config.pipette.state_file = Some(PathBuf::from("configured.bin"));
    let cli_state = dir.path().join("cli.bin");

    let session = Session::new(config, dir.path(), Some(cli_state.clone()));
    session.allocate(&builtin_registry(), 2).unwrap();

    assert!(cli_state.exists());
    assert!(!dir.path().join("configured.bin").exists());
}

#[test]
fn without_state_file_every_session_starts_fresh() {
    let dir = tempdir().unwrap();
    let registry = builtin_registry();

    let session = Session::new(MultitipConfig::default(), dir.path(), None);
    assert_eq!(session.state_file(), None);
    assert_eq!(session.allocate(&registry, 1).unwrap().well.to_string(), "H1");
    assert_eq!(session.allocate(&registry, 1).unwrap().well.to_string(), "H1");
    assert_eq!(session.snapshot().unwrap().consumed().count(), 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn rejected_allocation_writes_no_state() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("rack.bin");

    let session = Session::new(MultitipConfig::default(), dir.path(), Some(state.clone()));
    assert!(matches!(
        session.allocate(&builtin_registry(), 9),
        Err(CommandError::Wrapper(WrapperError::Rack(RackError::InvalidRequest { .. })))
    ));
    assert!(!state.exists());
}

#[test]
fn demo_drives_the_simulated_head_and_saves_the_rack() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("rack.bin");

    let session = Session::new(MultitipConfig::default(), dir.path(), Some(state.clone()));
    let report = session.demo(&[1, 4, 8]).unwrap();

    // Home, then pick up / aspirate / dispense / drop per entry.
    assert_eq!(report.actions.len(), 13);
    assert_eq!(report.actions[0], PipetteAction::Home);
    let picked: Vec<u8> = report
        .actions
        .iter()
        .filter_map(|action| match action {
            PipetteAction::PickUpTip { tips, .. } => Some(*tips),
            _ => None,
        })
        .collect();
    assert_eq!(picked, vec![1, 4, 8]);
    assert_eq!(report.rack.consumed().count(), 13);

    let reader = Session::new(MultitipConfig::default(), dir.path(), Some(state));
    assert_eq!(reader.snapshot().unwrap(), report.rack);
}

#[test]
fn failed_demo_still_saves_tips_taken() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("rack.bin");

    let session = Session::new(MultitipConfig::default(), dir.path(), Some(state));
    assert!(matches!(
        session.demo(&[8; 13]),
        Err(CommandError::Wrapper(WrapperError::Rack(RackError::OutOfTips { requested: 8 })))
    ));

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.available_count(), 0);
}
