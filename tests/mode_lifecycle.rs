mod common;

use common::{init_logger, TestHost};
use geodraw::mode::{MapHost, ModeRegistration};
use geodraw::modes::{PointMode, StaticMode};
use geodraw::store::StoreOptions;
use geodraw::{EventBus, FeatureStore, Mode, ModeError, ModeState};
use std::rc::Rc;

fn registration(host: &Rc<TestHost>) -> ModeRegistration {
    let host: Rc<dyn MapHost> = host.clone();
    ModeRegistration {
        store: FeatureStore::shared(StoreOptions::default()),
        host,
        events: Rc::new(EventBus::new()),
        coordinate_precision: 9,
    }
}

#[test]
fn test_start_before_register_fails_without_side_effects() {
    init_logger();
    let mut mode = PointMode::default();

    let result = mode.start();
    assert!(matches!(result, Err(ModeError::InvalidStateTransition { .. })));
    assert_eq!(mode.state(), ModeState::Unregistered);
}

#[test]
fn test_full_lifecycle() {
    init_logger();
    let host = TestHost::new();
    let mut mode = PointMode::default();

    mode.register(registration(&host)).unwrap();
    assert_eq!(mode.state(), ModeState::Registered);

    mode.start().unwrap();
    assert_eq!(mode.state(), ModeState::Started);
    assert!(!host.double_click_zoom.get());

    mode.stop().unwrap();
    assert_eq!(mode.state(), ModeState::Stopped);
    assert!(host.double_click_zoom.get());

    // A stopped mode can be started again
    mode.start().unwrap();
    assert_eq!(mode.state(), ModeState::Started);
}

#[test]
fn test_register_twice_fails() {
    init_logger();
    let host = TestHost::new();
    let mut mode = StaticMode::new();
    mode.register(registration(&host)).unwrap();

    let result = mode.register(registration(&host));
    assert_eq!(
        result,
        Err(ModeError::InvalidStateTransition {
            mode: "static".to_string(),
            from: "registered",
            to: "registered",
        })
    );
    assert_eq!(mode.state(), ModeState::Registered);
}

#[test]
fn test_stop_before_start_keeps_host_untouched() {
    init_logger();
    let host = TestHost::new();
    host.double_click_zoom.set(false);
    let mut mode = PointMode::default();
    mode.register(registration(&host)).unwrap();

    assert!(mode.stop().is_err());
    assert_eq!(mode.state(), ModeState::Registered);
    // the failed transition must not have re-enabled double click zoom
    assert!(!host.double_click_zoom.get());
}

#[test]
fn test_direct_state_assignment_is_refused() {
    let mut mode = StaticMode::new();
    let result = mode.core_mut().set_state(ModeState::Started);
    assert_eq!(result, Err(ModeError::DirectStateAssignment));
    assert_eq!(mode.state(), ModeState::Unregistered);
}

#[test]
fn test_unregistered_mode_has_no_store() {
    let mode = StaticMode::new();
    assert_eq!(
        mode.core().store().err(),
        Some(ModeError::NotRegistered("static".to_string()))
    );
}
