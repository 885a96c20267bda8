// Host-side tests for the session lifecycle controller, driven through a
// recording platform double.

mod common;

use ar_core::*;
use common::*;
use std::f32::consts::FRAC_PI_2;

#[test]
fn mount_builds_surface_and_probes_support() {
    let mut c = Controller::new(test_config(false), FakePlatform::default()).unwrap();
    assert_eq!(c.phase(), Phase::Idle);
    c.mount().unwrap();
    assert_eq!(c.phase(), Phase::SurfaceReady);
    assert!(c.platform().surface_live);
    assert_eq!(c.platform().cameras, 1);
    assert_eq!(c.platform().probes, vec!["immersive-ar".to_string()]);
    assert!(c.platform().live_listeners.is_empty());
    assert!(c.mount().is_err(), "second mount must be rejected");
}

#[test]
fn mount_failure_releases_partial_surface_and_stays_idle() {
    let platform = FakePlatform {
        fail_surface: true,
        ..FakePlatform::default()
    };
    let mut c = Controller::new(test_config(false), platform).unwrap();
    let err = c.mount().unwrap_err();
    assert!(matches!(err, ViewerError::Surface(_)));
    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(c.platform().surface_disposals, 1);
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let config = ViewerConfig {
        min_scale: 0.0,
        ..test_config(false)
    };
    assert!(matches!(
        Controller::new(config, FakePlatform::default()),
        Err(ViewerError::Config(_))
    ));
}

#[test]
fn start_requests_one_session_with_configured_mode() {
    let mut c = mounted(test_config(false));
    c.handle(ViewerEvent::StartRequested).unwrap();
    assert_eq!(c.phase(), Phase::SessionStarting);
    let (mode, space, _) = &c.platform().session_requests[0];
    assert_eq!(mode, "immersive-ar");
    assert_eq!(space, "local-floor");

    // A second click while negotiating is rejected, not re-requested.
    let err = c.handle(ViewerEvent::StartRequested).unwrap_err();
    assert!(matches!(err, ViewerError::InvalidTransition { .. }));
    assert_eq!(c.platform().session_requests.len(), 1);
}

#[test]
fn grant_attaches_full_listener_set_and_render_tick() {
    let (c, session) = active(test_config(false));
    assert_eq!(c.phase(), Phase::SessionActive);
    assert_eq!(c.state().session, Some(session));
    assert!(c.platform().tick_live);
    assert_eq!(
        sorted(c.platform().live_kinds()),
        sorted(ListenerKind::SESSION.to_vec())
    );
    assert_eq!(sorted(c.attached_listeners()), sorted(ListenerKind::SESSION.to_vec()));
}

#[test]
fn start_is_refused_when_immersive_mode_is_unsupported() {
    let mut c = Controller::new(test_config(false), FakePlatform::default()).unwrap();
    c.mount().unwrap();
    c.handle(ViewerEvent::SessionSupport(false)).unwrap();
    let err = c.handle(ViewerEvent::StartRequested).unwrap_err();
    assert_eq!(err, ViewerError::SessionUnsupported);
    assert_eq!(c.phase(), Phase::SurfaceReady);
    assert!(c.platform().session_requests.is_empty());
}

#[test]
fn failed_request_returns_to_surface_ready_and_allows_retry() {
    let mut c = mounted(test_config(false));
    c.handle(ViewerEvent::StartRequested).unwrap();
    let ticket = c.platform().last_session_ticket();
    let err = c
        .handle(ViewerEvent::SessionFailed {
            ticket,
            error: ViewerError::SessionRequestFailed("denied".into()),
        })
        .unwrap_err();
    assert!(matches!(err, ViewerError::SessionRequestFailed(_)));
    assert_eq!(c.phase(), Phase::SurfaceReady);
    assert!(c.state().session.is_none());
    assert!(c.platform().live_listeners.is_empty());

    let session = grant_new_session(&mut c, 41);
    assert_eq!(c.phase(), Phase::SessionActive);
    assert_eq!(c.state().session, Some(session));
    assert_eq!(c.platform().session_requests.len(), 2);
}

#[test]
fn unsupported_failure_blocks_later_attempts() {
    let mut c = mounted(test_config(false));
    c.handle(ViewerEvent::StartRequested).unwrap();
    let ticket = c.platform().last_session_ticket();
    let _ = c.handle(ViewerEvent::SessionFailed {
        ticket,
        error: ViewerError::SessionUnsupported,
    });
    assert_eq!(c.state().session_supported, Some(false));
    assert_eq!(
        c.handle(ViewerEvent::StartRequested).unwrap_err(),
        ViewerError::SessionUnsupported
    );
}

#[test]
fn stale_grant_is_rejected_and_its_session_ended() {
    let mut c = mounted(test_config(false));
    c.handle(ViewerEvent::StartRequested).unwrap();
    let ticket = c.platform().last_session_ticket();
    let stale = SessionTicket {
        seq: ticket.seq + 10,
        ..ticket
    };
    let err = c
        .handle(ViewerEvent::SessionGranted {
            ticket: stale,
            session: SessionHandle(5),
        })
        .unwrap_err();
    assert!(matches!(err, ViewerError::InvalidTransition { .. }));
    assert_eq!(c.platform().ended_sessions, vec![SessionHandle(5)]);
    assert_eq!(c.phase(), Phase::SessionStarting);
}

#[test]
fn listener_failure_rolls_back_and_ends_session() {
    let platform = FakePlatform {
        fail_listen: Some(ListenerKind::TouchCancel),
        ..FakePlatform::default()
    };
    let mut c = Controller::new(test_config(false), platform).unwrap();
    c.mount().unwrap();
    c.handle(ViewerEvent::StartRequested).unwrap();
    let ticket = c.platform().last_session_ticket();
    let session = SessionHandle(12);
    assert!(c
        .handle(ViewerEvent::SessionGranted { ticket, session })
        .is_err());
    assert_eq!(c.phase(), Phase::SurfaceReady);
    assert!(c.platform().live_listeners.is_empty());
    assert_eq!(c.platform().ended_sessions, vec![session]);
    assert!(c.state().session.is_none());
}

#[test]
fn concurrent_load_requests_issue_a_single_import() {
    let (mut c, _) = active(test_config(false));
    c.handle(ViewerEvent::LoadRequested).unwrap();
    c.handle(ViewerEvent::LoadRequested).unwrap();
    assert_eq!(c.state().asset_load_state, AssetLoadState::Loading);
    assert_eq!(c.platform().imports.len(), 1);
    assert_eq!(c.platform().imports[0].0, "https://example.test/model.glb");

    finish_load(&mut c, sample_asset(false));
    c.handle(ViewerEvent::LoadRequested).unwrap();
    assert_eq!(c.platform().imports.len(), 1);
}

#[test]
fn auto_load_starts_import_when_session_is_granted() {
    let (c, _) = active(test_config(true));
    assert_eq!(c.state().asset_load_state, AssetLoadState::Loading);
    assert_eq!(c.platform().imports.len(), 1);
}

#[test]
fn load_outside_active_session_is_rejected() {
    let mut c = mounted(test_config(false));
    let err = c.handle(ViewerEvent::LoadRequested).unwrap_err();
    assert!(matches!(
        err,
        ViewerError::InvalidTransition {
            phase: Phase::SurfaceReady,
            ..
        }
    ));
    assert!(c.platform().imports.is_empty());
}

#[test]
fn successful_load_applies_defaults_and_loops_animation() {
    let (mut c, _) = active(test_config(false));
    c.handle(ViewerEvent::LoadRequested).unwrap();
    finish_load(&mut c, sample_asset(true));

    assert_eq!(c.state().asset_load_state, AssetLoadState::Loaded);
    assert_eq!(c.state().asset, Some(sample_asset(true)));
    assert_eq!(c.state().current_scale, 0.1);
    assert_eq!(c.state().current_rotation, 0.0);
    assert_eq!(c.platform().animations, vec![(AnimationHandle(3), true)]);
    assert_eq!(
        c.platform().transforms.last(),
        Some(&(NodeHandle(7), Transform::new(0.1, 0.0)))
    );
}

#[test]
fn failed_load_is_recorded_without_retry() {
    let (mut c, _) = active(test_config(true));
    let ticket = c.platform().last_load_ticket();
    let err = c
        .handle(ViewerEvent::AssetLoaded {
            ticket,
            result: Err("404".into()),
        })
        .unwrap_err();
    assert_eq!(err, ViewerError::AssetLoadFailed("404".into()));
    assert_eq!(c.state().asset_load_state, AssetLoadState::Failed);
    assert_eq!(c.phase(), Phase::SessionActive);
    assert_eq!(c.platform().imports.len(), 1);

    // Surface keeps rendering.
    assert!(c.on_render_tick());

    // A manual request may try again.
    c.handle(ViewerEvent::LoadRequested).unwrap();
    assert_eq!(c.platform().imports.len(), 2);
}

#[test]
fn session_end_keeps_asset_and_restart_does_not_reload() {
    let (mut c, session) = active(test_config(true));
    finish_load(&mut c, sample_asset(false));

    c.handle(ViewerEvent::SessionEnded { session }).unwrap();
    assert_eq!(c.phase(), Phase::SurfaceReady);
    assert!(c.state().session.is_none());
    assert_eq!(c.state().asset_load_state, AssetLoadState::Loaded);
    assert!(c.state().asset.is_some());
    assert!(c.platform().surface_live);
    assert!(c.platform().live_listeners.is_empty());

    grant_new_session(&mut c, 901);
    assert_eq!(c.phase(), Phase::SessionActive);
    assert_eq!(c.platform().imports.len(), 1);
    assert_eq!(c.platform().tick_registrations, 1);
}

#[test]
fn asset_completing_after_session_end_is_kept() {
    let (mut c, session) = active(test_config(true));
    c.handle(ViewerEvent::SessionEnded { session }).unwrap();
    finish_load(&mut c, sample_asset(false));
    assert_eq!(c.state().asset_load_state, AssetLoadState::Loaded);

    grant_new_session(&mut c, 77);
    assert_eq!(c.platform().imports.len(), 1);
}

#[test]
fn listeners_are_symmetric_when_session_ends_abruptly() {
    let (mut c, session) = active(test_config(false));
    c.handle(ViewerEvent::SessionEnded { session }).unwrap();
    let p = c.platform();
    assert_eq!(sorted(p.attached_kinds.clone()), sorted(p.detached_kinds.clone()));
    assert_eq!(p.unknown_removals, 0);
}

#[test]
fn listeners_are_symmetric_on_explicit_exit() {
    let (mut c, session) = active(test_config(false));
    c.handle(ViewerEvent::ExitRequested).unwrap();
    assert_eq!(c.phase(), Phase::SessionEnding);
    assert_eq!(c.platform().ended_sessions, vec![session]);
    // Only the session-exit subscription survives until the runtime confirms.
    assert_eq!(c.platform().live_kinds(), vec![ListenerKind::SessionExit]);

    c.handle(ViewerEvent::SessionEnded { session }).unwrap();
    assert_eq!(c.phase(), Phase::SurfaceReady);
    let p = c.platform();
    assert_eq!(sorted(p.attached_kinds.clone()), sorted(p.detached_kinds.clone()));
    assert_eq!(p.unknown_removals, 0);
}

#[test]
fn listeners_are_symmetric_on_unmount_during_session() {
    let (mut c, session) = active(test_config(false));
    c.handle(ViewerEvent::Unmount).unwrap();
    assert_eq!(c.phase(), Phase::Disposed);
    let p = c.platform();
    assert!(p.live_listeners.is_empty());
    assert_eq!(sorted(p.attached_kinds.clone()), sorted(p.detached_kinds.clone()));
    assert_eq!(p.ended_sessions, vec![session]);
    assert!(!p.surface_live);
    assert!(!p.tick_live);
}

#[test]
fn listeners_are_symmetric_on_unmount_while_ending() {
    let (mut c, _) = active(test_config(false));
    c.handle(ViewerEvent::ExitRequested).unwrap();
    c.dispose();
    let p = c.platform();
    assert!(p.live_listeners.is_empty());
    assert_eq!(sorted(p.attached_kinds.clone()), sorted(p.detached_kinds.clone()));
}

#[test]
fn dispose_twice_is_a_quiet_no_op() {
    let (mut c, _) = active(test_config(false));
    c.dispose();
    let detached = c.platform().detached_kinds.len();
    let ended = c.platform().ended_sessions.len();
    c.dispose();
    c.handle(ViewerEvent::Unmount).unwrap();
    let p = c.platform();
    assert_eq!(p.detached_kinds.len(), detached);
    assert_eq!(p.ended_sessions.len(), ended);
    assert_eq!(p.surface_disposals, 1);
    assert_eq!(p.unknown_removals, 0);
}

#[test]
fn dispose_from_idle_does_not_touch_the_surface() {
    let mut c = Controller::new(test_config(false), FakePlatform::default()).unwrap();
    c.dispose();
    assert_eq!(c.phase(), Phase::Disposed);
    assert_eq!(c.platform().surface_disposals, 0);
}

#[test]
fn late_asset_completion_after_dispose_is_discarded() {
    let (mut c, _) = active(test_config(true));
    let ticket = c.platform().last_load_ticket();
    c.dispose();
    let err = c
        .handle(ViewerEvent::AssetLoaded {
            ticket,
            result: Ok(sample_asset(true)),
        })
        .unwrap_err();
    assert_eq!(err, ViewerError::DisposalRace);
    assert_eq!(c.phase(), Phase::Disposed);
    assert!(c.state().asset.is_none());
    assert!(c.platform().animations.is_empty());
    assert!(c.platform().transforms.is_empty());
}

#[test]
fn late_grant_after_dispose_ends_the_orphaned_session() {
    let mut c = mounted(test_config(false));
    c.handle(ViewerEvent::StartRequested).unwrap();
    let ticket = c.platform().last_session_ticket();
    c.dispose();
    let err = c
        .handle(ViewerEvent::SessionGranted {
            ticket,
            session: SessionHandle(33),
        })
        .unwrap_err();
    assert_eq!(err, ViewerError::DisposalRace);
    assert_eq!(c.phase(), Phase::Disposed);
    assert!(c.state().session.is_none());
    assert_eq!(c.platform().ended_sessions, vec![SessionHandle(33)]);
    assert!(c.platform().live_listeners.is_empty());
}

#[test]
fn request_abandoned_by_platform_after_dispose_is_discarded() {
    // A platform that exits a late session itself reports the request as
    // failed; the controller must not try to end anything.
    let mut c = mounted(test_config(false));
    c.handle(ViewerEvent::StartRequested).unwrap();
    let ticket = c.platform().last_session_ticket();
    c.dispose();
    let err = c
        .handle(ViewerEvent::SessionFailed {
            ticket,
            error: ViewerError::DisposalRace,
        })
        .unwrap_err();
    assert_eq!(err, ViewerError::DisposalRace);
    assert_eq!(c.phase(), Phase::Disposed);
    assert!(c.platform().ended_sessions.is_empty());
    assert_eq!(c.platform().surface_disposals, 1);
}

#[test]
fn render_tick_stops_after_dispose() {
    let (mut c, _) = active(test_config(false));
    assert!(c.on_render_tick());
    assert!(c.on_render_tick());
    assert_eq!(c.platform().frames, 2);
    c.dispose();
    assert!(!c.on_render_tick());
    assert_eq!(c.platform().frames, 2);
}

#[test]
fn resize_forwards_to_engine_only_while_surface_exists() {
    let mut c = Controller::new(test_config(false), FakePlatform::default()).unwrap();
    c.handle(ViewerEvent::Resize).unwrap();
    assert_eq!(c.platform().resizes, 0);
    c.mount().unwrap();
    c.handle(ViewerEvent::Resize).unwrap();
    assert_eq!(c.platform().resizes, 1);
}

#[test]
fn pinch_through_controller_commits_on_touch_end() {
    let config = ViewerConfig {
        initial_scale: 0.05,
        ..test_config(true)
    };
    let (mut c, _) = active(config);
    finish_load(&mut c, sample_asset(false));
    assert_eq!(c.state().current_scale, 0.05);

    c.handle(touches(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
    c.handle(touches(&[(0.0, 0.0), (150.0, 0.0)])).unwrap();
    let shown = c.platform().last_transform().unwrap();
    assert!((shown.scale - 0.075).abs() < 1e-6);
    // Not committed until the gesture ends.
    assert_eq!(c.state().current_scale, 0.05);

    c.handle(ViewerEvent::TouchEnd).unwrap();
    assert!((c.state().current_scale - 0.075).abs() < 1e-6);
}

#[test]
fn twist_through_controller_adds_to_committed_rotation() {
    let (mut c, _) = active(test_config(true));
    finish_load(&mut c, sample_asset(false));
    c.handle(touches(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
    c.handle(touches(&[(0.0, 0.0), (0.0, 100.0)])).unwrap();
    c.handle(ViewerEvent::TouchEnd).unwrap();
    assert!((c.state().current_rotation - FRAC_PI_2).abs() < 1e-5);
}

#[test]
fn touch_end_without_a_gesture_changes_nothing() {
    let (mut c, _) = active(test_config(true));
    finish_load(&mut c, sample_asset(false));
    let before = c.state().committed();
    let applied = c.platform().transforms.len();
    c.handle(ViewerEvent::TouchEnd).unwrap();
    assert_eq!(c.state().committed(), before);
    assert_eq!(c.platform().transforms.len(), applied);
}

#[test]
fn gestures_before_load_touch_no_target() {
    let (mut c, _) = active(test_config(false));
    c.handle(touches(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
    c.handle(touches(&[(0.0, 0.0), (200.0, 0.0)])).unwrap();
    assert!(c.platform().transforms.is_empty());
    assert!((c.displayed_transform().scale - 0.2).abs() < 1e-6);

    c.handle(ViewerEvent::TouchEnd).unwrap();
    assert_eq!(c.state().current_scale, 0.1);
    assert_eq!(c.state().current_rotation, 0.0);
    assert_eq!(c.displayed_transform(), Transform::new(0.1, 0.0));
}

#[test]
fn gestures_after_failed_load_commit_nothing() {
    let (mut c, _) = active(test_config(true));
    let ticket = c.platform().last_load_ticket();
    let _ = c.handle(ViewerEvent::AssetLoaded {
        ticket,
        result: Err("404".into()),
    });
    assert_eq!(c.state().asset_load_state, AssetLoadState::Failed);
    c.handle(touches(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
    c.handle(touches(&[(0.0, 100.0), (0.0, 0.0)])).unwrap();
    c.handle(ViewerEvent::TouchCancel).unwrap();
    assert_eq!(c.state().current_scale, 0.1);
    assert_eq!(c.state().current_rotation, 0.0);
}

#[test]
fn touch_cancel_commits_like_touch_end() {
    let (mut c, _) = active(test_config(true));
    finish_load(&mut c, sample_asset(false));
    c.handle(touches(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
    c.handle(touches(&[(0.0, 0.0), (150.0, 0.0)])).unwrap();
    c.handle(ViewerEvent::TouchCancel).unwrap();
    assert!((c.state().current_scale - 0.15).abs() < 1e-6);
    assert_eq!(c.displayed_transform().scale, c.state().current_scale);

    // The next gesture composes on the committed value.
    c.handle(touches(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
    c.handle(touches(&[(0.0, 0.0), (200.0, 0.0)])).unwrap();
    let last = c.platform().last_transform().unwrap();
    assert!((last.scale - 0.3).abs() < 1e-6);
}

#[test]
fn session_end_mid_gesture_discards_the_live_value() {
    let (mut c, session) = active(test_config(true));
    finish_load(&mut c, sample_asset(false));
    c.handle(touches(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
    c.handle(touches(&[(0.0, 0.0), (300.0, 0.0)])).unwrap();
    c.handle(ViewerEvent::SessionEnded { session }).unwrap();
    c.handle(ViewerEvent::TouchEnd).unwrap();
    assert_eq!(c.state().current_scale, 0.1);
    assert_eq!(c.displayed_transform(), Transform::new(0.1, 0.0));
}

#[test]
fn touches_outside_an_active_session_are_ignored() {
    let mut c = mounted(test_config(false));
    c.handle(touches(&[(0.0, 0.0), (100.0, 0.0)])).unwrap();
    c.handle(touches(&[(0.0, 0.0), (200.0, 0.0)])).unwrap();
    c.handle(ViewerEvent::TouchEnd).unwrap();
    assert_eq!(c.state().current_scale, 0.1);
}
