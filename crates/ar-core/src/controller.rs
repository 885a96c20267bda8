//! Session lifecycle controller.
//!
//! Every trigger enters through [`Controller::handle`] and is checked against
//! the current phase before anything changes. Phase changes themselves go
//! through [`Controller::set_phase`], which rejects edges that are not part of
//! the lifecycle:
//!
//! ```text
//! Idle -> SurfaceReady -> SessionStarting -> SessionActive -> SessionEnding
//!              ^                 |                                  |
//!              +-----------------+----------------------------------+
//! (any) -> Disposed
//! ```

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::gesture::{GestureTracker, Transform};
use crate::listeners::ListenerSet;
use crate::platform::{ListenerKind, Platform};
use crate::state::*;
use glam::{Vec2, Vec3};
use instant::Instant;
use smallvec::SmallVec;

use crate::constants::{CAMERA_POSITION, CAMERA_TARGET, LIGHT_DIRECTION};

/// Touch positions in canvas pixels for one move event.
pub type TouchPoints = SmallVec<[Vec2; 4]>;

/// Triggers delivered to the controller by the UI, the platform and the page.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    SessionSupport(bool),
    StartRequested,
    ExitRequested,
    LoadRequested,
    SessionGranted {
        ticket: SessionTicket,
        session: SessionHandle,
    },
    SessionFailed {
        ticket: SessionTicket,
        error: ViewerError,
    },
    SessionEnded {
        session: SessionHandle,
    },
    AssetLoaded {
        ticket: LoadTicket,
        result: std::result::Result<LoadedAsset, String>,
    },
    TouchMove(TouchPoints),
    TouchEnd,
    TouchCancel,
    Resize,
    Unmount,
}

impl ViewerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ViewerEvent::SessionSupport(_) => "session-support",
            ViewerEvent::StartRequested => "start",
            ViewerEvent::ExitRequested => "exit",
            ViewerEvent::LoadRequested => "load",
            ViewerEvent::SessionGranted { .. } => "session-granted",
            ViewerEvent::SessionFailed { .. } => "session-failed",
            ViewerEvent::SessionEnded { .. } => "session-ended",
            ViewerEvent::AssetLoaded { .. } => "asset-loaded",
            ViewerEvent::TouchMove(_) => "touchmove",
            ViewerEvent::TouchEnd => "touchend",
            ViewerEvent::TouchCancel => "touchcancel",
            ViewerEvent::Resize => "resize",
            ViewerEvent::Unmount => "unmount",
        }
    }
}

fn transition_allowed(from: Phase, to: Phase) -> bool {
    use Phase::*;
    matches!(
        (from, to),
        (Idle, SurfaceReady)
            | (SurfaceReady, SessionStarting)
            | (SessionStarting, SessionActive)
            | (SessionStarting, SurfaceReady)
            | (SessionActive, SessionEnding)
            | (SessionEnding, SurfaceReady)
    ) || (to == Disposed && from != Disposed)
}

pub struct Controller<P: Platform> {
    config: ViewerConfig,
    platform: P,
    state: ViewerState,
    gesture: GestureTracker,
    listeners: ListenerSet,
    generation: u32,
    next_seq: u32,
    pending_session: Option<SessionTicket>,
    pending_load: Option<LoadTicket>,
    load_started_at: Option<Instant>,
    tick_registered: bool,
}

impl<P: Platform> Controller<P> {
    pub fn new(config: ViewerConfig, platform: P) -> Result<Self> {
        config.validate()?;
        let initial = Transform::new(config.initial_scale, config.initial_rotation);
        let limits = config.scale_limits();
        Ok(Self {
            config,
            platform,
            state: ViewerState::new(initial),
            gesture: GestureTracker::new(limits),
            listeners: ListenerSet::default(),
            generation: 0,
            next_seq: 0,
            pending_session: None,
            pending_load: None,
            load_started_at: None,
            tick_registered: false,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Kinds currently subscribed through the input host.
    pub fn attached_listeners(&self) -> Vec<ListenerKind> {
        self.listeners.kinds().collect()
    }

    /// The transform currently shown: the live gesture value if a gesture is
    /// in progress, otherwise the committed one.
    pub fn displayed_transform(&self) -> Transform {
        self.gesture.live().unwrap_or_else(|| self.state.committed())
    }

    fn set_phase(&mut self, to: Phase) -> Result<()> {
        let from = self.state.phase;
        if !transition_allowed(from, to) {
            log::warn!("[session] rejected transition {:?} -> {:?}", from, to);
            return Err(ViewerError::InvalidTransition {
                phase: from,
                trigger: "phase change",
            });
        }
        log::info!("[session] {:?} -> {:?}", from, to);
        self.state.phase = to;
        Ok(())
    }

    fn invalid(&self, trigger: &'static str) -> ViewerError {
        log::warn!("[session] ignoring {} while {:?}", trigger, self.state.phase);
        ViewerError::InvalidTransition {
            phase: self.state.phase,
            trigger,
        }
    }

    fn next_seq(&mut self) -> u32 {
        self.next_seq = self.next_seq.wrapping_add(1);
        self.next_seq
    }

    /// Creates the render surface and default scene, then probes for
    /// immersive support.
    pub fn mount(&mut self) -> Result<()> {
        if self.state.phase != Phase::Idle {
            return Err(self.invalid("mount"));
        }
        let built = self
            .platform
            .create_surface()
            .and_then(|_| self.platform.create_scene())
            .and_then(|_| {
                self.platform.attach_camera(
                    Vec3::from_array(CAMERA_POSITION),
                    Vec3::from_array(CAMERA_TARGET),
                    Vec3::from_array(LIGHT_DIRECTION),
                )
            });
        if let Err(e) = built {
            log::error!("[surface] creation failed: {}", e);
            self.platform.dispose_surface();
            return Err(e);
        }
        self.set_phase(Phase::SurfaceReady)?;
        let mode = self.config.session_mode.clone();
        self.platform.probe_support(&mode);
        Ok(())
    }

    pub fn handle(&mut self, event: ViewerEvent) -> Result<()> {
        log::trace!("[session] event {} in {:?}", event.name(), self.state.phase);
        match event {
            ViewerEvent::SessionSupport(supported) => self.on_support(supported),
            ViewerEvent::StartRequested => self.on_start(),
            ViewerEvent::ExitRequested => self.on_exit(),
            ViewerEvent::LoadRequested => self.on_load_requested(),
            ViewerEvent::SessionGranted { ticket, session } => self.on_granted(ticket, session),
            ViewerEvent::SessionFailed { ticket, error } => self.on_session_failed(ticket, error),
            ViewerEvent::SessionEnded { session } => self.on_session_ended(session),
            ViewerEvent::AssetLoaded { ticket, result } => self.on_asset_loaded(ticket, result),
            ViewerEvent::TouchMove(points) => {
                self.on_touch_move(&points);
                Ok(())
            }
            ViewerEvent::TouchEnd | ViewerEvent::TouchCancel => {
                self.on_touch_end();
                Ok(())
            }
            ViewerEvent::Resize => {
                if matches!(self.state.phase, Phase::Idle | Phase::Disposed) {
                    return Ok(());
                }
                self.platform.resize();
                Ok(())
            }
            ViewerEvent::Unmount => {
                self.dispose();
                Ok(())
            }
        }
    }

    /// One render-loop callback. Returns `false` once the viewer is disposed
    /// so the driver can stop scheduling frames.
    pub fn on_render_tick(&mut self) -> bool {
        match self.state.phase {
            Phase::Disposed => false,
            Phase::Idle => true,
            _ => {
                self.platform.render_frame();
                self.state.frames_rendered += 1;
                true
            }
        }
    }

    fn on_support(&mut self, supported: bool) -> Result<()> {
        if self.state.is_disposed() {
            log::debug!("[session] support answer after dispose discarded");
            return Err(ViewerError::DisposalRace);
        }
        if supported {
            log::info!("[session] {} supported", self.config.session_mode);
        } else {
            log::warn!("[session] {} not supported on this device", self.config.session_mode);
        }
        self.state.session_supported = Some(supported);
        Ok(())
    }

    fn on_start(&mut self) -> Result<()> {
        if self.state.phase != Phase::SurfaceReady {
            return Err(self.invalid("start"));
        }
        if self.state.session_supported == Some(false) {
            log::warn!("[session] start refused: immersive mode unsupported");
            return Err(ViewerError::SessionUnsupported);
        }
        let ticket = SessionTicket {
            generation: self.generation,
            seq: self.next_seq(),
        };
        self.set_phase(Phase::SessionStarting)?;
        self.pending_session = Some(ticket);
        let (mode, space) = (
            self.config.session_mode.clone(),
            self.config.reference_space.clone(),
        );
        self.platform.request_session(&mode, &space, ticket);
        Ok(())
    }

    fn on_granted(&mut self, ticket: SessionTicket, session: SessionHandle) -> Result<()> {
        if self.state.is_disposed() || ticket.generation != self.generation {
            log::debug!("[session] late grant {:?} after dispose; ending it", session);
            self.platform.end_session(session);
            return Err(ViewerError::DisposalRace);
        }
        if self.state.phase != Phase::SessionStarting || self.pending_session != Some(ticket) {
            self.platform.end_session(session);
            return Err(self.invalid("session-granted"));
        }
        self.pending_session = None;
        self.state.session = Some(session);

        if !self.tick_registered {
            if let Err(e) = self.platform.register_render_tick() {
                return self.abandon_session(session, e);
            }
            self.tick_registered = true;
        }
        if let Err(e) =
            self.listeners
                .attach_all(&mut self.platform, &ListenerKind::SESSION, Some(session))
        {
            return self.abandon_session(session, e);
        }
        self.set_phase(Phase::SessionActive)?;

        match self.state.asset_load_state {
            AssetLoadState::Loaded => self.apply_committed(),
            AssetLoadState::NotLoaded if self.config.auto_load => self.begin_load(),
            _ => {}
        }
        Ok(())
    }

    fn abandon_session(&mut self, session: SessionHandle, e: ViewerError) -> Result<()> {
        log::error!("[session] could not activate {:?}: {}", session, e);
        self.platform.end_session(session);
        self.state.session = None;
        self.set_phase(Phase::SurfaceReady)?;
        Err(e)
    }

    fn on_session_failed(&mut self, ticket: SessionTicket, error: ViewerError) -> Result<()> {
        if self.state.is_disposed() || ticket.generation != self.generation {
            log::debug!("[session] late failure after dispose discarded");
            return Err(ViewerError::DisposalRace);
        }
        if self.state.phase != Phase::SessionStarting || self.pending_session != Some(ticket) {
            return Err(self.invalid("session-failed"));
        }
        self.pending_session = None;
        if error == ViewerError::SessionUnsupported {
            self.state.session_supported = Some(false);
        }
        log::error!("[session] request failed: {}", error);
        self.set_phase(Phase::SurfaceReady)?;
        Err(error)
    }

    fn on_exit(&mut self) -> Result<()> {
        if self.state.phase != Phase::SessionActive {
            return Err(self.invalid("exit"));
        }
        self.leave_active();
        self.set_phase(Phase::SessionEnding)?;
        if let Some(session) = self.state.session {
            self.platform.end_session(session);
        }
        Ok(())
    }

    /// Drops gesture input on the way out of an active session. The
    /// session-exit listener stays until the runtime confirms the end.
    fn leave_active(&mut self) {
        self.gesture.on_cancel();
        let removed = self
            .listeners
            .detach_except(&mut self.platform, ListenerKind::SessionExit);
        log::debug!("[listener] detached {} input listeners", removed);
    }

    fn on_session_ended(&mut self, session: SessionHandle) -> Result<()> {
        if self.state.is_disposed() {
            return Err(ViewerError::DisposalRace);
        }
        if self.state.session != Some(session) {
            return Err(self.invalid("session-ended"));
        }
        match self.state.phase {
            Phase::SessionActive => {
                self.leave_active();
                self.set_phase(Phase::SessionEnding)?;
            }
            Phase::SessionEnding => {}
            _ => return Err(self.invalid("session-ended")),
        }
        self.listeners.detach_all(&mut self.platform);
        self.state.session = None;
        self.set_phase(Phase::SurfaceReady)
    }

    fn on_load_requested(&mut self) -> Result<()> {
        if self.state.phase != Phase::SessionActive {
            return Err(self.invalid("load"));
        }
        match self.state.asset_load_state {
            AssetLoadState::Loading | AssetLoadState::Loaded => {
                log::debug!(
                    "[asset] load request ignored ({:?})",
                    self.state.asset_load_state
                );
            }
            AssetLoadState::NotLoaded | AssetLoadState::Failed => self.begin_load(),
        }
        Ok(())
    }

    fn begin_load(&mut self) {
        let ticket = LoadTicket {
            generation: self.generation,
            seq: self.next_seq(),
        };
        self.pending_load = Some(ticket);
        self.state.asset_load_state = AssetLoadState::Loading;
        self.load_started_at = Some(Instant::now());
        let url = self.config.model_url.clone();
        log::info!("[asset] loading {}", url);
        self.platform.import_asset(&url, ticket);
    }

    fn on_asset_loaded(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<LoadedAsset, String>,
    ) -> Result<()> {
        if self.state.is_disposed() || ticket.generation != self.generation {
            log::debug!("[asset] completion after dispose discarded");
            return Err(ViewerError::DisposalRace);
        }
        if self.pending_load != Some(ticket) {
            return Err(self.invalid("asset-loaded"));
        }
        self.pending_load = None;
        let elapsed = self
            .load_started_at
            .take()
            .map(|t| t.elapsed().as_secs_f32())
            .unwrap_or_default();

        match result {
            Ok(asset) => {
                log::info!("[asset] loaded in {:.2}s root={:?}", elapsed, asset.root);
                self.state.asset_load_state = AssetLoadState::Loaded;
                self.state.asset = Some(asset);
                self.gesture.on_cancel();
                self.state.commit(Transform::new(
                    self.config.initial_scale,
                    self.config.initial_rotation,
                ));
                if let Some(animation) = asset.animation {
                    self.platform.start_animation(animation, true);
                }
                self.apply_committed();
                Ok(())
            }
            Err(msg) => {
                log::error!("[asset] load failed after {:.2}s: {}", elapsed, msg);
                self.state.asset_load_state = AssetLoadState::Failed;
                Err(ViewerError::AssetLoadFailed(msg))
            }
        }
    }

    fn target(&self) -> Option<NodeHandle> {
        match (self.state.asset_load_state, self.state.asset) {
            (AssetLoadState::Loaded, Some(asset)) => Some(asset.root),
            _ => None,
        }
    }

    fn apply_committed(&mut self) {
        if let Some(root) = self.target() {
            let t = self.state.committed();
            self.platform.apply_transform(root, t);
        }
    }

    fn on_touch_move(&mut self, points: &[Vec2]) {
        if self.state.phase != Phase::SessionActive {
            return;
        }
        let committed = self.state.committed();
        if let Some(t) = self.gesture.on_move(points, committed) {
            if let Some(root) = self.target() {
                self.platform.apply_transform(root, t);
            }
        }
    }

    /// Touch end and touch cancel both finish the gesture and commit the
    /// last interpreted transform. Without a target nothing is committed.
    fn on_touch_end(&mut self) {
        if self.state.phase != Phase::SessionActive || self.target().is_none() {
            self.gesture.on_cancel();
            return;
        }
        if let Some(t) = self.gesture.on_end() {
            log::debug!(
                "[gesture] commit scale={:.4} rotation={:.4}",
                t.scale,
                t.rotation
            );
            self.state.commit(t);
        }
    }

    /// Tears everything down. Safe to call repeatedly; only the first call
    /// touches the platform.
    pub fn dispose(&mut self) {
        if self.state.is_disposed() {
            log::debug!("[session] dispose on disposed viewer ignored");
            return;
        }
        let was_idle = self.state.phase == Phase::Idle;
        self.gesture.on_cancel();
        self.listeners.detach_all(&mut self.platform);
        if let Some(session) = self.state.session.take() {
            // An ending session has already been asked to stop.
            if self.state.phase != Phase::SessionEnding {
                self.platform.end_session(session);
            }
        }
        self.pending_session = None;
        self.pending_load = None;
        self.load_started_at = None;
        if self.tick_registered {
            self.platform.unregister_render_tick();
            self.tick_registered = false;
        }
        if !was_idle {
            self.platform.dispose_surface();
        }
        self.generation = self.generation.wrapping_add(1);
        _ = self.set_phase(Phase::Disposed);
        log::info!("[session] disposed after {} frames", self.state.frames_rendered);
    }
}

impl<P: Platform> Drop for Controller<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}
