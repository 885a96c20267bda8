// Recording platform double shared by the controller tests.

#![allow(dead_code)]

use ar_core::{
    AnimationHandle, AssetLoader, Controller, InputHost, ListenerHandle, ListenerKind,
    LoadTicket, LoadedAsset, NodeHandle, RenderEngine, SessionHandle, SessionRuntime,
    SessionTicket, Transform, ViewerConfig, ViewerError, ViewerEvent,
};
use glam::{Vec2, Vec3};

#[derive(Default)]
pub struct FakePlatform {
    pub next_handle: u32,
    pub surface_live: bool,
    pub surface_disposals: u32,
    pub cameras: u32,
    pub tick_live: bool,
    pub tick_registrations: u32,
    pub frames: u32,
    pub resizes: u32,
    pub probes: Vec<String>,
    pub session_requests: Vec<(String, String, SessionTicket)>,
    pub ended_sessions: Vec<SessionHandle>,
    pub imports: Vec<(String, LoadTicket)>,
    pub transforms: Vec<(NodeHandle, Transform)>,
    pub animations: Vec<(AnimationHandle, bool)>,
    pub live_listeners: Vec<(ListenerKind, ListenerHandle)>,
    pub attached_kinds: Vec<ListenerKind>,
    pub detached_kinds: Vec<ListenerKind>,
    pub unknown_removals: u32,
    pub fail_surface: bool,
    pub fail_listen: Option<ListenerKind>,
}

impl FakePlatform {
    fn mint(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn last_session_ticket(&self) -> SessionTicket {
        self.session_requests.last().expect("no session request").2
    }

    pub fn last_load_ticket(&self) -> LoadTicket {
        self.imports.last().expect("no import").1
    }

    pub fn last_transform(&self) -> Option<Transform> {
        self.transforms.last().map(|(_, t)| *t)
    }

    pub fn live_kinds(&self) -> Vec<ListenerKind> {
        self.live_listeners.iter().map(|(k, _)| *k).collect()
    }
}

impl RenderEngine for FakePlatform {
    fn create_surface(&mut self) -> ar_core::Result<()> {
        if self.fail_surface {
            return Err(ViewerError::Surface("no webgl".into()));
        }
        self.surface_live = true;
        Ok(())
    }

    fn create_scene(&mut self) -> ar_core::Result<()> {
        Ok(())
    }

    fn attach_camera(&mut self, _position: Vec3, _target: Vec3, _light: Vec3) -> ar_core::Result<()> {
        self.cameras += 1;
        Ok(())
    }

    fn register_render_tick(&mut self) -> ar_core::Result<()> {
        self.tick_live = true;
        self.tick_registrations += 1;
        Ok(())
    }

    fn unregister_render_tick(&mut self) {
        self.tick_live = false;
    }

    fn render_frame(&mut self) {
        assert!(self.surface_live, "rendered against a disposed surface");
        self.frames += 1;
    }

    fn resize(&mut self) {
        self.resizes += 1;
    }

    fn apply_transform(&mut self, node: NodeHandle, transform: Transform) {
        self.transforms.push((node, transform));
    }

    fn start_animation(&mut self, animation: AnimationHandle, looping: bool) {
        self.animations.push((animation, looping));
    }

    fn dispose_surface(&mut self) {
        self.surface_live = false;
        self.surface_disposals += 1;
    }
}

impl AssetLoader for FakePlatform {
    fn import_asset(&mut self, url: &str, ticket: LoadTicket) {
        self.imports.push((url.to_string(), ticket));
    }
}

impl SessionRuntime for FakePlatform {
    fn probe_support(&mut self, mode: &str) {
        self.probes.push(mode.to_string());
    }

    fn request_session(&mut self, mode: &str, reference_space: &str, ticket: SessionTicket) {
        self.session_requests
            .push((mode.to_string(), reference_space.to_string(), ticket));
    }

    fn end_session(&mut self, session: SessionHandle) {
        self.ended_sessions.push(session);
    }
}

impl InputHost for FakePlatform {
    fn listen(
        &mut self,
        kind: ListenerKind,
        _session: Option<SessionHandle>,
    ) -> ar_core::Result<ListenerHandle> {
        if self.fail_listen == Some(kind) {
            return Err(ViewerError::Surface(format!("cannot listen for {:?}", kind)));
        }
        let handle = ListenerHandle(self.mint());
        self.live_listeners.push((kind, handle));
        self.attached_kinds.push(kind);
        Ok(handle)
    }

    fn unlisten(&mut self, handle: ListenerHandle) {
        match self.live_listeners.iter().position(|(_, h)| *h == handle) {
            Some(i) => {
                let (kind, _) = self.live_listeners.remove(i);
                self.detached_kinds.push(kind);
            }
            None => self.unknown_removals += 1,
        }
    }
}

pub fn test_config(auto_load: bool) -> ViewerConfig {
    ViewerConfig {
        model_url: "https://example.test/model.glb".into(),
        auto_load,
        ..ViewerConfig::default()
    }
}

pub fn mounted(config: ViewerConfig) -> Controller<FakePlatform> {
    let mut c = Controller::new(config, FakePlatform::default()).expect("valid config");
    c.mount().expect("mount");
    c.handle(ViewerEvent::SessionSupport(true)).expect("support");
    c
}

/// Mounts, starts and grants a session. Returns the granted handle.
pub fn active(config: ViewerConfig) -> (Controller<FakePlatform>, SessionHandle) {
    let mut c = mounted(config);
    let session = grant_new_session(&mut c, 900);
    (c, session)
}

pub fn grant_new_session(c: &mut Controller<FakePlatform>, id: u32) -> SessionHandle {
    c.handle(ViewerEvent::StartRequested).expect("start");
    let ticket = c.platform().last_session_ticket();
    let session = SessionHandle(id);
    c.handle(ViewerEvent::SessionGranted { ticket, session })
        .expect("grant");
    session
}

pub fn sample_asset(with_animation: bool) -> LoadedAsset {
    LoadedAsset {
        root: NodeHandle(7),
        animation: with_animation.then_some(AnimationHandle(3)),
    }
}

pub fn finish_load(c: &mut Controller<FakePlatform>, asset: LoadedAsset) {
    let ticket = c.platform().last_load_ticket();
    c.handle(ViewerEvent::AssetLoaded {
        ticket,
        result: Ok(asset),
    })
    .expect("asset load");
}

pub fn touches(points: &[(f32, f32)]) -> ViewerEvent {
    ViewerEvent::TouchMove(points.iter().map(|(x, y)| Vec2::new(*x, *y)).collect())
}

pub fn sorted(mut kinds: Vec<ListenerKind>) -> Vec<ListenerKind> {
    kinds.sort_by_key(|k| k.event_type());
    kinds
}
