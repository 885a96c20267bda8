//! Replays a scripted AR session against an in-memory platform.
//!
//! Usage: `ar-sim [--deny-session] [--unsupported] [--fail-load]`
//!
//! Asynchronous platform answers are queued and delivered between script
//! steps, the way the browser delivers promise results between events.

use anyhow::bail;
use ar_core::{
    AnimationHandle, AssetLoader, Controller, InputHost, ListenerHandle, ListenerKind,
    LoadTicket, LoadedAsset, NodeHandle, RenderEngine, SessionHandle, SessionRuntime,
    SessionTicket, Transform, ViewerConfig, ViewerError, ViewerEvent,
};
use glam::{Vec2, Vec3};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, Default)]
struct Options {
    deny_session: bool,
    unsupported: bool,
    fail_load: bool,
}

impl Options {
    fn parse(args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut o = Options::default();
        for arg in args {
            match arg.as_str() {
                "--deny-session" => o.deny_session = true,
                "--unsupported" => o.unsupported = true,
                "--fail-load" => o.fail_load = true,
                other => bail!("unknown argument {other:?}"),
            }
        }
        Ok(o)
    }
}

type Inbox = Rc<RefCell<VecDeque<ViewerEvent>>>;

struct SimPlatform {
    inbox: Inbox,
    opts: Options,
    next: u32,
    listeners: HashMap<u32, ListenerKind>,
    frames: u64,
    last_transform: Option<Transform>,
}

impl SimPlatform {
    fn new(inbox: Inbox, opts: Options) -> Self {
        Self {
            inbox,
            opts,
            next: 0,
            listeners: HashMap::new(),
            frames: 0,
            last_transform: None,
        }
    }

    fn mint(&mut self) -> u32 {
        self.next += 1;
        self.next
    }

    fn post(&self, event: ViewerEvent) {
        self.inbox.borrow_mut().push_back(event);
    }
}

impl RenderEngine for SimPlatform {
    fn create_surface(&mut self) -> ar_core::Result<()> {
        log::info!("[sim] surface created");
        Ok(())
    }

    fn create_scene(&mut self) -> ar_core::Result<()> {
        Ok(())
    }

    fn attach_camera(&mut self, position: Vec3, target: Vec3, _light: Vec3) -> ar_core::Result<()> {
        log::info!("[sim] camera at {position} looking at {target}");
        Ok(())
    }

    fn register_render_tick(&mut self) -> ar_core::Result<()> {
        log::info!("[sim] render tick registered");
        Ok(())
    }

    fn unregister_render_tick(&mut self) {
        log::info!("[sim] render tick unregistered after {} frames", self.frames);
    }

    fn render_frame(&mut self) {
        self.frames += 1;
    }

    fn resize(&mut self) {}

    fn apply_transform(&mut self, node: NodeHandle, transform: Transform) {
        log::info!(
            "[sim] {:?} scale={:.4} rotation={:.4}",
            node,
            transform.scale,
            transform.rotation
        );
        self.last_transform = Some(transform);
    }

    fn start_animation(&mut self, animation: AnimationHandle, looping: bool) {
        log::info!("[sim] animation {:?} started (loop={})", animation, looping);
    }

    fn dispose_surface(&mut self) {
        log::info!("[sim] surface disposed");
    }
}

impl AssetLoader for SimPlatform {
    fn import_asset(&mut self, url: &str, ticket: LoadTicket) {
        log::info!("[sim] importing {}", url);
        let result = if self.opts.fail_load {
            Err(format!("GET {} returned 404", url))
        } else {
            let root = NodeHandle(self.mint());
            let animation = Some(AnimationHandle(self.mint()));
            Ok(LoadedAsset { root, animation })
        };
        self.post(ViewerEvent::AssetLoaded { ticket, result });
    }
}

impl SessionRuntime for SimPlatform {
    fn probe_support(&mut self, _mode: &str) {
        self.post(ViewerEvent::SessionSupport(!self.opts.unsupported));
    }

    fn request_session(&mut self, mode: &str, reference_space: &str, ticket: SessionTicket) {
        log::info!("[sim] session requested ({}, {})", mode, reference_space);
        let event = if self.opts.deny_session {
            ViewerEvent::SessionFailed {
                ticket,
                error: ViewerError::SessionRequestFailed("user denied".into()),
            }
        } else {
            ViewerEvent::SessionGranted {
                ticket,
                session: SessionHandle(self.mint()),
            }
        };
        self.post(event);
    }

    fn end_session(&mut self, session: SessionHandle) {
        log::info!("[sim] ending {:?}", session);
        self.post(ViewerEvent::SessionEnded { session });
    }
}

impl InputHost for SimPlatform {
    fn listen(
        &mut self,
        kind: ListenerKind,
        _session: Option<SessionHandle>,
    ) -> ar_core::Result<ListenerHandle> {
        let id = self.mint();
        self.listeners.insert(id, kind);
        Ok(ListenerHandle(id))
    }

    fn unlisten(&mut self, handle: ListenerHandle) {
        if self.listeners.remove(&handle.0).is_none() {
            log::warn!("[sim] removal of unknown listener {:?}", handle);
        }
    }
}

fn deliver(c: &mut Controller<SimPlatform>, event: ViewerEvent) {
    let name = event.name();
    match c.handle(event) {
        Ok(()) => {}
        Err(ViewerError::DisposalRace) => log::debug!("[sim] {} discarded after dispose", name),
        Err(e) => log::warn!("[sim] {}: {}", name, e),
    }
}

/// Delivers queued platform answers, then renders one frame.
fn pump(c: &mut Controller<SimPlatform>, inbox: &Inbox) {
    loop {
        let next = inbox.borrow_mut().pop_front();
        let Some(event) = next else { break };
        deliver(c, event);
    }
    c.on_render_tick();
}

fn touches(points: &[(f32, f32)]) -> ViewerEvent {
    ViewerEvent::TouchMove(points.iter().map(|(x, y)| Vec2::new(*x, *y)).collect())
}

fn script() -> Vec<ViewerEvent> {
    vec![
        ViewerEvent::StartRequested,
        // Duplicate load while the automatic one is in flight.
        ViewerEvent::LoadRequested,
        // Pinch out by half.
        touches(&[(100.0, 300.0), (200.0, 300.0)]),
        touches(&[(90.0, 300.0), (210.0, 300.0)]),
        touches(&[(75.0, 300.0), (225.0, 300.0)]),
        ViewerEvent::TouchEnd,
        // Quarter twist, with a one-finger dip in the middle.
        touches(&[(150.0, 250.0), (150.0, 350.0)]),
        touches(&[(150.0, 250.0)]),
        touches(&[(100.0, 300.0), (200.0, 300.0)]),
        ViewerEvent::TouchEnd,
        ViewerEvent::Resize,
        ViewerEvent::ExitRequested,
        ViewerEvent::StartRequested,
        ViewerEvent::LoadRequested,
        ViewerEvent::Unmount,
        ViewerEvent::Unmount,
    ]
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Options::parse(std::env::args().skip(1))?;

    let inbox: Inbox = Rc::default();
    let config = ViewerConfig::default();
    let mut c = Controller::new(config, SimPlatform::new(inbox.clone(), opts))?;
    c.mount()?;
    pump(&mut c, &inbox);

    for event in script() {
        deliver(&mut c, event);
        pump(&mut c, &inbox);
    }

    let s = c.state();
    log::info!(
        "[sim] done: phase={:?} asset={:?} scale={:.4} rotation={:.4} frames={}",
        s.phase,
        s.asset_load_state,
        s.current_scale,
        s.current_rotation,
        s.frames_rendered
    );
    if let Some(t) = c.platform().last_transform {
        log::info!("[sim] last applied scale={:.4} rotation={:.4}", t.scale, t.rotation);
    }
    let leaked = c.platform().listeners.len();
    if leaked > 0 {
        bail!("{} listeners still attached after unmount", leaked);
    }
    Ok(())
}
