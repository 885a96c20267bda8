//! Narrow capability traits for the collaborators the viewer drives.
//!
//! Asynchronous work (session negotiation, asset import, support probing) is
//! started through these traits and reported back to the controller as
//! [`crate::ViewerEvent`]s carrying the ticket issued here.

use crate::error::Result;
use crate::gesture::Transform;
use crate::state::{
    AnimationHandle, ListenerHandle, LoadTicket, NodeHandle, SessionHandle, SessionTicket,
};
use glam::Vec3;

/// Event subscriptions the controller holds while a session is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Resize,
    TouchMove,
    TouchEnd,
    TouchCancel,
    SessionExit,
}

impl ListenerKind {
    /// Everything attached on entering an active session.
    pub const SESSION: [ListenerKind; 5] = [
        ListenerKind::Resize,
        ListenerKind::TouchMove,
        ListenerKind::TouchEnd,
        ListenerKind::TouchCancel,
        ListenerKind::SessionExit,
    ];

    /// DOM event type name for this kind.
    pub fn event_type(&self) -> &'static str {
        match self {
            ListenerKind::Resize => "resize",
            ListenerKind::TouchMove => "touchmove",
            ListenerKind::TouchEnd => "touchend",
            ListenerKind::TouchCancel => "touchcancel",
            ListenerKind::SessionExit => "end",
        }
    }
}

/// The 3D engine that owns the canvas, scene and render loop.
pub trait RenderEngine {
    fn create_surface(&mut self) -> Result<()>;
    fn create_scene(&mut self) -> Result<()>;
    /// Default preview camera plus a light.
    fn attach_camera(&mut self, position: Vec3, target: Vec3, light_dir: Vec3) -> Result<()>;
    fn register_render_tick(&mut self) -> Result<()>;
    fn unregister_render_tick(&mut self);
    fn render_frame(&mut self);
    fn resize(&mut self);
    fn apply_transform(&mut self, node: NodeHandle, transform: Transform);
    fn start_animation(&mut self, animation: AnimationHandle, looping: bool);
    fn dispose_surface(&mut self);
}

/// Imports a model file; completion arrives as `ViewerEvent::AssetLoaded`.
pub trait AssetLoader {
    fn import_asset(&mut self, url: &str, ticket: LoadTicket);
}

/// The browser's immersive-session API.
pub trait SessionRuntime {
    /// Answer arrives as `ViewerEvent::SessionSupport`.
    fn probe_support(&mut self, mode: &str);
    /// Answer arrives as `SessionGranted` or `SessionFailed`.
    fn request_session(&mut self, mode: &str, reference_space: &str, ticket: SessionTicket);
    /// Asks the runtime to end the session; `SessionEnded` follows.
    fn end_session(&mut self, session: SessionHandle);
}

/// Input and window event subscriptions.
///
/// The returned handle is the only way to remove a listener, so removal
/// always targets exactly the callback that was registered.
pub trait InputHost {
    fn listen(
        &mut self,
        kind: ListenerKind,
        session: Option<SessionHandle>,
    ) -> Result<ListenerHandle>;
    fn unlisten(&mut self, handle: ListenerHandle);
}

/// Everything a front-end must provide to host a viewer.
pub trait Platform: RenderEngine + AssetLoader + SessionRuntime + InputHost {}

impl<T> Platform for T where T: RenderEngine + AssetLoader + SessionRuntime + InputHost {}
