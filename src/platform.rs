//! Browser implementation of the viewer's collaborator traits: Babylon.js for
//! the surface, scene and loader, WebXR (through Babylon's helper) for the
//! immersive session, and DOM events for input.

use crate::babylon;
use crate::config::split_model_url;
use crate::dispatch::Dispatcher;
use crate::dom;
use crate::frame::{self, RenderLoop};
use crate::input;
use crate::listeners::{Callback, DomListeners};
use ar_core::{
    AnimationHandle, AssetLoader, InputHost, ListenerHandle, ListenerKind, LoadTicket,
    LoadedAsset, NodeHandle, RenderEngine, SessionHandle, SessionRuntime, SessionTicket,
    Transform, ViewerError, ViewerEvent,
};
use glam::{Quat, Vec3};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

struct ModelNode {
    mesh: babylon::AbstractMesh,
    base_scaling: Vec3,
    base_rotation: Quat,
}

/// JS objects behind the opaque handles given to the controller. Shared with
/// the async tasks that create them.
#[derive(Default)]
struct JsHandles {
    next: u32,
    disposed: bool,
    xr_helper: Option<babylon::WebXRExperienceHelper>,
    sessions: HashMap<u32, web::EventTarget>,
    nodes: HashMap<u32, ModelNode>,
    animations: HashMap<u32, babylon::AnimationGroup>,
}

impl JsHandles {
    fn mint(&mut self) -> u32 {
        self.next = self.next.wrapping_add(1);
        self.next
    }
}

type SharedHandles = Rc<RefCell<JsHandles>>;

pub struct WebPlatform {
    canvas: web::HtmlCanvasElement,
    dispatcher: Rc<Dispatcher>,
    engine: Option<babylon::Engine>,
    scene: Option<babylon::Scene>,
    render_loop: Option<RenderLoop>,
    listeners: DomListeners,
    handles: SharedHandles,
}

impl WebPlatform {
    pub fn new(canvas: web::HtmlCanvasElement, dispatcher: Rc<Dispatcher>) -> Self {
        Self {
            canvas,
            dispatcher,
            engine: None,
            scene: None,
            render_loop: None,
            listeners: DomListeners::default(),
            handles: SharedHandles::default(),
        }
    }

    fn engine(&self) -> ar_core::Result<&babylon::Engine> {
        self.engine
            .as_ref()
            .ok_or_else(|| ViewerError::Surface("engine not created".into()))
    }

    fn scene(&self) -> ar_core::Result<&babylon::Scene> {
        self.scene
            .as_ref()
            .ok_or_else(|| ViewerError::Surface("scene not created".into()))
    }

    fn touch_callback(&self, kind: ListenerKind) -> Callback {
        let d = self.dispatcher.clone();
        let canvas = self.canvas.clone();
        Closure::wrap(Box::new(move |ev: web::Event| {
            let Some(te) = ev.dyn_ref::<web::TouchEvent>() else {
                return;
            };
            match kind {
                ListenerKind::TouchMove => {
                    te.prevent_default();
                    d.dispatch(ViewerEvent::TouchMove(input::touch_points(te, &canvas)));
                }
                ListenerKind::TouchEnd => {
                    if input::gesture_finished(te.touches().length()) {
                        d.dispatch(ViewerEvent::TouchEnd);
                    }
                }
                _ => d.dispatch(ViewerEvent::TouchCancel),
            }
        }) as Box<dyn FnMut(web::Event)>)
    }
}

impl RenderEngine for WebPlatform {
    fn create_surface(&mut self) -> ar_core::Result<()> {
        let engine = babylon::Engine::new(&self.canvas, true)
            .map_err(|e| ViewerError::Surface(dom::js_error_text(&e)))?;
        self.engine = Some(engine);
        self.handles.borrow_mut().disposed = false;
        Ok(())
    }

    fn create_scene(&mut self) -> ar_core::Result<()> {
        let scene = babylon::Scene::new(self.engine()?);
        self.scene = Some(scene);
        Ok(())
    }

    fn attach_camera(&mut self, position: Vec3, target: Vec3, light_dir: Vec3) -> ar_core::Result<()> {
        let scene = self.scene()?;
        let camera = babylon::FreeCamera::new(
            "camera",
            &babylon::Vector3::new(position.x, position.y, position.z),
            scene,
        );
        camera.set_target(&babylon::Vector3::new(target.x, target.y, target.z));
        _ = babylon::HemisphericLight::new(
            "light",
            &babylon::Vector3::new(light_dir.x, light_dir.y, light_dir.z),
            scene,
        );
        Ok(())
    }

    fn register_render_tick(&mut self) -> ar_core::Result<()> {
        let render_loop = frame::start_loop(self.engine()?, self.dispatcher.clone());
        if let Some(old) = self.render_loop.replace(render_loop) {
            old.stop();
        }
        Ok(())
    }

    fn unregister_render_tick(&mut self) {
        if let Some(render_loop) = self.render_loop.take() {
            render_loop.stop();
        }
    }

    fn render_frame(&mut self) {
        if let Some(scene) = &self.scene {
            scene.render();
        }
    }

    fn resize(&mut self) {
        if let Some(engine) = &self.engine {
            engine.resize();
        }
    }

    fn apply_transform(&mut self, node: NodeHandle, transform: Transform) {
        let handles = self.handles.borrow();
        let Some(model) = handles.nodes.get(&node.0) else {
            log::warn!("[asset] no node for {:?}", node);
            return;
        };
        let s = model.base_scaling * transform.scale;
        model
            .mesh
            .set_scaling(&babylon::Vector3::new(s.x, s.y, s.z));
        let q = Quat::from_rotation_y(transform.rotation) * model.base_rotation;
        model
            .mesh
            .set_rotation_quaternion(&babylon::Quaternion::new(q.x, q.y, q.z, q.w));
    }

    fn start_animation(&mut self, animation: AnimationHandle, looping: bool) {
        match self.handles.borrow().animations.get(&animation.0) {
            Some(group) => group.start(looping),
            None => log::warn!("[asset] no animation for {:?}", animation),
        }
    }

    fn dispose_surface(&mut self) {
        self.unregister_render_tick();
        let leftover = self.listeners.clear();
        if leftover > 0 {
            log::warn!("[listener] {} DOM listeners still attached at dispose", leftover);
        }
        let helper = {
            let mut h = self.handles.borrow_mut();
            h.disposed = true;
            h.sessions.clear();
            h.nodes.clear();
            h.animations.clear();
            h.xr_helper.take()
        };
        if let Some(helper) = helper {
            helper.dispose();
        }
        if let Some(scene) = self.scene.take() {
            scene.dispose();
        }
        if let Some(engine) = self.engine.take() {
            engine.dispose();
        }
    }
}

impl AssetLoader for WebPlatform {
    fn import_asset(&mut self, url: &str, ticket: LoadTicket) {
        let d = self.dispatcher.clone();
        let scene = match self.scene() {
            Ok(s) => s.clone(),
            Err(e) => {
                d.dispatch(ViewerEvent::AssetLoaded {
                    ticket,
                    result: Err(e.to_string()),
                });
                return;
            }
        };
        let handles = self.handles.clone();
        let url = url.to_string();
        spawn_local(async move {
            let result = import_model(&handles, &scene, &url).await;
            d.dispatch(ViewerEvent::AssetLoaded { ticket, result });
        });
    }
}

async fn import_model(
    handles: &SharedHandles,
    scene: &babylon::Scene,
    url: &str,
) -> Result<LoadedAsset, String> {
    let (root_url, file) = split_model_url(url);
    let result: babylon::ImportResult =
        JsFuture::from(babylon::import_mesh_async(&JsValue::NULL, &root_url, &file, scene))
            .await
            .map_err(|e| dom::js_error_text(&e))?
            .unchecked_into();

    let first = result.meshes().get(0);
    if first.is_undefined() {
        return Err(format!("{} contains no meshes", url));
    }
    let mesh: babylon::AbstractMesh = first.unchecked_into();
    let s = mesh.scaling();
    let base_scaling = Vec3::new(s.x(), s.y(), s.z());
    let base_rotation = mesh
        .rotation_quaternion()
        .map(|q| Quat::from_xyzw(q.x(), q.y(), q.z(), q.w()))
        .unwrap_or(Quat::IDENTITY);
    let group = result.animation_groups().get(0);

    let mut h = handles.borrow_mut();
    if h.disposed {
        return Err("viewer disposed during import".into());
    }
    let root = h.mint();
    h.nodes.insert(
        root,
        ModelNode {
            mesh,
            base_scaling,
            base_rotation,
        },
    );
    let animation = if group.is_undefined() {
        None
    } else {
        let id = h.mint();
        h.animations.insert(id, group.unchecked_into());
        Some(AnimationHandle(id))
    };
    Ok(LoadedAsset {
        root: NodeHandle(root),
        animation,
    })
}

impl SessionRuntime for WebPlatform {
    fn probe_support(&mut self, mode: &str) {
        let d = self.dispatcher.clone();
        let promise = babylon::is_session_supported(mode);
        spawn_local(async move {
            let supported = match JsFuture::from(promise).await {
                Ok(v) => v.as_bool().unwrap_or(false),
                Err(e) => {
                    log::warn!("[session] support probe failed: {}", dom::js_error_text(&e));
                    false
                }
            };
            d.dispatch(ViewerEvent::SessionSupport(supported));
        });
    }

    fn request_session(&mut self, mode: &str, reference_space: &str, ticket: SessionTicket) {
        let d = self.dispatcher.clone();
        let scene = match self.scene() {
            Ok(s) => s.clone(),
            Err(error) => {
                d.dispatch(ViewerEvent::SessionFailed { ticket, error });
                return;
            }
        };
        let handles = self.handles.clone();
        let (mode, space) = (mode.to_string(), reference_space.to_string());
        spawn_local(async move {
            let event = match enter_xr(&handles, &scene, &mode, &space).await {
                Ok(id) => ViewerEvent::SessionGranted {
                    ticket,
                    session: SessionHandle(id),
                },
                Err(error) => ViewerEvent::SessionFailed { ticket, error },
            };
            d.dispatch(event);
        });
    }

    fn end_session(&mut self, session: SessionHandle) {
        let Some(helper) = self.handles.borrow().xr_helper.clone() else {
            log::warn!("[session] end requested for {:?} without an XR helper", session);
            return;
        };
        spawn_local(async move {
            if let Err(e) = JsFuture::from(helper.exit_xr_async()).await {
                log::warn!("[session] exit failed: {}", dom::js_error_text(&e));
            }
        });
    }
}

async fn enter_xr(
    handles: &SharedHandles,
    scene: &babylon::Scene,
    mode: &str,
    space: &str,
) -> Result<u32, ViewerError> {
    let request_failed = |e: JsValue| ViewerError::SessionRequestFailed(dom::js_error_text(&e));
    let existing = handles.borrow().xr_helper.clone();
    let helper = match existing {
        Some(h) => h,
        None => {
            let h: babylon::WebXRExperienceHelper =
                JsFuture::from(babylon::create_xr_helper(scene))
                    .await
                    .map_err(request_failed)?
                    .unchecked_into();
            let mut shared = handles.borrow_mut();
            if shared.disposed {
                drop(shared);
                h.dispose();
                return Err(ViewerError::DisposalRace);
            }
            shared.xr_helper = Some(h.clone());
            h
        }
    };
    let manager: babylon::WebXRSessionManager = JsFuture::from(helper.enter_xr_async(mode, space))
        .await
        .map_err(request_failed)?
        .unchecked_into();
    if handles.borrow().disposed {
        // The viewer went away while the browser was granting; end the
        // session through the helper that entered it.
        log::debug!("[session] session granted after dispose; exiting");
        if let Err(e) = JsFuture::from(helper.exit_xr_async()).await {
            log::warn!("[session] exit failed: {}", dom::js_error_text(&e));
        }
        helper.dispose();
        return Err(ViewerError::DisposalRace);
    }
    let mut h = handles.borrow_mut();
    let id = h.mint();
    h.sessions.insert(id, manager.session());
    log::info!("[session] XR session {} granted ({}, {})", id, mode, space);
    Ok(id)
}

impl InputHost for WebPlatform {
    fn listen(
        &mut self,
        kind: ListenerKind,
        session: Option<SessionHandle>,
    ) -> ar_core::Result<ListenerHandle> {
        let (target, callback): (web::EventTarget, Callback) = match kind {
            ListenerKind::Resize => {
                let window =
                    web::window().ok_or_else(|| ViewerError::Surface("no window".into()))?;
                let d = self.dispatcher.clone();
                let cb = Closure::wrap(Box::new(move |_ev: web::Event| {
                    d.dispatch(ViewerEvent::Resize);
                }) as Box<dyn FnMut(web::Event)>);
                (window.into(), cb)
            }
            ListenerKind::TouchMove | ListenerKind::TouchEnd | ListenerKind::TouchCancel => {
                (self.canvas.clone().into(), self.touch_callback(kind))
            }
            ListenerKind::SessionExit => {
                let session = session.ok_or_else(|| {
                    ViewerError::Surface("session-exit listener needs a session".into())
                })?;
                let target = self
                    .handles
                    .borrow()
                    .sessions
                    .get(&session.0)
                    .cloned()
                    .ok_or_else(|| ViewerError::Surface(format!("unknown session {:?}", session)))?;
                let d = self.dispatcher.clone();
                let handles = self.handles.clone();
                let cb = Closure::wrap(Box::new(move |_ev: web::Event| {
                    handles.borrow_mut().sessions.remove(&session.0);
                    d.dispatch(ViewerEvent::SessionEnded { session });
                }) as Box<dyn FnMut(web::Event)>);
                (target, cb)
            }
        };
        let id = self
            .listeners
            .add(target, kind.event_type(), callback)
            .map_err(|e| ViewerError::Surface(e.to_string()))?;
        Ok(ListenerHandle(id))
    }

    fn unlisten(&mut self, handle: ListenerHandle) {
        if !self.listeners.remove(handle.0) {
            log::warn!("[listener] unknown handle {:?}", handle);
        }
    }
}
