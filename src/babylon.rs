//! Minimal bindings to the page's global `BABYLON` namespace.
//!
//! Only the calls the viewer makes are bound; everything else about the
//! engine stays on the JavaScript side.

use js_sys::{Array, Function, Promise};
use wasm_bindgen::prelude::*;
use web_sys as web;

#[wasm_bindgen]
extern "C" {
    // ---------------- engine / scene ----------------
    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type Engine;

    #[wasm_bindgen(constructor, js_namespace = BABYLON, catch)]
    pub fn new(canvas: &web::HtmlCanvasElement, antialias: bool) -> Result<Engine, JsValue>;

    #[wasm_bindgen(method, js_name = runRenderLoop)]
    pub fn run_render_loop(this: &Engine, render: &Function);

    #[wasm_bindgen(method, js_name = stopRenderLoop)]
    pub fn stop_render_loop(this: &Engine, render: &Function);

    #[wasm_bindgen(method)]
    pub fn resize(this: &Engine);

    #[wasm_bindgen(method)]
    pub fn dispose(this: &Engine);

    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type Scene;

    #[wasm_bindgen(constructor, js_namespace = BABYLON)]
    pub fn new(engine: &Engine) -> Scene;

    #[wasm_bindgen(method)]
    pub fn render(this: &Scene);

    #[wasm_bindgen(method)]
    pub fn dispose(this: &Scene);

    // ---------------- math ----------------
    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type Vector3;

    #[wasm_bindgen(constructor, js_namespace = BABYLON)]
    pub fn new(x: f32, y: f32, z: f32) -> Vector3;

    #[wasm_bindgen(method, getter)]
    pub fn x(this: &Vector3) -> f32;
    #[wasm_bindgen(method, getter)]
    pub fn y(this: &Vector3) -> f32;
    #[wasm_bindgen(method, getter)]
    pub fn z(this: &Vector3) -> f32;

    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type Quaternion;

    #[wasm_bindgen(constructor, js_namespace = BABYLON)]
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Quaternion;

    #[wasm_bindgen(method, getter)]
    pub fn x(this: &Quaternion) -> f32;
    #[wasm_bindgen(method, getter)]
    pub fn y(this: &Quaternion) -> f32;
    #[wasm_bindgen(method, getter)]
    pub fn z(this: &Quaternion) -> f32;
    #[wasm_bindgen(method, getter)]
    pub fn w(this: &Quaternion) -> f32;

    // ---------------- camera / light ----------------
    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type FreeCamera;

    #[wasm_bindgen(constructor, js_namespace = BABYLON)]
    pub fn new(name: &str, position: &Vector3, scene: &Scene) -> FreeCamera;

    #[wasm_bindgen(method, js_name = setTarget)]
    pub fn set_target(this: &FreeCamera, target: &Vector3);

    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type HemisphericLight;

    #[wasm_bindgen(constructor, js_namespace = BABYLON)]
    pub fn new(name: &str, direction: &Vector3, scene: &Scene) -> HemisphericLight;

    // ---------------- imported assets ----------------
    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type AbstractMesh;

    #[wasm_bindgen(method, getter)]
    pub fn scaling(this: &AbstractMesh) -> Vector3;
    #[wasm_bindgen(method, setter)]
    pub fn set_scaling(this: &AbstractMesh, value: &Vector3);

    #[wasm_bindgen(method, getter, js_name = rotationQuaternion)]
    pub fn rotation_quaternion(this: &AbstractMesh) -> Option<Quaternion>;
    #[wasm_bindgen(method, setter, js_name = rotationQuaternion)]
    pub fn set_rotation_quaternion(this: &AbstractMesh, value: &Quaternion);

    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type AnimationGroup;

    #[wasm_bindgen(method)]
    pub fn start(this: &AnimationGroup, looping: bool);

    /// Resolved value of `SceneLoader.ImportMeshAsync`.
    #[derive(Clone, Debug)]
    pub type ImportResult;

    #[wasm_bindgen(method, getter)]
    pub fn meshes(this: &ImportResult) -> Array;
    #[wasm_bindgen(method, getter, js_name = animationGroups)]
    pub fn animation_groups(this: &ImportResult) -> Array;

    #[wasm_bindgen(js_namespace = ["BABYLON", "SceneLoader"], js_name = ImportMeshAsync)]
    pub fn import_mesh_async(
        mesh_names: &JsValue,
        root_url: &str,
        scene_filename: &str,
        scene: &Scene,
    ) -> Promise;

    // ---------------- WebXR ----------------
    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type WebXRExperienceHelper;

    #[wasm_bindgen(js_namespace = ["BABYLON", "WebXRExperienceHelper"], js_name = CreateAsync)]
    pub fn create_xr_helper(scene: &Scene) -> Promise;

    #[wasm_bindgen(method, js_name = enterXRAsync)]
    pub fn enter_xr_async(
        this: &WebXRExperienceHelper,
        session_mode: &str,
        reference_space: &str,
    ) -> Promise;

    #[wasm_bindgen(method, js_name = exitXRAsync)]
    pub fn exit_xr_async(this: &WebXRExperienceHelper) -> Promise;

    #[wasm_bindgen(method)]
    pub fn dispose(this: &WebXRExperienceHelper);

    #[wasm_bindgen(js_namespace = BABYLON)]
    #[derive(Clone, Debug)]
    pub type WebXRSessionManager;

    /// The underlying `XRSession`; only its `end` event is used.
    #[wasm_bindgen(method, getter)]
    pub fn session(this: &WebXRSessionManager) -> web::EventTarget;

    #[wasm_bindgen(js_namespace = ["BABYLON", "WebXRSessionManager"], js_name = IsSessionSupportedAsync)]
    pub fn is_session_supported(session_mode: &str) -> Promise;
}
