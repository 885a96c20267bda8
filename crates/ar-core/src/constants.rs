// Viewer defaults shared by the web front-end and the native simulator.

// Session negotiation
pub const SESSION_MODE: &str = "immersive-ar";
pub const REFERENCE_SPACE: &str = "local-floor";

// Asset
pub const DEFAULT_MODEL_URL: &str = "https://johnsonkj.github.io/my-ar-babylon-app/nathan.glb";
pub const AUTO_LOAD_ON_SESSION: bool = true;

// Transform defaults applied when an asset finishes loading
pub const INITIAL_SCALE: f32 = 0.1; // models arrive roughly metre-scale; shrink to tabletop size
pub const INITIAL_ROTATION: f32 = 0.0; // radians about +Y

// Scale clamp applied by the gesture interpreter
pub const MIN_SCALE: f32 = 0.01;
pub const MAX_SCALE: f32 = 10.0;

// Gesture
pub const MIN_ANCHOR_DISTANCE_PX: f32 = 1.0; // two touches closer than this cannot anchor a pinch

// Scene defaults for the non-immersive preview
pub const CAMERA_POSITION: [f32; 3] = [0.0, 1.0, -1.0];
pub const CAMERA_TARGET: [f32; 3] = [0.0, 0.0, 0.0];
pub const LIGHT_DIRECTION: [f32; 3] = [0.0, 1.0, 0.0];
