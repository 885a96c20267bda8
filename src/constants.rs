// Page element ids the web front-end looks up.

pub const DEFAULT_CANVAS_ID: &str = "renderCanvas";
pub const AR_BUTTON_ID: &str = "ar-button"; // toggles START AR / EXIT AR
pub const LOAD_BUTTON_ID: &str = "load-button";
pub const STATUS_ID: &str = "ar-status";

// Render loop diagnostics
pub const FPS_LOG_INTERVAL_SEC: f32 = 5.0;
