use ar_core::ViewerConfig;

// Canvas attributes that override the compiled-in defaults.
pub const ATTR_MODEL_URL: &str = "data-model-url";
pub const ATTR_SESSION_MODE: &str = "data-session-mode";
pub const ATTR_REFERENCE_SPACE: &str = "data-reference-space";
pub const ATTR_AUTO_LOAD: &str = "data-auto-load";
pub const ATTR_INITIAL_SCALE: &str = "data-initial-scale";

#[inline]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Layers attribute overrides onto `config`. Unparseable values are logged
/// and leave the default in place.
pub fn apply_overrides(config: &mut ViewerConfig, attr: impl Fn(&str) -> Option<String>) {
    if let Some(url) = attr(ATTR_MODEL_URL).filter(|u| !u.trim().is_empty()) {
        config.model_url = url.trim().to_string();
    }
    if let Some(mode) = attr(ATTR_SESSION_MODE).filter(|m| !m.is_empty()) {
        config.session_mode = mode;
    }
    if let Some(space) = attr(ATTR_REFERENCE_SPACE).filter(|s| !s.is_empty()) {
        config.reference_space = space;
    }
    if let Some(raw) = attr(ATTR_AUTO_LOAD) {
        match parse_flag(&raw) {
            Some(v) => config.auto_load = v,
            None => log::warn!("[config] ignoring {}={:?}", ATTR_AUTO_LOAD, raw),
        }
    }
    if let Some(raw) = attr(ATTR_INITIAL_SCALE) {
        match raw.trim().parse::<f32>() {
            Ok(v) if v.is_finite() => config.initial_scale = config.clamp_scale(v),
            _ => log::warn!("[config] ignoring {}={:?}", ATTR_INITIAL_SCALE, raw),
        }
    }
}

/// Splits a model URL into the `(root, file)` pair the scene loader expects.
/// Only the path is split; a query or fragment stays on the file name.
pub fn split_model_url(url: &str) -> (String, String) {
    let path_end = url.find(['?', '#']).unwrap_or(url.len());
    let (path, suffix) = url.split_at(path_end);
    match path.rfind('/') {
        Some(i) => (path[..=i].to_string(), format!("{}{}", &path[i + 1..], suffix)),
        None => (String::new(), url.to_string()),
    }
}
