use crate::constants::*;
use crate::error::{Result, ViewerError};
use crate::gesture::ScaleLimits;

/// Runtime configuration for one mounted viewer.
///
/// Defaults come from `constants.rs`; front-ends layer their own overrides
/// (the web build reads `data-*` attributes on the canvas) and call
/// [`ViewerConfig::validate`] before handing the config to the controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub model_url: String,
    pub session_mode: String,
    pub reference_space: String,
    /// Begin loading the asset as soon as a session is granted.
    pub auto_load: bool,
    pub initial_scale: f32,
    pub initial_rotation: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_url: DEFAULT_MODEL_URL.to_string(),
            session_mode: SESSION_MODE.to_string(),
            reference_space: REFERENCE_SPACE.to_string(),
            auto_load: AUTO_LOAD_ON_SESSION,
            initial_scale: INITIAL_SCALE,
            initial_rotation: INITIAL_ROTATION,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model_url.trim().is_empty() {
            return Err(ViewerError::Config("model url is empty".into()));
        }
        if self.session_mode.is_empty() || self.reference_space.is_empty() {
            return Err(ViewerError::Config(
                "session mode and reference space must be set".into(),
            ));
        }
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(ViewerError::Config(format!(
                "min_scale must be a positive number, got {}",
                self.min_scale
            )));
        }
        if !(self.max_scale.is_finite() && self.max_scale >= self.min_scale) {
            return Err(ViewerError::Config(format!(
                "max_scale {} is below min_scale {}",
                self.max_scale, self.min_scale
            )));
        }
        if !(self.min_scale..=self.max_scale).contains(&self.initial_scale) {
            return Err(ViewerError::Config(format!(
                "initial_scale {} outside [{}, {}]",
                self.initial_scale, self.min_scale, self.max_scale
            )));
        }
        if !self.initial_rotation.is_finite() {
            return Err(ViewerError::Config("initial_rotation is not finite".into()));
        }
        Ok(())
    }

    pub fn scale_limits(&self) -> ScaleLimits {
        ScaleLimits {
            min: self.min_scale,
            max: self.max_scale,
        }
    }

    #[inline]
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}
