//! Viewer state owned by the controller.
//!
//! These types avoid platform APIs so both the web front-end and the native
//! simulator can drive the same state machine. External objects (sessions,
//! listeners, scene nodes) are referenced through opaque handles minted by
//! the platform.

use crate::gesture::Transform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    SurfaceReady,
    SessionStarting,
    SessionActive,
    SessionEnding,
    Disposed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetLoadState {
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationHandle(pub u32);

/// Tags an in-flight session request so its completion can be matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionTicket {
    pub generation: u32,
    pub seq: u32,
}

/// Tags an in-flight asset import so its completion can be matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub generation: u32,
    pub seq: u32,
}

/// Result of a successful import: the model root and its optional clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadedAsset {
    pub root: NodeHandle,
    pub animation: Option<AnimationHandle>,
}

/// Everything the controller tracks for one mounted viewer.
#[derive(Clone, Debug)]
pub struct ViewerState {
    pub phase: Phase,
    pub asset_load_state: AssetLoadState,
    pub asset: Option<LoadedAsset>,
    pub session: Option<SessionHandle>,
    /// `None` until the platform answers the support probe.
    pub session_supported: Option<bool>,
    pub current_scale: f32,
    pub current_rotation: f32,
    pub frames_rendered: u64,
}

impl ViewerState {
    pub fn new(initial: Transform) -> Self {
        Self {
            phase: Phase::Idle,
            asset_load_state: AssetLoadState::NotLoaded,
            asset: None,
            session: None,
            session_supported: None,
            current_scale: initial.scale,
            current_rotation: initial.rotation,
            frames_rendered: 0,
        }
    }

    #[inline]
    pub fn committed(&self) -> Transform {
        Transform::new(self.current_scale, self.current_rotation)
    }

    #[inline]
    pub fn commit(&mut self, t: Transform) {
        self.current_scale = t.scale;
        self.current_rotation = t.rotation;
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.phase == Phase::Disposed
    }
}
