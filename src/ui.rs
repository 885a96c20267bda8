use crate::constants::{AR_BUTTON_ID, LOAD_BUTTON_ID, STATUS_ID};
use crate::dom;
use ar_core::{AssetLoadState, Phase, ViewerState};
use web_sys as web;

#[inline]
pub fn ar_button_label(phase: Phase) -> &'static str {
    match phase {
        Phase::SessionActive => "EXIT AR",
        Phase::SessionStarting => "STARTING…",
        Phase::SessionEnding => "EXITING…",
        _ => "START AR",
    }
}

fn set_enabled(el: &web::Element, enabled: bool) {
    if enabled {
        _ = el.remove_attribute("disabled");
        _ = el.class_list().remove_1("hidden");
    } else {
        _ = el.set_attribute("disabled", "");
    }
}

/// Reflects the controller state onto the start/exit and load buttons.
pub fn sync_controls(state: &ViewerState) {
    let Some(document) = dom::window_document() else {
        return;
    };
    if let Some(el) = document.get_element_by_id(AR_BUTTON_ID) {
        el.set_text_content(Some(ar_button_label(state.phase)));
        let usable = state.session_supported != Some(false)
            && matches!(state.phase, Phase::SurfaceReady | Phase::SessionActive);
        set_enabled(&el, usable);
        if state.session_supported == Some(false) {
            _ = el.class_list().add_1("hidden");
        }
    }
    if let Some(el) = document.get_element_by_id(LOAD_BUTTON_ID) {
        let can_load = state.phase == Phase::SessionActive
            && matches!(
                state.asset_load_state,
                AssetLoadState::NotLoaded | AssetLoadState::Failed
            );
        set_enabled(&el, can_load);
    }
}

/// Show a one-line status message (errors, support warnings).
pub fn show_status(message: &str) {
    if let Some(el) = dom::window_document().and_then(|d| d.get_element_by_id(STATUS_ID)) {
        el.set_text_content(Some(message));
        _ = el.set_attribute("style", "");
    }
}
