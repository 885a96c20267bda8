#![cfg(target_arch = "wasm32")]
use ar_core::{Controller, Phase, ViewerConfig, ViewerEvent};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

mod babylon;
mod config;
mod constants;
mod dispatch;
mod dom;
mod frame;
mod input;
mod listeners;
mod platform;
mod ui;

use dispatch::{Dispatcher, SharedController};
use listeners::DomListeners;
use platform::WebPlatform;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("ar-web ready");
    Ok(())
}

fn to_js(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", e))
}

/// One mounted viewer. The page shell creates it with [`ArViewer::mount`]
/// and must call [`ArViewer::unmount`] when the canvas goes away.
#[wasm_bindgen]
pub struct ArViewer {
    controller: SharedController,
    dispatcher: Rc<Dispatcher>,
    controls: DomListeners,
}

#[wasm_bindgen]
impl ArViewer {
    /// Builds the render surface on `canvas_id` (default `renderCanvas`) and
    /// wires the optional `#ar-button` / `#load-button` controls.
    pub fn mount(canvas_id: Option<String>) -> Result<ArViewer, JsValue> {
        mount(canvas_id.as_deref().unwrap_or(constants::DEFAULT_CANVAS_ID)).map_err(to_js)
    }

    #[wasm_bindgen(js_name = startAr)]
    pub fn start_ar(&self) {
        self.dispatcher.dispatch(ViewerEvent::StartRequested);
    }

    #[wasm_bindgen(js_name = exitAr)]
    pub fn exit_ar(&self) {
        self.dispatcher.dispatch(ViewerEvent::ExitRequested);
    }

    #[wasm_bindgen(js_name = loadModel)]
    pub fn load_model(&self) {
        self.dispatcher.dispatch(ViewerEvent::LoadRequested);
    }

    /// Current lifecycle phase, e.g. `"SessionActive"`.
    pub fn phase(&self) -> String {
        self.controller
            .try_borrow()
            .map(|c| format!("{:?}", c.phase()))
            .unwrap_or_default()
    }

    /// Tears the viewer down. Calling it again is harmless.
    pub fn unmount(&mut self) {
        let removed = self.controls.clear();
        if removed > 0 {
            log::debug!("[listener] removed {} control listeners", removed);
        }
        self.dispatcher.dispatch(ViewerEvent::Unmount);
    }
}

impl Drop for ArViewer {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn read_config(canvas: &web::HtmlCanvasElement) -> anyhow::Result<ViewerConfig> {
    let mut config = ViewerConfig::default();
    config::apply_overrides(&mut config, |name| canvas.get_attribute(name));
    config.validate()?;
    Ok(config)
}

fn mount(canvas_id: &str) -> anyhow::Result<ArViewer> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas = dom::canvas_by_id(&document, canvas_id)?;
    let config = read_config(&canvas)?;
    log::info!("[config] model={} mode={}", config.model_url, config.session_mode);

    let dispatcher = Dispatcher::new();
    let platform = WebPlatform::new(canvas, dispatcher.clone());
    let controller: SharedController = Rc::new(RefCell::new(Controller::new(config, platform)?));
    dispatcher.bind(&controller);

    controller.borrow_mut().mount()?;
    dispatcher.drain();
    ui::sync_controls(controller.borrow().state());

    let controls = wire_controls(&document, &dispatcher);
    Ok(ArViewer {
        controller,
        dispatcher,
        controls,
    })
}

fn click_listener(
    controls: &mut DomListeners,
    document: &web::Document,
    element_id: &str,
    mut handler: impl FnMut() + 'static,
) {
    let Some(el) = document.get_element_by_id(element_id) else {
        return;
    };
    let callback = Closure::wrap(Box::new(move |_ev: web::Event| handler()) as Box<dyn FnMut(web::Event)>);
    if let Err(e) = controls.add(el.unchecked_into(), "click", callback) {
        log::warn!("[ui] #{}: {}", element_id, e);
    }
}

fn wire_controls(document: &web::Document, dispatcher: &Rc<Dispatcher>) -> DomListeners {
    let mut controls = DomListeners::default();

    let d = dispatcher.clone();
    click_listener(&mut controls, document, constants::AR_BUTTON_ID, move || {
        let event = match d.phase() {
            Some(Phase::SessionActive) => ViewerEvent::ExitRequested,
            _ => ViewerEvent::StartRequested,
        };
        d.dispatch(event);
    });

    let d = dispatcher.clone();
    click_listener(&mut controls, document, constants::LOAD_BUTTON_ID, move || {
        d.dispatch(ViewerEvent::LoadRequested);
    });

    controls
}
