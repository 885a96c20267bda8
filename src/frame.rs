use crate::babylon;
use crate::constants::FPS_LOG_INTERVAL_SEC;
use crate::dispatch::Dispatcher;
use instant::Instant;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

/// Frame counter that logs an average rate every few seconds.
struct FrameClock {
    last_report: Instant,
    frames: u32,
}

impl FrameClock {
    fn new() -> Self {
        Self {
            last_report: Instant::now(),
            frames: 0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let elapsed = self.last_report.elapsed().as_secs_f32();
        if elapsed >= FPS_LOG_INTERVAL_SEC {
            log::debug!("[frame] {:.1} fps", self.frames as f32 / elapsed);
            self.frames = 0;
            self.last_report = Instant::now();
        }
    }
}

/// A callback registered with `engine.runRenderLoop`.
pub struct RenderLoop {
    engine: babylon::Engine,
    callback: Closure<dyn FnMut()>,
}

pub fn start_loop(engine: &babylon::Engine, dispatcher: Rc<Dispatcher>) -> RenderLoop {
    let mut clock = FrameClock::new();
    let callback = Closure::wrap(Box::new(move || {
        if dispatcher.render_tick() {
            clock.tick();
        }
    }) as Box<dyn FnMut()>);
    engine.run_render_loop(callback.as_ref().unchecked_ref());
    RenderLoop {
        engine: engine.clone(),
        callback,
    }
}

impl RenderLoop {
    pub fn stop(self) {
        self.engine
            .stop_render_loop(self.callback.as_ref().unchecked_ref());
        let callback = self.callback;
        spawn_local(async move {
            drop(callback);
        });
    }
}
