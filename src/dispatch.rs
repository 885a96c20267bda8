use crate::platform::WebPlatform;
use crate::ui;
use ar_core::{Controller, Phase, ViewerError, ViewerEvent};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

pub type SharedController = Rc<RefCell<Controller<WebPlatform>>>;

/// Routes DOM callbacks and async completions into the controller.
///
/// Events raised while the controller is already borrowed (for example a
/// platform call that synchronously fires another event) are queued and
/// handled by the outer call before it releases the borrow.
#[derive(Default)]
pub struct Dispatcher {
    controller: RefCell<Weak<RefCell<Controller<WebPlatform>>>>,
    queue: RefCell<VecDeque<ViewerEvent>>,
}

impl Dispatcher {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn bind(&self, controller: &SharedController) {
        *self.controller.borrow_mut() = Rc::downgrade(controller);
    }

    pub fn dispatch(&self, event: ViewerEvent) {
        self.queue.borrow_mut().push_back(event);
        self.drain();
    }

    pub fn phase(&self) -> Option<Phase> {
        let ctrl = self.controller.borrow().upgrade()?;
        let phase = ctrl.try_borrow().ok()?.phase();
        Some(phase)
    }

    /// Runs one render-loop frame. `false` once the viewer is gone.
    pub fn render_tick(&self) -> bool {
        let Some(ctrl) = self.controller.borrow().upgrade() else {
            return false;
        };
        let alive = match ctrl.try_borrow_mut() {
            Ok(mut c) => c.on_render_tick(),
            Err(_) => true,
        };
        self.drain();
        alive
    }

    /// Handles anything queued while the controller was borrowed.
    pub fn drain(&self) {
        let Some(ctrl) = self.controller.borrow().upgrade() else {
            self.queue.borrow_mut().clear();
            return;
        };
        // Already borrowed further up the stack; that caller drains.
        let Ok(mut c) = ctrl.try_borrow_mut() else {
            return;
        };
        let mut handled = 0;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(event) = next else { break };
            let name = event.name();
            if let Err(e) = c.handle(event) {
                report(name, &e);
            }
            handled += 1;
        }
        if handled > 0 {
            ui::sync_controls(c.state());
        }
    }
}

fn report(trigger: &str, err: &ViewerError) {
    match err {
        ViewerError::DisposalRace => log::debug!("[dispatch] {}: {}", trigger, err),
        ViewerError::InvalidTransition { .. } => log::warn!("[dispatch] {}: {}", trigger, err),
        ViewerError::SessionUnsupported
        | ViewerError::SessionRequestFailed(_)
        | ViewerError::AssetLoadFailed(_) => {
            log::warn!("[dispatch] {}: {}", trigger, err);
            ui::show_status(&err.to_string());
        }
        ViewerError::Surface(_) | ViewerError::Config(_) => {
            log::error!("[dispatch] {}: {}", trigger, err);
            ui::show_status(&err.to_string());
        }
    }
}
