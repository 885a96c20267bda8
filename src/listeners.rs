use std::collections::HashMap;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub type Callback = Closure<dyn FnMut(web::Event)>;

struct Registration {
    target: web::EventTarget,
    event_type: &'static str,
    callback: Callback,
}

/// DOM listeners keyed by id. Each entry keeps the exact closure passed to
/// `addEventListener`, so removal hands the same function back.
#[derive(Default)]
pub struct DomListeners {
    next_id: u32,
    entries: HashMap<u32, Registration>,
}

impl DomListeners {
    pub fn add(
        &mut self,
        target: web::EventTarget,
        event_type: &'static str,
        callback: Callback,
    ) -> anyhow::Result<u32> {
        target
            .add_event_listener_with_callback(event_type, callback.as_ref().unchecked_ref())
            .map_err(|e| anyhow::anyhow!("addEventListener({}) failed: {:?}", event_type, e))?;
        self.next_id = self.next_id.wrapping_add(1);
        let id = self.next_id;
        self.entries.insert(
            id,
            Registration {
                target,
                event_type,
                callback,
            },
        );
        Ok(id)
    }

    /// Returns `false` for an id that is not (or no longer) registered.
    pub fn remove(&mut self, id: u32) -> bool {
        let Some(reg) = self.entries.remove(&id) else {
            return false;
        };
        _ = reg
            .target
            .remove_event_listener_with_callback(reg.event_type, reg.callback.as_ref().unchecked_ref());
        // The callback may be the one currently executing; drop it after this turn.
        spawn_local(async move {
            drop(reg);
        });
        true
    }

    pub fn clear(&mut self) -> usize {
        let ids: Vec<u32> = self.entries.keys().copied().collect();
        ids.into_iter().filter(|id| self.remove(*id)).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
