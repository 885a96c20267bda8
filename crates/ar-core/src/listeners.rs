use crate::error::Result;
use crate::platform::{InputHost, ListenerKind};
use crate::state::{ListenerHandle, SessionHandle};
use smallvec::SmallVec;

/// Listener handles captured at registration, released verbatim.
#[derive(Debug, Default)]
pub struct ListenerSet {
    attached: SmallVec<[(ListenerKind, ListenerHandle); 5]>,
}

impl ListenerSet {
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ListenerKind> + '_ {
        self.attached.iter().map(|(k, _)| *k)
    }

    /// Attaches every kind in `kinds`. If any registration fails the ones
    /// already made are removed again before the error is returned.
    pub fn attach_all<H: InputHost + ?Sized>(
        &mut self,
        host: &mut H,
        kinds: &[ListenerKind],
        session: Option<SessionHandle>,
    ) -> Result<()> {
        for kind in kinds {
            match host.listen(*kind, session) {
                Ok(handle) => {
                    log::debug!("[listener] attached {} as {:?}", kind.event_type(), handle);
                    self.attached.push((*kind, handle));
                }
                Err(e) => {
                    log::error!("[listener] failed to attach {}: {}", kind.event_type(), e);
                    self.detach_all(host);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Detaches everything except `keep`, returning how many were removed.
    pub fn detach_except<H: InputHost + ?Sized>(&mut self, host: &mut H, keep: ListenerKind) -> usize {
        let mut removed = 0;
        self.attached.retain(|(kind, handle)| {
            if *kind == keep {
                return true;
            }
            host.unlisten(*handle);
            removed += 1;
            false
        });
        removed
    }

    pub fn detach_all<H: InputHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let removed = self.attached.len();
        for (kind, handle) in self.attached.drain(..) {
            log::debug!("[listener] detached {} ({:?})", kind.event_type(), handle);
            host.unlisten(handle);
        }
        removed
    }
}
