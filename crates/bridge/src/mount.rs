//! Overlay mounting.
//!
//! Invariants:
//! - `generation` advances on every `on_navigate` call. A wait resolving under
//!   an older generation is discarded and never mounts.
//! - At most one `PendingWait` and at most one `MountRecord` exist at a time.
//! - A `MountRecord` exists iff its overlay node is attached to the document.
//! - The native composer is hidden, never removed, and its original inline
//!   `display` value is restored on teardown.

use crate::scope::ScopePredicate;
use crate::waiter::{CancelToken, ElementWaiter, WaitPoll, WatchHandle};
use core_types::{FrameId, Generation};
use host_dom::{DomError, HostDocument, NodeKey, Selector};
use thiserror::Error;

/// Renders the composition surface into a freshly inserted mount node.
pub trait OverlayRenderer {
    fn render(&mut self, doc: &mut dyn HostDocument, mount: NodeKey) -> Result<(), DomError>;
}

#[derive(Debug, Error)]
pub enum MountError {
    #[error("native composer {0:?} has no parent to mount beside")]
    Orphaned(NodeKey),
    #[error("failed to mount overlay")]
    Dom(#[from] DomError),
    #[error("overlay renderer failed")]
    Render(#[source] DomError),
}

/// The currently mounted overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountRecord {
    pub overlay: NodeKey,
    pub native: NodeKey,
    /// Inline `display` of the native node before it was hidden.
    pub native_display: Option<String>,
    pub location: String,
    pub generation: Generation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeardownReason {
    OutOfScope,
    NativeDetached,
    OverlayDetached,
    Shutdown,
}

/// What a mounter step did. Returned for logging and for tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MountEvent {
    WaitStarted {
        generation: Generation,
    },
    Mounted {
        generation: Generation,
        overlay: NodeKey,
        native: NodeKey,
    },
    TornDown {
        reason: TeardownReason,
        native: NodeKey,
    },
    /// A wait from an earlier generation resolved; it was dropped silently.
    StaleMount {
        stale: Generation,
        current: Generation,
    },
    MountFailed {
        generation: Generation,
        reason: String,
    },
}

#[derive(Debug)]
struct PendingWait {
    generation: Generation,
    handle: WatchHandle,
}

#[derive(Debug)]
pub struct IntegrationMounter {
    scope: ScopePredicate,
    composer: Selector,
    overlay_root_id: String,
    generation: Generation,
    pending: Option<PendingWait>,
    mount: Option<MountRecord>,
    location: String,
}

impl IntegrationMounter {
    pub fn new(scope: ScopePredicate, composer: Selector, overlay_root_id: impl Into<String>) -> Self {
        Self {
            scope,
            composer,
            overlay_root_id: overlay_root_id.into(),
            generation: Generation::INITIAL,
            pending: None,
            mount: None,
            location: String::new(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn mount_record(&self) -> Option<&MountRecord> {
        self.mount.as_ref()
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Handle a navigation (or startup) at `location`.
    pub fn on_navigate(
        &mut self,
        doc: &mut dyn HostDocument,
        location: &str,
        frame: FrameId,
        renderer: &mut dyn OverlayRenderer,
    ) -> Vec<MountEvent> {
        self.generation = self.generation.next();
        self.location = location.to_string();
        let mut events = Vec::new();

        if !self.scope.matches(location) {
            self.cancel_pending();
            events.extend(self.teardown(doc, TeardownReason::OutOfScope));
            return events;
        }

        if let Some(record) = &self.mount {
            if doc.is_attached(record.native) && doc.is_attached(record.overlay) {
                log::trace!(
                    target: "bridge.mount",
                    "{} already mounted, nothing to do",
                    self.generation
                );
                return events;
            }
        }

        events.extend(self.revalidate(doc));
        events.extend(self.start_wait(doc, frame, renderer));
        events
    }

    /// Advance the in-flight wait and revalidate the live mount.
    pub fn on_frame(
        &mut self,
        doc: &mut dyn HostDocument,
        frame: FrameId,
        renderer: &mut dyn OverlayRenderer,
    ) -> Vec<MountEvent> {
        let mut events = self.revalidate(doc);
        if !events.is_empty() && self.pending.is_none() && self.scope.matches(&self.location) {
            // The host re-rendered its composer; follow it under a new generation.
            self.generation = self.generation.next();
            events.extend(self.start_wait(doc, frame, renderer));
            return events;
        }
        events.extend(self.poll_pending(doc, frame, renderer));
        events
    }

    /// Tear everything down and cancel any wait.
    pub fn shutdown(&mut self, doc: &mut dyn HostDocument) -> Vec<MountEvent> {
        self.generation = self.generation.next();
        self.cancel_pending();
        self.teardown(doc, TeardownReason::Shutdown).into_iter().collect()
    }

    fn start_wait(
        &mut self,
        doc: &mut dyn HostDocument,
        frame: FrameId,
        renderer: &mut dyn OverlayRenderer,
    ) -> Vec<MountEvent> {
        self.cancel_pending();
        let handle = ElementWaiter::wait(self.composer.clone(), CancelToken::new());
        self.pending = Some(PendingWait {
            generation: self.generation,
            handle,
        });
        let mut events = vec![MountEvent::WaitStarted {
            generation: self.generation,
        }];
        // First query happens right away; later ones once per frame.
        events.extend(self.poll_pending(doc, frame, renderer));
        events
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.cancel();
            log::trace!(
                target: "bridge.mount",
                "cancelled wait from {}",
                pending.generation
            );
        }
    }

    fn poll_pending(
        &mut self,
        doc: &mut dyn HostDocument,
        frame: FrameId,
        renderer: &mut dyn OverlayRenderer,
    ) -> Option<MountEvent> {
        let pending = self.pending.as_mut()?;
        let native = match pending.handle.poll(doc, frame) {
            WaitPoll::Pending => return None,
            WaitPoll::Cancelled => {
                self.pending = None;
                return None;
            }
            WaitPoll::Ready(native) => native,
        };
        let generation = pending.generation;
        self.pending = None;

        // Every generation bump cancels or replaces `pending`, so a handle
        // resolving here normally belongs to the current generation. This
        // check holds the invariant even if that ordering is broken.
        if generation != self.generation {
            log::debug!(
                target: "bridge.mount",
                "discarding stale resolution from {generation} (current {})",
                self.generation
            );
            return Some(MountEvent::StaleMount {
                stale: generation,
                current: self.generation,
            });
        }

        match self.mount(doc, native, renderer) {
            Ok(record) => {
                log::info!(
                    target: "bridge.mount",
                    "overlay {:?} mounted before {:?} ({generation})",
                    record.overlay,
                    record.native
                );
                let event = MountEvent::Mounted {
                    generation,
                    overlay: record.overlay,
                    native: record.native,
                };
                self.mount = Some(record);
                Some(event)
            }
            Err(err) => {
                log::warn!(target: "bridge.mount", "{err}");
                Some(MountEvent::MountFailed {
                    generation,
                    reason: err.to_string(),
                })
            }
        }
    }

    fn mount(
        &mut self,
        doc: &mut dyn HostDocument,
        native: NodeKey,
        renderer: &mut dyn OverlayRenderer,
    ) -> Result<MountRecord, MountError> {
        let parent = doc.parent(native).ok_or(MountError::Orphaned(native))?;
        let native_display = doc.style_property(native, "display").map(str::to_string);

        let overlay = doc.create_element("div");
        doc.set_attribute(overlay, "id", &self.overlay_root_id)?;

        doc.set_style_property(native, "display", Some("none"))?;
        if let Err(err) = doc.insert_before(parent, overlay, native) {
            restore_display(doc, native, native_display.as_deref());
            return Err(err.into());
        }
        if let Err(err) = renderer.render(doc, overlay) {
            restore_display(doc, native, native_display.as_deref());
            if let Err(remove_err) = doc.remove(overlay) {
                log::warn!(target: "bridge.mount", "rollback left overlay behind: {remove_err}");
            }
            return Err(MountError::Render(err));
        }

        Ok(MountRecord {
            overlay,
            native,
            native_display,
            location: self.location.clone(),
            generation: self.generation,
        })
    }

    // Drops the mount record if the host detached either node.
    fn revalidate(&mut self, doc: &mut dyn HostDocument) -> Vec<MountEvent> {
        let Some(record) = &self.mount else {
            return Vec::new();
        };
        let reason = if !doc.is_attached(record.native) {
            TeardownReason::NativeDetached
        } else if !doc.is_attached(record.overlay) {
            TeardownReason::OverlayDetached
        } else {
            return Vec::new();
        };
        self.teardown(doc, reason).into_iter().collect()
    }

    fn teardown(&mut self, doc: &mut dyn HostDocument, reason: TeardownReason) -> Option<MountEvent> {
        let record = self.mount.take()?;
        restore_display(doc, record.native, record.native_display.as_deref());
        if let Err(err) = doc.remove(record.overlay) {
            log::warn!(target: "bridge.mount", "failed to remove overlay: {err}");
        }
        log::info!(
            target: "bridge.mount",
            "overlay {:?} torn down ({reason:?})",
            record.overlay
        );
        Some(MountEvent::TornDown {
            reason,
            native: record.native,
        })
    }
}

fn restore_display(doc: &mut dyn HostDocument, native: NodeKey, display: Option<&str>) {
    if let Err(err) = doc.set_style_property(native, "display", display) {
        log::warn!(target: "bridge.mount", "failed to restore {native:?}: {err}");
    }
}
