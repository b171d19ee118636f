//! Frame-driven element waiting.
//!
//! A [`WatchHandle`] is polled by the embedding loop once per animation frame.
//! It queries the document at most once per frame, never times out, and never
//! yields a node once its [`CancelToken`] has been signalled.

use core_types::FrameId;
use host_dom::{HostDocument, NodeKey, Selector};
use std::cell::Cell;
use std::rc::Rc;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitPoll {
    Pending,
    Ready(NodeKey),
    Cancelled,
}

/// One in-flight wait for `selector`.
#[derive(Debug)]
pub struct WatchHandle {
    selector: Selector,
    token: CancelToken,
    last_polled: Option<FrameId>,
    queries: u64,
    found: Option<NodeKey>,
}

impl WatchHandle {
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Number of document queries issued so far.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Advance the wait for `frame`. A second poll within the same frame
    /// reports `Pending` without touching the document.
    pub fn poll(&mut self, doc: &dyn HostDocument, frame: FrameId) -> WaitPoll {
        if self.token.is_cancelled() {
            return WaitPoll::Cancelled;
        }
        if let Some(found) = self.found {
            return WaitPoll::Ready(found);
        }
        if self.last_polled == Some(frame) {
            return WaitPoll::Pending;
        }
        self.last_polled = Some(frame);
        self.queries += 1;

        match doc.query_selector(&self.selector) {
            Some(found) => {
                log::debug!(
                    target: "bridge.waiter",
                    "`{}` resolved to {:?} after {} queries",
                    self.selector,
                    found,
                    self.queries
                );
                self.found = Some(found);
                WaitPoll::Ready(found)
            }
            None => WaitPoll::Pending,
        }
    }
}

pub struct ElementWaiter;

impl ElementWaiter {
    /// Begin waiting for `selector`. The caller keeps `token` (or a clone) to
    /// abandon the wait.
    pub fn wait(selector: Selector, token: CancelToken) -> WatchHandle {
        log::trace!(target: "bridge.waiter", "waiting for `{selector}`");
        WatchHandle {
            selector,
            token,
            last_polled: None,
            queries: 0,
            found: None,
        }
    }
}
