//! SPA navigation detection.
//!
//! The host swaps content through history manipulation, so load events never
//! fire after the first page. Instead the watcher wakes on every batch of
//! subtree mutations and compares the location with the last one it saw.

use crate::location::CurrentLocation;
use host_dom::{HostDocument, MutationRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigated {
    pub from: String,
    pub to: String,
}

#[derive(Debug)]
pub struct NavigationWatcher {
    location: CurrentLocation,
    running: bool,
}

impl NavigationWatcher {
    pub fn new() -> Self {
        Self {
            location: CurrentLocation::new(String::new()),
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Last location the watcher has accepted.
    pub fn current(&self) -> &str {
        self.location.get()
    }

    /// Connect the document-wide observer and seed the stored location.
    pub fn start(&mut self, doc: &mut dyn HostDocument) {
        self.location = CurrentLocation::new(doc.location());
        self.running = true;
        doc.observe();
        log::debug!(target: "bridge.watcher", "watching from {}", self.current());
    }

    pub fn stop(&mut self, doc: &mut dyn HostDocument) {
        if self.running {
            doc.disconnect();
            self.running = false;
            log::debug!(target: "bridge.watcher", "stopped");
        }
    }

    /// Drain the document's pending records and process them as one batch.
    pub fn poll(&mut self, doc: &mut dyn HostDocument) -> Option<Navigated> {
        if !self.running {
            return None;
        }
        let records = doc.take_records();
        self.on_mutations(&records, doc.location())
    }

    /// Handle one mutation batch. Reports at most one navigation, and only
    /// when `location` differs from the stored one.
    pub fn on_mutations(&mut self, records: &[MutationRecord], location: &str) -> Option<Navigated> {
        if !self.running || records.is_empty() {
            return None;
        }
        let from = self.location.swap_if_changed(location)?;
        log::debug!(
            target: "bridge.watcher",
            "navigated {from} -> {location} ({} records)",
            records.len()
        );
        Some(Navigated {
            from,
            to: location.to_string(),
        })
    }
}

impl Default for NavigationWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_dom::{Document, MutationKind, NodeKey};

    fn batch(n: usize) -> Vec<MutationRecord> {
        (0..n)
            .map(|i| MutationRecord {
                target: NodeKey(i as u32 + 1),
                kind: MutationKind::CharacterData,
            })
            .collect()
    }

    fn started(location: &str) -> (NavigationWatcher, Document) {
        let mut doc = Document::new(location).unwrap();
        let mut watcher = NavigationWatcher::new();
        watcher.start(&mut doc);
        (watcher, doc)
    }

    #[test]
    fn mutations_without_location_change_do_not_navigate() {
        let (mut watcher, _doc) = started("https://host.test/feed/");
        for _ in 0..10 {
            assert_eq!(watcher.on_mutations(&batch(3), "https://host.test/feed/"), None);
        }
    }

    #[test]
    fn one_report_per_distinct_location() {
        let (mut watcher, _doc) = started("https://host.test/feed/");
        let thread = "https://host.test/messaging/thread/1/";

        let nav = watcher.on_mutations(&batch(5), thread).unwrap();
        assert_eq!(nav.from, "https://host.test/feed/");
        assert_eq!(nav.to, thread);

        assert_eq!(watcher.on_mutations(&batch(5), thread), None);
        assert_eq!(watcher.current(), thread);
    }

    #[test]
    fn empty_batch_is_ignored() {
        let (mut watcher, _doc) = started("https://host.test/feed/");
        assert_eq!(watcher.on_mutations(&[], "https://host.test/messaging/thread/1/"), None);
        assert_eq!(watcher.current(), "https://host.test/feed/");
    }

    #[test]
    fn poll_drains_document_records() {
        let (mut watcher, mut doc) = started("https://host.test/feed/");
        doc.push_state("/messaging/thread/1/").unwrap();
        // Location changed but nothing mutated yet.
        assert_eq!(watcher.poll(&mut doc), None);

        let div = doc.element("div", &[]);
        let body = doc.body();
        doc.append_child(body, div).unwrap();
        let nav = watcher.poll(&mut doc).unwrap();
        assert_eq!(nav.to, "https://host.test/messaging/thread/1/");
        assert!(doc.take_records().is_empty());
    }

    #[test]
    fn stopped_watcher_reports_nothing() {
        let (mut watcher, mut doc) = started("https://host.test/feed/");
        watcher.stop(&mut doc);
        assert!(!doc.is_observing());
        assert_eq!(watcher.on_mutations(&batch(1), "https://host.test/other/"), None);
    }
}
