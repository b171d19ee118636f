//! Frame-driven orchestration of watcher, mounter and host bridge.
//!
//! The embedding loop calls [`Integration::on_frame`] once per animation
//! frame. Within a frame, pending mutation records are processed first (which
//! may trigger navigation handling), then the in-flight wait is advanced.

use crate::config::{BridgeConfig, ConfigError};
use crate::mount::{IntegrationMounter, MountEvent, MountRecord, OverlayRenderer};
use crate::scope::ScopePredicate;
use crate::submit::{HostBridge, SubmitOutcome, SubmitRequest};
use crate::watcher::{Navigated, NavigationWatcher};
use core_types::{FrameId, Generation};
use host_dom::HostDocument;

#[derive(Debug)]
pub struct Integration {
    watcher: NavigationWatcher,
    mounter: IntegrationMounter,
    bridge: HostBridge,
    frame: FrameId,
}

impl Integration {
    pub fn new(config: &BridgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let selectors = config.selectors()?;
        Ok(Self {
            watcher: NavigationWatcher::new(),
            mounter: IntegrationMounter::new(
                ScopePredicate::new(config.scope_pattern.clone()),
                selectors.composer.clone(),
                config.overlay_root_id.clone(),
            ),
            bridge: HostBridge::new(&selectors),
            frame: FrameId::default(),
        })
    }

    /// Connect the watcher and run the startup navigation.
    pub fn start(
        &mut self,
        doc: &mut dyn HostDocument,
        renderer: &mut dyn OverlayRenderer,
    ) -> Vec<MountEvent> {
        self.watcher.start(doc);
        let location = self.watcher.current().to_string();
        self.mounter.on_navigate(doc, &location, self.frame, renderer)
    }

    pub fn on_frame(
        &mut self,
        doc: &mut dyn HostDocument,
        renderer: &mut dyn OverlayRenderer,
    ) -> FrameReport {
        self.frame = self.frame.next();
        let mut report = FrameReport {
            frame: self.frame,
            navigated: None,
            events: Vec::new(),
        };

        if let Some(nav) = self.watcher.poll(doc) {
            report
                .events
                .extend(self.mounter.on_navigate(doc, &nav.to, self.frame, renderer));
            report.navigated = Some(nav);
        }
        report
            .events
            .extend(self.mounter.on_frame(doc, self.frame, renderer));
        report
    }

    pub fn stop(&mut self, doc: &mut dyn HostDocument) -> Vec<MountEvent> {
        self.watcher.stop(doc);
        self.mounter.shutdown(doc)
    }

    pub fn submit(&self, doc: &mut dyn HostDocument, request: &SubmitRequest) -> SubmitOutcome {
        self.bridge.submit(doc, request)
    }

    pub fn bridge(&self) -> &HostBridge {
        &self.bridge
    }

    pub fn mount_record(&self) -> Option<&MountRecord> {
        self.mounter.mount_record()
    }

    pub fn generation(&self) -> Generation {
        self.mounter.generation()
    }

    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn location(&self) -> &str {
        self.watcher.current()
    }
}

/// Everything that happened during one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: FrameId,
    pub navigated: Option<Navigated>,
    pub events: Vec<MountEvent>,
}

impl FrameReport {
    pub fn is_quiet(&self) -> bool {
        self.navigated.is_none() && self.events.is_empty()
    }
}
