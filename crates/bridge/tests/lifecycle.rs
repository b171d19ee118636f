use bridge::{
    BridgeConfig, FrameReport, HostElement, Integration, MountEvent, OverlayRenderer, SubmitError,
    SubmitOutcome, SubmitRequest, TeardownReason,
};
use host_dom::{DomError, HostDocument, NodeKey, Selector};
use host_sim::{HostApp, HostOptions};

#[derive(Default)]
struct CountingRenderer {
    renders: usize,
}

impl OverlayRenderer for CountingRenderer {
    fn render(&mut self, doc: &mut dyn HostDocument, mount: NodeKey) -> Result<(), DomError> {
        let input = doc.create_element("textarea");
        doc.set_attribute(input, "class", "overlay-composer__input")?;
        doc.append_child(mount, input)?;
        self.renders += 1;
        Ok(())
    }
}

struct Harness {
    host: HostApp,
    integration: Integration,
    renderer: CountingRenderer,
}

impl Harness {
    fn start(url: &str, composer_delay: u32) -> (Self, Vec<MountEvent>) {
        let mut host = HostApp::new(url, HostOptions { composer_delay }).unwrap();
        let mut integration = Integration::new(&BridgeConfig::default()).unwrap();
        let mut renderer = CountingRenderer::default();
        let events = integration.start(host.doc_mut(), &mut renderer);
        (
            Self {
                host,
                integration,
                renderer,
            },
            events,
        )
    }

    fn step(&mut self) -> FrameReport {
        self.host.tick().unwrap();
        self.integration
            .on_frame(self.host.doc_mut(), &mut self.renderer)
    }

    fn run(&mut self, frames: usize) -> Vec<MountEvent> {
        (0..frames).flat_map(|_| self.step().events).collect()
    }

    fn overlays(&self) -> Vec<NodeKey> {
        self.host
            .doc()
            .query_selector_all(&Selector::parse("#linkedin-template-root").unwrap())
    }
}

fn mounted(events: &[MountEvent]) -> Vec<&MountEvent> {
    events
        .iter()
        .filter(|e| matches!(e, MountEvent::Mounted { .. }))
        .collect()
}

#[test]
fn mounts_once_composer_appears_on_thread_page() {
    let (mut h, events) = Harness::start("https://host.test/messaging/thread/1/", 2);
    assert!(matches!(events[..], [MountEvent::WaitStarted { .. }]));

    let events = h.run(4);
    assert_eq!(mounted(&events).len(), 1);

    let composer = h.host.composer().unwrap();
    let record = h.integration.mount_record().unwrap().clone();
    let doc = h.host.doc();
    assert_eq!(record.native, composer.editor);
    assert_eq!(doc.style_property(composer.editor, "display"), Some("none"));
    assert!(doc.is_attached(composer.editor));

    let siblings = doc.children(composer.form);
    let pos = siblings.iter().position(|&k| k == composer.editor).unwrap();
    assert_eq!(siblings[pos - 1], record.overlay);
    assert_eq!(h.overlays(), vec![record.overlay]);
    assert_eq!(h.renderer.renders, 1);
}

#[test]
fn out_of_scope_start_does_nothing() {
    let (mut h, events) = Harness::start("https://host.test/feed/", 0);
    assert!(events.is_empty());
    assert!(h.run(5).is_empty());
    assert!(h.overlays().is_empty());
}

#[test]
fn navigating_into_scope_mounts_and_leaving_tears_down() {
    let (mut h, _) = Harness::start("https://host.test/feed/", 1);
    h.host.navigate("/messaging/thread/7/").unwrap();

    let report = h.step();
    let nav = report.navigated.unwrap();
    assert_eq!(nav.from, "https://host.test/feed/");
    assert_eq!(nav.to, "https://host.test/messaging/thread/7/");
    let events = h.run(3);
    assert_eq!(mounted(&events).len(), 1);
    let native = h.host.composer().unwrap().editor;

    h.host.navigate("/feed/").unwrap();
    let report = h.step();
    assert!(report.navigated.is_some());
    assert!(report.events.contains(&MountEvent::TornDown {
        reason: TeardownReason::OutOfScope,
        native,
    }));
    assert!(h.integration.mount_record().is_none());
    assert!(h.overlays().is_empty());
}

#[test]
fn rapid_navigation_mounts_only_for_latest_thread() {
    let (mut h, _) = Harness::start("https://host.test/messaging/thread/1/", 3);
    h.step();
    h.host.navigate("/messaging/thread/2/").unwrap();
    h.step();
    h.host.navigate("/messaging/thread/3/").unwrap();

    let events = h.run(8);
    let mounts = mounted(&events);
    assert_eq!(mounts.len(), 1);
    let MountEvent::Mounted { generation, .. } = mounts[0] else {
        unreachable!()
    };
    assert_eq!(*generation, h.integration.generation());
    assert_eq!(h.overlays().len(), 1);
    assert_eq!(
        h.integration.mount_record().unwrap().location,
        "https://host.test/messaging/thread/3/"
    );
}

#[test]
fn host_rerender_is_followed() {
    let (mut h, _) = Harness::start("https://host.test/messaging/thread/1/", 0);
    h.run(2);
    let old = h.integration.mount_record().unwrap().clone();

    h.host.rerender_composer().unwrap();
    let events = h.step().events;
    assert_eq!(
        events[0],
        MountEvent::TornDown {
            reason: TeardownReason::NativeDetached,
            native: old.native,
        }
    );
    assert_eq!(mounted(&events).len(), 1);

    let record = h.integration.mount_record().unwrap();
    assert_eq!(record.native, h.host.composer().unwrap().editor);
    assert!(record.generation > old.generation);
    assert_eq!(h.overlays().len(), 1);
}

#[test]
fn mutations_without_navigation_leave_mount_alone() {
    let (mut h, _) = Harness::start("https://host.test/messaging/thread/1/", 0);
    h.run(2);
    let record = h.integration.mount_record().unwrap().clone();

    for _ in 0..5 {
        let doc = h.host.doc_mut();
        let noise = doc.element("span", &[]);
        let body = doc.body();
        doc.append_child(body, noise).unwrap();
        assert!(h.step().is_quiet());
    }
    assert_eq!(h.integration.mount_record(), Some(&record));
}

#[test]
fn submit_reaches_host_send_handler() {
    let (mut h, _) = Harness::start("https://host.test/messaging/thread/1/", 0);
    h.run(2);

    let outcome = h
        .integration
        .submit(h.host.doc_mut(), &SubmitRequest::new("Hello there"));
    assert_eq!(outcome, SubmitOutcome::Sent);
    h.step();
    assert_eq!(h.host.sent(), ["Hello there".to_string()]);
}

#[test]
fn submit_before_host_composer_exists_fails_without_retry() {
    let (mut h, _) = Harness::start("https://host.test/messaging/thread/1/", 5);
    let outcome = h
        .integration
        .submit(h.host.doc_mut(), &SubmitRequest::new("too early"));
    assert_eq!(
        outcome,
        SubmitOutcome::Failed(SubmitError::HostElementsMissing(vec![
            HostElement::TextContainer,
            HostElement::SendControl,
        ]))
    );
    h.run(8);
    assert!(h.host.sent().is_empty());
}

#[test]
fn stop_restores_native_composer() {
    let (mut h, _) = Harness::start("https://host.test/messaging/thread/1/", 0);
    h.run(2);
    let native = h.host.composer().unwrap().editor;

    let events = h.integration.stop(h.host.doc_mut());
    assert_eq!(
        events,
        vec![MountEvent::TornDown {
            reason: TeardownReason::Shutdown,
            native,
        }]
    );
    assert_eq!(h.host.doc().style_property(native, "display"), None);
    assert!(h.overlays().is_empty());
}
