//! The composition surface rendered into the overlay mount point.
//!
//! Owns the draft, the template catalog and the creation dialog. Renders
//! itself as plain markup under the mount node and re-renders from state
//! after every change. Interactive elements carry a `data-action` attribute
//! so a click target in the document can be mapped back to a
//! [`SurfaceAction`].

use crate::draft::Draft;
use crate::templates::{Template, TemplateCatalog, TemplateDialog, TemplateError};
use bridge::{HostBridge, OverlayRenderer, SubmitError, SubmitOutcome, SubmitRequest};
use bus::{Notice, NoticeSender};
use host_dom::{DomError, HostDocument, NodeKey};

const PLACEHOLDER: &str = "Type your message here...";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceAction {
    ToggleMenu,
    SelectTemplate(usize),
    OpenDialog,
    SaveTemplate,
    CancelDialog,
    Send,
}

impl SurfaceAction {
    fn from_attributes(action: &str, index: Option<&str>) -> Option<Self> {
        Some(match action {
            "toggle-menu" => SurfaceAction::ToggleMenu,
            "select-template" => SurfaceAction::SelectTemplate(index?.parse().ok()?),
            "open-dialog" => SurfaceAction::OpenDialog,
            "save-template" => SurfaceAction::SaveTemplate,
            "cancel-dialog" => SurfaceAction::CancelDialog,
            "send" => SurfaceAction::Send,
            _ => return None,
        })
    }
}

/// Nodes the surface reads back after rendering, with the values they were
/// rendered with.
#[derive(Clone, Debug)]
struct Rendered {
    mount: NodeKey,
    input: (NodeKey, String),
    dialog_title: Option<(NodeKey, String)>,
    dialog_body: Option<(NodeKey, String)>,
}

#[derive(Debug)]
pub struct CompositionSurface {
    draft: Draft,
    catalog: TemplateCatalog,
    dialog: TemplateDialog,
    menu_open: bool,
    sending: bool,
    notices: NoticeSender,
    rendered: Option<Rendered>,
}

impl CompositionSurface {
    pub fn new(notices: NoticeSender) -> Self {
        Self::with_catalog(notices, TemplateCatalog::default())
    }

    pub fn with_catalog(notices: NoticeSender, catalog: TemplateCatalog) -> Self {
        Self {
            draft: Draft::new(),
            catalog,
            dialog: TemplateDialog::default(),
            menu_open: false,
            sending: false,
            notices,
            rendered: None,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Templates in menu order.
    pub fn templates(&self) -> &[Template] {
        self.catalog.list()
    }

    pub fn dialog(&self) -> &TemplateDialog {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut TemplateDialog {
        &mut self.dialog
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Mount node of the last render, if any.
    pub fn mount(&self) -> Option<NodeKey> {
        self.rendered.as_ref().map(|r| r.mount)
    }

    pub fn can_send(&self) -> bool {
        !self.draft.is_blank() && !self.sending
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft.set(text);
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// Load the body of template `index` into the draft.
    pub fn select_template(&mut self, index: usize) -> Result<(), TemplateError> {
        let template = self.catalog.get(index)?;
        self.draft.set(&template.body);
        self.menu_open = false;
        self.notices.notify(Notice::TemplateLoaded {
            title: template.title.clone(),
        });
        Ok(())
    }

    pub fn open_dialog(&mut self) {
        self.menu_open = false;
        self.dialog.open();
    }

    pub fn cancel_dialog(&mut self) {
        self.dialog.cancel();
    }

    pub fn save_template(&mut self) -> Result<(), TemplateError> {
        let template = self.dialog.save(&mut self.catalog)?;
        self.notices.notify(Notice::TemplateCreated {
            title: template.title,
        });
        Ok(())
    }

    /// Relay the draft through `bridge`. The draft is cleared only when the
    /// host's send control was activated.
    pub fn send(&mut self, doc: &mut dyn HostDocument, bridge: &HostBridge) -> SubmitOutcome {
        if self.draft.is_blank() {
            self.notices.notify(Notice::EmptyInput);
            return SubmitOutcome::Failed(SubmitError::EmptyMessage);
        }
        self.sending = true;
        self.notices.notify(Notice::Busy(true));
        let outcome = bridge.submit(doc, &SubmitRequest::new(self.draft.text()));
        self.sending = false;
        self.notices.notify(Notice::Busy(false));

        match &outcome {
            SubmitOutcome::Sent => {
                self.draft.clear();
                self.notices.notify(Notice::Sent);
            }
            SubmitOutcome::Failed(SubmitError::EmptyMessage) => {
                self.notices.notify(Notice::EmptyInput);
            }
            SubmitOutcome::Failed(err) => {
                self.notices.notify(Notice::Failed {
                    reason: err.to_string(),
                });
            }
        }
        self.refresh_logged(doc);
        outcome
    }

    /// Map a click target inside the overlay to the action it triggers.
    /// Targets outside the current mount never map to an action.
    pub fn action_at(&self, doc: &dyn HostDocument, target: NodeKey) -> Option<SurfaceAction> {
        let mount = self.mount()?;
        let mut path = vec![target];
        let mut cursor = target;
        while cursor != mount {
            cursor = doc.parent(cursor)?;
            path.push(cursor);
        }
        path.iter().find_map(|&key| {
            let action = doc.attribute(key, "data-action")?;
            Some(SurfaceAction::from_attributes(
                action,
                doc.attribute(key, "data-template-index"),
            ))
        })?
    }

    /// Perform `action` and re-render.
    pub fn apply(
        &mut self,
        doc: &mut dyn HostDocument,
        bridge: &HostBridge,
        action: SurfaceAction,
    ) -> Option<SubmitOutcome> {
        self.sync_from_document(doc);
        match action {
            SurfaceAction::ToggleMenu => self.toggle_menu(),
            SurfaceAction::SelectTemplate(index) => {
                if let Err(err) = self.select_template(index) {
                    log::warn!(target: "composer", "{err}");
                }
            }
            SurfaceAction::OpenDialog => self.open_dialog(),
            SurfaceAction::SaveTemplate => {
                if let Err(err) = self.save_template() {
                    log::debug!(target: "composer", "template rejected: {err}");
                }
            }
            SurfaceAction::CancelDialog => self.cancel_dialog(),
            SurfaceAction::Send => return Some(self.send(doc, bridge)),
        }
        self.refresh_logged(doc);
        None
    }

    /// Pull field values the user edited in place back into state. Fields
    /// still holding their rendered value are left alone. Detached fields are
    /// read too, so edits survive the host dropping the mount.
    pub fn sync_from_document(&mut self, doc: &dyn HostDocument) {
        let Some(rendered) = self.rendered.as_mut() else {
            return;
        };
        if let Some(text) = take_edit(&mut rendered.input, |k| doc.text_content(k)) {
            self.draft.set(&text);
        }
        if let Some(title) = rendered.dialog_title.as_mut().and_then(|field| {
            take_edit(field, |k| doc.attribute(k, "value").map(str::to_string))
        }) {
            self.dialog.set_title(&title);
        }
        if let Some(body) = rendered
            .dialog_body
            .as_mut()
            .and_then(|field| take_edit(field, |k| doc.text_content(k)))
        {
            self.dialog.set_body(&body);
        }
    }

    /// Re-render into the current mount point. No-op while unmounted.
    pub fn refresh(&mut self, doc: &mut dyn HostDocument) -> Result<(), DomError> {
        match self.mount() {
            Some(mount) if doc.is_attached(mount) => self.render(doc, mount),
            _ => Ok(()),
        }
    }

    fn refresh_logged(&mut self, doc: &mut dyn HostDocument) {
        if let Err(err) = self.refresh(doc) {
            log::warn!(target: "composer", "re-render failed: {err}");
        }
    }

    fn build(&self, doc: &mut dyn HostDocument, mount: NodeKey) -> Result<Rendered, DomError> {
        for child in doc.children(mount) {
            doc.release(child)?;
        }

        let root = element(doc, mount, "div", &[("class", "overlay-composer")])?;

        let templates = element(doc, root, "div", &[("class", "overlay-composer__templates")])?;
        let toggle = element(
            doc,
            templates,
            "button",
            &[
                ("class", "overlay-composer__template-toggle"),
                ("data-action", "toggle-menu"),
            ],
        )?;
        doc.set_text_content(toggle, "Templates")?;
        if self.menu_open {
            let menu = element(doc, templates, "ul", &[("class", "overlay-composer__template-menu")])?;
            for (index, template) in self.catalog.list().iter().enumerate() {
                let item = element(
                    doc,
                    menu,
                    "li",
                    &[
                        ("class", "overlay-composer__template"),
                        ("data-action", "select-template"),
                        ("data-template-index", &index.to_string()),
                    ],
                )?;
                doc.set_text_content(item, &template.title)?;
            }
            let create = element(
                doc,
                menu,
                "li",
                &[
                    ("class", "overlay-composer__template overlay-composer__template--new"),
                    ("data-action", "open-dialog"),
                ],
            )?;
            doc.set_text_content(create, "Create new template")?;
        }

        let input = element(
            doc,
            root,
            "textarea",
            &[
                ("class", "overlay-composer__input"),
                ("placeholder", PLACEHOLDER),
            ],
        )?;
        doc.set_text_content(input, self.draft.text())?;

        let send = element(
            doc,
            root,
            "button",
            &[("class", "overlay-composer__send"), ("data-action", "send")],
        )?;
        doc.set_text_content(send, if self.sending { "Sending..." } else { "Send" })?;
        if !self.can_send() {
            doc.set_attribute(send, "disabled", "")?;
        }

        let (dialog_title, dialog_body) = if self.dialog.is_open() {
            let (title, body) = self.build_dialog(doc, root)?;
            (Some(title), Some(body))
        } else {
            (None, None)
        };

        Ok(Rendered {
            mount,
            input: (input, self.draft.text().to_string()),
            dialog_title: dialog_title.map(|k| (k, self.dialog.title().to_string())),
            dialog_body: dialog_body.map(|k| (k, self.dialog.body().to_string())),
        })
    }

    fn build_dialog(
        &self,
        doc: &mut dyn HostDocument,
        parent: NodeKey,
    ) -> Result<(NodeKey, NodeKey), DomError> {
        let dialog = element(
            doc,
            parent,
            "div",
            &[("class", "overlay-composer__dialog"), ("role", "dialog")],
        )?;
        let title = element(
            doc,
            dialog,
            "input",
            &[
                ("class", "overlay-composer__dialog-title"),
                ("placeholder", "Template title"),
                ("value", self.dialog.title()),
            ],
        )?;
        let body = element(
            doc,
            dialog,
            "textarea",
            &[
                ("class", "overlay-composer__dialog-body"),
                ("placeholder", "Template message"),
            ],
        )?;
        doc.set_text_content(body, self.dialog.body())?;
        if let Some(err) = self.dialog.error() {
            let error = element(doc, dialog, "p", &[("class", "overlay-composer__dialog-error")])?;
            doc.set_text_content(error, &err.to_string())?;
        }
        let save = element(
            doc,
            dialog,
            "button",
            &[
                ("class", "overlay-composer__dialog-save"),
                ("data-action", "save-template"),
            ],
        )?;
        doc.set_text_content(save, "Save template")?;
        let cancel = element(
            doc,
            dialog,
            "button",
            &[
                ("class", "overlay-composer__dialog-cancel"),
                ("data-action", "cancel-dialog"),
            ],
        )?;
        doc.set_text_content(cancel, "Cancel")?;
        Ok((title, body))
    }
}

impl OverlayRenderer for CompositionSurface {
    fn render(&mut self, doc: &mut dyn HostDocument, mount: NodeKey) -> Result<(), DomError> {
        self.sync_from_document(doc);
        if let Some(previous) = self.mount().filter(|&m| m != mount) {
            // The mounter has moved on from the previous mount point.
            if !doc.is_attached(previous) {
                if let Err(err) = doc.release(previous) {
                    log::debug!(target: "composer", "previous mount already gone: {err}");
                }
            }
            self.rendered = None;
        }
        let rendered = self.build(doc, mount)?;
        log::trace!(target: "composer", "rendered into {mount:?}");
        self.rendered = Some(rendered);
        Ok(())
    }
}

// Returns the field's value if it changed since it was last seen, and
// remembers it so the same edit is not applied twice.
fn take_edit(
    (key, seen): &mut (NodeKey, String),
    read: impl FnOnce(NodeKey) -> Option<String>,
) -> Option<String> {
    let now = read(*key).filter(|now| *now != *seen)?;
    seen.clone_from(&now);
    Some(now)
}

fn element(
    doc: &mut dyn HostDocument,
    parent: NodeKey,
    name: &str,
    attributes: &[(&str, &str)],
) -> Result<NodeKey, DomError> {
    let key = doc.create_element(name);
    for (attr, value) in attributes {
        doc.set_attribute(key, attr, value)?;
    }
    doc.append_child(parent, key)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge::{BridgeConfig, HostElement};
    use bus::NoticeBus;
    use host_dom::{Document, EventKind, Selector};

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    fn bridge() -> HostBridge {
        HostBridge::new(&BridgeConfig::default().selectors().unwrap())
    }

    /// Host page with a native composer and a mounted overlay root.
    fn page(with_send: bool) -> (Document, NodeKey) {
        let mut doc = Document::new("https://host.test/messaging/thread/1/").unwrap();
        let body = doc.body();
        let form = doc.element("form", &[("class", "msg-form")]);
        doc.append_child(body, form).unwrap();
        let editor = doc.element("div", &[("class", "msg-form__contenteditable")]);
        doc.append_child(form, editor).unwrap();
        if with_send {
            let send = doc.element("button", &[("class", "msg-form__send-button")]);
            doc.append_child(form, send).unwrap();
        }
        let mount = doc.element("div", &[("id", "linkedin-template-root")]);
        doc.append_child(body, mount).unwrap();
        (doc, mount)
    }

    fn mounted(doc: &mut Document, mount: NodeKey) -> (CompositionSurface, NoticeBus) {
        let bus = NoticeBus::new();
        let mut surface = CompositionSurface::new(bus.sender());
        surface.render(doc, mount).unwrap();
        (surface, bus)
    }

    #[test]
    fn renders_input_and_disabled_send_for_empty_draft() {
        let (mut doc, mount) = page(true);
        let (_surface, _bus) = mounted(&mut doc, mount);

        let input = doc.query_selector(&sel(".overlay-composer__input")).unwrap();
        assert_eq!(doc.attribute(input, "placeholder"), Some(PLACEHOLDER));
        let send = doc.query_selector(&sel(".overlay-composer__send")).unwrap();
        assert_eq!(doc.attribute(send, "disabled"), Some(""));
        assert!(doc.query_selector(&sel(".overlay-composer__template-menu")).is_none());
    }

    #[test]
    fn re_rendering_replaces_previous_markup() {
        let (mut doc, mount) = page(true);
        let (mut surface, _bus) = mounted(&mut doc, mount);
        surface.set_draft("hello");
        surface.refresh(&mut doc).unwrap();
        surface.refresh(&mut doc).unwrap();

        assert_eq!(doc.children(mount).len(), 1);
        let send = doc.query_selector(&sel(".overlay-composer__send")).unwrap();
        assert_eq!(doc.attribute(send, "disabled"), None);
    }

    #[test]
    fn selecting_a_template_loads_body_and_notifies() {
        let (mut doc, mount) = page(true);
        let (mut surface, bus) = mounted(&mut doc, mount);

        assert_eq!(
            surface.apply(&mut doc, &bridge(), SurfaceAction::ToggleMenu),
            None
        );
        let items = doc.query_selector_all(&sel("li[data-action=select-template]"));
        assert_eq!(items.len(), 3);

        let action = surface.action_at(&doc, items[1]).unwrap();
        assert_eq!(action, SurfaceAction::SelectTemplate(1));
        surface.apply(&mut doc, &bridge(), action);

        assert!(surface.draft().text().starts_with("Thank you for connecting!"));
        assert!(!surface.is_menu_open());
        assert_eq!(
            bus.drain(),
            vec![Notice::TemplateLoaded {
                title: "Follow-up".to_string()
            }]
        );
        let input = doc.query_selector(&sel(".overlay-composer__input")).unwrap();
        assert_eq!(doc.text_content(input).as_deref(), Some(surface.draft().text()));
    }

    #[test]
    fn empty_send_notifies_without_touching_host() {
        let (mut doc, mount) = page(true);
        let (mut surface, bus) = mounted(&mut doc, mount);
        doc.take_events();

        let outcome = surface.send(&mut doc, &bridge());
        assert_eq!(outcome, SubmitOutcome::Failed(SubmitError::EmptyMessage));
        assert_eq!(bus.drain(), vec![Notice::EmptyInput]);
        assert!(doc.events().is_empty());
    }

    #[test]
    fn successful_send_clears_draft() {
        let (mut doc, mount) = page(true);
        let (mut surface, bus) = mounted(&mut doc, mount);

        let input = doc.query_selector(&sel(".overlay-composer__input")).unwrap();
        doc.set_text_content(input, "Typed in place").unwrap();
        let send = doc.query_selector(&sel(".overlay-composer__send")).unwrap();
        let action = surface.action_at(&doc, send).unwrap();
        let outcome = surface.apply(&mut doc, &bridge(), action);

        assert_eq!(outcome, Some(SubmitOutcome::Sent));
        assert!(surface.draft().is_blank());
        assert_eq!(
            bus.drain(),
            vec![Notice::Busy(true), Notice::Busy(false), Notice::Sent]
        );
        let editor = doc.query_selector(&sel(".msg-form__contenteditable")).unwrap();
        assert_eq!(doc.text_content(editor).as_deref(), Some("Typed in place"));
        let kinds: Vec<_> = doc.events().iter().map(|e| e.event.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![EventKind::insert_text("Typed in place"), EventKind::Click]
        );
    }

    #[test]
    fn failed_send_keeps_draft_and_reports_reason() {
        let (mut doc, mount) = page(false);
        let (mut surface, bus) = mounted(&mut doc, mount);
        surface.set_draft("keep me");

        let outcome = surface.send(&mut doc, &bridge());
        assert_eq!(
            outcome,
            SubmitOutcome::Failed(SubmitError::HostElementsMissing(vec![
                HostElement::SendControl
            ]))
        );
        assert_eq!(surface.draft().text(), "keep me");
        assert_eq!(
            bus.drain(),
            vec![
                Notice::Busy(true),
                Notice::Busy(false),
                Notice::Failed {
                    reason: "host send control not found".to_string()
                }
            ]
        );
    }

    #[test]
    fn dialog_round_trip_through_markup() {
        let (mut doc, mount) = page(true);
        let (mut surface, bus) = mounted(&mut doc, mount);
        let b = bridge();

        surface.apply(&mut doc, &b, SurfaceAction::OpenDialog);
        surface.apply(&mut doc, &b, SurfaceAction::SaveTemplate);
        let error = doc.query_selector(&sel(".overlay-composer__dialog-error")).unwrap();
        assert_eq!(doc.text_content(error).as_deref(), Some("template title is empty"));

        let title = doc.query_selector(&sel(".overlay-composer__dialog-title")).unwrap();
        doc.set_attribute(title, "value", "Thanks").unwrap();
        let body = doc.query_selector(&sel(".overlay-composer__dialog-body")).unwrap();
        doc.set_text_content(body, "Thanks for the chat!").unwrap();
        let save = doc.query_selector(&sel(".overlay-composer__dialog-save")).unwrap();
        let action = surface.action_at(&doc, save).unwrap();
        surface.apply(&mut doc, &b, action);

        assert!(!surface.dialog().is_open());
        assert!(doc.query_selector(&sel(".overlay-composer__dialog")).is_none());
        assert_eq!(surface.catalog().len(), 4);
        assert_eq!(
            bus.drain(),
            vec![Notice::TemplateCreated {
                title: "Thanks".to_string()
            }]
        );
    }

    #[test]
    fn host_elements_with_actions_are_not_overlay_targets() {
        let (mut doc, mount) = page(true);
        let (surface, _bus) = mounted(&mut doc, mount);
        let body = doc.body();
        let host_button = doc.element("button", &[("data-action", "send")]);
        doc.append_child(body, host_button).unwrap();
        let host_item = doc.element(
            "li",
            &[("data-action", "select-template"), ("data-template-index", "0")],
        );
        doc.append_child(host_button, host_item).unwrap();

        assert_eq!(surface.action_at(&doc, host_button), None);
        assert_eq!(surface.action_at(&doc, host_item), None);
        assert_eq!(surface.action_at(&doc, mount), None);
        let send = doc.query_selector(&sel(".overlay-composer__send")).unwrap();
        assert_eq!(surface.action_at(&doc, send), Some(SurfaceAction::Send));
    }

    #[test]
    fn typed_text_survives_moving_to_a_new_mount() {
        let (mut doc, mount) = page(true);
        let (mut surface, _bus) = mounted(&mut doc, mount);
        let input = doc.query_selector(&sel(".overlay-composer__input")).unwrap();
        doc.set_text_content(input, "typed in place").unwrap();

        // Host drops the old mount; a new one appears elsewhere.
        doc.remove(mount).unwrap();
        let body = doc.body();
        let next = doc.element("div", &[("id", "linkedin-template-root")]);
        doc.append_child(body, next).unwrap();
        surface.render(&mut doc, next).unwrap();

        assert_eq!(surface.draft().text(), "typed in place");
        assert_eq!(surface.mount(), Some(next));
        let input = doc.query_selector(&sel(".overlay-composer__input")).unwrap();
        assert_eq!(doc.text_content(input).as_deref(), Some("typed in place"));
        assert_eq!(doc.text_content(mount), None, "old mount is released");
    }

    #[test]
    fn sent_text_is_not_resurrected_by_the_next_render() {
        let (mut doc, mount) = page(true);
        let (mut surface, _bus) = mounted(&mut doc, mount);
        let input = doc.query_selector(&sel(".overlay-composer__input")).unwrap();
        doc.set_text_content(input, "once").unwrap();
        surface.sync_from_document(&doc);
        assert!(surface.send(&mut doc, &bridge()).is_sent());

        surface.refresh(&mut doc).unwrap();
        assert!(surface.draft().is_blank());
    }

    #[test]
    fn re_rendering_does_not_grow_the_document() {
        let (mut doc, mount) = page(true);
        let (mut surface, _bus) = mounted(&mut doc, mount);
        surface.toggle_menu();
        surface.refresh(&mut doc).unwrap();
        let settled = doc.node_count();
        for _ in 0..20 {
            surface.refresh(&mut doc).unwrap();
        }
        assert_eq!(doc.node_count(), settled);
    }

    #[test]
    fn clicks_outside_actions_map_to_nothing() {
        let (mut doc, mount) = page(true);
        let (surface, _bus) = mounted(&mut doc, mount);
        let input = doc.query_selector(&sel(".overlay-composer__input")).unwrap();
        assert_eq!(surface.action_at(&doc, input), None);
        let editor = doc.query_selector(&sel(".msg-form__contenteditable")).unwrap();
        assert_eq!(surface.action_at(&doc, editor), None);
    }
}
