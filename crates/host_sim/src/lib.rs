//! A scripted stand-in for the host messaging application.
//!
//! [`HostApp`] owns a [`Document`] and behaves like the real page as far as
//! the overlay can tell: navigation goes through history push with content
//! swapped in place, the thread composer renders some frames after the
//! thread page appears, and the host's own handlers react to `input` and
//! `click` events found in the document's event journal.

use host_dom::{Document, DomError, EventKind, HostDocument, NodeKey};
use thiserror::Error;

pub const EDITOR_CLASS: &str = "msg-form__contenteditable";
pub const SEND_CLASS: &str = "msg-form__send-button";
pub const THREAD_PATH: &str = "/messaging/thread/";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("invalid location: {0}")]
    Location(#[from] url::ParseError),
    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Clone, Debug)]
pub struct HostOptions {
    /// Frames between a thread page appearing and its composer rendering.
    pub composer_delay: u32,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self { composer_delay: 3 }
    }
}

/// The host's own composer nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeComposer {
    pub form: NodeKey,
    pub editor: NodeKey,
    pub send: NodeKey,
}

#[derive(Debug)]
pub struct HostApp {
    doc: Document,
    options: HostOptions,
    app: NodeKey,
    page: Option<NodeKey>,
    message_list: Option<NodeKey>,
    composer: Option<NativeComposer>,
    composer_due: Option<u32>,
    /// Text the host believes is in its composer, updated from `input` events.
    draft: String,
    sent: Vec<String>,
    frames: u64,
}

impl HostApp {
    /// Load `url` as the initial page.
    pub fn new(url: &str, options: HostOptions) -> Result<Self, HostError> {
        let mut doc = Document::new(url)?;
        let app = doc.element("div", &[("id", "app")]);
        let body = doc.body();
        doc.append_child(body, app)?;
        let mut host = Self {
            doc,
            options,
            app,
            page: None,
            message_list: None,
            composer: None,
            composer_due: None,
            draft: String::new(),
            sent: Vec::new(),
            frames: 0,
        };
        host.render_page()?;
        Ok(host)
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn composer(&self) -> Option<NativeComposer> {
        self.composer
    }

    /// Messages the host's send handler accepted, oldest first.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// History push to `path` followed by an in-place content swap.
    pub fn navigate(&mut self, path: &str) -> Result<(), HostError> {
        self.doc.push_state(path)?;
        log::debug!(target: "host_sim", "navigated to {}", self.doc.location());
        self.render_page()
    }

    /// Replace the composer with fresh nodes, as the host does when its
    /// component tree re-renders.
    pub fn rerender_composer(&mut self) -> Result<(), HostError> {
        let Some(old) = self.composer.take() else {
            return Ok(());
        };
        self.doc.remove(old.form)?;
        self.draft.clear();
        if let Some(page) = self.page {
            self.composer = Some(self.build_composer(page)?);
        }
        log::debug!(target: "host_sim", "composer re-rendered");
        Ok(())
    }

    /// Advance one animation frame: run the host's event handlers over the
    /// journal, then any scheduled rendering.
    pub fn tick(&mut self) -> Result<(), HostError> {
        self.frames += 1;
        for dispatched in self.doc.take_events() {
            self.handle_event(dispatched.target, &dispatched.path, &dispatched.event.kind)?;
        }
        match self.composer_due {
            Some(0) => {
                self.composer_due = None;
                if let Some(page) = self.page {
                    self.composer = Some(self.build_composer(page)?);
                    log::debug!(target: "host_sim", "composer rendered on frame {}", self.frames);
                }
            }
            Some(left) => self.composer_due = Some(left - 1),
            None => {}
        }
        Ok(())
    }

    fn handle_event(
        &mut self,
        target: NodeKey,
        path: &[NodeKey],
        kind: &EventKind,
    ) -> Result<(), HostError> {
        let Some(composer) = self.composer else {
            return Ok(());
        };
        match kind {
            EventKind::Input { data, .. } if target == composer.editor => {
                self.draft = match data {
                    Some(data) => data.clone(),
                    None => self.doc.text_content(target).unwrap_or_default(),
                };
            }
            EventKind::Click if path.contains(&composer.send) => {
                if self.draft.trim().is_empty() {
                    log::debug!(target: "host_sim", "send ignored: empty composer");
                    return Ok(());
                }
                let text = std::mem::take(&mut self.draft);
                self.doc.set_text_content(composer.editor, "")?;
                if let Some(list) = self.message_list {
                    let item = self.doc.element("li", &[("class", "msg-list__item")]);
                    self.doc.set_text_content(item, &text)?;
                    self.doc.append_child(list, item)?;
                }
                log::info!(target: "host_sim", "sent {text:?}");
                self.sent.push(text);
            }
            _ => {}
        }
        Ok(())
    }

    fn render_page(&mut self) -> Result<(), HostError> {
        if let Some(page) = self.page.take() {
            self.doc.remove(page)?;
        }
        self.composer = None;
        self.composer_due = None;
        self.message_list = None;
        self.draft.clear();

        let on_thread = self.doc.url().path().starts_with(THREAD_PATH);
        let page = self.doc.element(
            "main",
            &[("class", if on_thread { "thread-page" } else { "feed-page" })],
        );
        self.doc.append_child(self.app, page)?;
        if on_thread {
            let list = self.doc.element("ul", &[("class", "msg-list")]);
            self.doc.append_child(page, list)?;
            self.message_list = Some(list);
            self.composer_due = Some(self.options.composer_delay);
        } else {
            let feed = self.doc.element("section", &[("class", "feed")]);
            self.doc.set_text_content(feed, "Recent activity")?;
            self.doc.append_child(page, feed)?;
        }
        self.page = Some(page);
        Ok(())
    }

    fn build_composer(&mut self, page: NodeKey) -> Result<NativeComposer, HostError> {
        let form = self.doc.element("form", &[("class", "msg-form")]);
        let editor = self.doc.element(
            "div",
            &[("class", EDITOR_CLASS), ("contenteditable", "true")],
        );
        let send = self.doc.element("button", &[("class", SEND_CLASS)]);
        self.doc.set_text_content(send, "Send")?;
        self.doc.append_child(form, editor)?;
        self.doc.append_child(form, send)?;
        self.doc.append_child(page, form)?;
        Ok(NativeComposer { form, editor, send })
    }
}
