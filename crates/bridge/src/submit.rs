//! Relaying authored text into the host's own composer.
//!
//! Each submit re-resolves the host's text container and send control; the
//! host may have replaced them since the last call. All lookups happen before
//! the first write, so a failed submit leaves the document untouched.
//!
//! Dispatch order is fixed: text write, `input` at the container, `click` at
//! the send control. "Sent" means the click was dispatched; the host's own
//! delivery is not observable from here.

use crate::config::HostSelectors;
use host_dom::{DomError, Event, EventKind, HostDocument, NodeKey, Selector};
use std::fmt;
use thiserror::Error;

/// Text captured at the moment the user asked to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitRequest {
    text: String,
}

impl SubmitRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostElement {
    TextContainer,
    SendControl,
}

impl fmt::Display for HostElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostElement::TextContainer => f.write_str("text container"),
            HostElement::SendControl => f.write_str("send control"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("host {} not found", join(.0))]
    HostElementsMissing(Vec<HostElement>),
    #[error("host document rejected the update: {0}")]
    Dom(#[from] DomError),
}

fn join(missing: &[HostElement]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    Failed(SubmitError),
}

impl SubmitOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SubmitOutcome::Sent)
    }
}

impl From<Result<(), SubmitError>> for SubmitOutcome {
    fn from(result: Result<(), SubmitError>) -> Self {
        match result {
            Ok(()) => SubmitOutcome::Sent,
            Err(err) => SubmitOutcome::Failed(err),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HostBridge {
    text_container: Selector,
    send_control: Selector,
}

impl HostBridge {
    pub fn new(selectors: &HostSelectors) -> Self {
        Self {
            text_container: selectors.text_container.clone(),
            send_control: selectors.send_control.clone(),
        }
    }

    /// Write `request` into the host composer and press the host's send control.
    /// Never retries; the caller decides whether to try again.
    pub fn submit(&self, doc: &mut dyn HostDocument, request: &SubmitRequest) -> SubmitOutcome {
        let outcome = SubmitOutcome::from(self.try_submit(doc, request));
        match &outcome {
            SubmitOutcome::Sent => {
                log::info!(target: "bridge.submit", "sent {} bytes", request.text().len())
            }
            SubmitOutcome::Failed(err) => log::warn!(target: "bridge.submit", "{err}"),
        }
        outcome
    }

    fn try_submit(
        &self,
        doc: &mut dyn HostDocument,
        request: &SubmitRequest,
    ) -> Result<(), SubmitError> {
        let text = request.text();
        if text.trim().is_empty() {
            return Err(SubmitError::EmptyMessage);
        }
        let (container, send) = self.resolve(doc)?;

        doc.set_text_content(container, text)?;
        doc.dispatch_event(container, Event::new(EventKind::insert_text(text)))?;
        doc.dispatch_event(send, Event::new(EventKind::Click))?;
        Ok(())
    }

    fn resolve(&self, doc: &dyn HostDocument) -> Result<(NodeKey, NodeKey), SubmitError> {
        let container = doc.query_selector(&self.text_container);
        let send = doc.query_selector(&self.send_control);
        match (container, send) {
            (Some(container), Some(send)) => Ok((container, send)),
            (container, send) => {
                let mut missing = Vec::new();
                if container.is_none() {
                    missing.push(HostElement::TextContainer);
                }
                if send.is_none() {
                    missing.push(HostElement::SendControl);
                }
                Err(SubmitError::HostElementsMissing(missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use host_dom::Document;

    fn bridge() -> HostBridge {
        HostBridge::new(&BridgeConfig::default().selectors().unwrap())
    }

    fn host(with_send: bool) -> (Document, NodeKey, Option<NodeKey>) {
        let mut doc = Document::new("https://host.test/messaging/thread/1/").unwrap();
        let form = doc.element("form", &[("class", "msg-form")]);
        let editor = doc.element(
            "div",
            &[("class", "msg-form__contenteditable"), ("contenteditable", "true")],
        );
        let body = doc.body();
        doc.append_child(body, form).unwrap();
        doc.append_child(form, editor).unwrap();
        let send = with_send.then(|| {
            let send = doc.element("button", &[("class", "msg-form__send-button")]);
            doc.append_child(form, send).unwrap();
            send
        });
        doc.observe();
        (doc, editor, send)
    }

    #[test]
    fn blank_text_is_rejected_without_touching_the_host() {
        let (mut doc, _, _) = host(true);
        for text in ["", "   ", "\n\t"] {
            let outcome = bridge().submit(&mut doc, &SubmitRequest::new(text));
            assert_eq!(outcome, SubmitOutcome::Failed(SubmitError::EmptyMessage));
        }
        assert!(doc.take_records().is_empty());
        assert!(doc.events().is_empty());
    }

    #[test]
    fn writes_text_then_input_then_click() {
        let (mut doc, editor, send) = host(true);
        let outcome = bridge().submit(&mut doc, &SubmitRequest::new("hello"));
        assert!(outcome.is_sent());
        assert_eq!(doc.text_content(editor).as_deref(), Some("hello"));

        let events = doc.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].target, editor);
        assert_eq!(events[0].event.kind, EventKind::insert_text("hello"));
        assert_eq!(events[1].target, send.unwrap());
        assert_eq!(events[1].event.kind, EventKind::Click);
        assert!(events[0].seq < events[1].seq);
    }

    #[test]
    fn missing_send_control_fails_with_no_side_effects() {
        let (mut doc, editor, _) = host(false);
        let outcome = bridge().submit(&mut doc, &SubmitRequest::new("hello"));
        assert_eq!(
            outcome,
            SubmitOutcome::Failed(SubmitError::HostElementsMissing(vec![
                HostElement::SendControl
            ]))
        );
        assert_eq!(doc.text_content(editor).as_deref(), Some(""));
        assert!(doc.events().is_empty());
        assert!(doc.take_records().is_empty());
    }

    #[test]
    fn missing_both_names_both() {
        let mut doc = Document::new("https://host.test/messaging/thread/1/").unwrap();
        let outcome = bridge().submit(&mut doc, &SubmitRequest::new("hi"));
        let SubmitOutcome::Failed(err) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(err.to_string(), "host text container and send control not found");
    }

    #[test]
    fn re_resolves_replaced_nodes_each_call() {
        let (mut doc, editor, _) = host(true);
        let b = bridge();
        assert!(b.submit(&mut doc, &SubmitRequest::new("one")).is_sent());

        let form = doc.parent(editor).unwrap();
        doc.remove(editor).unwrap();
        let replacement = doc.element("div", &[("class", "msg-form__contenteditable")]);
        let first = doc.children(form)[0];
        doc.insert_before(form, replacement, first).unwrap();
        doc.take_events();

        assert!(b.submit(&mut doc, &SubmitRequest::new("two")).is_sent());
        assert_eq!(doc.text_content(replacement).as_deref(), Some("two"));
        assert_eq!(doc.text_content(editor).as_deref(), Some("one"));
        assert_eq!(doc.events()[0].target, replacement);
    }
}
