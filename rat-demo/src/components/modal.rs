use rat_dom::{children, el, Attr, Child, Document, View};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalSize {
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

impl ModalSize {
    fn class(self) -> &'static str {
        match self {
            ModalSize::Sm => "max-w-md",
            ModalSize::Md => "max-w-lg",
            ModalSize::Lg => "max-w-2xl",
            ModalSize::Xl => "max-w-4xl",
        }
    }
}

type OnClose = Arc<dyn Fn() + Send + Sync>;

/// A dialog over a backdrop. Clicking the backdrop itself, the close button or
/// pressing Escape anywhere in the document calls `on_close`.
pub struct Modal {
    title: String,
    size: ModalSize,
    on_close: OnClose,
    children: Vec<Child>,
}

impl Modal {
    pub fn new<F>(title: impl Into<String>, on_close: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            title: title.into(),
            size: ModalSize::default(),
            on_close: Arc::new(on_close),
            children: Vec::new(),
        }
    }

    pub fn size(mut self, size: ModalSize) -> Self {
        self.size = size;
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Build the dialog, or nothing when it is closed.
    ///
    /// The Escape listener lives on `document` until the returned cleanup runs.
    pub fn render(self, document: &Document, is_open: bool) -> rat_dom::Result<Option<View>> {
        if !is_open {
            return Ok(None);
        }

        let on_escape = Arc::clone(&self.on_close);
        let escape = document.add_event_listener("keydown", move |event| {
            if event.key() == Some("Escape") {
                on_escape();
            }
            Ok(())
        })?;

        let on_backdrop = Arc::clone(&self.on_close);
        let on_button = Arc::clone(&self.on_close);
        let modal = el(
            "div",
            [
                Attr::class("modal-backdrop fixed inset-0 bg-black bg-opacity-50"),
                Attr::attr("role", "dialog"),
                Attr::on("click", move |event| {
                    if event.current_target().as_ref() == Some(event.target()) {
                        on_backdrop();
                    }
                    Ok(())
                }),
            ],
            children![el(
                "div",
                [Attr::class(format!("modal bg-white rounded-xl w-full {}", self.size.class()))],
                children![
                    el(
                        "div",
                        [Attr::class("flex items-center justify-between p-6 border-b")],
                        children![
                            el("h2", [Attr::class("text-2xl font-bold text-gray-900")], children![self.title]),
                            el(
                                "button",
                                [
                                    Attr::attr("type", "button"),
                                    Attr::attr("aria-label", "Close"),
                                    Attr::class("text-gray-400 text-2xl font-semibold"),
                                    Attr::on("click", move |_| {
                                        on_button();
                                        Ok(())
                                    }),
                                ],
                                children!["×"],
                            ),
                        ],
                    ),
                    el("div", [Attr::class("p-6")], self.children),
                ],
            )],
        );

        Ok(Some(View::with_cleanup(modal, move || escape.unsubscribe())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_dom::{DomEvent, Node};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_modal(closes: &Arc<AtomicUsize>) -> Modal {
        let counter = Arc::clone(closes);
        Modal::new("About", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_closed_modal_renders_nothing() {
        let document = Document::new();
        let closes = Arc::new(AtomicUsize::new(0));
        assert!(counting_modal(&closes).render(&document, false).unwrap().is_none());
        assert_eq!(document.listener_count("keydown").unwrap(), 0);
    }

    #[test]
    fn test_escape_closes_until_cleanup() {
        let document = Document::new();
        let closes = Arc::new(AtomicUsize::new(0));
        let view = counting_modal(&closes).size(ModalSize::Xl).render(&document, true).unwrap().unwrap();
        assert!(view.el().find_all(|n| n.has_class("max-w-4xl")).len() == 1);

        let body = document.body().clone();
        document.dispatch_global(DomEvent::new("keydown", body.clone()).with_key("Enter")).unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        document.dispatch_global(DomEvent::new("keydown", body.clone()).with_key("Escape")).unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let (_, cleanup) = view.into_parts();
        cleanup.unwrap()();
        assert_eq!(document.listener_count("keydown").unwrap(), 0);
        document.dispatch_global(DomEvent::new("keydown", body).with_key("Escape")).unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_only_backdrop_and_close_button_close() {
        let document = Document::new();
        let closes = Arc::new(AtomicUsize::new(0));
        let content = Node::text("Hello");
        let view = counting_modal(&closes)
            .child(el("p", [], children![content.clone()]))
            .render(&document, true)
            .unwrap()
            .unwrap();
        let backdrop = view.el().clone();
        document.body().append_child(backdrop.clone());

        document.dispatch(DomEvent::new("click", content)).unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 0);

        document.dispatch(DomEvent::new("click", backdrop.clone())).unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let close = backdrop.find_by_tag("button").remove(0);
        assert_eq!(close.text_content(), "×");
        document.dispatch(DomEvent::new("click", close)).unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }
}
