use crate::app::{AppEvent, Services};
use crate::components::{Button, Modal, ModalSize, Variant};
use rat_dom::events::names;
use rat_dom::router::{Cleanup, LINK_ATTRIBUTE};
use rat_dom::{children, el, Attr, Node, Signal, View};
use std::sync::{Arc, Mutex};
use tracing::error;

const ABOUT_TITLE: &str = "About this demo";

const FEATURES: [(&str, &str, &str); 3] = [
    (
        "⚡",
        "Zero Runtime Dependencies",
        "No framework overhead. A small retained node tree and a handful of reactive cells.",
    ),
    (
        "🎨",
        "Functional Components",
        "Views are plain functions over signals and stores, with no virtual DOM to diff.",
    ),
    (
        "🔧",
        "Modern Tooling",
        "Rendered with ratatui, driven by tokio, tested with cargo test and proptest.",
    ),
];

const HIGHLIGHTS: [&str; 4] = [
    "Store with a single write path and fine-grained change notification",
    "History router with async views and last-navigation-wins resolution",
    "Pub/Sub event bus for decoupled component communication",
    "Feature-first layout with components kept next to their feature",
];

type MountedModal = Arc<Mutex<Option<(Node, Option<Cleanup>)>>>;

fn feature_card(icon: &str, title: &str, body: &str) -> Node {
    el(
        "div",
        [Attr::class("bg-white p-6 rounded-xl shadow-md")],
        children![
            el("span", [Attr::class("text-2xl")], children![icon]),
            el("h3", [Attr::class("text-xl font-bold mb-2 text-gray-900")], children![title]),
            el("p", [Attr::class("text-gray-600")], children![body]),
        ],
    )
}

/// Mount or unmount the about dialog to match `is_open`.
fn sync_modal(services: &Services, open: &Signal<bool>, mounted: &MountedModal, is_open: bool) -> rat_dom::Result<()> {
    let previous = mounted.lock().map_err(|_| rat_dom::Error::LockPoisoned)?.take();
    if let Some((node, cleanup)) = previous {
        node.remove();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
        services.bus.emit(names::MODAL_CLOSE, &AppEvent::ModalClosed { title: ABOUT_TITLE.into() })?;
    }
    if !is_open {
        return Ok(());
    }

    let close = open.clone();
    let modal = Modal::new(ABOUT_TITLE, move || {
        close.set(false);
    })
    .size(ModalSize::Lg)
    .child(el(
        "p",
        [],
        children!["A two-page app built from a router, a store and an event bus. Press Esc to close."],
    ))
    .render(&services.document, true)?;

    if let Some(view) = modal {
        let (node, cleanup) = view.into_parts();
        services.document.body().append_child(node.clone());
        *mounted.lock().map_err(|_| rat_dom::Error::LockPoisoned)? = Some((node, cleanup));
        services.bus.emit(names::MODAL_OPEN, &AppEvent::ModalOpened { title: ABOUT_TITLE.into() })?;
    }
    Ok(())
}

/// The landing page.
pub fn home_page(services: &Services) -> rat_dom::Result<View> {
    let open = Signal::new(false);
    let mounted: MountedModal = Arc::new(Mutex::new(None));

    let modal_effect = {
        let services = services.clone();
        let signal = open.clone();
        let mounted = Arc::clone(&mounted);
        open.effect(move |is_open| {
            if let Err(e) = sync_modal(&services, &signal, &mounted, *is_open) {
                error!(error = %e, "about dialog failed");
            }
        })
    };

    let opener = open.clone();
    let about = Button::new(ABOUT_TITLE)
        .variant(Variant::Secondary)
        .on_click(move |_| {
            opener.set(true);
            Ok(())
        })
        .build();

    let page = el(
        "div",
        [Attr::class("max-w-4xl mx-auto py-16 px-4")],
        children![
            el(
                "div",
                [Attr::class("text-center mb-12")],
                children![
                    el("h1", [Attr::class("text-5xl font-bold mb-4 text-gray-900")], children!["Vanilla JS Architecture"]),
                    el(
                        "p",
                        [Attr::class("text-xl text-gray-600 mb-8")],
                        children!["Modern JavaScript without frameworks - pure performance and control"],
                    ),
                    el(
                        "div",
                        [Attr::class("flex justify-center gap-4")],
                        children![
                            el(
                                "a",
                                [
                                    Attr::attr("href", "/todo"),
                                    Attr::flag(LINK_ATTRIBUTE, true),
                                    Attr::class("px-8 py-3 bg-blue-600 text-white font-semibold rounded-lg"),
                                ],
                                children!["Try Todo App"],
                            ),
                            " ",
                            el(
                                "a",
                                [
                                    Attr::attr("href", "https://github.com"),
                                    Attr::attr("target", "_blank"),
                                    Attr::class("px-8 py-3 bg-gray-800 text-white font-semibold rounded-lg"),
                                ],
                                children!["View on GitHub"],
                            ),
                            " ",
                            about,
                        ],
                    ),
                ],
            ),
            el(
                "div",
                [Attr::class("grid md:grid-cols-3 gap-8 mb-12")],
                FEATURES.iter().map(|(icon, title, body)| feature_card(icon, title, body).into()),
            ),
            el(
                "div",
                [Attr::class("rounded-xl p-8 shadow-xl")],
                children![
                    el("h2", [Attr::class("text-3xl font-bold mb-4")], children!["Architecture Highlights"]),
                    el(
                        "ul",
                        [Attr::class("space-y-3")],
                        HIGHLIGHTS.iter().map(|item| {
                            el(
                                "li",
                                [Attr::class("flex items-start gap-3")],
                                children![el("span", [Attr::class("text-green-300")], children!["✓ "]), *item],
                            )
                            .into()
                        }),
                    ),
                ],
            ),
        ],
    );

    Ok(View::with_cleanup(page, move || {
        open.set(false);
        modal_effect.unsubscribe();
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_services;
    use rat_dom::DomEvent;

    #[test]
    fn test_home_links() {
        let services = test_services();
        let view = home_page(&services).unwrap();
        let page = view.el();

        assert!(page.text_content().contains("Vanilla JS Architecture"));
        assert_eq!(page.find_by_tag("h3").len(), 3);
        assert_eq!(page.find_by_tag("li").len(), 4);

        let links = page.find_by_tag("a");
        assert_eq!(links[0].attribute("href").as_deref(), Some("/todo"));
        assert!(links[0].has_attribute(LINK_ATTRIBUTE));
        assert!(!links[1].has_attribute(LINK_ATTRIBUTE));
    }

    #[test]
    fn test_about_dialog_opens_and_closes() {
        let services = test_services();
        let events = Arc::new(Mutex::new(Vec::new()));
        for name in [names::MODAL_OPEN, names::MODAL_CLOSE] {
            let sink = Arc::clone(&events);
            services
                .bus
                .on(name, move |event: &AppEvent| sink.lock().unwrap().push(event.clone()))
                .unwrap();
        }

        let view = home_page(&services).unwrap();
        services.document.root().append_child(view.el().clone());
        let about = view
            .el()
            .find_by_tag("button")
            .into_iter()
            .find(|b| b.text_content() == ABOUT_TITLE)
            .unwrap();

        services.document.dispatch(DomEvent::new("click", about)).unwrap();
        assert_eq!(services.document.body().child_count(), 2);
        assert_eq!(services.document.listener_count("keydown").unwrap(), 1);

        let body = services.document.body().clone();
        services
            .document
            .dispatch_global(DomEvent::new("keydown", body).with_key("Escape"))
            .unwrap();
        assert_eq!(services.document.body().child_count(), 1);
        assert_eq!(services.document.listener_count("keydown").unwrap(), 0);

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                AppEvent::ModalOpened { title: ABOUT_TITLE.into() },
                AppEvent::ModalClosed { title: ABOUT_TITLE.into() },
            ]
        );
    }

    #[test]
    fn test_cleanup_closes_open_dialog() {
        let services = test_services();
        let view = home_page(&services).unwrap();
        let about = view.el().find_by_tag("button").remove(0);
        services.document.root().append_child(view.el().clone());
        services.document.dispatch(DomEvent::new("click", about)).unwrap();
        assert_eq!(services.document.body().child_count(), 2);

        let (_, cleanup) = view.into_parts();
        cleanup.unwrap()();
        assert_eq!(services.document.body().child_count(), 1);
        assert_eq!(services.document.listener_count("keydown").unwrap(), 0);
    }
}
