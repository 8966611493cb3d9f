//! The todo list page.

use super::service::Todo;
use super::store::{Filter, TodoStore};
use crate::app::Services;
use crate::components::{Button, Size, Variant};
use rat_dom::{children, el, Attr, DomEvent, Node, Signal, SubscriptionSet, View};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

/// A node that is swapped for a fresh one on every update.
struct Slot(Mutex<Node>);

impl Slot {
    fn new(node: Node) -> Self {
        Self(Mutex::new(node))
    }

    fn node(&self) -> rat_dom::Result<Node> {
        Ok(self.0.lock().map_err(|_| rat_dom::Error::LockPoisoned)?.clone())
    }

    fn swap(&self, next: Node) -> rat_dom::Result<()> {
        let mut current = self.0.lock().map_err(|_| rat_dom::Error::LockPoisoned)?;
        current.replace_with(next.clone());
        *current = next;
        Ok(())
    }
}

/// The parts of the page that change after an action.
struct Parts {
    notice: Node,
    stats: Slot,
    filters: Slot,
    list: Node,
    clear: Node,
}

fn render_item(todos: &TodoStore, todo: &Todo) -> Node {
    let id = todo.id;
    let toggler = todos.clone();
    let text_class = if todo.completed {
        "flex-1 line-through text-gray-400"
    } else {
        "flex-1 text-gray-900"
    };
    el(
        "li",
        [
            Attr::class("todo-item flex items-center gap-3 p-4 bg-white rounded-lg"),
            Attr::dataset([("id", id.to_string())]),
        ],
        children![
            el(
                "input",
                [
                    Attr::attr("type", "checkbox"),
                    Attr::flag("checked", todo.completed),
                    Attr::class("w-5 h-5 rounded border-gray-300"),
                    Attr::on("change", move |_| toggler.toggle_todo(id)),
                ],
                [],
            ),
            " ",
            el("span", [Attr::class(text_class)], children![todo.text.as_str()]),
            " ",
            delete_button(todos, id),
        ],
    )
}

fn delete_button(todos: &TodoStore, id: u64) -> Node {
    let todos = todos.clone();
    Button::new("Delete")
        .variant(Variant::Danger)
        .size(Size::Sm)
        .on_click(move |_| todos.delete_todo(id))
        .build()
}

fn render_filters(todos: &TodoStore, current: Filter) -> Node {
    el(
        "div",
        [Attr::class("filters flex gap-2")],
        Filter::ALL.iter().map(|&filter| {
            let todos = todos.clone();
            let class = if filter == current {
                "px-4 py-2 rounded-lg font-medium bg-blue-600 text-white"
            } else {
                "px-4 py-2 rounded-lg font-medium bg-gray-200 text-gray-700"
            };
            el(
                "button",
                [
                    Attr::attr("type", "button"),
                    Attr::class(class),
                    Attr::dataset([("filter", format!("{filter:?}").to_lowercase())]),
                    Attr::on("click", move |_| todos.set_filter(filter)),
                ],
                children![filter.label()],
            )
            .into()
        }),
    )
}

fn render_stats(todos: &TodoStore) -> rat_dom::Result<Node> {
    let stats = todos.stats()?;
    Ok(el("div", [Attr::class("stats text-sm text-gray-600")], children![stats.to_string()]))
}

fn render_clear(todos: &TodoStore) -> rat_dom::Result<Vec<Node>> {
    if todos.stats()?.completed == 0 {
        return Ok(Vec::new());
    }
    let todos = todos.clone();
    Ok(vec![Button::new("Clear completed")
        .variant(Variant::Secondary)
        .attr(Attr::class("clear-completed mt-6 w-full px-4 py-2 text-gray-600 rounded-lg"))
        .on_click(move |_| todos.clear_completed())
        .build()])
}

fn render_notice(todos: &TodoStore) -> rat_dom::Result<Vec<Node>> {
    if todos.is_loading()? {
        return Ok(vec![el("p", [Attr::class("text-gray-500")], children!["Loading…"])]);
    }
    Ok(todos
        .error()?
        .map(|message| el("p", [Attr::class("text-red-600")], children![format!("Error: {message}")]))
        .into_iter()
        .collect())
}

fn update_ui(todos: &TodoStore, parts: &Parts) -> rat_dom::Result<()> {
    let items: Vec<Node> = todos.filtered()?.iter().map(|t| render_item(todos, t)).collect();
    debug!(items = items.len(), "re-rendering todo list");
    parts.list.replace_children(items);
    parts.filters.swap(render_filters(todos, todos.filter()?))?;
    parts.stats.swap(render_stats(todos)?)?;
    parts.clear.replace_children(render_clear(todos)?);
    parts.notice.replace_children(render_notice(todos)?);
    Ok(())
}

/// The todo page: an add form, stats, filters and the list.
///
/// The page re-renders its changing parts from a store subscription; the
/// returned cleanup detaches it.
pub fn todo_list(services: &Services) -> rat_dom::Result<View> {
    let todos = services.todos.clone();
    let input_value = Signal::new(String::new());
    let mut subs = SubscriptionSet::new();

    let writer = input_value.clone();
    let input = el(
        "input",
        [
            Attr::attr("type", "text"),
            Attr::class("flex-1 px-4 py-3 border border-gray-300 rounded-lg"),
            Attr::attr("placeholder", "What needs to be done?"),
            Attr::on("input", move |event| {
                writer.set(event.target().value());
                Ok(())
            }),
        ],
        [],
    );
    let bound = input.clone();
    subs.track(input_value.effect(move |value: &String| {
        if bound.value() != *value {
            bound.set_value(value.clone());
        }
    }));

    let submit = {
        let todos = todos.clone();
        let services = services.clone();
        let value = input_value.clone();
        move |event: &DomEvent| -> rat_dom::Result<()> {
            event.prevent_default();
            let text = value.get().trim().to_string();
            if !text.is_empty() {
                todos.add_todo(&text)?;
                value.set(String::new());
                services.toast(format!("Added \"{text}\""));
            }
            Ok(())
        }
    };

    let parts = Arc::new(Parts {
        notice: el("div", [Attr::class("notice")], children![render_notice(&todos)?]),
        stats: Slot::new(render_stats(&todos)?),
        filters: Slot::new(render_filters(&todos, todos.filter()?)),
        list: el(
            "ul",
            [Attr::class("todo-list space-y-3")],
            todos.filtered()?.iter().map(|t| render_item(&todos, t).into()),
        ),
        clear: el("div", [], children![render_clear(&todos)?]),
    });

    let container = el(
        "div",
        [Attr::class("max-w-2xl mx-auto py-8 px-4")],
        children![
            el("h1", [Attr::class("text-4xl font-bold text-center mb-8 text-gray-900")], children!["Todo App"]),
            parts.notice.clone(),
            el(
                "form",
                [Attr::class("mb-8"), Attr::on("submit", submit)],
                children![el(
                    "div",
                    [Attr::class("flex gap-3")],
                    children![
                        input,
                        el(
                            "button",
                            [Attr::attr("type", "submit"), Attr::class("px-6 py-3 bg-blue-600 text-white font-semibold rounded-lg")],
                            children!["Add"],
                        ),
                    ],
                )],
            ),
            parts.stats.node()?,
            parts.filters.node()?,
            el("div", [Attr::class("flex justify-between items-center mb-4")], children![el(
                "span",
                [Attr::class("text-sm text-gray-500")],
                children!["Show:"]
            )]),
            parts.list.clone(),
            parts.clear.clone(),
        ],
    );

    let store = todos.clone();
    subs.track(todos.subscribe(move |_, change| {
        debug!(key = %change.key, "todo state changed");
        if let Err(e) = update_ui(&store, &parts) {
            error!(error = %e, "todo list update failed");
        }
    })?);

    Ok(View::with_cleanup(container, move || {
        let mut subs = subs;
        subs.unsubscribe_all();
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{test_services, AppEvent};
    use rat_dom::events::names;

    struct Page {
        services: Services,
        cleanup: Option<rat_dom::router::Cleanup>,
    }

    impl Page {
        async fn open() -> Self {
            let services = test_services();
            services.todos.load_todos().await.unwrap();
            let (node, cleanup) = todo_list(&services).unwrap().into_parts();
            services.document.root().append_child(node);
            Self { services, cleanup }
        }

        fn root(&self) -> &Node {
            self.services.document.root()
        }

        fn dispatch(&self, kind: &str, target: Node) -> DomEvent {
            self.services.document.dispatch(DomEvent::new(kind, target)).unwrap()
        }

        fn items(&self) -> Vec<Node> {
            self.root().find_all(|n| n.has_class("todo-item"))
        }

        fn item_texts(&self) -> Vec<String> {
            self.items().iter().map(|li| li.find_by_tag("span")[0].text_content()).collect()
        }

        fn stats(&self) -> String {
            self.root().find_all(|n| n.has_class("stats"))[0].text_content()
        }

        fn button(&self, label: &str) -> Option<Node> {
            self.root().find_by_tag("button").into_iter().find(|b| b.text_content() == label)
        }

        fn add(&self, text: &str) {
            let input = self.root().find_by_tag("input").remove(0);
            input.set_value(text);
            self.dispatch("input", input);
            let form = self.root().find_by_tag("form").remove(0);
            let submitted = self.dispatch("submit", form);
            assert!(submitted.default_prevented());
        }
    }

    #[tokio::test]
    async fn test_initial_render() {
        let page = Page::open().await;
        assert_eq!(
            page.item_texts(),
            vec!["Learn vanilla JS architecture", "Build a todo app", "Master functional components"]
        );
        assert_eq!(page.stats(), "2 items left · 1 completed · 3 total");
        assert!(page.button("Clear completed").is_some());
        let done = &page.items()[2];
        assert!(done.find_by_tag("span")[0].has_class("line-through"));
        assert!(done.find_by_tag("input")[0].checked());
    }

    #[tokio::test]
    async fn test_add_toggle_filter_delete_clear() {
        let page = Page::open().await;
        let toasts = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&toasts);
        page.services
            .bus
            .on(names::TOAST_SHOW, move |e: &AppEvent| sink.lock().unwrap().push(e.clone()))
            .unwrap();

        page.add("  Buy milk ");
        assert_eq!(page.item_texts().last().map(String::as_str), Some("Buy milk"));
        assert_eq!(page.root().find_by_tag("input")[0].value(), "");
        assert_eq!(page.stats(), "3 items left · 1 completed · 4 total");
        assert_eq!(*toasts.lock().unwrap(), vec![AppEvent::Toast("Added \"Buy milk\"".into())]);

        page.add("   ");
        assert_eq!(page.items().len(), 4);

        let milk = page.items().pop().unwrap();
        let checkbox = milk.find_by_tag("input").remove(0);
        checkbox.set_checked(true);
        page.dispatch("change", checkbox);
        let milk = page.items().pop().unwrap();
        assert!(milk.find_by_tag("span")[0].has_class("line-through"));
        assert_eq!(page.stats(), "2 items left · 2 completed · 4 total");

        page.dispatch("click", page.button("Active").unwrap());
        assert_eq!(page.item_texts(), vec!["Learn vanilla JS architecture", "Build a todo app"]);
        assert!(page.button("Active").unwrap().has_class("bg-blue-600"));
        assert!(!page.button("All").unwrap().has_class("bg-blue-600"));

        let first_delete = page.items()[0].find_by_tag("button").remove(0);
        page.dispatch("click", first_delete);
        assert_eq!(page.item_texts(), vec!["Build a todo app"]);

        page.dispatch("click", page.button("All").unwrap());
        page.dispatch("click", page.button("Clear completed").unwrap());
        assert_eq!(page.item_texts(), vec!["Build a todo app"]);
        assert_eq!(page.stats(), "1 items left · 0 completed · 1 total");
        assert!(page.button("Clear completed").is_none());
    }

    #[tokio::test]
    async fn test_cleanup_detaches_store_listener() {
        let mut page = Page::open().await;
        let before = page.services.todos.store().listener_count().unwrap();

        (page.cleanup.take().unwrap())();
        assert_eq!(page.services.todos.store().listener_count().unwrap(), before - 1);

        let items = page.items().len();
        page.services.todos.add_todo("after cleanup").unwrap();
        assert_eq!(page.items().len(), items);
    }

    #[tokio::test]
    async fn test_error_notice() {
        let page = Page::open().await;
        page.services
            .todos
            .store()
            .set(super::super::store::TodoStateValue::Error(Some("offline".into())))
            .unwrap();
        assert!(page.root().text_content().contains("Error: offline"));
    }
}
