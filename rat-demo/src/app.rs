use crate::features::todo::{self, TodoStore};
use crate::pages;
use rat_dom::{Document, EventBus, Route, RouteChange};
use tracing::warn;

/// Payload of every event on the application bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Navigated(RouteChange),
    Toast(String),
    ModalOpened { title: String },
    ModalClosed { title: String },
}

impl From<RouteChange> for AppEvent {
    fn from(change: RouteChange) -> Self {
        AppEvent::Navigated(change)
    }
}

/// Handles shared by every page.
#[derive(Clone)]
pub struct Services {
    pub document: Document,
    pub bus: EventBus<AppEvent>,
    pub todos: TodoStore,
}

impl Services {
    /// Show a short message in the status line.
    pub fn toast(&self, message: impl Into<String>) {
        let event = AppEvent::Toast(message.into());
        if let Err(e) = self.bus.emit(rat_dom::events::names::TOAST_SHOW, &event) {
            warn!(error = %e, "toast dropped");
        }
    }
}

/// The application's route table.
pub fn routes(services: &Services) -> Vec<Route> {
    let for_home = services.clone();
    let for_todo = services.clone();
    vec![
        Route::page("/", move || pages::home::home_page(&for_home)),
        Route::page("/todo", move || todo::view::todo_list(&for_todo)),
        Route::page("*", pages::not_found::not_found_page),
    ]
}

/// Fresh services over in-memory storage.
#[cfg(test)]
pub(crate) fn test_services() -> Services {
    use crate::features::todo::MockTodoService;
    use std::sync::Arc;

    let todos = TodoStore::new(Arc::new(MockTodoService), Arc::new(rat_dom::MemoryStorage::new()))
        .expect("memory storage never fails");
    Services {
        document: Document::new(),
        bus: EventBus::new(),
        todos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rat_dom::events::names;
    use rat_dom::{MemoryHistory, Router};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_routes_resolve_each_page() {
        let services = test_services();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        services
            .bus
            .on(names::ROUTER_CHANGE, move |event: &AppEvent| sink.lock().unwrap().push(event.clone()))
            .unwrap();
        let router = Router::new(
            routes(&services),
            services.document.root().clone(),
            Arc::new(MemoryHistory::default()),
            services.bus.clone(),
        )
        .unwrap();

        router.resolve().await.unwrap();
        assert!(services.document.root().text_content().contains("Vanilla JS Architecture"));

        router.navigate("/todo").await.unwrap();
        assert!(services.document.root().text_content().contains("Todo App"));

        let change = router.navigate("/nope").await.unwrap().unwrap();
        assert_eq!(change.route, "*");
        assert!(services.document.root().text_content().contains("Not found"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen[1],
            AppEvent::Navigated(RouteChange {
                path: "/todo".into(),
                route: "/todo".into()
            })
        );
    }

    #[test]
    fn test_toast_reaches_bus() {
        let services = test_services();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        services
            .bus
            .on(names::TOAST_SHOW, move |event: &AppEvent| *sink.lock().unwrap() = Some(event.clone()))
            .unwrap();
        services.toast("saved");
        assert_eq!(*seen.lock().unwrap(), Some(AppEvent::Toast("saved".into())));
    }
}
