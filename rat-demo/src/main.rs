//! Home page and todo list, rendered in the terminal with rat-dom.

mod app;
mod components;
mod config;
mod features;
mod pages;

use crate::app::{AppEvent, Services};
use crate::config::Config;
use crate::features::todo::{MockTodoService, TodoStore};
use clap::Parser;
use rat_dom::events::names;
use rat_dom::{Application, Browser, Document, EventBus, MemoryHistory, Router, SubscriptionSet};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    config.init_tracing()?;
    info!(path = config.path.as_str(), ephemeral = config.ephemeral, "rat-demo starting");

    let storage = config.open_storage()?;
    let todos = TodoStore::open(Arc::new(MockTodoService), storage).await?;
    info!(restored = todos.is_restored(), count = todos.todos()?.len(), "todos ready");

    let document = Document::new();
    let bus = EventBus::<AppEvent>::new();
    let services = Services {
        document: document.clone(),
        bus: bus.clone(),
        todos: todos.clone(),
    };

    let history = Arc::new(MemoryHistory::new(config.path.clone()));
    let router = Router::new(app::routes(&services), document.root().clone(), history, bus.clone())?;

    let application = Application::new().tick_rate(config.tick_rate());
    let browser = Browser::new(document.clone(), router.clone()).title("rat-demo");

    let mut subs = SubscriptionSet::new();
    subs.track(router.install(&document)?);
    let status = browser.status().clone();
    subs.track(bus.on(names::TOAST_SHOW, move |event: &AppEvent| {
        if let AppEvent::Toast(message) = event {
            status.set(message.clone());
        }
    })?);
    let status = browser.status().clone();
    subs.track(bus.on(names::TOAST_HIDE, move |_| {
        status.set(String::new());
    })?);
    let refresh = application.refresher();
    subs.track(bus.on(names::ROUTER_CHANGE, move |event: &AppEvent| {
        if let AppEvent::Navigated(change) = event {
            info!(path = change.path.as_str(), route = change.route.as_str(), "page shown");
        }
        let _ = refresh.send(());
    })?);
    let refresh = application.refresher();
    subs.track(todos.subscribe(move |_, _| {
        let _ = refresh.send(());
    })?);

    router.resolve().await?;
    let result = application.run(browser).await;
    info!("rat-demo exiting");
    result
}
