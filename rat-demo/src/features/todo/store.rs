//! Todo state and the actions that change it.

use super::service::{Todo, TodoService};
use rat_dom::{define_record, Storage, Store, Subscription};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Local storage key of the persisted todo list.
pub const STORAGE_KEY: &str = "todos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !todo.completed,
            Filter::Completed => todo.completed,
        }
    }
}

define_record! {
    #[derive(Debug, Clone, Default)]
    pub struct TodoState {
        todos: Vec<Todo>,
        filter: Filter,
        loading: bool,
        error: Option<String>,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} items left · {} completed · {} total",
            self.active, self.completed, self.total
        )
    }
}

/// The todo feature's store plus its actions.
///
/// Every write is persisted to local storage under [`STORAGE_KEY`].
#[derive(Clone)]
pub struct TodoStore {
    store: Store<TodoState>,
    service: Arc<dyn TodoService>,
    restored: bool,
}

impl TodoStore {
    /// Create the store, restoring todos saved by an earlier session.
    pub fn new(service: Arc<dyn TodoService>, storage: Arc<dyn Storage>) -> rat_dom::Result<Self> {
        let store = Store::new(TodoState::default());

        let restored = match storage.get_item(STORAGE_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<Todo>>(&raw) {
                Ok(todos) => {
                    info!(count = todos.len(), "restored todos");
                    store.set(TodoStateValue::Todos(todos))?;
                    true
                }
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable saved todos");
                    false
                }
            },
            None => {
                debug!("no saved todos");
                false
            }
        };

        // Lives as long as the store itself.
        let _persist = store.subscribe(move |store, _change| {
            if let Err(e) = persist(store, storage.as_ref()) {
                error!(error = %e, "failed to persist todos");
            }
        })?;

        Ok(Self {
            store,
            service,
            restored,
        })
    }

    /// Like [`TodoStore::new`], then fetch from the service unless an earlier
    /// session left a list behind. A saved empty list stays empty.
    pub async fn open(service: Arc<dyn TodoService>, storage: Arc<dyn Storage>) -> rat_dom::Result<Self> {
        let todos = Self::new(service, storage)?;
        if !todos.restored {
            todos.load_todos().await?;
        }
        Ok(todos)
    }

    /// Whether the todos came from local storage.
    pub fn is_restored(&self) -> bool {
        self.restored
    }

    pub fn store(&self) -> &Store<TodoState> {
        &self.store
    }

    pub fn subscribe<F>(&self, listener: F) -> rat_dom::Result<Subscription>
    where
        F: Fn(&Store<TodoState>, &rat_dom::Change<TodoState>) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn todos(&self) -> rat_dom::Result<Vec<Todo>> {
        self.store.read(|s| s.todos.clone())
    }

    pub fn filter(&self) -> rat_dom::Result<Filter> {
        self.store.read(|s| s.filter)
    }

    pub fn is_loading(&self) -> rat_dom::Result<bool> {
        self.store.read(|s| s.loading)
    }

    pub fn error(&self) -> rat_dom::Result<Option<String>> {
        self.store.read(|s| s.error.clone())
    }

    /// Fetch todos from the service. A failure is recorded in `error`, not returned.
    pub async fn load_todos(&self) -> rat_dom::Result<()> {
        self.store.set(TodoStateValue::Loading(true))?;
        self.store.set(TodoStateValue::Error(None))?;

        match self.service.fetch_todos().await {
            Ok(todos) => {
                info!(count = todos.len(), "loaded todos");
                self.store.set(TodoStateValue::Todos(todos))?;
            }
            Err(e) => {
                warn!(error = %e, "loading todos failed");
                self.store.set(TodoStateValue::Error(Some(e.to_string())))?;
            }
        }

        self.store.set(TodoStateValue::Loading(false))?;
        Ok(())
    }

    pub fn add_todo(&self, text: &str) -> rat_dom::Result<Todo> {
        let todo = self.service.create_todo(text);
        let added = todo.clone();
        self.edit_todos(move |mut todos| {
            todos.push(added);
            todos
        })?;
        Ok(todo)
    }

    pub fn toggle_todo(&self, id: u64) -> rat_dom::Result<()> {
        self.edit_todos(|todos| {
            todos
                .into_iter()
                .map(|t| if t.id == id { Todo { completed: !t.completed, ..t } } else { t })
                .collect()
        })
    }

    pub fn delete_todo(&self, id: u64) -> rat_dom::Result<()> {
        self.edit_todos(|todos| todos.into_iter().filter(|t| t.id != id).collect())
    }

    pub fn set_filter(&self, filter: Filter) -> rat_dom::Result<()> {
        self.store.set(TodoStateValue::Filter(filter))?;
        Ok(())
    }

    pub fn clear_completed(&self) -> rat_dom::Result<()> {
        self.edit_todos(|todos| todos.into_iter().filter(|t| !t.completed).collect())
    }

    /// Todos passing the current filter.
    pub fn filtered(&self) -> rat_dom::Result<Vec<Todo>> {
        self.store
            .read(|s| s.todos.iter().filter(|t| s.filter.matches(t)).cloned().collect())
    }

    pub fn stats(&self) -> rat_dom::Result<Stats> {
        self.store.read(|s| {
            let total = s.todos.len();
            let completed = s.todos.iter().filter(|t| t.completed).count();
            Stats {
                total,
                completed,
                active: total - completed,
            }
        })
    }

    fn edit_todos<F>(&self, f: F) -> rat_dom::Result<()>
    where
        F: FnOnce(Vec<Todo>) -> Vec<Todo>,
    {
        self.store.update(TodoStateKey::Todos, |value| match value {
            TodoStateValue::Todos(todos) => TodoStateValue::Todos(f(todos)),
            other => other,
        })?;
        Ok(())
    }
}

impl std::fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoStore").finish_non_exhaustive()
    }
}

fn persist(store: &Store<TodoState>, storage: &dyn Storage) -> anyhow::Result<()> {
    let json = store.read(|s| serde_json::to_string(&s.todos))??;
    storage.set_item(STORAGE_KEY, &json)?;
    Ok(())
}
