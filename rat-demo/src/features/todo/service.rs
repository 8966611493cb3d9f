use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Creation time in milliseconds since the epoch.
    pub id: u64,
    pub text: String,
    pub completed: bool,
}

impl Todo {
    pub fn new(id: u64, text: impl Into<String>, completed: bool) -> Self {
        Self {
            id,
            text: text.into(),
            completed,
        }
    }
}

/// Where todos come from and go to.
#[async_trait]
pub trait TodoService: Send + Sync {
    async fn fetch_todos(&self) -> anyhow::Result<Vec<Todo>>;

    /// Build a new, not yet completed todo. Nothing is stored.
    fn create_todo(&self, text: &str) -> Todo;

    async fn save_todo(&self, todo: Todo) -> anyhow::Result<Todo>;

    async fn delete_todo(&self, id: u64) -> anyhow::Result<u64>;
}

/// In-memory stand-in for a backend: a fixed seed list, echoing writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockTodoService;

impl MockTodoService {
    pub fn seed() -> Vec<Todo> {
        vec![
            Todo::new(1, "Learn vanilla JS architecture", false),
            Todo::new(2, "Build a todo app", false),
            Todo::new(3, "Master functional components", true),
        ]
    }
}

#[async_trait]
impl TodoService for MockTodoService {
    async fn fetch_todos(&self) -> anyhow::Result<Vec<Todo>> {
        Ok(Self::seed())
    }

    fn create_todo(&self, text: &str) -> Todo {
        let id = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        Todo::new(id, text, false)
    }

    async fn save_todo(&self, todo: Todo) -> anyhow::Result<Todo> {
        Ok(todo)
    }

    async fn delete_todo(&self, id: u64) -> anyhow::Result<u64> {
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_service() {
        let service = MockTodoService;
        let todos = service.fetch_todos().await.unwrap();
        assert_eq!(todos.len(), 3);
        assert_eq!(todos[0], Todo::new(1, "Learn vanilla JS architecture", false));
        assert!(todos[2].completed);

        let before = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap();
        let todo = service.create_todo("Buy milk");
        assert!(todo.id >= before);
        assert_eq!(todo.text, "Buy milk");
        assert!(!todo.completed);

        assert_eq!(service.save_todo(todo.clone()).await.unwrap(), todo);
        assert_eq!(service.delete_todo(7).await.unwrap(), 7);
    }

    #[test]
    fn test_todo_json_shape() {
        let json = serde_json::to_string(&Todo::new(5, "x", true)).unwrap();
        assert_eq!(json, r#"{"id":5,"text":"x","completed":true}"#);
    }
}
