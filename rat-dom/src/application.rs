//! Terminal host for a node tree: a tiny keyboard-driven browser.

use crate::dom::{Document, DomEvent, Node};
use crate::error::TerminalSnafu;
use crate::render;
use crate::router::{RouteChange, Router};
use crate::state::Signal;
use crate::subscription::Subscription;
use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use snafu::ResultExt;
use std::io::{self, stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Focus, scrolling and input handling on top of a [`Document`] and its [`Router`].
pub struct Browser<P> {
    document: Document,
    router: Router<P>,
    title: String,
    focus: Option<Node>,
    focus_index: usize,
    scroll: u16,
    status: Signal<String>,
}

impl<P> Browser<P>
where
    P: From<RouteChange> + Send + Sync + 'static,
{
    pub fn new(document: Document, router: Router<P>) -> Self {
        Self {
            document,
            router,
            title: "rat-dom".to_string(),
            focus: None,
            focus_index: 0,
            scroll: 0,
            status: Signal::new(String::new()),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn router(&self) -> &Router<P> {
        &self.router
    }

    /// Footer message; anything may write to it (toasts, handler errors).
    pub fn status(&self) -> &Signal<String> {
        &self.status
    }

    pub fn focused(&self) -> Option<&Node> {
        self.focus.as_ref()
    }

    pub fn focus(&mut self, node: &Node) {
        let list = render::focusables(self.document.body());
        if let Some(index) = list.iter().position(|n| n == node) {
            self.focus_index = index;
            self.focus = Some(node.clone());
        }
    }

    /// Re-anchor focus after the tree changed under it: keep the focused node if it
    /// is still reachable, otherwise take whatever now sits at the same position.
    /// Nothing is focused if nothing was.
    fn sync_focus(&mut self) -> Vec<Node> {
        let list = render::focusables(self.document.body());
        let Some(focused) = self.focus.as_ref() else {
            return list;
        };
        match list.iter().position(|n| n == focused) {
            Some(index) => self.focus_index = index,
            None if list.is_empty() => self.focus = None,
            None => {
                self.focus_index = self.focus_index.min(list.len() - 1);
                self.focus = Some(list[self.focus_index].clone());
            }
        }
        list
    }

    fn move_focus(&mut self, forward: bool) {
        let list = self.sync_focus();
        if list.is_empty() {
            return;
        }
        let next = match (&self.focus, forward) {
            (None, _) => 0,
            (Some(_), true) => (self.focus_index + 1) % list.len(),
            (Some(_), false) => (self.focus_index + list.len() - 1) % list.len(),
        };
        self.focus_index = next;
        self.focus = Some(list[next].clone());
    }

    fn focused_text_input(&self) -> Option<Node> {
        self.focus
            .as_ref()
            .filter(|n| n.tag().as_deref() == Some("input") && n.attribute("type").as_deref() != Some("checkbox"))
            .cloned()
    }

    /// Handle one key press. Handler errors are logged and shown in the status line.
    pub async fn handle_key(&mut self, key: KeyEvent) -> Flow {
        match self.dispatch_key(key).await {
            Ok(flow) => flow,
            Err(e) => {
                error!(error = %e, "event handler failed");
                self.status.set(format!("error: {e}"));
                Flow::Continue
            }
        }
    }

    async fn dispatch_key(&mut self, key: KeyEvent) -> crate::Result<Flow> {
        self.sync_focus();
        let editing = self.focused_text_input();
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(Flow::Quit),
            KeyCode::Char('q') if editing.is_none() => return Ok(Flow::Quit),
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Left if alt => {
                self.router.pop_state().await?;
            }
            KeyCode::Right if alt => {
                self.router.forward().await?;
            }
            KeyCode::Esc => {
                let event = DomEvent::new("keydown", self.document.body().clone()).with_key("Escape");
                self.document.dispatch_global(event)?;
            }
            KeyCode::Enter => self.activate(true)?,
            KeyCode::Char(' ') if editing.is_none() => self.activate(false)?,
            KeyCode::Char(c) => {
                if let Some(input) = editing {
                    let mut value = input.value();
                    value.push(c);
                    self.edit(&input, value)?;
                }
            }
            KeyCode::Backspace => match editing {
                Some(input) => {
                    let mut value = input.value();
                    value.pop();
                    self.edit(&input, value)?;
                }
                None => {
                    self.router.pop_state().await?;
                }
            },
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn edit(&self, input: &Node, value: String) -> crate::Result<()> {
        input.set_value(value);
        self.document.dispatch(DomEvent::new("input", input.clone()))?;
        Ok(())
    }

    /// Click the focused node, with the default actions a browser would take.
    fn activate(&mut self, enter: bool) -> crate::Result<()> {
        let Some(node) = self.focus.clone() else {
            return Ok(());
        };
        let tag = node.tag().unwrap_or_default();
        debug!(tag = tag.as_str(), "activate");

        match (tag.as_str(), node.attribute("type").as_deref()) {
            ("input", Some("checkbox")) => {
                node.set_checked(!node.checked());
                self.document.dispatch(DomEvent::new("click", node.clone()))?;
                self.document.dispatch(DomEvent::new("change", node))?;
            }
            ("input", _) if enter => self.submit_form(&node)?,
            ("button", kind) => {
                let clicked = self.document.dispatch(DomEvent::new("click", node.clone()))?;
                if !clicked.default_prevented() && kind != Some("button") {
                    self.submit_form(&node)?;
                }
            }
            ("a", _) => {
                let clicked = self.document.dispatch(DomEvent::new("click", node.clone()))?;
                if !clicked.default_prevented() {
                    if let Some(href) = node.attribute("href") {
                        info!(href = href.as_str(), "external link");
                        self.status.set(format!("external link: {href}"));
                    }
                }
            }
            _ => {
                self.document.dispatch(DomEvent::new("click", node))?;
            }
        }
        Ok(())
    }

    fn submit_form(&self, from: &Node) -> crate::Result<()> {
        if let Some(form) = from.closest(|n| n.tag().as_deref() == Some("form")) {
            self.document.dispatch(DomEvent::new("submit", form))?;
        }
        Ok(())
    }

    /// Draw the page, a title bar and the status line.
    pub fn draw(&mut self, frame: &mut Frame) {
        self.sync_focus();
        let [page_area, footer_area] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

        let page = render::layout(self.document.body(), self.focus.as_ref());
        let visible = page_area.height.saturating_sub(2);
        let last_top = u16::try_from(page.lines.len()).unwrap_or(u16::MAX).saturating_sub(visible);
        self.scroll = self.scroll.min(last_top);
        if let Some(line) = page.focus_line.and_then(|l| u16::try_from(l).ok()) {
            if line < self.scroll {
                self.scroll = line;
            } else if visible > 0 && line >= self.scroll.saturating_add(visible) {
                self.scroll = line + 1 - visible;
            }
        }

        let path = self.router.history().pathname();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title))
            .title_bottom(Line::from(format!(" {path} ")).right_aligned());
        frame.render_widget(Paragraph::new(page.lines).block(block).scroll((self.scroll, 0)), page_area);

        let status = self.status.get();
        let footer = if status.is_empty() {
            Line::from("Tab/Shift-Tab focus · Enter activate · Alt-← back · Esc close · q quit").dark_gray()
        } else {
            Line::from(status).yellow()
        };
        frame.render_widget(Paragraph::new(footer), footer_area);
    }
}

/// Main application handle: owns the terminal and drives a [`Browser`].
pub struct Application {
    tick_rate: Duration,
    refresh_tx: mpsc::UnboundedSender<()>,
    refresh_rx: mpsc::UnboundedReceiver<()>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        Self {
            tick_rate: Duration::from_millis(100),
            refresh_tx,
            refresh_rx,
        }
    }

    /// How long to wait for input before redrawing anyway.
    pub fn tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// A handle that wakes the loop for an immediate redraw.
    pub fn refresher(&self) -> mpsc::UnboundedSender<()> {
        self.refresh_tx.clone()
    }

    /// Redraw whenever `signal` changes.
    pub fn redraw_on<T>(&self, signal: &Signal<T>) -> Subscription
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        let tx = self.refresh_tx.clone();
        signal.effect(move |_| {
            let _ = tx.send(());
        })
    }

    /// Take over the terminal and run until the browser asks to quit.
    pub async fn run<P>(mut self, mut browser: Browser<P>) -> anyhow::Result<()>
    where
        P: From<RouteChange> + Send + Sync + 'static,
    {
        let _status = self.redraw_on(browser.status());
        let mut terminal = setup_terminal()?;
        info!("terminal ready");

        let result = self.run_loop(&mut terminal, &mut browser).await;

        restore_terminal(&mut terminal)?;
        info!("terminal restored");
        result
    }

    async fn run_loop<P>(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        browser: &mut Browser<P>,
    ) -> anyhow::Result<()>
    where
        P: From<RouteChange> + Send + Sync + 'static,
    {
        loop {
            terminal.draw(|frame| browser.draw(frame))?;

            tokio::select! {
                _ = self.refresh_rx.recv() => {}
                _ = tokio::time::sleep(self.tick_rate) => {}
            }

            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        if browser.handle_key(key).await == Flow::Quit {
                            return Ok(());
                        }
                    }
                    CrosstermEvent::Resize(w, h) => debug!(w, h, "resize"),
                    _ => {}
                }
            }
        }
    }
}

fn setup_terminal() -> crate::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context(TerminalSnafu)?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).context(TerminalSnafu)?;
    Terminal::new(CrosstermBackend::new(stdout)).context(TerminalSnafu)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> crate::Result<()> {
    disable_raw_mode().context(TerminalSnafu)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context(TerminalSnafu)?;
    terminal.show_cursor().context(TerminalSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;
    use crate::dom::{el, Attr};
    use crate::events::EventBus;
    use crate::platform::MemoryHistory;
    use crate::router::Route;
    use ratatui::backend::TestBackend;
    use std::sync::{Arc, Mutex};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn browser(routes: Vec<Route>) -> Browser<RouteChange> {
        let document = Document::new();
        let router = Router::new(
            routes,
            document.root().clone(),
            Arc::new(MemoryHistory::default()),
            EventBus::new(),
        )
        .unwrap();
        Browser::new(document, router)
    }

    #[tokio::test]
    async fn test_tab_cycles_focus() {
        let mut b = browser(vec![]);
        let first = el("button", [], children!["one"]);
        let second = el("a", [Attr::attr("href", "/x")], children!["two"]);
        b.document().root().replace_children([first.clone(), second.clone()]);

        b.handle_key(key(KeyCode::Tab)).await;
        assert_eq!(b.focused(), Some(&first));
        b.handle_key(key(KeyCode::Tab)).await;
        assert_eq!(b.focused(), Some(&second));
        b.handle_key(key(KeyCode::Tab)).await;
        assert_eq!(b.focused(), Some(&first));
        b.handle_key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)).await;
        assert_eq!(b.focused(), Some(&second));
    }

    #[tokio::test]
    async fn test_focus_reanchors_or_stays_empty() {
        let mut b = browser(vec![]);
        let old = el("button", [], children!["old"]);
        b.document().root().replace_children([old.clone()]);
        b.handle_key(key(KeyCode::Tab)).await;
        assert_eq!(b.focused(), Some(&old));

        let first = el("button", [], children!["first"]);
        let second = el("button", [], children!["second"]);
        b.document().root().replace_children([first.clone(), second.clone()]);
        b.handle_key(key(KeyCode::Tab)).await;
        assert_eq!(b.focused(), Some(&second));

        // Enter does nothing until something is focused.
        let mut fresh = browser(vec![]);
        fresh.document().root().replace_children([first.clone(), second]);
        fresh.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(fresh.focused(), None);
        fresh.handle_key(key(KeyCode::Tab)).await;
        assert_eq!(fresh.focused(), Some(&first));
    }

    #[tokio::test]
    async fn test_typing_and_submit() {
        let mut b = browser(vec![]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let input = el("input", [Attr::attr("type", "text")], []);
        let sink = Arc::clone(&seen);
        let form = el(
            "form",
            [Attr::on("submit", move |e| {
                let value = e.target().find_by_tag("input")[0].value();
                sink.lock().unwrap().push(value);
                Ok(())
            })],
            children![input.clone(), el("button", [Attr::attr("type", "submit")], children!["Add"])],
        );
        b.document().root().append_child(form);
        b.focus(&input);

        for c in "hi q".chars() {
            assert_eq!(b.handle_key(key(KeyCode::Char(c))).await, Flow::Continue);
        }
        b.handle_key(key(KeyCode::Backspace)).await;
        assert_eq!(input.value(), "hi ");
        b.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["hi ".to_string()]);

        b.handle_key(key(KeyCode::Tab)).await;
        b.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_checkbox_toggles_and_fires_change() {
        let mut b = browser(vec![]);
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        let checkbox = el(
            "input",
            [
                Attr::attr("type", "checkbox"),
                Attr::on("change", move |e| {
                    sink.lock().unwrap().push(e.target().checked());
                    Ok(())
                }),
            ],
            [],
        );
        b.document().root().append_child(checkbox.clone());
        b.focus(&checkbox);

        b.handle_key(key(KeyCode::Char(' '))).await;
        b.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(*changes.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_handler_errors_reach_status() {
        let mut b = browser(vec![]);
        let button = el(
            "button",
            [Attr::on("click", |_| Err(crate::Error::ViewLoad { message: "boom".into() }))],
            children!["Fail"],
        );
        b.document().root().append_child(button.clone());
        b.focus(&button);

        assert_eq!(b.handle_key(key(KeyCode::Enter)).await, Flow::Continue);
        assert!(b.status().get().contains("boom"));
    }

    #[tokio::test]
    async fn test_escape_and_quit() {
        let mut b = browser(vec![]);
        let keys = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&keys);
        let _sub = b
            .document()
            .add_event_listener("keydown", move |e| {
                sink.lock().unwrap().push(e.key().unwrap_or_default().to_string());
                Ok(())
            })
            .unwrap();

        b.handle_key(key(KeyCode::Esc)).await;
        assert_eq!(*keys.lock().unwrap(), vec!["Escape".to_string()]);
        assert_eq!(b.handle_key(key(KeyCode::Char('q'))).await, Flow::Quit);
        assert_eq!(
            b.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).await,
            Flow::Quit
        );
    }

    #[tokio::test]
    async fn test_backspace_goes_back() {
        let mut b = browser(vec![
            Route::page("/", || Ok(el("p", [], children!["home"]))),
            Route::page("/todo", || Ok(el("p", [], children!["todo"]))),
        ]);
        b.router().resolve().await.unwrap();
        b.router().navigate("/todo").await.unwrap();

        b.handle_key(key(KeyCode::Backspace)).await;
        assert_eq!(b.router().history().pathname(), "/");
        assert_eq!(b.document().root().text_content(), "home");

        b.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::ALT)).await;
        assert_eq!(b.document().root().text_content(), "todo");
    }

    #[test]
    fn test_draw_shows_page_and_path() {
        let mut b = browser(vec![]).title("demo");
        b.document().root().append_child(el("h1", [], children!["Welcome"]));
        b.status().set("saved".to_string());

        let mut terminal = Terminal::new(TestBackend::new(50, 8)).unwrap();
        terminal.draw(|frame| b.draw(frame)).unwrap();
        let screen: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();

        assert!(screen.contains("Welcome"));
        assert!(screen.contains(" demo "));
        assert!(screen.contains(" / "));
        assert!(screen.contains("saved"));
    }

    #[tokio::test]
    async fn test_page_down_stops_at_last_line() {
        let mut b = browser(vec![]);
        let items: Vec<Node> = (0..30).map(|i| el("p", [], children![format!("line {i}")])).collect();
        b.document().root().replace_children(items);
        for _ in 0..7000 {
            b.handle_key(key(KeyCode::PageDown)).await;
        }
        assert_eq!(b.scroll, u16::MAX);

        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal.draw(|frame| b.draw(frame)).unwrap();
        let lines = render::layout(b.document().body(), None).lines.len() as u16;
        assert_eq!(b.scroll, lines - 9);
        let screen: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("line 29"));
    }
}
