use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use vibebio_core::{
    spawn_generation, Backend, Config, GenerateRequest, GenerationEvent, OpenAIClient,
    Provider, Session, StreamUpdate, SuggestionFormat,
};

use crate::clipboard::Clipboard;
use crate::notification::NotificationState;
use crate::tui::AppEvent;

pub const COPIED_MESSAGE: &str = "Bio copied to clipboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Vibe,
    Results,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Input => FocusPane::Vibe,
            FocusPane::Vibe => FocusPane::Results,
            FocusPane::Results => FocusPane::Input,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Form state
    pub session: Session,
    pub input_cursor: usize, // cursor position in the input, in chars

    // Results state
    pub selected_card: Option<usize>,
    pub results_scroll: u16,

    // Request plumbing
    pub generation_task: Option<JoinHandle<()>>,
    events: Option<UnboundedSender<AppEvent>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub notification: NotificationState,
    clipboard: Box<dyn Clipboard>,

    // Model picker state
    pub show_model_picker: bool,
    pub available_models: Vec<String>,
    pub model_picker_state: ListState,

    // Provider state
    pub current_provider: Provider,
    pub selected_model: String,
    pub show_provider_picker: bool,
    pub provider_picker_state: ListState,

    // Areas for mouse hit-testing (updated during render)
    pub input_area: Option<Rect>,
    pub results_area: Option<Rect>,
    pub card_areas: Vec<(usize, Rect)>,

    pub config: Config,
    pub suggestion_format: SuggestionFormat,
}

impl App {
    /// `events` is where generation tasks report back; without it requests
    /// are recorded but never sent.
    pub fn new(
        config: Config,
        clipboard: Box<dyn Clipboard>,
        events: Option<UnboundedSender<AppEvent>>,
    ) -> Self {
        let current_provider = config.provider();
        let selected_model = config.model_for(current_provider);

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            session: Session::new(config.default_vibe()),
            input_cursor: 0,

            selected_card: None,
            results_scroll: 0,

            generation_task: None,
            events,

            animation_frame: 0,

            notification: NotificationState::new(config.notification_duration()),
            clipboard,

            show_model_picker: false,
            available_models: Vec::new(),
            model_picker_state: ListState::default(),

            current_provider,
            selected_model,
            show_provider_picker: false,
            provider_picker_state: ListState::default(),

            input_area: None,
            results_area: None,
            card_areas: Vec::new(),

            suggestion_format: config.suggestion_format(),
            config,
        }
    }

    // Input editing (cursor is a char index, not a byte index)
    pub fn insert_char(&mut self, c: char) {
        let mut text = self.session.input().to_string();
        let byte_pos = char_to_byte_index(&text, self.input_cursor);
        text.insert(byte_pos, c);
        self.session.update_input(text);
        self.input_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            self.remove_char_at_cursor();
        }
    }

    pub fn delete(&mut self) {
        if self.input_cursor < self.session.input().chars().count() {
            self.remove_char_at_cursor();
        }
    }

    fn remove_char_at_cursor(&mut self) {
        let mut text = self.session.input().to_string();
        let byte_pos = char_to_byte_index(&text, self.input_cursor);
        if byte_pos < text.len() {
            text.remove(byte_pos);
            self.session.update_input(text);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.session.input().chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.session.input().chars().count();
    }

    pub fn clear_input(&mut self) {
        self.session.update_input(String::new());
        self.input_cursor = 0;
    }

    // Vibe selection
    pub fn next_vibe(&mut self) {
        let vibe = self.session.vibe().next();
        self.session.select_vibe(vibe);
    }

    pub fn prev_vibe(&mut self) {
        let vibe = self.session.vibe().prev();
        self.session.select_vibe(vibe);
    }

    /// Submit the form. Does nothing while a request is in flight.
    pub fn submit(&mut self) -> Option<GenerateRequest> {
        let request = self.session.submit()?;
        self.input_mode = InputMode::Normal;
        self.selected_card = None;
        self.results_scroll = 0;
        self.animation_frame = 0;
        self.start_generation(request.clone());
        Some(request)
    }

    fn start_generation(&mut self, request: GenerateRequest) {
        let backend = match Backend::from_config(&self.config, self.current_provider, &self.selected_model) {
            Ok(backend) => backend,
            Err(e) => {
                log::error!("Cannot start request {}: {}", request.request_id, e);
                self.handle_generation(GenerationEvent::Failed {
                    request_id: request.request_id,
                    error: e.to_string(),
                });
                return;
            }
        };

        match &self.events {
            Some(tx) => {
                let tx = tx.clone();
                self.generation_task = Some(spawn_generation(backend, request, move |event| {
                    tx.send(AppEvent::Generation(event)).is_ok()
                }));
            }
            None => log::debug!("No event channel, request {} not sent", request.request_id),
        }
    }

    /// Apply a streamed event to the session and react to it
    pub fn handle_generation(&mut self, event: GenerationEvent) {
        match self.session.apply(event) {
            StreamUpdate::Ignored => {}
            StreamUpdate::FirstChunk => {
                // Bring the results into view as soon as something arrives
                self.focus = FocusPane::Results;
                self.results_scroll = 0;
                self.selected_card = Some(0);
            }
            StreamUpdate::Chunk => {}
            StreamUpdate::Completed => {
                self.generation_task = None;
            }
            StreamUpdate::Failed(error) => {
                self.generation_task = None;
                self.notification.show_error(&format!("Generation failed: {}", error));
            }
        }
        self.clamp_selected_card();
    }

    pub fn cards(&self) -> Vec<String> {
        self.session.cards(self.suggestion_format)
    }

    fn clamp_selected_card(&mut self) {
        let len = self.cards().len();
        self.selected_card = match self.selected_card {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => None,
        };
    }

    pub fn select_next_card(&mut self) {
        let len = self.cards().len();
        if len > 0 {
            let i = self.selected_card.map(|i| i + 1).unwrap_or(0);
            self.selected_card = Some(i.min(len - 1));
        }
    }

    pub fn select_prev_card(&mut self) {
        if let Some(i) = self.selected_card {
            self.selected_card = Some(i.saturating_sub(1));
        } else if !self.cards().is_empty() {
            self.selected_card = Some(0);
        }
    }

    /// Copy `text` exactly as given and confirm with a notification
    pub fn copy_suggestion(&mut self, text: &str) {
        match self.clipboard.copy(text) {
            Ok(()) => self.notification.show(COPIED_MESSAGE),
            Err(e) => {
                log::warn!("Copy failed: {}", e);
                self.notification.show_error(&format!("Could not copy: {}", e));
            }
        }
    }

    pub fn copy_selected_card(&mut self) {
        let card = self
            .selected_card
            .and_then(|i| self.cards().get(i).cloned());
        if let Some(text) = card {
            self.copy_suggestion(&text);
        }
    }

    /// Copy the card at `index`, selecting it
    pub fn copy_card(&mut self, index: usize) {
        if let Some(text) = self.cards().get(index).cloned() {
            self.selected_card = Some(index);
            self.focus = FocusPane::Results;
            self.copy_suggestion(&text);
        }
    }

    pub fn scroll_results_down(&mut self, lines: u16) {
        self.results_scroll = self.results_scroll.saturating_add(lines);
    }

    pub fn scroll_results_up(&mut self, lines: u16) {
        self.results_scroll = self.results_scroll.saturating_sub(lines);
    }

    /// Tick animation frame and expire notifications (called by Tick event)
    pub fn tick(&mut self, now: Instant) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.notification.clear_expired(now);
    }

    /// Abort the in-flight request, if any
    pub fn cancel_generation(&mut self) {
        if let Some(task) = self.generation_task.take() {
            task.abort();
        }
    }

    // Model picker methods
    pub fn open_model_picker(&mut self, models: Vec<String>) {
        if models.is_empty() {
            self.notification.show_error("No models available");
            return;
        }
        let selected = models
            .iter()
            .position(|m| *m == self.selected_model)
            .unwrap_or(0);
        self.available_models = models;
        self.model_picker_state.select(Some(selected));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    /// Apply the highlighted model. Returns it so the caller can persist it.
    pub fn select_model(&mut self) -> Option<String> {
        let model = self
            .model_picker_state
            .selected()
            .and_then(|i| self.available_models.get(i))
            .cloned()?;
        self.selected_model = model.clone();
        self.show_model_picker = false;
        Some(model)
    }

    // Provider picker methods
    pub fn open_provider_picker(&mut self) {
        let selected = Provider::all()
            .iter()
            .position(|p| *p == self.current_provider)
            .unwrap_or(0);
        self.provider_picker_state.select(Some(selected));
        self.show_provider_picker = true;
    }

    pub fn provider_picker_nav_down(&mut self) {
        let len = Provider::all().len();
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn provider_picker_nav_up(&mut self) {
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some(i.saturating_sub(1)));
    }

    /// Switch to the highlighted provider. Returns it so the caller can persist it.
    pub fn select_provider(&mut self) -> Option<Provider> {
        let provider = self
            .provider_picker_state
            .selected()
            .and_then(|i| Provider::all().get(i).copied())?;
        self.show_provider_picker = false;
        self.config.switch_provider(provider);
        if provider != self.current_provider {
            self.current_provider = provider;
            self.selected_model = self.config.model_for(provider);
        }
        Some(provider)
    }

    /// Models we know without a network call
    pub fn static_models(&self) -> Option<Vec<String>> {
        match self.current_provider {
            Provider::Endpoint => Some(Vec::new()),
            Provider::Ollama => None,
            Provider::OpenAI => Some(OpenAIClient::list_models()),
        }
    }

    /// Returns the source of the API key for a provider: "env", "config", "local", or None
    pub fn get_key_source(&self, provider: Provider) -> Option<&'static str> {
        match provider {
            Provider::Endpoint | Provider::Ollama => Some("local"),
            Provider::OpenAI => {
                if std::env::var("OPENAI_API_KEY").is_ok() {
                    Some("env")
                } else if self.config.openai_api_key.is_some() {
                    Some("config")
                } else {
                    None
                }
            }
        }
    }

    /// Index of the card under a terminal cell, from the last render
    pub fn card_at(&self, x: u16, y: u16) -> Option<usize> {
        self.card_areas
            .iter()
            .find(|(_, rect)| point_in_rect(x, y, *rect))
            .map(|(i, _)| *i)
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Check if a point is within a rectangle
pub fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clipboard::ClipboardError;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use vibebio_core::{RequestState, Vibe};

    /// Records copied text instead of touching a real clipboard
    #[derive(Clone, Default)]
    pub(crate) struct RecordingClipboard {
        pub copied: Arc<Mutex<Vec<String>>>,
        pub fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::SystemUnavailable);
            }
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    pub(crate) fn test_app() -> (App, RecordingClipboard) {
        let clipboard = RecordingClipboard::default();
        let app = App::new(Config::new(), Box::new(clipboard.clone()), None);
        (app, clipboard)
    }

    fn chunk(request_id: u64, text: &str) -> GenerationEvent {
        GenerationEvent::Chunk {
            request_id,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_editing_is_utf8_safe() {
        let (mut app, _) = test_app();
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.cursor_left();
        app.backspace();
        assert_eq!(app.session.input(), "hélo");
        app.cursor_home();
        app.delete();
        assert_eq!(app.session.input(), "élo");
        app.cursor_end();
        app.insert_char('!');
        assert_eq!(app.session.input(), "élo!");
    }

    #[test]
    fn test_end_to_end_generate_and_copy() {
        let (mut app, clipboard) = test_app();
        for c in "I build tools.".chars() {
            app.insert_char(c);
        }
        app.next_vibe();
        app.next_vibe();
        assert_eq!(app.session.vibe(), Vibe::Funny);

        let request = app.submit().unwrap();
        assert_eq!(request.bio, "I build tools.");
        assert_eq!(request.vibe, Vibe::Funny);
        assert!(app.cards().is_empty());
        assert!(app.session.is_loading());

        // A second submit while in flight does nothing
        assert!(app.submit().is_none());

        app.handle_generation(chunk(request.request_id, "1. Tool-builder extraordinaire. "));
        assert_eq!(app.focus, FocusPane::Results);
        app.handle_generation(chunk(request.request_id, "2. I make things that work (mostly)."));
        app.handle_generation(GenerationEvent::Complete { request_id: request.request_id });

        assert_eq!(app.session.request_state(), RequestState::Complete);
        assert_eq!(
            app.cards(),
            vec![
                "Tool-builder extraordinaire.".to_string(),
                "I make things that work (mostly).".to_string(),
            ]
        );

        app.copy_card(0);
        assert_eq!(
            clipboard.copied.lock().unwrap().as_slice(),
            &["Tool-builder extraordinaire.".to_string()]
        );
        assert_eq!(app.notification.current().unwrap().message, COPIED_MESSAGE);
    }

    #[test]
    fn test_card_selection_and_copy_selected() {
        let (mut app, clipboard) = test_app();
        let request = app.submit().unwrap();
        app.handle_generation(chunk(request.request_id, "1. One 2. Two"));

        assert_eq!(app.selected_card, Some(0));
        app.select_next_card();
        app.select_next_card();
        assert_eq!(app.selected_card, Some(1));
        app.copy_selected_card();
        app.select_prev_card();
        assert_eq!(app.selected_card, Some(0));

        assert_eq!(clipboard.copied.lock().unwrap().as_slice(), &["Two".to_string()]);
    }

    #[test]
    fn test_failed_copy_shows_error() {
        let clipboard = RecordingClipboard {
            fail: true,
            ..RecordingClipboard::default()
        };
        let mut app = App::new(Config::new(), Box::new(clipboard), None);
        app.copy_suggestion("anything");
        let shown = app.notification.current().unwrap();
        assert!(shown.message.starts_with("Could not copy"));
    }

    #[test]
    fn test_failure_notifies_and_keeps_partial() {
        let (mut app, _) = test_app();
        let request = app.submit().unwrap();
        app.handle_generation(chunk(request.request_id, "1. Half"));
        app.handle_generation(GenerationEvent::Failed {
            request_id: request.request_id,
            error: "Network error: reset".to_string(),
        });

        assert_eq!(app.cards(), vec!["Half".to_string()]);
        assert!(app
            .notification
            .current()
            .unwrap()
            .message
            .contains("Network error: reset"));
        assert!(app.submit().is_some());
    }

    #[test]
    fn test_tick_animates_only_while_loading() {
        let (mut app, _) = test_app();
        let now = Instant::now();
        app.tick(now);
        assert_eq!(app.animation_frame, 0);

        app.submit();
        app.tick(now);
        app.tick(now);
        assert_eq!(app.animation_frame, 2);
        app.tick(now);
        assert_eq!(app.animation_frame, 0);
    }

    #[test]
    fn test_tick_expires_notification() {
        let (mut app, _) = test_app();
        app.notification.show(COPIED_MESSAGE);
        app.tick(Instant::now() + Duration::from_secs(5));
        assert!(app.notification.current().is_none());
    }

    #[test]
    fn test_provider_picker_switches_model() {
        let (mut app, _) = test_app();
        assert_eq!(app.current_provider, Provider::Endpoint);
        app.open_provider_picker();
        app.provider_picker_nav_down();
        assert_eq!(app.select_provider(), Some(Provider::Ollama));
        assert_eq!(app.selected_model, "llama3.2:latest");
        assert!(!app.show_provider_picker);
    }

    #[test]
    fn test_provider_switch_survives_restart() {
        let config = Config {
            provider: Some("ollama".to_string()),
            default_model: Some("gemma3:latest".to_string()),
            ..Config::new()
        };
        let mut app = App::new(config, Box::new(RecordingClipboard::default()), None);
        assert_eq!(app.selected_model, "gemma3:latest");

        app.open_provider_picker();
        app.provider_picker_nav_down();
        assert_eq!(app.select_provider(), Some(Provider::OpenAI));
        assert_eq!(app.selected_model, "gpt-4o-mini");

        let restarted = App::new(app.config.clone(), Box::new(RecordingClipboard::default()), None);
        assert_eq!(restarted.current_provider, Provider::OpenAI);
        assert_eq!(restarted.selected_model, "gpt-4o-mini");
    }

    #[test]
    fn test_model_picker_selects_highlighted() {
        let (mut app, _) = test_app();
        app.open_model_picker(vec!["a".to_string(), "b".to_string()]);
        assert!(app.show_model_picker);
        app.model_picker_nav_down();
        assert_eq!(app.select_model(), Some("b".to_string()));
        assert_eq!(app.selected_model, "b");

        app.open_model_picker(Vec::new());
        assert!(!app.show_model_picker);
    }

    #[test]
    fn test_card_hit_testing() {
        let (mut app, _) = test_app();
        app.card_areas = vec![(0, Rect::new(2, 10, 40, 3)), (1, Rect::new(2, 13, 40, 3))];
        assert_eq!(app.card_at(5, 11), Some(0));
        assert_eq!(app.card_at(5, 13), Some(1));
        assert_eq!(app.card_at(50, 11), None);
    }
}
