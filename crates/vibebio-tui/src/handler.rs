use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use vibebio_core::{Config, OllamaClient};

use crate::app::{point_in_rect, App, FocusPane, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(Instant::now()),
        AppEvent::Generation(event) => app.handle_generation(event),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    if app.show_provider_picker {
        handle_provider_picker(app, key);
        return Ok(());
    }

    if app.show_model_picker {
        handle_model_picker(app, key);
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key).await,
        InputMode::Editing => {
            handle_editing_mode(app, key);
            Ok(())
        }
    }
}

fn handle_provider_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_provider_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.provider_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.provider_picker_nav_up(),
        KeyCode::Enter => {
            if let Some(provider) = app.select_provider() {
                if let Err(e) = Config::save_provider(provider) {
                    log::warn!("Failed to save provider: {}", e);
                }
                if app.get_key_source(provider).is_none() {
                    app.notification
                        .show_error(&format!("{} needs an API key", provider.display_name()));
                }
            }
        }
        _ => {}
    }
}

fn handle_model_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_model_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.model_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.model_picker_nav_up(),
        KeyCode::Enter => {
            if let Some(model) = app.select_model() {
                if let Err(e) = Config::save_default_model(&model) {
                    log::warn!("Failed to save model: {}", e);
                }
                app.config.default_model = Some(model);
            }
        }
        _ => {}
    }
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Tab => app.focus = app.focus.next(),

        KeyCode::Char('i') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('h') | KeyCode::Left if app.focus == FocusPane::Vibe => app.prev_vibe(),
        KeyCode::Char('l') | KeyCode::Right if app.focus == FocusPane::Vibe => app.next_vibe(),

        KeyCode::Char('j') | KeyCode::Down => {
            if app.focus == FocusPane::Results {
                app.select_next_card();
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.focus == FocusPane::Results {
                app.select_prev_card();
            }
        }

        KeyCode::Enter => match app.focus {
            FocusPane::Input => app.input_mode = InputMode::Editing,
            // The vibe row doubles as the generate button
            FocusPane::Vibe => {
                app.submit();
            }
            FocusPane::Results => app.copy_selected_card(),
        },
        KeyCode::Char('c') | KeyCode::Char('y') => {
            if app.focus == FocusPane::Results {
                app.copy_selected_card();
            }
        }

        KeyCode::Char('M') => {
            let models = match app.static_models() {
                Some(models) => models,
                None => {
                    let client = OllamaClient::new(&app.config.ollama_url());
                    match client.list_models().await {
                        Ok(models) => models,
                        Err(e) => {
                            log::warn!("Failed to list Ollama models: {}", e);
                            app.notification.show_error(&format!("Could not list models: {}", e));
                            return Ok(());
                        }
                    }
                }
            };
            app.open_model_picker(models);
        }

        KeyCode::Char('P') => app.open_provider_picker(),

        _ => {}
    }
    Ok(())
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.clear_input(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_input = app.input_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_results = app.results_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = app.card_at(x, y) {
                app.copy_card(index);
            } else if in_input {
                app.focus = FocusPane::Input;
                app.input_mode = InputMode::Editing;
            }
        }
        MouseEventKind::ScrollDown if in_results => app.scroll_results_down(3),
        MouseEventKind::ScrollUp if in_results => app.scroll_results_up(3),
        _ => {}
    }
}
