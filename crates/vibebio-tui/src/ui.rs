use std::time::Instant;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;
use vibebio_core::prompt::MAX_BIO_CHARS;
use vibebio_core::{Provider, RequestState, Vibe};

use crate::app::{App, FocusPane, InputMode};
use crate::notification::NotificationKind;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, form, results, footer
    let [header_area, input_area, vibe_area, results_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_input(app, frame, input_area);
    render_vibe(app, frame, vibe_area);
    render_results(app, frame, results_area);
    render_footer(app, frame, footer_area);

    render_notification(app, frame, area);

    if app.show_provider_picker {
        render_provider_picker(app, frame, area);
    } else if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let backend = match app.current_provider {
        Provider::Endpoint => app.config.endpoint_url(),
        _ => format!("{}: {}", app.current_provider.display_name(), app.selected_model),
    };

    let title = Line::from(vec![
        Span::styled(" Vibe Bio ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(backend, Style::default().fg(Color::White)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn border_color(app: &App, pane: FocusPane) -> Color {
    if app.focus == pane {
        Color::Cyan
    } else {
        Color::DarkGray
    }
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    app.input_area = Some(area);

    let editing = app.input_mode == InputMode::Editing;
    let border = if editing {
        Color::Yellow
    } else {
        border_color(app, FocusPane::Input)
    };

    let char_count = app.session.input().chars().count();
    let count_style = if char_count > MAX_BIO_CHARS {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" 1. Copy your current bio ")
        .title_bottom(
            Line::from(Span::styled(format!(" {}/{} ", char_count, MAX_BIO_CHARS), count_style))
                .right_aligned(),
        );

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible, cursor_x) = input_window(app.session.input(), app.input_cursor, inner_width);

    let paragraph = if app.session.input().is_empty() && !editing {
        Paragraph::new(Span::styled(
            "e.g. Senior developer who loves coffee and hiking",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(paragraph.block(block), area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Slice of `input` that fits in `width` columns with the cursor (a char
/// index) kept on screen, plus the cursor's column within that slice
fn input_window(input: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<(char, usize)> = input
        .chars()
        .map(|c| (c, UnicodeWidthChar::width(c).unwrap_or(0)))
        .collect();
    let cursor = cursor.min(chars.len());
    if width == 0 {
        return (String::new(), 0);
    }

    // Scroll right until the text before the cursor leaves a column for it
    let mut start = 0;
    let mut before: usize = chars[..cursor].iter().map(|(_, w)| w).sum();
    while before >= width && start < cursor {
        before -= chars[start].1;
        start += 1;
    }

    let mut used = 0;
    let visible = chars[start..]
        .iter()
        .take_while(|(_, w)| {
            used += w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();
    (visible, before as u16)
}

fn render_vibe(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(app, FocusPane::Vibe)))
        .title(" 2. Select your vibe ");

    let mut spans = Vec::new();
    for vibe in Vibe::all() {
        let style = if vibe == app.session.vibe() {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", vibe.display_name()), style));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::raw("   "));
    spans.push(generate_button(app));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn generate_button(app: &App) -> Span<'static> {
    if app.session.is_loading() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Span::styled(
            format!(" Generating{:<3} ", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::styled(
            " Generate your bio \u{2192} ",
            Style::default().bg(Color::Green).fg(Color::Black).bold(),
        )
    }
}

/// Rows a card paragraph of `text` needs at `width` columns, word-wrapped
/// the same way the card is rendered
fn wrapped_height(text: &str, width: u16) -> u16 {
    let rows = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .line_count(width.max(1));
    rows.clamp(1, (u16::MAX - 2) as usize) as u16
}

fn render_results(app: &mut App, frame: &mut Frame, area: Rect) {
    app.results_area = Some(area);
    app.card_areas.clear();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(app, FocusPane::Results)));

    // Nothing to show until the first chunk arrives
    if app.session.generated_bios().is_none() {
        let hint = match app.session.request_state() {
            RequestState::Failed => Line::from(Span::styled(
                format!("Error: {}", app.session.last_error().unwrap_or("request failed")),
                Style::default().fg(Color::Red),
            )),
            _ if app.session.is_loading() => Line::from(Span::styled(
                "Waiting for the first words...",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
            _ => Line::from(Span::styled(
                "Your bios will appear here.",
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(hint).block(block), area);
        return;
    }

    let block = block.title(" Your generated bios ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cards = app.cards();
    let failed = app.session.request_state() == RequestState::Failed;
    let footer_rows = if failed { 1 } else { 0 };
    let cards_bottom = inner.y + inner.height.saturating_sub(footer_rows);

    // Cards span the results pane; their own borders take two columns
    let text_width = inner.width.saturating_sub(2);
    let mut y = inner.y as i32 - app.results_scroll as i32;

    for (i, card) in cards.iter().enumerate() {
        let height = wrapped_height(card, text_width).saturating_add(2);
        let top = y;
        y += height as i32;

        // Skip cards scrolled past; clip the one at the bottom edge
        if top < inner.y as i32 {
            continue;
        }
        let top = top as u16;
        if top >= cards_bottom {
            break;
        }
        let card_area = Rect::new(inner.x, top, inner.width, height.min(cards_bottom - top));

        let selected = app.selected_card == Some(i);
        let card_border = if selected && app.focus == FocusPane::Results {
            Color::Cyan
        } else if selected {
            Color::Blue
        } else {
            Color::DarkGray
        };

        let card_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(card_border))
            .title_bottom(
                Line::from(Span::styled(" click or c to copy ", Style::default().fg(Color::DarkGray)))
                    .right_aligned(),
            );

        let paragraph = Paragraph::new(card.as_str())
            .block(card_block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, card_area);
        app.card_areas.push((i, card_area));
    }

    if failed {
        let error = Paragraph::new(Span::styled(
            format!("Stopped: {}", app.session.last_error().unwrap_or("request failed")),
            Style::default().fg(Color::Red),
        ));
        let error_area = Rect::new(inner.x, inner.y + inner.height.saturating_sub(1), inner.width, 1);
        frame.render_widget(error, error_area);
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" generate ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        InputMode::Normal => {
            let mut hints = match app.focus {
                FocusPane::Input => vec![
                    Span::styled(" i ", key_style),
                    Span::styled(" edit ", label_style),
                ],
                FocusPane::Vibe => vec![
                    Span::styled(" h/l ", key_style),
                    Span::styled(" vibe ", label_style),
                    Span::styled(" Enter ", key_style),
                    Span::styled(" generate ", label_style),
                ],
                FocusPane::Results => vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" select ", label_style),
                    Span::styled(" c ", key_style),
                    Span::styled(" copy ", label_style),
                ],
            };
            hints.extend(vec![
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
                Span::styled(" P ", key_style),
                Span::styled(" provider ", label_style),
            ]);
            if app.current_provider.has_models() {
                hints.extend(vec![
                    Span::styled(" M ", key_style),
                    Span::styled(" model ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_notification(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notification) = app.notification.visible_at(Instant::now()) else {
        return;
    };

    let (fg, bg) = match notification.kind {
        NotificationKind::Info => (Color::Black, Color::Green),
        NotificationKind::Error => (Color::White, Color::Red),
    };

    let width = (notification.message.chars().count() as u16 + 4).min(area.width);
    let popup_area = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(3),
        width,
        1,
    );

    frame.render_widget(Clear, popup_area);
    let toast = Paragraph::new(format!("  {}  ", notification.message))
        .style(Style::default().fg(fg).bg(bg).bold());
    frame.render_widget(toast, popup_area);
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 40, app.available_models.len() as u16 + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Model (Enter to select, Esc to cancel) ");

    let items: Vec<ListItem> = app
        .available_models
        .iter()
        .map(|model| {
            let style = if model == &app.selected_model {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", model)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}

fn render_provider_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let providers = Provider::all();
    let popup_area = centered_popup(area, 45, providers.len() as u16 + 2);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Provider ");

    let items: Vec<ListItem> = providers
        .iter()
        .map(|provider| {
            let key_source = app.get_key_source(*provider);
            let is_current = *provider == app.current_provider;

            let status = match key_source {
                Some("env") => "(env var)",
                Some("config") => "(configured)",
                Some("local") => "(local)",
                _ => "(needs key)",
            };
            let prefix = if is_current { "* " } else { "  " };

            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if key_source.is_some() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(format!("{}{} {}", prefix, provider.display_name(), status)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.provider_picker_state);
}
