use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use lemonade_core::session::loopback_alternative;
use lemonade_core::{ChatMessage, ChatRole, SessionPhase};
use crate::app::{App, InputMode};

const TITLE: &str = "Lemonade LLM Chat";

/// Split on `**` and backticks: bold and inline code, everything else raw
fn styled_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut bold = false;

    for (i, segment) in text.split("**").enumerate() {
        if i > 0 {
            bold = !bold;
        }
        for (j, piece) in segment.split('`').enumerate() {
            if piece.is_empty() {
                continue;
            }
            let mut style = Style::default();
            if bold {
                style = style.add_modifier(Modifier::BOLD);
            }
            if j % 2 == 1 {
                style = style.fg(Color::Green);
            }
            spans.push(Span::styled(piece.to_string(), style));
        }
    }

    Line::from(spans)
}

fn key_hints(pairs: &[(&str, &str)]) -> Line<'static> {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let spans: Vec<Span<'static>> = pairs
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(format!(" {} ", key), key_style),
                Span::styled(format!(" {} ", label), label_style),
            ]
        })
        .collect();
    Line::from(spans)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    match app.phase() {
        SessionPhase::Connecting => render_connecting(app, frame, area),
        SessionPhase::Failed => render_failed(app, frame, area),
        SessionPhase::ChatReady | SessionPhase::Blocked => render_chat(app, frame, area),
    }

    if app.show_address_input {
        render_address_input(app, frame, area);
    }
}

fn render_connecting(app: &App, frame: &mut Frame, area: Rect) {
    let card = centered_rect(60, 7, area);
    let dots = ".".repeat((app.animation_frame as usize) + 1);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Connecting to Lemonade LLM server{} ", dots));

    let text = Text::from(vec![
        Line::from(vec![
            Span::raw("Trying "),
            Span::styled(app.session.address().to_string(), Style::default().bold()),
        ]),
        Line::default(),
        key_hints(&[("a", "address"), ("q", "quit")]),
    ]);

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        card,
    );
}

fn render_failed(app: &App, frame: &mut Frame, area: Rect) {
    let card = centered_rect(76, 18, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Cannot connect to Lemonade LLM server ");
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let [detail_area, input_area, hints_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(inner);

    let detail = match app.session.error_detail() {
        Some(detail) => Paragraph::new(detail.to_string()).style(Style::default().fg(Color::LightRed)),
        None => Paragraph::new("Please start the Lemonade server, or enter the correct address below."),
    };
    frame.render_widget(detail.wrap(Wrap { trim: false }), detail_area);

    render_address_field(app, frame, input_area, " Server address ");

    let alternative = format!("use {}", loopback_alternative(app.session.address_draft()));
    let hints = key_hints(&[
        ("Enter", "set address"),
        ("Ctrl+R", "try again"),
        ("Ctrl+L", alternative.as_str()),
        ("Esc", "quit"),
    ]);
    frame.render_widget(Paragraph::new(hints), hints_area);
}

/// Single-line address editor with the cursor at the end
fn render_address_field(app: &App, frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(title.to_string());

    let draft = app.session.address_draft();
    let inner_width = area.width.saturating_sub(2) as usize;
    let len = draft.chars().count();
    let scroll_offset = if inner_width == 0 { 0 } else { (len + 1).saturating_sub(inner_width) };
    let visible: String = draft.chars().skip(scroll_offset).collect();

    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)).block(block),
        area,
    );
    frame.set_cursor_position((area.x + 1 + (len - scroll_offset) as u16, area.y + 1));
}

fn render_address_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(64, 4, area);
    frame.render_widget(Clear, popup);

    let [field_area, hints_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(popup);

    render_address_field(app, frame, field_area, " Server address ");

    let alternative = format!("use {}", loopback_alternative(app.session.address_draft()));
    let hints = key_hints(&[
        ("Enter", "connect"),
        ("Ctrl+L", alternative.as_str()),
        ("Esc", "cancel"),
    ]);
    frame.render_widget(Paragraph::new(hints), hints_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    render_transcript(app, frame, chat_area);
    render_chat_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let model = app.session.selected_model().unwrap_or("no model");

    let title = Line::from(vec![
        Span::styled(format!(" ⚡ {} ", TITLE), Style::default().fg(Color::Yellow).bold()),
        Span::styled(format!("{} ", app.session.address()), Style::default().fg(Color::Gray)),
        Span::styled(format!("[{}]", model), Style::default().fg(Color::Cyan)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let thinking = app
        .session
        .is_pending()
        .then_some(app.animation_frame);
    let lines = transcript_lines(app.session.transcript(), thinking);

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// One role line, the content split on newlines, and a blank separator per
/// message. `thinking` carries the animation frame while a reply is pending.
fn transcript_lines(messages: &[ChatMessage], thinking: Option<u8>) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in messages {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "LLM:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                let is_error = msg.content.starts_with("Error:");
                for line in msg.content.lines() {
                    if is_error {
                        lines.push(Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(Color::LightRed),
                        )));
                    } else {
                        lines.push(styled_line(line));
                    }
                }
            }
        }
        lines.push(Line::default());
    }

    if let Some(frame) = thinking {
        lines.push(Line::from(Span::styled(
            "LLM:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let (title, border_color) = match app.phase() {
        SessionPhase::Blocked => (" No model available ", Color::DarkGray),
        _ if app.session.is_pending() => (" Waiting for reply... ", Color::DarkGray),
        _ if editing => (" Message ", Color::Yellow),
        _ => (" Message (i to type) ", Color::DarkGray),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else {
        (cursor_pos + 1).saturating_sub(inner_width)
    };

    let visible_text: String = app.chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hints = match app.input_mode {
        InputMode::Editing => key_hints(&[("Enter", "send"), ("Esc", "done")]),
        InputMode::Normal => key_hints(&[
            ("i", "type"),
            ("j/k", "scroll"),
            ("r", "reset"),
            ("a", "address"),
            ("q", "quit"),
        ]),
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints.spans);
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
