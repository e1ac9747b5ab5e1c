use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use lucosms_core::{ChatRole, SectionId};

use crate::app::{App, InputMode};
use crate::page::Row;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: nav bar, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    if app.chat_open {
        let [page_area, chat_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(body_area);
        render_page(app, frame, page_area);
        render_chat(app, frame, chat_area);
    } else {
        app.chat_area = None;
        render_page(app, frame, body_area);
    }

    render_header(app, frame, header_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let current = app.page.lock().current_section();

    let mut spans = vec![Span::styled(
        " LUCOSMS ",
        Style::default().fg(Color::Cyan).bold(),
    )];
    for (i, section) in SectionId::all().iter().enumerate() {
        let style = if Some(*section) == current {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!("{} {}", i + 1, section.display_name()), style));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" PAGE ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" CHAT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Normal if app.chat_open => &[
            ("i", "type"),
            ("J/K", "chat scroll"),
            ("j/k", "scroll"),
            ("1-6", "jump"),
            ("Esc", "close chat"),
            ("q", "quit"),
        ],
        InputMode::Normal => &[
            ("c", "chat"),
            ("j/k", "scroll"),
            ("1-6", "jump"),
            ("g/G", "top/bottom"),
            ("q", "quit"),
        ],
        InputMode::Editing => &[("Enter", "send"), ("Up/Down", "scroll"), ("Esc", "done")],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_page(app: &mut App, frame: &mut Frame, area: Rect) {
    app.page_area = Some(area);

    let mut page = app.page.lock();
    page.set_viewport_height(area.height);

    let lines: Vec<Line> = page
        .rows()
        .into_iter()
        .map(|row| match row {
            Row::Title(title) => Line::from(Span::styled(
                format!(" {}", title),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Row::Body(text) => Line::from(format!("   {}", text)),
            Row::Blank => Line::default(),
        })
        .collect();

    let scroll = page.scroll().min(u16::MAX as u32) as u16;
    frame.render_widget(Paragraph::new(Text::from(lines)).scroll((scroll, 0)), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area, note_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    app.chat_area = Some(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let status = if app.assistant.is_some() {
        Span::styled(" Online ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" Offline ", Style::default().fg(Color::DarkGray))
    };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" Lucosms AI ", Style::default().bold()),
            status,
            Span::styled(format!("{} ", app.model_name), Style::default().fg(Color::DarkGray)),
        ]));

    let chat = Paragraph::new(chat_text(app))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    // Input line; dimmed while an exchange is pending
    let editing = app.input_mode == InputMode::Editing;
    let input_color = if app.is_busy() {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_color))
        .title(if app.is_busy() { " Waiting... " } else { " Message " });

    let input_text = if app.chat_input.is_empty() && !editing {
        Span::styled("Ask about pricing, features...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.chat_input.as_str())
    };
    frame.render_widget(Paragraph::new(Line::from(input_text)).block(input_block), input_area);

    if editing {
        let cursor_x = input_area.x + 1 + app.chat_cursor as u16;
        let max_x = input_area.x + input_area.width.saturating_sub(2);
        frame.set_cursor_position(Position::new(cursor_x.min(max_x), input_area.y + 1));
    }

    let note = Paragraph::new(Line::from(Span::styled(
        "AI can make mistakes. Please verify info.",
        Style::default().fg(Color::DarkGray),
    )))
    .centered();
    frame.render_widget(note, note_area);
}

/// Transcript lines as the chat panel shows them: every message, then the
/// thinking indicator or the missing-key hint.
pub fn chat_text<'a>(app: &'a App) -> Text<'a> {
    let mut lines: Vec<Line<'a>> = Vec::new();

    for msg in app.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(msg.content.as_str()));
            }
            ChatRole::Assistant => {
                let mut label = vec![Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )];
                if msg.tool_invocation {
                    label.push(Span::styled(" (navigated)", Style::default().fg(Color::DarkGray)));
                }
                lines.push(Line::from(label));
                lines.extend(msg.content.lines().map(|l| -> Line<'a> { parse_markdown_line(l) }));
            }
        }
        lines.push(Line::default());
    }

    if app.assistant.is_none() {
        lines.push(Line::from(Span::styled(
            "The assistant needs a Gemini API key.",
            Style::default().fg(Color::Yellow),
        )));
        lines.push(Line::from(Span::styled(
            "Set GEMINI_API_KEY or add gemini_api_key to config.json.",
            Style::default().fg(Color::DarkGray),
        )));
    } else if app.is_busy() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    Text::from(lines)
}

/// Rows `text` takes in the chat panel once word-wrapped to `width`.
pub fn wrapped_height(text: Text<'_>, width: u16) -> u16 {
    let rows = Paragraph::new(text).wrap(Wrap { trim: true }).line_count(width);
    rows.min(u16::MAX as usize) as u16
}

/// Render `**bold**` runs; an unmatched `**` is kept as literal text.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let segments: Vec<&str> = text.split("**").collect();

    // An even segment count means the last `**` has no partner
    let (paired, trailing) = if segments.len() % 2 == 0 {
        (&segments[..segments.len() - 1], segments.last().copied())
    } else {
        (&segments[..], None)
    };

    let mut spans: Vec<Span<'static>> = paired
        .iter()
        .enumerate()
        .filter(|(_, segment)| !segment.is_empty())
        .map(|(i, segment)| {
            if i % 2 == 1 {
                Span::styled(segment.to_string(), Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(segment.to_string())
            }
        })
        .collect();

    if let Some(rest) = trailing {
        spans.push(Span::raw(format!("**{}", rest)));
    }

    Line::from(spans)
}
