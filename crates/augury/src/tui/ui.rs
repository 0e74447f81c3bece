//! UI rendering for the TUI

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};

use crate::config::Theme;
use crate::links::LinkTarget;

use super::app::{App, SettingsItem, ViewMode};
use super::render::{payload_lines, LineKind, RenderLine};

/// Theme-derived palette.
struct Palette {
    text: Color,
    accent: Color,
    hint: Color,
    header: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            text: Color::White,
            accent: Color::Cyan,
            hint: Color::DarkGray,
            header: Color::Yellow,
        },
        Theme::Light => Palette {
            text: Color::Black,
            accent: Color::Blue,
            hint: Color::Gray,
            header: Color::Magenta,
        },
    }
}

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // View body
            Constraint::Length(3), // Footer
        ])
        .split(area);

    draw_header(frame, app, chunks[0]);
    match app.mode {
        ViewMode::Search => draw_search_view(frame, app, chunks[1]),
        ViewMode::Detail => draw_detail_view(frame, app, chunks[1]),
        ViewMode::Settings => draw_settings_view(frame, app, chunks[1]),
    }
    draw_footer(frame, app, chunks[2]);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let p = palette(app.theme);
    let identity = match &app.user_name {
        Some(name) => format!("analyst: {name}"),
        None => "analyst: unknown".to_string(),
    };
    let title = Line::from(vec![
        Span::styled(" Augury ", Style::default().fg(p.accent).bold()),
        Span::styled("IOC Lookup  ", Style::default().fg(p.text)),
        Span::styled(identity, Style::default().fg(p.hint)),
        Span::styled(format!("  [{}]", app.theme.as_str()), Style::default().fg(p.hint)),
    ]);
    let header = Paragraph::new(title)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let p = palette(app.theme);
    let (text, style) = match &app.status {
        Some(status) if status.is_error => (
            format!(" {} ", status.message),
            Style::default().fg(Color::Red),
        ),
        Some(status) => (
            format!(" {} ", status.message),
            Style::default().fg(p.accent),
        ),
        None => {
            let hints = match app.mode {
                ViewMode::Search => {
                    " [Enter] Search  [Tab] Next tab  [Ctrl+W] Close tab  [↑↓] Rows  [Ctrl+S] Settings  [Ctrl+T] Theme  [Ctrl+C] Quit "
                }
                ViewMode::Detail => " [↑↓] Scroll  [Esc] Back  [Ctrl+C] Quit ",
                ViewMode::Settings => {
                    " [↑↓] Select  [Enter] Edit/Toggle  [Del] Clear identity  [Esc] Back  [Ctrl+C] Quit "
                }
            };
            (hints.to_string(), Style::default().fg(p.hint))
        }
    };
    let footer = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}

// ============================================================================
// Search view
// ============================================================================

fn draw_search_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Length(1), // Tab bar
            Constraint::Min(0),    // Results
            Constraint::Length(3), // Lookup links
        ])
        .split(area);

    draw_query_input(frame, app, chunks[0]);
    draw_tab_bar(frame, app, chunks[1]);
    draw_results(frame, app, chunks[2]);
    draw_links(frame, app, chunks[3]);
}

fn draw_query_input(frame: &mut Frame, app: &App, area: Rect) {
    let p = palette(app.theme);
    let title = if app.search.loading {
        " Query (searching...) "
    } else {
        " Query "
    };
    let input = Paragraph::new(app.search.input.as_str())
        .style(Style::default().fg(p.text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(p.accent)),
        );
    frame.render_widget(input, area);
    // Cursor inside the bordered box; the stored offset is in bytes, the
    // terminal column is in chars.
    let col = app.search.input[..app.search.cursor].chars().count();
    let x = area.x + 1 + col.min(area.width.saturating_sub(2) as usize) as u16;
    frame.set_cursor_position((x, area.y + 1));
}

fn draw_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let p = palette(app.theme);
    if app.tabs.is_empty() {
        let hint = Paragraph::new(" no open tabs ").style(Style::default().fg(p.hint));
        frame.render_widget(hint, area);
        return;
    }
    let titles: Vec<Line> = app
        .tabs
        .tabs()
        .iter()
        .map(|tab| Line::from(tab.label.clone()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tabs.active_index().unwrap_or(0))
        .style(Style::default().fg(p.hint))
        .highlight_style(Style::default().fg(p.accent).bold());
    frame.render_widget(tabs, area);
}

fn draw_results(frame: &mut Frame, app: &App, area: Rect) {
    let p = palette(app.theme);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Results ")
        .border_style(Style::default().fg(p.hint));

    let Some(payload) = app.tabs.active_tab().and_then(|tab| tab.results.as_ref()) else {
        let empty = Paragraph::new("Submit a query to open a results tab.")
            .style(Style::default().fg(p.hint))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let lines = payload_lines(payload);
    let height = area.height.saturating_sub(2) as usize;
    let offset = scroll_offset(app.search.selected_row, lines.len(), height);

    let rendered: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(offset)
        .take(height.max(1))
        .map(|(i, line)| styled_line(line, &p, i == app.search.selected_row))
        .collect();

    let body = Paragraph::new(rendered).block(block);
    frame.render_widget(body, area);
}

fn styled_line(line: &RenderLine, p: &Palette, selected: bool) -> Line<'static> {
    let mut style = match line.kind {
        LineKind::IocHeader => Style::default().fg(p.header).bold(),
        LineKind::SourceHeader => Style::default().fg(p.accent),
        LineKind::Field if line.link.is_some() => Style::default().fg(p.accent).underlined(),
        LineKind::Field => Style::default().fg(p.text),
        LineKind::Notice => Style::default().fg(p.hint).italic(),
        LineKind::Error => Style::default().fg(Color::Red).bold(),
        LineKind::QueryLog => Style::default().fg(p.hint),
        LineKind::Blank => Style::default(),
    };
    if selected {
        style = style.reversed();
    }
    Line::from(Span::styled(line.text.clone(), style))
}

fn scroll_offset(selected: usize, total: usize, height: usize) -> usize {
    if height == 0 || total <= height {
        0
    } else if selected >= height {
        (selected + 1 - height).min(total - height)
    } else {
        0
    }
}

fn draw_links(frame: &mut Frame, app: &App, area: Rect) {
    let p = palette(app.theme);
    let links = app.active_links();
    let line = if links.is_empty() {
        Line::from(Span::styled("-", Style::default().fg(p.hint)))
    } else {
        let mut spans = Vec::new();
        for (i, link) in links.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Style::default()));
            }
            let style = match link.target {
                LinkTarget::Detail { .. } => Style::default().fg(p.accent),
                LinkTarget::External(_) => Style::default().fg(p.text),
            };
            spans.push(Span::styled(link.label, style));
        }
        Line::from(spans)
    };
    let panel = Paragraph::new(line)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Lookups ")
                .border_style(Style::default().fg(p.hint)),
        );
    frame.render_widget(panel, area);
}

// ============================================================================
// Detail view
// ============================================================================

fn draw_detail_view(frame: &mut Frame, app: &App, area: Rect) {
    let p = palette(app.theme);
    let title = format!(" {} / {} ", app.detail.source, app.detail.ioc);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(p.accent));

    if let Some(error) = &app.detail.error {
        let msg = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red).bold())
            .block(block);
        frame.render_widget(msg, area);
        return;
    }
    if app.detail.loading {
        let msg = Paragraph::new("Loading...")
            .style(Style::default().fg(p.hint))
            .block(block);
        frame.render_widget(msg, area);
        return;
    }

    let Some(payload) = &app.detail.payload else {
        frame.render_widget(block, area);
        return;
    };
    let lines = payload_lines(payload);
    let height = area.height.saturating_sub(2) as usize;
    let offset = app.detail.scroll.min(lines.len().saturating_sub(1));
    let rendered: Vec<Line> = lines
        .iter()
        .skip(offset)
        .take(height.max(1))
        .map(|line| styled_line(line, &p, false))
        .collect();
    frame.render_widget(Paragraph::new(rendered).block(block), area);
}

// ============================================================================
// Settings view
// ============================================================================

fn draw_settings_view(frame: &mut Frame, app: &App, area: Rect) {
    let p = palette(app.theme);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Settings ")
        .border_style(Style::default().fg(p.accent));

    let identity_value = if app.settings.editing && app.settings.selected == SettingsItem::Identity
    {
        format!("{}_", app.settings.edit_value)
    } else {
        app.user_name.clone().unwrap_or_else(|| "(not set)".to_string())
    };

    let row = |item: SettingsItem, label: &str, value: String| {
        let selected = app.settings.selected == item;
        let marker = if selected { "> " } else { "  " };
        let style = if selected {
            Style::default().fg(p.accent).bold()
        } else {
            Style::default().fg(p.text)
        };
        Line::from(Span::styled(format!("{marker}{label}: {value}"), style))
    };

    let lines = vec![
        Line::from(""),
        row(SettingsItem::Identity, "Identity", identity_value),
        row(
            SettingsItem::Theme,
            "Theme",
            app.theme.as_str().to_string(),
        ),
        Line::from(""),
        Line::from(Span::styled(
            format!("  Backend: {}", app.backend_url),
            Style::default().fg(p.hint),
        )),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
