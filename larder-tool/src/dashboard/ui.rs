use chrono::Utc;
use larder_api::{InventorySummary, LOW_STOCK_THRESHOLD};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use super::app::{DashboardApp, FORM_LABELS, ItemForm, Modal, Screen, WithdrawForm};
use super::field::TextField;

pub fn render(frame: &mut Frame, app: &DashboardApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(1),    // Body
            Constraint::Length(1), // Messages
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    match app.screen {
        Screen::Login => render_login(frame, app, chunks[1]),
        Screen::Home => render_home(frame, app, chunks[1]),
        Screen::Inventory => render_inventory(frame, app, chunks[1]),
    }
    render_messages(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    match &app.modal {
        Some(Modal::ItemForm(form)) => render_item_form(frame, form),
        Some(Modal::Withdraw(form)) => render_withdraw(frame, form),
        Some(Modal::ConfirmDelete { name, .. }) => render_confirm_delete(frame, name),
        None => {}
    }
}

fn render_header(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let screen = match app.screen {
        Screen::Login => "Login",
        Screen::Home => "Home",
        Screen::Inventory => "Inventory",
    };
    let user = app
        .session
        .as_ref()
        .map(|s| format!("  [{}]", s.display_name()))
        .unwrap_or_default();

    let header = Paragraph::new(format!("lrd dashboard - {}{}", screen, user))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    frame.render_widget(header, area);
}

fn field_line<'a>(label: &'a str, field: &'a TextField, masked: bool, focused: bool) -> Line<'a> {
    let value = if masked {
        "*".repeat(field.text.chars().count())
    } else {
        field.text.clone()
    };
    let label_style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    Line::from(vec![
        Span::styled(format!("{:>10}: ", label), label_style),
        Span::raw(value),
    ])
}

/// Places the terminal cursor on a field rendered by `field_line`.
fn set_field_cursor(frame: &mut Frame, area: Rect, row: u16, field: &TextField) {
    // Border + right-aligned label + ": "
    let x = area.x + 1 + 12 + field.cursor_column();
    frame.set_cursor_position((x, area.y + 1 + row));
}

fn render_login(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let area = centered_rect(50, 40, area);
    let login = &app.login;

    let mut lines = vec![
        field_line("Username", &login.username, false, !login.on_password),
        field_line("Password", &login.password, true, login.on_password),
        Line::from(""),
    ];
    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "Signing in...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
    }

    let block = Block::default().borders(Borders::ALL).title("Sign in");
    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);

    if !app.is_loading() {
        let (row, field) = if login.on_password {
            (1, &login.password)
        } else {
            (0, &login.username)
        };
        set_field_cursor(frame, area, row, field);
    }
}

fn render_home(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let Some(session) = app.session.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let welcome = Paragraph::new(format!("Welcome, {}!", session.display_name()))
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(welcome, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let label = Style::default().fg(Color::Gray);
    let mut account = vec![Line::from(vec![
        Span::styled("Username        ", label),
        Span::raw(session.display_name().to_string()),
    ])];
    if let Some(role) = session.role() {
        account.push(Line::from(vec![
            Span::styled("Role            ", label),
            Span::styled(role.to_string(), Style::default().fg(Color::Blue)),
        ]));
    }
    account.push(Line::from(vec![
        Span::styled("Account status  ", label),
        Span::styled("Active", Style::default().fg(Color::Green)),
    ]));
    if let Some(exp) = session.identity().and_then(|i| i.expires_at) {
        let expired = exp <= Utc::now();
        account.push(Line::from(vec![
            Span::styled("Token expires   ", label),
            Span::styled(
                format!(
                    "{}{}",
                    exp.format("%Y-%m-%d %H:%M UTC"),
                    if expired { " (expired)" } else { "" }
                ),
                Style::default().fg(if expired { Color::Red } else { Color::White }),
            ),
        ]));
    }
    account.push(Line::from(""));
    account.extend(summary_lines(&app.inventory.summary()));

    frame.render_widget(
        Paragraph::new(Text::from(account))
            .block(Block::default().borders(Borders::ALL).title("User Information")),
        columns[0],
    );

    let token_text = if app.show_token {
        Text::from(session.token().to_string())
    } else {
        Text::from(Span::styled(
            "Hidden. Press t to show.",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(
        Paragraph::new(token_text)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Access Token")),
        columns[1],
    );
}

fn summary_lines(summary: &InventorySummary) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::Gray);
    let low_style = if summary.low_stock > 0 {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    vec![
        Line::from(vec![
            Span::styled("Items           ", label),
            Span::raw(summary.total_items.to_string()),
        ]),
        Line::from(vec![
            Span::styled(format!("Below {:<10}", LOW_STOCK_THRESHOLD), label),
            Span::styled(summary.low_stock.to_string(), low_style),
        ]),
        Line::from(vec![
            Span::styled("Total value     ", label),
            Span::raw(summary.total_value_display()),
        ]),
    ]
}

fn render_inventory(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let header = Row::new(["ID", "Name", "Qty", "Unit", "Price", "Value", ""])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .inventory
        .items()
        .iter()
        .map(|item| {
            let low = item.is_low_stock();
            let quantity_style = if low {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(item.id.to_string()),
                Cell::from(item.name.clone()),
                Cell::from(Span::styled(item.quantity.to_string(), quantity_style)),
                Cell::from(item.unit.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(
                    item.price
                        .map(|p| format!("{:.2}", p))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(item.value_display()),
                Cell::from(Span::styled(
                    if low { "LOW" } else { "" },
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
            ])
        })
        .collect();

    let summary = app.inventory.summary();
    let title = format!(
        "Inventory ({} items, total value {})",
        summary.total_items,
        summary.total_value_display()
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Min(12),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(4),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    let mut state = TableState::default();
    if !app.inventory.items().is_empty() {
        state.select(Some(app.selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_messages(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let line = if app.is_loading() {
        Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
    } else if let Some(ref error) = app.last_error {
        Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        ))
    } else if let Some(ref notice) = app.notice {
        Line::from(Span::styled(notice.clone(), Style::default().fg(Color::Green)))
    } else {
        Line::from("")
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let status = if app.is_loading() {
        "Waiting for response...  Esc: Abandon"
    } else {
        match (&app.modal, app.screen) {
            (Some(Modal::ItemForm(_)), _) => "Tab/↑/↓: Field  Enter: Save  Esc: Cancel",
            (Some(Modal::Withdraw(_)), _) => "Type amount  Enter: Withdraw  Esc: Cancel",
            (Some(Modal::ConfirmDelete { .. }), _) => "y/Enter: Delete  n/Esc: Cancel",
            (None, Screen::Login) => "Tab: Switch field  Enter: Sign in  Esc: Quit",
            (None, Screen::Home) => "Tab: Inventory  t: Show/hide token  r: Refresh  L: Logout  q: Quit",
            (None, Screen::Inventory) => {
                "↑/↓: Select  n: New  e: Edit  w: Withdraw  d: Delete  r: Refresh  Tab: Home  q: Quit"
            }
        }
    };

    let status_bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));

    frame.render_widget(status_bar, area);
}

fn render_item_form(frame: &mut Frame, form: &ItemForm) {
    let area = centered_rect(50, 40, frame.area());
    frame.render_widget(Clear, area);

    let title = match form.editing {
        Some(id) => format!("Edit item #{}", id),
        None => "New item".to_string(),
    };
    let mut lines: Vec<Line> = FORM_LABELS
        .iter()
        .zip(form.fields.iter())
        .enumerate()
        .map(|(i, (label, field))| field_line(label, field, false, i == form.focus))
        .collect();
    if form.editing.is_some() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "A blank price keeps the current price",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
    set_field_cursor(frame, area, form.focus as u16, &form.fields[form.focus]);
}

fn render_withdraw(frame: &mut Frame, form: &WithdrawForm) {
    let area = centered_rect(50, 40, frame.area());
    frame.render_widget(Clear, area);

    let draft = &form.draft;
    let unit = draft.unit.as_deref().unwrap_or("");
    let preview = match draft.preview() {
        Ok(remaining) => Line::from(vec![
            Span::styled("Remaining ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} {}", remaining, unit),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Err(reason) if draft.input.trim().is_empty() => Line::from(Span::styled(
            format!("Remaining {} {} ({})", draft.available, unit, reason),
            Style::default().fg(Color::DarkGray),
        )),
        Err(reason) => Line::from(Span::styled(
            reason.to_string(),
            Style::default().fg(Color::Red),
        )),
    };

    let lines = vec![
        field_line("Amount", &form.field, false, true),
        Line::from(vec![
            Span::styled(format!("{:>10}: ", "Available"), Style::default().fg(Color::Gray)),
            Span::raw(format!("{} {}", draft.available, unit)),
        ]),
        Line::from(""),
        preview,
    ];

    let title = format!("Withdraw from {}", draft.item_name);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
    set_field_cursor(frame, area, 0, &form.field);
}

fn render_confirm_delete(frame: &mut Frame, name: &str) {
    let area = centered_rect(40, 20, frame.area());
    frame.render_widget(Clear, area);

    let text = format!("Delete {}? This cannot be undone.", name);
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Confirm delete")),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
