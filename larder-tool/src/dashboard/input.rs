use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::{DashboardApp, Modal, Screen};
use super::field::TextField;

pub fn handle_event(app: &mut DashboardApp, event: Event) {
    if let Event::Key(key) = event {
        if key.kind == KeyEventKind::Press {
            handle_key(app, key);
        }
    }
}

fn handle_key(app: &mut DashboardApp, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.is_loading() {
        handle_loading_key(app, key);
        return;
    }

    if app.modal.is_some() {
        handle_modal_key(app, key);
        return;
    }

    match app.screen {
        Screen::Login => handle_login_key(app, key),
        Screen::Home | Screen::Inventory => handle_browse_key(app, key),
    }
}

fn handle_loading_key(app: &mut DashboardApp, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.abandon_request();
    }
}

/// Keys shared by every text input. Returns false if the key was not an edit.
fn edit_field(field: &mut TextField, key: KeyEvent) -> bool {
    match (key.code, key.modifiers) {
        (KeyCode::Backspace, _) => field.backspace(),
        (KeyCode::Delete, _) => field.delete(),
        (KeyCode::Left, _) => field.left(),
        (KeyCode::Right, _) => field.right(),
        (KeyCode::Home, _) => field.home(),
        (KeyCode::End, _) => field.end(),
        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => field.insert(c),
        _ => return false,
    }
    true
}

fn handle_login_key(app: &mut DashboardApp, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.login.on_password = !app.login.on_password;
        }
        KeyCode::Enter if !app.login.on_password => app.login.on_password = true,
        KeyCode::Enter => app.submit_login(),
        _ => {
            edit_field(app.login.focused(), key);
        }
    }
}

fn handle_browse_key(app: &mut DashboardApp, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab | KeyCode::BackTab => app.toggle_screen(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('L') => app.logout(),
        KeyCode::Char('t') if app.screen == Screen::Home => app.show_token = !app.show_token,
        _ if app.screen == Screen::Inventory => handle_inventory_key(app, key),
        _ => {}
    }
}

fn handle_inventory_key(app: &mut DashboardApp, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.select_up(),
        KeyCode::Down | KeyCode::Char('j') => app.select_down(),
        KeyCode::Char('n') => app.open_create(),
        KeyCode::Char('e') => app.open_edit(),
        KeyCode::Char('w') => app.open_withdraw(),
        KeyCode::Char('d') => app.open_delete(),
        _ => {}
    }
}

fn handle_modal_key(app: &mut DashboardApp, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.close_modal();
        return;
    }

    match app.modal.as_mut() {
        Some(Modal::ItemForm(form)) => match key.code {
            KeyCode::Enter => app.submit_modal(),
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            _ => {
                edit_field(form.focused(), key);
            }
        },
        Some(Modal::Withdraw(form)) => match key.code {
            // Submission stays disabled until the amount is valid.
            KeyCode::Enter if form.draft.can_submit() => app.submit_modal(),
            KeyCode::Enter => {}
            _ => {
                if edit_field(&mut form.field, key) {
                    form.sync();
                }
            }
        },
        Some(Modal::ConfirmDelete { .. }) => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => app.submit_modal(),
            KeyCode::Char('n') => app.close_modal(),
            _ => {}
        },
        None => {}
    }
}
