use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, QuoteField, Screen};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    None,
    Quit,
    /// Re-run the transport estimate for the current postal code
    EstimateTransport,
    /// Push the settings drafts through `update_rates` / `update_profile`
    SaveSettings,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Left, Right, Tab, Up};

    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    // An open edit swallows every key until Enter or Esc
    if let Some(buffer) = app.editing.as_mut() {
        match key.code {
            Char(character) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                buffer.push(character);
            }
            Backspace => {
                buffer.pop();
            }
            Enter => match app.screen {
                Screen::Quote => app.commit_quote_edit(),
                Screen::Settings => app.commit_setting_edit(),
            },
            Esc => app.editing = None,
            _ => {}
        }
        return Action::None;
    }

    if key.code == Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::EstimateTransport;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::Quote => {
            let field = app.current_quote_field();
            match key.code {
                Up => {
                    app.quote_index = app.quote_index.saturating_sub(1);
                }
                Down => {
                    if app.quote_index + 1 < QuoteField::ALL.len() {
                        app.quote_index += 1;
                    }
                }
                Tab => app.open_settings(),
                Left if field == QuoteField::Package => app.cycle_package(false),
                Right if field == QuoteField::Package => app.cycle_package(true),
                // the postal code is typed straight into the session
                Char(character)
                    if field == QuoteField::PostalCode
                        && !key.modifiers.contains(KeyModifiers::CONTROL) =>
                {
                    app.clear_messages();
                    let mut code = app.session.inputs().postal_code.clone();
                    code.push(character);
                    app.edit_postal_code(code);
                }
                Backspace if field == QuoteField::PostalCode => {
                    let mut code = app.session.inputs().postal_code.clone();
                    code.pop();
                    app.edit_postal_code(code);
                }
                Enter if field == QuoteField::PostalCode => {
                    action = Action::EstimateTransport;
                }
                Enter if field != QuoteField::Package => {
                    app.clear_messages();
                    app.editing = Some(app.quote_value(field));
                }
                Char('q') | Esc => action = Action::Quit,
                _ => {}
            }
        }

        Screen::Settings => match key.code {
            Up => {
                app.settings_index = app.settings_index.saturating_sub(1);
            }
            Down => {
                if app.settings_index + 1 < app.settings_fields.len() {
                    app.settings_index += 1;
                }
            }
            Enter => {
                if let Some(field) = app.current_setting_field() {
                    app.clear_messages();
                    app.editing = Some(app.setting_value(field));
                }
            }
            Char('s') => action = Action::SaveSettings,
            Tab | Esc => {
                app.screen = Screen::Quote;
            }
            Char('q') => action = Action::Quit,
            _ => {}
        },
    }
    action
}
