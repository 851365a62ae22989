use chrono::Local;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};
use treeshop_core::model::PricingBreakdown;

use crate::app::{App, QuoteField, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let today = Local::now().format("%b %-d, %Y");
    let header = Paragraph::new(format!(
        "{} – land clearing quote · {today}",
        app.session.profile().name
    ))
    .block(Block::default().borders(Borders::ALL).title("TreeShop"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::Quote => draw_quote(frame, app, *content_area),
        Screen::Settings => draw_settings(frame, app, *content_area),
    }

    let nav_hint = match (app.screen, app.editing.is_some()) {
        (_, true) => "Type value · Enter apply · Esc cancel",
        (Screen::Quote, false) => {
            "↑/↓ field · Enter edit · ←/→ package · Ctrl-R estimate transport · Tab settings · q quit"
        }
        (Screen::Settings, false) => "↑/↓ field · Enter edit · s save · Tab/Esc back · q quit",
    };

    let status_text = if app.session.is_estimating() {
        format!("Estimating transport… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else if let Some(msg) = &app.info_message {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.session.is_estimating() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_quote(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [inputs_area, breakdown_area] = chunks else {
        return;
    };

    let items = QuoteField::ALL
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let selected = idx == app.quote_index;
            let value = match (&app.editing, selected) {
                (Some(buffer), true) => format!("{buffer}▏"),
                _ => app.quote_value(*field),
            };
            let mut line = format!("{:<24}{value}", field.label());
            if *field == QuoteField::Package {
                let note = app.session.inputs().tier.density_description();
                if !note.is_empty() {
                    line = format!("{line}\n{:<24}{note}", "");
                }
            }
            ListItem::new(line)
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Project"))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(app.quote_index));
    frame.render_stateful_widget(list, *inputs_area, &mut state);

    let deposit_pct = app.session.rates().deposit_fraction * 100.0;
    let table = Table::new(
        breakdown_rows(app.session.breakdown(), app.session.inputs().tier.is_max(), deposit_pct),
        [Constraint::Min(24), Constraint::Length(16)],
    )
    .block(Block::default().borders(Borders::ALL).title("Quote"))
    .column_spacing(1);

    frame.render_widget(table, *breakdown_area);
}

fn breakdown_rows(quote: &PricingBreakdown, is_max: bool, deposit_pct: f64) -> Vec<Row<'static>> {
    let mut rows = vec![
        money_row("Base package", quote.base_cost),
        money_row("Transport", quote.transport_cost),
    ];

    if is_max {
        rows.push(money_row(
            &format!("Est. debris ({:.0} yds)", quote.estimated_debris_yards),
            quote.estimated_debris_cost,
        ));
        if quote.additional_debris_cost > 0.0 {
            rows.push(money_row("Additional debris", quote.additional_debris_cost));
        }
        rows.push(money_row("Total debris hauling", quote.debris_cost));
    } else {
        rows.push(money_row("Debris hauling", quote.debris_cost));
    }

    rows.push(money_row("Subtotal", quote.subtotal));
    rows.push(
        money_row("Final price", quote.final_price)
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
    );
    rows.push(money_row(
        &format!("Deposit ({deposit_pct:.0}%)"),
        quote.deposit_amount,
    ));
    rows.push(money_row("Balance due", quote.balance_due));
    rows
}

fn money_row(label: &str, amount: f64) -> Row<'static> {
    Row::new(vec![
        Cell::from(label.to_owned()),
        Cell::from(Text::from(format_currency(amount)).alignment(Alignment::Right)),
    ])
}

fn draw_settings(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = app
        .settings_fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let value = match (&app.editing, idx == app.settings_index) {
                (Some(buffer), true) => format!("{buffer}▏"),
                _ => app.setting_value(*field),
            };
            ListItem::new(format!("{:<34}{value}", field.label()))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Settings (unsaved edits are discarded on leave)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.settings_fields.is_empty() {
        state.select(Some(app.settings_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// US-style currency with thousands separators, e.g. `$7,532.50`.
fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(7532.5), "$7,532.50");
        assert_eq!(format_currency(1_883.126), "$1,883.13");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567.00");
        assert_eq!(format_currency(-20.0), "-$20.00");
    }

    #[test]
    fn max_tier_rows_split_debris() {
        let quote = PricingBreakdown {
            estimated_debris_yards: 500.0,
            estimated_debris_cost: 10_000.0,
            additional_debris_cost: 200.0,
            debris_cost: 10_200.0,
            ..PricingBreakdown::default()
        };
        assert_eq!(breakdown_rows(&quote, true, 25.0).len(), 9);
        assert_eq!(breakdown_rows(&quote, false, 25.0).len(), 7);
    }
}
