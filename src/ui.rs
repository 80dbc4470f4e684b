use crate::client::AppSnapshot;
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::{
    FutureExt,
    StreamExt,
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use unicode_width::UnicodeWidthStr;

const MAX_NUMBER_DIGITS: usize = 2;
const MAX_STAKE_CHARS: usize = 40;
const MAX_DECODE_INPUT: usize = 4096;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Field {
    #[default]
    Number,
    Stake,
}

impl Field {
    fn toggled(self) -> Self {
        match self {
            Field::Number => Field::Stake,
            Field::Stake => Field::Number,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormAction {
    Push { row: usize, field: Field, ch: char },
    Pop { row: usize, field: Field },
    AddRow,
    RemoveRow(usize),
    ClearRow(usize),
    Repeat,
    Double,
    Halve,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    Redraw,
    Form(FormAction),
    ToggleKind,
    PlaceBet,
    RefreshBalances,
    Reconnect,
    Lucky(usize),
    Decode(String),
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    row: usize,
    field: Field,
    row_count: usize,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    DecodeModal(DecodeState),
    LuckyModal(LuckyState),
    QuitModal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct DecodeState {
    input: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LuckyState {
    count: String,
}

impl Default for LuckyState {
    fn default() -> Self {
        LuckyState {
            count: "6".to_string(),
        }
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableBracketedPaste,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    state.row_count = snap.rows.len();
    state.row = state.row.min(state.row_count.saturating_sub(1));
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub type InputEventReceiver = EventStream;

pub fn input_event_stream() -> InputEventReceiver {
    EventStream::new()
}

pub async fn next_raw_event(events: &mut InputEventReceiver) -> Result<Event> {
    match events.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

/// Drops input that arrived while the loop was busy, so keys pressed during a
/// submission cannot trigger a second one.
pub fn discard_queued_input(events: &mut InputEventReceiver) -> usize {
    let mut dropped = 0;
    while let Some(Some(_)) = events.next().now_or_never() {
        dropped += 1;
    }
    dropped
}

pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => interpret_key(state, key),
        Event::Paste(text) => match &mut state.mode {
            Mode::DecodeModal(ds) => {
                push_bounded(&mut ds.input, text.trim(), MAX_DECODE_INPUT);
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Event::Resize(_, _) => Some(UserEvent::Redraw),
        _ => None,
    }
}

fn push_bounded(target: &mut String, text: &str, max: usize) {
    for ch in text.chars() {
        if target.chars().count() >= max {
            break;
        }
        target.push(ch);
    }
}

fn interpret_key(state: &mut UiState, key: KeyEvent) -> Option<UserEvent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UserEvent::Quit);
    }

    match &mut state.mode {
        Mode::DecodeModal(ds) => {
            return match key.code {
                KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Enter => Some(UserEvent::Decode(ds.input.clone())),
                KeyCode::Backspace => {
                    ds.input.pop();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Delete => {
                    ds.input.clear();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char(c) => {
                    push_bounded(&mut ds.input, &c.to_string(), MAX_DECODE_INPUT);
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::LuckyModal(ls) => {
            return match key.code {
                KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Enter => {
                    let count = ls.count.parse().unwrap_or(1);
                    Some(UserEvent::Lucky(count))
                }
                KeyCode::Backspace => {
                    ls.count.pop();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char(c) if c.is_ascii_digit() && ls.count.len() < 2 => {
                    ls.count.push(c);
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::QuitModal => {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Some(UserEvent::Quit),
                KeyCode::Char('n') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::Normal => {}
    }

    let row = state.row;
    let field = state.field;
    Some(match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            state.mode = Mode::QuitModal;
            UserEvent::Redraw
        }
        KeyCode::Up => {
            state.row = state.row.saturating_sub(1);
            UserEvent::Redraw
        }
        KeyCode::Down => {
            if state.row + 1 < state.row_count {
                state.row += 1;
            }
            UserEvent::Redraw
        }
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
            state.field = state.field.toggled();
            UserEvent::Redraw
        }
        KeyCode::Char(c) if c.is_ascii_digit() || (c == '.' && field == Field::Stake) => {
            UserEvent::Form(FormAction::Push { row, field, ch: c })
        }
        KeyCode::Backspace => UserEvent::Form(FormAction::Pop { row, field }),
        KeyCode::Char('a') => {
            state.row = state.row_count;
            state.field = Field::Number;
            UserEvent::Form(FormAction::AddRow)
        }
        KeyCode::Char('x') => UserEvent::Form(FormAction::RemoveRow(row)),
        KeyCode::Char('c') => UserEvent::Form(FormAction::ClearRow(row)),
        KeyCode::Char('r') => UserEvent::Form(FormAction::Repeat),
        KeyCode::Char('d') => UserEvent::Form(FormAction::Double),
        KeyCode::Char('h') => UserEvent::Form(FormAction::Halve),
        KeyCode::Char('t') => UserEvent::ToggleKind,
        KeyCode::Char('f') => UserEvent::RefreshBalances,
        KeyCode::Char('w') => UserEvent::Reconnect,
        KeyCode::Enter => UserEvent::PlaceBet,
        KeyCode::Char('l') => {
            state.mode = Mode::LuckyModal(LuckyState::default());
            UserEvent::Redraw
        }
        KeyCode::Char('e') => {
            state.mode = Mode::DecodeModal(DecodeState::default());
            UserEvent::Redraw
        }
        _ => return None,
    })
}

/// Caps a number or stake cell at a sane width.
pub fn accepts_more(field: Field, current: &str) -> bool {
    match field {
        Field::Number => current.len() < MAX_NUMBER_DIGITS,
        Field::Stake => current.len() < MAX_STAKE_CHARS,
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // wallet
            Constraint::Length(3), // contract constants
            Constraint::Min(6),    // bet form
            Constraint::Length(6), // last bet
            Constraint::Length(8), // status/errors + help
        ])
        .split(f.area());

    draw_wallet_panel(f, chunks[0], snap);
    draw_constants_panel(f, chunks[1], snap);
    draw_form(f, state, chunks[2], snap);
    draw_last_bet(f, chunks[3], snap);
    draw_bottom(f, chunks[4], snap);
    draw_modals(f, state, snap);
}

fn draw_wallet_panel(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let balances = match &snap.balances {
        Some(b) => format!(
            "VIC: {} | FROLL: {} | Pool: {} FROLL",
            b.native_display(),
            b.token_display(),
            b.pool_display()
        ),
        None => "VIC: - | FROLL: - | Pool: -".to_string(),
    };
    let text = format!("Wallet: {} | {} | {}", snap.address, snap.network, balances);
    let widget =
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Wallet"));
    f.render_widget(widget, area);
}

fn draw_constants_panel(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let (text, style) = if snap.constants_live {
        (snap.constants.clone(), Style::default())
    } else {
        (
            format!("{} (defaults)", snap.constants),
            Style::default().fg(Color::Yellow),
        )
    };
    let widget = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Game"));
    f.render_widget(widget, area);
}

fn draw_form(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let selected = Style::default().fg(Color::Black).bg(Color::Cyan);
    let rows: Vec<Row> = snap
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let active = i == state.row && state.mode == Mode::Normal;
            let cell = |text: &str, field: Field| {
                let shown = if text.is_empty() { "_" } else { text };
                let cell = Cell::from(shown.to_string());
                if active && state.field == field {
                    cell.style(selected)
                } else {
                    cell
                }
            };
            Row::new(vec![
                Cell::from(format!("{:>3}", i + 1)),
                cell(&row.number, Field::Number),
                cell(&row.stake, Field::Stake),
            ])
        })
        .collect();

    let title = format!(
        "Bet: {} | Rows: {} | Total: {} FROLL{}",
        snap.kind,
        snap.rows.len(),
        snap.total_stake,
        if snap.submitting { " | submitting..." } else { "" }
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(8),
            Constraint::Min(12),
        ],
    )
    .header(
        Row::new(vec!["#", "Number", "Stake (FROLL)"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title));

    let visible = area.height.saturating_sub(3) as usize;
    let mut table_state = TableState::default()
        .with_selected(Some(state.row))
        .with_offset(state.row.saturating_sub(visible.saturating_sub(1)));
    f.render_stateful_widget(table, area, &mut table_state);
}

fn draw_last_bet(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let lines: Vec<Line> = match &snap.last_bet {
        Some(last) => {
            let outcome = match last.outcome {
                Some("WIN") => Span::styled("WIN", Style::default().fg(Color::Green)),
                Some(other) => Span::styled(other, Style::default().fg(Color::Red)),
                None => Span::raw("No win/loss yet"),
            };
            vec![
                Line::from(format!("Bets: {}", last.bets)),
                Line::from(format!("Total: {}", last.total)),
                Line::from(format!("Result: {}", last.result)),
                Line::from(vec![Span::raw("Outcome: "), outcome]),
            ]
        }
        None => vec![Line::from("No bet placed yet")],
    };
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Last Bet"));
    f.render_widget(widget, area);
}

fn draw_bottom(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(4)])
        .split(area);

    let status_widget = if snap.errors.is_empty() {
        let mut lines: Vec<Line> = Vec::new();
        if snap.status.trim().is_empty() {
            lines.push(Line::from("Ready"));
        } else {
            for line in snap.status.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        if let Some(lucky) = &snap.lucky {
            lines.push(Line::from(lucky.clone()));
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let lines: Vec<Line> = snap
            .errors
            .iter()
            .rev()
            .map(|e| Line::from(e.clone()))
            .collect();
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(status_widget, chunks[0]);

    let help = Paragraph::new(
        "↑/↓ row | Tab field | 0-9 . edit | a add | x remove | c clear | r repeat | d double | h halve | t Lo/De | Enter bet\n\
         l lucky | e decode | f refresh | w reconnect | q/Esc quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, chunks[1]);
}

fn draw_modals(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    match &state.mode {
        Mode::DecodeModal(ds) => {
            let area = centered_rect(80, 60, f.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Decode Event Data");
            let inner = block.inner(area);
            f.render_widget(Clear, area);
            f.render_widget(block, area);
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),
                    Constraint::Min(3),
                    Constraint::Length(1),
                ])
                .split(inner);
            let input = Paragraph::new(tail_to_width(&ds.input, parts[0].width as usize * 3))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("Tx hash, link or data"));
            f.render_widget(input, parts[0]);
            let output = snap.decoded.clone().unwrap_or_default();
            f.render_widget(Paragraph::new(output).wrap(Wrap { trim: false }), parts[1]);
            f.render_widget(
                Paragraph::new("Enter=decode Del=clear Esc=close (paste supported)"),
                parts[2],
            );
        }
        Mode::LuckyModal(ls) => {
            let area = centered_rect(50, 30, f.area());
            let block = Block::default().borders(Borders::ALL).title("Lucky Picks");
            let preview = snap.lucky.clone().unwrap_or_default();
            let p = Paragraph::new(format!(
                "How many numbers (1-99): {}\n{}\nEnter=generate Esc=close\nSuggestions only; nothing is added to your bet.",
                ls.count, preview
            ))
            .wrap(Wrap { trim: false });
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(30, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Quit");
            let p = Paragraph::new("Quit LoDeFROLL? y/Enter = yes, n/Esc = no");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

/// Keeps the end of `text` that fits in `width` columns.
fn tail_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut kept: Vec<char> = Vec::new();
    let mut used = 0;
    for ch in text.chars().rev() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            break;
        }
        used += w;
        kept.push(ch);
    }
    kept.reverse();
    format!("…{}", kept.into_iter().collect::<String>())
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn state_with_rows(rows: usize) -> UiState {
        UiState {
            row_count: rows,
            ..UiState::default()
        }
    }

    #[test]
    fn interpret_event__routes_digits_to_the_focused_cell() {
        // given
        let mut state = state_with_rows(2);
        interpret_event(&mut state, key(KeyCode::Down));
        interpret_event(&mut state, key(KeyCode::Tab));

        // when
        let event = interpret_event(&mut state, key(KeyCode::Char('7')));

        // then
        assert_eq!(
            event,
            Some(UserEvent::Form(FormAction::Push {
                row: 1,
                field: Field::Stake,
                ch: '7',
            }))
        );
    }

    #[test]
    fn interpret_event__ignores_decimal_point_in_number_field() {
        let mut state = state_with_rows(1);

        let event = interpret_event(&mut state, key(KeyCode::Char('.')));

        assert_eq!(event, None);
    }

    #[test]
    fn interpret_event__decode_modal_collects_paste_and_submits() {
        // given
        let mut state = state_with_rows(1);
        interpret_event(&mut state, key(KeyCode::Char('e')));

        // when
        interpret_event(&mut state, Event::Paste("  0xabc \n".to_string()));
        let event = interpret_event(&mut state, key(KeyCode::Enter));

        // then
        assert_eq!(event, Some(UserEvent::Decode("0xabc".to_string())));
    }

    #[test]
    fn interpret_event__quit_requires_confirmation() {
        let mut state = state_with_rows(1);

        let first = interpret_event(&mut state, key(KeyCode::Char('q')));
        let second = interpret_event(&mut state, key(KeyCode::Char('y')));

        assert_eq!(first, Some(UserEvent::Redraw));
        assert_eq!(second, Some(UserEvent::Quit));
    }

    #[test]
    fn interpret_event__lucky_modal_reads_count() {
        let mut state = state_with_rows(1);
        interpret_event(&mut state, key(KeyCode::Char('l')));
        interpret_event(&mut state, key(KeyCode::Backspace));
        interpret_event(&mut state, key(KeyCode::Char('1')));
        interpret_event(&mut state, key(KeyCode::Char('2')));

        let event = interpret_event(&mut state, key(KeyCode::Enter));

        assert_eq!(event, Some(UserEvent::Lucky(12)));
    }

    #[test]
    fn tail_to_width__keeps_the_end() {
        assert_eq!(tail_to_width("abcdef", 10), "abcdef");
        assert_eq!(tail_to_width("abcdef", 4), "…def");
    }
}
