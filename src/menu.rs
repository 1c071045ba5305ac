//! Interactive mode selection.
//!
//! Shown when slipway runs with no subcommand on a real terminal: a small
//! inline list driven by the arrow keys, redrawn in place and cleared once a
//! choice is made. The terminal is put into raw mode only for the duration
//! of the menu and restored even when reading input fails.

use std::io::{self, Write};

use anyhow::Result;
use crossterm::cursor::{Hide, MoveToColumn, MoveUp, Show};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType};
use crossterm::{execute, queue};

use crate::launch::Mode;

const ENTRIES: [(Mode, &str); 3] = [
    (Mode::Dev, "dev    start the development server"),
    (Mode::Build, "build  produce a production build"),
    (Mode::Start, "start  serve the production build"),
];

enum MenuStep {
    Stay,
    Pick,
    Dismiss,
}

/// Lets the operator pick a mode; `None` when the menu is dismissed.
pub fn pick_mode() -> Result<Option<Mode>> {
    let _guard = RawModeGuard::enable()?;
    let mut out = io::stdout();
    let mut selected = 0usize;

    draw(&mut out, selected, false)?;
    let picked = loop {
        let TermEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match step(key, &mut selected) {
            MenuStep::Stay => draw(&mut out, selected, true)?,
            MenuStep::Pick => break Some(ENTRIES[selected].0),
            MenuStep::Dismiss => break None,
        }
    };

    // Clear the menu lines before handing the terminal back.
    queue!(
        out,
        MoveUp(ENTRIES.len() as u16),
        MoveToColumn(0),
        Clear(ClearType::FromCursorDown)
    )?;
    out.flush()?;
    Ok(picked)
}

fn draw(out: &mut impl Write, selected: usize, rewind: bool) -> io::Result<()> {
    if rewind {
        queue!(out, MoveUp(ENTRIES.len() as u16))?;
    }
    for (idx, (_, label)) in ENTRIES.iter().enumerate() {
        queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        if idx == selected {
            write!(out, "\u{1b}[36m› {}\u{1b}[0m\r\n", label)?;
        } else {
            write!(out, "  {}\r\n", label)?;
        }
    }
    out.flush()
}

fn step(key: KeyEvent, selected: &mut usize) -> MenuStep {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            *selected = selected.checked_sub(1).unwrap_or(ENTRIES.len() - 1);
            MenuStep::Stay
        }
        KeyCode::Down | KeyCode::Char('j') => {
            *selected = (*selected + 1) % ENTRIES.len();
            MenuStep::Stay
        }
        KeyCode::Enter => MenuStep::Pick,
        KeyCode::Esc | KeyCode::Char('q') => MenuStep::Dismiss,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => MenuStep::Dismiss,
        _ => MenuStep::Stay,
    }
}

/// Raw mode held for the menu's lifetime, released on drop.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), Hide)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show);
        let _ = disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn navigation_wraps_both_ways() {
        let mut selected = 0;
        assert!(matches!(step(key(KeyCode::Up), &mut selected), MenuStep::Stay));
        assert_eq!(selected, ENTRIES.len() - 1);
        assert!(matches!(step(key(KeyCode::Down), &mut selected), MenuStep::Stay));
        assert_eq!(selected, 0);
    }

    #[test]
    fn vim_keys_move_the_selection() {
        let mut selected = 0;
        step(key(KeyCode::Char('j')), &mut selected);
        assert_eq!(selected, 1);
        step(key(KeyCode::Char('k')), &mut selected);
        assert_eq!(selected, 0);
    }

    #[test]
    fn enter_picks_and_escape_dismisses() {
        let mut selected = 1;
        assert!(matches!(step(key(KeyCode::Enter), &mut selected), MenuStep::Pick));
        assert!(matches!(step(key(KeyCode::Esc), &mut selected), MenuStep::Dismiss));
        assert!(matches!(step(key(KeyCode::Char('q')), &mut selected), MenuStep::Dismiss));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(step(ctrl_c, &mut selected), MenuStep::Dismiss));
        assert_eq!(selected, 1);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut selected = 2;
        assert!(matches!(step(key(KeyCode::Char('x')), &mut selected), MenuStep::Stay));
        assert_eq!(selected, 2);
    }
}
