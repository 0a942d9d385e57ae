//! Line prompts for `gcr configure`.

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// Ask for a value, falling back to `default` on an empty answer.
pub fn prompt(label: &str, default: Option<&str>) -> io::Result<String> {
    let mut out = io::stdout();
    match default {
        Some(d) => write!(out, "{label} [{d}]: ")?,
        None => write!(out, "{label}: ")?,
    }
    out.flush()?;

    let answer = read_line()?;
    match (answer.is_empty(), default) {
        (true, Some(d)) => Ok(d.to_string()),
        _ => Ok(answer),
    }
}

/// Ask for a secret without echoing it when stdin is a terminal.
pub fn prompt_secret(label: &str) -> io::Result<String> {
    let mut out = io::stdout();
    write!(out, "{label}: ")?;
    out.flush()?;

    if !io::stdin().is_terminal() {
        return read_line();
    }

    let secret = {
        let _raw = RawMode::enable()?;
        read_hidden()?
    };
    writeln!(out)?;
    Ok(secret)
}

fn read_line() -> io::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn read_hidden() -> io::Result<String> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(secret),
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "input cancelled"));
            }
            KeyCode::Char(c) => secret.push(c),
            _ => {}
        }
    }
}

/// Raw terminal mode for the lifetime of the guard.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
