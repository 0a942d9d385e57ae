//! Box-drawn panels and tables for terminal reports.
//!
//! Panel bodies are written verbatim so ANSI colour captured from a child
//! process survives. Widths are computed from plain text; colour is applied
//! after padding.

use std::io::{self, Write};

use colored::{ColoredString, Colorize};

/// Default panel width in columns.
pub const PANEL_WIDTH: usize = 80;

const ANSI_RESET: &str = "\x1b[0m";

/// A titled panel around free-form text.
#[derive(Debug, Clone)]
pub struct Panel<'a> {
    pub title: &'a str,
    pub subtitle: Option<&'a str>,
    pub width: usize,
}

impl<'a> Panel<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            subtitle: None,
            width: PANEL_WIDTH,
        }
    }

    pub fn with_subtitle(mut self, subtitle: Option<&'a str>) -> Self {
        self.subtitle = subtitle;
        self
    }

    /// Write the panel with `body` inside it.
    pub fn render<W: Write>(&self, out: &mut W, body: &str) -> io::Result<()> {
        writeln!(out, "{}", border('╭', '╮', Some(self.title.bold().white()), self.title, self.width))?;
        for line in body.lines() {
            write!(out, "│ {line}")?;
            // Output that leaves a colour open must not bleed into the border.
            if line.contains('\x1b') {
                write!(out, "{ANSI_RESET}")?;
            }
            writeln!(out)?;
        }
        match self.subtitle {
            Some(sub) => writeln!(out, "{}", border('╰', '╯', Some(sub.normal()), sub, self.width)),
            None => writeln!(out, "{}", border('╰', '╯', None, "", self.width)),
        }
    }
}

/// `╭─ label ─────╮` sized to `width` visible columns.
fn border(left: char, right: char, label: Option<ColoredString>, plain: &str, width: usize) -> String {
    let inner = width.saturating_sub(2);
    match label {
        Some(label) => {
            let used = plain.chars().count() + 3;
            let fill = "─".repeat(inner.saturating_sub(used));
            format!("{left}─ {label} {fill}{right}")
        }
        None => format!("{left}{}{right}", "─".repeat(inner)),
    }
}

/// Column alignment within a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One table cell: plain text for sizing plus an optional colour.
#[derive(Clone)]
pub struct Cell {
    pub text: String,
    pub paint: fn(&str) -> ColoredString,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            paint: |s| s.normal(),
        }
    }

    pub fn painted(text: impl Into<String>, paint: fn(&str) -> ColoredString) -> Self {
        Self {
            text: text.into(),
            paint,
        }
    }

    fn width(&self) -> usize {
        self.text.chars().count()
    }

    fn padded(&self, width: usize, align: Align) -> String {
        let gap = width.saturating_sub(self.width());
        let (left, right) = match align {
            Align::Left => (0, gap),
            Align::Right => (gap, 0),
            Align::Center => (gap / 2, gap - gap / 2),
        };
        format!(
            "{}{}{}",
            " ".repeat(left),
            (self.paint)(&self.text),
            " ".repeat(right)
        )
    }
}

/// A simple bordered table.
#[derive(Clone)]
pub struct Table {
    headers: Vec<(String, Align)>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: &[(&str, Align)]) -> Self {
        Self {
            headers: headers
                .iter()
                .map(|(h, a)| (h.to_string(), *a))
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, (h, _))| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(Cell::width)
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let rule = |l: char, m: char, r: char| {
            let segs: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{l}{}{r}", segs.join(&m.to_string()))
        };

        writeln!(out, "{}", rule('┌', '┬', '┐'))?;
        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|((h, align), w)| Cell::painted(h.clone(), |s| s.bold()).padded(*w, *align))
            .collect();
        writeln!(out, "│ {} │", header.join(" │ "))?;
        writeln!(out, "{}", rule('├', '┼', '┤'))?;
        for row in &self.rows {
            let cells: Vec<String> = self
                .headers
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, ((_, align), w))| match row.get(i) {
                    Some(cell) => cell.padded(*w, *align),
                    None => " ".repeat(*w),
                })
                .collect();
            writeln!(out, "│ {} │", cells.join(" │ "))?;
        }
        writeln!(out, "{}", rule('└', '┴', '┘'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_panel(panel: &Panel<'_>, body: &str) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        panel.render(&mut out, body).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_panel_has_title_body_and_subtitle() {
        let panel = Panel::new("hw1-alice").with_subtitle(Some("press <Enter> to continue"));
        let text = render_panel(&panel, "line one\nline two\n");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("╭─ hw1-alice "));
        assert_eq!(lines[1], "│ line one");
        assert_eq!(lines[2], "│ line two");
        assert!(lines[3].contains("press <Enter> to continue"));
    }

    #[test]
    fn test_panel_border_width() {
        let panel = Panel::new("t");
        let text = render_panel(&panel, "");
        for line in text.lines() {
            assert_eq!(line.chars().count(), PANEL_WIDTH);
        }
    }

    #[test]
    fn test_panel_resets_open_ansi_colour() {
        let panel = Panel::new("t");
        let text = render_panel(&panel, "\x1b[31mred without reset\n");
        assert!(text.contains("\x1b[31mred without reset\x1b[0m"));
    }

    #[test]
    fn test_table_aligns_columns() {
        colored::control::set_override(false);
        let mut table = Table::new(&[("student", Align::Left), ("time", Align::Right)]);
        table.add_row(vec![Cell::plain("hw1-alice"), Cell::plain("1.00s")]);
        table.add_row(vec![Cell::plain("hw1-bo"), Cell::plain("12.50s")]);

        let mut out = Vec::new();
        table.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3], "│ hw1-alice │  1.00s │");
        assert_eq!(lines[4], "│ hw1-bo    │ 12.50s │");
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width));
    }
}
