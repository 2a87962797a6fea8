//! Startup banner: "WEEKWISE" in figlet ASCII, striped left to right in seven
//! weekday colours, Monday through Sunday.

use crate::domain::Weekday;
use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// One colour per weekday, Monday first.
const DAY_COLORS: [(u8, u8, u8); 7] = [
    (0x38, 0xbd, 0xf8),
    (0x60, 0xa5, 0xfa),
    (0x81, 0x8c, 0xf8),
    (0xa7, 0x8b, 0xfa),
    (0xf4, 0x72, 0xb6),
    (0xfb, 0xbf, 0x24),
    (0x34, 0xd3, 0x99),
];

/// Weekday band that column `col` of a `width`-wide banner falls in.
fn day_for_column(col: usize, width: usize) -> Weekday {
    let band = (col * Weekday::ALL.len()) / width.max(1);
    Weekday::ALL[band.min(Weekday::ALL.len() - 1)]
}

fn day_color(day: Weekday) -> Color {
    let idx = Weekday::ALL.iter().position(|d| *d == day).unwrap_or(0);
    let (r, g, b) = DAY_COLORS[idx];
    Color::Rgb { r, g, b }
}

/// Figlet art for the banner, or the plain name if the font fails to load.
fn banner_lines() -> Vec<String> {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("WEEKWISE").map(|f| f.to_string()))
        .map(|art| art.lines().map(String::from).collect())
        .unwrap_or_else(|| vec!["WEEKWISE".to_string()])
}

/// Splits a line into runs that share a weekday band.
fn day_runs(line: &str, width: usize) -> Vec<(Weekday, String)> {
    let mut runs: Vec<(Weekday, String)> = Vec::new();
    for (col, ch) in line.chars().enumerate() {
        let day = day_for_column(col, width);
        match runs.last_mut() {
            Some((last, text)) if *last == day => text.push(ch),
            _ => runs.push((day, ch.to_string())),
        }
    }
    runs
}

/// Prints the banner, then version and listen address. Output errors are ignored.
pub fn print_welcome(bind_addr: &str) {
    let mut out = stdout();
    let lines = banner_lines();
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(1);

    for line in &lines {
        for (day, text) in day_runs(line, width) {
            let _ = out.execute(SetForegroundColor(day_color(day)));
            let _ = out.execute(Print(text));
        }
        let _ = out.execute(ResetColor);
        let _ = out.execute(Print("\r\n"));
    }

    let days: Vec<&str> = Weekday::ALL.iter().map(|d| &d.as_str()[..3]).collect();
    let _ = out.execute(SetForegroundColor(day_color(Weekday::Sunday)));
    let _ = out.execute(Print(format!(
        "v{}  {}  http://{}\r\n",
        env!("CARGO_PKG_VERSION"),
        days.join(" · "),
        bind_addr
    )));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_run_monday_to_sunday() {
        assert_eq!(day_for_column(0, 70), Weekday::Monday);
        assert_eq!(day_for_column(35, 70), Weekday::Thursday);
        assert_eq!(day_for_column(69, 70), Weekday::Sunday);
        assert_eq!(day_for_column(5, 0), Weekday::Sunday);
    }

    #[test]
    fn runs_cover_the_line_in_order() {
        let runs = day_runs("abcdefghijklmn", 14);
        assert_eq!(runs.len(), 7);
        assert_eq!(runs[0], (Weekday::Monday, "ab".to_string()));
        assert_eq!(runs[6], (Weekday::Sunday, "mn".to_string()));
    }

    #[test]
    fn banner_has_art() {
        assert!(!banner_lines().is_empty());
    }
}
