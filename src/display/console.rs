// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    error::Error,
    io::{self, Write},
};

use crate::display::{Row, ROWS};

/// The character width of a rendered row.
const WIDTH: usize = 24;

/// A display rendered as console text. The selected row marker stands in
/// for inversion.
pub struct Display<W: Write> {
    writer: W,
}

impl Display<io::Stdout> {
    pub fn new() -> Display<io::Stdout> {
        Display {
            writer: io::stdout(),
        }
    }
}

#[cfg(test)]
impl<W: Write> Display<W> {
    fn with_writer(writer: W) -> Display<W> {
        Display { writer }
    }
}

impl<W: Write + Send> super::Display for Display<W> {
    fn splash(&mut self, text: &str) -> Result<(), Box<dyn Error>> {
        writeln!(self.writer, "[ {} ]", text)?;
        self.writer.flush()?;
        Ok(())
    }

    fn draw(&mut self, rows: &[Option<Row>; ROWS]) -> Result<(), Box<dyn Error>> {
        for row in rows {
            match row {
                Some(row) => {
                    let marker = if row.inverted { '*' } else { ' ' };
                    let value_width = WIDTH.saturating_sub(row.name.len() + 1);
                    writeln!(
                        self.writer,
                        "{}{} {:>value_width$}",
                        marker, row.name, row.value
                    )?;
                }
                None => writeln!(self.writer)?,
            }
        }
        writeln!(self.writer, "{}", "-".repeat(WIDTH + 2))?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Display as _;

    fn make_row(name: &str, value: &str, inverted: bool) -> Option<Row> {
        Some(Row {
            name: name.to_string(),
            value: value.to_string(),
            inverted,
        })
    }

    #[test]
    fn test_draw() {
        let mut display = Display::with_writer(Vec::new());
        display
            .draw(&[
                make_row("Patch", "Basic", false),
                make_row("Volume", "100", true),
                None,
            ])
            .expect("draw");

        let output = String::from_utf8(display.writer).expect("utf8");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(" Patch"));
        assert!(lines[0].ends_with("Basic"));
        assert!(lines[1].starts_with("*Volume"));
        assert!(lines[1].ends_with("100"));
        assert_eq!(lines[2], "");
    }

    #[test]
    fn test_splash() {
        let mut display = Display::with_writer(Vec::new());
        display.splash("Loading patch...").expect("splash");

        let output = String::from_utf8(display.writer).expect("utf8");
        assert_eq!(output, "[ Loading patch... ]\n");
    }
}
