//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

use std::fmt::Write;

use crate::commands::Output;
use crate::theme::{DIM, FRAME, OK, R, TITLE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

pub fn print(output: &Output, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", output.to_json()),
        OutputFormat::Table => match output {
            Output::Message(msg) => println!("{OK}{msg}{R}"),
            Output::Rows { headers, rows } => print!("{}", boxed(headers, rows)),
        },
    }
}

fn rule(buf: &mut String, widths: &[usize], left: char, mid: char, right: char) {
    buf.push_str(FRAME);
    buf.push(left);
    for (i, w) in widths.iter().enumerate() {
        if i > 0 {
            buf.push(mid);
        }
        buf.push_str(&"\u{2500}".repeat(w + 2));
    }
    buf.push(right);
    buf.push_str(R);
    buf.push('\n');
}

/// Draw rows as a bordered table with a row-count footer.
pub fn boxed(headers: &[&str], rows: &[Vec<String>]) -> String {
    let ncols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (c, cell) in row.iter().enumerate().take(ncols) {
            widths[c] = widths[c].max(cell.chars().count());
        }
    }

    let mut buf = String::new();
    rule(&mut buf, &widths, '\u{250c}', '\u{252c}', '\u{2510}');

    let bar = format!("{FRAME}\u{2502}{R}");
    buf.push_str(&bar);
    for (c, header) in headers.iter().enumerate() {
        let _ = write!(buf, " {TITLE}{:^width$}{R} {bar}", header, width = widths[c]);
    }
    buf.push('\n');
    rule(&mut buf, &widths, '\u{251c}', '\u{253c}', '\u{2524}');

    for row in rows {
        buf.push_str(&bar);
        for (c, width) in widths.iter().enumerate() {
            let cell = row.get(c).map_or("", String::as_str);
            let _ = write!(buf, " {:<width$} {bar}", cell, width = width);
        }
        buf.push('\n');
    }
    rule(&mut buf, &widths, '\u{2514}', '\u{2534}', '\u{2518}');

    let noun = if rows.len() == 1 { "row" } else { "rows" };
    let _ = writeln!(buf, "{DIM}{} {noun}{R}", rows.len());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(ch) = chars.next() {
            if ch == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(ch);
            }
        }
        out
    }

    #[test]
    fn pads_to_the_widest_cell() {
        let text = strip_ansi(&boxed(
            &["name", "kind"],
            &[
                vec!["age".into(), "SCALAR".into()],
                vec!["nickname".into(), "VECTOR".into()],
            ],
        ));
        let lines: Vec<&str> = text.lines().collect();
        let dashes = |n: usize| "\u{2500}".repeat(n);
        assert_eq!(
            lines[0],
            format!("\u{250c}{}\u{252c}{}\u{2510}", dashes(10), dashes(8))
        );
        assert_eq!(lines[1], "│   name   │  kind  │");
        assert_eq!(lines[3], "│ age      │ SCALAR │");
        assert_eq!(lines.last(), Some(&"2 rows"));
    }
}
