use std::borrow::Cow;
use std::fmt::Write as _;

pub const MAX_CELL_WIDTH: usize = 48;

pub fn render_table<H: AsRef<str>>(headers: &[H], rows: &[Vec<String>]) -> String {
    let headers = headers
        .iter()
        .map(|h| fit_cell(h.as_ref()))
        .collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|row| {
            row.iter()
                .take(headers.len())
                .map(|cell| fit_cell(cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(&headers, &widths));
    let rule = widths
        .iter()
        .map(|w| Cow::Owned("-".repeat((*w).max(1))))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table<H: AsRef<str>>(headers: &[H], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[Cow<'_, str>], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let padding = width.saturating_sub(display_width(value));
            format!("{value}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn fit_cell(value: &str) -> Cow<'_, str> {
    let flattened = if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    };
    if display_width(&flattened) <= MAX_CELL_WIDTH {
        return flattened;
    }
    let mut cut = flattened
        .chars()
        .take(MAX_CELL_WIDTH - 1)
        .collect::<String>();
    cut.push('…');
    Cow::Owned(cut)
}
