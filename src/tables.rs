use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Row as ComfyRow, Table};
use std::io::IsTerminal;
use terminal_size::{Width as TermWidth, terminal_size};

pub trait TableRow {
    const HEADERS: &'static [&'static str];
    fn cells(&self) -> Vec<Cell>;
}

pub fn table_string<T: TableRow>(rows: Vec<T>, width: Option<u16>, color: bool) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    if let Some(w) = width {
        table.set_width(w);
    }

    table.set_header(ComfyRow::from(
        T::HEADERS
            .iter()
            .map(|h| header_cell(h, color))
            .collect::<Vec<_>>(),
    ));
    for row in rows {
        table.add_row(ComfyRow::from(row.cells()));
    }

    table.to_string()
}

pub fn terminal_width() -> Option<u16> {
    if let Ok(cols) = std::env::var("COLUMNS")
        && let Ok(v) = cols.parse::<u16>()
    {
        return Some(v);
    }
    terminal_size().map(|(TermWidth(w), _)| w)
}

fn header_cell(text: &str, color: bool) -> Cell {
    if color {
        Cell::new(text)
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan)
    } else {
        Cell::new(text)
    }
}

pub fn should_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}
