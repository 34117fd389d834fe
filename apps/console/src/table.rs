//! # Fixed-Width Tables
//!
//! ```text
//! ID      NAME                      STOCK  STATUS
//! ------  ------------------------  -----  --------
//! P1      Arroz Diana 1kg               4  BAJO
//! P2      Aceite de girasol extr...    60  NORMAL
//! ```
//!
//! Cells wider than their column are cut and end in `...`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub title: &'static str,
    pub width: usize,
    pub align: Align,
}

impl Column {
    pub fn left(title: &'static str, width: usize) -> Self {
        Column {
            title,
            width,
            align: Align::Left,
        }
    }

    /// Right-aligned, for quantities and amounts.
    pub fn right(title: &'static str, width: usize) -> Self {
        Column {
            title,
            width,
            align: Align::Right,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Missing cells render blank, extra cells are dropped.
    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn render_cells<'a>(&self, cells: impl Iterator<Item = &'a str>) -> String {
        let mut cells = cells;
        let rendered: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let text = truncate(cells.next().unwrap_or(""), column.width);
                match column.align {
                    Align::Left => format!("{:<width$}", text, width = column.width),
                    Align::Right => format!("{:>width$}", text, width = column.width),
                }
            })
            .collect();
        rendered.join("  ").trim_end().to_string()
    }

    fn header_lines(&self) -> [String; 2] {
        let titles = self.render_cells(self.columns.iter().map(|c| c.title));
        let rule = self
            .columns
            .iter()
            .map(|c| "-".repeat(c.width))
            .collect::<Vec<_>>()
            .join("  ");
        [titles, rule]
    }

    /// Every line of the table, header included.
    pub fn render(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.header_lines().into();
        lines.extend(
            self.rows
                .iter()
                .map(|row| self.render_cells(row.iter().map(String::as_str))),
        );
        lines
    }

    /// Splits the rows into pages of `page_size`, each starting with the header.
    pub fn paginate(&self, page_size: usize) -> Vec<Vec<String>> {
        let size = page_size.max(1);
        self.rows
            .chunks(size)
            .map(|chunk| {
                let mut page: Vec<String> = self.header_lines().into();
                page.extend(
                    chunk
                        .iter()
                        .map(|row| self.render_cells(row.iter().map(String::as_str))),
                );
                page
            })
            .collect()
    }
}

/// Cuts `text` to `width` characters, ending in `...` when shortened.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let mut cut: String = text.chars().take(width - 3).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Rice", 10), "Rice");
        assert_eq!(truncate("Aceite de girasol", 10), "Aceite ...");
        assert_eq!(truncate("Aceite de girasol", 10).chars().count(), 10);
        assert_eq!(truncate("Ñandú rojo", 6), "Ñan...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_render_aligns_columns() {
        let mut table = Table::new(vec![Column::left("ID", 4), Column::right("QTY", 5)]);
        table.row(vec!["P1".into(), "7".into()]);

        let lines = table.render();
        assert_eq!(lines[0], "ID      QTY");
        assert_eq!(lines[1], "----  -----");
        assert_eq!(lines[2], "P1        7");
    }

    #[test]
    fn test_missing_cells_render_blank() {
        let mut table = Table::new(vec![Column::left("A", 3), Column::left("B", 3)]);
        table.row(vec!["x".into()]);
        assert_eq!(table.render()[2], "x");
    }

    #[test]
    fn test_paginate_repeats_header() {
        let mut table = Table::new(vec![Column::left("N", 3)]);
        for i in 0..5 {
            table.row(vec![i.to_string()]);
        }

        let pages = table.paginate(2);
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|p| p[0] == "N"));
        assert_eq!(pages[2].len(), 3);
    }
}
