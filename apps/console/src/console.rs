//! # Console I/O
//!
//! Line-oriented prompts over any `BufRead`/`Write` pair. Production wires
//! stdin/stdout; tests wire a `Cursor` of scripted answers and a `Vec<u8>`.
//!
//! ## Prompt Conventions
//! ```text
//! Name: Rice 1kg                 read_text / read_required
//! Name [Rice 1kg]:               read_optional, blank keeps the value
//! Date (dd/mm/yyyy) [16/10/2026]: read_date with a default
//! Delete product P1? (Y/N): y    confirm
//! ```
//!
//! Reaching the end of input yields [`ErrorCode::InputClosed`](crate::error::ErrorCode),
//! which unwinds every menu loop.

use std::io::{BufRead, Write};

use chrono::NaiveDate;
use inventa_core::validation::require;
use inventa_core::{Money, Percentage, ValidationError};

use crate::config::DisplaySettings;
use crate::error::{AppError, AppResult};
use crate::table::Table;

/// Format used for every date typed or printed at the console.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub struct Console<R, W> {
    input: R,
    output: W,
    page_size: usize,
    show_error_details: bool,
    show_deleted: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        let display = DisplaySettings::default();
        Console {
            input,
            output,
            page_size: display.page_size,
            show_error_details: display.show_error_details,
            show_deleted: display.show_deleted,
        }
    }

    /// Applies the `[display]` settings.
    pub fn with_display(mut self, display: &DisplaySettings) -> Self {
        self.page_size = display.page_size.max(1);
        self.show_error_details = display.show_error_details;
        self.show_deleted = display.show_deleted;
        self
    }

    /// Whether listings include inactive rows.
    pub fn show_deleted(&self) -> bool {
        self.show_deleted
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    // =========================================================================
    // Output
    // =========================================================================

    pub fn line(&mut self, text: impl AsRef<str>) -> AppResult<()> {
        writeln!(self.output, "{}", text.as_ref())?;
        Ok(())
    }

    pub fn header(&mut self, title: &str) -> AppResult<()> {
        let rule = "=".repeat(title.chars().count() + 8);
        writeln!(self.output, "\n{}\n    {}\n{}", rule, title, rule)?;
        Ok(())
    }

    pub fn print_success(&mut self, message: impl AsRef<str>) -> AppResult<()> {
        self.line(format!("OK: {}", message.as_ref()))
    }

    pub fn print_warning(&mut self, message: impl AsRef<str>) -> AppResult<()> {
        self.line(format!("Warning: {}", message.as_ref()))
    }

    pub fn print_error(&mut self, error: &AppError) -> AppResult<()> {
        let message = error.display_message(self.show_error_details);
        self.line(format!("Error: {}", message))
    }

    /// Prints a table, pausing on `-- more (Enter) --` between pages.
    pub fn print_table(&mut self, table: &Table) -> AppResult<()> {
        if table.is_empty() {
            return self.line("No records found.");
        }

        let pages = table.paginate(self.page_size);
        let last = pages.len().saturating_sub(1);
        for (index, page) in pages.iter().enumerate() {
            for line in page {
                self.line(line)?;
            }
            if index < last {
                self.prompt("-- more (Enter) --")?;
            }
        }
        self.line(format!("{} record(s)", table.len()))
    }

    // =========================================================================
    // Input
    // =========================================================================

    fn read_line(&mut self) -> AppResult<String> {
        let mut buffer = String::new();
        if self.input.read_line(&mut buffer)? == 0 {
            return Err(AppError::input_closed());
        }
        Ok(buffer.trim().to_string())
    }

    fn prompt(&mut self, label: &str) -> AppResult<String> {
        write!(self.output, "{} ", label)?;
        self.output.flush()?;
        self.read_line()
    }

    /// Free text, possibly empty.
    pub fn read_text(&mut self, label: &str) -> AppResult<String> {
        self.prompt(&format!("{}:", label))
    }

    /// Text that must not be blank.
    pub fn read_required(&mut self, label: &str) -> AppResult<String> {
        let value = self.read_text(label)?;
        require(label, &value)?;
        Ok(value)
    }

    /// Shows the current value; a blank answer keeps it.
    pub fn read_optional(&mut self, label: &str, current: &str) -> AppResult<String> {
        let value = self.prompt(&format!("{} [{}]:", label, current))?;
        if value.is_empty() {
            Ok(current.to_string())
        } else {
            Ok(value)
        }
    }

    pub fn read_i64(&mut self, label: &str) -> AppResult<i64> {
        let value = self.read_text(label)?;
        parse_i64(label, &value)
    }

    pub fn read_optional_i64(&mut self, label: &str, current: i64) -> AppResult<i64> {
        let value = self.read_optional(label, &current.to_string())?;
        parse_i64(label, &value)
    }

    pub fn read_money(&mut self, label: &str) -> AppResult<Money> {
        let value = self.read_text(label)?;
        Ok(Money::parse(&value)?)
    }

    pub fn read_optional_money(&mut self, label: &str, current: Money) -> AppResult<Money> {
        let value = self.prompt(&format!("{} [{}]:", label, current))?;
        if value.is_empty() {
            return Ok(current);
        }
        Ok(Money::parse(&value)?)
    }

    /// Reads `dd/mm/yyyy`. A blank answer returns `default`, or fails when
    /// there is none.
    pub fn read_date(&mut self, label: &str, default: Option<NaiveDate>) -> AppResult<NaiveDate> {
        let prompt = match default {
            Some(day) => format!("{} (dd/mm/yyyy) [{}]:", label, day.format(DATE_FORMAT)),
            None => format!("{} (dd/mm/yyyy):", label),
        };
        let value = self.prompt(&prompt)?;

        if value.is_empty() {
            return default.ok_or_else(|| ValidationError::required(label).into());
        }
        parse_date(label, &value)
    }

    /// Percent typed as `15` or `12.5`.
    pub fn read_percent(&mut self, label: &str, current: Option<Percentage>) -> AppResult<Percentage> {
        let value = match current {
            Some(pct) => self.read_optional(&format!("{} (%)", label), &format_percent(pct))?,
            None => self.read_text(&format!("{} (%)", label))?,
        };

        let pct: f64 = value.trim_end_matches('%').trim().parse().map_err(|_| {
            ValidationError::invalid_format(label, "expected a number between 0 and 100")
        })?;
        Ok(Percentage::from_percent_input(pct)?)
    }

    /// Y/N question. `s`/`si` count as yes too.
    pub fn confirm(&mut self, question: &str) -> AppResult<bool> {
        let answer = self.prompt(&format!("{} (Y/N):", question))?;
        Ok(matches!(
            answer.to_lowercase().as_str(),
            "y" | "yes" | "s" | "si" | "sí"
        ))
    }

    pub fn pause(&mut self) -> AppResult<()> {
        self.prompt("Press Enter to continue...")?;
        Ok(())
    }

    /// Prints a numbered menu and returns the raw choice.
    pub fn choose(&mut self, title: &str, options: &[(&str, &str)]) -> AppResult<String> {
        self.header(title)?;
        for (key, label) in options {
            writeln!(self.output, "  {}. {}", key, label)?;
        }
        self.prompt("Option:")
    }
}

fn parse_i64(label: &str, value: &str) -> AppResult<i64> {
    if value.is_empty() {
        return Err(ValidationError::required(label).into());
    }
    value
        .parse()
        .map_err(|_| ValidationError::invalid_format(label, "expected a whole number").into())
}

/// Parses `dd/mm/yyyy`.
pub fn parse_date(label: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::invalid_format(label, "expected dd/mm/yyyy").into())
}

pub fn format_date(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

fn format_percent(pct: Percentage) -> String {
    let whole = pct.bps() / 100;
    let rest = pct.bps() % 100;
    if rest == 0 {
        whole.to_string()
    } else {
        format!("{}.{:02}", whole, rest)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{output_of, scripted};
    use super::*;
    use crate::table::Column;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_read_optional_keeps_blank() {
        let mut console = scripted(&["", "Beans"]);
        assert_eq!(console.read_optional("Name", "Rice").unwrap(), "Rice");
        assert_eq!(console.read_optional("Name", "Rice").unwrap(), "Beans");
        assert!(output_of(&console).contains("Name [Rice]:"));
    }

    #[test]
    fn test_read_required_rejects_blank() {
        let mut console = scripted(&["   "]);
        let err = console.read_required("Name").unwrap_err();
        assert_eq!(err.message, "Name is required");
    }

    #[test]
    fn test_read_numbers() {
        let mut console = scripted(&["42", "x", "1,250.50", "-3"]);
        assert_eq!(console.read_i64("Stock").unwrap(), 42);
        assert!(console.read_i64("Stock").is_err());
        assert_eq!(console.read_money("Cost").unwrap().cents(), 125_050);
        assert!(console.read_money("Cost").is_err());
    }

    #[test]
    fn test_read_date_formats_and_default() {
        let mut console = scripted(&["05/03/2024", "", "2024-03-05", ""]);
        assert_eq!(console.read_date("Date", None).unwrap(), day(2024, 3, 5));
        assert_eq!(
            console.read_date("Date", Some(day(2026, 10, 16))).unwrap(),
            day(2026, 10, 16)
        );
        assert!(console.read_date("Date", None).is_err());
        assert!(console.read_date("Date", None).is_err());
    }

    #[test]
    fn test_read_percent() {
        let mut console = scripted(&["15", "12.5%", "101", ""]);
        assert_eq!(console.read_percent("Discount", None).unwrap().bps(), 1500);
        assert_eq!(console.read_percent("Discount", None).unwrap().bps(), 1250);
        assert!(console.read_percent("Discount", None).is_err());
        assert_eq!(
            console
                .read_percent("Discount", Some(Percentage::from_bps(750)))
                .unwrap()
                .bps(),
            750
        );
        assert!(output_of(&console).contains("Discount (%) [7.50]:"));
    }

    #[test]
    fn test_confirm_accepts_spanish_yes() {
        let mut console = scripted(&["S", "n", "yes"]);
        assert!(console.confirm("Delete?").unwrap());
        assert!(!console.confirm("Delete?").unwrap());
        assert!(console.confirm("Delete?").unwrap());
    }

    #[test]
    fn test_end_of_input_is_reported() {
        let mut console = scripted(&[]);
        // The single empty line is consumed first.
        assert_eq!(console.read_text("x").unwrap(), "");
        assert!(console.read_text("x").unwrap_err().is_input_closed());
    }

    #[test]
    fn test_print_table_paginates() {
        let mut table = Table::new(vec![Column::left("ID", 4), Column::left("NAME", 10)]);
        for i in 0..5 {
            table.row(vec![i.to_string(), format!("Item {}", i)]);
        }

        let mut console = scripted(&["", ""]).with_display(&DisplaySettings {
            page_size: 2,
            ..DisplaySettings::default()
        });
        console.print_table(&table).unwrap();

        let out = output_of(&console);
        assert_eq!(out.matches("-- more (Enter) --").count(), 2);
        assert!(out.contains("Item 4"));
        assert!(out.contains("5 record(s)"));
    }

    #[test]
    fn test_empty_table_message() {
        let table = Table::new(vec![Column::left("ID", 4)]);
        let mut console = scripted(&[]);
        console.print_table(&table).unwrap();
        assert!(output_of(&console).contains("No records found."));
    }
}
