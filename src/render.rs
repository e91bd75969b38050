use comfy_table::{Attribute, Cell, Color, Table};

use crate::editor::DisplayMode;
use crate::model::{Document, LineItem, PartyField, PartySide, TAX_RATE};

pub const NOT_SPECIFIED: &str = "Not specified";
const DATE_FORMAT: &str = "%Y-%m-%d";

const TOTAL_COLOR: Color = Color::Rgb { r: 4, g: 120, b: 87 };
const HINT_COLOR: Color = Color::DarkGrey;

pub fn money(value: f64) -> String {
    format!("${:.2}", value)
}

/// Display text for a text field: the value, or a stand-in when it is empty.
pub fn field_text(value: &str, hint: &str, mode: DisplayMode) -> String {
    match (value.is_empty(), mode) {
        (false, _) => value.to_string(),
        (true, DisplayMode::Preview) => NOT_SPECIFIED.to_string(),
        (true, DisplayMode::Edit) => format!("[{}]", hint),
    }
}

pub fn party_hint(side: PartySide, field: PartyField) -> &'static str {
    match (side, field) {
        (PartySide::From, PartyField::Name) => "Your Company Name",
        (PartySide::To, PartyField::Name) => "Client Name",
        (_, PartyField::Address) => "Address",
        (_, PartyField::City) => "City, State ZIP",
        (_, PartyField::Email) => "Email",
        (_, PartyField::Phone) => "Phone",
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// No ANSI styling, whatever the output is.
    pub fn plain() -> Self {
        Renderer { color: false }
    }

    /// Styles the output when stdout is a terminal.
    pub fn terminal() -> Self {
        Renderer { color: true }
    }

    pub fn render(&self, doc: &Document, mode: DisplayMode) -> String {
        let mut out = String::new();
        let banner = match mode {
            DisplayMode::Edit => "INVOICE (editing)",
            DisplayMode::Preview => "INVOICE",
        };
        out.push_str(&format!("\n{}\n", banner));
        out.push_str(&format!("{}\n", self.header(doc, mode)));
        out.push_str(&format!("{}\n", self.parties(doc, mode)));
        out.push_str(&format!("{}\n", self.items(doc, mode)));
        out.push_str(&format!("{}\n", self.totals(doc)));
        out.push_str("\n--- Notes ---\n");
        out.push_str(&field_text(&doc.notes, "Additional notes...", mode));
        out.push('\n');
        out
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        if !self.color {
            table.force_no_tty();
        }
        table
    }

    fn text_cell(&self, value: &str, hint: &str, mode: DisplayMode) -> Cell {
        let cell = Cell::new(field_text(value, hint, mode));
        if value.is_empty() && mode == DisplayMode::Edit {
            cell.fg(HINT_COLOR)
        } else {
            cell
        }
    }

    fn header(&self, doc: &Document, mode: DisplayMode) -> Table {
        let mut table = self.table();
        table.add_row(vec![
            Cell::new("Invoice Number").add_attribute(Attribute::Bold),
            self.text_cell(&doc.invoice_number, "Invoice number", mode),
        ]);
        table.add_row(vec![
            Cell::new("Date").add_attribute(Attribute::Bold),
            Cell::new(doc.date.format(DATE_FORMAT).to_string()),
        ]);
        table.add_row(vec![
            Cell::new("Due Date").add_attribute(Attribute::Bold),
            Cell::new(doc.due_date.format(DATE_FORMAT).to_string()),
        ]);
        table
    }

    fn parties(&self, doc: &Document, mode: DisplayMode) -> Table {
        let mut table = self.table();
        table.set_header(vec![Cell::new("From:"), Cell::new("To:")]);
        for field in PartyField::ALL {
            table.add_row(vec![
                self.text_cell(doc.from.get(field), party_hint(PartySide::From, field), mode),
                self.text_cell(doc.to.get(field), party_hint(PartySide::To, field), mode),
            ]);
        }
        table
    }

    fn items(&self, doc: &Document, mode: DisplayMode) -> Table {
        let mut table = self.table();
        let mut header = vec![
            Cell::new("Description"),
            Cell::new("Quantity"),
            Cell::new("Rate"),
            Cell::new("Amount"),
        ];
        if mode == DisplayMode::Edit {
            header.push(Cell::new("Action"));
        }
        table.set_header(header);

        for (idx, item) in doc.items().iter().enumerate() {
            table.add_row(self.item_row(idx, item, mode));
        }
        table
    }

    fn item_row(&self, idx: usize, item: &LineItem, mode: DisplayMode) -> Vec<Cell> {
        let mut row = vec![
            self.text_cell(&item.description, "Item description", mode),
            Cell::new(item.quantity().to_string()),
            Cell::new(item.rate().to_string()),
            Cell::new(money(item.amount())),
        ];
        if mode == DisplayMode::Edit {
            row.push(Cell::new(format!("#{}", idx + 1)));
        }
        row
    }

    fn totals(&self, doc: &Document) -> Table {
        let mut table = self.table();
        let tax_label = format!("Tax ({}%)", TAX_RATE * 100.0);
        table.add_row(vec![Cell::new("Subtotal:"), Cell::new(money(doc.subtotal()))]);
        table.add_row(vec![Cell::new(tax_label), Cell::new(money(doc.tax()))]);

        let total_cell = Cell::new(money(doc.total())).add_attribute(Attribute::Bold);
        let total_cell = if doc.total() > 0.0 {
            total_cell.fg(TOTAL_COLOR)
        } else {
            total_cell
        };
        table.add_row(vec![
            Cell::new("Total:").add_attribute(Attribute::Bold),
            total_cell,
        ]);
        table
    }
}
