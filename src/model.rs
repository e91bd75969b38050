use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fixed sales tax applied to every invoice.
pub const TAX_RATE: f64 = 0.10;

pub const DEFAULT_INVOICE_NUMBER: &str = "INV-001";
pub const DEFAULT_NOTES: &str = "Thank you for your business!";
pub const PAYMENT_TERM_DAYS: u64 = 30;

/// Rates above this are clamped so `u32::MAX * rate` stays finite.
pub const MAX_RATE: f64 = 1e290;

static QUANTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?)([0-9]+)").expect("quantity pattern is valid"));
static RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?").expect("rate pattern is valid")
});

// ==========================================
// Parties
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartySide {
    From,
    To,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyField {
    Name,
    Address,
    City,
    Email,
    Phone,
}

impl PartyField {
    pub const ALL: [PartyField; 5] = [
        PartyField::Name,
        PartyField::Address,
        PartyField::City,
        PartyField::Email,
        PartyField::Phone,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PartyField::Name => "Name",
            PartyField::Address => "Address",
            PartyField::City => "City, State ZIP",
            PartyField::Email => "Email",
            PartyField::Phone => "Phone",
        }
    }
}

impl fmt::Display for PartyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Contact block printed for the sender and the recipient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    pub name: String,
    pub address: String,
    pub city: String, // city, region and postal code on one line
    pub email: String,
    pub phone: String,
}

impl Party {
    pub fn sample_sender() -> Self {
        Party {
            name: "Your Company Name".to_string(),
            address: "123 Business Street".to_string(),
            city: "Business City, BC 12345".to_string(),
            email: "hello@yourcompany.com".to_string(),
            phone: "+1 (555) 123-4567".to_string(),
        }
    }

    pub fn get(&self, field: PartyField) -> &str {
        match field {
            PartyField::Name => &self.name,
            PartyField::Address => &self.address,
            PartyField::City => &self.city,
            PartyField::Email => &self.email,
            PartyField::Phone => &self.phone,
        }
    }

    pub fn set(&mut self, field: PartyField, value: String) {
        let slot = match field {
            PartyField::Name => &mut self.name,
            PartyField::Address => &mut self.address,
            PartyField::City => &mut self.city,
            PartyField::Email => &mut self.email,
            PartyField::Phone => &mut self.phone,
        };
        *slot = value;
    }
}

// ==========================================
// Line items
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Description,
    Quantity,
    Rate,
}

impl ItemField {
    pub const ALL: [ItemField; 3] = [ItemField::Description, ItemField::Quantity, ItemField::Rate];

    pub fn label(self) -> &'static str {
        match self {
            ItemField::Description => "Description",
            ItemField::Quantity => "Quantity",
            ItemField::Rate => "Rate",
        }
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One billable row. `amount` is kept equal to `quantity * rate` by the setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    #[serde(default)]
    pub description: String,
    quantity: u32,
    rate: f64,
    #[serde(default)]
    amount: f64,
}

impl LineItem {
    pub fn new(id: impl Into<String>) -> Self {
        LineItem {
            id: id.into(),
            description: String::new(),
            quantity: 1,
            rate: 0.0,
            amount: 0.0,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.reprice();
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.rate = clamp_rate(rate);
        self.reprice();
    }

    /// Applies raw user input to one field, coercing numbers the lenient way.
    pub fn apply(&mut self, field: ItemField, value: &str) {
        match field {
            ItemField::Description => self.description = value.to_string(),
            ItemField::Quantity => self.set_quantity(coerce_quantity(value)),
            ItemField::Rate => self.set_rate(coerce_rate(value)),
        }
    }

    fn reprice(&mut self) {
        self.amount = f64::from(self.quantity) * self.rate;
    }
}

/// Reads the leading integer of `input`; anything unreadable or negative is 0.
pub fn coerce_quantity(input: &str) -> u32 {
    let Some(caps) = QUANTITY_RE.captures(input) else {
        return 0;
    };
    if &caps[1] == "-" {
        return 0;
    }
    // Only digits remain, so a parse failure means overflow.
    caps[2].parse::<u32>().unwrap_or(u32::MAX)
}

/// Reads the leading decimal of `input`; anything unreadable, negative or infinite is 0.
pub fn coerce_rate(input: &str) -> f64 {
    RATE_RE
        .find(input)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .map_or(0.0, clamp_rate)
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate > 0.0 { rate.min(MAX_RATE) } else { 0.0 }
}

// ==========================================
// Totals
// ==========================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl Totals {
    pub fn of(items: &[LineItem]) -> Self {
        // Sums saturate at f64::MAX so an export never holds a non-finite number.
        let subtotal = items.iter().fold(0.0, |sum, i| (sum + i.amount).min(f64::MAX));
        let tax = subtotal * TAX_RATE;
        Totals {
            subtotal,
            tax,
            total: (subtotal + tax).min(f64::MAX),
        }
    }
}

// ==========================================
// Document
// ==========================================

/// The whole invoice. Items and totals are only replaced together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub invoice_number: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub from: Party,
    #[serde(default)]
    pub to: Party,
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    subtotal: f64,
    #[serde(default)]
    tax: f64,
    #[serde(default)]
    total: f64,
}

impl Document {
    pub fn new(today: NaiveDate, sender: Party) -> Self {
        let due_date = today
            .checked_add_days(Days::new(PAYMENT_TERM_DAYS))
            .unwrap_or(today);
        let mut doc = Document {
            invoice_number: DEFAULT_INVOICE_NUMBER.to_string(),
            date: today,
            due_date,
            from: sender,
            to: Party::default(),
            items: Vec::new(),
            notes: DEFAULT_NOTES.to_string(),
            subtotal: 0.0,
            tax: 0.0,
            total: 0.0,
        };
        doc.set_items(vec![LineItem::new("1")]);
        doc
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    pub fn tax(&self) -> f64 {
        self.tax
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
        }
    }

    pub fn party(&self, side: PartySide) -> &Party {
        match side {
            PartySide::From => &self.from,
            PartySide::To => &self.to,
        }
    }

    pub fn party_mut(&mut self, side: PartySide) -> &mut Party {
        match side {
            PartySide::From => &mut self.from,
            PartySide::To => &mut self.to,
        }
    }

    /// Swaps in a new item list and the totals derived from it.
    pub fn set_items(&mut self, items: Vec<LineItem>) {
        let totals = Totals::of(&items);
        self.items = items;
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.total = totals.total;
    }

    /// Recomputes every derived value and renames repeated item ids.
    /// Used after loading a file from disk.
    pub fn normalize(&mut self) {
        let mut items = std::mem::take(&mut self.items);
        let mut taken: HashSet<String> = items.iter().map(|i| i.id.clone()).collect();
        let mut seen = HashSet::new();
        for item in &mut items {
            item.rate = clamp_rate(item.rate);
            item.reprice();
            if !seen.insert(item.id.clone()) {
                let mut suffix = 2u64;
                let renamed = loop {
                    let candidate = format!("{}-{}", item.id, suffix);
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                    suffix += 1;
                };
                tracing::debug!(from = %item.id, to = %renamed, "duplicate item id renamed");
                taken.insert(renamed.clone());
                seen.insert(renamed.clone());
                item.id = renamed;
            }
        }
        self.set_items(items);
    }
}
