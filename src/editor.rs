use chrono::{Local, NaiveDate};

use crate::artifact::{Artifact, ArtifactError, ArtifactGenerator};
use crate::error::Result;
use crate::export::{self, FileSink};
use crate::model::{Document, ItemField, LineItem, Party, PartyField, PartySide};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    #[default]
    Edit,
    Preview,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Edit => DisplayMode::Preview,
            DisplayMode::Preview => DisplayMode::Edit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceEditor {
    document: Document,
    mode: DisplayMode,
    // None once the numeric id space is used up.
    next_id: Option<u64>,
    overflow_seq: u64,
}

impl Default for InvoiceEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceEditor {
    /// Blank invoice dated today, with the built-in sample sender.
    pub fn new() -> Self {
        Self::starting_on(Local::now().date_naive(), Party::sample_sender())
    }

    pub fn starting_on(today: NaiveDate, sender: Party) -> Self {
        Self::with_document(Document::new(today, sender))
    }

    pub fn with_document(document: Document) -> Self {
        // Numeric ids continue after the largest one already present.
        let next_id = document
            .items()
            .iter()
            .filter_map(|i| i.id.parse::<u64>().ok())
            .max()
            .map_or(Some(1), |n| n.checked_add(1));
        InvoiceEditor {
            document,
            mode: DisplayMode::Edit,
            next_id,
            overflow_seq: 1,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    // ==========================================
    // Header & parties
    // ==========================================

    pub fn set_party_field(&mut self, side: PartySide, field: PartyField, value: impl Into<String>) {
        tracing::trace!(?side, ?field, "party field updated");
        self.document.party_mut(side).set(field, value.into());
    }

    pub fn set_invoice_number(&mut self, value: impl Into<String>) {
        self.document.invoice_number = value.into();
    }

    pub fn set_issue_date(&mut self, date: NaiveDate) {
        self.document.date = date;
    }

    pub fn set_due_date(&mut self, date: NaiveDate) {
        self.document.due_date = date;
    }

    pub fn set_notes(&mut self, value: impl Into<String>) {
        self.document.notes = value.into();
    }

    // ==========================================
    // Items
    // ==========================================

    /// Appends a blank item and returns its id.
    pub fn add_item(&mut self) -> String {
        let id = self.fresh_id();
        let mut items = self.document.items().to_vec();
        items.push(LineItem::new(id.clone()));
        self.document.set_items(items);
        tracing::debug!(%id, count = self.document.items().len(), "item added");
        id
    }

    /// Removes the item with `id`. Unknown ids leave the document untouched.
    pub fn remove_item(&mut self, id: &str) {
        if self.document.item(id).is_none() {
            tracing::debug!(%id, "remove ignored, no such item");
            return;
        }
        let items = self
            .document
            .items()
            .iter()
            .filter(|i| i.id != id)
            .cloned()
            .collect();
        self.document.set_items(items);
        tracing::debug!(%id, count = self.document.items().len(), "item removed");
    }

    /// Applies raw input to one item field. Non-numeric quantity or rate becomes 0.
    pub fn update_item(&mut self, id: &str, field: ItemField, value: &str) {
        if self.document.item(id).is_none() {
            tracing::debug!(%id, ?field, "update ignored, no such item");
            return;
        }
        let mut items = self.document.items().to_vec();
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            item.apply(field, value);
            tracing::trace!(%id, ?field, amount = item.amount(), "item updated");
        }
        self.document.set_items(items);
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let candidate = match self.next_id {
                Some(n) => {
                    self.next_id = n.checked_add(1);
                    n.to_string()
                }
                None => {
                    let seq = self.overflow_seq;
                    self.overflow_seq = seq.wrapping_add(1);
                    format!("{}-{}", u64::MAX, seq)
                }
            };
            if self.document.item(&candidate).is_none() {
                return candidate;
            }
        }
    }

    // ==========================================
    // Mode, export, artifacts
    // ==========================================

    pub fn set_mode(&mut self, mode: DisplayMode) {
        tracing::debug!(?mode, "display mode set");
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> DisplayMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    /// Serializes the document (not the mode) and hands it to `sink`.
    pub fn export_document(&self, sink: &mut dyn FileSink) -> Result<()> {
        let json = export::to_json(&self.document)?;
        let filename = export::export_filename(&self.document.invoice_number);
        tracing::info!(%filename, "exporting invoice");
        sink.save(json.as_bytes(), &filename);
        Ok(())
    }

    pub fn generate_artifact(&self, generator: &dyn ArtifactGenerator) -> std::result::Result<Artifact, ArtifactError> {
        generator.generate(&self.document, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::artifact::PdfPlaceholder;

    fn editor() -> InvoiceEditor {
        InvoiceEditor::starting_on(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), Party::sample_sender())
    }

    #[derive(Default)]
    struct MemorySink {
        saved: Vec<(String, Vec<u8>)>,
    }

    impl FileSink for MemorySink {
        fn save(&mut self, bytes: &[u8], filename: &str) {
            self.saved.push((filename.to_string(), bytes.to_vec()));
        }
    }

    fn assert_consistent(doc: &Document) {
        let mut sum = 0.0;
        for item in doc.items() {
            assert_eq!(item.amount(), f64::from(item.quantity()) * item.rate());
            sum += item.amount();
        }
        assert_eq!(doc.subtotal(), sum);
        assert_eq!(doc.tax(), doc.subtotal() * crate::model::TAX_RATE);
        assert_eq!(doc.total(), doc.subtotal() + doc.tax());
    }

    #[test]
    fn walkthrough_keeps_totals_current() {
        let mut ed = editor();
        let first = ed.document().items()[0].id.clone();

        ed.update_item(&first, ItemField::Rate, "100");
        assert_eq!(ed.document().items()[0].amount(), 100.0);
        assert_eq!(ed.document().subtotal(), 100.0);
        assert_eq!(ed.document().tax(), 10.0);
        assert_eq!(ed.document().total(), 110.0);

        let second = ed.add_item();
        assert_eq!(ed.document().item(&second).unwrap().amount(), 0.0);
        assert_eq!(ed.document().subtotal(), 100.0);
        assert_eq!(ed.document().total(), 110.0);

        ed.update_item(&second, ItemField::Quantity, "2");
        ed.update_item(&second, ItemField::Rate, "50");
        assert_eq!(ed.document().item(&second).unwrap().amount(), 100.0);
        assert_eq!(ed.document().subtotal(), 200.0);
        assert_eq!(ed.document().tax(), 20.0);
        assert_eq!(ed.document().total(), 220.0);

        ed.remove_item(&first);
        assert_eq!(ed.document().items().len(), 1);
        assert_eq!(ed.document().subtotal(), 100.0);
        assert_eq!(ed.document().tax(), 10.0);
        assert_eq!(ed.document().total(), 110.0);
    }

    #[test]
    fn add_item_appends_without_touching_existing() {
        let mut ed = editor();
        let first = ed.document().items()[0].id.clone();
        ed.update_item(&first, ItemField::Description, "Hosting");
        let before = ed.document().items().to_vec();

        let id = ed.add_item();

        let items = ed.document().items();
        assert_eq!(&items[..before.len()], &before[..]);
        let last = items.last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.description, "");
        assert_eq!(last.quantity(), 1);
        assert_eq!(last.rate(), 0.0);
        assert_eq!(last.amount(), 0.0);
        assert!(before.iter().all(|i| i.id != id));
    }

    #[test]
    fn fresh_ids_skip_ids_already_present() {
        let mut doc = Document::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), Party::default());
        doc.set_items(vec![LineItem::new("7"), LineItem::new("8"), LineItem::new("x")]);
        let mut ed = InvoiceEditor::with_document(doc);

        assert_eq!(ed.add_item(), "9");
        ed.remove_item("9");
        assert_eq!(ed.add_item(), "10");
    }

    #[test]
    fn ids_continue_past_the_largest_numeric_id() {
        let mut doc = Document::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), Party::default());
        let max = u64::MAX.to_string();
        doc.set_items(vec![LineItem::new(max.clone()), LineItem::new(format!("{max}-1"))]);
        let mut ed = InvoiceEditor::with_document(doc);

        let a = ed.add_item();
        let b = ed.add_item();

        assert_eq!(a, format!("{max}-2"));
        assert_eq!(b, format!("{max}-3"));
        assert_eq!(ed.document().items().len(), 4);
    }

    #[test]
    fn last_numeric_id_is_still_handed_out() {
        let mut doc = Document::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), Party::default());
        doc.set_items(vec![LineItem::new((u64::MAX - 1).to_string())]);
        let mut ed = InvoiceEditor::with_document(doc);

        assert_eq!(ed.add_item(), u64::MAX.to_string());
        assert_eq!(ed.add_item(), format!("{}-1", u64::MAX));
    }

    #[test]
    fn remove_unknown_id_changes_nothing() {
        let mut ed = editor();
        ed.update_item("1", ItemField::Rate, "42");
        let before = ed.document().clone();

        ed.remove_item("no-such-id");

        assert_eq!(ed.document(), &before);
        assert_eq!(export::to_json(ed.document()).unwrap(), export::to_json(&before).unwrap());
    }

    #[test]
    fn list_may_become_empty() {
        let mut ed = editor();
        ed.update_item("1", ItemField::Rate, "10");
        ed.remove_item("1");
        assert!(ed.document().items().is_empty());
        assert_eq!(ed.document().total(), 0.0);
    }

    #[test]
    fn non_numeric_quantity_becomes_zero() {
        let mut ed = editor();
        ed.update_item("1", ItemField::Rate, "25");
        ed.update_item("1", ItemField::Quantity, "abc");

        let item = &ed.document().items()[0];
        assert_eq!(item.quantity(), 0);
        assert_eq!(item.amount(), 0.0);
        assert_eq!(ed.document().total(), 0.0);
    }

    #[test]
    fn update_unknown_id_is_ignored() {
        let mut ed = editor();
        let before = ed.document().clone();
        ed.update_item("missing", ItemField::Rate, "10");
        assert_eq!(ed.document(), &before);
    }

    #[test]
    fn party_fields_are_independent() {
        let mut ed = editor();
        ed.set_party_field(PartySide::To, PartyField::Email, "billing@acme.test");
        ed.set_party_field(PartySide::From, PartyField::Name, "");

        assert_eq!(ed.document().to.email, "billing@acme.test");
        assert_eq!(ed.document().to.name, "");
        assert_eq!(ed.document().from.name, "");
        assert_eq!(ed.document().from.phone, "+1 (555) 123-4567");
    }

    #[test]
    fn header_setters() {
        let mut ed = editor();
        let due = NaiveDate::from_ymd_opt(2027, 1, 31).unwrap();
        ed.set_invoice_number("INV-042");
        ed.set_due_date(due);
        ed.set_notes("Net 30");

        assert_eq!(ed.document().invoice_number, "INV-042");
        assert_eq!(ed.document().due_date, due);
        assert_eq!(ed.document().notes, "Net 30");
    }

    #[test]
    fn toggling_mode_leaves_document_alone() {
        let mut ed = editor();
        ed.update_item("1", ItemField::Rate, "12");
        let before = ed.document().clone();

        assert_eq!(ed.toggle_mode(), DisplayMode::Preview);
        assert_eq!(ed.document(), &before);
        assert_eq!(ed.toggle_mode(), DisplayMode::Edit);
        assert_eq!(ed.document(), &before);

        ed.set_mode(DisplayMode::Preview);
        ed.set_mode(DisplayMode::Preview);
        assert_eq!(ed.mode(), DisplayMode::Preview);
        assert_eq!(ed.document(), &before);
    }

    #[test]
    fn export_hands_json_to_sink() {
        let mut ed = editor();
        ed.set_mode(DisplayMode::Preview);
        ed.update_item("1", ItemField::Rate, "99.5");
        let mut sink = MemorySink::default();

        ed.export_document(&mut sink).unwrap();

        assert_eq!(sink.saved.len(), 1);
        let (name, bytes) = &sink.saved[0];
        assert_eq!(name, "invoice-INV-001.json");
        let text = std::str::from_utf8(bytes).unwrap();
        assert!(!text.contains("Preview"));
        assert_eq!(&export::from_json(text).unwrap(), ed.document());
    }

    #[test]
    fn pdf_request_reports_not_implemented() {
        let ed = editor();
        let before = ed.document().clone();
        assert!(matches!(
            ed.generate_artifact(&PdfPlaceholder),
            Err(ArtifactError::NotImplemented { .. })
        ));
        assert_eq!(ed.document(), &before);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Remove(usize),
        Update(usize, ItemField, String),
        Toggle,
    }

    fn op() -> impl Strategy<Value = Op> {
        let field = prop_oneof![
            Just(ItemField::Description),
            Just(ItemField::Quantity),
            Just(ItemField::Rate),
        ];
        prop_oneof![
            Just(Op::Add),
            (0usize..8).prop_map(Op::Remove),
            (0usize..8, field, "[0-9]{0,4}(\\.[0-9]{1,2})?|[a-z]{1,3}|-[0-9]{1,2}")
                .prop_map(|(i, f, v)| Op::Update(i, f, v)),
            Just(Op::Toggle),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after every operation the amounts and totals match the items.
        #[test]
        fn totals_always_match_items(ops in prop::collection::vec(op(), 1..40)) {
            let mut ed = editor();
            for op in ops {
                // Indexes past the end address an id that does not exist.
                let id_at = |ed: &InvoiceEditor, i: usize| {
                    ed.document().items().get(i).map_or_else(|| format!("gone-{i}"), |it| it.id.clone())
                };
                match op {
                    Op::Add => {
                        let count = ed.document().items().len();
                        let id = ed.add_item();
                        prop_assert_eq!(ed.document().items().len(), count + 1);
                        prop_assert_eq!(&ed.document().items()[count].id, &id);
                    }
                    Op::Remove(i) => {
                        let id = id_at(&ed, i);
                        ed.remove_item(&id);
                        prop_assert!(ed.document().item(&id).is_none());
                    }
                    Op::Update(i, field, value) => {
                        let id = id_at(&ed, i);
                        ed.update_item(&id, field, &value);
                    }
                    Op::Toggle => {
                        let before = ed.document().clone();
                        ed.toggle_mode();
                        prop_assert_eq!(ed.document(), &before);
                    }
                }
                assert_consistent(ed.document());

                let mut ids: Vec<_> = ed.document().items().iter().map(|i| i.id.clone()).collect();
                ids.sort();
                ids.dedup();
                prop_assert_eq!(ids.len(), ed.document().items().len());
            }
        }
    }
}
