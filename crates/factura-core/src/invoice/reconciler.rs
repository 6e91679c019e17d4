//! Reconciles service entities with free-text fallback into one record.

use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use crate::models::entity::{DocumentPayload, ExtractedEntity};
use crate::models::record::InvoiceRecord;

use super::fields::{entity_handler, property_handler, Field, Handler, MergePolicy};
use super::rules::{extract_fallback, parse_locale_decimal};

/// Separator between concept fragments.
pub const CONCEPT_SEPARATOR: &str = " | ";

/// Outcome of reconciling one document.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// The normalized record.
    pub record: InvoiceRecord,
    /// Fields that were filled from the raw text.
    pub fallback_fields: Vec<Field>,
    /// Entity kinds that no handler recognized, in first-seen order.
    pub ignored_kinds: Vec<String>,
}

/// Builds invoice records from extracted entities and raw document text.
///
/// Stateless; one instance can serve any number of documents and threads.
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Whether the free-text tier runs for missing fields.
    fallback: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self { fallback: true }
    }

    /// Enable or disable the free-text fallback tier.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    /// Reconcile a document into a record.
    pub fn reconcile(
        &self,
        entities: &[ExtractedEntity],
        raw_text: &str,
        filename: &str,
    ) -> InvoiceRecord {
        self.reconcile_with_report(entities, raw_text, filename).record
    }

    /// Reconcile a service `document` object.
    pub fn reconcile_document(&self, document: &DocumentPayload, filename: &str) -> Reconciliation {
        self.reconcile_with_report(&document.entities, &document.text, filename)
    }

    /// Reconcile and report where each gap was filled from.
    pub fn reconcile_with_report(
        &self,
        entities: &[ExtractedEntity],
        raw_text: &str,
        filename: &str,
    ) -> Reconciliation {
        let mut builder = RecordBuilder::new(filename);

        for entity in entities {
            match entity_handler(&entity.kind) {
                Some(Handler::Assign(field, policy)) => builder.merge(field, policy, &entity.text),
                Some(Handler::Composite) => {
                    for property in &entity.properties {
                        match property_handler(&entity.kind, &property.kind) {
                            Some((field, policy)) => builder.merge(field, policy, &property.text),
                            None => trace!("Ignoring property {}", property.kind),
                        }
                    }
                }
                None => builder.ignore(&entity.kind),
            }
        }

        let ignored_kinds = std::mem::take(&mut builder.ignored);
        let mut record = builder.finish();
        let fallback_fields = if self.fallback {
            apply_fallback(&mut record, raw_text)
        } else {
            Vec::new()
        };

        debug!(
            "Reconciled {} from {} entities ({} fields from text)",
            filename,
            entities.len(),
            fallback_fields.len()
        );

        Reconciliation {
            record,
            fallback_fields,
            ignored_kinds,
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconcile with the default settings.
pub fn reconcile(entities: &[ExtractedEntity], raw_text: &str, filename: &str) -> InvoiceRecord {
    Reconciler::new().reconcile(entities, raw_text, filename)
}

/// Amount collected from flat totals and from summed VAT lines.
///
/// When both are present the VAT lines win, since flat totals repeat them.
#[derive(Debug, Default)]
struct AmountSlot {
    flat: Option<Decimal>,
    summed: Option<Decimal>,
}

impl AmountSlot {
    fn overwrite(&mut self, value: Decimal) {
        self.flat = Some(value);
    }

    /// On overflow the running sum is kept.
    fn add(&mut self, value: Decimal) {
        let sum = self.summed.get_or_insert(Decimal::ZERO);
        match sum.checked_add(value) {
            Some(total) => *sum = total,
            None => warn!("Amount overflow adding {} to {}, keeping current sum", value, sum),
        }
    }

    fn resolve(&self) -> Option<Decimal> {
        self.summed.or(self.flat)
    }
}

struct RecordBuilder {
    record: InvoiceRecord,
    tax_base: AmountSlot,
    vat_amount: AmountSlot,
    fragments: Vec<String>,
    ignored: Vec<String>,
}

impl RecordBuilder {
    fn new(filename: &str) -> Self {
        Self {
            record: InvoiceRecord::new(filename),
            tax_base: AmountSlot::default(),
            vat_amount: AmountSlot::default(),
            fragments: Vec::new(),
            ignored: Vec::new(),
        }
    }

    fn merge(&mut self, field: Field, policy: MergePolicy, text: &str) {
        if field.is_amount() {
            let value = parse_locale_decimal(text);
            let slot = match field {
                Field::TaxBase => &mut self.tax_base,
                _ => &mut self.vat_amount,
            };
            match policy {
                MergePolicy::Overwrite => slot.overwrite(value),
                MergePolicy::Append | MergePolicy::Sum => slot.add(value),
            }
            return;
        }

        if field == Field::Concept {
            match policy {
                MergePolicy::Overwrite => self.fragments = vec![text.to_string()],
                MergePolicy::Append | MergePolicy::Sum => self.fragments.push(text.to_string()),
            }
            return;
        }

        let Some(slot) = self.text_slot(field) else {
            return;
        };
        match policy {
            MergePolicy::Overwrite => *slot = text.to_string(),
            MergePolicy::Append | MergePolicy::Sum => {
                if !text.is_empty() {
                    if !slot.is_empty() {
                        slot.push_str(CONCEPT_SEPARATOR);
                    }
                    slot.push_str(text);
                }
            }
        }
    }

    fn text_slot(&mut self, field: Field) -> Option<&mut String> {
        let record = &mut self.record;
        let slot = match field {
            Field::SupplierName => &mut record.supplier_name,
            Field::SupplierAddress => &mut record.supplier_address,
            Field::SupplierPhone => &mut record.supplier_phone,
            Field::SupplierTaxId => &mut record.supplier_tax_id,
            Field::CustomerName => &mut record.customer_name,
            Field::CustomerTaxId => &mut record.customer_tax_id,
            Field::InvoiceNumber => &mut record.invoice_number,
            Field::InvoiceDate => &mut record.invoice_date,
            Field::PurchaseOrder => &mut record.purchase_order,
            Field::TotalAmount => &mut record.total_amount,
            Field::TaxBase | Field::VatAmount | Field::Concept => return None,
        };
        Some(slot)
    }

    fn ignore(&mut self, kind: &str) {
        if !self.ignored.iter().any(|k| k == kind) {
            trace!("Ignoring entity kind {}", kind);
            self.ignored.push(kind.to_string());
        }
    }

    fn finish(self) -> InvoiceRecord {
        let mut record = self.record;
        record.tax_base = self.tax_base.resolve();
        record.vat_amount = self.vat_amount.resolve();
        record.concept = self
            .fragments
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(CONCEPT_SEPARATOR);
        record
    }
}

fn is_missing(amount: Option<Decimal>) -> bool {
    amount.is_none_or(|a| a.is_zero())
}

/// Fill still-missing amounts and concept from the raw text.
fn apply_fallback(record: &mut InvoiceRecord, raw_text: &str) -> Vec<Field> {
    let needs_tax_base = is_missing(record.tax_base);
    let needs_vat = is_missing(record.vat_amount);
    let needs_concept = record.concept.is_empty();

    let mut filled = Vec::new();
    if !(needs_tax_base || needs_vat || needs_concept) {
        return filled;
    }

    let found = extract_fallback(raw_text);

    if needs_tax_base && !found.tax_base.is_empty() {
        record.tax_base = Some(parse_locale_decimal(&found.tax_base));
        filled.push(Field::TaxBase);
    }
    if needs_vat && !found.vat.is_empty() {
        record.vat_amount = Some(parse_locale_decimal(&found.vat));
        filled.push(Field::VatAmount);
    }
    if needs_concept && !found.concept.is_empty() {
        record.concept = found.concept;
        filled.push(Field::Concept);
    }

    for field in &filled {
        debug!("{}: {} taken from document text", record.filename, field.name());
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn entity(kind: &str, text: &str) -> ExtractedEntity {
        ExtractedEntity::new(kind, text)
    }

    fn line_item(description: &str) -> ExtractedEntity {
        ExtractedEntity::composite("line_item", vec![entity("line_item/description", description)])
    }

    fn vat(amount: &str, tax_amount: &str) -> ExtractedEntity {
        ExtractedEntity::composite(
            "vat",
            vec![entity("vat/amount", amount), entity("vat/tax_amount", tax_amount)],
        )
    }

    #[test]
    fn test_end_to_end_with_fallback() {
        let entities = vec![
            entity("supplier_name", "ACME SL"),
            entity("invoice_id", "F-2024-001"),
            entity("total_amount", "121,00"),
        ];
        let text = "... CONCEPTO Servicios de consultoría BASE IMPONIBLE 100,00 IVA (21%) 21,00 ...";

        let result = Reconciler::new().reconcile_with_report(&entities, text, "f1.pdf");
        let record = &result.record;

        assert_eq!(record.filename, "f1.pdf");
        assert_eq!(record.supplier_name, "ACME SL");
        assert_eq!(record.invoice_number, "F-2024-001");
        assert_eq!(record.total_amount, "121,00");
        assert_eq!(record.tax_base_display(), "100,00");
        assert_eq!(record.vat_amount_display(), "21,00");
        assert_eq!(record.concept, "Servicios de consultoría");
        assert_eq!(
            result.fallback_fields,
            vec![Field::TaxBase, Field::VatAmount, Field::Concept]
        );
    }

    #[test]
    fn test_structured_value_beats_text() {
        let entities = vec![entity("net_amount", "100,00")];
        let text = "base imponible 200,00";

        let record = reconcile(&entities, text, "f.pdf");

        assert_eq!(record.tax_base_display(), "100,00");
    }

    #[test]
    fn test_fallback_fills_only_absent_vat() {
        let entities = vec![entity("net_amount", "200,00"), line_item("Obra")];
        let text = "Base imponible 999,00\nIVA (21%): 42,00";

        let result = Reconciler::new().reconcile_with_report(&entities, text, "f.pdf");

        assert_eq!(result.record.tax_base, Some(dec("200")));
        assert_eq!(result.record.vat_amount, Some(dec("42.00")));
        assert_eq!(result.record.concept, "Obra");
        assert_eq!(result.fallback_fields, vec![Field::VatAmount]);
    }

    #[test]
    fn test_line_items_keep_order_and_drop_empty() {
        let entities = vec![line_item("A"), line_item(""), line_item("B")];

        let record = reconcile(&entities, "", "f.pdf");

        assert_eq!(record.concept, "A | B");
    }

    #[test]
    fn test_any_description_property_counts() {
        let entities = vec![ExtractedEntity::composite(
            "line_item",
            vec![
                entity("line_item/quantity", "2"),
                entity("line_item/product_description", "Tornillos"),
                entity("line_item/description", "  Tuercas\n"),
            ],
        )];

        let record = reconcile(&entities, "", "f.pdf");

        assert_eq!(record.concept, "Tornillos | Tuercas");
    }

    #[test]
    fn test_multiple_vat_entities_sum() {
        let entities = vec![vat("10,00", "2,10"), vat("20,00", "0,80")];

        let record = reconcile(&entities, "", "f.pdf");

        assert_eq!(record.tax_base_display(), "30,00");
        assert_eq!(record.vat_amount_display(), "2,90");
    }

    #[test]
    fn test_vat_sum_overflow_keeps_running_sum() {
        let huge = "79.228.162.514.264.337.593.543.950.335";
        let entities = vec![vat(huge, "1,00"), vat(huge, "2,00")];

        let record = reconcile(&entities, "", "f.pdf");

        assert_eq!(record.tax_base, Some(Decimal::MAX));
        assert_eq!(record.vat_amount_display(), "3,00");
    }

    #[test]
    fn test_vat_lines_win_over_flat_totals() {
        let entities = vec![
            entity("net_amount", "30,00"),
            vat("10,00", "2,10"),
            vat("20,00", "4,20"),
            entity("total_tax_amount", "6,30"),
        ];

        let record = reconcile(&entities, "", "f.pdf");

        assert_eq!(record.tax_base, Some(dec("30.00")));
        assert_eq!(record.vat_amount, Some(dec("6.30")));
    }

    #[test]
    fn test_flat_amounts_are_normalized() {
        let entities = vec![
            entity("net_amount", "1.234,5 €"),
            entity("total_tax_amount", "259,25"),
        ];

        let record = reconcile(&entities, "", "f.pdf");

        assert_eq!(record.tax_base_display(), "1234,50");
        assert_eq!(record.vat_amount_display(), "259,25");
    }

    #[test]
    fn test_last_scalar_wins() {
        let entities = vec![
            entity("supplier_name", "Primero SL"),
            entity("net_amount", "10,00"),
            entity("supplier_name", "Segundo SL"),
            entity("net_amount", "15,00"),
        ];

        let record = reconcile(&entities, "", "f.pdf");

        assert_eq!(record.supplier_name, "Segundo SL");
        assert_eq!(record.tax_base, Some(dec("15.00")));
    }

    #[test]
    fn test_total_amount_kept_verbatim() {
        let entities = vec![entity("total_amount", "1.210,00 €")];

        let record = reconcile(&entities, "", "f.pdf");

        assert_eq!(record.total_amount, "1.210,00 €");
    }

    #[test]
    fn test_all_party_fields() {
        let entities = vec![
            entity("supplier_tax_id", "B12345678"),
            entity("supplier_address", "C/ Mayor 1, Madrid"),
            entity("supplier_phone", "910 000 000"),
            entity("customer_name", "Cliente SA"),
            entity("customer_tax_id", "A87654321"),
            entity("invoice_date", "15/01/2024"),
            entity("purchase_order", "PED-77"),
        ];

        let record = reconcile(&entities, "", "f.pdf");

        assert_eq!(record.supplier_tax_id, "B12345678");
        assert_eq!(record.supplier_address, "C/ Mayor 1, Madrid");
        assert_eq!(record.supplier_phone, "910 000 000");
        assert_eq!(record.customer_name, "Cliente SA");
        assert_eq!(record.customer_tax_id, "A87654321");
        assert_eq!(record.invoice_date, "15/01/2024");
        assert_eq!(record.purchase_order, "PED-77");
    }

    #[test]
    fn test_zero_amount_is_replaced_by_text() {
        let entities = vec![entity("net_amount", "n/d"), entity("total_tax_amount", "21,00")];
        let text = "Base imponible: 100,00";

        let record = reconcile(&entities, text, "f.pdf");

        assert_eq!(record.tax_base, Some(dec("100.00")));
        assert_eq!(record.vat_amount, Some(dec("21.00")));
    }

    #[test]
    fn test_zero_amount_kept_when_text_has_nothing() {
        let entities = vec![entity("net_amount", "n/d")];

        let record = reconcile(&entities, "sin importes", "f.pdf");

        assert_eq!(record.tax_base_display(), "0,00");
        assert_eq!(record.vat_amount_display(), "");
    }

    #[test]
    fn test_unknown_kinds_reported() {
        let entities = vec![
            entity("receiver_email", "a@b.es"),
            entity("supplier_name", "ACME SL"),
            entity("receiver_email", "c@d.es"),
            entity("due_date", "2024-02-01"),
        ];

        let result = Reconciler::new().reconcile_with_report(&entities, "", "f.pdf");

        assert_eq!(result.record.supplier_name, "ACME SL");
        assert_eq!(result.ignored_kinds, vec!["receiver_email", "due_date"]);
    }

    #[test]
    fn test_fallback_disabled() {
        let text = "CONCEPTO Obra BASE IMPONIBLE 100,00 IVA 21,00";

        let result = Reconciler::new()
            .with_fallback(false)
            .reconcile_with_report(&[], text, "f.pdf");

        assert_eq!(result.record, InvoiceRecord::new("f.pdf"));
        assert!(result.fallback_fields.is_empty());
    }

    #[test]
    fn test_reconcile_document_payload() {
        let payload = DocumentPayload::from_json(
            r#"{"document": {"text": "IVA 21,00", "entities": [
                {"type": "vat", "properties": [{"type": "vat/amount", "mentionText": "100,00"}]}
            ]}}"#,
        )
        .unwrap();

        let result = Reconciler::new().reconcile_document(&payload, "f.pdf");

        assert_eq!(result.record.tax_base_display(), "100,00");
        assert_eq!(result.record.vat_amount_display(), "21,00");
    }

    #[test]
    fn test_empty_input() {
        let record = reconcile(&[], "", "vacia.pdf");
        assert_eq!(record, InvoiceRecord::new("vacia.pdf"));
    }
}
