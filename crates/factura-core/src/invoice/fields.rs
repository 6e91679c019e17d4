//! Entity kind dispatch table.
//!
//! Every known entity kind maps to the record field it fills and how repeated
//! values merge. Kinds missing from the tables are ignored.

/// Record field targeted by an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SupplierName,
    SupplierAddress,
    SupplierPhone,
    SupplierTaxId,
    CustomerName,
    CustomerTaxId,
    InvoiceNumber,
    InvoiceDate,
    PurchaseOrder,
    TotalAmount,
    TaxBase,
    VatAmount,
    Concept,
}

impl Field {
    /// Fields holding a normalized amount.
    pub fn is_amount(&self) -> bool {
        matches!(self, Field::TaxBase | Field::VatAmount)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::SupplierName => "supplier_name",
            Field::SupplierAddress => "supplier_address",
            Field::SupplierPhone => "supplier_phone",
            Field::SupplierTaxId => "supplier_tax_id",
            Field::CustomerName => "customer_name",
            Field::CustomerTaxId => "customer_tax_id",
            Field::InvoiceNumber => "invoice_number",
            Field::InvoiceDate => "invoice_date",
            Field::PurchaseOrder => "purchase_order",
            Field::TotalAmount => "total_amount",
            Field::TaxBase => "tax_base",
            Field::VatAmount => "vat_amount",
            Field::Concept => "concept",
        }
    }
}

/// How a value merges with what the field already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Last value wins.
    Overwrite,
    /// Values accumulate in entity order.
    Append,
    /// Amounts add up.
    Sum,
}

/// What to do with an entity of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Merge the entity text into a field.
    Assign(Field, MergePolicy),
    /// Walk the nested properties instead of the entity text.
    Composite,
}

/// Top-level entity kinds.
const ENTITY_HANDLERS: &[(&str, Handler)] = &[
    ("supplier_name", Handler::Assign(Field::SupplierName, MergePolicy::Overwrite)),
    ("supplier_address", Handler::Assign(Field::SupplierAddress, MergePolicy::Overwrite)),
    ("supplier_phone", Handler::Assign(Field::SupplierPhone, MergePolicy::Overwrite)),
    ("supplier_tax_id", Handler::Assign(Field::SupplierTaxId, MergePolicy::Overwrite)),
    ("customer_name", Handler::Assign(Field::CustomerName, MergePolicy::Overwrite)),
    ("customer_tax_id", Handler::Assign(Field::CustomerTaxId, MergePolicy::Overwrite)),
    ("invoice_id", Handler::Assign(Field::InvoiceNumber, MergePolicy::Overwrite)),
    ("invoice_date", Handler::Assign(Field::InvoiceDate, MergePolicy::Overwrite)),
    ("purchase_order", Handler::Assign(Field::PurchaseOrder, MergePolicy::Overwrite)),
    ("total_amount", Handler::Assign(Field::TotalAmount, MergePolicy::Overwrite)),
    ("net_amount", Handler::Assign(Field::TaxBase, MergePolicy::Overwrite)),
    ("total_tax_amount", Handler::Assign(Field::VatAmount, MergePolicy::Overwrite)),
    ("vat", Handler::Composite),
    ("line_item", Handler::Composite),
];

/// Nested property kinds with an exact name.
const PROPERTY_HANDLERS: &[(&str, Field, MergePolicy)] = &[
    ("vat/amount", Field::TaxBase, MergePolicy::Sum),
    ("vat/tax_amount", Field::VatAmount, MergePolicy::Sum),
    ("line_item/description", Field::Concept, MergePolicy::Append),
];

/// Handler for a top-level entity kind.
pub fn entity_handler(kind: &str) -> Option<Handler> {
    ENTITY_HANDLERS
        .iter()
        .find(|(tag, _)| *tag == kind)
        .map(|(_, handler)| *handler)
}

/// Field and policy for a property nested under `parent`.
///
/// Under `line_item`, any property whose kind ends in `description` counts
/// as a concept fragment.
pub fn property_handler(parent: &str, kind: &str) -> Option<(Field, MergePolicy)> {
    if let Some((_, field, policy)) = PROPERTY_HANDLERS.iter().find(|(tag, _, _)| *tag == kind) {
        return Some((*field, *policy));
    }

    if parent == "line_item" && kind.ends_with("description") {
        return Some((Field::Concept, MergePolicy::Append));
    }

    None
}
