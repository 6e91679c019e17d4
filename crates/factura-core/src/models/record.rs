//! Normalized invoice record and its spreadsheet row layout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::rules::{format_locale_amount, parse_locale_decimal};

/// One normalized invoice, built by the reconciler from a single document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Source document name, unique within a batch.
    pub filename: String,

    pub supplier_name: String,
    pub supplier_tax_id: String,
    pub supplier_address: String,
    pub supplier_phone: String,
    pub customer_name: String,
    pub customer_tax_id: String,

    pub invoice_number: String,
    pub invoice_date: String,
    pub purchase_order: String,

    /// Tax base (base imponible).
    #[serde(default, with = "locale_amount", skip_serializing_if = "Option::is_none")]
    pub tax_base: Option<Decimal>,

    /// VAT amount (IVA).
    #[serde(default, with = "locale_amount", skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<Decimal>,

    /// Total exactly as extracted; not normalized.
    pub total_amount: String,

    /// Line-item descriptions joined with ` | `.
    pub concept: String,
}

impl InvoiceRecord {
    /// Empty record for the given source document.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    /// Tax base in display form (`1234,50`), empty when unknown.
    pub fn tax_base_display(&self) -> String {
        self.tax_base.map(format_locale_amount).unwrap_or_default()
    }

    /// VAT amount in display form (`259,25`), empty when unknown.
    pub fn vat_amount_display(&self) -> String {
        self.vat_amount.map(format_locale_amount).unwrap_or_default()
    }

    /// Cell value for a spreadsheet column.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::File => self.filename.clone(),
            Column::SupplierTaxId => self.supplier_tax_id.clone(),
            Column::Supplier => self.supplier_name.clone(),
            Column::Address => self.supplier_address.clone(),
            Column::Phone => self.supplier_phone.clone(),
            Column::Customer => self.customer_name.clone(),
            Column::CustomerTaxId => self.customer_tax_id.clone(),
            Column::InvoiceNumber => self.invoice_number.clone(),
            Column::IssueDate => self.invoice_date.clone(),
            Column::PurchaseOrder => self.purchase_order.clone(),
            Column::TaxBase => self.tax_base_display(),
            Column::Vat => self.vat_amount_display(),
            Column::Total => self.total_amount.clone(),
            Column::Concept => self.concept.clone(),
        }
    }

    /// Row values in the given column order.
    pub fn to_row(&self, columns: &[Column]) -> Vec<String> {
        columns.iter().map(|c| self.cell(*c)).collect()
    }
}

/// Output spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    File,
    SupplierTaxId,
    Supplier,
    Address,
    Phone,
    Customer,
    CustomerTaxId,
    InvoiceNumber,
    IssueDate,
    PurchaseOrder,
    TaxBase,
    Vat,
    Total,
    Concept,
}

impl Column {
    /// Header text written to the spreadsheet.
    pub fn header(&self) -> &'static str {
        match self {
            Column::File => "Archivo",
            Column::SupplierTaxId => "CIF Proveedor",
            Column::Supplier => "Proveedor",
            Column::Address => "Dirección",
            Column::Phone => "Teléfono",
            Column::Customer => "Cliente",
            Column::CustomerTaxId => "CIF Cliente",
            Column::InvoiceNumber => "Nº Factura",
            Column::IssueDate => "Fecha Emisión",
            Column::PurchaseOrder => "Nº Pedido",
            Column::TaxBase => "Base Imponible",
            Column::Vat => "IVA",
            Column::Total => "Importe Total",
            Column::Concept => "Concepto",
        }
    }

    /// Column order of the output sheet. Customer columns go after the
    /// supplier block when enabled.
    pub fn layout(include_customer: bool) -> Vec<Column> {
        let mut columns = vec![
            Column::File,
            Column::SupplierTaxId,
            Column::Supplier,
            Column::Address,
            Column::Phone,
        ];
        if include_customer {
            columns.extend([Column::Customer, Column::CustomerTaxId]);
        }
        columns.extend([
            Column::InvoiceNumber,
            Column::IssueDate,
            Column::PurchaseOrder,
            Column::TaxBase,
            Column::Vat,
            Column::Total,
            Column::Concept,
        ]);
        columns
    }

    /// Header row for a layout.
    pub fn headers(columns: &[Column]) -> Vec<&'static str> {
        columns.iter().map(Column::header).collect()
    }
}

/// Amounts travel as comma-decimal text (`1234,50`), like the spreadsheet cells.
mod locale_amount {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_locale_amount, parse_locale_decimal};

    pub fn serialize<S: Serializer>(amount: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
        match amount {
            Some(value) => serializer.serialize_str(&format_locale_amount(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        Ok(text.map(|t| parse_locale_decimal(&t)))
    }
}
