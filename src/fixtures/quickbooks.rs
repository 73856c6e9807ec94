use crate::fixtures::base::{round2, Address, BaseFactory, DEFAULT_SEED};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TAX_RATE: f64 = 0.08;
pub const CATALOG_SIZE: usize = 50;

const PAYMENT_TERMS: &[&str] = &["Net 15", "Net 30", "Net 45", "Due on Receipt"];
const ITEM_CATEGORIES: &[&str] = &["Services", "Products", "Software", "Consulting", "Support"];
const DUE_IN_DAYS: [i64; 4] = [15, 30, 45, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Viewed,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Viewed,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub billing_address: Address,
    pub shipping_address: Address,
    pub tax_id: String,
    pub currency: String,
    pub payment_terms: String,
    pub credit_limit: f64,
    pub balance: f64,
    pub is_active: bool,
    pub created_date: String,
    pub last_modified: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub unit_price: f64,
    pub cost: f64,
    pub taxable: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub line_total: f64,
    pub taxable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub doc_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub due_date: String,
    pub invoice_date: String,
    pub status: InvoiceStatus,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub balance: f64,
    pub line_items: Vec<LineItem>,
    pub memo: Option<String>,
    pub created_date: String,
    pub last_modified: String,
}

/// QuickBooks 客戶、品項與發票
pub struct QuickBooksFactory {
    base: BaseFactory,
    catalog: Vec<Item>,
}

impl QuickBooksFactory {
    pub fn new(seed: u64) -> Self {
        Self::from_base(BaseFactory::new(seed))
    }

    pub fn with_anchor(seed: u64, anchor: DateTime<Utc>) -> Self {
        Self::from_base(BaseFactory::with_anchor(seed, anchor))
    }

    fn from_base(mut base: BaseFactory) -> Self {
        let catalog = (0..CATALOG_SIZE).map(|_| Self::catalog_item(&mut base)).collect();
        Self { base, catalog }
    }

    pub fn catalog(&self) -> &[Item] {
        &self.catalog
    }

    fn catalog_item(base: &mut BaseFactory) -> Item {
        Item {
            id: base.id("ITEM", 6),
            name: base.catch_phrase(),
            description: base.text(200),
            category: base.pick(ITEM_CATEGORIES).to_string(),
            unit_price: base.money_in(10.0, 1000.0),
            cost: base.money_in(5.0, 500.0),
            taxable: base.chance(0.5),
            active: base.chance(0.5),
        }
    }

    pub fn generate_customers(&mut self, count: usize) -> Vec<Customer> {
        (0..count).map(|_| self.customer()).collect()
    }

    fn customer(&mut self) -> Customer {
        let base = &mut self.base;
        Customer {
            id: base.id("QB-CUST", 6),
            name: base.company_name(),
            email: base.email(),
            phone: base.phone(),
            website: base.url(),
            billing_address: base.address(),
            shipping_address: base.address(),
            tax_id: format!("{:09}", base.int_in(100_000_000, 999_999_999)),
            currency: "USD".to_string(),
            payment_terms: base.pick(PAYMENT_TERMS).to_string(),
            credit_limit: base.money_in(10_000.0, 100_000.0),
            balance: base.money_in(0.0, 50_000.0),
            is_active: base.chance(0.5),
            created_date: base.date_within_past(365),
            last_modified: base.date_within_past(30),
        }
    }

    /// 沒有給客戶 id 時產生 100 個隨機 id
    pub fn generate_invoices(&mut self, count: usize, customer_ids: &[String]) -> Vec<Invoice> {
        let customer_ids: Vec<String> = if customer_ids.is_empty() {
            (0..100).map(|_| self.base.id("QB-CUST", 6)).collect()
        } else {
            customer_ids.to_vec()
        };

        (0..count)
            .map(|i| self.invoice(i + 1, &customer_ids))
            .collect()
    }

    fn invoice(&mut self, number: usize, customer_ids: &[String]) -> Invoice {
        let customer_id = self
            .base
            .pick_owned(customer_ids)
            .unwrap_or_default();
        let id = self.base.id("INV", 6);
        let customer_name = self.base.company_name();
        let due_in = self.base.pick_owned(&DUE_IN_DAYS).unwrap_or(30);
        let due_date = self.base.date_ahead(due_in);
        let invoice_date = self.base.date_within_past(90);
        let status = self
            .base
            .pick_owned(&InvoiceStatus::ALL)
            .unwrap_or(InvoiceStatus::Draft);
        let line_items = self.line_items();
        let memo = if self.base.chance(0.3) {
            Some(self.base.sentence(8))
        } else {
            None
        };

        let subtotal = round2(line_items.iter().map(|l| l.line_total).sum());
        let tax_amount = round2(subtotal * TAX_RATE);
        let total_amount = round2(subtotal + tax_amount);
        let balance = match status {
            InvoiceStatus::Paid => 0.0,
            InvoiceStatus::Draft => total_amount,
            _ => round2(total_amount * self.base.money_in(0.0, 1.0)).min(total_amount),
        };

        Invoice {
            id,
            doc_number: format!("INV-{:06}", number),
            customer_id,
            customer_name,
            due_date,
            invoice_date,
            status,
            subtotal,
            tax_amount,
            total_amount,
            balance,
            line_items,
            memo,
            created_date: self.base.date_within_past(90),
            last_modified: self.base.date_within_past(7),
        }
    }

    fn line_items(&mut self) -> Vec<LineItem> {
        let count = self.base.int_in(1, 10);
        (0..count)
            .filter_map(|_| {
                let item = self.base.pick_owned(&self.catalog)?;
                let quantity = self.base.int_in(1, 20);
                Some(LineItem {
                    id: self.base.id("LINE", 6),
                    item_id: item.id,
                    item_name: item.name,
                    description: item.description,
                    quantity,
                    unit_price: item.unit_price,
                    line_total: round2(quantity as f64 * item.unit_price),
                    taxable: item.taxable,
                })
            })
            .collect()
    }
}

impl Default for QuickBooksFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_catalog_has_fifty_items() {
        let factory = QuickBooksFactory::with_anchor(42, anchor());
        assert_eq!(factory.catalog().len(), CATALOG_SIZE);
        for item in factory.catalog() {
            assert!(item.id.starts_with("ITEM-"));
            assert!((10.0..=1000.0).contains(&item.unit_price));
        }
    }

    #[test]
    fn test_customers_have_expected_shape() {
        let mut factory = QuickBooksFactory::with_anchor(42, anchor());
        let customers = factory.generate_customers(25);

        assert_eq!(customers.len(), 25);
        for customer in &customers {
            assert!(customer.id.starts_with("QB-CUST-"));
            assert_eq!(customer.id.len(), "QB-CUST-".len() + 6);
            assert_eq!(customer.currency, "USD");
            assert!(PAYMENT_TERMS.contains(&customer.payment_terms.as_str()));
            assert!(customer.email.contains('@'));
        }
    }

    #[test]
    fn test_invoice_totals_and_balances() {
        let mut factory = QuickBooksFactory::with_anchor(42, anchor());
        let customers = factory.generate_customers(10);
        let ids: Vec<String> = customers.iter().map(|c| c.id.clone()).collect();
        let invoices = factory.generate_invoices(200, &ids);

        assert_eq!(invoices.len(), 200);
        assert_eq!(invoices[0].doc_number, "INV-000001");
        assert_eq!(invoices[199].doc_number, "INV-000200");

        for invoice in &invoices {
            assert!(ids.contains(&invoice.customer_id));
            assert!((1..=10).contains(&invoice.line_items.len()));

            for line in &invoice.line_items {
                assert!((1..=20).contains(&line.quantity));
                let expected = round2(line.quantity as f64 * line.unit_price);
                assert!((line.line_total - expected).abs() < 1e-9);
            }

            let subtotal = round2(invoice.line_items.iter().map(|l| l.line_total).sum());
            assert!((invoice.subtotal - subtotal).abs() < 1e-9);
            assert!((invoice.tax_amount - round2(subtotal * TAX_RATE)).abs() < 1e-9);
            let total = round2(invoice.subtotal + invoice.tax_amount);
            assert!((invoice.total_amount - total).abs() < 1e-9);

            match invoice.status {
                InvoiceStatus::Paid => assert_eq!(invoice.balance, 0.0),
                InvoiceStatus::Draft => assert_eq!(invoice.balance, invoice.total_amount),
                _ => assert!(invoice.balance >= 0.0 && invoice.balance <= invoice.total_amount),
            }
        }
    }

    #[test]
    fn test_invoices_without_customers_use_generated_ids() {
        let mut factory = QuickBooksFactory::with_anchor(1, anchor());
        let invoices = factory.generate_invoices(5, &[]);
        assert!(invoices.iter().all(|i| i.customer_id.starts_with("QB-CUST-")));
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let mut a = QuickBooksFactory::with_anchor(99, anchor());
        let mut b = QuickBooksFactory::with_anchor(99, anchor());

        assert_eq!(a.generate_customers(5), b.generate_customers(5));
        assert_eq!(a.generate_invoices(5, &[]), b.generate_invoices(5, &[]));

        let mut c = QuickBooksFactory::with_anchor(100, anchor());
        assert_ne!(
            QuickBooksFactory::with_anchor(99, anchor()).generate_customers(5),
            c.generate_customers(5)
        );
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&InvoiceStatus::Overdue).unwrap(), "\"OVERDUE\"");
    }
}
