pub mod base;
pub mod quickbooks;
pub mod salesforce;

use crate::core::Storage;
use crate::utils::error::{OrchestratorError, Result};
use quickbooks::{Customer, Invoice, QuickBooksFactory};
use salesforce::{Account, Contact, Opportunity, SalesforceFactory};
use serde::Serialize;

/// 每種測試資料要產生的筆數
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    pub customers: usize,
    pub invoices: usize,
    pub accounts: usize,
    pub contacts: usize,
    pub opportunities: usize,
}

impl Default for SeedCounts {
    fn default() -> Self {
        Self {
            customers: 100,
            invoices: 200,
            accounts: 50,
            contacts: 200,
            opportunities: 150,
        }
    }
}

impl SeedCounts {
    /// 讀取 CUSTOMER_COUNT 等環境變數，未設定的沿用預設值
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str, default: usize| -> Result<usize> {
            match lookup(key) {
                Some(value) => value.trim().parse().map_err(|_| {
                    OrchestratorError::InvalidConfigValueError {
                        field: key.to_string(),
                        value,
                        reason: "Expected a non-negative integer".to_string(),
                    }
                }),
                None => Ok(default),
            }
        };

        Ok(Self {
            customers: read("CUSTOMER_COUNT", defaults.customers)?,
            invoices: read("INVOICE_COUNT", defaults.invoices)?,
            accounts: read("ACCOUNT_COUNT", defaults.accounts)?,
            contacts: read("CONTACT_COUNT", defaults.contacts)?,
            opportunities: read("OPPORTUNITY_COUNT", defaults.opportunities)?,
        })
    }
}

/// 一組彼此關聯的測試資料：發票指向客戶，聯絡人與商機指向帳戶
#[derive(Debug, Clone, Serialize)]
pub struct SeedData {
    pub customers: Vec<Customer>,
    pub invoices: Vec<Invoice>,
    pub accounts: Vec<Account>,
    pub contacts: Vec<Contact>,
    pub opportunities: Vec<Opportunity>,
}

impl SeedData {
    pub fn generate(seed: u64, counts: SeedCounts) -> Self {
        Self::from_factories(
            QuickBooksFactory::new(seed),
            SalesforceFactory::new(seed),
            counts,
        )
    }

    pub fn from_factories(
        mut quickbooks: QuickBooksFactory,
        mut salesforce: SalesforceFactory,
        counts: SeedCounts,
    ) -> Self {
        let customers = quickbooks.generate_customers(counts.customers);
        let customer_ids: Vec<String> = customers.iter().map(|c| c.id.clone()).collect();
        let invoices = quickbooks.generate_invoices(counts.invoices, &customer_ids);

        let accounts = salesforce.generate_accounts(counts.accounts);
        let account_ids: Vec<String> = accounts.iter().map(|a| a.id.clone()).collect();
        let contacts = salesforce.generate_contacts(counts.contacts, &account_ids);
        let opportunities = salesforce.generate_opportunities(counts.opportunities, &account_ids);

        Self {
            customers,
            invoices,
            accounts,
            contacts,
            opportunities,
        }
    }

    /// 每種資料寫成一個 JSON 檔，回傳寫入的檔名
    pub async fn write_to<S: Storage>(&self, storage: &S) -> Result<Vec<String>> {
        let files = [
            ("customers.json", serde_json::to_vec_pretty(&self.customers)?),
            ("invoices.json", serde_json::to_vec_pretty(&self.invoices)?),
            ("accounts.json", serde_json::to_vec_pretty(&self.accounts)?),
            ("contacts.json", serde_json::to_vec_pretty(&self.contacts)?),
            ("opportunities.json", serde_json::to_vec_pretty(&self.opportunities)?),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (name, data) in files {
            storage.write_file(name, &data).await?;
            tracing::debug!("💾 Wrote {} ({} bytes)", name, data.len());
            written.push(name.to_string());
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_counts_default_and_env_overrides() {
        let env: HashMap<&str, &str> = [("INVOICE_COUNT", "12"), ("CONTACT_COUNT", " 7 ")]
            .into_iter()
            .collect();
        let counts = SeedCounts::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(counts.customers, 100);
        assert_eq!(counts.invoices, 12);
        assert_eq!(counts.contacts, 7);
        assert_eq!(counts.opportunities, 150);
    }

    #[test]
    fn test_invalid_count_is_config_error() {
        let result = SeedCounts::from_lookup(|key| {
            (key == "ACCOUNT_COUNT").then(|| "many".to_string())
        });
        match result {
            Err(OrchestratorError::InvalidConfigValueError { field, .. }) => {
                assert_eq!(field, "ACCOUNT_COUNT")
            }
            other => panic!("expected InvalidConfigValueError, got {:?}", other),
        }
    }

    #[test]
    fn test_generated_records_reference_each_other() {
        let counts = SeedCounts {
            customers: 5,
            invoices: 20,
            accounts: 4,
            contacts: 10,
            opportunities: 8,
        };
        let data = SeedData::generate(42, counts);

        assert_eq!(data.customers.len(), 5);
        assert_eq!(data.invoices.len(), 20);
        assert_eq!(data.opportunities.len(), 8);

        let customer_ids: Vec<&str> = data.customers.iter().map(|c| c.id.as_str()).collect();
        assert!(data
            .invoices
            .iter()
            .all(|i| customer_ids.contains(&i.customer_id.as_str())));

        let account_ids: Vec<&str> = data.accounts.iter().map(|a| a.id.as_str()).collect();
        assert!(data
            .contacts
            .iter()
            .all(|c| account_ids.contains(&c.account_id.as_str())));
    }
}
