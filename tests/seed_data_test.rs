use anyhow::Result;
use tempfile::TempDir;
use tier_orchestrator::fixtures::{SeedCounts, SeedData};
use tier_orchestrator::LocalStorage;

#[tokio::test]
async fn test_seed_files_are_written_and_parse() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path());

    let counts = SeedCounts {
        customers: 3,
        invoices: 6,
        accounts: 2,
        contacts: 5,
        opportunities: 4,
    };
    let data = SeedData::generate(42, counts);
    let written = data.write_to(&storage).await?;

    assert_eq!(
        written,
        vec![
            "customers.json",
            "invoices.json",
            "accounts.json",
            "contacts.json",
            "opportunities.json"
        ]
    );

    let read = |name: &str| -> Vec<serde_json::Value> {
        let bytes = std::fs::read(temp_dir.path().join(name)).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    };

    assert_eq!(read("customers.json").len(), 3);
    assert_eq!(read("invoices.json").len(), 6);
    assert_eq!(read("contacts.json").len(), 5);

    let opportunities = read("opportunities.json");
    assert_eq!(opportunities.len(), 4);
    for opp in &opportunities {
        assert!(opp["type"].is_string());
        assert!(opp["probability"].as_u64().unwrap() <= 100);
    }

    let invoices = read("invoices.json");
    assert!(invoices[0]["status"].is_string());
    assert!(!invoices[0]["line_items"].as_array().unwrap().is_empty());

    Ok(())
}

#[test]
fn test_same_seed_same_data() -> Result<()> {
    let counts = SeedCounts {
        customers: 4,
        invoices: 4,
        accounts: 4,
        contacts: 4,
        opportunities: 4,
    };
    let a = serde_json::to_string(&SeedData::generate(7, counts))?;
    let b = serde_json::to_string(&SeedData::generate(7, counts))?;
    assert_eq!(a, b);

    Ok(())
}
