use crate::fixtures::base::{Address, BaseFactory, DEFAULT_SEED};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STAGE_NAMES: &[&str] = &[
    "Prospecting",
    "Qualification",
    "Needs Analysis",
    "Proposal/Price Quote",
    "Negotiation/Review",
    "Closed Won",
    "Closed Lost",
];

const LEAD_SOURCES: &[&str] = &[
    "Web",
    "Phone Inquiry",
    "Partner Referral",
    "Purchased List",
    "Other",
    "Advertisement",
    "Employee Referral",
    "External Referral",
];
const ACCOUNT_TYPES: &[&str] = &[
    "Customer - Direct",
    "Customer - Channel",
    "Prospect",
    "Partner",
    "Reseller",
];
const INDUSTRIES: &[&str] = &[
    "Technology",
    "Healthcare",
    "Financial Services",
    "Manufacturing",
    "Retail",
    "Education",
    "Government",
    "Non-Profit",
];
const DEPARTMENTS: &[&str] = &[
    "Sales",
    "Marketing",
    "IT",
    "Finance",
    "Operations",
    "Human Resources",
    "Customer Service",
    "Executive",
];
const JOB_TITLES: &[&str] = &[
    "Account Executive",
    "Marketing Manager",
    "Software Engineer",
    "Controller",
    "Operations Director",
    "HR Business Partner",
    "Support Lead",
    "Chief Executive Officer",
];
const OPPORTUNITY_TYPES: &[&str] = &[
    "New Business",
    "Existing Business - Upgrade",
    "Existing Business - Replacement",
];
const NAME_PREFIXES: &[&str] = &["New", "Renewal", "Expansion", "Upgrade", "Implementation"];
const NAME_SERVICES: &[&str] = &[
    "Software License",
    "Consulting Services",
    "Support Contract",
    "Training",
    "Integration",
];

/// 各階段的成交機率範圍（含端點）
pub fn probability_range(stage_name: &str) -> (u32, u32) {
    match stage_name {
        "Prospecting" => (10, 20),
        "Qualification" => (20, 30),
        "Needs Analysis" => (30, 40),
        "Proposal/Price Quote" => (40, 60),
        "Negotiation/Review" => (60, 80),
        "Closed Won" => (100, 100),
        "Closed Lost" => (0, 0),
        _ => (50, 50),
    }
}

pub fn forecast_category(stage_name: &str) -> &'static str {
    match stage_name {
        "Closed Won" => "Closed",
        "Closed Lost" => "Omitted",
        "Negotiation/Review" | "Proposal/Price Quote" => "Best Case",
        _ => "Pipeline",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub industry: String,
    pub annual_revenue: f64,
    pub number_of_employees: u32,
    pub phone: String,
    pub website: String,
    pub billing_address: Address,
    pub shipping_address: Address,
    pub description: Option<String>,
    pub created_date: String,
    pub last_modified: String,
    pub owner_id: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub mobile_phone: Option<String>,
    pub title: String,
    pub department: String,
    pub account_id: String,
    pub account_name: String,
    pub mailing_address: Address,
    pub description: Option<String>,
    pub created_date: String,
    pub last_modified: String,
    pub owner_id: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub name: String,
    pub account_id: String,
    pub account_name: String,
    pub amount: f64,
    pub stage_name: String,
    pub probability: u32,
    pub close_date: String,
    pub lead_source: String,
    #[serde(rename = "type")]
    pub opportunity_type: String,
    pub forecast_category: String,
    pub description: Option<String>,
    pub next_step: Option<String>,
    pub created_date: String,
    pub last_modified: String,
    pub owner_id: String,
    pub is_won: bool,
    pub is_closed: bool,
}

/// Salesforce 帳戶、聯絡人與商機
pub struct SalesforceFactory {
    base: BaseFactory,
}

impl SalesforceFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            base: BaseFactory::new(seed),
        }
    }

    pub fn with_anchor(seed: u64, anchor: DateTime<Utc>) -> Self {
        Self {
            base: BaseFactory::with_anchor(seed, anchor),
        }
    }

    pub fn generate_accounts(&mut self, count: usize) -> Vec<Account> {
        (0..count).map(|_| self.account()).collect()
    }

    fn account(&mut self) -> Account {
        let base = &mut self.base;
        Account {
            id: base.id("ACC", 6),
            name: base.company_name(),
            account_type: base.pick(ACCOUNT_TYPES).to_string(),
            industry: base.pick(INDUSTRIES).to_string(),
            annual_revenue: base.money_in(100_000.0, 10_000_000.0),
            number_of_employees: base.int_in(10, 10_000),
            phone: base.phone(),
            website: base.url(),
            billing_address: base.address(),
            shipping_address: base.address(),
            description: base.chance(0.6).then(|| base.text(500)),
            created_date: base.date_within_past(365),
            last_modified: base.date_within_past(30),
            owner_id: base.id("USER", 3),
            is_active: base.chance(0.5),
        }
    }

    /// 沒有給帳戶 id 時產生 50 個隨機 id
    pub fn generate_contacts(&mut self, count: usize, account_ids: &[String]) -> Vec<Contact> {
        let account_ids = self.account_ids_or_random(account_ids);
        (0..count).map(|_| self.contact(&account_ids)).collect()
    }

    fn contact(&mut self, account_ids: &[String]) -> Contact {
        let base = &mut self.base;
        Contact {
            id: base.id("CON", 6),
            first_name: base.first_name(),
            last_name: base.last_name(),
            email: base.email(),
            phone: base.phone(),
            mobile_phone: base.chance(0.8).then(|| base.phone()),
            title: base.pick(JOB_TITLES).to_string(),
            department: base.pick(DEPARTMENTS).to_string(),
            account_id: base.pick_owned(account_ids).unwrap_or_default(),
            account_name: base.company_name(),
            mailing_address: base.address(),
            description: base.chance(0.4).then(|| base.text(300)),
            created_date: base.date_within_past(365),
            last_modified: base.date_within_past(30),
            owner_id: base.id("USER", 3),
            is_active: base.chance(0.5),
        }
    }

    pub fn generate_opportunities(
        &mut self,
        count: usize,
        account_ids: &[String],
    ) -> Vec<Opportunity> {
        let account_ids = self.account_ids_or_random(account_ids);
        (0..count).map(|_| self.opportunity(&account_ids)).collect()
    }

    fn opportunity(&mut self, account_ids: &[String]) -> Opportunity {
        let base = &mut self.base;
        let account_id = base.pick_owned(account_ids).unwrap_or_default();
        let stage_name = base.pick(STAGE_NAMES).to_string();
        let (low, high) = probability_range(&stage_name);
        let days_ahead = i64::from(base.int_in(7, 180));
        let name = format!(
            "{} {} - {}",
            base.pick(NAME_PREFIXES),
            base.pick(NAME_SERVICES),
            base.company_name()
        );

        Opportunity {
            id: base.id("OPP", 6),
            name,
            account_id,
            account_name: base.company_name(),
            amount: base.money_in(1_000.0, 500_000.0),
            probability: base.int_in(low, high),
            close_date: base.date_ahead(days_ahead),
            lead_source: base.pick(LEAD_SOURCES).to_string(),
            opportunity_type: base.pick(OPPORTUNITY_TYPES).to_string(),
            forecast_category: forecast_category(&stage_name).to_string(),
            description: base.chance(0.7).then(|| base.text(500)),
            next_step: base.chance(0.5).then(|| base.sentence(6)),
            created_date: base.date_within_past(180),
            last_modified: base.date_within_past(30),
            owner_id: base.id("USER", 3),
            is_won: stage_name == "Closed Won",
            is_closed: stage_name == "Closed Won" || stage_name == "Closed Lost",
            stage_name,
        }
    }

    fn account_ids_or_random(&mut self, account_ids: &[String]) -> Vec<String> {
        if account_ids.is_empty() {
            (0..50).map(|_| self.base.id("ACC", 6)).collect()
        } else {
            account_ids.to_vec()
        }
    }
}

impl Default for SalesforceFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
