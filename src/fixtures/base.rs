use chrono::{DateTime, Duration, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEED: u64 = 42;

const COMPANY_PREFIXES: &[&str] = &[
    "Acme", "Blue Ridge", "Cobalt", "Delta", "Evergreen", "Falcon", "Granite", "Harbor",
    "Ironwood", "Juniper", "Keystone", "Lumen", "Meridian", "Northwind", "Orchid", "Pinnacle",
    "Quantum", "Redwood", "Summit", "Trident", "Vertex", "Willow",
];
const COMPANY_SUFFIXES: &[&str] = &[
    "Labs", "Systems", "Group", "Partners", "Holdings", "Solutions", "Industries", "Analytics",
    "Ventures", "Networks",
];
const COMPANY_FORMS: &[&str] = &["Inc", "LLC", "Ltd", "Co"];

const FIRST_NAMES: &[&str] = &[
    "Alice", "Brian", "Carmen", "David", "Elena", "Farah", "George", "Hana", "Ivan", "Julia",
    "Kenji", "Laura", "Miguel", "Nina", "Omar", "Priya", "Quinn", "Rosa", "Samuel", "Tara",
];
const LAST_NAMES: &[&str] = &[
    "Anderson", "Baker", "Chen", "Diaz", "Evans", "Fischer", "Garcia", "Hughes", "Ito", "Johnson",
    "Kim", "Lopez", "Martin", "Nguyen", "Okafor", "Patel", "Reyes", "Smith", "Tanaka", "Wright",
];

const STREETS: &[&str] = &[
    "Main St", "Oak Ave", "Maple Dr", "Cedar Ln", "Pine St", "Elm St", "Lakeview Rd",
    "Hillcrest Blvd", "Sunset Ave", "River Rd",
];
const CITIES: &[(&str, &str)] = &[
    ("Austin", "TX"),
    ("Boston", "MA"),
    ("Chicago", "IL"),
    ("Denver", "CO"),
    ("Portland", "OR"),
    ("Seattle", "WA"),
    ("Atlanta", "GA"),
    ("Phoenix", "AZ"),
    ("Raleigh", "NC"),
    ("San Diego", "CA"),
];
const COUNTRIES: &[&str] = &["US", "CA", "GB", "DE", "AU"];
const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

const WORDS: &[&str] = &[
    "adaptive", "scalable", "integrated", "robust", "seamless", "dynamic", "secure", "modular",
    "automated", "unified", "platform", "workflow", "pipeline", "analytics", "interface",
    "solution", "framework", "network", "service", "portal", "engine", "suite", "toolkit",
];

/// 地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 各資料工廠共用的隨機來源與欄位產生器。相同 seed 與基準時間會產生相同資料
pub struct BaseFactory {
    rng: StdRng,
    anchor: DateTime<Utc>,
}

impl BaseFactory {
    pub fn new(seed: u64) -> Self {
        let anchor = Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        Self::with_anchor(seed, anchor)
    }

    pub fn with_anchor(seed: u64, anchor: DateTime<Utc>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            anchor,
        }
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability)
    }

    pub fn int_in(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }

    pub fn money_in(&mut self, low: f64, high: f64) -> f64 {
        round2(self.rng.gen_range(low..=high))
    }

    /// 空清單回傳空字串
    pub fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    pub fn pick_owned<T: Clone>(&mut self, items: &[T]) -> Option<T> {
        items.choose(&mut self.rng).cloned()
    }

    /// `{prefix}-{n}`，n 為固定位數
    pub fn id(&mut self, prefix: &str, digits: u32) -> String {
        let low = 10u64.pow(digits.saturating_sub(1));
        let high = 10u64.pow(digits) - 1;
        let n = self.rng.gen_range(low..=high);
        format!("{}-{:0width$}", prefix, n, width = digits as usize)
    }

    pub fn company_name(&mut self) -> String {
        let prefix = self.pick(COMPANY_PREFIXES);
        let suffix = self.pick(COMPANY_SUFFIXES);
        let form = self.pick(COMPANY_FORMS);
        format!("{} {} {}", prefix, suffix, form)
    }

    pub fn first_name(&mut self) -> String {
        self.pick(FIRST_NAMES).to_string()
    }

    pub fn last_name(&mut self) -> String {
        self.pick(LAST_NAMES).to_string()
    }

    pub fn email(&mut self) -> String {
        let domain = self.pick(EMAIL_DOMAINS);
        self.email_at(domain)
    }

    pub fn email_at(&mut self, domain: &str) -> String {
        let first = self.pick(FIRST_NAMES).to_ascii_lowercase();
        let last = self.pick(LAST_NAMES).to_ascii_lowercase();
        let n = self.rng.gen_range(1..100);
        format!("{}.{}{}@{}", first, last, n, domain)
    }

    pub fn phone(&mut self) -> String {
        format!(
            "({:03}) {:03}-{:04}",
            self.rng.gen_range(200..1000),
            self.rng.gen_range(200..1000),
            self.rng.gen_range(0..10000)
        )
    }

    pub fn url(&mut self) -> String {
        let name = self.pick(COMPANY_PREFIXES).to_ascii_lowercase().replace(' ', "");
        format!("https://www.{}.example.com/", name)
    }

    pub fn address(&mut self) -> Address {
        let (city, state) = CITIES.choose(&mut self.rng).copied().unwrap_or(CITIES[0]);
        let line2 = if self.chance(0.3) {
            Some(format!("Suite {}", self.rng.gen_range(100..1000)))
        } else {
            None
        };

        Address {
            line1: format!("{} {}", self.rng.gen_range(1..10000), self.pick(STREETS)),
            line2,
            city: city.to_string(),
            state: state.to_string(),
            postal_code: format!("{:05}", self.rng.gen_range(10000..100000)),
            country: self.pick(COUNTRIES).to_string(),
        }
    }

    pub fn sentence(&mut self, words: usize) -> String {
        let sentence = (0..words.max(1))
            .map(|_| self.pick(WORDS))
            .collect::<Vec<_>>()
            .join(" ");
        let mut chars = sentence.chars();
        match chars.next() {
            Some(first) => format!("{}{}.", first.to_ascii_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }

    /// 不超過 max_chars 的段落
    pub fn text(&mut self, max_chars: usize) -> String {
        let mut text = String::new();
        loop {
            let words = self.rng.gen_range(4..10);
            let sentence = self.sentence(words);
            let needed = if text.is_empty() { sentence.len() } else { sentence.len() + 1 };
            if text.len() + needed > max_chars {
                break;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&sentence);
        }
        text
    }

    pub fn catch_phrase(&mut self) -> String {
        let a = self.pick(WORDS);
        let b = self.pick(WORDS);
        let c = self.pick(WORDS);
        format!("{} {} {}", a, b, c)
    }

    /// 基準時間往前 `0..=days_back` 天
    pub fn date_within_past(&mut self, days_back: i64) -> String {
        let offset = self.rng.gen_range(0..=days_back.max(0));
        (self.anchor - Duration::days(offset)).to_rfc3339()
    }

    pub fn date_ahead(&mut self, days: i64) -> String {
        (self.anchor + Duration::days(days)).to_rfc3339()
    }
}

impl Default for BaseFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
