use crate::config::registry_config::RegistryConfig;
use crate::core::ConfigProvider;
use crate::domain::model::{Integration, Priority, TestTrigger};
use chrono::Datelike;

/// 今天是星期幾（星期一 = 0）
pub fn current_weekday() -> u32 {
    chrono::Local::now().weekday().num_days_from_monday()
}

/// 依星期幾輪替的固定大小視窗：起點 `(weekday * size) % len`，不回繞
pub fn rotating_window<T>(items: &[T], weekday: u32, size: usize) -> &[T] {
    if items.is_empty() || size == 0 {
        return &[];
    }
    let len = items.len();
    // 先各自取餘數再相乘，size 極大時也不會溢位
    let start = ((weekday as usize % len) * (size % len)) % len;
    let end = start.saturating_add(size).min(len);
    &items[start..end]
}

/// 依觸發條件選出要測試的整合，保持註冊表順序
pub fn select(registry: &RegistryConfig, trigger: TestTrigger, weekday: u32) -> Vec<&Integration> {
    match trigger {
        TestTrigger::EveryCommit => registry.by_priority(Priority::Critical),
        TestTrigger::SchemaChange | TestTrigger::Nightly => {
            let mut selected = registry.by_priority(Priority::Critical);
            selected.extend(registry.by_priority(Priority::Important));
            selected
        }
        TestTrigger::Weekly => registry.by_priority(Priority::Secondary),
        TestTrigger::Rotating => {
            let secondary = registry.by_priority(Priority::Secondary);
            rotating_window(&secondary, weekday, registry.rotation_size()).to_vec()
        }
    }
}

pub fn select_today(registry: &RegistryConfig, trigger: TestTrigger) -> Vec<&Integration> {
    select(registry, trigger, current_weekday())
}

/// 某觸發條件的執行規模
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerPlan {
    pub trigger: TestTrigger,
    pub integrations: usize,
    pub test_data_records: usize,
    pub parallelism: usize,
}

pub fn plan(registry: &RegistryConfig, trigger: TestTrigger, weekday: u32) -> TriggerPlan {
    let selected = select(registry, trigger, weekday);
    TriggerPlan {
        trigger,
        integrations: selected.len(),
        test_data_records: selected.iter().map(|i| i.test_data_count).sum(),
        parallelism: selected.len().min(registry.max_parallel_tests()),
    }
}
