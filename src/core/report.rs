use crate::core::Storage;
use crate::domain::model::{Priority, PriorityStats, RunSummary, TestResult, TestTrigger};
use crate::utils::error::{OrchestratorError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const CSV_HEADER: [&str; 7] = [
    "integration_name",
    "priority",
    "connector_type",
    "passed",
    "duration",
    "errors",
    "warnings",
];

fn rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64
    }
}

impl PriorityStats {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a TestResult>) -> Self {
        let mut stats = PriorityStats::default();
        for result in results {
            stats.total += 1;
            if result.passed {
                stats.passed += 1;
            }
        }
        stats.failed = stats.total - stats.passed;
        stats.success_rate = rate(stats.passed, stats.total);
        stats
    }
}

impl RunSummary {
    /// 彙整一次執行的結果；三個優先層級一律出現在 priority_stats
    pub fn from_results(
        trigger: TestTrigger,
        results: Vec<TestResult>,
        total_duration: f64,
    ) -> Self {
        let total_tests = results.len();
        let passed = results.iter().filter(|r| r.passed).count();

        let avg_test_duration = if total_tests == 0 {
            0.0
        } else {
            results.iter().map(|r| r.duration).sum::<f64>() / total_tests as f64
        };

        let priority_stats: BTreeMap<Priority, PriorityStats> = Priority::ALL
            .iter()
            .map(|&priority| {
                let stats =
                    PriorityStats::from_results(results.iter().filter(|r| r.priority == priority));
                (priority, stats)
            })
            .collect();

        Self {
            trigger,
            total_tests,
            passed,
            failed: total_tests - passed,
            success_rate: rate(passed, total_tests),
            total_duration,
            avg_test_duration,
            priority_stats,
            timestamp: Utc::now(),
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// `test_results_{YYYYmmdd_HHMMSS}.{extension}`
pub fn default_report_name(timestamp: DateTime<Utc>, extension: &str) -> String {
    format!(
        "test_results_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        extension
    )
}

pub fn results_to_csv(results: &[TestResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for result in results {
        let duration = format!("{:.3}", result.duration);
        let errors = result.errors.join("; ");
        let warnings = result.warnings.join("; ");
        writer.write_record([
            result.integration_name.as_str(),
            result.priority.as_str(),
            result.connector_type.as_str(),
            if result.passed { "true" } else { "false" },
            duration.as_str(),
            errors.as_str(),
            warnings.as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| OrchestratorError::ExecutionError {
        stage: "report".to_string(),
        details: e.to_string(),
    })?;

    String::from_utf8(bytes).map_err(|e| OrchestratorError::ExecutionError {
        stage: "report".to_string(),
        details: e.to_string(),
    })
}

/// 將執行摘要寫到 Storage
pub struct ReportWriter<S: Storage> {
    storage: S,
}

impl<S: Storage> ReportWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 寫入 JSON 報告，回傳實際使用的檔名
    pub async fn write_json(&self, summary: &RunSummary, name: Option<&str>) -> Result<String> {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| default_report_name(summary.timestamp, "json"));

        let json = serde_json::to_string_pretty(summary)?;
        self.storage.write_file(&name, json.as_bytes()).await?;

        tracing::info!("📄 Test results saved to {}", name);
        Ok(name)
    }

    pub async fn write_csv(&self, summary: &RunSummary, name: Option<&str>) -> Result<String> {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| default_report_name(summary.timestamp, "csv"));

        let csv = results_to_csv(&summary.results)?;
        self.storage.write_file(&name, csv.as_bytes()).await?;

        tracing::info!("📄 CSV results saved to {}", name);
        Ok(name)
    }

    /// 把 JSON 與 CSV 打包成一個 zip
    pub async fn write_bundle(&self, summary: &RunSummary, name: Option<&str>) -> Result<String> {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| default_report_name(summary.timestamp, "zip"));

        let stem = default_report_name(summary.timestamp, "");
        let stem = stem.trim_end_matches('.');

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>(format!("{}.json", stem), FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(summary)?.as_bytes())?;

            zip.start_file::<_, ()>(format!("{}.csv", stem), FileOptions::default())?;
            zip.write_all(results_to_csv(&summary.results)?.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing report bundle ({} bytes)", zip_data.len());
        self.storage.write_file(&name, &zip_data).await?;

        tracing::info!("📦 Report bundle saved to {}", name);
        Ok(name)
    }
}

pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    out.push_str(&format!("\n{}\n", rule));
    out.push_str(&format!("🧪 TEST SUMMARY - {}\n", summary.trigger.as_str().to_uppercase()));
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("Total tests: {}\n", summary.total_tests));
    out.push_str(&format!("Passed: {}\n", summary.passed));
    out.push_str(&format!("Failed: {}\n", summary.failed));
    out.push_str(&format!("Success rate: {:.1}%\n", summary.success_rate * 100.0));
    out.push_str(&format!("Total duration: {:.2}s\n", summary.total_duration));
    out.push_str(&format!("Avg test duration: {:.2}s\n", summary.avg_test_duration));

    out.push_str("\n📊 By priority:\n");
    for (priority, stats) in &summary.priority_stats {
        out.push_str(&format!(
            "  {}: {}/{} passed ({:.1}%)\n",
            priority,
            stats.passed,
            stats.total,
            stats.success_rate * 100.0
        ));
    }

    let failures: Vec<&TestResult> = summary.failures().collect();
    if !failures.is_empty() {
        out.push_str("\n❌ Failures:\n");
        for result in failures {
            out.push_str(&format!(
                "  {} ({}): {}\n",
                result.integration_name,
                result.priority,
                result.errors.join("; ")
            ));
        }
    }

    out
}

pub fn print_summary(summary: &RunSummary) {
    println!("{}", format_summary(summary));
}
