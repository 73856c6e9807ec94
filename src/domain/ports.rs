use crate::domain::model::{CommandResult, CommandSpec, Integration, ProbeOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn max_parallel_tests(&self) -> usize;
    fn rotation_size(&self) -> usize;
    fn request_timeout_seconds(&self) -> u64;
}

/// 對單一整合執行測試套件
#[async_trait]
pub trait IntegrationProbe: Send + Sync {
    async fn run_suite(&self, integration: &Integration) -> ProbeOutcome;
}

/// 執行分層測試指令
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, spec: &CommandSpec) -> CommandResult;
}
