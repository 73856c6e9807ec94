use crate::domain::model::Integration;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const SHARED_MOCK_BASE_PORT: u16 = 6000;

/// 多個同類整合共用的 mock 服務，以連線數上限做准入控制
#[derive(Debug)]
pub struct SharedMockService {
    service_type: String,
    port: u16,
    max_connections: usize,
    active_connections: Mutex<usize>,
    running: AtomicBool,
}

impl SharedMockService {
    pub fn new(service_type: impl Into<String>, port: u16, max_connections: usize) -> Self {
        Self {
            service_type: service_type.into(),
            port,
            max_connections,
            active_connections: Mutex::new(0),
            running: AtomicBool::new(false),
        }
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn start(&self) {
        if !self.running.swap(true, Ordering::SeqCst) {
            tracing::info!(
                "🚀 Started shared mock service: {} on port {}",
                self.service_type,
                self.port
            );
        }
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("🛑 Stopped shared mock service: {}", self.service_type);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 取得一條連線；已達上限時立即回傳 None，不等待
    pub fn acquire(self: &Arc<Self>) -> Option<MockConnection> {
        let mut active = self.lock_counter();
        if *active < self.max_connections {
            *active += 1;
            Some(MockConnection {
                service: Arc::clone(self),
            })
        } else {
            None
        }
    }

    fn release(&self) {
        let mut active = self.lock_counter();
        *active = active.saturating_sub(1);
    }

    pub fn active_connections(&self) -> usize {
        *self.lock_counter()
    }

    fn lock_counter(&self) -> std::sync::MutexGuard<'_, usize> {
        // 計數器只做加減，poison 後的值仍可用
        self.active_connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 連線憑證，drop 時歸還
#[derive(Debug)]
pub struct MockConnection {
    service: Arc<SharedMockService>,
}

impl MockConnection {
    pub fn service_type(&self) -> &str {
        self.service.service_type()
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.service.release();
    }
}

/// 依 mock_service 分組建立的共用服務集合
#[derive(Debug, Default)]
pub struct SharedMockPool {
    services: Vec<Arc<SharedMockService>>,
    index: HashMap<String, usize>,
}

impl SharedMockPool {
    /// 每個 mock_service 一個服務，埠號依首次出現順序從 base_port 起遞增，上限為組內整合數
    pub fn from_integrations<'a, I>(integrations: I, base_port: u16) -> Self
    where
        I: IntoIterator<Item = &'a Integration>,
    {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for integration in integrations {
            if let Some(service) = &integration.mock_service {
                let count = counts.entry(service.clone()).or_insert(0);
                if *count == 0 {
                    order.push(service.clone());
                }
                *count += 1;
            }
        }

        let mut pool = Self::default();
        for (offset, service_type) in order.into_iter().enumerate() {
            let port = base_port.saturating_add(offset as u16);
            let max_connections = counts.get(&service_type).copied().unwrap_or(0);
            pool.insert(SharedMockService::new(service_type, port, max_connections));
        }
        pool
    }

    pub fn insert(&mut self, service: SharedMockService) {
        let name = service.service_type().to_string();
        match self.index.get(&name) {
            Some(&position) => self.services[position] = Arc::new(service),
            None => {
                self.index.insert(name, self.services.len());
                self.services.push(Arc::new(service));
            }
        }
    }

    pub fn get(&self, service_type: &str) -> Option<&Arc<SharedMockService>> {
        self.index.get(service_type).map(|&i| &self.services[i])
    }

    pub fn services(&self) -> impl Iterator<Item = &Arc<SharedMockService>> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn start_all(&self) {
        for service in &self.services {
            service.start();
        }
    }

    pub fn stop_all(&self) {
        for service in &self.services {
            service.stop();
        }
    }
}
