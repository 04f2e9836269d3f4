use std::collections::HashMap;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

/// CPU 端的分段计时
pub trait CpuProfiler {
    fn begin(&mut self, name: &str);
    fn end(&mut self, name: &str);
}

/// 什么都不做
#[derive(Default)]
pub struct NullProfiler;
impl CpuProfiler for NullProfiler {
    #[inline]
    fn begin(&mut self, _name: &str) {}

    #[inline]
    fn end(&mut self, _name: &str) {}
}

/// 记录每个分段最近一次的耗时与累计调用次数
#[derive(Default)]
pub struct CpuTimingProfiler {
    open: HashMap<String, Instant>,
    timings: IndexMap<String, PassTiming>,
}

#[derive(Copy, Clone, Default, Debug)]
pub struct PassTiming {
    pub last: Duration,
    pub total: Duration,
    pub count: u32,
}

impl CpuTimingProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timing(&self, name: &str) -> Option<PassTiming> {
        self.timings.get(name).copied()
    }

    /// 按首次出现的顺序
    pub fn timings(&self) -> impl Iterator<Item = (&str, &PassTiming)> {
        self.timings.iter().map(|(name, timing)| (name.as_str(), timing))
    }

    pub fn clear(&mut self) {
        self.open.clear();
        self.timings.clear();
    }

    pub fn log_summary(&self) {
        for (name, timing) in &self.timings {
            log::info!(
                "{name}: last {:.3} ms, avg {:.3} ms over {} samples",
                timing.last.as_secs_f64() * 1000.0,
                timing.total.as_secs_f64() * 1000.0 / timing.count.max(1) as f64,
                timing.count
            );
        }
    }
}

impl CpuProfiler for CpuTimingProfiler {
    fn begin(&mut self, name: &str) {
        #[cfg(feature = "tracy")]
        if let Some(client) = tracy_client::Client::running() {
            client.message(name, 0);
        }
        self.open.insert(name.to_string(), Instant::now());
    }

    fn end(&mut self, name: &str) {
        let Some(start) = self.open.remove(name) else {
            log::warn!("profiler: end '{name}' without begin");
            return;
        };
        let elapsed = start.elapsed();
        let timing = self.timings.entry(name.to_string()).or_default();
        timing.last = elapsed;
        timing.total += elapsed;
        timing.count += 1;
    }
}
