//! Memory and swap sampler.

use crate::error::{Result, StatsError};
use crate::metrics::data::{percent, Metric};
use crate::metrics::traits::Sampler;
use sysinfo::System;

pub struct MemorySampler {
    system: System,
    extended: bool,
}

impl MemorySampler {
    pub fn new(extended: bool) -> Self {
        Self {
            system: System::new(),
            extended,
        }
    }
}

impl Sampler for MemorySampler {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn prepare(&mut self) -> Result<()> {
        self.system.refresh_memory();
        if self.system.total_memory() == 0 {
            return Err(StatsError::resource_error(
                "memory",
                "Total memory reported as zero",
            ));
        }
        Ok(())
    }

    fn sample(&mut self) -> Result<Vec<Metric>> {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let used = self.system.used_memory();
        let free = self.system.free_memory();

        let mut metrics = vec![
            Metric::gauge("total", total as f64),
            Metric::gauge("used", used as f64),
            Metric::gauge("free", free as f64),
            Metric::gauge("percent", percent(used, total)),
        ];

        if self.extended {
            let swap_total = self.system.total_swap();
            let swap_used = self.system.used_swap();

            metrics.push(Metric::gauge(
                "available",
                self.system.available_memory() as f64,
            ));
            metrics.push(Metric::gauge("swap.total", swap_total as f64));
            metrics.push(Metric::gauge("swap.used", swap_used as f64));
            metrics.push(Metric::gauge("swap.free", self.system.free_swap() as f64));
            metrics.push(Metric::gauge("swap.percent", percent(swap_used, swap_total)));
        }

        Ok(metrics)
    }
}
