//! CPU utilization sampler.

use crate::error::{Result, StatsError};
use crate::metrics::data::Metric;
use crate::metrics::traits::Sampler;
use sysinfo::System;

/// Samples global CPU usage, plus per-core usage and load averages when
/// extended metrics are enabled.
pub struct CpuSampler {
    system: System,
    extended: bool,
}

impl CpuSampler {
    pub fn new(extended: bool) -> Self {
        Self {
            system: System::new(),
            extended,
        }
    }
}

impl Sampler for CpuSampler {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn prepare(&mut self) -> Result<()> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(StatsError::resource_error(
                "cpu",
                "CPU statistics are not supported on this platform",
            ));
        }

        // Usage is a delta between refreshes, so take the baseline now.
        self.system.refresh_cpu_all();
        if self.system.cpus().is_empty() {
            return Err(StatsError::resource_error("cpu", "No CPU information available"));
        }
        Ok(())
    }

    fn sample(&mut self) -> Result<Vec<Metric>> {
        self.system.refresh_cpu_usage();

        let mut metrics = vec![Metric::gauge(
            "percent",
            self.system.global_cpu_usage() as f64,
        )];

        if self.extended {
            let cpus = self.system.cpus();
            metrics.push(Metric::gauge("count", cpus.len() as f64));
            for (i, cpu) in cpus.iter().enumerate() {
                metrics.push(Metric::gauge(
                    format!("core.{}.percent", i),
                    cpu.cpu_usage() as f64,
                ));
            }

            let load = System::load_average();
            metrics.push(Metric::gauge("load.1", load.one));
            metrics.push(Metric::gauge("load.5", load.five));
            metrics.push(Metric::gauge("load.15", load.fifteen));
        }

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_sample() {
        let mut sampler = CpuSampler::new(false);
        sampler.prepare().unwrap();
        let metrics = sampler.sample().unwrap();

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name, "percent");
        assert!(metrics[0].value >= 0.0);
    }

    #[test]
    fn test_extended_sample() {
        let mut sampler = CpuSampler::new(true);
        sampler.prepare().unwrap();
        let metrics = sampler.sample().unwrap();
        let names: Vec<_> = metrics.iter().map(|m| m.name.as_str()).collect();

        assert!(names.contains(&"count"));
        assert!(names.contains(&"core.0.percent"));
        assert!(names.contains(&"load.15"));
    }
}
