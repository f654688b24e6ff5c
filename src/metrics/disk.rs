//! Mounted filesystem usage sampler.

use crate::error::Result;
use crate::metrics::data::{percent, Metric};
use crate::metrics::traits::Sampler;
use std::collections::BTreeMap;
use sysinfo::Disks;

/// Samples space usage of every mounted filesystem with a non-zero size.
pub struct DiskSampler {
    disks: Disks,
}

impl DiskSampler {
    pub fn new() -> Self {
        Self {
            disks: Disks::new(),
        }
    }
}

impl Default for DiskSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for DiskSampler {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn prepare(&mut self) -> Result<()> {
        self.disks.refresh_list();
        Ok(())
    }

    fn sample(&mut self) -> Result<Vec<Metric>> {
        // Re-list so mounts added after startup are picked up.
        self.disks.refresh_list();

        let mut usage = BTreeMap::new();
        for disk in self.disks.iter() {
            let total = disk.total_space();
            if total == 0 {
                continue;
            }
            let key = mount_key(&disk.mount_point().to_string_lossy());
            usage
                .entry(key)
                .or_insert((total, disk.available_space()));
        }

        let mut metrics = Vec::with_capacity(usage.len() * 4);
        for (mount, (total, free)) in usage {
            let used = total.saturating_sub(free);
            metrics.push(Metric::gauge(format!("{}.total", mount), total as f64));
            metrics.push(Metric::gauge(format!("{}.used", mount), used as f64));
            metrics.push(Metric::gauge(format!("{}.free", mount), free as f64));
            metrics.push(Metric::gauge(format!("{}.percent", mount), percent(used, total)));
        }

        Ok(metrics)
    }
}

/// Turn a mount point into a single metric name segment.
pub fn mount_key(mount_point: &str) -> String {
    let trimmed = mount_point.trim_matches(|c| c == '/' || c == '\\');
    if trimmed.is_empty() {
        return "root".to_string();
    }
    trimmed
        .chars()
        .map(|c| match c {
            '/' | '\\' | '.' | ':' | ' ' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_keys() {
        assert_eq!(mount_key("/"), "root");
        assert_eq!(mount_key("/boot"), "boot");
        assert_eq!(mount_key("/boot/efi/"), "boot_efi");
        assert_eq!(mount_key("/mnt/my disk.img"), "mnt_my_disk_img");
        assert_eq!(mount_key("C:\\"), "C_");
    }

    #[test]
    fn test_sample_shape() {
        let mut sampler = DiskSampler::new();
        sampler.prepare().unwrap();
        let metrics = sampler.sample().unwrap();

        // Four gauges per reported filesystem.
        assert_eq!(metrics.len() % 4, 0);
        for metric in metrics.iter().filter(|m| m.name.ends_with(".percent")) {
            assert!((0.0..=100.0).contains(&metric.value));
        }
    }
}
