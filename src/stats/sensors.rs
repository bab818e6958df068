// src/stats/sensors.rs
use std::path::PathBuf;
use sysinfo::Components;

/// Reads the CPU temperature
///
/// The thermal zone file (millidegrees, as on a Raspberry Pi) is tried
/// first; if it is missing, the first CPU-like hardware component reported
/// by `sysinfo` is used.
pub struct CpuTempSensor {
    /// Thermal zone file
    path: PathBuf,
    /// Hardware component information collector
    components: Components,
}

impl CpuTempSensor {
    /// Creates a sensor reading `path` first
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CpuTempSensor {
            path: path.into(),
            components: Components::new_with_refreshed_list(),
        }
    }

    /// Current temperature in °C, or `None` if no sensor is readable
    pub fn read(&mut self) -> Option<f64> {
        self.read_thermal_zone().or_else(|| self.read_components())
    }

    fn read_thermal_zone(&self) -> Option<f64> {
        let text = std::fs::read_to_string(&self.path).ok()?;
        parse_millidegrees(&text)
    }

    fn read_components(&mut self) -> Option<f64> {
        self.components.refresh(true);
        self.components
            .iter()
            .find(|c| {
                let label = c.label().to_lowercase();
                label.contains("cpu") || label.contains("package") || label.contains("k10temp")
            })
            .and_then(|c| c.temperature())
            .filter(|t| t.is_finite())
            .map(f64::from)
    }
}

/// Parses a sysfs thermal reading such as `"48312\n"` into 48.312
pub fn parse_millidegrees(text: &str) -> Option<f64> {
    let milli: i64 = text.trim().parse().ok()?;
    Some(milli as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_millidegrees() {
        assert_eq!(parse_millidegrees("48312\n"), Some(48.312));
        assert_eq!(parse_millidegrees("-2000"), Some(-2.0));
        assert_eq!(parse_millidegrees("hot"), None);
        assert_eq!(parse_millidegrees(""), None);
    }

    #[test]
    fn test_reads_thermal_zone_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "51250").unwrap();
        let mut sensor = CpuTempSensor::new(file.path());
        assert_eq!(sensor.read(), Some(51.25));
    }
}
