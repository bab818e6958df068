// src/source/synthetic.rs
use super::HashrateSource;
use crate::types::SampleSource;
use rand::Rng;

const LABEL: &str = "Mock";

/// Uniformly distributed readings in `[base - jitter, base + jitter]` kH/s
///
/// Used for demos and for exercising the display without a miner.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    base_khs: f64,
    jitter_khs: f64,
}

impl SyntheticSource {
    /// Creates a generator centred on `base_khs`
    pub fn new(base_khs: f64, jitter_khs: f64) -> Self {
        SyntheticSource {
            base_khs,
            jitter_khs: jitter_khs.abs(),
        }
    }
}

impl HashrateSource for SyntheticSource {
    fn kind(&self) -> SampleSource {
        SampleSource::Synthetic
    }

    fn poll(&self) -> (f64, String) {
        let lo = self.base_khs - self.jitter_khs;
        let hi = self.base_khs + self.jitter_khs;
        let khs = rand::thread_rng().gen_range(lo..=hi);
        (khs.max(0.0) * 1e3, LABEL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_within_band() {
        let source = SyntheticSource::new(250.0, 25.0);
        for _ in 0..1000 {
            let (hz, label) = source.poll();
            assert!((225e3..=275e3).contains(&hz), "{} out of range", hz);
            assert_eq!(label, "Mock");
        }
    }

    #[test]
    fn test_floored_at_zero() {
        let source = SyntheticSource::new(1.0, 10.0);
        for _ in 0..1000 {
            assert!(source.poll().0 >= 0.0);
        }
    }
}
