#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmSample {
    pub t: f64,
    pub wpm: f64,
}

impl WpmSample {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<(f64, f64)> for WpmSample {
    fn from(v: (f64, f64)) -> Self {
        WpmSample { t: v.0, wpm: v.1 }
    }
}

impl From<WpmSample> for (f64, f64) {
    fn from(p: WpmSample) -> Self {
        (p.t, p.wpm)
    }
}

/// Chart points for a per-second WPM history; the first sample sits at t = 1.
pub fn samples(wpm_history: &[u32]) -> Vec<WpmSample> {
    wpm_history
        .iter()
        .enumerate()
        .map(|(i, &wpm)| WpmSample::new((i + 1) as f64, wpm as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_start_at_first_second() {
        let points = samples(&[10, 20, 15]);
        assert_eq!(
            points,
            vec![
                WpmSample::new(1.0, 10.0),
                WpmSample::new(2.0, 20.0),
                WpmSample::new(3.0, 15.0),
            ]
        );
        let tuple: (f64, f64) = points[1].into();
        assert_eq!(tuple, (2.0, 20.0));
    }

    #[test]
    fn empty_history_has_no_samples() {
        assert!(samples(&[]).is_empty());
    }
}
