use crate::time_series::WpmSample;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(samples: &[WpmSample], time_limit: Option<u64>) -> (f64, f64) {
    let highest_wpm = samples.iter().map(|p| p.wpm).fold(0.0, f64::max);

    let mut overall_duration = match samples.last() {
        Some(p) => p.t,
        None => time_limit.map(|secs| secs as f64).unwrap_or(1.0),
    };
    if overall_duration < 1.0 {
        overall_duration = 1.0;
    }

    (overall_duration, highest_wpm.round().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
