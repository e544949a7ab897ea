/// Words in the typed input, split on any whitespace.
pub fn word_count(input: &[char]) -> usize {
    input
        .split(|c| c.is_whitespace())
        .filter(|word| !word.is_empty())
        .count()
}

/// Words per minute, rounded. Zero before the first elapsed second.
pub fn wpm(input: &[char], elapsed_secs: u64) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    let minutes = elapsed_secs as f64 / 60.0;
    (word_count(input) as f64 / minutes).round() as u32
}

/// Share of keystrokes that were not mistakes, as a rounded percentage.
/// Zero when nothing has been typed yet.
pub fn accuracy(total_keystrokes: u64, mistakes: u64) -> u32 {
    if total_keystrokes == 0 {
        return 0;
    }
    let correct = total_keystrokes.saturating_sub(mistakes) as f64;
    ((correct / total_keystrokes as f64) * 100.0).round() as u32
}

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Spread of the per-second WPM samples; lower is steadier.
pub fn consistency(wpm_history: &[u32]) -> f64 {
    let samples: Vec<f64> = wpm_history.iter().map(|&w| w as f64).collect();
    std_dev(&samples).unwrap_or(0.0)
}
