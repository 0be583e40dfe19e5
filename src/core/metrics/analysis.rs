//! Post-run queueing analysis over logged samples

/// Area under a piecewise-linear curve through `(time, value)` points.
/// Two points at the same time form a step with no area.
pub fn trapezoid(samples: &[(f64, f64)]) -> f64 {
    samples
        .windows(2)
        .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
        .sum()
}

/// Time-weighted mean of the samples over the window they cover, `None`
/// when the window is empty
pub fn time_average(samples: &[(f64, f64)]) -> Option<f64> {
    let (first, last) = (samples.first()?, samples.last()?);
    let window = last.0 - first.0;
    if window <= 0.0 {
        return None;
    }
    Some(trapezoid(samples) / window)
}

/// Average time in queue from Little's Law, `W = L / λ`
pub fn littles_law_wait(average_length: f64, arrival_rate: f64) -> Option<f64> {
    if arrival_rate > 0.0 {
        Some(average_length / arrival_rate)
    } else {
        None
    }
}
