/// Trailing simple moving average. `None` until `window` closes are
/// available, and everywhere when `window` is zero or longer than the input.
pub fn moving_average(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || window > closes.len() {
        return vec![None; closes.len()];
    }

    let mut averages = Vec::with_capacity(closes.len());
    averages.extend(std::iter::repeat(None).take(window - 1));

    let mut sum: f64 = closes[..window].iter().sum();
    averages.push(Some(sum / window as f64));

    for i in window..closes.len() {
        sum = sum - closes[i - window] + closes[i];
        averages.push(Some(sum / window as f64));
    }

    averages
}
