/// Latest Wilder RSI over `closes`.
///
/// The first average gain/loss is the plain mean of the first `period` changes; each later
/// change is folded in as `(prev * (period - 1) + current) / period`. A series with no losses
/// reads 100, a series with neither gains nor losses reads 50.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for w in closes[..=period].windows(2) {
        let change = w[1] - w[0];
        if change > 0.0 {
            gain_sum += change;
        } else {
            loss_sum -= change;
        }
    }

    let n = period as f64;
    let mut avg_gain = gain_sum / n;
    let mut avg_loss = loss_sum / n;

    for w in closes[period..].windows(2) {
        let change = w[1] - w[0];
        avg_gain = (avg_gain * (n - 1.0) + change.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-change).max(0.0)) / n;
    }

    Some(rsi_from_averages(avg_gain, avg_loss))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return 50.0;
        }
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
