use chrono::{Duration, NaiveDate};
use log::debug;

use crate::models::{
    Confidence, CycleLogEntry, CyclePrediction, CycleStatistics, DetectedCycle,
};

/// Tag stamped on every prediction batch.
pub const ALGORITHM_VERSION: &str = "v1";

/// Flagged days further apart than this start a new cycle.
const CYCLE_GAP_TOLERANCE_DAYS: i64 = 3;

/// Fallbacks reported while fewer than two completed cycles exist.
const DEFAULT_CYCLE_LENGTH: f64 = 28.0;
const DEFAULT_PERIOD_LENGTH: f64 = 5.0;

/// Weighted moving average over at most this many recent cycles, most
/// recent first. The weighted sum is divided by the weight actually
/// consumed, not by 1.0, when fewer than six cycles exist.
const RECENT_CYCLE_WINDOW: usize = 6;
const PREDICTION_WEIGHTS: [f64; 6] = [0.30, 0.25, 0.20, 0.12, 0.08, 0.05];

const PREDICTION_HORIZON: usize = 3;
/// Ovulation estimated this many days before a predicted start.
const OVULATION_OFFSET_DAYS: i64 = 14;

/// Segment the log history into completed cycles.
///
/// Period-flagged days are sorted ascending and walked as runs; a gap of
/// more than three days closes the current cycle, its length being the day
/// count to the next run's first day. The trailing open run has no known
/// successor start and is never emitted.
pub fn detect_cycles(logs: &[CycleLogEntry]) -> Vec<DetectedCycle> {
    let mut period_days: Vec<NaiveDate> = logs
        .iter()
        .filter(|l| l.is_period_day())
        .map(|l| l.date)
        .collect();
    period_days.sort();
    period_days.dedup();

    let mut cycles = Vec::new();
    let Some(&first) = period_days.first() else {
        return cycles;
    };

    let mut cycle_start = first;
    let mut run_length: i64 = 1;
    let mut previous = first;

    for &day in &period_days[1..] {
        if (day - previous).num_days() > CYCLE_GAP_TOLERANCE_DAYS {
            cycles.push(DetectedCycle {
                start_date: cycle_start,
                cycle_length: (day - cycle_start).num_days(),
                period_length: run_length,
            });
            cycle_start = day;
            run_length = 1;
        } else {
            run_length += 1;
        }
        previous = day;
    }

    cycles
}

/// Descriptive statistics over the full history. With fewer than two
/// completed cycles this reports the 28/5 placeholder with zero regularity
/// instead of failing, signalling "not enough history".
pub fn cycle_statistics(logs: &[CycleLogEntry]) -> CycleStatistics {
    let cycles = detect_cycles(logs);
    if cycles.len() < 2 {
        debug!("{} completed cycles, reporting placeholder stats", cycles.len());
        return CycleStatistics {
            average_cycle_length: DEFAULT_CYCLE_LENGTH,
            average_period_length: DEFAULT_PERIOD_LENGTH,
            regularity: 0.0,
            completed_cycles: 0,
            total_logs: logs.len(),
        };
    }

    let lengths: Vec<f64> = cycles.iter().map(|c| c.cycle_length as f64).collect();
    let period_lengths: Vec<f64> = cycles.iter().map(|c| c.period_length as f64).collect();
    let average_cycle_length = mean(&lengths);

    CycleStatistics {
        average_cycle_length,
        average_period_length: mean(&period_lengths),
        regularity: (100.0 - spread(&lengths, average_cycle_length) * 10.0).clamp(0.0, 100.0),
        completed_cycles: cycles.len(),
        total_logs: logs.len(),
    }
}

/// Forecast the next three cycle starts with a weighted moving average of
/// recent cycle lengths. Empty with fewer than two completed cycles.
pub fn predict(logs: &[CycleLogEntry]) -> Vec<CyclePrediction> {
    let cycles = detect_cycles(logs);
    if cycles.len() < 2 {
        debug!("insufficient cycle history for prediction");
        return Vec::new();
    }
    let Some(last) = cycles.last() else {
        return Vec::new();
    };

    let recent = &cycles[cycles.len().saturating_sub(RECENT_CYCLE_WINDOW)..];

    let mut weighted_sum = 0.0;
    let mut weight_used = 0.0;
    for (i, cycle) in recent.iter().rev().enumerate() {
        let weight = PREDICTION_WEIGHTS.get(i).copied().unwrap_or(0.05);
        weighted_sum += cycle.cycle_length as f64 * weight;
        weight_used += weight;
    }
    let predicted_length = weighted_sum / weight_used;

    let lengths: Vec<f64> = recent.iter().map(|c| c.cycle_length as f64).collect();
    let std_dev = spread(&lengths, predicted_length);
    let confidence = if std_dev < 3.0 {
        Confidence::High
    } else if std_dev < 7.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    let step = Duration::days(predicted_length.round() as i64);
    let mut start = last.start_date;
    (0..PREDICTION_HORIZON)
        .map(|_| {
            start += step;
            CyclePrediction {
                predicted_start: start,
                predicted_end: start + Duration::days(DEFAULT_PERIOD_LENGTH as i64),
                predicted_ovulation: start - Duration::days(OVULATION_OFFSET_DAYS),
                confidence,
                algorithm_version: ALGORITHM_VERSION.to_string(),
            }
        })
        .collect()
}

/// 1-based day within the ongoing cycle, counted from the first day of the
/// most recent period run. None without any period-flagged day.
pub fn current_cycle_day(logs: &[CycleLogEntry], today: NaiveDate) -> Option<u32> {
    let mut period_days: Vec<NaiveDate> = logs
        .iter()
        .filter(|l| l.is_period_day())
        .map(|l| l.date)
        .collect();
    period_days.sort();
    period_days.dedup();

    let mut run_start = *period_days.first()?;
    for pair in period_days.windows(2) {
        if (pair[1] - pair[0]).num_days() > CYCLE_GAP_TOLERANCE_DAYS {
            run_start = pair[1];
        }
    }

    let day = (today - run_start).num_days() + 1;
    u32::try_from(day).ok().filter(|d| *d >= 1)
}

/// Days from `today` to the first predicted start, negative if overdue.
pub fn days_until_next_period(predictions: &[CyclePrediction], today: NaiveDate) -> Option<i64> {
    predictions
        .first()
        .map(|p| (p.predicted_start - today).num_days())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Root mean squared deviation of `values` around `center` (population form).
fn spread(values: &[f64], center: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - center).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
