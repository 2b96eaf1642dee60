//! Computational core for a prayer-times and cycle-tracking app.
//!
//! Three independent, stateless components: solar-position prayer time
//! calculation, great-circle qibla bearing, and menstrual-cycle statistics
//! with a weighted moving-average forecast. Everything here is a pure
//! function over plain values; persistence, networking, notification
//! scheduling, and display all live with the caller.

pub mod models;
pub mod prayer;
pub mod prediction;
pub mod qibla;

pub use models::{
    AsrConvention, CalculationMethod, CompassOctant, Confidence, CoordinateError, CycleLogEntry,
    CyclePhase, CyclePrediction, CycleStatistics, DailyPrayerSchedule, DetectedCycle, FlowLevel,
    GeoCoordinate, IshaRule, Mood, Prayer, PrayerTime, QiblaDirection, Symptom,
};
pub use prayer::PrayerTimeCalculator;
pub use prediction::{
    current_cycle_day, cycle_statistics, days_until_next_period, detect_cycles, predict,
    ALGORITHM_VERSION,
};
pub use qibla::qibla_direction;
