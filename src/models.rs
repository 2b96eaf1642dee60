use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latitude of the Kaaba in Mecca, the qibla reference point.
pub const KAABA_LATITUDE: f64 = 21.4225;
/// Longitude of the Kaaba.
pub const KAABA_LONGITUDE: f64 = 39.8262;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Observer location. The timezone is an IANA identifier carried for the
/// caller's benefit; the calculators themselves take a resolved UTC offset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl GeoCoordinate {
    pub fn new(
        latitude: f64,
        longitude: f64,
        timezone: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
            timezone: timezone.into(),
        })
    }

    pub fn mecca() -> Self {
        Self {
            latitude: KAABA_LATITUDE,
            longitude: KAABA_LONGITUDE,
            timezone: "Asia/Riyadh".to_string(),
        }
    }
}

/// How Isha is derived for a given calculation method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IshaRule {
    /// Sun this many degrees below the horizon.
    TwilightAngle(f64),
    /// Fixed offset after Maghrib (Umm al-Qura convention).
    AfterMaghrib { minutes: i64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    Isna,
    Mwl,
    Egypt,
    UmmAlQura,
    Karachi,
    Tehran,
}

impl CalculationMethod {
    pub const ALL: [CalculationMethod; 6] = [
        CalculationMethod::Isna,
        CalculationMethod::Mwl,
        CalculationMethod::Egypt,
        CalculationMethod::UmmAlQura,
        CalculationMethod::Karachi,
        CalculationMethod::Tehran,
    ];

    /// Degrees of solar depression marking the start of Fajr.
    pub fn fajr_angle(&self) -> f64 {
        match self {
            CalculationMethod::Isna => 15.0,
            CalculationMethod::Mwl => 18.0,
            CalculationMethod::Egypt => 19.5,
            CalculationMethod::UmmAlQura => 18.5,
            CalculationMethod::Karachi => 18.0,
            CalculationMethod::Tehran => 17.7,
        }
    }

    pub fn isha_rule(&self) -> IshaRule {
        match self {
            CalculationMethod::Isna => IshaRule::TwilightAngle(15.0),
            CalculationMethod::Mwl => IshaRule::TwilightAngle(17.0),
            CalculationMethod::Egypt => IshaRule::TwilightAngle(17.5),
            CalculationMethod::UmmAlQura => IshaRule::AfterMaghrib { minutes: 90 },
            CalculationMethod::Karachi => IshaRule::TwilightAngle(18.0),
            CalculationMethod::Tehran => IshaRule::TwilightAngle(14.0),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CalculationMethod::Isna => "ISNA (North America)",
            CalculationMethod::Mwl => "Muslim World League",
            CalculationMethod::Egypt => "Egyptian General Authority",
            CalculationMethod::UmmAlQura => "Umm al-Qura (Saudi Arabia)",
            CalculationMethod::Karachi => "University of Islamic Sciences, Karachi",
            CalculationMethod::Tehran => "Institute of Geophysics, Tehran",
        }
    }
}

/// Juristic convention for the Asr shadow-length threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AsrConvention {
    /// Shafi'i, Maliki, Hanbali: shadow equals object height.
    Standard,
    /// Shadow equals twice the object height.
    Hanafi,
}

impl AsrConvention {
    pub fn shadow_factor(&self) -> f64 {
        match self {
            AsrConvention::Standard => 1.0,
            AsrConvention::Hanafi => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Prayer {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    /// All six instants in chronological order. Sunrise is included as a
    /// reference time even though it is not a prayer obligation.
    pub const ALL: [Prayer; 6] = [
        Prayer::Fajr,
        Prayer::Sunrise,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    pub fn is_obligatory(&self) -> bool {
        !matches!(self, Prayer::Sunrise)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Sunrise => "Sunrise",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }
}

/// One computed prayer instant with its position relative to "now".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrayerTime {
    pub prayer: Prayer,
    pub time: NaiveDateTime,
    pub is_next: bool,
    pub is_passed: bool,
}

/// The full set of instants for one calendar day. Recomputed whenever the
/// date, location, or method changes; never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyPrayerSchedule {
    pub date: NaiveDate,
    pub location: String,
    pub method: CalculationMethod,
    pub times: Vec<PrayerTime>,
}

impl DailyPrayerSchedule {
    pub fn get(&self, prayer: Prayer) -> Option<&PrayerTime> {
        self.times.iter().find(|t| t.prayer == prayer)
    }

    pub fn next_prayer(&self) -> Option<&PrayerTime> {
        self.times.iter().find(|t| t.is_next)
    }
}

/// Eight-point compass rose for qibla display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CompassOctant {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QiblaDirection {
    pub degrees: f64,
    pub compass: CompassOctant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowLevel {
    None,
    Spotting,
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Cramps,
    Headache,
    Fatigue,
    Bloating,
    BreastTenderness,
    Backache,
    Nausea,
    Acne,
    Insomnia,
    HotFlashes,
    Constipation,
    Diarrhea,
    AppetiteIncrease,
    AppetiteDecrease,
    Dizziness,
    JointPain,
    MuscleAches,
}

impl Symptom {
    pub fn physical() -> Vec<Symptom> {
        vec![
            Symptom::Cramps,
            Symptom::Headache,
            Symptom::Fatigue,
            Symptom::Bloating,
            Symptom::BreastTenderness,
            Symptom::Backache,
            Symptom::Nausea,
            Symptom::Acne,
            Symptom::Insomnia,
            Symptom::HotFlashes,
        ]
    }

    pub fn digestive() -> Vec<Symptom> {
        vec![
            Symptom::Constipation,
            Symptom::Diarrhea,
            Symptom::AppetiteIncrease,
            Symptom::AppetiteDecrease,
        ]
    }

    pub fn other() -> Vec<Symptom> {
        vec![Symptom::Dizziness, Symptom::JointPain, Symptom::MuscleAches]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Calm,
    Energetic,
    Focused,
    Anxious,
    Irritable,
    Sad,
    Moody,
    Overwhelmed,
    Neutral,
}

impl Mood {
    pub fn positive() -> Vec<Mood> {
        vec![Mood::Happy, Mood::Calm, Mood::Energetic, Mood::Focused]
    }

    pub fn negative() -> Vec<Mood> {
        vec![
            Mood::Anxious,
            Mood::Irritable,
            Mood::Sad,
            Mood::Moody,
            Mood::Overwhelmed,
        ]
    }
}

/// One day of logged cycle data. The date is the upsert key: the caller
/// keeps at most one entry per user per day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub flow: Option<FlowLevel>,
    pub symptoms: Vec<Symptom>,
    pub mood: Option<Mood>,
    pub pain_level: Option<u8>,
    pub notes: Option<String>,
}

impl CycleLogEntry {
    pub fn new(user_id: Uuid, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            flow: None,
            symptoms: Vec::new(),
            mood: None,
            pain_level: None,
            notes: None,
        }
    }

    pub fn with_flow(mut self, flow: FlowLevel) -> Self {
        self.flow = Some(flow);
        self
    }

    /// Pain is kept on a 0-10 scale.
    pub fn with_pain_level(mut self, level: u8) -> Self {
        self.pain_level = Some(level.min(10));
        self
    }

    pub fn is_period_day(&self) -> bool {
        self.flow.map_or(false, |f| f != FlowLevel::None)
    }
}

/// A completed cycle inferred from the log history. Only cycles whose
/// successor start is known are ever emitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetectedCycle {
    pub start_date: NaiveDate,
    /// Days from this cycle's start to the next cycle's start.
    pub cycle_length: i64,
    /// Count of contiguous period-flagged days opening the cycle.
    pub period_length: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CyclePrediction {
    pub predicted_start: NaiveDate,
    pub predicted_end: NaiveDate,
    pub predicted_ovulation: NaiveDate,
    pub confidence: Confidence,
    pub algorithm_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleStatistics {
    pub average_cycle_length: f64,
    pub average_period_length: f64,
    /// 0-100, derived from the spread of completed-cycle lengths.
    pub regularity: f64,
    pub completed_cycles: usize,
    pub total_logs: usize,
}

impl CycleStatistics {
    pub fn is_regular(&self) -> bool {
        self.regularity >= 80.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl CyclePhase {
    /// Phase for a 1-based cycle day, with ovulation pinned 14 days before
    /// the expected cycle end.
    pub fn for_day(day: u32, cycle_length: u32) -> CyclePhase {
        let ovulation = cycle_length.saturating_sub(14);
        if day <= 5 {
            CyclePhase::Menstrual
        } else if day + 2 < ovulation {
            CyclePhase::Follicular
        } else if day <= ovulation + 2 {
            CyclePhase::Ovulation
        } else {
            CyclePhase::Luteal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert_eq!(
            GeoCoordinate::new(91.0, 0.0, "UTC"),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            GeoCoordinate::new(0.0, -181.0, "UTC"),
            Err(CoordinateError::LongitudeOutOfRange(-181.0))
        );
        assert!(GeoCoordinate::new(-90.0, 180.0, "UTC").is_ok());
    }

    #[test]
    fn umm_al_qura_uses_fixed_isha_offset() {
        assert_eq!(
            CalculationMethod::UmmAlQura.isha_rule(),
            IshaRule::AfterMaghrib { minutes: 90 }
        );
        for method in CalculationMethod::ALL {
            if method != CalculationMethod::UmmAlQura {
                assert!(matches!(method.isha_rule(), IshaRule::TwilightAngle(a) if a > 0.0));
            }
        }
    }

    #[test]
    fn sunrise_is_not_obligatory() {
        assert!(!Prayer::Sunrise.is_obligatory());
        assert_eq!(Prayer::ALL.iter().filter(|p| p.is_obligatory()).count(), 5);
    }

    #[test]
    fn pain_level_is_capped() {
        let user = Uuid::new_v4();
        let entry = CycleLogEntry::new(user, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
            .with_pain_level(14);
        assert_eq!(entry.pain_level, Some(10));
    }

    #[test]
    fn spotting_counts_as_period_day() {
        let user = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let none = CycleLogEntry::new(user, date).with_flow(FlowLevel::None);
        let spotting = CycleLogEntry::new(user, date).with_flow(FlowLevel::Spotting);
        assert!(!none.is_period_day());
        assert!(!CycleLogEntry::new(user, date).is_period_day());
        assert!(spotting.is_period_day());
    }

    #[test]
    fn phase_for_standard_cycle() {
        assert_eq!(CyclePhase::for_day(3, 28), CyclePhase::Menstrual);
        assert_eq!(CyclePhase::for_day(8, 28), CyclePhase::Follicular);
        assert_eq!(CyclePhase::for_day(14, 28), CyclePhase::Ovulation);
        assert_eq!(CyclePhase::for_day(20, 28), CyclePhase::Luteal);
    }

    #[test]
    fn log_entry_serializes_snake_case() {
        let user = Uuid::new_v4();
        let entry = CycleLogEntry::new(user, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
            .with_flow(FlowLevel::Heavy);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"heavy\""));
        assert!(json.contains("\"user_id\""));
    }
}
