use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;

use crate::models::{
    AsrConvention, CalculationMethod, DailyPrayerSchedule, GeoCoordinate, IshaRule, Prayer,
    PrayerTime,
};

const DEG: f64 = std::f64::consts::PI / 180.0;
const RAD: f64 = 180.0 / std::f64::consts::PI;

/// Days-since-epoch reference: noon, 2000-01-01 (J2000).
const J2000: f64 = 2451545.0;

/// Atmospheric refraction plus apparent solar radius, degrees below the
/// geometric horizon at sunrise/sunset.
const HORIZON_DEPRESSION: f64 = 0.833;

/// Solar-position prayer time calculator for one location and settings pair.
///
/// Pure and stateless: every call recomputes from the date. The timezone
/// offset is the resolved UTC offset in minutes for the coordinate's zone on
/// the date in question (the caller owns DST resolution).
#[derive(Debug, Clone)]
pub struct PrayerTimeCalculator {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone_offset_minutes: i32,
    pub method: CalculationMethod,
    pub asr: AsrConvention,
}

impl PrayerTimeCalculator {
    pub fn new(
        coordinate: &GeoCoordinate,
        timezone_offset_minutes: i32,
        method: CalculationMethod,
        asr: AsrConvention,
    ) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            timezone_offset_minutes,
            method,
            asr,
        }
    }

    /// The six instants for the given calendar day, in chronological prayer
    /// order (Fajr, Sunrise, Dhuhr, Asr, Maghrib, Isha).
    pub fn times_for(&self, date: NaiveDate) -> Vec<(Prayer, NaiveDateTime)> {
        let jd = julian_date(date);
        let sun = solar_position(jd);

        // Solar noon in local minutes-of-day.
        let dhuhr = 720.0 - 4.0 * self.longitude - sun.equation_of_time
            + f64::from(self.timezone_offset_minutes);

        let rise_set_offset = self.hour_angle(-HORIZON_DEPRESSION, sun.declination) * 4.0;
        let fajr = dhuhr - self.hour_angle(-self.method.fajr_angle(), sun.declination) * 4.0;
        let sunrise = dhuhr - rise_set_offset;
        let maghrib = dhuhr + rise_set_offset;

        // Asr begins when the shadow of an object exceeds shadow_factor
        // times its height (plus the noon shadow); that shadow length fixes
        // a positive solar altitude.
        let noon_distance = (self.latitude - sun.declination).abs();
        let asr_altitude =
            RAD * (1.0 / (self.asr.shadow_factor() + (noon_distance * DEG).tan())).atan();
        let asr = dhuhr + self.hour_angle(asr_altitude, sun.declination) * 4.0;

        let isha = match self.method.isha_rule() {
            IshaRule::TwilightAngle(angle) => {
                dhuhr + self.hour_angle(-angle, sun.declination) * 4.0
            }
            IshaRule::AfterMaghrib { minutes } => maghrib + minutes as f64,
        };

        let midnight = date.and_time(NaiveTime::MIN);
        let instant =
            |minutes: f64| midnight + Duration::seconds((minutes * 60.0).round() as i64);

        vec![
            (Prayer::Fajr, instant(fajr)),
            (Prayer::Sunrise, instant(sunrise)),
            (Prayer::Dhuhr, instant(dhuhr)),
            (Prayer::Asr, instant(asr)),
            (Prayer::Maghrib, instant(maghrib)),
            (Prayer::Isha, instant(isha)),
        ]
    }

    /// Full schedule for a day with next/passed flags relative to `now`.
    /// The first prayer (in chronological order) whose instant has not yet
    /// passed is marked next; if the whole day has passed, nothing is.
    pub fn daily_schedule(
        &self,
        date: NaiveDate,
        location_label: &str,
        now: NaiveDateTime,
    ) -> DailyPrayerSchedule {
        let mut found_next = false;
        let times = self
            .times_for(date)
            .into_iter()
            .map(|(prayer, time)| {
                let is_passed = time < now;
                let is_next = !is_passed && !found_next;
                if is_next {
                    found_next = true;
                }
                PrayerTime {
                    prayer,
                    time,
                    is_next,
                    is_passed,
                }
            })
            .collect();

        DailyPrayerSchedule {
            date,
            location: location_label.to_string(),
            method: self.method,
            times,
        }
    }

    /// Hour angle in degrees at which the sun reaches the given altitude
    /// (signed: negative below the horizon).
    ///
    /// The cosine argument is clamped to [-1, 1]: at polar latitudes the
    /// requested altitude may never occur, and the clamped angle (0 or 180
    /// degrees) is returned as a best-effort value instead of failing.
    fn hour_angle(&self, altitude: f64, declination: f64) -> f64 {
        let cos_ha = ((altitude * DEG).sin()
            - (self.latitude * DEG).sin() * (declination * DEG).sin())
            / ((self.latitude * DEG).cos() * (declination * DEG).cos());
        if !(-1.0..=1.0).contains(&cos_ha) {
            debug!(
                "hour angle saturated at lat {} for altitude {}",
                self.latitude, altitude
            );
        }
        RAD * cos_ha.clamp(-1.0, 1.0).acos()
    }
}

struct SolarPosition {
    /// Declination of the sun, degrees.
    declination: f64,
    /// Equation of time, minutes.
    equation_of_time: f64,
}

/// Julian date at 0:00 of the given Gregorian calendar day.
fn julian_date(date: NaiveDate) -> f64 {
    let mut y = f64::from(date.year());
    let mut m = f64::from(date.month());
    let d = f64::from(date.day());
    if m <= 2.0 {
        y -= 1.0;
        m += 12.0;
    }
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + d + b - 1524.5
}

/// Low-precision solar ephemeris, good to well under a minute of time.
fn solar_position(jd: f64) -> SolarPosition {
    let d = jd - J2000;
    let g = (357.529 + 0.985_600_28 * d).rem_euclid(360.0); // mean anomaly
    let q = (280.459 + 0.985_647_36 * d).rem_euclid(360.0); // mean longitude
    let l = (q + 1.915 * (g * DEG).sin() + 0.020 * (2.0 * g * DEG).sin()).rem_euclid(360.0);
    let e = 23.439 - 0.000_000_36 * d; // obliquity of the ecliptic

    let declination = RAD * ((e * DEG).sin() * (l * DEG).sin()).asin();

    let mut right_ascension =
        RAD * ((e * DEG).cos() * (l * DEG).sin()).atan2((l * DEG).cos()) / 15.0;
    if right_ascension < 0.0 {
        right_ascension += 24.0;
    }
    // q and ra wrap past 360 degrees / 24 hours on different days, so the
    // raw difference can land a whole day out near the equinoxes. Fold it
    // back into a half-day window.
    let mut equation_of_time = ((q / 15.0 - right_ascension) * 60.0).rem_euclid(1440.0);
    if equation_of_time > 720.0 {
        equation_of_time -= 1440.0;
    }

    SolarPosition {
        declination,
        equation_of_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn new_york(method: CalculationMethod, asr: AsrConvention) -> PrayerTimeCalculator {
        let coord = GeoCoordinate::new(40.7128, -74.0060, "America/New_York").unwrap();
        PrayerTimeCalculator::new(&coord, -240, method, asr)
    }

    fn dt(date: NaiveDate, h: u32, m: u32, s: u32) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    fn assert_close(actual: NaiveDateTime, expected: NaiveDateTime) {
        let diff = (actual - expected).num_seconds().abs();
        assert!(
            diff <= 90,
            "expected {expected} within 90s, got {actual} ({diff}s off)"
        );
    }

    #[test]
    fn new_york_midsummer_isna() {
        let calc = new_york(CalculationMethod::Isna, AsrConvention::Standard);
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let times: std::collections::HashMap<_, _> = calc.times_for(date).into_iter().collect();

        assert_close(times[&Prayer::Fajr], dt(date, 3, 44, 42));
        assert_close(times[&Prayer::Sunrise], dt(date, 5, 24, 16));
        assert_close(times[&Prayer::Dhuhr], dt(date, 12, 56, 29));
        assert_close(times[&Prayer::Asr], dt(date, 16, 56, 38));
        assert_close(times[&Prayer::Maghrib], dt(date, 20, 28, 43));
        assert_close(times[&Prayer::Isha], dt(date, 22, 8, 17));
    }

    #[test]
    fn new_york_march_equinox_isna() {
        // Near the equinox the solar mean longitude and the right ascension
        // wrap on different days; a raw difference once pushed every
        // instant onto the previous calendar day.
        let calc = new_york(CalculationMethod::Isna, AsrConvention::Standard);
        let date = NaiveDate::from_ymd_opt(2025, 3, 21).unwrap();
        let times: std::collections::HashMap<_, _> = calc.times_for(date).into_iter().collect();

        for (prayer, time) in &times {
            assert_eq!(time.date(), date, "{prayer:?} landed at {time}");
        }
        assert_close(times[&Prayer::Fajr], dt(date, 5, 42, 30));
        assert_close(times[&Prayer::Sunrise], dt(date, 6, 58, 1));
        assert_close(times[&Prayer::Dhuhr], dt(date, 13, 3, 16));
        assert_close(times[&Prayer::Asr], dt(date, 16, 29, 11));
        assert_close(times[&Prayer::Maghrib], dt(date, 19, 8, 31));
        assert_close(times[&Prayer::Isha], dt(date, 20, 24, 3));
    }

    #[test]
    fn hanafi_asr_is_later() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let standard = new_york(CalculationMethod::Isna, AsrConvention::Standard);
        let hanafi = new_york(CalculationMethod::Isna, AsrConvention::Hanafi);

        let std_asr = standard.times_for(date)[3].1;
        let hanafi_asr = hanafi.times_for(date)[3].1;
        assert!(hanafi_asr > std_asr);
        assert_close(hanafi_asr, dt(date, 18, 10, 31));
    }

    #[test]
    fn dhuhr_ignores_method_and_asr_convention() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let reference = new_york(CalculationMethod::Isna, AsrConvention::Standard).times_for(date)[2].1;
        for method in CalculationMethod::ALL {
            for asr in [AsrConvention::Standard, AsrConvention::Hanafi] {
                let dhuhr = new_york(method, asr).times_for(date)[2].1;
                assert_eq!(dhuhr, reference);
            }
        }
    }

    #[test]
    fn umm_al_qura_isha_is_ninety_minutes_after_maghrib() {
        let coord = GeoCoordinate::mecca();
        let calc = PrayerTimeCalculator::new(
            &coord,
            180,
            CalculationMethod::UmmAlQura,
            AsrConvention::Standard,
        );
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let times = calc.times_for(date);
        let maghrib = times[4].1;
        let isha = times[5].1;
        assert_eq!(isha - maghrib, Duration::minutes(90));
        assert_close(maghrib, dt(date, 17, 55, 38));
    }

    #[test]
    fn polar_latitude_still_yields_times() {
        // Above the arctic circle at midsummer the twilight angles never
        // occur; the clamp keeps the result finite rather than NaN.
        let coord = GeoCoordinate::new(78.2232, 15.6267, "Arctic/Longyearbyen").unwrap();
        let calc = PrayerTimeCalculator::new(
            &coord,
            120,
            CalculationMethod::Mwl,
            AsrConvention::Standard,
        );
        let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        let midnight = date.and_time(NaiveTime::MIN);
        for (prayer, time) in calc.times_for(date) {
            // A saturated hour angle pins the offset at +/- 720 minutes,
            // so every instant stays within a day of local midnight.
            let offset = (time - midnight).num_minutes();
            assert!(
                offset.abs() <= 36 * 60,
                "{prayer:?} at {time} outside clamp range"
            );
        }
    }

    #[test]
    fn schedule_marks_single_next_prayer() {
        let calc = new_york(CalculationMethod::Isna, AsrConvention::Standard);
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        // Mid-afternoon: Fajr through Dhuhr passed, Asr next.
        let schedule = calc.daily_schedule(date, "New York", dt(date, 14, 0, 0));
        let next = schedule.next_prayer().unwrap();
        assert_eq!(next.prayer, Prayer::Asr);
        assert_eq!(schedule.times.iter().filter(|t| t.is_next).count(), 1);
        assert_eq!(schedule.times.iter().filter(|t| t.is_passed).count(), 3);
        assert!(schedule.get(Prayer::Fajr).unwrap().is_passed);
        assert!(!schedule.get(Prayer::Isha).unwrap().is_passed);

        // Just before midnight: everything passed, nothing next.
        let late = calc.daily_schedule(date, "New York", dt(date, 23, 59, 0));
        assert!(late.next_prayer().is_none());
        assert!(late.times.iter().all(|t| t.is_passed));
    }

    fn method_strategy() -> impl Strategy<Value = CalculationMethod> {
        prop::sample::select(CalculationMethod::ALL.to_vec())
    }

    proptest! {
        // Within temperate latitudes the six instants are strictly ordered
        // for every method and convention.
        #[test]
        fn prayer_order_is_monotonic(
            lat in -65.0..65.0f64,
            lon in -179.0..179.0f64,
            day_offset in 0u32..365,
            method in method_strategy(),
            hanafi in any::<bool>(),
        ) {
            let coord = GeoCoordinate::new(lat, lon, "UTC").unwrap();
            let asr = if hanafi { AsrConvention::Hanafi } else { AsrConvention::Standard };
            let calc = PrayerTimeCalculator::new(&coord, 0, method, asr);
            let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                + Duration::days(i64::from(day_offset));

            let times = calc.times_for(date);
            for pair in times.windows(2) {
                prop_assert!(
                    pair[0].1 < pair[1].1,
                    "{:?} at {} not before {:?} at {}",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                );
            }
        }

        #[test]
        fn hanafi_never_earlier_than_standard(
            lat in -65.0..65.0f64,
            day_offset in 0u32..365,
        ) {
            let coord = GeoCoordinate::new(lat, 0.0, "UTC").unwrap();
            let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                + Duration::days(i64::from(day_offset));
            let standard = PrayerTimeCalculator::new(
                &coord, 0, CalculationMethod::Mwl, AsrConvention::Standard,
            ).times_for(date)[3].1;
            let hanafi = PrayerTimeCalculator::new(
                &coord, 0, CalculationMethod::Mwl, AsrConvention::Hanafi,
            ).times_for(date)[3].1;
            prop_assert!(hanafi > standard);
        }
    }
}
