//! Time sources and the academy (tenant) context that evaluates calendar dates.
//!
//! All instants are handled as UTC. The academy timezone only matters when a
//! calendar day has to be turned into a range of instants ("today", date filters).

use crate::error::Error;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use entity::{academies, Id};
use log::*;
use sea_orm::DatabaseConnection;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The academy a request runs for, passed explicitly to every operation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcademyContext {
    pub academy_id: Option<Id>,
    pub timezone: Tz,
}

impl AcademyContext {
    pub fn new(academy_id: Option<Id>, timezone: Tz) -> Self {
        Self {
            academy_id,
            timezone,
        }
    }

    /// Uses the academy's own timezone, falling back to `default_timezone` and then UTC
    /// when either is missing or not a known IANA name.
    pub fn from_academy(academy: Option<&academies::Model>, default_timezone: &str) -> Self {
        let timezone = academy
            .and_then(|academy| academy.timezone.as_deref())
            .and_then(|name| parse_timezone(name))
            .or_else(|| parse_timezone(default_timezone))
            .unwrap_or(Tz::UTC);

        Self {
            academy_id: academy.map(|academy| academy.id),
            timezone,
        }
    }

    pub async fn load(
        db: &DatabaseConnection,
        academy_id: Option<Id>,
        default_timezone: &str,
    ) -> Result<Self, Error> {
        let academy = match academy_id {
            Some(id) => entity_api::academy::find_by_id(db, id).await?,
            None => None,
        };

        let mut context = Self::from_academy(academy.as_ref(), default_timezone);
        // Keep the requested id even if the academy row is gone so scoping stays strict.
        context.academy_id = academy_id;
        Ok(context)
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// First instant of `date` in the academy timezone.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        // A DST gap at midnight starts the day when the gap ends
        std::iter::once(midnight)
            .chain(midnight.checked_add_signed(TimeDelta::hours(1)))
            .find_map(|local| self.timezone.from_local_datetime(&local).earliest())
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }

    /// `[start, end)` covering the academy-local calendar day of `instant`.
    pub fn day_bounds(&self, instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let date = self.local_date(instant);
        let next = date.succ_opt().unwrap_or(date);
        (self.start_of_day(date), self.start_of_day(next))
    }
}

/// `at` moved by `minutes`, pinned to the representable range instead of overflowing.
pub(crate) fn offset_minutes(at: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    TimeDelta::try_minutes(minutes)
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(if minutes < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

fn parse_timezone(name: &str) -> Option<Tz> {
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            warn!("Unknown timezone {name:?}, ignoring it");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn academy(timezone: Option<&str>) -> academies::Model {
        let now = Utc::now();
        academies::Model {
            id: 3,
            name: "Academy".to_string(),
            timezone: timezone.map(str::to_string),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn academy_timezone_wins_over_the_default() {
        let context = AcademyContext::from_academy(Some(&academy(Some("Africa/Cairo"))), "Asia/Riyadh");

        assert_eq!(context.timezone, chrono_tz::Africa::Cairo);
        assert_eq!(context.academy_id, Some(3));
    }

    #[test]
    fn unknown_timezones_fall_back_to_the_default() {
        let context = AcademyContext::from_academy(Some(&academy(Some("Mars/Olympus"))), "Asia/Riyadh");
        assert_eq!(context.timezone, chrono_tz::Asia::Riyadh);

        let context = AcademyContext::from_academy(None, "nowhere");
        assert_eq!(context.timezone, Tz::UTC);
        assert_eq!(context.academy_id, None);
    }

    #[test]
    fn day_bounds_follow_the_academy_calendar() {
        // 22:30 UTC on Jan 1st is already Jan 2nd in Riyadh (UTC+3)
        let context = AcademyContext::new(None, chrono_tz::Asia::Riyadh);
        let instant = Utc.with_ymd_and_hms(2025, 1, 1, 22, 30, 0).unwrap();

        let (start, end) = context.day_bounds(instant);

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 1, 21, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 2, 21, 0, 0).unwrap());
    }

    #[test]
    fn day_skipping_midnight_starts_when_the_dst_gap_ends() {
        // Havana jumps from 00:00 to 01:00 (UTC-4) on 2024-03-10
        let context = AcademyContext::new(None, chrono_tz::America::Havana);
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        assert_eq!(
            context.start_of_day(date),
            Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap()
        );
        let (_, end_of_previous_day) = context.day_bounds(Utc.with_ymd_and_hms(2024, 3, 9, 18, 0, 0).unwrap());
        assert_eq!(end_of_previous_day, context.start_of_day(date));
    }

    #[test]
    fn offset_minutes_saturates_instead_of_overflowing() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();

        assert_eq!(
            offset_minutes(instant, 90),
            Utc.with_ymd_and_hms(2025, 1, 1, 11, 30, 0).unwrap()
        );
        assert_eq!(offset_minutes(instant, i64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(offset_minutes(instant, i64::MIN), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn fixed_clock_always_returns_its_instant() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant);
    }
}
