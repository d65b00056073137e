use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::Serialize;

use crate::parse::{Meal, MealRecord};

pub const TIME_ZONE: &str = "America/Sao_Paulo";
pub const LOCATION: &str =
    "R. Saturnino de Brito - Cidade Universitária, Campinas - SP, 13083-889";
pub const REMINDER_MINUTES: u32 = 10;

/// Campinas has kept UTC-3 all year since 2019.
const UTC_OFFSET_SECS: i32 = 3 * 3600;

pub fn local_offset() -> FixedOffset {
    FixedOffset::west_opt(UTC_OFFSET_SECS).expect("UTC-3 is a valid offset")
}

pub fn local_datetime(date: NaiveDate, time: NaiveTime) -> DateTime<FixedOffset> {
    local_offset()
        .from_local_datetime(&date.and_time(time))
        .single()
        .expect("fixed offsets map local times one to one")
}

/// Opening and closing time of the service.
pub fn service_hours(meal: Meal) -> (NaiveTime, NaiveTime) {
    let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("service hours are valid times");
    match meal {
        Meal::Lunch => (hm(11, 0), hm(14, 0)),
        Meal::Dinner => (hm(17, 30), hm(19, 0)),
    }
}

/// Google Calendar v3 event resource, as much as we send of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub reminders: Reminders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: DateTime<FixedOffset>,
    pub time_zone: String,
}

impl EventDateTime {
    fn local(date_time: DateTime<FixedOffset>) -> Self {
        Self {
            date_time,
            time_zone: TIME_ZONE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    pub overrides: Vec<ReminderOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

impl CalendarEvent {
    pub fn from_meal(meal: &MealRecord) -> Self {
        let (opens, closes) = service_hours(meal.slot.meal);
        let lines: [&str; 5] = [
            &meal.main_course,
            &meal.side_dish,
            &meal.salad,
            &meal.dessert,
            &meal.juice,
        ];

        Self {
            summary: meal.slot.name().to_owned(),
            location: LOCATION.to_owned(),
            description: lines.join("\n"),
            start: EventDateTime::local(local_datetime(meal.date, opens)),
            end: EventDateTime::local(local_datetime(meal.date, closes)),
            reminders: Reminders {
                use_default: false,
                overrides: vec![ReminderOverride {
                    method: "popup".to_owned(),
                    minutes: REMINDER_MINUTES,
                }],
            },
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date_time.date_naive()
    }
}
