//! The remote calendar: a [`CalendarService`] trait the sync logic talks to,
//! the Google Calendar v3 implementation, and how it gets its tokens.

mod auth;
mod google;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

pub use auth::{AuthStrategy, Authenticator, TokenSource};
pub use google::GoogleCalendar;

use crate::{
    event::{local_datetime, CalendarEvent},
    fetch::{range_end, Direction},
};

/// Half-open `[start, end)` filter for listing events.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeWindow {
    /// Local midnights bounding the days [`crate::fetch::date_iter`] yields
    /// for the same arguments.
    pub fn days(start: NaiveDate, count: u32, direction: Direction) -> crate::Result<Self> {
        let end = range_end(start, count, direction)?;
        let (first, last) = match direction {
            Direction::Forward => (start, end),
            Direction::Backward => (end, start),
        };
        Ok(Self {
            start: local_datetime(first, NaiveTime::MIN),
            end: local_datetime(last, NaiveTime::MIN),
        })
    }
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Creates the event and returns its remote id.
    async fn insert(&self, calendar_id: &str, event: &CalendarEvent) -> crate::Result<String>;

    /// Ids of every event in the window, or on the whole calendar for `None`,
    /// across all result pages.
    async fn list_event_ids(
        &self,
        calendar_id: &str,
        window: Option<TimeWindow>,
    ) -> crate::Result<Vec<String>>;

    async fn delete(&self, calendar_id: &str, event_id: &str) -> crate::Result<()>;
}
