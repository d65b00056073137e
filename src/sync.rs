use chrono::NaiveDate;
use log::{debug, error, info, warn};

use crate::{
    calendar::{CalendarService, TimeWindow},
    config::CalendarIds,
    event::CalendarEvent,
    fetch::{date_iter, Direction},
    hash::hash_meal,
    ledger::{Ledger, Lookup},
    parse::{Diet, Meal, MealRecord, MealSlot},
    source::MenuSource,
    Error,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new event was created with this id.
    Created(String),
    /// The ledger already has this exact menu.
    Unchanged,
    /// The ledger has a different menu for the slot; nothing was written.
    NeedsUpdate,
    /// No menu published for the slot.
    NoMenu,
}

/// Tally of a multi-day operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeReport {
    pub created: Vec<String>,
    pub unchanged: usize,
    pub needs_update: usize,
    pub no_menu: usize,
    pub failed: usize,
}

impl RangeReport {
    fn record(&mut self, date: NaiveDate, slot: MealSlot, outcome: crate::Result<SyncOutcome>) {
        match outcome {
            Ok(SyncOutcome::Created(id)) => self.created.push(id),
            Ok(SyncOutcome::Unchanged) => self.unchanged += 1,
            Ok(SyncOutcome::NeedsUpdate) => self.needs_update += 1,
            Ok(SyncOutcome::NoMenu) => self.no_menu += 1,
            Err(e) => {
                error!("{slot} on {date} failed: {e}");
                self.failed += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub deleted: DeleteReport,
    pub lunch: RangeReport,
    pub dinner: RangeReport,
}

/// Keeps a calendar per diet in step with the published menus.
pub struct Synchronizer<M, C> {
    menu: M,
    calendar: C,
    ledger: Ledger,
    calendars: CalendarIds,
}

impl<M: MenuSource, C: CalendarService> Synchronizer<M, C> {
    pub fn new(menu: M, calendar: C, ledger: Ledger, calendars: CalendarIds) -> Self {
        Self {
            menu,
            calendar,
            ledger,
            calendars,
        }
    }

    async fn fetch(&self, date: NaiveDate, slot: MealSlot) -> crate::Result<Option<MealRecord>> {
        match self.menu.meal(date, slot).await {
            Ok(record) => Ok(Some(record)),
            Err(Error::MenuNotFound(_)) => {
                debug!("No {slot} menu for {date}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Creates the event, then records it. A ledger failure after a
    /// successful create is only logged, the event id is still returned.
    async fn create_and_record(&mut self, record: &MealRecord) -> crate::Result<String> {
        let (key, hash) = hash_meal(record);
        let event = CalendarEvent::from_meal(record);
        let calendar_id = self.calendars.for_diet(record.slot.diet);
        let id = self.calendar.insert(calendar_id, &event).await?;
        info!("Event {} created for date: {}", event.summary, event.date());
        if let Err(e) = self.ledger.append(&key, &hash).await {
            warn!("Created {key} but could not record it in the ledger: {e}");
        }
        Ok(id)
    }

    /// Creates the event only when the ledger has never seen the slot.
    pub async fn sync_one(
        &mut self,
        date: NaiveDate,
        meal: Meal,
        diet: Diet,
    ) -> crate::Result<SyncOutcome> {
        let slot = MealSlot::new(meal, diet);
        let Some(record) = self.fetch(date, slot).await? else {
            return Ok(SyncOutcome::NoMenu);
        };
        let (key, hash) = hash_meal(&record);
        match self.ledger.lookup(&key, &hash).await? {
            Lookup::Absent => self
                .create_and_record(&record)
                .await
                .map(SyncOutcome::Created),
            Lookup::Stale => {
                warn!("Meal {key} needs to be updated.");
                Ok(SyncOutcome::NeedsUpdate)
            }
            Lookup::Match => {
                debug!("Nothing to do for {key}.");
                Ok(SyncOutcome::Unchanged)
            }
        }
    }

    /// [`Self::sync_one`] for each day of the range.
    pub async fn sync_range(
        &mut self,
        start: NaiveDate,
        n_days: u32,
        direction: Direction,
        meal: Meal,
        diet: Diet,
    ) -> crate::Result<RangeReport> {
        let slot = MealSlot::new(meal, diet);
        let mut report = RangeReport::default();
        for date in date_iter(start, n_days, direction)? {
            let outcome = self.sync_one(date, meal, diet).await;
            report.record(date, slot, outcome);
        }
        Ok(report)
    }

    async fn populate_one(
        &mut self,
        date: NaiveDate,
        slot: MealSlot,
    ) -> crate::Result<SyncOutcome> {
        let Some(record) = self.fetch(date, slot).await? else {
            return Ok(SyncOutcome::NoMenu);
        };
        self.create_and_record(&record)
            .await
            .map(SyncOutcome::Created)
    }

    /// Creates one event per day of the range without consulting the ledger.
    pub async fn populate_range(
        &mut self,
        start: NaiveDate,
        n_days: u32,
        direction: Direction,
        meal: Meal,
        diet: Diet,
    ) -> crate::Result<RangeReport> {
        let slot = MealSlot::new(meal, diet);
        let mut report = RangeReport::default();
        for date in date_iter(start, n_days, direction)? {
            let outcome = self.populate_one(date, slot).await;
            report.record(date, slot, outcome);
        }
        info!("{} events created for {slot}.", report.created.len());
        Ok(report)
    }

    async fn delete_events(&self, calendar_id: &str, ids: &[String]) -> DeleteReport {
        let mut report = DeleteReport::default();
        for id in ids {
            match self.calendar.delete(calendar_id, id).await {
                Ok(()) => {
                    debug!("Event {id} deleted.");
                    report.deleted += 1;
                }
                Err(e) => {
                    error!("Could not delete event {id}: {e}");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Deletes every event in the window, then repopulates lunch and dinner.
    /// A bad range or a failed listing aborts before anything is deleted.
    pub async fn rebuild_range(
        &mut self,
        start: NaiveDate,
        n_days: u32,
        direction: Direction,
        diet: Diet,
    ) -> crate::Result<RebuildReport> {
        let calendar_id = self.calendars.for_diet(diet).to_owned();
        let window = TimeWindow::days(start, n_days, direction)?;
        let ids = self
            .calendar
            .list_event_ids(&calendar_id, Some(window))
            .await?;
        let deleted = self.delete_events(&calendar_id, &ids).await;
        info!("Deleted {} of {} events.", deleted.deleted, ids.len());

        let lunch = self
            .populate_range(start, n_days, direction, Meal::Lunch, diet)
            .await?;
        let dinner = self
            .populate_range(start, n_days, direction, Meal::Dinner, diet)
            .await?;
        info!(
            "Updated {n_days} days starting from {}.",
            start.format("%d/%m of %Y")
        );
        Ok(RebuildReport {
            deleted,
            lunch,
            dinner,
        })
    }

    /// Deletes every event on the diet's calendar.
    pub async fn clear(&self, diet: Diet) -> crate::Result<DeleteReport> {
        let calendar_id = self.calendars.for_diet(diet);
        let ids = self.calendar.list_event_ids(calendar_id, None).await?;
        let report = self.delete_events(calendar_id, &ids).await;
        info!("All events deleted ({} removed).", report.deleted);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::parse::DailyMenu;

    #[derive(Default)]
    struct FakeMenu {
        missing: HashSet<NaiveDate>,
        broken: HashSet<NaiveDate>,
        main_course: String,
    }

    impl FakeMenu {
        fn serving(main_course: &str) -> Self {
            Self {
                main_course: main_course.to_string(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl MenuSource for FakeMenu {
        async fn daily_menu(&self, date: NaiveDate) -> crate::Result<DailyMenu> {
            if self.missing.contains(&date) {
                return Err(Error::MenuNotFound(date));
            }
            if self.broken.contains(&date) {
                return Err(Error::Api {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            let meals = MealSlot::ALL
                .into_iter()
                .map(|slot| MealRecord {
                    date,
                    slot,
                    main_course: format!("{} ({slot})", self.main_course),
                    side_dish: "Farofa".into(),
                    salad: "Alface".into(),
                    dessert: "Banana".into(),
                    juice: "Suco de caju".into(),
                })
                .collect();
            Ok(DailyMenu::new(date, meals))
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Insert(String, NaiveDate, String),
        List(String, Option<TimeWindow>),
        Delete(String, String),
    }

    #[derive(Clone, Default)]
    struct FakeCalendar {
        calls: Arc<Mutex<Vec<Call>>>,
        existing: Vec<String>,
        failing_inserts: HashSet<NaiveDate>,
        failing_deletes: HashSet<String>,
        failing_list: bool,
    }

    impl FakeCalendar {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn inserted_dates(&self) -> Vec<NaiveDate> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Insert(_, date, _) => Some(date),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl CalendarService for FakeCalendar {
        async fn insert(&self, calendar_id: &str, event: &CalendarEvent) -> crate::Result<String> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call::Insert(
                calendar_id.to_string(),
                event.date(),
                event.summary.clone(),
            ));
            if self.failing_inserts.contains(&event.date()) {
                return Err(Error::Api {
                    status: 500,
                    body: "backend error".into(),
                });
            }
            Ok(format!("evt{}", calls.len()))
        }

        async fn list_event_ids(
            &self,
            calendar_id: &str,
            window: Option<TimeWindow>,
        ) -> crate::Result<Vec<String>> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::List(calendar_id.to_string(), window));
            if self.failing_list {
                return Err(Error::Api {
                    status: 503,
                    body: "backend unavailable".into(),
                });
            }
            Ok(self.existing.clone())
        }

        async fn delete(&self, calendar_id: &str, event_id: &str) -> crate::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Delete(calendar_id.to_string(), event_id.to_string()));
            if self.failing_deletes.contains(event_id) {
                return Err(Error::Api {
                    status: 404,
                    body: "not found".into(),
                });
            }
            Ok(())
        }
    }

    fn ids() -> CalendarIds {
        CalendarIds {
            standard: "std-cal".into(),
            vegan: "veg-cal".into(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn synchronizer(
        menu: FakeMenu,
        calendar: &FakeCalendar,
        ledger: Ledger,
    ) -> Synchronizer<FakeMenu, FakeCalendar> {
        Synchronizer::new(menu, calendar.clone(), ledger, ids())
    }

    #[tokio::test]
    async fn test_sync_one_creates_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.txt");
        let calendar = FakeCalendar::default();
        let mut sync = synchronizer(FakeMenu::serving("Feijoada"), &calendar, Ledger::local(&path));

        let first = sync.sync_one(day(1), Meal::Lunch, Diet::Standard).await.unwrap();
        assert!(matches!(first, SyncOutcome::Created(_)));
        let second = sync.sync_one(day(1), Meal::Lunch, Diet::Standard).await.unwrap();
        assert_eq!(second, SyncOutcome::Unchanged);

        assert_eq!(
            calendar.calls(),
            vec![Call::Insert("std-cal".into(), day(1), "Almoço".into())]
        );
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("2024-01-01-Almoço, "));
    }

    #[tokio::test]
    async fn test_sync_one_flags_changed_menu() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.txt");
        let calendar = FakeCalendar::default();

        let mut sync = synchronizer(FakeMenu::serving("Feijoada"), &calendar, Ledger::local(&path));
        sync.sync_one(day(2), Meal::Dinner, Diet::Vegan).await.unwrap();

        let mut sync = synchronizer(FakeMenu::serving("Moqueca"), &calendar, Ledger::local(&path));
        let outcome = sync.sync_one(day(2), Meal::Dinner, Diet::Vegan).await.unwrap();
        assert_eq!(outcome, SyncOutcome::NeedsUpdate);

        // one insert from the first run, none from the stale one
        assert_eq!(
            calendar.calls(),
            vec![Call::Insert("veg-cal".into(), day(2), "Jantar Vegano".into())]
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[tokio::test]
    async fn test_sync_one_without_menu_touches_nothing() {
        let calendar = FakeCalendar::default();
        let mut menu = FakeMenu::serving("Feijoada");
        menu.missing.insert(day(3));
        let mut sync = synchronizer(menu, &calendar, Ledger::ad_hoc());

        let outcome = sync.sync_one(day(3), Meal::Lunch, Diet::Standard).await.unwrap();
        assert_eq!(outcome, SyncOutcome::NoMenu);
        assert!(calendar.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sync_one_surfaces_transport_errors() {
        let calendar = FakeCalendar::default();
        let mut menu = FakeMenu::serving("Feijoada");
        menu.broken.insert(day(3));
        let mut sync = synchronizer(menu, &calendar, Ledger::ad_hoc());

        let res = sync.sync_one(day(3), Meal::Lunch, Diet::Standard).await;
        assert!(matches!(res, Err(Error::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_populate_range_skips_missing_day() {
        let calendar = FakeCalendar::default();
        let mut menu = FakeMenu::serving("Feijoada");
        menu.missing.insert(day(3));
        let mut sync = synchronizer(menu, &calendar, Ledger::ad_hoc());

        let report = sync
            .populate_range(day(1), 5, Direction::Forward, Meal::Lunch, Diet::Standard)
            .await
            .unwrap();
        assert_eq!(calendar.inserted_dates(), vec![day(1), day(2), day(4), day(5)]);
        assert_eq!(report.created.len(), 4);
        assert_eq!(report.no_menu, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_populate_range_ignores_ledger() {
        let calendar = FakeCalendar::default();
        let mut sync = synchronizer(FakeMenu::serving("Feijoada"), &calendar, Ledger::ad_hoc());

        sync.sync_one(day(1), Meal::Lunch, Diet::Standard).await.unwrap();
        let report = sync
            .populate_range(day(1), 1, Direction::Forward, Meal::Lunch, Diet::Standard)
            .await
            .unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(calendar.inserted_dates(), vec![day(1), day(1)]);
    }

    #[tokio::test]
    async fn test_populate_range_continues_after_failure() {
        let mut calendar = FakeCalendar::default();
        calendar.failing_inserts.insert(day(2));
        let mut menu = FakeMenu::serving("Feijoada");
        menu.broken.insert(day(4));
        let mut sync = synchronizer(menu, &calendar, Ledger::ad_hoc());

        let report = sync
            .populate_range(day(1), 5, Direction::Forward, Meal::Dinner, Diet::Standard)
            .await
            .unwrap();
        assert_eq!(report.failed, 2);
        assert_eq!(report.created.len(), 3);
        assert_eq!(calendar.inserted_dates(), vec![day(1), day(2), day(3), day(5)]);
    }

    #[tokio::test]
    async fn test_populate_range_backward() {
        let calendar = FakeCalendar::default();
        let mut sync = synchronizer(FakeMenu::serving("Feijoada"), &calendar, Ledger::ad_hoc());

        sync.populate_range(day(10), 3, Direction::Backward, Meal::Lunch, Diet::Vegan)
            .await
            .unwrap();
        assert_eq!(calendar.inserted_dates(), vec![day(9), day(8), day(7)]);
    }

    #[tokio::test]
    async fn test_sync_range_reports_each_day() {
        let calendar = FakeCalendar::default();
        let mut menu = FakeMenu::serving("Feijoada");
        menu.missing.insert(day(2));
        let mut sync = synchronizer(menu, &calendar, Ledger::ad_hoc());

        sync.sync_one(day(1), Meal::Lunch, Diet::Standard).await.unwrap();
        let report = sync
            .sync_range(day(1), 3, Direction::Forward, Meal::Lunch, Diet::Standard)
            .await
            .unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.no_menu, 1);
        assert_eq!(report.created.len(), 1);
    }

    #[tokio::test]
    async fn test_rebuild_deletes_before_creating() {
        let calendar = FakeCalendar {
            existing: vec!["old1".into(), "old2".into(), "old3".into()],
            ..FakeCalendar::default()
        };
        let mut sync = synchronizer(FakeMenu::serving("Feijoada"), &calendar, Ledger::ad_hoc());

        let report = sync
            .rebuild_range(day(1), 2, Direction::Forward, Diet::Standard)
            .await
            .unwrap();
        assert_eq!(report.deleted.deleted, 3);
        assert_eq!(report.lunch.created.len(), 2);
        assert_eq!(report.dinner.created.len(), 2);

        let calls = calendar.calls();
        assert_eq!(
            calls[0],
            Call::List(
                "std-cal".into(),
                Some(TimeWindow::days(day(1), 2, Direction::Forward).unwrap())
            )
        );
        let deletes: Vec<_> = calls[1..4].to_vec();
        assert_eq!(
            deletes,
            vec![
                Call::Delete("std-cal".into(), "old1".into()),
                Call::Delete("std-cal".into(), "old2".into()),
                Call::Delete("std-cal".into(), "old3".into()),
            ]
        );
        assert!(calls[4..].iter().all(|c| matches!(c, Call::Insert(..))));
        let summaries: Vec<_> = calls[4..]
            .iter()
            .filter_map(|c| match c {
                Call::Insert(_, date, summary) => Some((*date, summary.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            summaries,
            vec![
                (day(1), "Almoço"),
                (day(2), "Almoço"),
                (day(1), "Jantar"),
                (day(2), "Jantar"),
            ]
        );
    }

    #[tokio::test]
    async fn test_rebuild_keeps_going_when_a_delete_fails() {
        let mut calendar = FakeCalendar {
            existing: vec!["a".into(), "b".into()],
            ..FakeCalendar::default()
        };
        calendar.failing_deletes.insert("a".into());
        let mut sync = synchronizer(FakeMenu::serving("Feijoada"), &calendar, Ledger::ad_hoc());

        let report = sync
            .rebuild_range(day(1), 1, Direction::Forward, Diet::Vegan)
            .await
            .unwrap();
        assert_eq!(report.deleted, DeleteReport { deleted: 1, failed: 1 });
        assert_eq!(calendar.inserted_dates(), vec![day(1), day(1)]);
        assert!(calendar
            .calls()
            .iter()
            .all(|c| !matches!(c, Call::Insert(cal, ..) if cal != "veg-cal")));
    }

    #[tokio::test]
    async fn test_clear_lists_whole_calendar() {
        let calendar = FakeCalendar {
            existing: vec!["x".into()],
            ..FakeCalendar::default()
        };
        let sync = synchronizer(FakeMenu::serving("Feijoada"), &calendar, Ledger::ad_hoc());

        let report = sync.clear(Diet::Vegan).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(
            calendar.calls(),
            vec![
                Call::List("veg-cal".into(), None),
                Call::Delete("veg-cal".into(), "x".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_rebuild_stops_when_listing_fails() {
        let calendar = FakeCalendar {
            existing: vec!["old1".into()],
            failing_list: true,
            ..FakeCalendar::default()
        };
        let mut sync = synchronizer(FakeMenu::serving("Feijoada"), &calendar, Ledger::ad_hoc());

        let res = sync
            .rebuild_range(day(1), 3, Direction::Forward, Diet::Standard)
            .await;
        assert!(matches!(res, Err(Error::Api { status: 503, .. })));
        let calls = calendar.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], Call::List(..)));
    }

    #[tokio::test]
    async fn test_unwritable_ledger_still_counts_created() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = FakeCalendar::default();
        // a directory cannot be opened for appending
        let mut sync = synchronizer(
            FakeMenu::serving("Feijoada"),
            &calendar,
            Ledger::local(dir.path()),
        );

        let report = sync
            .populate_range(day(1), 1, Direction::Forward, Meal::Lunch, Diet::Standard)
            .await
            .unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.failed, 0);
        assert_eq!(calendar.inserted_dates(), vec![day(1)]);
    }

    #[tokio::test]
    async fn test_oversized_range_touches_nothing() {
        let calendar = FakeCalendar {
            existing: vec!["old1".into()],
            ..FakeCalendar::default()
        };
        let mut sync = synchronizer(FakeMenu::serving("Feijoada"), &calendar, Ledger::ad_hoc());

        let err = sync
            .rebuild_range(day(1), u32::MAX, Direction::Backward, Diet::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = sync
            .populate_range(day(1), u32::MAX, Direction::Forward, Meal::Lunch, Diet::Vegan)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(calendar.calls().is_empty());
    }
}
