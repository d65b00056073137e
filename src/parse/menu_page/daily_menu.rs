use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::meal::{MealRecord, MealSlot};
use crate::parse::error::{Error, Result};
use crate::static_selector;

/// Marker the cafeteria page shows instead of the menu sections.
pub const NO_MENU_MARKER: &str = "Não existe cardápio";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMenu {
    date: NaiveDate,
    meals: Vec<MealRecord>,
    #[serde(skip)]
    malformed: Vec<(MealSlot, Error)>,
}

impl DailyMenu {
    pub fn new(date: NaiveDate, meals: Vec<MealRecord>) -> Self {
        Self {
            date,
            meals,
            malformed: Vec::new(),
        }
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn meals(&self) -> impl Iterator<Item = &MealRecord> {
        self.meals.iter()
    }

    /// `Ok(None)` when the slot is not on the page, an error when its section
    /// was there but malformed.
    pub fn into_meal(self, slot: MealSlot) -> Result<Option<MealRecord>> {
        if let Some((_, e)) = self.malformed.iter().find(|(s, _)| *s == slot) {
            return Err(e.clone());
        }
        Ok(self.meals.into_iter().find(|meal| meal.slot == slot))
    }

    /// Whether the page body says no menu was published for the day.
    pub fn is_unpublished(page: &str) -> bool {
        page.contains(NO_MENU_MARKER)
    }

    /// A malformed section is kept aside so the other slots of the day stay
    /// usable.
    pub fn from_html_element(element: scraper::ElementRef<'_>, date: NaiveDate) -> Self {
        static_selector!(SECTION_SELECTOR <- "div.menu-section");
        let mut menu = Self::new(date, Vec::new());
        for (section, slot) in element.select(&SECTION_SELECTOR).zip(MealSlot::ALL) {
            match MealRecord::from_html_element(section, date, slot) {
                Ok(Some(meal)) => menu.meals.push(meal),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Skipping {slot} on {date}: {e}");
                    menu.malformed.push((slot, e));
                }
            }
        }
        menu
    }
}
