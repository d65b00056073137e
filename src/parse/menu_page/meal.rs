use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};

use crate::{
    parse::{
        error::Result,
        format_names,
        text_from_selection::{inner_text, select_first, text_lines},
        Error,
    },
    static_selector,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Meal {
    Lunch,
    Dinner,
}

impl Meal {
    pub const BOTH: [Self; 2] = [Self::Lunch, Self::Dinner];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Lunch => "Almoço",
            Self::Dinner => "Jantar",
        }
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Meal {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lunch" | "almoço" | "almoco" => Ok(Self::Lunch),
            "dinner" | "jantar" | "janta" => Ok(Self::Dinner),
            other => Err(crate::Error::invalid_argument(format!(
                "unknown meal `{other}`, expected `lunch` or `dinner`"
            ))),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Diet {
    #[default]
    Standard,
    Vegan,
}

impl Diet {
    pub const fn from_veg_flag(veg: bool) -> Self {
        if veg {
            Self::Vegan
        } else {
            Self::Standard
        }
    }
}

/// One of the four daily services: a meal for a diet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct MealSlot {
    pub meal: Meal,
    pub diet: Diet,
}

impl MealSlot {
    /// In the order the cafeteria page lists its sections.
    pub const ALL: [Self; 4] = [
        Self::new(Meal::Lunch, Diet::Standard),
        Self::new(Meal::Lunch, Diet::Vegan),
        Self::new(Meal::Dinner, Diet::Standard),
        Self::new(Meal::Dinner, Diet::Vegan),
    ];

    pub const fn new(meal: Meal, diet: Diet) -> Self {
        Self { meal, diet }
    }

    pub const fn name(self) -> &'static str {
        match (self.meal, self.diet) {
            (Meal::Lunch, Diet::Standard) => "Almoço",
            (Meal::Lunch, Diet::Vegan) => "Almoço Vegano",
            (Meal::Dinner, Diet::Standard) => "Jantar",
            (Meal::Dinner, Diet::Vegan) => "Jantar Vegano",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRecord {
    pub date: NaiveDate,
    pub slot: MealSlot,
    pub main_course: String,
    pub side_dish: String,
    pub salad: String,
    pub dessert: String,
    pub juice: String,
}

impl MealRecord {
    /// Parses one `div.menu-section`. Sections without a main course are
    /// placeholders the cafeteria leaves for closed services and yield `None`.
    pub fn from_html_element(
        element: ElementRef<'_>,
        date: NaiveDate,
        slot: MealSlot,
    ) -> Result<Option<Self>> {
        static_selector!(NAME_SELECTOR <- "div.menu-item-name");
        static_selector!(DESCRIPTION_SELECTOR <- "div.menu-item-description");

        let Some(name) = element.select(&NAME_SELECTOR).next() else {
            return Ok(None);
        };
        let main_course = format_names(&inner_text(name, "main course")?);

        let description = select_first(&DESCRIPTION_SELECTOR, element, "meal", "description")?;
        // the first line is the fixed rice-and-beans base
        let lines = text_lines(description);
        let [_, side_dish, salad, dessert, juice, ..] = lines.as_slice() else {
            return Err(Error::html_parse_error(&format!(
                "The {slot} description should list a side dish, salad, dessert and juice."
            )));
        };

        Ok(Some(Self {
            date,
            slot,
            main_course,
            side_dish: format_names(side_dish),
            salad: format_names(salad),
            dessert: format_names(dessert),
            juice: format_names(juice),
        }))
    }
}
