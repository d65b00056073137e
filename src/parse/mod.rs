mod error;
mod format_names;
mod menu_page;
mod static_selector;
mod text_from_selection;

pub use error::Error;
pub use format_names::format_names;
pub use menu_page::{DailyMenu, Diet, Meal, MealRecord, MealSlot};
