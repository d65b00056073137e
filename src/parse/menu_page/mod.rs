mod daily_menu;
mod meal;

pub use daily_menu::DailyMenu;
pub use meal::{Diet, Meal, MealRecord, MealSlot};
