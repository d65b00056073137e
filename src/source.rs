use async_trait::async_trait;
use chrono::NaiveDate;
use url::Url;

use crate::{
    fetch::{self, make_client, MENU_URL},
    parse::{DailyMenu, MealRecord, MealSlot},
    Error,
};

/// Where daily menus come from.
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// Every meal published for the day; [`Error::MenuNotFound`] if none was.
    async fn daily_menu(&self, date: NaiveDate) -> crate::Result<DailyMenu>;

    async fn meal(&self, date: NaiveDate, slot: MealSlot) -> crate::Result<MealRecord> {
        self.daily_menu(date)
            .await?
            .into_meal(slot)?
            .ok_or(Error::MenuNotFound(date))
    }
}

/// The Unicamp restaurants' public menu page.
#[derive(Debug, Clone)]
pub struct UnicampMenu {
    client: reqwest::Client,
    base: Url,
}

impl Default for UnicampMenu {
    fn default() -> Self {
        let base = Url::parse(MENU_URL).expect("menu url should be valid");
        Self::with_base_url(base)
    }
}

impl UnicampMenu {
    pub fn with_base_url(base: Url) -> Self {
        Self {
            client: make_client(),
            base,
        }
    }

    fn parse_page(page: &str, date: NaiveDate) -> crate::Result<DailyMenu> {
        if DailyMenu::is_unpublished(page) {
            return Err(Error::MenuNotFound(date));
        }
        let document = scraper::Html::parse_document(page);
        Ok(DailyMenu::from_html_element(document.root_element(), date))
    }
}

#[async_trait]
impl MenuSource for UnicampMenu {
    async fn daily_menu(&self, date: NaiveDate) -> crate::Result<DailyMenu> {
        let page = fetch::fetch_menu_page(&self.client, &self.base, date).await?;
        Self::parse_page(&page, date)
    }
}
