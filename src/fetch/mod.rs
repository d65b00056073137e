use std::{num::NonZeroU32, sync::OnceLock, time::Duration};

use chrono::{Days, NaiveDate};
use governor::{
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::InMemoryState,
};
use reqwest::{Client, Error as RequestError};
use tracing::{instrument, Level};
use url::Url;

use crate::Error;

pub static MENU_URL: &str = "https://sistemas.prefeitura.unicamp.br/apps/cardapio/index.php";

/// Read timeout for the menu page; the calendar API gets none.
static READ_TIMEOUT: Duration = Duration::from_secs(3);

pub fn make_client() -> reqwest::Client {
    Client::builder()
        .gzip(true)
        .build()
        .expect("client creation should succeed")
}

static RATE_LIMIT: u32 = 4;
static DELAY_JITTER: u64 = 250;
static RATE_LIMITER: OnceLock<
    governor::RateLimiter<
        governor::state::NotKeyed,
        InMemoryState,
        QuantaClock,
        NoOpMiddleware<QuantaInstant>,
    >,
> = OnceLock::new();

#[instrument(skip(client, base), fields(
    date = %date.format("%Y-%m-%d"),
), level = Level::TRACE)]
pub async fn fetch_menu_page(
    client: &reqwest::Client,
    base: &Url,
    date: NaiveDate,
) -> Result<String, RequestError> {
    let rate_limiter = RATE_LIMITER.get_or_init(|| {
        governor::RateLimiter::direct(governor::Quota::per_second(
            NonZeroU32::new(RATE_LIMIT).expect("rate limit is nonzero"),
        ))
    });
    let retry_jitter =
        governor::Jitter::new(Duration::ZERO, Duration::from_millis(DELAY_JITTER));
    rate_limiter.until_ready_with_jitter(retry_jitter).await;

    let mut url = base.to_owned();
    url.query_pairs_mut()
        .append_pair("d", date.format("%Y-%m-%d").to_string().as_str());
    let res = client
        .get(url)
        .timeout(READ_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    let start = std::time::Instant::now();
    let text = res.text().await?;
    log::trace!("Got text of menu page in \t {:?}", start.elapsed());
    Ok(text)
}

/// Which way a day range runs from its start date.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Direction {
    /// `start, start + 1, ..., start + (count - 1)`
    #[default]
    Forward,
    /// `start - 1, start - 2, ..., start - count`
    Backward,
}

impl Direction {
    pub const fn from_backward_flag(backward: bool) -> Self {
        if backward {
            Self::Backward
        } else {
            Self::Forward
        }
    }
}

/// `start + count` going forward, `start - count` going back. Errors when that
/// falls outside the dates chrono can represent.
pub fn range_end(start: NaiveDate, count: u32, direction: Direction) -> crate::Result<NaiveDate> {
    let days = Days::new(u64::from(count));
    match direction {
        Direction::Forward => start.checked_add_days(days),
        Direction::Backward => start.checked_sub_days(days),
    }
    .ok_or_else(|| Error::invalid_argument(format!("{count} days from {start} is out of range")))
}

pub fn date_iter(
    start: NaiveDate,
    count: u32,
    direction: Direction,
) -> crate::Result<impl Iterator<Item = NaiveDate>> {
    range_end(start, count, direction)?;
    Ok((1..=u64::from(count)).map_while(move |n| match direction {
        Direction::Forward => start.checked_add_days(Days::new(n - 1)),
        Direction::Backward => start.checked_sub_days(Days::new(n)),
    }))
}
