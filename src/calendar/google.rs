use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use url::Url;

use super::{CalendarService, TimeWindow, TokenSource};
use crate::{event::CalendarEvent, Error};

pub static GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar v3 over plain REST.
pub struct GoogleCalendar {
    client: Client,
    base: Url,
    auth: Box<dyn TokenSource>,
}

impl GoogleCalendar {
    pub fn new(auth: impl TokenSource + 'static) -> Self {
        let base = Url::parse(GOOGLE_CALENDAR_API_BASE).expect("api base should be a valid url");
        Self::with_base_url(auth, base)
    }

    pub fn with_base_url(auth: impl TokenSource + 'static, base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
            auth: Box::new(auth),
        }
    }

    /// `{base}/calendars/{calendar_id}/events[/{event_id}]`, ids percent-encoded.
    fn events_url(&self, calendar_id: &str, event_id: Option<&str>) -> crate::Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::config_error("calendar api base url cannot have a path"))?;
            segments
                .pop_if_empty()
                .push("calendars")
                .push(calendar_id)
                .push("events");
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }
        Ok(url)
    }

    async fn check(response: Response) -> crate::Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(Error::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn insert(&self, calendar_id: &str, event: &CalendarEvent) -> crate::Result<String> {
        let url = self.events_url(calendar_id, None)?;
        let token = self.auth.token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(event)
            .send()
            .await?;
        let created: GoogleEventId = Self::check(response).await?.json().await?;
        Ok(created.id)
    }

    async fn list_event_ids(
        &self,
        calendar_id: &str,
        window: Option<TimeWindow>,
    ) -> crate::Result<Vec<String>> {
        let url = self.events_url(calendar_id, None)?;
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(window) = window {
                query.push(("timeMin", window.start.to_rfc3339()));
                query.push(("timeMax", window.end.to_rfc3339()));
            }
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let token = self.auth.token().await?;
            let response = self
                .client
                .get(url.clone())
                .bearer_auth(token)
                .query(&query)
                .send()
                .await?;
            let page: GoogleEventsResponse = Self::check(response).await?.json().await?;
            ids.extend(page.items.into_iter().map(|event| event.id));

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }
        log::debug!("Listed {} events on {calendar_id}", ids.len());
        Ok(ids)
    }

    async fn delete(&self, calendar_id: &str, event_id: &str) -> crate::Result<()> {
        let url = self.events_url(calendar_id, Some(event_id))?;
        let token = self.auth.token().await?;
        let response = self.client.delete(url).bearer_auth(token).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct GoogleEventsResponse {
    #[serde(default)]
    items: Vec<GoogleEventId>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleEventId {
    id: String,
}
