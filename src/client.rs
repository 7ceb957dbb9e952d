// 🌐 Expense Service Client - the hosted store behind the expense form
//
// The service owns storage; this only speaks its HTTP API.

use crate::feed::{decode_expenses, ExpenseFeed};
use crate::model::{ExpenseRecord, Trip};
use crate::validation::ExpenseDraft;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Body of `POST /payments`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewItemRequest<'a> {
    new_item: &'a ExpenseDraft,
}

pub struct ExpenseService {
    base_url: String,
    client: reqwest::Client,
}

impl ExpenseService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn payments_url(&self, trip_id: Option<&str>) -> String {
        match trip_id {
            Some(trip) => format!("{}?trip_id={}", self.url("payments"), urlencoding::encode(trip)),
            None => self.url("payments"),
        }
    }

    fn payment_url(&self, id: &str) -> String {
        self.url(&format!("payments/{}", urlencoding::encode(id)))
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            anyhow::bail!("{} failed: {}", what, response.status())
        }
    }

    /// `GET /payments[?trip_id=..]`, decoded with skip-and-report
    pub async fn list_expenses(&self, trip_id: Option<&str>) -> Result<ExpenseFeed> {
        let url = self.payments_url(trip_id);
        debug!(%url, "fetching expenses");

        let response = self.client.get(&url).send().await.context("Expense service unreachable")?;
        let body = Self::check(response, "GET /payments").await?.text().await?;

        let feed = decode_expenses(&body)?;
        info!(records = feed.records.len(), rejected = feed.rejected.len(), "expenses fetched");
        Ok(feed)
    }

    /// `GET /trips`
    pub async fn list_trips(&self) -> Result<Vec<Trip>> {
        let response = self.client.get(self.url("trips")).send().await.context("Expense service unreachable")?;
        let trips = Self::check(response, "GET /trips").await?.json().await?;
        Ok(trips)
    }

    /// `POST /payments`; the service assigns id and timestamp
    pub async fn add_expense(&self, draft: &ExpenseDraft) -> Result<()> {
        let response = self
            .client
            .post(self.url("payments"))
            .json(&NewItemRequest { new_item: draft })
            .send()
            .await?;
        Self::check(response, "POST /payments").await?;
        info!(paid_by = %draft.paid_by, amount = draft.amount, "expense added");
        Ok(())
    }

    /// `POST /update-item` with the full record
    pub async fn update_expense(&self, record: &ExpenseRecord) -> Result<()> {
        let response = self.client.post(self.url("update-item")).json(record).send().await?;
        Self::check(response, "POST /update-item").await?;
        info!(id = %record.id, "expense updated");
        Ok(())
    }

    /// `DELETE /payments/{id}`
    pub async fn delete_expense(&self, id: &str) -> Result<()> {
        let response = self.client.delete(self.payment_url(id)).send().await?;
        Self::check(response, "DELETE /payments").await?;
        info!(id, "expense deleted");
        Ok(())
    }
}
