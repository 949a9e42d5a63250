//! Fleet status endpoints

use fleetwatch_core::domain::outage::OutageRecord;
use fleetwatch_core::domain::status::WorkerStatusEntry;
use fleetwatch_core::dto::outage::OutageQuery;
use fleetwatch_core::dto::sample::SampleDto;

use crate::FleetClient;
use crate::error::Result;

impl FleetClient {
    /// List outage records in a time range
    ///
    /// Open outages sort first, then newest start first.
    pub async fn list_outages(&self, query: &OutageQuery) -> Result<Vec<OutageRecord>> {
        let url = format!("{}/api/outages", self.base_url);
        let response = self.client.post(&url).json(query).send().await?;

        self.handle_response(response).await
    }

    /// Push one polling cycle's sample batch
    ///
    /// # Arguments
    /// * `samples` - One entry per reporting worker, epoch-ms timestamps
    pub async fn push_samples(&self, samples: &[SampleDto]) -> Result<()> {
        let url = format!("{}/api/samples", self.base_url);
        let response = self.client.post(&url).json(&samples).send().await?;

        self.handle_empty_response(response).await
    }

    /// Live worker status snapshot, down workers first
    pub async fn list_workers(&self) -> Result<Vec<WorkerStatusEntry>> {
        let url = format!("{}/api/workers", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
