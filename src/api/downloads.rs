use crate::{
    api_client::{ApiError, ApiService},
    domain::{DashboardStats, DownloadQuery, EbookUser, Paginated},
};

/// Lead records and dashboard analytics under `/api/admin/downloads`. Read-only.
#[derive(Clone, Debug)]
pub struct AdminDownloadApi {
    service: ApiService,
}

impl AdminDownloadApi {
    pub fn new(service: ApiService) -> Self {
        Self { service }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list(&self, query: &DownloadQuery) -> Result<Paginated<EbookUser>, ApiError> {
        self.service
            .get_paginated("/downloads", query.to_query())
            .await
    }

    /// GET /downloads/stats, optionally limited to the last `days` days.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn stats(&self, days: Option<u32>) -> Result<DashboardStats, ApiError> {
        let query = days
            .map(|d| vec![("days".to_string(), d.to_string())])
            .unwrap_or_default();
        self.service.get_with_query("/downloads/stats", query).await
    }
}
