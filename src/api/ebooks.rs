use reqwest::Method;
use serde::de::IgnoredAny;
use serde_json::json;

use super::segment;
use crate::{
    api_client::{ApiError, ApiService, RequestOptions},
    domain::{
        DownloadGrant, Ebook, EbookInput, EbookPosition, EbookQuery, EbookStatus, EbookUser,
        LeadForm, Paginated, SendEbookRequest,
    },
};

/// Public catalog routes under `/api/ebooks`.
#[derive(Clone, Debug)]
pub struct EbookApi {
    service: ApiService,
}

impl EbookApi {
    pub fn new(service: ApiService) -> Self {
        Self { service }
    }

    /// GET /ebooks. Only active ebooks are returned.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list(&self, query: &EbookQuery) -> Result<Paginated<Ebook>, ApiError> {
        self.service.get_paginated("/ebooks", query.to_query()).await
    }

    /// GET /ebooks/{slug}
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Ebook, ApiError> {
        self.service
            .get(&format!("/ebooks/{}", segment(slug)))
            .await
    }

    /// GET /ebooks/categories
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.service.get("/ebooks/categories").await
    }

    /// POST /ebooks/{slug}/download. Records the lead and returns a signed URL.
    #[tracing::instrument(level = "debug", skip(self, lead), fields(email = %lead.email))]
    pub async fn request_download(
        &self,
        slug: &str,
        lead: &LeadForm,
    ) -> Result<DownloadGrant, ApiError> {
        self.service
            .post(&format!("/ebooks/{}/download", segment(slug)), lead)
            .await
    }
}

/// Admin routes under `/api/admin/ebooks`.
#[derive(Clone, Debug)]
pub struct AdminEbookApi {
    service: ApiService,
}

impl AdminEbookApi {
    pub fn new(service: ApiService) -> Self {
        Self { service }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list(&self, query: &EbookQuery) -> Result<Paginated<Ebook>, ApiError> {
        self.service.get_paginated("/ebooks", query.to_query()).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self, id: &str) -> Result<Ebook, ApiError> {
        self.service.get(&format!("/ebooks/{}", segment(id))).await
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub async fn create(&self, input: &EbookInput) -> Result<Ebook, ApiError> {
        self.service.post("/ebooks", input).await
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub async fn update(&self, id: &str, input: &EbookInput) -> Result<Ebook, ApiError> {
        self.service
            .put(&format!("/ebooks/{}", segment(id)), input)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .service
            .delete(&format!("/ebooks/{}", segment(id)))
            .await?;
        Ok(())
    }

    /// PATCH /ebooks/{id}/status
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn set_status(&self, id: &str, status: EbookStatus) -> Result<Ebook, ApiError> {
        self.service
            .patch(
                &format!("/ebooks/{}/status", segment(id)),
                &json!({ "status": status }),
            )
            .await
    }

    /// PUT /ebooks/reorder
    #[tracing::instrument(level = "debug", skip(self, positions), fields(count = positions.len()))]
    pub async fn reorder(&self, positions: &[EbookPosition]) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .service
            .request(
                "/ebooks/reorder",
                RequestOptions::new(Method::PUT).json(&json!({ "positions": positions }))?,
            )
            .await?;
        Ok(())
    }

    /// POST /ebooks/{id}/send. Emails the ebook and records an admin-type lead.
    #[tracing::instrument(level = "debug", skip(self, recipient), fields(email = %recipient.email))]
    pub async fn send(
        &self,
        id: &str,
        recipient: &SendEbookRequest,
    ) -> Result<EbookUser, ApiError> {
        self.service
            .post(&format!("/ebooks/{}/send", segment(id)), recipient)
            .await
    }
}
