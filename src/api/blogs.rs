use serde::de::IgnoredAny;

use super::segment;
use crate::{
    api_client::{ApiError, ApiService},
    domain::{BlogPost, BlogPostInput, BlogQuery, Paginated},
};

/// Published posts under `/api/blogs`.
#[derive(Clone, Debug)]
pub struct BlogApi {
    service: ApiService,
}

impl BlogApi {
    pub fn new(service: ApiService) -> Self {
        Self { service }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list(&self, query: &BlogQuery) -> Result<Paginated<BlogPost>, ApiError> {
        self.service.get_paginated("/blogs", query.to_query()).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<BlogPost, ApiError> {
        self.service.get(&format!("/blogs/{}", segment(slug))).await
    }
}

#[derive(Clone, Debug)]
pub struct AdminBlogApi {
    service: ApiService,
}

impl AdminBlogApi {
    pub fn new(service: ApiService) -> Self {
        Self { service }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list(&self, query: &BlogQuery) -> Result<Paginated<BlogPost>, ApiError> {
        self.service.get_paginated("/blogs", query.to_query()).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self, id: &str) -> Result<BlogPost, ApiError> {
        self.service.get(&format!("/blogs/{}", segment(id))).await
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub async fn create(&self, input: &BlogPostInput) -> Result<BlogPost, ApiError> {
        self.service.post("/blogs", input).await
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub async fn update(&self, id: &str, input: &BlogPostInput) -> Result<BlogPost, ApiError> {
        self.service
            .put(&format!("/blogs/{}", segment(id)), input)
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .service
            .delete(&format!("/blogs/{}", segment(id)))
            .await?;
        Ok(())
    }
}
