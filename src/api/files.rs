use bytes::Bytes;
use serde::de::IgnoredAny;
use serde_json::json;

use crate::{
    api_client::{ApiError, ApiService, Upload},
    domain::{BulkDeleteResult, FileItem},
};

/// Uploaded assets under `/api/admin/files`. No update operation.
#[derive(Clone, Debug)]
pub struct AdminFileApi {
    service: ApiService,
}

impl AdminFileApi {
    pub fn new(service: ApiService) -> Self {
        Self { service }
    }

    /// GET /files, optionally only under `folder`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list(&self, folder: Option<&str>) -> Result<Vec<FileItem>, ApiError> {
        let query = folder
            .map(|f| vec![("folder".to_string(), f.to_string())])
            .unwrap_or_default();
        self.service.get_with_query("/files", query).await
    }

    /// POST /files/upload as multipart; `on_progress` receives 0.0..=1.0.
    #[tracing::instrument(level = "debug", skip(self, bytes, on_progress), fields(size = bytes.len()))]
    pub async fn upload<F>(
        &self,
        folder: &str,
        file_name: &str,
        bytes: Bytes,
        on_progress: F,
    ) -> Result<FileItem, ApiError>
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let content_type = mime_guess::from_path(file_name)
            .first()
            .map(|m| m.essence_str().to_string());
        let upload = Upload {
            field: "file".into(),
            file_name: file_name.to_string(),
            bytes,
            content_type,
            fields: vec![("folder".into(), folder.to_string())],
        };
        self.service.upload("/files/upload", upload, on_progress).await
    }

    /// DELETE /files with `{url}`
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete(&self, url: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .service
            .delete_with_body("/files", &json!({ "url": url }))
            .await?;
        Ok(())
    }

    /// DELETE /files/bulk with `{urls}`. The batch succeeds or fails as one unit.
    #[tracing::instrument(level = "debug", skip(self, urls), fields(count = urls.len()))]
    pub async fn delete_many(&self, urls: &[String]) -> Result<BulkDeleteResult, ApiError> {
        let result: Option<BulkDeleteResult> = self
            .service
            .delete_with_body("/files/bulk", &json!({ "urls": urls }))
            .await?;
        Ok(result.unwrap_or_default())
    }
}
