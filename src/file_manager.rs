//! Headless file-manager view: list, filter, select and bulk-delete uploaded assets.

use std::collections::BTreeSet;

use crate::{
    api::AdminFileApi,
    api_client::ApiError,
    domain::{BulkDeleteResult, FileItem},
};

#[derive(Debug)]
pub struct FileManager {
    api: AdminFileApi,
    files: Vec<FileItem>,
    search: String,
    folder: Option<String>,
    selected: BTreeSet<String>,
}

impl FileManager {
    pub fn new(api: AdminFileApi) -> Self {
        FileManager {
            api,
            files: vec![],
            search: String::new(),
            folder: None,
            selected: BTreeSet::new(),
        }
    }

    /// Reload the listing. Selections for files that disappeared are dropped.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn refresh(&mut self) -> Result<usize, ApiError> {
        let files = self.api.list(None).await?;
        self.set_files(files);
        Ok(self.files.len())
    }

    pub fn set_files(&mut self, files: Vec<FileItem>) {
        self.files = files;
        let present: BTreeSet<&str> = self.files.iter().map(|f| f.url.as_str()).collect();
        self.selected.retain(|url| present.contains(url.as_str()));
    }

    pub fn files(&self) -> &[FileItem] {
        &self.files
    }

    /// Case-insensitive substring match on the storage path.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// Only show files whose path starts with this folder. `None` shows everything.
    pub fn set_folder(&mut self, folder: Option<String>) {
        self.folder = folder.map(|f| f.trim_matches('/').to_string()).filter(|f| !f.is_empty());
    }

    /// Distinct folders present in the listing, sorted.
    pub fn folders(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|f| f.folder())
            .filter(|f| !f.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn matches(&self, file: &FileItem) -> bool {
        let in_folder = match self.folder.as_deref() {
            None => true,
            Some(folder) => file
                .path
                .strip_prefix(folder)
                .is_some_and(|rest| rest.starts_with('/')),
        };
        let needle = self.search.trim().to_lowercase();
        in_folder && (needle.is_empty() || file.path.to_lowercase().contains(&needle))
    }

    pub fn visible(&self) -> Vec<&FileItem> {
        self.files.iter().filter(|f| self.matches(f)).collect()
    }

    /// Flip selection of one URL; returns whether it is now selected.
    pub fn toggle(&mut self, url: &str) -> bool {
        if self.selected.remove(url) {
            return false;
        }
        if self.files.iter().any(|f| f.url == url) {
            self.selected.insert(url.to_string());
            return true;
        }
        false
    }

    pub fn select_all_visible(&mut self) {
        let urls: Vec<String> = self.visible().into_iter().map(|f| f.url.clone()).collect();
        self.selected.extend(urls);
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    /// Delete every selected file in one batched call.
    ///
    /// The batch is all-or-nothing from the caller's view: on error nothing is
    /// removed locally and the selection is kept.
    #[tracing::instrument(level = "debug", skip(self), fields(count = self.selected.len()))]
    pub async fn delete_selected(&mut self) -> Result<BulkDeleteResult, ApiError> {
        if self.selected.is_empty() {
            return Ok(BulkDeleteResult::default());
        }
        let urls = self.selected();
        let result = match self.api.delete_many(&urls).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, count = urls.len(), "bulk delete failed");
                return Err(e);
            }
        };
        self.files.retain(|f| !self.selected.contains(&f.url));
        self.selected.clear();
        tracing::info!(count = urls.len(), "deleted files");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::PortalApi, session::Session};

    fn item(path: &str) -> FileItem {
        FileItem {
            url: format!("https://cdn.example.com/{path}"),
            path: path.to_string(),
            size: 10,
            uploaded_at: None,
            content_type: None,
        }
    }

    fn manager() -> FileManager {
        let api = PortalApi::new(
            "http://127.0.0.1:9/api",
            Session::in_memory(),
            std::time::Duration::from_secs(1),
        )
        .unwrap();
        let mut fm = FileManager::new(api.admin_files());
        fm.set_files(vec![
            item("ebooks/covers/IELTS.png"),
            item("ebooks/pdfs/ielts.pdf"),
            item("blog/hero.jpg"),
            item("ebooks-old/legacy.pdf"),
            item("logo.svg"),
        ]);
        fm
    }

    #[test]
    fn search_is_case_insensitive_over_path() {
        let mut fm = manager();
        fm.set_search("ielts");
        let paths: Vec<&str> = fm.visible().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["ebooks/covers/IELTS.png", "ebooks/pdfs/ielts.pdf"]);
    }

    #[test]
    fn folder_filter_is_a_path_prefix() {
        let mut fm = manager();
        fm.set_folder(Some("ebooks/".into()));
        let paths: Vec<&str> = fm.visible().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["ebooks/covers/IELTS.png", "ebooks/pdfs/ielts.pdf"]);

        fm.set_folder(None);
        assert_eq!(fm.visible().len(), 5);
        assert_eq!(
            fm.folders(),
            vec!["blog", "ebooks-old", "ebooks/covers", "ebooks/pdfs"]
        );
    }

    #[test]
    fn selection_tracks_known_urls() {
        let mut fm = manager();
        assert!(fm.toggle("https://cdn.example.com/logo.svg"));
        assert!(!fm.toggle("https://cdn.example.com/unknown"));
        assert!(!fm.toggle("https://cdn.example.com/logo.svg"));

        fm.set_search("pdf");
        fm.select_all_visible();
        assert_eq!(fm.selected().len(), 2);

        // refreshing with fewer files drops stale selections
        fm.set_files(vec![item("ebooks/pdfs/ielts.pdf")]);
        assert_eq!(fm.selected(), vec!["https://cdn.example.com/ebooks/pdfs/ielts.pdf"]);

        fm.clear_selection();
        assert!(fm.selected().is_empty());
    }
}
