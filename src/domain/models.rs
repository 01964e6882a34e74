// Payload shapes exchanged with the portal backend. No behavior beyond small accessors.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============ Pagination ============

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    /// Used when a list route answers without a pagination block.
    pub fn single_page(len: usize) -> Self {
        let len = len as u64;
        Pagination {
            page: 1,
            limit: len,
            total: len,
            pages: u64::from(len > 0),
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

// ============ Ebooks ============

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EbookStatus {
    #[default]
    Active,
    Inactive,
}

impl EbookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EbookStatus::Active => "active",
            EbookStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ebook {
    #[serde(alias = "_id")]
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// URL of the stored PDF
    pub pdf: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    #[serde(
        deserialize_with = "crate::domain::de::opt_i64_from_str_or_num",
        default
    )]
    pub page_count: Option<i64>,
    #[serde(deserialize_with = "crate::domain::de::u64_lenient", default)]
    pub download_count: u64,
    #[serde(deserialize_with = "crate::domain::de::u64_lenient", default)]
    pub view_count: u64,
    #[serde(default)]
    pub status: EbookStatus,
    #[serde(default)]
    pub position: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ebook {
    pub fn is_active(&self) -> bool {
        self.status == EbookStatus::Active
    }
}

/// Admin create/update payload. Unset fields are left out of the request body.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EbookInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EbookStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EbookPosition {
    pub id: String,
    pub position: i64,
}

/// Visitor details submitted with a download request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub mobile: String,
}

/// Recipient of an ebook sent from the admin console.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendEbookRequest {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadGrant {
    /// Signed URL, usually on the storage origin rather than the API origin
    #[serde(alias = "url")]
    pub download_url: String,
    pub file_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

// ============ Leads / download analytics ============

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadType {
    /// Visitor filled in the download form
    #[default]
    User,
    /// Sent from the admin console
    Admin,
}

impl LeadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadType::User => "user",
            LeadType::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EbookSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// Lead routes return the ebook either populated or as a bare id.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum EbookRef {
    Id(String),
    Summary(EbookSummary),
}

impl EbookRef {
    pub fn id(&self) -> &str {
        match self {
            EbookRef::Id(id) => id,
            EbookRef::Summary(s) => &s.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            EbookRef::Id(_) => None,
            EbookRef::Summary(s) => s.name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EbookUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub ebook: Option<EbookRef>,
    #[serde(rename = "type", default)]
    pub kind: LeadType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(alias = "createdAt")]
    pub downloaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_sent: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopEbook {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    #[serde(deserialize_with = "crate::domain::de::u64_lenient", default)]
    pub download_count: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DailyCount {
    #[serde(alias = "_id")]
    pub date: String,
    #[serde(deserialize_with = "crate::domain::de::u64_lenient", default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    #[serde(deserialize_with = "crate::domain::de::u64_lenient")]
    pub total_ebooks: u64,
    #[serde(deserialize_with = "crate::domain::de::u64_lenient")]
    pub active_ebooks: u64,
    #[serde(deserialize_with = "crate::domain::de::u64_lenient")]
    pub total_downloads: u64,
    #[serde(deserialize_with = "crate::domain::de::u64_lenient")]
    pub total_leads: u64,
    #[serde(deserialize_with = "crate::domain::de::u64_lenient")]
    pub total_views: u64,
    pub top_ebooks: Vec<TopEbook>,
    pub downloads_over_time: Vec<DailyCount>,
    #[serde(deserialize_with = "crate::domain::de::counts_lenient")]
    pub downloads_by_type: HashMap<String, u64>,
}

// ============ Files ============

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub url: String,
    /// Storage key, e.g. "ebooks/covers/intro.png"
    #[serde(alias = "key")]
    pub path: String,
    #[serde(deserialize_with = "crate::domain::de::u64_lenient", default)]
    pub size: u64,
    #[serde(alias = "lastModified")]
    pub uploaded_at: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
}

impl FileItem {
    /// Everything before the last '/', or "" for root-level files.
    pub fn folder(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.path
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkDeleteResult {
    #[serde(deserialize_with = "crate::domain::de::u64_lenient")]
    pub deleted_count: u64,
}

// ============ Blog ============

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(alias = "_id")]
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: BlogStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BlogStatus>,
}

// ============ Auth ============

/// Roles are kept verbatim; only admin and author unlock the console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Author,
    Other(String),
}

impl Role {
    pub fn can_use_console(&self) -> bool {
        matches!(self, Role::Admin | Role::Author)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Role::Admin,
            "author" => Role::Author,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Admin => "admin".into(),
            Role::Author => "author".into(),
            Role::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl SessionUser {
    pub fn can_use_console(&self) -> bool {
        self.role.as_ref().is_some_and(Role::can_use_console)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: Option<String>,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

// ============ Queries ============

fn push_opt(q: &mut Vec<(String, String)>, key: &str, value: Option<impl ToString>) {
    if let Some(v) = value {
        q.push((key.to_string(), v.to_string()));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EbookQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
    /// Admin only; public routes only ever return active ebooks
    pub status: Option<EbookStatus>,
}

impl EbookQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = vec![];
        push_opt(&mut q, "page", self.page);
        push_opt(&mut q, "limit", self.limit);
        push_opt(&mut q, "category", self.category.as_deref());
        push_opt(&mut q, "search", self.search.as_deref());
        push_opt(&mut q, "tag", self.tag.as_deref());
        push_opt(&mut q, "status", self.status.map(|s| s.as_str()));
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub ebook_id: Option<String>,
    pub kind: Option<LeadType>,
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DownloadQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = vec![];
        push_opt(&mut q, "page", self.page);
        push_opt(&mut q, "limit", self.limit);
        push_opt(&mut q, "ebookId", self.ebook_id.as_deref());
        push_opt(&mut q, "type", self.kind.map(|k| k.as_str()));
        push_opt(&mut q, "search", self.search.as_deref());
        push_opt(&mut q, "from", self.from.map(|d| d.format("%Y-%m-%d")));
        push_opt(&mut q, "to", self.to.map(|d| d.format("%Y-%m-%d")));
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub status: Option<BlogStatus>,
}

impl BlogQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = vec![];
        push_opt(&mut q, "page", self.page);
        push_opt(&mut q, "limit", self.limit);
        push_opt(&mut q, "tag", self.tag.as_deref());
        push_opt(&mut q, "search", self.search.as_deref());
        push_opt(
            &mut q,
            "status",
            self.status.map(|s| match s {
                BlogStatus::Draft => "draft",
                BlogStatus::Published => "published",
            }),
        );
        q
    }
}
