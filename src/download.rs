//! Lead capture and ebook download: validate the visitor form, request a signed URL,
//! fetch the file from the storage origin and write it to disk.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::Context;
use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::{
    api::EbookApi,
    api_client::{ApiError, ApiService},
    domain::{DownloadGrant, LeadForm},
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    Name,
    Email,
    Mobile,
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LeadField::Name => "name",
            LeadField::Email => "email",
            LeadField::Mobile => "mobile",
        })
    }
}

/// Every field problem found in one pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid download form: {}", describe(.errors))]
pub struct ValidationError {
    pub errors: Vec<(LeadField, String)>,
}

fn describe(errors: &[(LeadField, String)]) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Save(#[from] anyhow::Error),
}

/// Trim the fields and normalise the mobile number to digits with an optional leading '+'.
pub fn normalize_lead(form: &LeadForm) -> LeadForm {
    let mobile = form.mobile.trim();
    let (plus, rest) = match mobile.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", mobile),
    };
    let digits: String = rest.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    LeadForm {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        mobile: format!("{plus}{digits}"),
    }
}

/// Name non-blank, email shaped like an address, mobile 10-15 digits.
pub fn validate_lead(form: &LeadForm) -> Result<LeadForm, ValidationError> {
    let form = normalize_lead(form);
    let mut errors = vec![];
    if form.name.is_empty() {
        errors.push((LeadField::Name, "is required".to_string()));
    }
    if form.email.is_empty() {
        errors.push((LeadField::Email, "is required".to_string()));
    } else if !EMAIL_RE.is_match(&form.email) {
        errors.push((LeadField::Email, "is not a valid address".to_string()));
    }
    let digits = form.mobile.trim_start_matches('+');
    if digits.is_empty() {
        errors.push((LeadField::Mobile, "is required".to_string()));
    } else if !digits.chars().all(|c| c.is_ascii_digit()) || !(10..=15).contains(&digits.len())
    {
        errors.push((LeadField::Mobile, "must be 10 to 15 digits".to_string()));
    }
    if errors.is_empty() {
        Ok(form)
    } else {
        Err(ValidationError { errors })
    }
}

/// File name for the saved copy: the grant's, else the URL's last segment, else `<slug>.pdf`.
pub fn file_name_for(grant: &DownloadGrant, slug: &str) -> String {
    let from_grant = grant.file_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let from_url = || {
        url::Url::parse(&grant.download_url).ok().and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back())
                .map(|n| percent_decode_str(n).decode_utf8_lossy().into_owned())
                .filter(|n| !n.trim().is_empty())
        })
    };
    let name = from_grant
        .map(str::to_string)
        .or_else(from_url)
        .unwrap_or_else(|| format!("{slug}.pdf"));
    // keep the saved file inside the target directory
    name.replace(['/', '\\'], "_")
}

#[derive(Debug, Clone)]
pub struct DownloadFlow {
    ebooks: EbookApi,
    transport: ApiService,
}

impl DownloadFlow {
    pub fn new(ebooks: EbookApi, transport: ApiService) -> Self {
        DownloadFlow { ebooks, transport }
    }

    /// Validate, record the lead, fetch the signed URL and save it under `dest_dir`.
    #[tracing::instrument(level = "debug", skip(self, form))]
    pub async fn run(
        &self,
        slug: &str,
        form: &LeadForm,
        dest_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let form = validate_lead(form)?;
        let grant = self.ebooks.request_download(slug, &form).await?;
        tracing::debug!(url = %grant.download_url, "download granted");

        let bytes = self.transport.fetch_bytes(&grant.download_url).await?;
        let path = dest_dir.join(file_name_for(&grant, slug));
        tokio::fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("Failed to create {}", dest_dir.display()))?;
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved ebook");
        Ok(path)
    }
}
