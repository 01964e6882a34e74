// One module per backend resource. Public and admin routes go through separate ApiService instances.

pub mod auth;
pub mod blogs;
pub mod downloads;
pub mod ebooks;
pub mod files;

use std::time::Duration;

pub use auth::AuthApi;
pub use blogs::{AdminBlogApi, BlogApi};
pub use downloads::AdminDownloadApi;
pub use ebooks::{AdminEbookApi, EbookApi};
pub use files::AdminFileApi;

use crate::{
    api_client::{ApiError, ApiService},
    session::Session,
};

/// Strip any trailing "/" and "/api" so per-surface prefixes can be re-appended.
pub fn api_origin(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/api")
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}

/// Percent-encode one path segment (ids, slugs).
pub(crate) fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Both API surfaces, sharing one session.
#[derive(Clone, Debug)]
pub struct PortalApi {
    public: ApiService,
    admin: ApiService,
}

impl PortalApi {
    pub fn new(base_url: &str, session: Session, timeout: Duration) -> Result<Self, ApiError> {
        let origin = api_origin(base_url);
        tracing::debug!(%origin, "configuring portal API");
        let public =
            ApiService::new(format!("{origin}/api"), session.clone())?.with_timeout(timeout);
        let admin = ApiService::new(format!("{origin}/api/admin"), session)?
            .with_auth(true)
            .with_timeout(timeout);
        Ok(PortalApi { public, admin })
    }

    pub fn session(&self) -> &Session {
        self.public.session()
    }

    pub fn public_service(&self) -> &ApiService {
        &self.public
    }

    pub fn admin_service(&self) -> &ApiService {
        &self.admin
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.public.clone())
    }

    pub fn ebooks(&self) -> EbookApi {
        EbookApi::new(self.public.clone())
    }

    pub fn blogs(&self) -> BlogApi {
        BlogApi::new(self.public.clone())
    }

    pub fn admin_ebooks(&self) -> AdminEbookApi {
        AdminEbookApi::new(self.admin.clone())
    }

    pub fn admin_downloads(&self) -> AdminDownloadApi {
        AdminDownloadApi::new(self.admin.clone())
    }

    pub fn admin_files(&self) -> AdminFileApi {
        AdminFileApi::new(self.admin.clone())
    }

    pub fn admin_blogs(&self) -> AdminBlogApi {
        AdminBlogApi::new(self.admin.clone())
    }
}
