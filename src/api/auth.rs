use crate::{
    api_client::{ApiError, ApiService},
    domain::{LoginRequest, LoginResponse},
};

#[derive(Clone, Debug)]
pub struct AuthApi {
    service: ApiService,
}

impl AuthApi {
    pub fn new(service: ApiService) -> Self {
        Self { service }
    }

    /// POST /auth/login, then persist the result in the session.
    #[tracing::instrument(level = "debug", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response: LoginResponse = self
            .service
            .post("/auth/login", &LoginRequest { email, password })
            .await?;
        self.service.session().login(&response).await?;
        Ok(response)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.service.session().logout().await?;
        Ok(())
    }
}
