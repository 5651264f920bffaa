use std::sync::Arc;
use crate::{
    auth::TokenVerifier,
    config::Settings,
    service::ServiceContext,
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub settings: Arc<Settings>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        settings: Arc<Settings>,
        verifier: Arc<TokenVerifier>,
    ) -> Self {
        Self {
            service_context,
            settings,
            verifier,
        }
    }
}
