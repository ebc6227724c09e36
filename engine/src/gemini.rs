use std::{future::Future, pin::Pin, time::Duration};

use crate::{config::Config, credential::Credential, error::Result};

pub mod gemini_api;
pub use gemini_api::ApiError;
use gemini_api::{
    Endpoint, GenerateContentRequest, GenerateContentResponse, PredictRequest, PredictResponse,
};

pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The remote side of an invocation. Every operation is one call to one of these.
pub trait Service {
    fn generate_content<'a>(
        &'a self,
        model: &'a str,
        body: &'a GenerateContentRequest,
    ) -> ServiceFuture<'a, GenerateContentResponse>;

    fn predict<'a>(
        &'a self,
        model: &'a str,
        body: &'a PredictRequest,
    ) -> ServiceFuture<'a, PredictResponse>;
}

#[derive(Clone)]
pub struct GeminiClient {
    credential: Credential,
    api_base: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(credential: Credential, config: &Config) -> Self {
        Self {
            credential,
            api_base: config.api_base.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> Endpoint<'_> {
        Endpoint {
            api_base: &self.api_base,
            api_key: self.credential.expose(),
            timeout: self.timeout,
        }
    }
}

impl Service for GeminiClient {
    fn generate_content<'a>(
        &'a self,
        model: &'a str,
        body: &'a GenerateContentRequest,
    ) -> ServiceFuture<'a, GenerateContentResponse> {
        Box::pin(async move {
            gemini_api::generate_content(&self.endpoint(), model, body, &self.client).await
        })
    }

    fn predict<'a>(
        &'a self,
        model: &'a str,
        body: &'a PredictRequest,
    ) -> ServiceFuture<'a, PredictResponse> {
        Box::pin(async move { gemini_api::predict(&self.endpoint(), model, body, &self.client).await })
    }
}
