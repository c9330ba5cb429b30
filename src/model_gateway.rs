use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::providers::{LlmError, openai};

pub type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LlmError>> + 'a>>;
pub type ModelListFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>, LlmError>> + 'a>>;

/// The two calls the dispatcher makes against a chat API.
pub trait ModelGateway {
    fn chat<'a>(
        &'a self,
        cfg: &'a Config,
        system_prompt: &'a str,
        user_text: &'a str,
    ) -> ChatFuture<'a>;

    fn list_models<'a>(&'a self, cfg: &'a Config) -> ModelListFuture<'a>;
}

/// Gateway backed by the OpenAI-compatible HTTP API.
pub struct HttpModelGateway<'a> {
    client: &'a Client,
}

impl<'a> HttpModelGateway<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl ModelGateway for HttpModelGateway<'_> {
    fn chat<'a>(
        &'a self,
        cfg: &'a Config,
        system_prompt: &'a str,
        user_text: &'a str,
    ) -> ChatFuture<'a> {
        Box::pin(openai::chat(self.client, cfg, system_prompt, user_text))
    }

    fn list_models<'a>(&'a self, cfg: &'a Config) -> ModelListFuture<'a> {
        Box::pin(openai::list_models(self.client, cfg))
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpModelGateway, ModelGateway};
    use crate::config::Config;
    use crate::providers::LlmError;
    use crate::test_support::{OneShotServer, test_client};

    #[tokio::test]
    async fn http_gateway_forwards_chat_to_provider() {
        let server = OneShotServer::start(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"hola"}}]}"#,
        );
        let client = test_client();
        let cfg = Config {
            base_url: server.base_url.clone(),
            api_key: "sk-test".to_string(),
            model: "m".to_string(),
        };
        let gateway = HttpModelGateway::new(&client);

        let content = gateway
            .chat(&cfg, "sys", "hello")
            .await
            .expect("gateway chat should succeed");
        assert_eq!(content, "hola");
        server.finish();
    }

    #[tokio::test]
    async fn http_gateway_preserves_provider_errors() {
        let client = test_client();
        let cfg = Config::default();
        let gateway = HttpModelGateway::new(&client);

        let err = gateway
            .chat(&cfg, "sys", "hello")
            .await
            .expect_err("missing key should fail");
        assert!(matches!(err, LlmError::MissingCredentials));
    }
}
