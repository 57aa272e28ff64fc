//! Calls a mock API through the default reqwest transport: the first request exchanges client
//! credentials for a token, the second reuses the cached token from the in-memory store.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
// self
use oauth2_api_client::{
	client::ApiClientFactory,
	config::{ApiClientConfig, BaseUri, OAuth2Config},
	request::{JsonRequest, RequestDescriptor},
	store::MemoryStore,
	url::Url,
};

#[derive(Debug, Deserialize)]
struct Account {
	id: String,
	name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}");
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/accounts/42").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"42\",\"name\":\"Acme\"}");
		})
		.await;
	let factory = ApiClientFactory::new(Arc::new(MemoryStore::default()));
	let client = factory.build(ApiClientConfig {
		base_uri: BaseUri::new(server.base_url())?,
		oauth2: Some(OAuth2Config::new(
			Url::parse(&server.url("/oauth/token"))?,
			"demo-client",
			"super-secret",
		)),
		bearer_token: None,
	});
	let request: JsonRequest<Account> =
		JsonRequest::new(RequestDescriptor::builder("GET", "/v1/accounts/42").oauth2().build()?);

	for _ in 0..2 {
		if let Some(account) = client.call(&request).await? {
			println!("Fetched account {} ({}).", account.id, account.name);
		}
	}

	token_mock.assert_calls_async(1).await;
	api_mock.assert_calls_async(2).await;

	Ok(())
}
