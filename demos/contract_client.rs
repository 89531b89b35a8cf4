//! Demonstrates a configured contract client calling an OAuth2-protected API with the default reqwest
//! transport; the token is requested once and reused for the following calls.

// std
use std::{borrow::Cow, collections::BTreeMap};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::{Deserialize, Serialize};
// self
use contract_rest_client::{
	ApiClientBuilder, HttpMethod, Request, RequestMeta, config::SectionConfig,
};

#[derive(Debug, Deserialize)]
struct Order {
	id: u32,
	status: String,
}

#[derive(Debug, Serialize)]
struct ListOrders {
	#[serde(rename = "Status")]
	status: &'static str,
	#[serde(flatten)]
	meta: RequestMeta,
}
impl Request for ListOrders {
	type Response = Vec<Order>;

	fn resource(&self) -> Cow<'_, str> {
		Cow::Borrowed("orders")
	}

	fn method(&self) -> HttpMethod {
		HttpMethod::Get
	}

	fn configuration_key(&self) -> &str {
		"orders"
	}

	fn meta(&self) -> &RequestMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RequestMeta {
		&mut self.meta
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let orders_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/orders/api/orders")
				.query_param("Status", "open")
				.header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body(
				"{\"data\":[{\"id\":1,\"status\":\"open\"},{\"id\":2,\"status\":\"open\"}]}",
			);
		})
		.await;
	let settings = SectionConfig::default()
		.with_api_value("orders", "BaseUrl", server.url("/orders/api"))
		.with_api_value("orders", "Authentication", "oauth2")
		.with_api_value("orders", "Audience", "orders-api")
		.with_api_value("orders", "Timeout", "00:00:05")
		.with_shared_value("Issuer", server.url("/token"))
		.with_shared_value("ClientId", "demo-client")
		.with_shared_value("ClientSecret", "super-secret");
	let client = ApiClientBuilder::new()
		.configure_from(&settings)?
		.with_headers_function(|| BTreeMap::from([("X-Caller".into(), "demo".into())]))
		.build()?;

	for _ in 0..2 {
		let mut request = ListOrders { status: "open", meta: RequestMeta::default() };
		let orders = client.call(&mut request).await?;

		for order in orders {
			println!("Order {} is {}.", order.id, order.status);
		}
	}

	token_mock.assert_calls_async(1).await;
	orders_mock.assert_calls_async(2).await;

	Ok(())
}
