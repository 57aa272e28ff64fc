//! Request building and the send loop behind [`ApiClient::call`].

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{AccessTokenProvider, TokenHeaderProvider, TokenSecret},
	client::ApiClient,
	error::{ConfigError, TransportError},
	http::{
		self, ApiHttpClient, HttpRequest, TransportErrorMapper,
		http::{
			HeaderName, HeaderValue, Request, StatusCode,
			header::{AUTHORIZATION, CONTENT_TYPE},
		},
	},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{ApiRequest, AuthScheme, RequestDescriptor, RequestDescriptorError},
};

/// Upper bound on sends per call: the original attempt plus one forbidden retry.
pub const MAX_ATTEMPTS: u8 = 2;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Credential strategy resolved from a request's [`AuthScheme`].
#[derive(Clone, Copy)]
enum Credential<'a> {
	None,
	OAuth2(&'a dyn AccessTokenProvider),
	TokenHeader(&'a dyn TokenHeaderProvider),
}
impl Credential<'_> {
	async fn attach(self, request: &mut HttpRequest) -> Result<()> {
		match self {
			Credential::None => Ok(()),
			Credential::OAuth2(provider) => {
				let token = provider.access_token().await?;

				set_bearer(request, &token)
			},
			Credential::TokenHeader(provider) =>
				set_header(request, provider.header_name(), provider.secret()),
		}
	}
}

impl<C, M> ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends `request` and hands the exchange to its response builder.
	///
	/// Requests tagged [`AuthScheme::OAuth2`] that receive `403 Forbidden` trigger exactly one
	/// token refresh and one resend of the same request; the second response is passed to the
	/// builder whatever its status.
	pub async fn call<R>(&self, request: &R) -> Result<Option<R::Output>>
	where
		R: ?Sized + ApiRequest,
	{
		const KIND: FlowKind = FlowKind::Call;

		let span = FlowSpan::new(KIND, "call");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.dispatch(request)).await;

		obs::record_result(KIND, &result);

		result
	}

	async fn dispatch<R>(&self, request: &R) -> Result<Option<R::Output>>
	where
		R: ?Sized + ApiRequest,
	{
		let descriptor = request.descriptor();
		let credential = self.credential(descriptor.auth);
		let mut http_request = self.build_request(descriptor)?;

		credential.attach(&mut http_request).await?;

		let mut attempt = 1;
		let response = loop {
			let response = http::send(
				self.http_client.as_ref(),
				self.transport_mapper.as_ref(),
				http::copy_request(&http_request),
			)
			.await?;

			match credential {
				Credential::OAuth2(provider)
					if attempt < MAX_ATTEMPTS && response.status() == StatusCode::FORBIDDEN =>
				{
					obs::warn("API responded 403 Forbidden; refreshing the access token once.");

					let token = provider.refresh_access_token().await?;

					set_bearer(&mut http_request, &token)?;

					attempt += 1;
				},
				_ => break response,
			}
		};

		request.build_response(&http_request, &response).map_err(Error::response_parse)
	}

	fn credential(&self, scheme: AuthScheme) -> Credential<'_> {
		match (scheme, &self.oauth2, &self.token_header) {
			(AuthScheme::OAuth2, Some(provider), _) => Credential::OAuth2(provider.as_ref()),
			(AuthScheme::TokenHeader, _, Some(provider)) =>
				Credential::TokenHeader(provider.as_ref()),
			_ => Credential::None,
		}
	}

	fn build_request(&self, descriptor: &RequestDescriptor) -> Result<HttpRequest> {
		let mut builder =
			Request::builder().method(descriptor.method.to_http()).uri(self.request_uri(descriptor));

		for (name, value) in &descriptor.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		let mut request = builder.body(Vec::new()).map_err(TransportError::malformed_request)?;

		if descriptor.method.requires_body() {
			let body = descriptor
				.body
				.as_ref()
				.filter(|body| !body.is_null())
				.ok_or(RequestDescriptorError::MissingBody { method: descriptor.method })?;

			encode_body(&mut request, body)?;
		}

		Ok(request)
	}

	fn request_uri(&self, descriptor: &RequestDescriptor) -> String {
		let mut uri = self.base_uri.join(&descriptor.path);

		if let Some(query) = descriptor.encoded_query() {
			if let Some(start) = uri.find('?') {
				uri.truncate(start);
			}

			uri.push('?');
			uri.push_str(&query);
		}

		uri
	}
}

fn encode_body(request: &mut HttpRequest, body: &Value) -> Result<()> {
	let declared = request
		.headers()
		.get(CONTENT_TYPE)
		.filter(|value| !value.is_empty())
		.map(|value| value.to_str().map(ToOwned::to_owned))
		.transpose()
		.map_err(TransportError::malformed_request)?;
	let content_type = match declared {
		Some(content_type) => content_type,
		None => {
			request.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

			JSON_CONTENT_TYPE.to_owned()
		},
	};

	if !content_type.contains(JSON_CONTENT_TYPE) {
		return Err(ConfigError::UnsupportedContentType { content_type }.into());
	}

	*request.body_mut() = serde_json::to_vec(body).map_err(TransportError::malformed_request)?;

	Ok(())
}

fn set_bearer(request: &mut HttpRequest, token: &TokenSecret) -> Result<()> {
	set_header(request, AUTHORIZATION.as_str(), &format!("Bearer {}", token.expose()))
}

fn set_header(request: &mut HttpRequest, name: &str, value: &str) -> Result<()> {
	let name =
		HeaderName::from_bytes(name.as_bytes()).map_err(TransportError::malformed_request)?;
	let mut value = HeaderValue::from_str(value).map_err(TransportError::malformed_request)?;

	value.set_sensitive(true);
	request.headers_mut().insert(name, value);

	Ok(())
}
