//! API request descriptors (data) and response builders (behavior).
//!
//! `RequestDescriptor` is the validated, immutable description of one API call: method,
//! path, query, headers, JSON body, and the [`AuthScheme`] tag selecting which credential the
//! dispatcher attaches. [`ApiRequest`] pairs a descriptor with the hook that turns the raw
//! transport response into the caller's result type.

/// Builder API for assembling request descriptors.
pub mod builder;
/// JSON response decoding helpers.
pub mod decode;

pub use builder::*;
pub use decode::*;

// std
use std::marker::PhantomData;
// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::BoxError,
	http::{HttpRequest, HttpResponse, http},
};

/// HTTP methods accepted by request descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `HEAD`
	Head,
	/// `POST`; requires a body.
	Post,
	/// `PUT`; requires a body.
	Put,
	/// `DELETE`
	Delete,
	/// `OPTIONS`
	Options,
	/// `PATCH`
	Patch,
}
impl Method {
	/// Returns the canonical upper-case method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Head => "HEAD",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
			Method::Options => "OPTIONS",
			Method::Patch => "PATCH",
		}
	}

	/// Returns `true` for methods whose requests must carry an encoded body.
	pub const fn requires_body(self) -> bool {
		matches!(self, Method::Post | Method::Put)
	}

	pub(crate) fn to_http(self) -> http::Method {
		match self {
			Method::Get => http::Method::GET,
			Method::Head => http::Method::HEAD,
			Method::Post => http::Method::POST,
			Method::Put => http::Method::PUT,
			Method::Delete => http::Method::DELETE,
			Method::Options => http::Method::OPTIONS,
			Method::Patch => http::Method::PATCH,
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Method {
	type Err = RequestDescriptorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"GET" => Ok(Method::Get),
			"HEAD" => Ok(Method::Head),
			"POST" => Ok(Method::Post),
			"PUT" => Ok(Method::Put),
			"DELETE" => Ok(Method::Delete),
			"OPTIONS" => Ok(Method::Options),
			"PATCH" => Ok(Method::Patch),
			other => Err(RequestDescriptorError::UnsupportedMethod { method: other.to_owned() }),
		}
	}
}

/// Credential capability of a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
	/// Sent without credentials.
	#[default]
	None,
	/// Bearer token from the OAuth 2.0 client-credentials provider, with the forbidden retry.
	#[serde(rename = "oauth2")]
	OAuth2,
	/// Fixed header from the static token header provider.
	TokenHeader,
}

/// Value bound to a query parameter key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
	/// Single `key=value` pair.
	Single(String),
	/// Repeated `key=value` pairs, one per element, in order.
	List(Vec<String>),
}
impl From<String> for QueryValue {
	fn from(value: String) -> Self {
		Self::Single(value)
	}
}
impl From<&str> for QueryValue {
	fn from(value: &str) -> Self {
		Self::Single(value.to_owned())
	}
}
impl From<Vec<String>> for QueryValue {
	fn from(values: Vec<String>) -> Self {
		Self::List(values)
	}
}

/// Encoding applied to list-valued query parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryListStyle {
	/// `tag=a&tag=b`
	#[default]
	Repeat,
	/// `tag[0]=a&tag[1]=b`, as PHP-style backends expect.
	Indexed,
}

/// Immutable description of one API call.
///
/// Deserialization goes through [`RequestDescriptorBuilder::build`], so serialized descriptors
/// are validated the same way built ones are.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RequestDescriptorBuilder")]
pub struct RequestDescriptor {
	/// HTTP method.
	pub method: Method,
	/// Root-relative path joined to the client's base URI, or an absolute URI used verbatim.
	pub path: String,
	/// Query parameters in insertion order; keys are unique.
	pub query: Vec<(String, QueryValue)>,
	/// Encoding of list-valued query parameters.
	pub list_style: QueryListStyle,
	/// Request headers; names are unique.
	pub headers: BTreeMap<String, String>,
	/// JSON body; always present and non-null for `POST` and `PUT`.
	pub body: Option<Value>,
	/// Credential capability tag.
	pub auth: AuthScheme,
}
impl RequestDescriptor {
	/// Creates a new builder for the given method name and path.
	pub fn builder(method: impl AsRef<str>, path: impl Into<String>) -> RequestDescriptorBuilder {
		RequestDescriptorBuilder::new(method, path)
	}

	/// Form-encodes the query parameters, spelling list values per [`QueryListStyle`].
	pub fn encoded_query(&self) -> Option<String> {
		if self.query.is_empty() {
			return None;
		}

		let mut serializer = url::form_urlencoded::Serializer::new(String::new());

		for (key, value) in &self.query {
			match value {
				QueryValue::Single(value) => {
					serializer.append_pair(key, value);
				},
				QueryValue::List(values) => match self.list_style {
					QueryListStyle::Repeat =>
						for value in values {
							serializer.append_pair(key, value);
						},
					QueryListStyle::Indexed =>
						for (i, value) in values.iter().enumerate() {
							serializer.append_pair(&format!("{key}[{i}]"), value);
						},
				},
			}
		}

		Some(serializer.finish())
	}
}

/// An API call together with the hook that parses its response.
pub trait ApiRequest
where
	Self: Send + Sync,
{
	/// Parsed result produced from a successful exchange.
	type Output: Send;

	/// Describes the call to dispatch.
	fn descriptor(&self) -> &RequestDescriptor;

	/// Builds the caller's result from the request that was sent and the response received.
	///
	/// `Ok(None)` means no payload is expected. Any `Err` is surfaced as
	/// [`Error::ResponseParse`](crate::error::Error::ResponseParse).
	fn build_response(
		&self,
		request: &HttpRequest,
		response: &HttpResponse,
	) -> Result<Option<Self::Output>, BoxError>;
}

/// Request whose successful JSON response decodes into `T`.
///
/// Empty bodies produce `None`; statuses outside `2xx` are reported as
/// [`ResponseParseError::UnexpectedStatus`].
pub struct JsonRequest<T> {
	descriptor: RequestDescriptor,
	_output: PhantomData<fn() -> T>,
}
impl<T> JsonRequest<T> {
	/// Wraps a validated descriptor.
	pub fn new(descriptor: RequestDescriptor) -> Self {
		Self { descriptor, _output: PhantomData }
	}
}
impl<T> Clone for JsonRequest<T> {
	fn clone(&self) -> Self {
		Self::new(self.descriptor.clone())
	}
}
impl<T> Debug for JsonRequest<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JsonRequest").field("descriptor", &self.descriptor).finish()
	}
}
impl<T> ApiRequest for JsonRequest<T>
where
	T: 'static + Send + DeserializeOwned,
{
	type Output = T;

	fn descriptor(&self) -> &RequestDescriptor {
		&self.descriptor
	}

	fn build_response(
		&self,
		_request: &HttpRequest,
		response: &HttpResponse,
	) -> Result<Option<Self::Output>, BoxError> {
		if !response.status().is_success() {
			return Err(
				ResponseParseError::UnexpectedStatus { status: response.status().as_u16() }.into()
			);
		}
		if response.body().is_empty() {
			return Ok(None);
		}

		Ok(Some(decode_json(response)?))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn method_parsing_accepts_whitelist_only() {
		for name in ["GET", "HEAD", "POST", "PUT", "DELETE", "OPTIONS", "PATCH"] {
			let method = Method::from_str(name).expect("Whitelisted methods should parse.");

			assert_eq!(method.as_str(), name);
		}

		for name in ["TRACE", "CONNECT", "get", "", "PURGE"] {
			let err = Method::from_str(name).expect_err("Unsupported methods should be rejected.");

			assert!(matches!(err, RequestDescriptorError::UnsupportedMethod { .. }));
		}
	}

	#[test]
	fn only_post_and_put_require_a_body() {
		assert!(Method::Post.requires_body());
		assert!(Method::Put.requires_body());
		assert!(!Method::Patch.requires_body());
		assert!(!Method::Get.requires_body());
	}

	#[test]
	fn query_encoding_keeps_order_and_repeats_lists() {
		let descriptor = RequestDescriptor::builder("GET", "/v1/search")
			.query("a", "1")
			.query("b", "2")
			.query_list("tag", ["x y", "z&w"])
			.build()
			.expect("Descriptor should build.");

		assert_eq!(
			descriptor.encoded_query().as_deref(),
			Some("a=1&b=2&tag=x+y&tag=z%26w")
		);
	}

	#[test]
	fn indexed_list_style_numbers_each_element() {
		let descriptor = RequestDescriptor::builder("GET", "/v1/search")
			.query("a", "1")
			.query_list("tag", ["x", "y"])
			.list_style(QueryListStyle::Indexed)
			.build()
			.expect("Descriptor should build.");

		assert_eq!(
			descriptor.encoded_query().as_deref(),
			Some("a=1&tag%5B0%5D=x&tag%5B1%5D=y")
		);
	}

	#[test]
	fn json_request_decodes_success_and_skips_empty_bodies() {
		#[derive(Debug, Deserialize, PartialEq)]
		struct Item {
			id: String,
		}

		let request: JsonRequest<Item> = JsonRequest::new(
			RequestDescriptor::builder("GET", "/v1/id").build().expect("Descriptor should build."),
		);
		let sent = HttpRequest::new(Vec::new());
		let response = http::Response::builder()
			.status(200)
			.header("content-type", "application/json")
			.body(b"{\"id\":\"value\"}".to_vec())
			.expect("Response fixture should build.");
		let parsed = request.build_response(&sent, &response).expect("Payload should decode.");

		assert_eq!(parsed, Some(Item { id: "value".into() }));

		let empty = http::Response::builder()
			.status(204)
			.body(Vec::new())
			.expect("Response fixture should build.");

		assert!(request.build_response(&sent, &empty).expect("Empty body is fine.").is_none());

		let forbidden = http::Response::builder()
			.status(403)
			.body(Vec::new())
			.expect("Response fixture should build.");
		let err = request
			.build_response(&sent, &forbidden)
			.expect_err("Non-success statuses should be rejected.");

		assert_eq!(err.to_string(), "Response has unexpected status 403.");
	}
}
