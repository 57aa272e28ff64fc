// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	request::{AuthScheme, Method, QueryListStyle, QueryValue, RequestDescriptor},
};

/// Errors raised while constructing or validating request descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RequestDescriptorError {
	/// Method name is outside the supported set.
	#[error("Unsupported HTTP method `{method}`.")]
	UnsupportedMethod {
		/// Method name that was supplied.
		method: String,
	},
	/// `POST` and `PUT` requests must carry a non-null body.
	#[error("A {method} request requires a body.")]
	MissingBody {
		/// Method that required the body.
		method: Method,
	},
}

/// Builder for [`RequestDescriptor`] values.
///
/// The method name is validated by [`build`](Self::build), so descriptors that exist are
/// always well formed.
#[derive(Debug, Deserialize)]
pub struct RequestDescriptorBuilder {
	/// Method name as supplied by the caller.
	pub method: String,
	/// Path or absolute URI.
	pub path: String,
	/// Query parameters in insertion order.
	#[serde(default)]
	pub query: Vec<(String, QueryValue)>,
	/// Encoding of list-valued query parameters.
	#[serde(default)]
	pub list_style: QueryListStyle,
	/// Request headers.
	#[serde(default)]
	pub headers: BTreeMap<String, String>,
	/// Optional JSON body.
	#[serde(default)]
	pub body: Option<Value>,
	/// Credential capability tag.
	#[serde(default)]
	pub auth: AuthScheme,
}
impl RequestDescriptorBuilder {
	/// Creates a new builder for the given method name and path.
	pub fn new(method: impl AsRef<str>, path: impl Into<String>) -> Self {
		Self {
			method: method.as_ref().to_owned(),
			path: path.into(),
			query: Vec::new(),
			list_style: QueryListStyle::default(),
			headers: BTreeMap::new(),
			body: None,
			auth: AuthScheme::None,
		}
	}

	/// Sets a query parameter, replacing any previous value for `key` in place.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
		let key = key.into();
		let value = value.into();

		match self.query.iter_mut().find(|(existing, _)| *existing == key) {
			Some((_, slot)) => *slot = value,
			None => self.query.push((key, value)),
		}

		self
	}

	/// Sets a list-valued query parameter; each element is emitted as its own pair.
	pub fn query_list<I, S>(self, key: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let values = values.into_iter().map(Into::into).collect::<Vec<_>>();

		self.query(key, QueryValue::List(values))
	}

	/// Selects how list-valued query parameters are encoded.
	pub fn list_style(mut self, style: QueryListStyle) -> Self {
		self.list_style = style;

		self
	}

	/// Sets a request header, replacing any previous value.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Sets the JSON body.
	pub fn body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` into the JSON body.
	pub fn json_body<T>(self, body: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		Ok(self.body(serde_json::to_value(body)?))
	}

	/// Sets the credential capability tag.
	pub fn auth(mut self, auth: AuthScheme) -> Self {
		self.auth = auth;

		self
	}

	/// Shorthand for [`AuthScheme::OAuth2`].
	pub fn oauth2(self) -> Self {
		self.auth(AuthScheme::OAuth2)
	}

	/// Shorthand for [`AuthScheme::TokenHeader`].
	pub fn token_header(self) -> Self {
		self.auth(AuthScheme::TokenHeader)
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<RequestDescriptor, RequestDescriptorError> {
		let method = Method::from_str(&self.method)?;

		if method.requires_body() && self.body.as_ref().is_none_or(Value::is_null) {
			return Err(RequestDescriptorError::MissingBody { method });
		}

		Ok(RequestDescriptor {
			method,
			path: self.path,
			query: self.query,
			list_style: self.list_style,
			headers: self.headers,
			body: self.body,
			auth: self.auth,
		})
	}
}

impl TryFrom<RequestDescriptorBuilder> for RequestDescriptor {
	type Error = RequestDescriptorError;

	fn try_from(builder: RequestDescriptorBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}
