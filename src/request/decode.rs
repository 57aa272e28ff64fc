// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, http::HttpResponse};

/// Failures raised while turning a response body into a typed value.
#[derive(Debug, ThisError)]
pub enum ResponseParseError {
	/// Body is not valid JSON or does not match the target type.
	#[error("Response body could not be decoded at `{path}`: {source}")]
	Decode {
		/// Path to the offending field, `.` for the root.
		path: String,
		/// Underlying JSON failure.
		#[source]
		source: serde_json::Error,
	},
	/// Body is JSON but not an object.
	#[error("Response body is not a JSON object.")]
	NotAnObject,
	/// Response status is outside the success range.
	#[error("Response has unexpected status {status}.")]
	UnexpectedStatus {
		/// HTTP status code received.
		status: u16,
	},
}

/// Decodes a response body into a JSON object.
///
/// An empty body decodes to an empty map.
pub fn unserialize(response: &HttpResponse) -> Result<Map<String, Value>, ResponseParseError> {
	if response.body().is_empty() {
		return Ok(Map::new());
	}

	match decode_json::<Value>(response)? {
		Value::Object(map) => Ok(map),
		_ => Err(ResponseParseError::NotAnObject),
	}
}

/// Decodes a response body into `T`, reporting the failing field path.
pub fn decode_json<T>(response: &HttpResponse) -> Result<T, ResponseParseError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(response.body());

	let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
		let path = e.path().to_string();

		ResponseParseError::Decode { path, source: e.into_inner() }
	})?;

	deserializer
		.end()
		.map_err(|source| ResponseParseError::Decode { path: ".".into(), source })?;

	Ok(value)
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::http::http;

	fn response(body: &str) -> HttpResponse {
		http::Response::builder()
			.status(200)
			.body(body.as_bytes().to_vec())
			.expect("Response fixture should build.")
	}

	#[test]
	fn unserialize_handles_objects_and_empty_bodies() {
		let map = unserialize(&response("{\"id\":\"value\"}")).expect("Object bodies should decode.");

		assert_eq!(map.get("id"), Some(&json!("value")));
		assert!(unserialize(&response("")).expect("Empty bodies should decode.").is_empty());
	}

	#[test]
	fn unserialize_rejects_non_objects_and_garbage() {
		assert!(matches!(unserialize(&response("[1,2]")), Err(ResponseParseError::NotAnObject)));
		assert!(matches!(
			unserialize(&response("<html>")),
			Err(ResponseParseError::Decode { .. })
		));
		assert!(matches!(
			unserialize(&response("{} trailing")),
			Err(ResponseParseError::Decode { .. })
		));
	}

	#[test]
	fn decode_json_reports_field_path() {
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Item {
			id: String,
			count: u32,
		}

		let err = decode_json::<Item>(&response("{\"id\":\"value\",\"count\":\"many\"}"))
			.expect_err("A string count should fail to decode.");

		match err {
			ResponseParseError::Decode { path, .. } => assert_eq!(path, "count"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
