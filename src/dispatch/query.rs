//! Query-parameter encoding for `GET` / `DELETE` requests.

// crates.io
use serde_json::Value;

/// Flattens a serialized request into ordered query pairs.
///
/// Top-level scalar fields become one pair each and arrays become one pair per element under the same
/// name. Null fields, nested objects (maps), and non-scalar array elements are skipped. Numbers use
/// their JSON text, so the decimal separator is always `.`.
pub fn encode_query(value: &Value) -> Vec<(String, String)> {
	let Value::Object(fields) = value else {
		return Vec::new();
	};
	let mut pairs = Vec::new();

	for (name, field) in fields {
		match field {
			Value::Array(items) =>
				pairs.extend(items.iter().filter_map(scalar_text).map(|text| (name.clone(), text))),
			other =>
				if let Some(text) = scalar_text(other) {
					pairs.push((name.clone(), text));
				},
		}
	}

	pairs
}

fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Null | Value::Array(_) | Value::Object(_) => None,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn arrays_repeat_their_key() {
		let pairs = encode_query(&json!({ "Name": "a", "Amounts": [1.5, 2.5] }));

		assert_eq!(
			pairs,
			vec![
				("Name".to_owned(), "a".to_owned()),
				("Amounts".to_owned(), "1.5".to_owned()),
				("Amounts".to_owned(), "2.5".to_owned()),
			]
		);
	}

	#[test]
	fn numbers_use_invariant_notation() {
		let pairs = encode_query(&json!({ "Pi": 3.14159265359, "Count": 3, "Flag": true }));

		assert_eq!(pairs[0], ("Pi".to_owned(), "3.14159265359".to_owned()));
		assert_eq!(pairs[1], ("Count".to_owned(), "3".to_owned()));
		assert_eq!(pairs[2], ("Flag".to_owned(), "true".to_owned()));
	}

	#[test]
	fn nulls_and_maps_are_skipped() {
		let pairs = encode_query(&json!({
			"Missing": null,
			"Tags": { "env": "prod" },
			"Ids": [1, null, 2],
			"Name": "x"
		}));

		assert_eq!(
			pairs,
			vec![
				("Ids".to_owned(), "1".to_owned()),
				("Ids".to_owned(), "2".to_owned()),
				("Name".to_owned(), "x".to_owned()),
			]
		);
	}
}
