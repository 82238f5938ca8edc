//! Turns a raw provider response into a decoded image.
//!
//! Providers disagree on content-type discipline, so the body is sniffed in
//! three tiers:
//!
//! 1. An `image/*` content type means the body is an encoded image.
//! 2. Otherwise, if the body parses as JSON, the [`EXTRACTORS`] are tried in
//!    order and the first base64 payload found is decoded.
//! 3. Otherwise the body is decoded as an image anyway, since some providers
//!    send binary images without a content type.

use crate::error::{Result, StoryVizError};
use crate::types::{DecodedImage, RawProviderResponse};
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::Value;

/// Pulls a base64 (or data-URI) image string out of a JSON document.
pub type Extractor = fn(&Value) -> Option<&str>;

/// Ordered extractor table. The first match wins; add a provider quirk by
/// adding a row.
pub const EXTRACTORS: &[(&str, Extractor)] = &[
    ("image", top_level_image),
    ("[].image", nested_image),
    ("generated_image", generated_image),
    ("data[].b64_json", openai_b64_json),
    ("artifacts[].base64", stability_artifact),
    ("generatedImages[].base64String", imagen_generated_images),
    ("images[].base64String", imagen_images),
    ("predictions[].bytesBase64Encoded", imagen_predictions),
    ("candidates[].content.parts[].inlineData.data", gemini_inline_data),
    ("data-uri", any_data_uri),
];

const DATA_URI_PREFIX: &str = "data:image/";

/// Normalizes a 2xx provider response into a [`DecodedImage`].
pub fn normalize(response: &RawProviderResponse) -> Result<DecodedImage> {
    let content_type = response.content_type();

    if content_type.as_deref().is_some_and(|ct| ct.starts_with("image/")) {
        tracing::debug!(content_type = ?content_type, "decoding declared image body");
        return DecodedImage::decode(&response.bytes);
    }

    if let Ok(json) = serde_json::from_slice::<Value>(&response.bytes) {
        return decode_json(&json);
    }

    tracing::debug!(
        content_type = ?content_type,
        bytes = response.bytes.len(),
        "body is neither image/* nor JSON; decoding as raw image"
    );
    DecodedImage::decode(&response.bytes)
        .map_err(|e| StoryVizError::Decode(format!("body is not JSON and not an image: {e}")))
}

fn decode_json(json: &Value) -> Result<DecodedImage> {
    for (name, extract) in EXTRACTORS {
        if let Some(payload) = extract(json) {
            tracing::debug!(extractor = name, "found image payload in JSON");
            let bytes = decode_base64_payload(payload)?;
            return DecodedImage::decode(&bytes);
        }
    }
    Err(StoryVizError::NoImageData(describe_json(json)))
}

/// Decodes a base64 string, with or without a `data:` URI prefix.
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>> {
    let payload = payload.trim();
    let body = if payload.starts_with("data:") {
        payload
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| StoryVizError::Decode("malformed data URI".into()))?
    } else {
        payload
    };
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();

    [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(&compact).ok())
        .ok_or_else(|| StoryVizError::Decode("invalid base64 image payload".into()))
}

fn describe_json(json: &Value) -> String {
    let error = json.get("error").and_then(|e| match e {
        Value::String(s) => Some(s.clone()),
        Value::Object(o) => o.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    });
    if let Some(message) = error {
        return message;
    }
    match json {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("keys: [{}]", keys.join(", "))
        }
        Value::Array(items) => format!("array of {} items", items.len()),
        _ => "scalar JSON value".to_string(),
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key)?.as_str().filter(|s| !s.is_empty())
}

fn first_in_array<'a>(value: &'a Value, array_key: &str, key: &str) -> Option<&'a str> {
    value
        .get(array_key)?
        .as_array()?
        .iter()
        .find_map(|item| str_field(item, key))
}

fn top_level_image(json: &Value) -> Option<&str> {
    str_field(json, "image")
}

fn nested_image(json: &Value) -> Option<&str> {
    match json {
        Value::Array(items) => items.iter().find_map(|item| str_field(item, "image")),
        Value::Object(map) => map
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .find_map(|item| str_field(item, "image")),
        _ => None,
    }
}

fn generated_image(json: &Value) -> Option<&str> {
    str_field(json, "generated_image")
}

fn openai_b64_json(json: &Value) -> Option<&str> {
    first_in_array(json, "data", "b64_json")
}

fn stability_artifact(json: &Value) -> Option<&str> {
    first_in_array(json, "artifacts", "base64")
}

fn imagen_generated_images(json: &Value) -> Option<&str> {
    first_in_array(json, "generatedImages", "base64String")
}

fn imagen_images(json: &Value) -> Option<&str> {
    first_in_array(json, "images", "base64String")
}

fn imagen_predictions(json: &Value) -> Option<&str> {
    first_in_array(json, "predictions", "bytesBase64Encoded")
}

fn gemini_inline_data(json: &Value) -> Option<&str> {
    json.get("candidates")?
        .as_array()?
        .iter()
        .filter_map(|c| c.get("content")?.get("parts")?.as_array())
        .flatten()
        .find_map(|part| {
            let inline = part.get("inlineData").or_else(|| part.get("inline_data"))?;
            str_field(inline, "data")
        })
}

fn any_data_uri(json: &Value) -> Option<&str> {
    match json {
        Value::String(s) if s.starts_with(DATA_URI_PREFIX) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(any_data_uri),
        Value::Object(map) => map.values().find_map(any_data_uri),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::ImageFormat;
    use ::image::{Rgba, RgbaImage};

    fn sample() -> (DecodedImage, Vec<u8>) {
        let mut pixels = RgbaImage::from_pixel(6, 4, Rgba([0, 128, 255, 255]));
        pixels.put_pixel(2, 1, Rgba([255, 0, 0, 255]));
        let image = DecodedImage::new(pixels, ImageFormat::Png);
        let bytes = image.encode().unwrap();
        (image, bytes)
    }

    fn response(content_type: Option<&str>, bytes: Vec<u8>) -> RawProviderResponse {
        let headers: Vec<(&str, &str)> = content_type
            .map(|ct| vec![("Content-Type", ct)])
            .unwrap_or_default();
        RawProviderResponse::new(200, headers, bytes)
    }

    fn json_response(json: Value) -> RawProviderResponse {
        response(
            Some("application/json"),
            serde_json::to_vec(&json).unwrap(),
        )
    }

    #[test]
    fn test_binary_with_image_content_type() {
        let (expected, bytes) = sample();
        let decoded = normalize(&response(Some("image/png"), bytes)).unwrap();
        assert_eq!(decoded.pixels, expected.pixels);
    }

    #[test]
    fn test_binary_without_content_type() {
        let (expected, bytes) = sample();
        let decoded = normalize(&response(None, bytes.clone())).unwrap();
        assert_eq!(decoded.pixels, expected.pixels);

        // Mislabelled as JSON still decodes: the body does not parse.
        let decoded = normalize(&response(Some("application/json"), bytes)).unwrap();
        assert_eq!(decoded.pixels, expected.pixels);
    }

    #[test]
    fn test_json_top_level_image() {
        let (expected, bytes) = sample();
        let decoded =
            normalize(&json_response(serde_json::json!({ "image": STANDARD.encode(&bytes) })))
                .unwrap();
        assert_eq!(decoded.pixels, expected.pixels);
    }

    #[test]
    fn test_json_nested_array_image() {
        let (expected, bytes) = sample();
        let b64 = STANDARD.encode(&bytes);

        let root_array = serde_json::json!([{ "image": b64 }]);
        assert_eq!(normalize(&json_response(root_array)).unwrap().pixels, expected.pixels);

        let nested = serde_json::json!({ "results": [{ "seed": 1 }, { "image": b64 }] });
        assert_eq!(normalize(&json_response(nested)).unwrap().pixels, expected.pixels);
    }

    #[test]
    fn test_json_data_uri() {
        let (expected, bytes) = sample();
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));
        let json = serde_json::json!({ "output": { "artifact": uri } });
        assert_eq!(normalize(&json_response(json)).unwrap().pixels, expected.pixels);
    }

    #[test]
    fn test_json_openai_b64() {
        let (expected, bytes) = sample();
        let json = serde_json::json!({ "data": [{ "b64_json": STANDARD.encode(&bytes) }] });
        assert_eq!(normalize(&json_response(json)).unwrap().pixels, expected.pixels);
    }

    #[test]
    fn test_json_gemini_inline_data() {
        let (expected, bytes) = sample();
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(&bytes) } }
                ]},
                "finishReason": "STOP"
            }]
        });
        assert_eq!(normalize(&json_response(json)).unwrap().pixels, expected.pixels);
    }

    #[test]
    fn test_top_level_image_wins_over_data_array() {
        let (expected, bytes) = sample();
        let json = serde_json::json!({
            "data": [{ "b64_json": "not-valid-base64!!" }],
            "image": STANDARD.encode(&bytes)
        });
        assert_eq!(normalize(&json_response(json)).unwrap().pixels, expected.pixels);
    }

    #[test]
    fn test_json_without_image_is_recoverable() {
        let err = normalize(&json_response(serde_json::json!({ "status": "ok" })))
            .err()
            .unwrap();
        assert!(matches!(err, StoryVizError::NoImageData(_)));
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[test]
    fn test_json_error_message_is_reported() {
        let err = normalize(&json_response(serde_json::json!({
            "error": "Model stabilityai/sdxl is currently loading"
        })))
        .err()
        .unwrap();
        assert!(err.to_string().contains("currently loading"));
    }

    #[test]
    fn test_garbage_is_decode_failure() {
        let err = normalize(&response(None, b"\x00\x01garbage".to_vec()))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);

        let err = normalize(&response(Some("image/png"), b"truncated".to_vec()))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[test]
    fn test_truncated_json_is_decode_failure() {
        let err = normalize(&response(
            Some("application/json"),
            b"{\"data\": [{\"b64_json\": \"iVBO".to_vec(),
        ))
        .err()
        .unwrap();
        assert!(matches!(err, StoryVizError::Decode(_)));
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[test]
    fn test_base64_variants() {
        let raw = vec![0xfb, 0xff, 0x01];
        assert_eq!(decode_base64_payload("+/8B").unwrap(), raw);
        assert_eq!(decode_base64_payload("-_8B").unwrap(), raw);
        assert_eq!(decode_base64_payload("AQ").unwrap(), vec![0x01]);
        assert_eq!(decode_base64_payload("+/8\nB").unwrap(), raw);
        assert_eq!(
            decode_base64_payload("data:image/png;base64,+/8B").unwrap(),
            raw
        );
        assert!(decode_base64_payload("data:image/png;base64").is_err());
        assert!(decode_base64_payload("***").is_err());
    }
}
