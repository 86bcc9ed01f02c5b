use serde_json::Value;

pub type ShapeMatcher = fn(&Value) -> Option<String>;

/// Tried in order; the first hit wins even if later shapes are also present.
pub const SHAPE_MATCHERS: [(&str, ShapeMatcher); 5] = [
    ("artifacts", artifacts_base64),
    ("image", top_level_image),
    ("data", data_entry),
    ("b64_json", top_level_b64),
    ("url", top_level_url),
];

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn artifacts_base64(body: &Value) -> Option<String> {
    non_empty_str(body.pointer("/artifacts/0/base64"))
}

fn top_level_image(body: &Value) -> Option<String> {
    non_empty_str(body.get("image"))
}

fn data_entry(body: &Value) -> Option<String> {
    let entry = body.pointer("/data/0")?;
    ["b64_json", "url", "image"]
        .iter()
        .find_map(|field| non_empty_str(entry.get(*field)))
}

fn top_level_b64(body: &Value) -> Option<String> {
    non_empty_str(body.get("b64_json"))
}

fn top_level_url(body: &Value) -> Option<String> {
    non_empty_str(body.get("url"))
}

/// Returns the name of the matching shape and its raw value.
pub fn match_shape(body: &Value) -> Option<(&'static str, String)> {
    SHAPE_MATCHERS
        .iter()
        .find_map(|(name, matcher)| matcher(body).map(|v| (*name, v)))
}

/// Bare base64 payloads become a PNG `data:` reference; URLs and existing
/// data references pass through.
pub fn to_image_reference(raw: String) -> String {
    if raw.starts_with("http") || raw.starts_with("data:") {
        raw
    } else {
        format!("data:image/png;base64,{}", raw)
    }
}
