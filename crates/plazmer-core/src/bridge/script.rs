//! Page script that pulls a `blob:` object's bytes back to the host.

/// Script that fetches `blob_url` inside the page, reads it as a data URL and
/// calls `<bridge_name>.save(base64, type, size)`, or
/// `<bridge_name>.error(message)` if anything throws.
///
/// The URL is embedded as a JSON string literal so quotes or backslashes in
/// it cannot terminate the literal.
pub fn blob_extraction_script(blob_url: &str, bridge_name: &str) -> String {
    let url_literal = serde_json::to_string(blob_url).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(async function() {{
  try {{
    const r = await fetch({url_literal});
    const b = await r.blob();
    const reader = new FileReader();
    reader.onloadend = function() {{
      {bridge_name}.save(reader.result.split(',')[1] || '', b.type, b.size);
    }};
    reader.onerror = function() {{
      {bridge_name}.error(String(reader.error));
    }};
    reader.readAsDataURL(b);
  }} catch (e) {{
    {bridge_name}.error(e.toString());
  }}
}})();"#
    )
}
