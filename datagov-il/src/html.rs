use serde::Serialize;

use crate::error::Result;

/// Serialize a value for inlining inside a `<script>` element.
///
/// `</` is escaped so string data cannot close the script tag early.
pub(crate) fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json.replace("</", "<\\/"))
}
