//! HTML sanitization with ammonia.

use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

static SANITIZER: LazyLock<ammonia::Builder<'static>> = LazyLock::new(|| {
    let mut builder = ammonia::Builder::default();
    builder
        .add_tags(["div", "input"])
        .add_tag_attributes("div", ["class"])
        .add_tag_attributes("pre", ["class"])
        .add_tag_attributes("code", ["class"])
        .add_tag_attributes("span", ["class"])
        .add_tag_attributes("input", ["type", "checked", "disabled"]);
    builder
});

/// Strip script vectors from an HTML fragment.
///
/// Scripts, event handler attributes, `javascript:` URLs and embedding
/// elements are removed; document structure is kept. The result is stable
/// under a second pass.
///
/// ```
/// let clean = markpane::document::sanitize("<p onclick=\"x()\">hi<script>x()</script></p>");
/// assert_eq!(clean, "<p>hi</p>");
/// ```
pub fn sanitize(html: &str) -> String {
    SANITIZER.clean(html).to_string()
}

/// Sanitize one section's HTML. A panic inside the sanitizer costs this
/// section its content instead of taking the whole render down.
pub(super) fn sanitize_section(html: &str) -> String {
    match panic::catch_unwind(AssertUnwindSafe(|| sanitize(html))) {
        Ok(clean) => clean,
        Err(_) => {
            tracing::error!(bytes = html.len(), "sanitizer panicked; dropping section");
            String::new()
        }
    }
}
