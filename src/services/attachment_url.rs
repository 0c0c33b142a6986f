//! Forced-attachment rewriting for storage-provider delivery URLs.
//!
//! The provider renders most content inline; inserting its `fl_attachment`
//! directive into the delivery path makes browsers download the bytes
//! instead. The transformation works on parsed path segments rather than
//! string offsets, so the rest of the URL (host, query, nested folders)
//! passes through untouched.

use url::Url;

/// Host suffix identifying delivery URLs the provider understands.
const PROVIDER_HOST_SUFFIX: &str = "cloudinary.com";

/// Path directive that forces attachment disposition.
const ATTACHMENT_DIRECTIVE: &str = "fl_attachment";

/// Delivery pipeline segment for processed uploads.
const UPLOAD_SEGMENT: &str = "upload";

/// Delivery pipeline segment for raw (non-image) uploads.
const RAW_SEGMENT: &str = "raw";

/// Rewrite a delivery URL so the browser downloads the content as an
/// attachment.
///
/// URLs outside the provider's domain, URLs that already carry the
/// directive, and URLs that cannot be parsed are returned unchanged. The
/// directive lands immediately after the first `upload` segment (which also
/// covers `raw/<...>/upload/` shapes), otherwise after a `raw` segment,
/// otherwise best-effort before a version segment (`v` + digits).
///
/// Pure function: deterministic, no I/O.
pub fn force_attachment(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    let provider_host = parsed.host_str().is_some_and(|host| {
        host == PROVIDER_HOST_SUFFIX || host.ends_with(&format!(".{PROVIDER_HOST_SUFFIX}"))
    });
    if !provider_host {
        return raw.to_string();
    }

    let Some(segments) = parsed.path_segments() else {
        return raw.to_string();
    };
    let mut segments: Vec<&str> = segments.collect();

    // Re-applying the rewrite must not duplicate the directive.
    if segments.contains(&ATTACHMENT_DIRECTIVE) {
        return raw.to_string();
    }

    let insert_at = if let Some(pos) = segments.iter().position(|s| *s == UPLOAD_SEGMENT) {
        pos + 1
    } else if let Some(pos) = segments.iter().position(|s| *s == RAW_SEGMENT) {
        pos + 1
    } else if let Some(pos) = segments.iter().position(|s| is_version_segment(s)) {
        pos
    } else {
        return raw.to_string();
    };

    segments.insert(insert_at, ATTACHMENT_DIRECTIVE);

    let mut rewritten = parsed.clone();
    rewritten.set_path(&segments.join("/"));
    rewritten.to_string()
}

/// A path component of the form `v<digits>`, e.g. `v1712345678`.
fn is_version_segment(segment: &str) -> bool {
    match segment.strip_prefix('v') {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
