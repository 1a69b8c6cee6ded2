use crate::UrlError;
use url::Url;

/// Normalizes a URL according to Page-Harvest's canonical form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http and https
/// 3. Reject URLs without a host
/// 4. Remove the fragment (everything after #)
/// 5. Remove trailing slashes from the path, except for the root `/`
///
/// The result is the single string used for every dedup comparison, and
/// normalizing an already normalized URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use page_harvest::url::normalize_url;
///
/// let url = normalize_url("https://example.com/manual/page/#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/manual/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url)
}

/// Resolves an anchor href against the page it was found on, then normalizes it
///
/// Absolute hrefs are kept as-is; relative ones are joined onto `page_url`.
pub fn resolve_href(href: &str, page_url: &Url) -> Result<Url, UrlError> {
    let joined = page_url
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;
    canonicalize(joined)
}

/// Resolves a frame `src` against the origin of the frameset page
///
/// Legacy framesets reference their frames relative to the site root, so
/// `src="contenido/a.htm"` on `https://host/dir/index.asp` becomes
/// `https://host/contenido/a.htm`.
pub fn resolve_frame_src(src: &str, page_url: &Url) -> Result<Url, UrlError> {
    let origin = page_url.origin().ascii_serialization();
    let root = Url::parse(&format!("{}/", origin))
        .map_err(|e| UrlError::Parse(format!("{}: {}", page_url, e)))?;
    resolve_href(src, &root)
}

fn canonicalize(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        url.set_path(&trimmed);
    }

    Ok(url)
}
