//! Image source rewriting.
//!
//! Turns every `<img src>` that is not already absolute into a URL on the
//! publication host:
//!
//! ```text
//! src="photo.png"                   -> {base_url}{subdir}/photo.png
//! src="./photo.png"                 -> {base_url}{subdir}/photo.png
//! src="https://example.com/cat.png" -> unchanged
//! ```

use super::{PageError, Subdir};
use crate::debug;
use crate::utils::html::Document;

/// Prefix that marks a source as already absolute.
///
/// Intentionally loose: `httpsfoo.png` counts as absolute too.
const ABSOLUTE_PREFIX: &str = "https";

/// Counts from one rewrite pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteReport {
    /// Sources replaced with an absolute URL
    pub rewritten: usize,
    /// Sources left alone because they were already absolute
    pub absolute: usize,
}

impl RewriteReport {
    #[inline]
    pub fn total(&self) -> usize {
        self.rewritten + self.absolute
    }
}

/// Rewrites image sources of one page.
pub struct ImageRewriter<'a> {
    /// Host prefix, ends with `/`
    base_url: &'a str,
    subdir: &'a Subdir,
}

impl<'a> ImageRewriter<'a> {
    pub fn new(base_url: &'a str, subdir: &'a Subdir) -> Self {
        Self { base_url, subdir }
    }

    /// New value for a `src` attribute, or `None` to leave it unchanged.
    pub fn rewrite_src(&self, src: &str) -> Option<String> {
        if src.starts_with(ABSOLUTE_PREFIX) {
            return None;
        }

        let path = src.strip_prefix("./").unwrap_or(src);
        Some(format!("{}{}/{}", self.base_url, self.subdir.as_str(), path))
    }

    /// Rewrite every image in the document.
    ///
    /// Stops at the first image without a `src` value; the document may then
    /// be partially rewritten and must not be written out.
    pub fn rewrite(&self, doc: &mut Document<'_>) -> Result<RewriteReport, PageError> {
        let mut report = RewriteReport::default();

        for (i, img) in doc.images_mut().enumerate() {
            let index = i + 1;
            let src = img
                .attributes_mut()
                .get_mut("src")
                .flatten()
                .ok_or(PageError::MissingSrc { index })?;

            let current = src.as_utf8_str().into_owned();
            match self.rewrite_src(&current) {
                Some(absolute) => {
                    debug!("rewrite"; "{} -> {}", current, absolute);
                    src.set(absolute.into_bytes())
                        .map_err(|_| PageError::AttributeTooLong { index })?;
                    report.rewritten += 1;
                }
                None => report.absolute += 1,
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_BASE_URL, RewriteConfig};
    use crate::utils::source::SourceText;
    use std::path::Path;

    const POST: &str = "site/public/2024/my-post/index.html";
    const PHOTO_URL: &str = "https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post/photo.png";

    fn subdir() -> Subdir {
        Subdir::extract(Path::new(POST), &RewriteConfig::default()).unwrap()
    }

    fn rewrite_html(html: &str) -> Result<(String, RewriteReport), PageError> {
        let subdir = subdir();
        let source = SourceText::new(html);
        let mut doc = Document::parse(&source).unwrap();
        let report = ImageRewriter::new(DEFAULT_BASE_URL, &subdir).rewrite(&mut doc)?;
        Ok((doc.prettify(), report))
    }

    #[test]
    fn test_rewrite_src_relative() {
        let subdir = subdir();
        let rewriter = ImageRewriter::new(DEFAULT_BASE_URL, &subdir);
        assert_eq!(rewriter.rewrite_src("photo.png").as_deref(), Some(PHOTO_URL));
    }

    #[test]
    fn test_rewrite_src_strips_dot_slash() {
        let subdir = subdir();
        let rewriter = ImageRewriter::new(DEFAULT_BASE_URL, &subdir);
        assert_eq!(rewriter.rewrite_src("./photo.png").as_deref(), Some(PHOTO_URL));
        // Only one leading `./` is stripped
        assert_eq!(
            rewriter.rewrite_src("././photo.png").as_deref(),
            Some("https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post/./photo.png")
        );
    }

    #[test]
    fn test_rewrite_src_keeps_other_relative_forms() {
        let subdir = subdir();
        let rewriter = ImageRewriter::new(DEFAULT_BASE_URL, &subdir);
        assert_eq!(
            rewriter.rewrite_src("../shared/logo.svg").as_deref(),
            Some("https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post/../shared/logo.svg")
        );
        assert_eq!(
            rewriter.rewrite_src("/img/a.png").as_deref(),
            Some("https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post//img/a.png")
        );
        assert_eq!(
            rewriter.rewrite_src("http://example.com/a.png").as_deref(),
            Some("https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post/http://example.com/a.png")
        );
    }

    #[test]
    fn test_rewrite_src_skips_https_prefix() {
        let subdir = subdir();
        let rewriter = ImageRewriter::new(DEFAULT_BASE_URL, &subdir);
        assert_eq!(rewriter.rewrite_src("https://example.com/cat.png"), None);
        assert_eq!(rewriter.rewrite_src("httpsomething.png"), None);
    }

    #[test]
    fn test_rewrite_src_custom_base_url() {
        let subdir = subdir();
        let rewriter = ImageRewriter::new("https://staging.example.org/blog/", &subdir);
        assert_eq!(
            rewriter.rewrite_src("photo.png").as_deref(),
            Some("https://staging.example.org/blog/2024/my-post/photo.png")
        );
    }

    #[test]
    fn test_rewrite_multiple_images() {
        let html = r#"<div><img src="a.png"><img src="https://example.com/cat.png"><p><img src="./b.png"></p></div>"#;
        let (out, report) = rewrite_html(html).unwrap();

        assert_eq!(report, RewriteReport { rewritten: 2, absolute: 1 });
        assert_eq!(report.total(), 3);
        assert!(out.contains(r#"src="https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post/a.png""#));
        assert!(out.contains(r#"src="https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post/b.png""#));
        assert!(out.contains(r#"src="https://example.com/cat.png""#));
        assert!(!out.contains(r#"src="a.png""#));
        assert!(!out.contains(r#"src="./b.png""#));
    }

    #[test]
    fn test_rewrite_keeps_other_attributes() {
        let (out, _) = rewrite_html(r#"<img alt="A cat" src="cat.png" width="40">"#).unwrap();
        assert!(out.contains(r#"alt="A cat""#));
        assert!(out.contains(r#"width="40""#));
    }

    #[test]
    fn test_rewrite_no_images() {
        let (_, report) = rewrite_html("<p>text only</p>").unwrap();
        assert_eq!(report, RewriteReport::default());
    }

    #[test]
    fn test_rewrite_missing_src() {
        let result = rewrite_html(r#"<img src="a.png"><img alt="no source">"#);
        assert!(matches!(result, Err(PageError::MissingSrc { .. })));
    }

    #[test]
    fn test_rewrite_valueless_src() {
        let result = rewrite_html("<img src>");
        assert!(matches!(result, Err(PageError::MissingSrc { index: 1 })));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let html = r#"<html><body><img src="./a.png"><img src="https://x.org/b.png"></body></html>"#;
        let (once, _) = rewrite_html(html).unwrap();
        let (twice, report) = rewrite_html(&once).unwrap();

        assert_eq!(once, twice);
        assert_eq!(report, RewriteReport { rewritten: 0, absolute: 2 });
    }

    #[test]
    fn test_rewrite_ignores_img_in_script() {
        let html = r#"<script>el.innerHTML = '<img src="x.png">';</script><img src="a.png">"#;
        let (out, report) = rewrite_html(html).unwrap();

        assert_eq!(report, RewriteReport { rewritten: 1, absolute: 0 });
        assert!(out.contains(r#"<script>el.innerHTML = '<img src="x.png">';</script>"#));
        assert!(out.contains(r#"src="https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post/a.png""#));
    }

    #[test]
    fn test_rewrite_script_img_without_src_is_not_fatal() {
        let html = r#"<script>var t = '<img ' + attrs + '>';</script><img src="a.png">"#;
        let (_, report) = rewrite_html(html).unwrap();
        assert_eq!(report.rewritten, 1);
    }

    #[test]
    fn test_rewrite_src_attribute_any_case() {
        let (out, report) = rewrite_html(r#"<IMG SRC="up.png"><img Src="./down.png">"#).unwrap();

        assert_eq!(report, RewriteReport { rewritten: 2, absolute: 0 });
        assert!(out.contains(r#"src="https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post/up.png""#));
        assert!(out.contains(r#"src="https://www.cs.cmu.edu/~csd-phd-blog/2024/my-post/down.png""#));
        assert!(!out.contains("SRC="));
    }
}
