//! Source preparation before handing a page to `tl`.
//!
//! tl parses everything as markup, so a few constructs are taken out of the
//! text first and put back byte-for-byte when the document is printed:
//!
//! - the prolog (`<?xml ...?>`, `<!DOCTYPE ...>`, leading comments)
//! - bodies of raw-text elements (`script`, `style`, `textarea`)
//! - `<![CDATA[ ... ]]>` sections
//!
//! Stashed text is replaced by a marker (`\u{E000}<n>\u{E001}`) that tl keeps
//! as a plain text node. Tag and attribute names are lowercased on the way,
//! the way an HTML parser reports them.

use std::borrow::Cow;

/// Elements whose content is text, never markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

const STASH_OPEN: char = '\u{E000}';
const STASH_CLOSE: char = '\u{E001}';

/// Page source ready for parsing.
#[derive(Debug, Default)]
pub struct SourceText {
    /// Declarations and comments before the first element, verbatim
    prolog: Vec<String>,
    /// Markup handed to tl
    body: String,
    /// Text taken out of `body`, indexed by marker number
    stash: Vec<String>,
}

impl SourceText {
    pub fn new(html: &str) -> Self {
        let (prolog, rest) = split_prolog(html);
        let mut source = Self {
            prolog,
            body: String::with_capacity(rest.len()),
            stash: Vec::new(),
        };
        source.scan(rest);
        source
    }

    #[inline]
    pub fn prolog(&self) -> &[String] {
        &self.prolog
    }

    #[inline]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Replace markers in a text node with the text they stand for.
    pub fn restore<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if !text.contains(STASH_OPEN) {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find(STASH_OPEN) {
            out.push_str(&rest[..open]);
            let after = &rest[open + STASH_OPEN.len_utf8()..];

            let entry = after.find(STASH_CLOSE).and_then(|close| {
                let index: usize = after[..close].parse().ok()?;
                Some((close, self.stash.get(index)?))
            });

            match entry {
                Some((close, stashed)) => {
                    out.push_str(stashed);
                    rest = &after[close + STASH_CLOSE.len_utf8()..];
                }
                None => {
                    out.push(STASH_OPEN);
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        Cow::Owned(out)
    }

    fn stash(&mut self, text: &str) {
        self.body.push(STASH_OPEN);
        self.body.push_str(&self.stash.len().to_string());
        self.body.push(STASH_CLOSE);
        self.stash.push(text.to_string());
    }

    /// Copy text into the body. Marker characters already in the page are
    /// stashed themselves so `restore` cannot confuse them with ours.
    fn push_text(&mut self, text: &str) {
        let mut rest = text;
        while let Some(pos) = rest.find(STASH_OPEN) {
            self.body.push_str(&rest[..pos]);
            self.stash(&STASH_OPEN.to_string());
            rest = &rest[pos + STASH_OPEN.len_utf8()..];
        }
        self.body.push_str(rest);
    }

    fn scan(&mut self, html: &str) {
        let bytes = html.as_bytes();
        let mut copied = 0;
        let mut i = 0;

        while let Some(offset) = html[i..].find('<') {
            let start = i + offset;
            let rest = &html[start..];

            // Comments go through untouched, whatever they contain
            if rest.starts_with("<!--") {
                i = rest.find("-->").map_or(html.len(), |end| start + end + 3);
                continue;
            }

            if rest.starts_with("<![CDATA[") {
                let end = rest.find("]]>").map_or(html.len(), |end| start + end + 3);
                self.push_text(&html[copied..start]);
                self.stash(&html[start..end]);
                copied = end;
                i = end;
                continue;
            }

            let closing = rest.starts_with("</");
            let name_start = start + if closing { 2 } else { 1 };
            if !bytes.get(name_start).is_some_and(u8::is_ascii_alphabetic) {
                i = start + 1;
                continue;
            }

            let name_len = html[name_start..]
                .bytes()
                .take_while(|b| !b.is_ascii_whitespace() && !matches!(*b, b'/' | b'>'))
                .count();
            let name = html[name_start..name_start + name_len].to_ascii_lowercase();
            let end = tag_end(html, name_start + name_len);

            self.push_text(&html[copied..start]);
            self.body
                .push_str(&normalize_tag(&html[start..end], name_start + name_len - start));
            copied = end;
            i = end;

            if !closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                let close = find_end_tag(html, end, &name).unwrap_or(html.len());
                if close > end {
                    self.stash(&html[end..close]);
                }
                copied = close;
                i = close;
            }
        }

        self.push_text(&html[copied..]);
    }
}

/// Split off declarations and comments that precede the first element.
fn split_prolog(html: &str) -> (Vec<String>, &str) {
    let mut prolog = Vec::new();
    let mut rest = html;

    loop {
        let trimmed = rest.trim_start();
        let end = if trimmed.starts_with("<?") {
            trimmed.find("?>").map(|end| end + 2)
        } else if trimmed.starts_with("<!--") {
            trimmed.find("-->").map(|end| end + 3)
        } else if trimmed
            .get(..9)
            .is_some_and(|s| s.eq_ignore_ascii_case("<!doctype"))
        {
            doctype_end(trimmed)
        } else {
            None
        };

        let Some(end) = end else {
            break;
        };
        prolog.push(trimmed[..end].to_string());
        rest = &trimmed[end..];
    }

    (prolog, rest)
}

/// End of a doctype, skipping `>` inside an internal subset (`[...]`).
fn doctype_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b'>' if depth == 0 => return Some(i + 1),
            _ => {}
        }
    }
    None
}

/// Index just past the `>` closing a tag, ignoring `>` inside quoted values.
fn tag_end(html: &str, from: usize) -> usize {
    let mut quote = None;
    let mut after_eq = false;

    for (i, b) in html.bytes().enumerate().skip(from) {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'>' => return i + 1,
            // Only a quote right after `=` opens a value
            b'"' | b'\'' if after_eq => quote = Some(b),
            _ => {}
        }
        after_eq = b == b'=' || (after_eq && b.is_ascii_whitespace());
    }

    html.len()
}

/// Position of `</name` (any case) at or after `from`.
fn find_end_tag(html: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut i = from;
    while let Some(offset) = html[i..].find("</") {
        let start = i + offset;
        let name_end = start + 2 + name.len();
        let matches_name = html
            .get(start + 2..name_end)
            .is_some_and(|s| s.eq_ignore_ascii_case(name));
        let terminated = bytes
            .get(name_end)
            .is_none_or(|b| b.is_ascii_whitespace() || matches!(*b, b'/' | b'>'));
        if matches_name && terminated {
            return Some(start);
        }
        i = start + 2;
    }
    None
}

/// Lowercase the tag name and attribute names of one tag, keeping values
/// and spacing as written.
fn normalize_tag(tag: &str, name_end: usize) -> String {
    let mut out = String::with_capacity(tag.len());
    out.push_str(&tag[..name_end].to_ascii_lowercase());

    let mut chars = tag[name_end..].chars().peekable();
    let mut expect_value = false;

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' if expect_value => {
                out.push(c);
                for v in chars.by_ref() {
                    out.push(v);
                    if v == c {
                        break;
                    }
                }
                expect_value = false;
            }
            '=' => {
                out.push(c);
                expect_value = true;
            }
            '>' => {
                out.push(c);
                expect_value = false;
            }
            c if c.is_whitespace() => out.push(c),
            c if expect_value => {
                // Unquoted value
                out.push(c);
                while let Some(&v) = chars.peek() {
                    if v.is_whitespace() || v == '>' {
                        break;
                    }
                    out.push(v);
                    chars.next();
                }
                expect_value = false;
            }
            c => out.push(c.to_ascii_lowercase()),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_markup_passes_through() {
        let source = SourceText::new("<p class=\"a\">Hello &amp; bye</p>");
        assert!(source.prolog().is_empty());
        assert_eq!(source.body(), "<p class=\"a\">Hello &amp; bye</p>");
    }

    #[test]
    fn test_prolog_xml_and_doctype() {
        let html = "<?xml version=\"1.0\"?>\n<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"x.dtd\">\n<html></html>";
        let source = SourceText::new(html);
        assert_eq!(
            source.prolog(),
            [
                "<?xml version=\"1.0\"?>",
                "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"x.dtd\">",
            ]
        );
        assert_eq!(source.body(), "\n<html></html>");
    }

    #[test]
    fn test_prolog_doctype_internal_subset() {
        let html = "<!doctype x [<!ENTITY a \"b\">]><x/>";
        let source = SourceText::new(html);
        assert_eq!(source.prolog(), ["<!doctype x [<!ENTITY a \"b\">]>"]);
        assert_eq!(source.body(), "<x/>");
    }

    #[test]
    fn test_script_body_is_stashed() {
        let source = SourceText::new("<script>if (a<b && c>d) { go(); }</script>");
        assert!(!source.body().contains("a<b"));
        assert!(source.body().starts_with("<script>"));
        assert!(source.body().ends_with("</script>"));

        let marker = source
            .body()
            .trim_start_matches("<script>")
            .trim_end_matches("</script>");
        assert_eq!(source.restore(marker), "if (a<b && c>d) { go(); }");
    }

    #[test]
    fn test_script_end_tag_any_case() {
        let source = SourceText::new("<SCRIPT>x('<img>')</Script ><p>y</p>");
        assert!(source.body().starts_with("<script>"));
        assert!(source.body().ends_with("</script ><p>y</p>"));
        assert!(!source.body().contains("<img>"));
    }

    #[test]
    fn test_unterminated_script_runs_to_end() {
        let source = SourceText::new("<script>var a = '<p>';");
        let marker = source.body().trim_start_matches("<script>");
        assert_eq!(source.restore(marker), "var a = '<p>';");
    }

    #[test]
    fn test_empty_script_has_no_marker() {
        let source = SourceText::new(r#"<script src="a.js"></script>"#);
        assert_eq!(source.body(), r#"<script src="a.js"></script>"#);
    }

    #[test]
    fn test_cdata_is_stashed() {
        let source = SourceText::new("<svg><![CDATA[ x < y ]]></svg>");
        let marker = source
            .body()
            .trim_start_matches("<svg>")
            .trim_end_matches("</svg>");
        assert_eq!(source.restore(marker), "<![CDATA[ x < y ]]>");
    }

    #[test]
    fn test_comment_content_is_not_scanned() {
        let html = "<!-- <script> --><p>a</p>";
        let source = SourceText::new(html);
        assert_eq!(source.prolog(), ["<!-- <script> -->"]);
        assert_eq!(source.body(), "<p>a</p>");

        let inner = SourceText::new("<div><!-- <SCRIPT> --></div>");
        assert_eq!(inner.body(), "<div><!-- <SCRIPT> --></div>");
    }

    #[test]
    fn test_names_are_lowercased() {
        let source = SourceText::new(r#"<IMG SRC="Up.PNG" Alt='A B' data-X=Y><BR/></DIV>"#);
        assert_eq!(
            source.body(),
            r#"<img src="Up.PNG" alt='A B' data-x=Y><br/></div>"#
        );
    }

    #[test]
    fn test_quoted_gt_stays_in_tag() {
        let source = SourceText::new(r#"<A TITLE="a > b">x</A>"#);
        assert_eq!(source.body(), r#"<a title="a > b">x</a>"#);
    }

    #[test]
    fn test_apostrophe_in_unquoted_value() {
        let source = SourceText::new("<A TITLE=it's>x</A><P>y</P>");
        assert_eq!(source.body(), "<a title=it's>x</a><p>y</p>");
    }

    #[test]
    fn test_existing_marker_characters_survive() {
        let text = "a\u{E000}0\u{E001}b";
        let source = SourceText::new(text);
        assert_eq!(source.restore(source.body()), text);
    }

    #[test]
    fn test_restore_without_markers_borrows() {
        let source = SourceText::new("<p>x</p>");
        assert!(matches!(source.restore("plain"), Cow::Borrowed("plain")));
    }
}
