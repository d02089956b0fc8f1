//! Rendering port: the page the tiles are inserted into.
//!
//! The renderer never touches markup directly. It asks a [`Surface`] whether
//! an element exists and replaces an element's children by id. [`HtmlPage`]
//! implements that over an HTML string (the stock shell or a user template);
//! tests use the same type over small fixture strings.

/// Build-time view of the page document.
pub trait Surface {
    fn has_element(&self, id: &str) -> bool;

    /// Replace the children of element `id`. Returns `false` when there is
    /// no such element.
    fn set_inner_html(&mut self, id: &str, html: &str) -> bool;
}

/// An HTML document held as text.
///
/// Element lookup is by `id` attribute only. Content replacement finds the
/// matching close tag by counting nested tags of the same name, which is
/// enough for container elements like `div`, `section` or `main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPage {
    html: String,
}

/// Byte range of an element's inner content.
struct ElementSpan {
    inner_start: usize,
    inner_end: usize,
}

impl HtmlPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    /// Inner HTML of element `id`, if present.
    pub fn inner_html(&self, id: &str) -> Option<&str> {
        let span = self.find(id)?;
        Some(&self.html[span.inner_start..span.inner_end])
    }

    fn open_tag_start(&self, id: &str) -> Option<usize> {
        for quote in ['"', '\''] {
            let needle = format!("id={quote}{id}{quote}");
            let mut from = 0;
            while let Some(rel) = self.html[from..].find(&needle) {
                let at = from + rel;
                let preceded_by_space = self.html[..at]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_whitespace);
                if preceded_by_space && let Some(lt) = self.html[..at].rfind('<') {
                    // The attribute must belong to a still-open tag.
                    if !self.html[lt..at].contains('>') {
                        return Some(lt);
                    }
                }
                from = at + needle.len();
            }
        }
        None
    }

    fn find(&self, id: &str) -> Option<ElementSpan> {
        let start = self.open_tag_start(id)?;
        let tag_name: String = self.html[start + 1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect::<String>()
            .to_ascii_lowercase();
        if tag_name.is_empty() {
            return None;
        }
        let open_end = start + self.html[start..].find('>')? + 1;
        if self.html[..open_end].ends_with("/>") {
            return Some(ElementSpan {
                inner_start: open_end,
                inner_end: open_end,
            });
        }

        let lower = self.html.to_ascii_lowercase();
        let open_pat = format!("<{tag_name}");
        let close_pat = format!("</{tag_name}");
        let mut depth = 1usize;
        let mut cursor = open_end;
        loop {
            let next_close = find_tag(&lower, cursor, &close_pat)?;
            let next_open = find_tag(&lower, cursor, &open_pat);
            match next_open {
                Some(open) if open < next_close => {
                    depth += 1;
                    cursor = open + open_pat.len();
                }
                _ => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(ElementSpan {
                            inner_start: open_end,
                            inner_end: next_close,
                        });
                    }
                    cursor = next_close + close_pat.len();
                }
            }
        }
    }
}

/// First occurrence of `pat` at or after `from` that is followed by a tag
/// name boundary.
fn find_tag(s: &str, from: usize, pat: &str) -> Option<usize> {
    s[from..]
        .match_indices(pat)
        .map(|(i, _)| i + from)
        .find(|&i| is_tag_boundary(s, i + pat.len()))
}

/// Whether the byte at `i` ends a tag name (`<div>` vs `<divider>`).
fn is_tag_boundary(s: &str, i: usize) -> bool {
    s[i..]
        .chars()
        .next()
        .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/')
}

impl Surface for HtmlPage {
    fn has_element(&self, id: &str) -> bool {
        self.open_tag_start(id).is_some()
    }

    fn set_inner_html(&mut self, id: &str, html: &str) -> bool {
        match self.find(id) {
            Some(span) => {
                self.html
                    .replace_range(span.inner_start..span.inner_end, html);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<main class="press-columns">
  <div class="column" id="content-left"><p>static left</p></div>
  <div class="column" id="content-right">
    <div class="inner"><div>nested</div></div>
  </div>
  <section id='extra'></section>
</main>
<div data-id="content-left-copy"></div>"#;

    #[test]
    fn finds_elements_by_id() {
        let page = HtmlPage::new(PAGE);
        assert!(page.has_element("content-left"));
        assert!(page.has_element("content-right"));
        assert!(page.has_element("extra"));
        assert!(!page.has_element("content"));
        assert!(!page.has_element("lightbox"));
    }

    #[test]
    fn data_attributes_are_not_ids() {
        let page = HtmlPage::new(r#"<div data-id="x"></div>"#);
        assert!(!page.has_element("x"));
    }

    #[test]
    fn inner_html_respects_nesting() {
        let page = HtmlPage::new(PAGE);
        assert_eq!(page.inner_html("content-left"), Some("<p>static left</p>"));
        assert_eq!(
            page.inner_html("content-right").map(str::trim),
            Some(r#"<div class="inner"><div>nested</div></div>"#)
        );
    }

    #[test]
    fn set_inner_html_replaces_children_only() {
        let mut page = HtmlPage::new(PAGE);
        assert!(page.set_inner_html("content-right", "<article>1</article>"));
        assert_eq!(page.inner_html("content-right"), Some("<article>1</article>"));
        // Siblings untouched
        assert_eq!(page.inner_html("content-left"), Some("<p>static left</p>"));
        assert!(page.as_str().contains("<section id='extra'></section>"));
    }

    #[test]
    fn set_inner_html_twice_is_idempotent() {
        let mut page = HtmlPage::new(PAGE);
        page.set_inner_html("content-left", "<b>a</b>");
        let once = page.clone();
        page.set_inner_html("content-left", "<b>a</b>");
        assert_eq!(page, once);
    }

    #[test]
    fn set_inner_html_on_missing_id_is_false() {
        let mut page = HtmlPage::new(PAGE);
        assert!(!page.set_inner_html("nope", "x"));
        assert_eq!(page.as_str(), PAGE);
    }

    #[test]
    fn similar_tag_names_do_not_count_as_nesting() {
        let mut page = HtmlPage::new(r#"<div id="a"><divider></divider></div><div>after</div>"#);
        assert_eq!(page.inner_html("a"), Some("<divider></divider>"));
        page.set_inner_html("a", "");
        assert_eq!(page.as_str(), r#"<div id="a"></div><div>after</div>"#);
    }
}
