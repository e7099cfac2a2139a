use super::{Document, MutationKind, MutationRecord, NodeId, Selector};
use ego_tree::{NodeRef, Tree};
use scraper::{ElementRef, Html, Node};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use url::Url;

/// A parsed HTML document that can be mutated and observed.
///
/// Detached nodes stay in the tree's arena; their ids remain valid but they
/// no longer show up in queries.
#[derive(Debug)]
pub struct MemoryDocument {
    html: Html,
    base_url: Option<Url>,
    observers: Vec<UnboundedSender<MutationRecord>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty page: `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        Self::parse("")
    }

    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
            base_url: None,
            observers: Vec::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn body(&self) -> NodeId {
        let root = self.html.root_element();
        root.children()
            .find(|n| n.value().as_element().is_some_and(|e| e.name() == "body"))
            .map(|n| n.id())
            .unwrap_or_else(|| root.id())
    }

    /// Subscribes to child-list changes anywhere in the connected tree.
    pub fn observe(&mut self) -> UnboundedReceiver<MutationRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    /// Drops every observer, as happens when the page goes away.
    pub fn disconnect(&mut self) {
        self.observers.clear();
    }

    /// Parses `markup` as a fragment and appends its top-level nodes to
    /// `parent`. Emits one `Added` record per top-level node.
    pub fn append_html(&mut self, parent: NodeId, markup: &str) -> Vec<NodeId> {
        let fragment = Html::parse_fragment(markup);
        let added: Vec<NodeId> = fragment
            .root_element()
            .children()
            .filter_map(|child| graft(&mut self.html.tree, parent, child))
            .collect();

        if self.is_connected(parent) {
            for &node in &added {
                self.notify(MutationKind::Added, node, parent);
            }
        }
        added
    }

    /// Appends `<div class="{class}"><a href="{href}">` under `body`, the
    /// shape of a typical search result. Returns the container.
    pub fn append_result(&mut self, class: &str, href: Option<&str>) -> Option<NodeId> {
        let markup = match href {
            Some(href) => format!(
                r#"<div class="{}"><a href="{}">{}</a></div>"#,
                escape(class),
                escape(href),
                escape(href)
            ),
            None => format!(r#"<div class="{}"><span></span></div>"#, escape(class)),
        };
        let body = self.body();
        self.append_html(body, &markup).into_iter().next()
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let root = self.html.tree.root().id();
        self.html
            .tree
            .get(node)
            .is_some_and(|n| n.id() == root || n.ancestors().any(|a| a.id() == root))
    }

    /// `href`s of connected links matching `selector`, in document order.
    pub fn hrefs(&self, selector: &Selector) -> Vec<String> {
        self.query_all(selector)
            .into_iter()
            .filter_map(|id| self.attribute(id, "href").map(str::to_string))
            .collect()
    }

    /// Serializes the current tree back to HTML.
    pub fn html(&self) -> String {
        self.html.html()
    }

    /// True for `body` and everything above it.
    fn is_structural(&self, node: NodeId) -> bool {
        self.html
            .tree
            .get(self.body())
            .is_some_and(|b| b.id() == node || b.ancestors().any(|a| a.id() == node))
    }

    fn notify(&mut self, kind: MutationKind, node: NodeId, parent: NodeId) {
        let record = MutationRecord { kind, node, parent };
        self.observers.retain(|tx| tx.send(record).is_ok());
    }
}

/// Deep-copies `source` from another tree under `parent`.
fn graft(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) -> Option<NodeId> {
    let id = tree.get_mut(parent)?.append(source.value().clone()).id();
    for child in source.children() {
        graft(tree, id, child);
    }
    Some(id)
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Document for MemoryDocument {
    fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .root_element()
            .select(selector)
            .map(|e| e.id())
            .collect()
    }

    fn query_first_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        let scope = ElementRef::wrap(self.html.tree.get(scope)?)?;
        scope.select(selector).next().map(|e| e.id())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.html.tree.get(node)?.value().as_element()?.attr(name)
    }

    fn detach(&mut self, node: NodeId) -> bool {
        if self.is_structural(node) || !self.is_connected(node) {
            return false;
        }
        let Some(parent) = self.html.tree.get(node).and_then(|n| n.parent()).map(|p| p.id()) else {
            return false;
        };
        if let Some(mut n) = self.html.tree.get_mut(node) {
            n.detach();
        }
        self.notify(MutationKind::Removed, node, parent);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_selector;

    #[test]
    fn test_query_in_document_order_and_detach() {
        let mut doc = MemoryDocument::new();
        let results = parse_selector(".g").unwrap();
        let a = doc.append_result("g", Some("https://a.com")).unwrap();
        let b = doc.append_result("g", Some("https://b.com")).unwrap();
        doc.append_result("other", Some("https://c.com"));

        assert_eq!(doc.query_all(&results), vec![a, b]);
        assert!(doc.detach(a));
        assert!(!doc.detach(a));
        assert_eq!(doc.query_all(&results), vec![b]);
        assert!(!doc.detach(doc.body()));
    }

    #[test]
    fn test_parsed_markup_with_combinator_selectors() {
        let doc = MemoryDocument::parse(
            r#"<div id="search">
                 <div class="g"><h3><a href="https://one.com">One</a></h3></div>
                 <div class="g"><a href="https://two.com">Two</a></div>
               </div>
               <div class="g"><a href="https://outside.com">Out</a></div>"#,
        );
        let nested = parse_selector("#search > .g").unwrap();
        let direct_link = parse_selector(".g > a[href]").unwrap();

        assert_eq!(doc.query_all(&nested).len(), 2);
        assert_eq!(
            doc.hrefs(&direct_link),
            vec!["https://two.com", "https://outside.com"]
        );
    }

    #[test]
    fn test_links_inside_detached_subtrees_are_not_connected() {
        let mut doc = MemoryDocument::new();
        let link = parse_selector("a[href]").unwrap();
        let inner_sel = parse_selector(".tF2Cxc").unwrap();
        let body = doc.body();
        let outer = doc.append_html(
            body,
            r#"<div class="g"><div class="tF2Cxc"><a href="https://x.com">x</a></div></div>"#,
        )[0];
        let inner = doc.query_all(&inner_sel)[0];
        let anchor = doc.query_first_within(outer, &link).unwrap();

        assert_eq!(doc.attribute(anchor, "href"), Some("https://x.com"));
        assert!(doc.detach(outer));
        assert!(!doc.is_connected(anchor));
        assert!(!doc.detach(inner));
        assert!(doc.hrefs(&link).is_empty());
        assert!(!doc.html().contains("x.com"));
    }

    #[test]
    fn test_href_is_kept_verbatim() {
        let mut doc = MemoryDocument::new();
        let link = parse_selector("a").unwrap();
        doc.append_result("g", Some(r#"https://a.com/?x=1&y="2""#));
        assert_eq!(doc.hrefs(&link), vec![r#"https://a.com/?x=1&y="2""#]);
    }

    #[tokio::test]
    async fn test_observers_receive_child_list_changes() {
        let mut doc = MemoryDocument::new();
        let mut rx = doc.observe();

        let container = doc.append_result("g", None).unwrap();
        let added = rx.recv().await.unwrap();
        assert_eq!(added.kind, MutationKind::Added);
        assert_eq!(added.node, container);
        assert_eq!(added.parent, doc.body());

        doc.detach(container);
        let removed = rx.recv().await.unwrap();
        assert_eq!(removed.kind, MutationKind::Removed);
        assert_eq!(removed.node, container);

        drop(rx);
        doc.append_result("g", None);
        assert!(doc.observers.is_empty());
    }
}
