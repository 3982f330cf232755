//! Markup shaped like what the authoring tool sends back after an edit.

use html::{Node, parse};

fn elements<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    if node.name().is_some() {
        out.push(node);
    }
    for child in node.children() {
        elements(child, out);
    }
}

fn find<'a>(root: &'a Node, attr: &str, value: &str) -> Option<&'a Node> {
    let mut all = Vec::new();
    elements(root, &mut all);
    all.into_iter().find(|n| n.attr(attr) == Some(value))
}

#[test]
fn block_payload_with_single_quoted_annotations() {
    let doc = parse(
        "<div class='cards block' data-aue-resource='urn:aemconnection:/content/page/jcr:content/root/section/cards' data-aue-type='container'>\
           <div><div><picture><img src='/media_1.png' alt=''></picture></div><div><p>Card &amp; more</p></div></div>\
         </div>",
    );
    let block = find(&doc, "data-aue-type", "container").expect("block root");
    assert_eq!(block.attr("class"), Some("cards block"));
    assert!(block.attr("data-aue-resource").is_some_and(|r| r.ends_with("/cards")));
    let img = find(&doc, "src", "/media_1.png").expect("img");
    assert!(img.children().is_empty());
    assert_eq!(img.attr("alt"), Some(""));

    let mut texts = Vec::new();
    let mut all = Vec::new();
    elements(&doc, &mut all);
    for node in all.iter().filter(|n| n.name() == Some("p")) {
        for child in node.children() {
            if let Node::Text { text } = child {
                texts.push(text.as_str());
            }
        }
    }
    assert_eq!(texts, ["Card & more"]);
}

#[test]
fn richtext_payload_keeps_every_sibling() {
    let doc = parse(
        r#"<h2 data-richtext-resource="urn:t" data-richtext-prop="text">Title</h2>
<p data-richtext-resource="urn:t">One<br>two</p>
<ul data-richtext-resource="urn:t"><li>a<li>b</ul>"#,
    );
    let roots: Vec<_> = doc.children().iter().filter_map(Node::name).collect();
    assert_eq!(roots, ["h2", "p", "ul"]);
    let p = doc.children().iter().find(|n| n.name() == Some("p")).expect("p");
    let parts: Vec<_> = p
        .children()
        .iter()
        .map(|n| match n {
            Node::Text { text } => text.as_str(),
            other => other.name().unwrap_or_default(),
        })
        .collect();
    assert_eq!(parts, ["One", "br", "two"]);
}

#[test]
fn full_page_markup_is_taken_literally() {
    let doc = parse(
        "<!DOCTYPE html><html><head><script>if (a < b) { go(); }</script></head>\
         <body class='article'><main data-aue-resource='urn:main'><div>x</div></main></body></html>",
    );
    let Node::Document { doctype, .. } = &doc else {
        panic!("expected document root");
    };
    assert!(doctype.as_deref().is_some_and(|d| d.ends_with("html")));
    let main = find(&doc, "data-aue-resource", "urn:main").expect("main");
    assert_eq!(main.name(), Some("main"));
    let mut all = Vec::new();
    elements(&doc, &mut all);
    let script = all.into_iter().find(|n| n.name() == Some("script")).expect("script");
    assert!(matches!(&script.children()[0], Node::Text { text } if text.contains("a < b")));
}
