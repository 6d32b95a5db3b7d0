use ego_tree::NodeRef;
use recipe_sync_core::SourceRecipeRecord;
use scraper::node::Node;
use scraper::Html;

use crate::{EntryFields, PostStatus, DEFAULT_AUTHOR, RECIPE_KIND};

pub const UNTITLED: &str = "Untitled Recipe";

/// Body used when the upstream record has neither a pre-rendered block nor a
/// description ("recipe generated automatically").
pub const PLACEHOLDER_DESCRIPTION: &str = "Przepis wygenerowany automatycznie.";

/// Entry columns for a record: markup-free title, presentation body, always a
/// draft under the default author.
pub fn entry_fields(record: &SourceRecipeRecord) -> EntryFields {
    let title = record.title().map(strip_all_tags).unwrap_or_default();
    EntryFields {
        kind: RECIPE_KIND.to_string(),
        title: if title.is_empty() {
            UNTITLED.to_string()
        } else {
            title
        },
        content: presentation_body(record),
        status: PostStatus::Draft,
        author: DEFAULT_AUTHOR,
    }
}

/// A pre-rendered `blog_content` block is trusted and used verbatim;
/// otherwise the description becomes one paragraph.
pub fn presentation_body(record: &SourceRecipeRecord) -> String {
    if let Some(block) = record.blog_content() {
        return block.to_string();
    }
    let description = record.description().unwrap_or(PLACEHOLDER_DESCRIPTION);
    format!("<p>{}</p>", nl2br(description))
}

fn nl2br(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        match line.strip_suffix("\r\n").or_else(|| line.strip_suffix('\n')) {
            Some(stripped) => {
                out.push_str(stripped);
                out.push_str("<br />");
                out.push_str(&line[stripped.len()..]);
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Plain text of an HTML fragment. `<script>` and `<style>` bodies are dropped
/// along with the tags.
pub fn strip_all_tags(input: &str) -> String {
    if !input.contains('<') {
        return input.trim().to_string();
    }
    let fragment = Html::parse_fragment(input);
    let mut text = String::new();
    for child in fragment.root_element().children() {
        collect_text(child, &mut text);
    }
    text.trim().to_string()
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            if matches!(element.name(), "script" | "style") {
                return;
            }
            for child in node.children() {
                collect_text(child, out);
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}
