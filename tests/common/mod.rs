// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use serde_json::{json, Map, Value};

use wordswap::parsers::html::{find_nodes, text_content};
use wordswap::rewrite::config::EngineOptions;
use wordswap::rewrite::core::{LiveDocument, RewriteEngine};
use wordswap::rewrite::settings::MemoryStore;

use markup5ever_rcdom::Handle;

/// HTML测试辅助工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn document(body: &str) -> LiveDocument {
        LiveDocument::from_html(&format!("<html><head></head><body>{}</body></html>", body))
    }

    /// Text of the first text node inside the first `tag` element.
    pub fn text_of(document: &LiveDocument, tag: &str) -> String {
        Self::first_text_node(document, tag)
            .and_then(|node| text_content(&node))
            .unwrap_or_default()
    }

    pub fn first_text_node(document: &LiveDocument, tag: &str) -> Option<Handle> {
        let element = find_nodes(document.root(), &[tag]).into_iter().next()?;
        let child = element.children.borrow().first().cloned();
        child
    }

    /// Attribute value of the first `tag` element.
    pub fn attr_of(document: &LiveDocument, tag: &str, attr: &str) -> Option<String> {
        let element = find_nodes(document.root(), &[tag]).into_iter().next()?;
        wordswap::parsers::html::get_node_attr(&element, attr)
    }

    pub fn html(document: &LiveDocument) -> String {
        document.to_html().expect("document serializes")
    }

    pub fn page_with_excluded_content() -> &'static str {
        r#"<h1>The cat</h1>
        <script>var cat = "cat";</script>
        <style>.cat { color: red; }</style>
        <textarea>cat in a textarea</textarea>
        <input value="cat">
        <select><option>cat option</option></select>
        <div contenteditable="true"><p>editable cat</p></div>
        <div contenteditable="false"><span>readonly cat</span></div>
        <noscript>noscript cat</noscript>"#
    }
}

/// 设置构建器
#[derive(Default)]
pub struct SettingsBuilder {
    enabled: Option<bool>,
    groups: Vec<Value>,
    legacy: Option<Map<String, Value>>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn group(self, replacement: &str, words: &[&str]) -> Self {
        self.group_with_flags(replacement, words, true, true)
    }

    pub fn group_with_flags(
        mut self,
        replacement: &str,
        words: &[&str],
        match_whole_words: bool,
        case_insensitive: bool,
    ) -> Self {
        self.groups.push(json!({
            "replacement": replacement,
            "words": words,
            "matchWholeWords": match_whole_words,
            "caseInsensitive": case_insensitive,
        }));
        self
    }

    /// Stores the old single-group keys instead of `replacementGroups`.
    pub fn legacy(mut self, replacement: &str, words: Value) -> Self {
        let mut items = Map::new();
        items.insert("replacement".to_string(), json!(replacement));
        items.insert("words".to_string(), words);
        self.legacy = Some(items);
        self
    }

    pub fn to_items(&self) -> Map<String, Value> {
        let mut items = self.legacy.clone().unwrap_or_default();
        if let Some(enabled) = self.enabled {
            items.insert("enabled".to_string(), json!(enabled));
        }
        if !self.groups.is_empty() {
            items.insert("replacementGroups".to_string(), Value::Array(self.groups.clone()));
        }
        items
    }

    pub fn build_store(&self) -> MemoryStore {
        MemoryStore::with_items(self.to_items())
    }
}

/// 测试引擎构建
pub fn engine_for(
    settings: &SettingsBuilder,
    document: &LiveDocument,
) -> (RewriteEngine<MemoryStore>, MemoryStore) {
    let store = settings.build_store();
    let engine = RewriteEngine::new(store.clone(), document.clone(), EngineOptions::default());
    (engine, store)
}
