//! 模式编译器模块
//!
//! 把有序的替换组编译为每组一个匹配器。匹配器自带所属组的替换文本和
//! 大小写标志，匹配结果无需再映射回具体的词条。

use std::borrow::Cow;

use regex::{Captures, Regex, RegexBuilder};

use super::case::adapt_case;
use crate::rewrite::config::EngineOptions;
use crate::rewrite::error::{RewriteError, RewriteResult};
use crate::rewrite::settings::ReplacementGroup;

/// Executable pattern for one replacement group.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    pub regex: Regex,
    pub replacement: String,
    pub case_insensitive: bool,
    pub group_index: usize,
}

impl CompiledMatcher {
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Replaces every match in one pass, adapting case per match.
    pub fn replace_all<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.regex
            .replace_all(text, |caps: &Captures| adapt_case(&caps[0], &self.replacement))
    }
}

/// Ordered matchers; empty when nothing is configured.
#[derive(Debug, Clone, Default)]
pub struct MatcherSet {
    matchers: Vec<CompiledMatcher>,
}

impl MatcherSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn matchers(&self) -> &[CompiledMatcher] {
        &self.matchers
    }

    /// Cheap existence test run before any substitution.
    pub fn is_match(&self, text: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(text))
    }

    /// Applies every group in list order and returns the rewritten text, or
    /// `None` when nothing changed. Later groups see earlier groups' output.
    pub fn rewrite(&self, text: &str) -> Option<String> {
        let mut current: Cow<'_, str> = Cow::Borrowed(text);

        for matcher in &self.matchers {
            let replaced = match matcher.replace_all(&current) {
                Cow::Owned(replaced) => Some(replaced),
                Cow::Borrowed(_) => None,
            };
            if let Some(replaced) = replaced {
                current = Cow::Owned(replaced);
            }
        }

        match current {
            Cow::Owned(rewritten) if rewritten != text => Some(rewritten),
            _ => None,
        }
    }
}

/// Compiles the groups into matchers, capping the total number of words.
pub fn compile_matchers(
    groups: &[ReplacementGroup],
    options: &EngineOptions,
) -> RewriteResult<MatcherSet> {
    let mut matchers = Vec::new();
    let mut budget = options.max_words;
    let mut dropped = 0usize;

    for (group_index, group) in groups.iter().enumerate() {
        let words: Vec<&str> = group
            .words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .collect();

        let take = words.len().min(budget);
        dropped += words.len() - take;
        budget -= take;

        if take == 0 {
            continue;
        }

        let regex = build_group_regex(&words[..take], group, options)
            .map_err(|e| e.with_context(format!("group {}", group_index)))?;

        matchers.push(CompiledMatcher {
            regex,
            replacement: group.replacement.clone(),
            case_insensitive: group.case_insensitive,
            group_index,
        });
    }

    if dropped > 0 {
        tracing::warn!(
            "word limit of {} reached, {} entries were not compiled",
            options.max_words,
            dropped
        );
    }

    tracing::debug!("compiled {} matchers from {} groups", matchers.len(), groups.len());
    Ok(MatcherSet { matchers })
}

fn build_group_regex(
    words: &[&str],
    group: &ReplacementGroup,
    options: &EngineOptions,
) -> RewriteResult<Regex> {
    // longest first so a phrase wins over a word it starts with
    let mut escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    escaped.sort_by(|a, b| b.len().cmp(&a.len()));

    let alternation = escaped.join("|");
    let pattern = if group.match_whole_words {
        format!(r"\b(?:{})\b", alternation)
    } else {
        format!("(?:{})", alternation)
    };

    RegexBuilder::new(&pattern)
        .case_insensitive(group.case_insensitive)
        .size_limit(options.regex_size_limit)
        .build()
        .map_err(|e| RewriteError::Compile(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(groups: &[ReplacementGroup]) -> MatcherSet {
        compile_matchers(groups, &EngineOptions::default()).unwrap()
    }

    #[test]
    fn test_no_groups_yield_no_matchers() {
        assert!(compile(&[]).is_empty());
        assert!(compile(&[ReplacementGroup::new("x", &[])]).is_empty());
    }

    #[test]
    fn test_words_are_literal() {
        let set = compile(&[ReplacementGroup::new("ok", &["a.c", "(x)"]).with_whole_words(false)]);

        assert!(!set.is_match("abc"));
        assert_eq!(set.rewrite("a.c and (x)").as_deref(), Some("ok and ok"));
    }

    #[test]
    fn test_whole_words() {
        let set = compile(&[ReplacementGroup::new("dog", &["cat"])]);

        assert_eq!(set.rewrite("concatenate"), None);
        assert_eq!(set.rewrite("the cat sat").as_deref(), Some("the dog sat"));
    }

    #[test]
    fn test_partial_words() {
        let set = compile(&[ReplacementGroup::new("dog", &["cat"]).with_whole_words(false)]);

        assert_eq!(set.rewrite("concatenate").as_deref(), Some("condogenate"));
    }

    #[test]
    fn test_case_sensitive_group() {
        let set = compile(&[ReplacementGroup::new("widget", &["Machine"]).with_case_insensitive(false)]);

        assert_eq!(set.rewrite("MACHINE machine"), None);
        assert_eq!(set.rewrite("a Machine").as_deref(), Some("a Widget"));
    }

    #[test]
    fn test_case_insensitive_group_adapts_case() {
        let set = compile(&[ReplacementGroup::new("widget", &["machine"])]);

        assert_eq!(
            set.rewrite("MACHINE Machine machine MaChInE").as_deref(),
            Some("WIDGET Widget widget widget")
        );
    }

    #[test]
    fn test_longest_word_wins() {
        let set = compile(&[ReplacementGroup::new("X", &["new", "new york"]).with_whole_words(false)]);

        assert_eq!(set.rewrite("new york city").as_deref(), Some("x city"));
    }

    #[test]
    fn test_groups_apply_in_order() {
        let set = compile(&[
            ReplacementGroup::new("beta", &["alpha"]),
            ReplacementGroup::new("gamma", &["beta"]),
        ]);

        assert_eq!(set.rewrite("alpha").as_deref(), Some("gamma"));
    }

    #[test]
    fn test_word_cap_drops_extra_entries() {
        let options = EngineOptions {
            max_words: 2,
            ..EngineOptions::default()
        };
        let groups = [
            ReplacementGroup::new("x", &["one", "two"]),
            ReplacementGroup::new("y", &["three"]),
        ];

        let set = compile_matchers(&groups, &options).unwrap();

        assert_eq!(set.len(), 1);
        assert!(!set.is_match("three"));
    }

    #[test]
    fn test_oversized_pattern_is_an_error() {
        let options = EngineOptions {
            regex_size_limit: 16,
            ..EngineOptions::default()
        };
        let groups = [ReplacementGroup::new("x", &["something quite long"])];

        assert!(matches!(
            compile_matchers(&groups, &options),
            Err(RewriteError::Compile(_))
        ));
    }

    #[test]
    fn test_unchanged_text_is_not_reported() {
        let set = compile(&[ReplacementGroup::new("cat", &["cat"])]);

        assert_eq!(set.rewrite("the cat"), None);
    }
}
