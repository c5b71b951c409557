//! 大小写适配模块
//!
//! 按匹配到的原词的大小写形态调整替换文本

/// Adapts the letter case of `replacement` to mirror `matched`.
///
/// Rules, first match wins:
///
/// 1. two characters or fewer: treated as an acronym, `replacement` unchanged
/// 2. contains a letter and no lowercase letter: upper-cased
/// 3. title case: first character upper-cased, the rest lower-cased
/// 4. no uppercase letter: lower-cased
/// 5. anything else: `replacement` unchanged
pub fn adapt_case(matched: &str, replacement: &str) -> String {
    if matched.chars().count() <= 2 {
        return replacement.to_string();
    }

    let has_letter = matched.chars().any(char::is_alphabetic);
    let has_lower = matched.chars().any(char::is_lowercase);
    let has_upper = matched.chars().any(char::is_uppercase);

    if has_letter && !has_lower {
        return replacement.to_uppercase();
    }

    if is_title_case(matched) {
        return to_title_case(replacement);
    }

    if !has_upper {
        return replacement.to_lowercase();
    }

    replacement.to_string()
}

fn is_title_case(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => !chars.any(char::is_uppercase),
        _ => false,
    }
}

fn to_title_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}
