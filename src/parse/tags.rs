//! Keyword tagging.

/// Upper bound on tags per event.
pub const MAX_TAGS: usize = 4;

/// Domain vocabulary, scanned case-insensitively against the whole document.
/// Output order follows this list, not relevance.
pub const TAG_KEYWORDS: &[&str] = &[
    "AI对齐",
    "AI安全",
    "大语言模型",
    "LLM",
    "机器学习",
    "深度学习",
    "可解释性",
    "RLHF",
    "宪法AI",
    "对齐研究",
    "安全风险",
    "隐私保护",
    "算法公平性",
    "对抗攻击",
    "模型安全",
    "人工智能",
    "神经网络",
    "多模态",
];

/// Title-only fallback: `(any of these words, tag)`; each row adds at most one tag.
const TITLE_CATEGORIES: &[(&[&str], &str)] = &[
    (&["AI", "人工智能"], "AI安全"),
    (&["对齐"], "AI对齐"),
    (&["安全"], "安全风险"),
    (&["模型"], "大语言模型"),
    (&["共学", "研讨"], "学习交流"),
];

pub fn extract_tags(content: &str, title: &str) -> Vec<String> {
    let haystack = content.to_lowercase();
    let mut tags: Vec<String> = TAG_KEYWORDS
        .iter()
        .filter(|kw| haystack.contains(&kw.to_lowercase()))
        .map(|kw| kw.to_string())
        .collect();

    if tags.is_empty() {
        tags = TITLE_CATEGORIES
            .iter()
            .filter(|(words, _)| words.iter().any(|w| title.contains(w)))
            .map(|(_, tag)| tag.to_string())
            .collect();
    }

    tags.truncate(MAX_TAGS);
    tags
}
