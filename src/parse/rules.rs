//! Ordered field-extraction rules.
//!
//! Each field owns a [`RuleTable`]: a list of `(regex, extractor)` pairs that
//! is evaluated top to bottom, first hit wins. A rule hits when its regex
//! matches AND its extractor yields a value, so an extractor can veto a match
//! (e.g. descriptions that are too short) and let the next rule try.
//!
//! Priority is encoded purely by position:
//! - explicit labels (`**日期**:`) before bare tokens (`2025-02-15`),
//! - meeting-platform links before bare meeting IDs before generic
//!   location labels.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Turns a successful regex match into a field value; `None` vetoes the hit.
pub type Extractor = fn(&Captures<'_>) -> Option<String>;

pub struct Rule {
    pub name: &'static str,
    re: Regex,
    extract: Extractor,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, extract: Extractor) -> Self {
        Self {
            name,
            re: Regex::new(pattern).expect("static extraction rule must compile"),
            extract,
        }
    }

    pub fn apply(&self, text: &str) -> Option<String> {
        self.re
            .captures(text)
            .and_then(|caps| (self.extract)(&caps))
    }
}

/// Which rule produced a value; exposed so rule priority is testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub rule: &'static str,
    pub value: String,
}

pub struct RuleTable {
    pub field: &'static str,
    rules: Vec<Rule>,
}

impl RuleTable {
    fn new(field: &'static str, rules: Vec<Rule>) -> Self {
        Self { field, rules }
    }

    pub fn first_match(&self, text: &str) -> Option<RuleHit> {
        self.rules.iter().find_map(|r| {
            r.apply(text).map(|value| RuleHit {
                rule: r.name,
                value,
            })
        })
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        self.first_match(text).map(|hit| hit.value)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }
}

/* ----------------------------
Extractors
---------------------------- */

fn group1_trimmed(caps: &Captures<'_>) -> Option<String> {
    caps.get(1).map(|m| m.as_str().trim().to_string())
}

fn meeting_link(caps: &Captures<'_>) -> Option<String> {
    static TRAILING_ID: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"/([a-zA-Z0-9]+)$").expect("meeting id regex"));

    let url = caps.get(1).or_else(|| caps.get(0))?.as_str();
    let location = match TRAILING_ID.captures(url).and_then(|c| c.get(1)) {
        Some(id) => format!("腾讯会议 ({})", id.as_str()),
        None => "腾讯会议".to_string(),
    };
    Some(location)
}

fn meeting_number(caps: &Captures<'_>) -> Option<String> {
    caps.get(1).map(|m| format!("腾讯会议 {}", m.as_str()))
}

fn speaker_name(caps: &Captures<'_>) -> Option<String> {
    static CONTACT_SUFFIX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s*-\s*.+$").expect("speaker suffix regex"));

    let raw = caps.get(1)?.as_str().trim();
    Some(CONTACT_SUFFIX.replace(raw, "").trim().to_string())
}

fn link_url(caps: &Captures<'_>) -> Option<String> {
    caps.get(1).map(|m| m.as_str().to_string())
}

fn long_paragraph(caps: &Captures<'_>) -> Option<String> {
    let text = caps.get(1)?.as_str().trim();
    (text.chars().count() > 10).then(|| text.to_string())
}

/* ----------------------------
Tables
---------------------------- */

pub static TITLE_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(
        "title",
        vec![Rule::new("h1_heading", r"(?m)^#\s+(.+)$", group1_trimmed)],
    )
});

pub static DATE_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(
        "date",
        vec![
            Rule::new("label_zh", r"(?i)\*\*日期\*\*[：:]\s*(.+)", group1_trimmed),
            Rule::new("label_en", r"(?i)Date[：:]\s*(.+)", group1_trimmed),
            Rule::new("cjk_date", r"(\d{4}年\d{1,2}月\d{1,2}日)", group1_trimmed),
            Rule::new("iso_date", r"(\d{4}-\d{1,2}-\d{1,2})", group1_trimmed),
            Rule::new("us_date", r"(\d{1,2}/\d{1,2}/\d{4})", group1_trimmed),
        ],
    )
});

pub static TIME_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(
        "time",
        vec![
            Rule::new("label_zh", r"(?i)\*\*时间\*\*[：:]\s*(.+)", group1_trimmed),
            Rule::new("label_en", r"(?i)Time[：:]\s*(.+)", group1_trimmed),
            Rule::new(
                "time_range",
                r"(\d{1,2}:\d{2}[~-]\d{1,2}:\d{2})",
                group1_trimmed,
            ),
            Rule::new(
                "clock_time",
                r"(?i)(\d{1,2}:\d{2}(?:\s*[AP]M)?)",
                group1_trimmed,
            ),
        ],
    )
});

/// Location: meeting links, then meeting numbers, then plain labels.
/// No hit means the caller keeps [`crate::ingest::types::ONLINE_LOCATION`].
pub static LOCATION_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(
        "location",
        vec![
            Rule::new(
                "meeting_markdown_link",
                r"(?i)\[腾讯会议\]\((https://meeting\.tencent\.com[^)]+)\)",
                meeting_link,
            ),
            Rule::new(
                "meeting_labeled_url",
                r"(?i)腾讯会议.*?(https://meeting\.tencent\.com[^\s)]+)",
                meeting_link,
            ),
            Rule::new(
                "meeting_bare_url",
                r"(?i)https://meeting\.tencent\.com[^\s)]+",
                meeting_link,
            ),
            Rule::new("meeting_id_platform", r"(?i)腾讯会议.*?(\d{9,})", meeting_number),
            Rule::new(
                "meeting_id_label",
                r"(?i)会议.*?ID.*?[：:]?\s*(\d{9,})",
                meeting_number,
            ),
            Rule::new(
                "meeting_number_label",
                r"(?i)会议号.*?[：:]?\s*(\d{9,})",
                meeting_number,
            ),
            Rule::new(
                "meeting_id_en",
                r"(?i)Meeting.*?ID.*?[：:]?\s*(\d{9,})",
                meeting_number,
            ),
            Rule::new("label_place", r"(?i)\*\*地点\*\*[：:]\s*(.+)", group1_trimmed),
            Rule::new("label_en", r"(?i)Location[：:]\s*(.+)", group1_trimmed),
            Rule::new("label_venue", r"(?i)\*\*场所\*\*[：:]\s*(.+)", group1_trimmed),
        ],
    )
});

pub static SPEAKER_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(
        "speaker",
        vec![
            Rule::new("label_presenter", r"(?i)\*\*主讲人\*\*[：:]\s*(.+)", speaker_name),
            Rule::new("label_speaker_zh", r"(?i)\*\*演讲者\*\*[：:]\s*(.+)", speaker_name),
            Rule::new("label_en", r"(?i)Speaker[：:]\s*(.+)", speaker_name),
            Rule::new("label_lecturer", r"(?i)\*\*讲师\*\*[：:]\s*(.+)", speaker_name),
        ],
    )
});

pub static VIDEO_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(
        "video",
        vec![
            Rule::new("link_video_zh", r"(?i)\[视频\]\((https?://[^)]+)\)", link_url),
            Rule::new("link_video_en", r"(?i)\[Video\]\((https?://[^)]+)\)", link_url),
            Rule::new("link_watch", r"(?i)\[观看视频\]\((https?://[^)]+)\)", link_url),
            Rule::new("link_bilibili", r"(?i)\[B站\]\((https?://[^)]+)\)", link_url),
            Rule::new("link_youtube", r"(?i)\[YouTube\]\((https?://[^)]+)\)", link_url),
            Rule::new(
                "bare_video_host",
                r"(?i)(https?://[^\s]+(?:bilibili|youtube|vimeo)[^\s]*)",
                link_url,
            ),
        ],
    )
});

pub static DESCRIPTION_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(
        "description",
        vec![
            Rule::new(
                "paragraph_after_title",
                r"#\s+.+?\n\n([^*+#\-\[\]]+?)(?:\n\n|\n[*+#\-\[\]]|$)",
                long_paragraph,
            ),
            Rule::new(
                "summary_label",
                r"(?i)(?:简介|描述|介绍)[：:]?\s*(.+)",
                long_paragraph,
            ),
        ],
    )
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_date_beats_bare_token() {
        let text = "Released 2024-01-01\n**日期**: 2025年3月1日\n";
        let hit = DATE_RULES.first_match(text).expect("date hit");
        assert_eq!(hit.rule, "label_zh");
        assert_eq!(hit.value, "2025年3月1日");
    }

    #[test]
    fn bare_date_forms_fall_through_in_order() {
        assert_eq!(
            DATE_RULES.first_match("held on 12/20/2024 and 2024-12-20").map(|h| h.rule),
            Some("iso_date")
        );
        assert_eq!(
            DATE_RULES.extract("slides from 12/20/2024").as_deref(),
            Some("12/20/2024")
        );
        assert_eq!(DATE_RULES.extract("no date here"), None);
    }

    #[test]
    fn time_range_preferred_over_single_clock() {
        let hit = TIME_RULES.first_match("starts 19:00-21:00 sharp").unwrap();
        assert_eq!(hit.rule, "time_range");
        assert_eq!(hit.value, "19:00-21:00");

        let hit = TIME_RULES.first_match("doors open 7:30 pm").unwrap();
        assert_eq!(hit.rule, "clock_time");
        assert_eq!(hit.value, "7:30 pm");
    }

    #[test]
    fn meeting_link_beats_meeting_id_and_label() {
        let text = "**地点**: 图书馆\n会议号：123456789\n[腾讯会议](https://meeting.tencent.com/dm/AbC123)";
        let hit = LOCATION_RULES.first_match(text).unwrap();
        assert_eq!(hit.rule, "meeting_markdown_link");
        assert_eq!(hit.value, "腾讯会议 (AbC123)");
    }

    #[test]
    fn meeting_id_beats_generic_label() {
        let text = "**地点**: 图书馆\n腾讯会议号：987654321";
        let hit = LOCATION_RULES.first_match(text).unwrap();
        assert_eq!(hit.rule, "meeting_id_platform");
        assert_eq!(hit.value, "腾讯会议 987654321");
    }

    #[test]
    fn short_meeting_numbers_are_not_ids() {
        let text = "会议号：12345\nLocation: Room 101";
        assert_eq!(LOCATION_RULES.extract(text).as_deref(), Some("Room 101"));
    }

    #[test]
    fn meeting_url_without_alnum_tail_keeps_platform_name() {
        let text = "join https://meeting.tencent.com/dm/abc-";
        assert_eq!(LOCATION_RULES.extract(text).as_deref(), Some("腾讯会议"));
    }

    #[test]
    fn speaker_contact_suffix_is_dropped() {
        let hit = SPEAKER_RULES
            .first_match("**主讲人**：张三 - zhang@example.org\n")
            .unwrap();
        assert_eq!(hit.value, "张三");
    }

    #[test]
    fn video_labels_before_bare_hosts() {
        let text = "see https://www.youtube.com/watch?v=1 or [B站](https://b23.tv/xyz)";
        let hit = VIDEO_RULES.first_match(text).unwrap();
        assert_eq!(hit.rule, "link_bilibili");
        assert_eq!(hit.value, "https://b23.tv/xyz");

        assert_eq!(
            VIDEO_RULES.extract("recording: https://www.bilibili.com/video/BV1").as_deref(),
            Some("https://www.bilibili.com/video/BV1")
        );
    }

    #[test]
    fn short_paragraph_is_vetoed_and_next_rule_tried() {
        let text = "# Title\n\nToo short\n\n简介：这是一次关于模型可解释性的深入讨论\n";
        let hit = DESCRIPTION_RULES.first_match(text).unwrap();
        assert_eq!(hit.rule, "summary_label");
    }

    #[test]
    fn tables_keep_documented_priority() {
        assert_eq!(
            LOCATION_RULES.rule_names()[..3],
            ["meeting_markdown_link", "meeting_labeled_url", "meeting_bare_url"]
        );
        assert_eq!(DATE_RULES.rule_names().first(), Some(&"label_zh"));
        assert_eq!(LOCATION_RULES.field, "location");
    }
}
