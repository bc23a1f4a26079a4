// Cache key layout and lifetimes

use crate::domain::Language;
use chrono::{DateTime, Datelike, Utc};

pub const USER_TOPIC_TTL_SECS: u64 = 300;
pub const RECOMMENDATIONS_TTL_SECS: u64 = 1_800;
pub const POPULAR_TOPICS_TTL_SECS: u64 = 900;
pub const DAY_TTL_SECS: u64 = 86_400;

pub const POPULAR_TOPICS: &str = "popular_topics";

pub fn user_topic(user_id: &str) -> String {
    format!("user_topic:{}", user_id)
}

pub fn recommendations(user_id: &str, language: Language) -> String {
    format!("recommendations:{}:{}", user_id, language)
}

pub fn article(topic: &str, language: Language, date: &str) -> String {
    format!("article:{}:{}:{}", topic, language, date)
}

pub fn quote(topic: &str, language: Language, date: &str) -> String {
    format!("quote:{}:{}:{}", topic, language, date)
}

pub fn daily_content(date: &str) -> String {
    format!("daily_content:{}", date)
}

pub fn all_topics_content(date: &str) -> String {
    format!("all_topics_content:{}", date)
}

pub fn initial_content(language: Language) -> String {
    format!("initial_content:{}", language)
}

fn utc(now_millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(now_millis).unwrap_or_default()
}

/// `YYYYMMDD` (UTC), used as the day suffix of cache keys
pub fn date_key(now_millis: i64) -> String {
    utc(now_millis).format("%Y%m%d").to_string()
}

/// `YYYY-MM-DD` (UTC), stored with quotes
pub fn iso_date(now_millis: i64) -> String {
    utc(now_millis).format("%Y-%m-%d").to_string()
}

/// 1-based day of the year (UTC)
pub fn day_of_year(now_millis: i64) -> u32 {
    utc(now_millis).ordinal()
}
