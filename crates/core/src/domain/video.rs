// Video recommendations

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// ISO-8601 duration, e.g. `PT8M30S`
    pub duration: String,
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_duration: Option<String>,
}

impl Video {
    pub fn watch_url(id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", id)
    }

    pub fn with_formatted_duration(mut self) -> Self {
        self.formatted_duration = Some(format_duration(&self.duration));
        self
    }
}

/// Render an ISO-8601 duration as `m:ss` or `h:mm:ss`.
///
/// Malformed input renders as `0:00`.
pub fn format_duration(iso: &str) -> String {
    let Some(rest) = iso.strip_prefix("PT") else {
        return "0:00".to_string();
    };

    let mut hours = 0u64;
    let mut minutes = 0u64;
    let mut seconds = 0u64;
    let mut number = String::new();

    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let Ok(value) = number.parse::<u64>() else {
            return "0:00".to_string();
        };
        number.clear();
        match c {
            'H' => hours = value,
            'M' => minutes = value,
            'S' => seconds = value,
            _ => return "0:00".to_string(),
        }
    }
    if !number.is_empty() {
        return "0:00".to_string();
    }

    let total_minutes = hours * 60 + minutes;
    if total_minutes >= 60 {
        format!("{}:{:02}:{:02}", total_minutes / 60, total_minutes % 60, seconds)
    } else {
        format!("{}:{:02}", total_minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration("PT8M30S"), "8:30");
        assert_eq!(format_duration("PT1H2M3S"), "1:02:03");
        assert_eq!(format_duration("PT45S"), "0:45");
        assert_eq!(format_duration("PT75M"), "1:15:00");
        assert_eq!(format_duration("PT0S"), "0:00");
    }

    #[test]
    fn test_format_duration_malformed() {
        assert_eq!(format_duration(""), "0:00");
        assert_eq!(format_duration("8:30"), "0:00");
        assert_eq!(format_duration("PTXM"), "0:00");
        assert_eq!(format_duration("PT12"), "0:00");
    }
}
