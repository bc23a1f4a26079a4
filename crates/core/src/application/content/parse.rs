// Parsing of model answers into articles and quotes

use crate::domain::Language;

fn article_markers(language: Language) -> (&'static str, &'static str) {
    match language {
        Language::En => ("TITLE:", "CONTENT:"),
        Language::Ru => ("ЗАГОЛОВОК:", "СОДЕРЖАНИЕ:"),
    }
}

fn quote_markers(language: Language) -> (&'static str, &'static str) {
    match language {
        Language::En => ("QUOTE:", "AUTHOR:"),
        Language::Ru => ("ЦИТАТА:", "АВТОР:"),
    }
}

/// Extract `(title, content)` from a marked-up answer.
///
/// Lines after the content marker are joined with single spaces until another
/// title marker appears. Returns None unless both parts are non-empty.
pub fn parse_article(raw: &str, language: Language) -> Option<(String, String)> {
    let (title_marker, content_marker) = article_markers(language);
    let mut title = String::new();
    let mut content = String::new();
    let mut in_content = false;

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix(title_marker) {
            title = rest.trim().to_string();
            in_content = false;
        } else if let Some(rest) = line.strip_prefix(content_marker) {
            content = rest.trim().to_string();
            in_content = true;
        } else if in_content {
            if !content.is_empty() {
                content.push(' ');
            }
            content.push_str(line);
        }
    }

    if title.is_empty() || content.is_empty() {
        None
    } else {
        Some((title, content))
    }
}

/// Extract `(text, author)`; the author is None when the marker is missing
pub fn parse_quote(raw: &str, language: Language) -> Option<(String, Option<String>)> {
    let (quote_marker, author_marker) = quote_markers(language);
    let mut text = None;
    let mut author = None;

    for line in raw.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(quote_marker) {
            text = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(author_marker) {
            author = Some(rest.trim().to_string()).filter(|a| !a.is_empty());
        }
    }

    text.filter(|t| !t.is_empty()).map(|t| (t, author))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_article_joins_continuation_lines() {
        let raw = "TITLE: Sleep Better Tonight\n\nCONTENT: Start with a routine.\nKeep the room cool.\n\nAvoid screens.";
        let (title, content) = parse_article(raw, Language::En).unwrap();
        assert_eq!(title, "Sleep Better Tonight");
        assert_eq!(
            content,
            "Start with a routine. Keep the room cool. Avoid screens."
        );
    }

    #[test]
    fn test_parse_article_russian_markers() {
        let raw = "ЗАГОЛОВОК: Спокойствие\nСОДЕРЖАНИЕ: Дышите медленно.";
        let (title, content) = parse_article(raw, Language::Ru).unwrap();
        assert_eq!(title, "Спокойствие");
        assert_eq!(content, "Дышите медленно.");
        // markers of the other language are not recognised
        assert!(parse_article(raw, Language::En).is_none());
    }

    #[test]
    fn test_parse_article_needs_both_parts() {
        assert!(parse_article("TITLE: Only a title", Language::En).is_none());
        assert!(parse_article("CONTENT: no title", Language::En).is_none());
        assert!(parse_article("", Language::En).is_none());
    }

    #[test]
    fn test_parse_quote() {
        let raw = "QUOTE: Small steps still move you forward.\nAUTHOR: Jane Doe";
        assert_eq!(
            parse_quote(raw, Language::En),
            Some((
                "Small steps still move you forward.".to_string(),
                Some("Jane Doe".to_string())
            ))
        );

        let raw = "ЦИТАТА: Дыши глубже.";
        assert_eq!(
            parse_quote(raw, Language::Ru),
            Some(("Дыши глубже.".to_string(), None))
        );
        assert!(parse_quote("Something else", Language::En).is_none());
    }
}
