// Per-topic article selection

use crate::domain::{Approach, Article};
use std::collections::HashMap;

/// Keep at most `per_topic` articles for each primary topic.
///
/// Within a topic, one article of each approach is taken first (practical,
/// theoretical, motivational), then the remaining slots are filled in input
/// order. Topics appear in order of their first article.
pub fn group_articles(articles: Vec<Article>, per_topic: usize) -> Vec<Article> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Article>> = HashMap::new();
    for article in articles {
        let topic = article.primary_topic().to_string();
        if !groups.contains_key(&topic) {
            order.push(topic.clone());
        }
        groups.entry(topic).or_default().push(article);
    }

    let mut selected = Vec::new();
    for topic in order {
        let Some(mut group) = groups.remove(&topic) else {
            continue;
        };
        selected.extend(pick(&mut group, per_topic));
    }
    selected
}

fn pick(group: &mut Vec<Article>, per_topic: usize) -> Vec<Article> {
    let mut picked = Vec::with_capacity(per_topic);
    for approach in Approach::ALL {
        if picked.len() == per_topic {
            return picked;
        }
        if let Some(pos) = group.iter().position(|a| a.approach == approach) {
            picked.push(group.remove(pos));
        }
    }
    let take = per_topic.saturating_sub(picked.len()).min(group.len());
    picked.extend(group.drain(..take));
    picked
}
