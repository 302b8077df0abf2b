// src/content/labels.rs
use std::collections::BTreeMap;

use crate::content::types::ContentPost;

/// Label -> number of posts carrying it, over exactly the posts given.
pub fn label_counts(posts: &[ContentPost]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for p in posts {
        for label in p.labels.iter().flatten() {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::types::Author;

    fn post(labels: Option<&[&str]>) -> ContentPost {
        ContentPost {
            id: "x".into(),
            title: "t".into(),
            published: None,
            content: String::new(),
            author: Author::default(),
            images: None,
            labels: labels.map(|l| l.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn counts_across_page() {
        let posts = vec![post(Some(&["A", "B"])), post(Some(&["A"])), post(Some(&[]))];
        let counts = label_counts(&posts);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["A"], 2);
        assert_eq!(counts["B"], 1);
    }

    #[test]
    fn unlabelled_posts_give_nothing() {
        assert!(label_counts(&[post(None), post(Some(&[" "]))]).is_empty());
    }
}
