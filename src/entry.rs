use std::fmt::{self, Debug};

/// Separator appended after every rendered entry.
pub const ENTRY_SEPARATOR: &str = "\n\n";

/// One logging call: an optional timestamp, an optional accepted level and
/// the caller's content.
///
/// The content is borrowed; an entry only lives long enough to be rendered.
pub struct LogEntry<'a, T: ?Sized> {
    timestamp: Option<String>,
    level: Option<&'a str>,
    content: &'a T,
}

impl<'a, T: Debug + ?Sized> LogEntry<'a, T> {
    pub fn new(timestamp: Option<String>, level: Option<&'a str>, content: &'a T) -> Self {
        LogEntry {
            timestamp,
            level,
            content,
        }
    }

    /// Render the entry as a pretty-printed structure followed by a blank
    /// line. Nesting depth and collection length are not limited.
    pub fn render(&self) -> String {
        format!("{self:#?}{ENTRY_SEPARATOR}")
    }
}

impl<T: Debug + ?Sized> Debug for LogEntry<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entry = f.debug_struct("LogEntry");
        if let Some(timestamp) = &self.timestamp {
            entry.field("timestamp", timestamp);
        }
        if let Some(level) = self.level {
            entry.field("level", &level);
        }
        entry.field("content", &self.content).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    #[allow(dead_code)]
    enum Tree {
        Leaf(u32),
        Node(Box<Tree>),
    }

    #[test]
    fn keys_in_order() {
        let entry = LogEntry::new(Some("2024-Mar-07T09:05:02".to_string()), Some("warn"), "disk almost full");
        assert_eq!(
            entry.render(),
            "LogEntry {\n    timestamp: \"2024-Mar-07T09:05:02\",\n    level: \"warn\",\n    content: \"disk almost full\",\n}\n\n"
        );
    }

    #[test]
    fn level_and_timestamp_are_optional() {
        let rendered = LogEntry::new(None, None, &42).render();
        assert_eq!(rendered, "LogEntry {\n    content: 42,\n}\n\n");
    }

    #[test]
    fn deep_and_long_content_is_not_truncated() {
        let mut tree = Tree::Leaf(7);
        for _ in 0..64 {
            tree = Tree::Node(Box::new(tree));
        }
        let items: Vec<u32> = (0..500).collect();
        let content = (tree, items);

        let rendered = LogEntry::new(None, None, &content).render();
        assert_eq!(rendered.matches("Node(").count(), 64);
        assert!(rendered.contains("Leaf(\n"));
        assert!(rendered.contains("499,"));
        assert!(!rendered.contains("..."));
    }
}
