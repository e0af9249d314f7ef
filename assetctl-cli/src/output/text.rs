//! Text output formatting.

use assetctl_core::{DayEntry, ResponseMeta};
use serde_json::Value;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";

/// Keys tried, in order, to name an asset in one line.
const IDENTITY_KEYS: [&str; 6] = ["ip", "hostname", "name", "fingerprint_sha256", "fingerprint", "id"];

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// One line per asset.
    pub fn format_items(&self, items: &[Value]) -> String {
        items
            .iter()
            .map(|item| self.summarize(item))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One line per day: date, presence, and the snapshot summary.
    pub fn format_history(&self, entries: &[DayEntry<Value>]) -> String {
        entries
            .iter()
            .map(|entry| {
                let date = entry.at.format("%Y-%m-%d");
                match &entry.data {
                    Some(data) => format!("{date}  {}  {}", self.green("present"), self.summarize(data)),
                    None => format!("{date}  {}", self.red("absent ")),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Footer describing how the result was fetched.
    pub fn format_meta(&self, meta: &ResponseMeta, items: usize) -> String {
        let latency_ms = meta.latency.as_millis();
        self.dim(&format!(
            "{items} {} from {} {} ({} attempts, {latency_ms} ms)",
            plural(items, "item", "items"),
            meta.page_count,
            plural(meta.page_count as usize, "page", "pages"),
            meta.attempts,
        ))
    }

    /// Names an asset by its first identity key, with a service count when present.
    pub fn summarize(&self, item: &Value) -> String {
        let identity = IDENTITY_KEYS
            .iter()
            .find_map(|key| item.get(*key).and_then(Value::as_str));

        let Some(identity) = identity else {
            return item.to_string();
        };

        match item.get("services").and_then(Value::as_array) {
            Some(services) => format!(
                "{}  {}",
                self.bold(identity),
                self.dim(&format!(
                    "{} {}",
                    services.len(),
                    plural(services.len(), "service", "services")
                ))
            ),
            None => self.bold(identity),
        }
    }

    // ========================================================================
    // Color helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}
