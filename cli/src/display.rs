use console::style;
use newsdesk_core::{MessageKind, Reporter};

const LINE_LENGTH: usize = 80;

/// Tagged, colored console output hard-wrapped at a fixed width.
pub struct ConsoleReporter {
    line_length: usize,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self {
            line_length: LINE_LENGTH,
        }
    }
}

impl ConsoleReporter {
    pub fn format(&self, kind: MessageKind, text: &str) -> String {
        format!("[{}] {}", kind.tag(), wrap(text, self.line_length))
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, kind: MessageKind, text: &str) {
        let message = self.format(kind, text);
        let styled = match kind {
            MessageKind::Info => style(message).cyan(),
            MessageKind::Warning => style(message).yellow(),
            MessageKind::Error => style(message).red(),
            MessageKind::ToolCall => style(message).magenta(),
            MessageKind::Response => style(message).green(),
        };
        println!("{}", styled);
    }
}

fn wrap(text: &str, width: usize) -> String {
    text.lines()
        .flat_map(|line| {
            let chars: Vec<char> = line.chars().collect();
            if chars.is_empty() {
                return vec![String::new()];
            }
            chars
                .chunks(width)
                .map(|chunk| chunk.iter().collect::<String>())
                .collect()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_messages() {
        let reporter = ConsoleReporter::default();
        assert_eq!(
            reporter.format(MessageKind::ToolCall, "Calling: fetch_crypto_news"),
            "[TOOL_CALL] Calling: fetch_crypto_news"
        );
    }

    #[test]
    fn wraps_long_lines_only() {
        let long = "x".repeat(85);
        assert_eq!(wrap(&long, 80), format!("{}\n{}", "x".repeat(80), "xxxxx"));
        assert_eq!(wrap("a\n\nb", 80), "a\n\nb");
    }
}
