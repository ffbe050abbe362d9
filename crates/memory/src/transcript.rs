use cp_domain::tool::{Message, Role};

/// Render a conversation as role-tagged lines, keeping the most recent
/// `max_chars` characters. Error markers are left out.
pub fn render_transcript(messages: &[Message], max_chars: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    for msg in messages {
        if msg.error_message().is_some() {
            continue;
        }
        let line = match msg.role {
            Role::Tool => match msg.tool_result_part() {
                Some((_, name, content, _)) => format!("tool ({name}): {content}"),
                None => continue,
            },
            Role::Assistant => {
                let mut text = msg.content.extract_all_text();
                for call in msg.tool_calls() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&format!("[called {} with {}]", call.tool_name, call.arguments));
                }
                format!("assistant: {text}")
            }
            role => format!("{}: {}", role.as_str(), msg.content.extract_all_text()),
        };
        lines.push(line);
    }

    let full = lines.join("\n");
    if full.chars().count() <= max_chars {
        return full;
    }
    let skip = full.chars().count() - max_chars;
    full.chars().skip(skip).collect()
}
