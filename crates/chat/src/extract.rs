//! Fenced YAML block extraction from model replies.

const FENCE: &str = "```";

/// The first fenced block tagged `yaml` or `yml`, else the first untagged
/// fenced block. Content between the fence lines is returned verbatim.
/// Blocks without a closing fence are ignored.
pub fn extract_yaml(reply: &str) -> Option<String> {
    let blocks = fenced_blocks(reply);

    blocks
        .iter()
        .find(|(tag, _)| tag == "yaml" || tag == "yml")
        .or_else(|| blocks.iter().find(|(tag, _)| tag.is_empty()))
        .map(|(_, body)| body.clone())
}

/// `(lowercased tag, body)` for every closed fenced block.
fn fenced_blocks(text: &str) -> Vec<(String, String)> {
    let mut blocks = Vec::new();
    let mut open: Option<(String, Vec<&str>)> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        match open.take() {
            None => {
                if let Some(tag) = trimmed.strip_prefix(FENCE) {
                    open = Some((tag.trim().to_ascii_lowercase(), Vec::new()));
                }
            }
            Some((tag, body)) if trimmed.trim_end() == FENCE => {
                blocks.push((tag, body.join("\n")));
            }
            Some((tag, mut body)) => {
                body.push(line);
                open = Some((tag, body));
            }
        }
    }

    blocks
}
