use crate::models::Candidate;

/// Returned instead of an empty string so downstream prompts stay well-formed.
pub const NO_CONTEXT_SENTINEL: &str = "No job context available for analysis.";

pub const TRUNCATION_MARKER: &str = "\n\n... (Context Truncated) ...";

const BLOCK_DELIMITER: &str = "\n\n---\n\n";

/// Renders candidates into one text block for a generative prompt, in
/// input order. When the rendered result exceeds `max_chars` it is cut to
/// exactly `max_chars` characters and the truncation marker is appended;
/// no re-rendering with fewer candidates.
pub fn assemble_context(candidates: &[Candidate], max_chars: usize) -> String {
    if candidates.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }

    let blocks: Vec<String> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| render_block(index, candidate))
        .collect();
    let mut context = blocks.join(BLOCK_DELIMITER);

    if context.chars().count() > max_chars {
        context = context.chars().take(max_chars).collect();
        context.push_str(TRUNCATION_MARKER);
    }

    context
}

fn render_block(index: usize, candidate: &Candidate) -> String {
    format!(
        "Job {}:\nTitle: {}\nCompany: {}\nLocation: {}\nURL: {}\nDescription: {}",
        index + 1,
        candidate.metadata.title.as_deref().unwrap_or("N/A"),
        candidate.metadata.organization.as_deref().unwrap_or("N/A"),
        candidate.metadata.location.as_deref().unwrap_or("N/A"),
        candidate.id,
        candidate
            .document
            .as_deref()
            .unwrap_or("No description available."),
    )
}
