//! Prompt text for the rewrite call.

pub(crate) const SYSTEM_PROMPT: &str = "You rewrite image search requests into short visual descriptions. \
Remove conversational framing such as \"show me\", \"find images of\", \"I want a picture of\". \
Use only words that appear in the request. Do not add objects, colors, styles or places. \
Reply with the description only, on a single line, without quotes or explanations.";

/// Build the user prompt for one query.
pub(crate) fn build_prompt(raw_query: &str) -> String {
    let mut s = String::new();
    s.push_str("Request: ");
    s.push_str(raw_query);
    s.push_str("\nDescription:");
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_query() {
        let p = build_prompt("show me a red car");
        assert!(p.starts_with("Request: show me a red car\n"));
        assert!(p.ends_with("Description:"));
    }
}
