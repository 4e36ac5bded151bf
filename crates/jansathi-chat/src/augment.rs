//! Prompt augmentation: merge retrieved context into the outgoing message.

/// Build the final outgoing message for a turn.
///
/// With context, the query is wrapped in an instruction to prefer and cite
/// the supplied passages and fall back to live search only when they are
/// insufficient. Without context the query passes through unchanged.
pub fn augment_prompt(query: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!(
            "Use the following context from the official Ministry knowledge base to answer the user's question. \
             If the answer is in the context, cite it. If not, use web search.\n\n\
             **RETRIEVED CONTEXT:**\n{}\n\n\
             **USER QUESTION:**\n{}",
            context, query
        ),
        None => query.to_string(),
    }
}
