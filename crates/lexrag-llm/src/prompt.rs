//! Prompt construction for answering a question from retrieved context.

use std::fmt::Write;

use crate::provider::Message;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You answer questions using only the numbered context \
     passages supplied with the question. If the passages do not contain the answer, say so \
     plainly instead of guessing.";

/// Build the chat messages for a question grounded in `context`.
///
/// Produces a system message followed by one user message that lists each
/// context passage as a numbered block and ends with the question.
#[must_use]
pub fn grounded_messages<S: AsRef<str>>(
    system_prompt: &str,
    query: &str,
    context: &[S],
) -> Vec<Message> {
    let mut user = String::new();
    if context.is_empty() {
        user.push_str("No context passages were found.\n\n");
    } else {
        user.push_str("Context:\n");
        for (i, passage) in context.iter().enumerate() {
            let _ = writeln!(user, "[{}] {}", i + 1, passage.as_ref().trim());
        }
        user.push('\n');
    }
    let _ = write!(user, "Question: {}", query.trim());

    vec![Message::system(system_prompt), Message::user(user)]
}
