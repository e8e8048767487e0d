//! The single-turn description prompt.

/// Instruction sent with every image: describe it, in Spanish.
pub const BASE_INSTRUCTION: &str = "Describe lo que ves en la imagen en español.";

/// Separator placed between the instruction and the user's own text.
pub const CONTEXT_SEPARATOR: &str = "\n\nContexto adicional proporcionado por el usuario:\n";

/// Builds the prompt text for one request.
///
/// The user's context is appended only when it is present and non-empty.
#[must_use]
pub fn build_prompt(context: Option<&str>) -> String {
    match context {
        Some(text) if !text.is_empty() => {
            format!("{BASE_INSTRUCTION}{CONTEXT_SEPARATOR}{text}")
        }
        _ => BASE_INSTRUCTION.to_owned(),
    }
}
