//! Prompt builder for rendering templates with retrieved context.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptInput};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;

/// Build a prompt from a definition and the answering inputs.
///
/// The template is rendered with `question`, `context`, `hasContext` and
/// `history` in scope. The definition's `system` text is passed through
/// unchanged.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{build_prompt, default_prompt, PromptInput};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = default_prompt()?;
/// let built = build_prompt(&def, &PromptInput::new("What is Rust?", vec![], vec![]))?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(definition: &PromptDefinition, input: &PromptInput) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        prompt = %definition.id,
        context_blocks = input.context.len(),
        history_turns = input.history.len(),
        "Building prompt"
    );

    let user = render_template(&definition.template, input)?;

    Ok(BuiltPrompt {
        system: definition.system.clone(),
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            context_blocks: input.context.len(),
            history_turns: input.history.len(),
        },
    })
}

/// Render a Handlebars template with the prompt input.
fn render_template(template: &str, input: &PromptInput) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", input)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
