//! Prompt loader for YAML prompt definitions.
//!
//! Prompts live in `<workspace>/.docqa/prompts/<id>.yml`. The answering
//! prompt has a built-in default so a fresh workspace works without files.

use crate::types::PromptDefinition;
use docqa_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the prompt used to answer questions.
pub const RAG_ANSWER_PROMPT_ID: &str = "rag.answer";

const DEFAULT_RAG_ANSWER: &str = include_str!("../prompts/rag.answer.yml");

/// Load a prompt definition by ID from a prompts directory.
///
/// # Arguments
/// * `prompts_dir` - Directory holding `<id>.yml` files
/// * `prompt_id` - Prompt identifier (e.g., "rag.answer")
///
/// # Example
/// ```no_run
/// use docqa_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".docqa/prompts"), "rag.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents)
        .map_err(|e| AppError::Prompt(format!("{:?}: {}", prompt_file, e)))?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// The built-in answering prompt.
pub fn default_prompt() -> AppResult<PromptDefinition> {
    parse_prompt(DEFAULT_RAG_ANSWER)
}

/// Load `prompt_id` from `prompts_dir` if an override exists, otherwise fall
/// back to the built-in definition.
pub fn resolve_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let override_file = prompts_dir.join(format!("{}.yml", prompt_id));
    if override_file.exists() {
        return load_prompt(prompts_dir, prompt_id);
    }

    if prompt_id == RAG_ANSWER_PROMPT_ID {
        tracing::debug!("Using built-in prompt: {}", prompt_id);
        return default_prompt();
    }

    Err(AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))
}

fn parse_prompt(contents: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML: {}", e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(format!("{}.yml", id)), body).unwrap();
    }

    fn valid_prompt(id: &str) -> String {
        format!(
            "id: {}\ntitle: \"Test Prompt\"\napiVersion: \"1.0\"\ntemplate: \"Q: {{{{question}}}}\"\n",
            id
        )
    }

    #[test]
    fn test_default_prompt_parses() {
        let prompt = default_prompt().unwrap();
        assert_eq!(prompt.id, RAG_ANSWER_PROMPT_ID);
        assert!(prompt.system.is_some());
        assert!(prompt.template.contains("{{question}}"));
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "test.prompt", &valid_prompt("test.prompt"));

        let prompt = load_prompt(temp_dir.path(), "test.prompt").unwrap();
        assert_eq!(prompt.id, "test.prompt");
        assert_eq!(prompt.title, "Test Prompt");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "invalid", "invalid: yaml: content:");

        assert!(load_prompt(temp_dir.path(), "invalid").is_err());
    }

    #[test]
    fn test_bad_api_version_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "v",
            "id: v\ntitle: V\napiVersion: \"1\"\ntemplate: x\n",
        );

        assert!(load_prompt(temp_dir.path(), "v").is_err());
    }

    #[test]
    fn test_resolve_prefers_override() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            RAG_ANSWER_PROMPT_ID,
            &valid_prompt(RAG_ANSWER_PROMPT_ID),
        );

        let prompt = resolve_prompt(temp_dir.path(), RAG_ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Test Prompt");
        assert!(prompt.system.is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = resolve_prompt(&temp_dir.path().join("missing"), RAG_ANSWER_PROMPT_ID)
            .unwrap();
        assert!(prompt.system.is_some());

        assert!(resolve_prompt(temp_dir.path(), "other.prompt").is_err());
    }
}
