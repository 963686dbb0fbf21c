//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};

use crate::domain::{Suggestions, VersionToken};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_error, display_error_chain, display_outcome, display_plan, display_status,
    display_success,
};

/// Accepted spellings, shown whenever input is rejected
pub const VERSION_FORMAT_HINT: &str = "Version formats: 2, v2, 2.0, v2.0, 2.1, v2.1";

/// Choices offered by [prompt_version], in display order.
///
/// The last entry opens free-form input.
pub fn suggestion_items(suggestions: &Suggestions) -> Vec<String> {
    vec![
        format!("{}  next major release", suggestions.next_major),
        format!("{}  next minor release", suggestions.next_minor),
        "Enter a version".to_string(),
    ]
}

/// Preselected entry of [suggestion_items].
///
/// Next minor, unless nothing has been released yet: `v0.1` would need a
/// `release/v0` branch that no release created.
pub fn default_selection(suggestions: &Suggestions) -> usize {
    if suggestions.latest == VersionToken::default() {
        0
    } else {
        1
    }
}

/// Interprets a line typed by the operator.
///
/// Surrounding whitespace is ignored. Blank input yields `Ok(None)` so the
/// caller can ask again.
pub fn parse_version_input(input: &str) -> crate::Result<Option<VersionToken>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    VersionToken::parse(trimmed).map(Some)
}

/// Asks the operator which version to publish.
///
/// Offers the next major and next minor version as choices, plus free
/// entry that is validated as it is typed.
pub fn prompt_version(suggestions: &Suggestions) -> Result<VersionToken> {
    let theme = ColorfulTheme::default();

    println!("{}", formatter::format_latest_hint(suggestions));
    println!("{}", VERSION_FORMAT_HINT);

    let items = suggestion_items(suggestions);
    let selection = Select::with_theme(&theme)
        .with_prompt("Version to publish")
        .items(&items)
        .default(default_selection(suggestions))
        .interact()?;

    match selection {
        0 => return Ok(suggestions.next_major),
        1 => return Ok(suggestions.next_minor),
        _ => {}
    }

    loop {
        let input: String = Input::with_theme(&theme)
            .with_prompt("Version")
            .allow_empty(true)
            .validate_with(|input: &String| -> std::result::Result<(), String> {
                parse_version_input(input)
                    .map(|_| ())
                    .map_err(|_| VERSION_FORMAT_HINT.to_string())
            })
            .interact_text()?;

        if let Some(version) = parse_version_input(&input)? {
            return Ok(version);
        }
        println!("{}", VERSION_FORMAT_HINT);
    }
}
