//! Token substitution
//!
//! All tokens are compiled into one alternation and the template is scanned
//! once, left to right. Replacement values are never rescanned, so a value
//! that happens to contain another token is emitted verbatim.

use crate::replacement::*;
use crate::types::*;
use regex::{Captures, RegexBuilder};
use std::collections::HashMap;

/// Upper bound for the compiled alternation
const PATTERN_SIZE_LIMIT: usize = 64 * (1 << 20);

/// Resolve `template` with the default substitution options
pub fn resolve(template: &str, replacements: &ReplacementSet) -> Result<String> {
    resolve_with(template, replacements, &SubstitutionOptions::default())
}

/// Resolve every token occurrence in `template` in a single pass.
///
/// Tokens are matched as literal text. When several tokens could match at
/// the same position the one registered first wins. Tokens that do not occur
/// in the template are ignored.
pub fn resolve_with(
    template: &str,
    replacements: &ReplacementSet,
    options: &SubstitutionOptions,
) -> Result<String> {
    if replacements.is_empty() {
        return Ok(template.to_string());
    }

    let mut lookup: HashMap<&str, &ReplacementValue> = HashMap::with_capacity(replacements.len());
    let mut alternatives = Vec::with_capacity(replacements.len());
    for (index, replacement) in replacements.iter().enumerate() {
        if replacement.token.is_empty() {
            return Err(TemplateError::MalformedReplacement {
                index,
                reason: "token is empty".to_string(),
            });
        }
        alternatives.push(regex::escape(&replacement.token));
        lookup.insert(replacement.token.as_str(), &replacement.value);
    }

    let pattern = RegexBuilder::new(&alternatives.join("|"))
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()?;

    let mut occurrences = 0usize;
    let resolved = pattern.replace_all(template, |caps: &Captures| {
        let token = &caps[0];
        occurrences += 1;
        match lookup.get(token) {
            Some(value) => render_value(token, value, options),
            None => token.to_string(),
        }
    });

    log::debug!(
        "Resolved {} occurrence(s) of {} token(s)",
        occurrences,
        replacements.len()
    );

    Ok(resolved.into_owned())
}

fn render_value(token: &str, value: &ReplacementValue, options: &SubstitutionOptions) -> String {
    match value {
        ReplacementValue::Image(src) => {
            let size = options.image_box_for(token);
            format!(
                r#"<img src="{}" style="width: {}px; height: {}px;" />"#,
                src.replace('"', "&quot;"),
                size.width_px,
                size.height_px
            )
        }
        // Blank values become a single space, never nothing
        ReplacementValue::NotFound => " ".to_string(),
        ReplacementValue::Text(text) if text.is_empty() => " ".to_string(),
        ReplacementValue::Text(text) => text.clone(),
    }
}
