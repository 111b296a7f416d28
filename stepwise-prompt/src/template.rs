use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use stepwise_core::StepwiseError;

fn placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder pattern is valid"))
}

/// A text template with `{{name}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of first appearance, without duplicates.
    pub fn input_variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in placeholder().captures_iter(&self.template) {
            let name = &caps[1];
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Fills every placeholder, failing on the first one missing from `vars`.
    pub fn format(&self, vars: &HashMap<String, String>) -> Result<String, StepwiseError> {
        if let Some(missing) = self
            .input_variables()
            .into_iter()
            .find(|name| !vars.contains_key(name))
        {
            return Err(StepwiseError::MissingPromptVariable(missing));
        }
        Ok(self.render(vars))
    }

    /// Fills placeholders, substituting an empty string for missing variables.
    pub fn render(&self, vars: &HashMap<String, String>) -> String {
        placeholder()
            .replace_all(&self.template, |caps: &regex::Captures| {
                vars.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned()
    }
}

impl From<&str> for PromptTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for PromptTemplate {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}
