use std::collections::HashMap;

use crate::config::WorkflowConfig;
use crate::workflow::state::ErrorCategory;

/// Substitute `{name}` placeholders in a single pass.
///
/// Values are inserted verbatim, so source code containing braces or text
/// that looks like a placeholder is never expanded a second time. Unknown
/// placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Repair instructions keyed by failure category.
///
/// The default category always has a template, and any code without its own
/// template is repaired with that one.
#[derive(Debug, Clone)]
pub struct RepairTemplates {
    default: ErrorCategory,
    fallback: String,
    templates: HashMap<ErrorCategory, String>,
}

impl RepairTemplates {
    pub fn new(default: ErrorCategory, template: impl Into<String>) -> Self {
        Self {
            default,
            fallback: template.into(),
            templates: HashMap::new(),
        }
    }

    pub fn register(mut self, category: ErrorCategory, template: impl Into<String>) -> Self {
        if category == self.default {
            self.fallback = template.into();
        } else {
            self.templates.insert(category, template.into());
        }
        self
    }

    /// Pick the template for a validation code.
    pub fn select(&self, code: i32) -> (ErrorCategory, &str) {
        if let Some(category) = ErrorCategory::from_code(code) {
            if category == self.default {
                return (category, &self.fallback);
            }
            if let Some(template) = self.templates.get(&category) {
                return (category, template);
            }
        }

        tracing::warn!(
            code,
            fallback = %self.default,
            "No repair template for validation code, using fallback"
        );
        (self.default, &self.fallback)
    }
}

/// Everything the stages send to the model, parameterized over the
/// language pair.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub source_language: String,
    pub target_language: String,
    pub fence_tag: String,
    pub summary_system: String,
    pub summary_user: String,
    pub planning_system: String,
    pub planning_user: String,
    pub transpile_system: String,
    pub transpile_user: String,
    pub repair: RepairTemplates,
}

impl PromptSet {
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            fence_tag: config.fence_tag.clone(),
            summary_system: SUMMARY_SYSTEM.to_string(),
            summary_user: SUMMARY_USER.to_string(),
            planning_system: PLANNING_SYSTEM.to_string(),
            planning_user: PLANNING_USER.to_string(),
            transpile_system: TRANSPILE_SYSTEM.to_string(),
            transpile_user: TRANSPILE_USER.to_string(),
            repair: RepairTemplates::new(ErrorCategory::Compile, COMPILE_ERROR_REPAIR),
        }
    }

    /// Render a template with the language placeholders filled in
    /// alongside `vars`.
    pub fn fill(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let mut all = vec![
            ("source_language", self.source_language.as_str()),
            ("target_language", self.target_language.as_str()),
            ("fence_tag", self.fence_tag.as_str()),
        ];
        all.extend_from_slice(vars);
        render(template, &all)
    }

    /// Repair request: the category's instructions followed by the failing
    /// candidate in a tagged fence.
    pub fn repair_request(
        &self,
        code: i32,
        trace: &str,
        candidate: &str,
    ) -> (ErrorCategory, String) {
        let (category, template) = self.repair.select(code);
        let instructions = self.fill(template, &[("trace", trace)]);
        let message = format!(
            "{instructions}\n\n```{tag}\n{candidate}\n```",
            tag = self.fence_tag
        );
        (category, message)
    }
}

const SUMMARY_SYSTEM: &str = r#"You are a senior software architect acting as a **code explainer**.
Summarise the supplied {source_language} source file with enough depth that another engineer can grasp intent, structure, and quirks in one read.

## Output format (markdown, no code fences)
1. **Overview** - at most 80 words on the file's main responsibility, domain, and interaction with other modules.
2. **Component breakdown** - bullets in source order:
   - `Class <Name>` - one-line role, with sub-bullets for notable methods.
   - `<function_name>(...)` - one-line purpose.
   - `CONST_NAME` - purpose, if non-trivial.
3. **Noteworthy details** - optional bullets for patterns, performance tricks, external resources, side-effects.

## Rules
- Produce only the sections above. No greetings, extra prose, or code blocks.
- Keep each bullet under 20 words and omit trivial getters, setters, and boilerplate.
- Use exact identifiers from the code."#;

const SUMMARY_USER: &str = "Provided below is the source code:\n{source_code}";

const PLANNING_SYSTEM: &str = r#"You are a senior polyglot engineer acting as a **migration architect**.
Produce a practical, step-by-step roadmap for converting the supplied {source_language} code to idiomatic {target_language}.

## Input
- A technical summary of the {source_language} code.
- The original {source_language} source.

## Output format (markdown, no code fences)
1. **Objective** - at most 50 words on what the migration achieves.
2. **Roadmap** - numbered phases with indented tasks: construct mapping, library mapping, manual refinements, verification.
3. **Risks** - 3 to 5 rows of `Risk | Impact | Mitigation`.
4. **Success criteria** - bullet list.

## Rules
- Provide only the sections above.
- Keep each bullet under 18 words and use exact identifiers.
- Focus on actionable steps and their order."#;

const PLANNING_USER: &str = "Provided below is the technical summary of the {source_language} code:\n{summary}\n\n===========\nProvided below is the original {source_language} code:\n{source_code}";

const TRANSPILE_SYSTEM: &str = r#"You are a senior polyglot software engineer who specialises in code translation.
Translate the supplied {source_language} source into **functionally identical, idiomatic, production-ready {target_language}**.

## Output rules
1. Return only the translated code in a single fenced block tagged `{fence_tag}`. No narrative outside the block.
2. The code must compile without errors.

## Guidelines
- Preserve behaviour exactly: logic, data flow, side-effects, and error semantics.
- Replace {source_language} library calls with the nearest {target_language} standard-library equivalents.
- Follow the naming and documentation conventions of {target_language}.
- Map classes, fields, static members, generics, and constructors to their closest {target_language} constructs.
- Translate exceptions to the closest built-in error types, defining custom ones only when required.
- Drop artefacts that have no meaning in {target_language}.

## Plan
The user will provide a step-by-step plan for this translation. Follow it before producing the final code."#;

const TRANSPILE_USER: &str = "Following the step by step plan:\n{plan}\n\n=========\nFollowing is the {source_language} code to be translated:\n{source_code}";

const COMPILE_ERROR_REPAIR: &str = r#"The {target_language} code you produced from {source_language} failed to compile.

## Error output
{trace}

## Task
Deliver a functionally identical {target_language} replacement that compiles cleanly.

## Output rules
1. Return only the fixed code inside one fenced block tagged `{fence_tag}`. No commentary.
2. Fix every reported issue in one pass, adjusting imports, indentation, scopes, or data structures as needed.
3. Preserve all behaviour and public API of the original {source_language} logic.

Fix the code below:"#;
