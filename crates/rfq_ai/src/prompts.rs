use std::collections::BTreeSet;

use rfq_core::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// Text with `{name}` slots. `{{` and `}}` render as literal braces.
///
/// Slots and declared variables must agree exactly; this is checked once at
/// construction so rendering can only fail on a missing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn new(template: &str, variables: &[&str]) -> Result<Self, AppError> {
        let segments = parse(template)?;

        let declared: BTreeSet<&str> = variables.iter().copied().collect();
        let used: BTreeSet<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Slot(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect();

        if let Some(name) = used.difference(&declared).next() {
            return Err(
                AppError::new("AI_PROMPT_INVALID", "Prompt template uses an undeclared slot")
                    .with_details(format!("slot={name}")),
            );
        }
        if let Some(name) = declared.difference(&used).next() {
            return Err(AppError::new(
                "AI_PROMPT_INVALID",
                "Prompt template declares a variable without a slot",
            )
            .with_details(format!("variable={name}")));
        }

        Ok(Self {
            template: template.to_string(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
            segments,
        })
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Substitute every slot in one pass. Values are inserted as-is and never
    /// scanned for further slots.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, AppError> {
        for var in &self.variables {
            if !values.iter().any(|(k, _)| k == var) {
                return Err(AppError::new(
                    "AI_PROMPT_RENDER_FAILED",
                    "Missing value for prompt variable",
                )
                .with_details(format!("variable={var}")));
            }
        }

        let mut out = String::with_capacity(self.template.len());
        for seg in &self.segments {
            match seg {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(name) => {
                    if let Some((_, v)) = values.iter().find(|(k, _)| k == name) {
                        out.push_str(v);
                    }
                }
            }
        }
        Ok(out)
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, AppError> {
    let invalid = |msg: &str, at: usize| {
        AppError::new("AI_PROMPT_INVALID", msg.to_string()).with_details(format!("offset={at}"))
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, n) in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(invalid("Unclosed slot in prompt template", i));
                }
                let valid = !name.is_empty()
                    && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
                if !valid {
                    return Err(invalid("Invalid slot name in prompt template", i));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Slot(name));
            }
            '}' => return Err(invalid("Unmatched closing brace in prompt template", i)),
            _ => literal.push(c),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

pub const RFP_PROMPT_TEMPLATE: &str = r#"
You are an expert RFP and tender document analyst for Think Tank Software Solutions.
Your primary goal is to provide clear, concise, and professionally formatted answers using Markdown.

---
**EXAMPLE**

**CONTEXT:**
The deadline for all proposal submissions is May 1st, 2024 at 5:00 PM. The solution must support at least 50 concurrent users. Bidders must have a Level 2 B-BBEE certification.

**QUESTION:**
What are the key requirements and deadlines?

**ANALYST'S RESPONSE:**
### **Key Requirements & Deadlines**

Based on the provided documents, here are the critical details:

*   **Submission Deadline:** The final proposal must be submitted no later than **May 1st, 2024 at 5:00 PM**.
*   **User Scale:** The proposed solution is required to support a minimum of **50 concurrent users**.
*   **Compliance:** A valid **Level 2 B-BBEE certification** is a mandatory requirement for all bidders.
---

**YOUR TASK**

**CONTEXT:**
{context}

**QUESTION:** {question}

**ANALYST'S RESPONSE (Use Markdown formatting similar to the example):**
"#;

/// The RFP analyst template with `context` and `question` slots.
pub fn rfp_prompt() -> Result<PromptTemplate, AppError> {
    PromptTemplate::new(RFP_PROMPT_TEMPLATE, &["context", "question"])
}
