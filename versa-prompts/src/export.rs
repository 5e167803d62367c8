//! Plain-text export of active prompts

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use versa_core::prompt::PromptRecord;

const RULE_WIDTH: usize = 80;

/// Active prompts grouped by agent type, then prompt name
pub struct Export<'a> {
    records: &'a [PromptRecord],
    generated_at: DateTime<Utc>,
}

impl<'a> Export<'a> {
    pub fn new(records: &'a [PromptRecord], generated_at: DateTime<Utc>) -> Self {
        Self {
            records,
            generated_at,
        }
    }
}

impl fmt::Display for Export<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let hash = "#".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        let mut by_agent: BTreeMap<&str, Vec<&PromptRecord>> = BTreeMap::new();
        for record in self.records {
            by_agent
                .entry(record.agent_type.as_str())
                .or_default()
                .push(record);
        }

        writeln!(f, "{}", heavy)?;
        writeln!(f, "PROMPT EXPORT")?;
        writeln!(
            f,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "Total prompts: {}", self.records.len())?;
        writeln!(f, "{}", heavy)?;

        for (agent_type, mut prompts) in by_agent {
            prompts.sort_by(|a, b| a.prompt_name.cmp(&b.prompt_name));

            writeln!(f)?;
            writeln!(f, "{}", hash)?;
            writeln!(f, "# AGENT: {}", agent_type.to_uppercase())?;
            writeln!(f, "{}", hash)?;

            for record in prompts {
                writeln!(f)?;
                writeln!(f, "{}", light)?;
                writeln!(
                    f,
                    "Prompt: {} (v{}, used {} times)",
                    record.prompt_name, record.version, record.usage_count
                )?;
                if let Some(description) = &record.description {
                    writeln!(f, "Description: {}", description)?;
                }
                if !record.variables.is_empty() {
                    writeln!(f, "Variables: {}", record.variables.join(", "))?;
                }
                writeln!(f, "{}", light)?;
                writeln!(f, "{}", record.content)?;
            }
        }

        Ok(())
    }
}

/// Render active prompts as plain text
pub fn render_export(records: &[PromptRecord], generated_at: DateTime<Utc>) -> String {
    Export::new(records, generated_at).to_string()
}
