//! Prompt Builder System
//!
//! System prompts are assembled with [`PromptBuilder`]; the chat message
//! lists for each call site come from [`PromptTemplates`].
//!
//! ## Call sites
//!
//! 1. **Batch summary**: one per batch in hierarchical mode (shared by all kinds)
//! 2. **Compose**: final document from ordered batch summaries
//! 3. **Direct**: whole aggregated source in a single call

use crate::ai::provider::ChatMessage;
use crate::types::{Batch, DocumentContext, DocumentKind};

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with audience
    Role { expertise: String, task: String },
    /// Bulleted requirements
    Requirements(Vec<String>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add a bulleted requirements list
    pub fn requirements(mut self, items: &[&str]) -> Self {
        self.sections.push(PromptSection::Requirements(
            items.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Add text section
    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str(&format!("You are a {} {}.\n\n", expertise, task));
                }
                PromptSection::Requirements(items) => {
                    for item in items {
                        prompt.push_str(&format!("- {}\n", item));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("{}:\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

const BATCH_SUMMARY_INSTRUCTIONS: &str = "Summarize this batch of files into a concise, structured Markdown suitable for API/architecture documentation. For each file: briefly list purpose, key functions/classes/routes, env vars, external deps, and notable pitfalls. Then provide a short batch-level summary. Use bullets.";

const HANDOVER_COMPOSE_INSTRUCTIONS: &str = "You will compose a full project handover document using the provided batch summaries. Do not invent APIs. Produce a single cohesive Markdown with sections: Overview, Architecture, API surface, Key modules, Config & Env, Dependencies, Operations, Risks, Testing, Onboarding Checklist. Where information is missing, add TODOs.";

const README_SECTIONS: &[&str] = &[
    "Title and short description",
    "Badges (optional)",
    "Table of Contents",
    "Features / Highlights",
    "Tech Stack",
    "Requirements",
    "Quickstart (Install, Env, Run, Test)",
    "Configuration (.env vars)",
    "API Endpoints (summary)",
    "Scripts/Commands",
    "Folder Structure (brief)",
    "Contributing (optional)",
    "License",
    "Acknowledgements",
];

/// Preset message lists for every completion call in a run
pub struct PromptTemplates;

impl PromptTemplates {
    /// Summarize one batch of units
    pub fn batch_summary(batch: &Batch) -> Vec<ChatMessage> {
        let material = batch
            .units()
            .iter()
            .map(|u| format!("---\nPath: {}\n\n{}", u.path, u.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        vec![
            ChatMessage::system(BATCH_SUMMARY_INSTRUCTIONS),
            ChatMessage::user(material),
        ]
    }

    /// Single-call prompt over the whole aggregated source
    pub fn direct(
        kind: DocumentKind,
        ctx: &DocumentContext,
        baseline: &str,
        source: &str,
    ) -> Vec<ChatMessage> {
        match kind {
            DocumentKind::Handover => Self::handover_direct(ctx, baseline, source),
            DocumentKind::Readme => Self::readme(ctx, baseline, "Source (may be truncated)", source),
        }
    }

    /// Final composition over ordered batch summaries
    pub fn compose(
        kind: DocumentKind,
        ctx: &DocumentContext,
        baseline: &str,
        summaries: &[String],
    ) -> Vec<ChatMessage> {
        match kind {
            DocumentKind::Handover => {
                let material = numbered_summaries(summaries, ":\n\n");
                vec![
                    ChatMessage::system(HANDOVER_COMPOSE_INSTRUCTIONS),
                    ChatMessage::user(format!("Project title: {}", ctx.title)),
                    ChatMessage::user(format!("Context: {}", ctx.context_or_default())),
                    ChatMessage::user(format!("Baseline (for reference):\n\n{}", baseline)),
                    ChatMessage::user(format!("Batch summaries:\n\n{}", material)),
                ]
            }
            DocumentKind::Readme => {
                let material = numbered_summaries(summaries, "\n\n");
                Self::readme(ctx, baseline, "Analysis", &material)
            }
        }
    }

    fn handover_direct(ctx: &DocumentContext, baseline: &str, source: &str) -> Vec<ChatMessage> {
        let system = PromptBuilder::new()
            .role(
                "senior software engineer",
                "documenting a codebase for a handoff to another developer",
            )
            .text("Write a comprehensive, structured, sectioned documentation in Markdown. Follow these requirements:")
            .requirements(&[
                "Overview of purpose and context (audience: new maintainers)",
                "Setup and environment (env vars, configs, secrets, prerequisites)",
                "Architecture and data flow (key modules, dependencies, how they interact)",
                "Explanation of each function/class/module (role, inputs/outputs, where used)",
                "API surface (routes/endpoints) and contracts",
                "Examples of usage for key functions/APIs",
                "Gotchas and pitfalls (edge cases, failure modes, invariants)",
                "Extension ideas and migration/upgrade considerations",
                "Testing guidance (fixtures, integration points, test strategies)",
                "Onboarding checklist",
            ])
            .text("Be thorough and write as if the reader has never seen the code. Use Markdown headings and code fences where appropriate. Do not invent APIs that do not exist in the inputs.")
            .build();

        let summary = [
            format!("Title: {}", ctx.title),
            format!("Owner: {}", ctx.owner_or_default()),
            format!("Repo: {}", ctx.repository_or_default()),
        ]
        .join("\n");

        vec![
            ChatMessage::system(system),
            ChatMessage::user(format!("Project summary\n{}", summary)),
            ChatMessage::user(format!(
                "Context (author-provided)\n{}",
                ctx.context_or_default()
            )),
            ChatMessage::user(format!("Baseline handover (local generator)\n\n{}", baseline)),
            ChatMessage::user(format!("Code (may be truncated)\n\n{}", source)),
        ]
    }

    fn readme(
        ctx: &DocumentContext,
        baseline: &str,
        material_header: &str,
        material: &str,
    ) -> Vec<ChatMessage> {
        let system = PromptBuilder::new()
            .role("senior engineer", "writing a modern, polished README.md with emoji and clear sections")
            .text("Use concise language, friendly tone, and professional formatting. Include shields.io badges if URLs are provided. Output the content directly without any markdown code fences or language indicators.")
            .build();

        let user = PromptBuilder::new()
            .text(&format!(
                "Project: {}\nRepo: {}\nOwner: {}",
                ctx.title,
                ctx.repository_or_default(),
                ctx.owner_or_default()
            ))
            .section("Context", ctx.context_or_default())
            .section("Baseline (for reference)", baseline)
            .section(material_header, material)
            .text("Expect sections:")
            .requirements(README_SECTIONS)
            .text("Use emoji tastefully (like 🚀, 🔧, 🧪, ⚙️, 📦, 📁).")
            .build();

        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }
}

fn numbered_summaries(summaries: &[String], separator: &str) -> String {
    summaries
        .iter()
        .enumerate()
        .map(|(i, s)| format!("Batch {} summary{}{}", i + 1, separator, s))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileUnit;

    fn ctx() -> DocumentContext {
        DocumentContext {
            title: "Mini API".into(),
            owner: Some("platform team".into()),
            repository: Some("https://github.com/o/r".into()),
            context: None,
        }
    }

    #[test]
    fn test_builder_sections() {
        let prompt = PromptBuilder::new()
            .role("technical writer", "documenting services")
            .requirements(&["One", "Two"])
            .section("Notes", "body")
            .build();

        assert!(prompt.starts_with("You are a technical writer documenting services."));
        assert!(prompt.contains("- One\n- Two"));
        assert!(prompt.ends_with("Notes:\nbody"));
    }

    #[test]
    fn test_batch_summary_material() {
        let mut batch = Batch::new();
        batch.push(FileUnit::new("src/a.js", "let a = 1;"));
        batch.push(FileUnit::new("src/b.js#part2", "let b;"));

        let messages = PromptTemplates::batch_summary(&batch);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(
            messages[1].content,
            "---\nPath: src/a.js\n\nlet a = 1;\n\n---\nPath: src/b.js#part2\n\nlet b;"
        );
    }

    #[test]
    fn test_handover_compose_orders_summaries() {
        let summaries = vec!["first".to_string(), "second".to_string()];
        let messages =
            PromptTemplates::compose(DocumentKind::Handover, &ctx(), "BASE", &summaries);

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[1].content, "Project title: Mini API");
        assert_eq!(messages[2].content, "Context: None");
        assert!(messages[3].content.ends_with("BASE"));
        assert_eq!(
            messages[4].content,
            "Batch summaries:\n\nBatch 1 summary:\n\nfirst\n\nBatch 2 summary:\n\nsecond"
        );
    }

    #[test]
    fn test_readme_compose_carries_baseline_and_analysis() {
        let messages = PromptTemplates::compose(
            DocumentKind::Readme,
            &ctx(),
            "BASE",
            &["only".to_string()],
        );

        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("README.md"));
        assert!(messages[1].content.contains("Analysis:\nBatch 1 summary\n\nonly"));
        assert!(messages[1].content.contains("- Quickstart (Install, Env, Run, Test)"));
        assert!(messages[1].content.contains("Baseline (for reference):\nBASE"));
        let baseline_at = messages[1].content.find("BASE").unwrap();
        let analysis_at = messages[1].content.find("Analysis:").unwrap();
        assert!(baseline_at < analysis_at);
    }

    #[test]
    fn test_direct_readme_carries_baseline_and_source() {
        let messages =
            PromptTemplates::direct(DocumentKind::Readme, &ctx(), "BASE", "// FILE: a\nx\n");

        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("Baseline (for reference):\nBASE"));
        assert!(messages[1].content.contains("Source (may be truncated):\n// FILE: a\nx"));
    }

    #[test]
    fn test_direct_handover_carries_code_and_baseline() {
        let messages =
            PromptTemplates::direct(DocumentKind::Handover, &ctx(), "BASE", "// FILE: a\nx\n");

        assert_eq!(messages.len(), 5);
        assert!(messages[0].content.contains("- Onboarding checklist"));
        assert!(messages[1].content.contains("Owner: platform team"));
        assert!(messages[3].content.ends_with("BASE"));
        assert!(messages[4].content.ends_with("// FILE: a\nx\n"));
    }
}
