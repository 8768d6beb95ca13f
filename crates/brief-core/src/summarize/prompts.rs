const SINGLE_TEMPLATE: &str = r#"
Write a comprehensive summary of the following text. The summary should:
1. Highlight the main points and key ideas
2. Include important details and supporting evidence
3. Maintain the original meaning and intent
4. Be well-structured and coherent

Text to summarize:
{text}

Comprehensive Summary:
"#;

const MAP_TEMPLATE: &str = r#"
Write a concise summary of the following text, focusing on the key points:
{text}

Concise Summary:
"#;

const COMBINE_TEMPLATE: &str = r#"
You are provided with multiple summaries from different sections of a document or article.
Your task is to create a comprehensive, well-structured final summary that:
1. Integrates all the important information from the individual summaries
2. Presents a coherent overview of the entire content
3. Organizes the information logically with appropriate headings and structure
4. Eliminates redundancy while preserving important details

Individual summaries:
{text}

Comprehensive Final Summary:
"#;

const QUESTION_TEMPLATE: &str =
    "Given the following summary:\n\n{summary}\n\nAnswer the user's question:\n{question}\n\nAnswer:";

/// Separator used when joining partial summaries for the combine step.
pub const PARTIAL_SEPARATOR: &str = "\n\n";

pub fn single_prompt(text: &str) -> String {
    SINGLE_TEMPLATE.replace("{text}", text)
}

pub fn map_prompt(chunk: &str) -> String {
    MAP_TEMPLATE.replace("{text}", chunk)
}

pub fn combine_prompt(partials: &str) -> String {
    COMBINE_TEMPLATE.replace("{text}", partials)
}

pub fn question_prompt(summary: &str, question: &str) -> String {
    // Substitute the question first so braces inside the summary stay literal.
    QUESTION_TEMPLATE
        .replace("{question}", question)
        .replacen("{summary}", summary, 1)
}
