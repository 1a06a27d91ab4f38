use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A role-tagged prompt fragment sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }
}

const ASSISTANT_PREAMBLE: &str = "You are a helpful research assistant.";

const SUMMARY_PREAMBLE: &str = "You are a helpful research assistant. \
You help the user with paper reading, summarizing, and review.";

/// Messages asking the model which candidate lines are section titles.
///
/// The expected answer is `{"titles": [...]}`, numbering retained.
pub fn title_identification_messages<S: AsRef<str>>(candidates: &[S]) -> Vec<Message> {
    let texts: Vec<&str> = candidates.iter().map(AsRef::as_ref).collect();
    let list = serde_json::to_string(&texts).unwrap_or_else(|_| "[]".to_string());

    let instruction = format!(
        "You will be given several texts and your task is to identify which of them \
are section titles of a research paper. If a title includes a number, it must be retained. \
Your output should be in JSON format and include a list of the identified section titles. \
Your output format:\n\n\
{{\n\"titles\": [\"section title text\", \"section title text\", ...]\n}}\n\n\
Here are the texts: {}",
        list
    );

    vec![Message::system(ASSISTANT_PREAMBLE), Message::user(instruction)]
}

/// Messages asking for a short summary of one section (or chunk of one).
pub fn section_summarization_messages(
    key_points: &str,
    section_title: &str,
    section_text: &str,
) -> Vec<Message> {
    let instruction = format!(
        "I will provide you with a reseach paper on a specific topic and you will create a \
summary of the whole paper part by part. Your summary should be concise and accurately \
reflect the content of the original paper. For each section, the summary should be no \
longer than 5 sentences. Your summary should focus on the following key points if the \
paper has mentioned relevant information about them:\n\
{}\n\
The contents of section {} are as follows.\n\
{}",
        key_points, section_title, section_text
    );

    vec![Message::system(SUMMARY_PREAMBLE), Message::user(instruction)]
}

/// Render key points as a numbered list, one per line, each trimmed.
pub fn format_key_points<S: AsRef<str>>(key_points: &[S]) -> String {
    key_points
        .iter()
        .enumerate()
        .map(|(i, point)| format!("{}. {}", i + 1, point.as_ref().trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
