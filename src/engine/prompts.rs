//! Prompt templates sent to the model for each capability.

use serde_json::{Map, Value};

pub(crate) fn image(prompt: &str) -> String {
    format!("Create a professional, high-quality image: {prompt}")
}

pub(crate) fn research(query: &str, context: Option<&str>) -> String {
    let context = context
        .map(|c| format!("Context: {c}\n\n"))
        .unwrap_or_default();
    format!(
        "{context}Research query: {query}\n\nProvide comprehensive, accurate information with sources."
    )
}

pub(crate) fn code(code: &str, language: &str, context: Option<&str>) -> String {
    let context = context
        .map(|c| format!("Context: {c}\n\n"))
        .unwrap_or_default();
    format!(
        "{context}Execute the following {language} code and provide detailed analysis:

```{language}
{code}
```

Please provide:
1. Code execution results
2. Performance analysis
3. Optimization suggestions
4. Error handling notes (if any)
"
    )
}

pub(crate) fn browser(task: &str, url: Option<&str>) -> String {
    let target = url.map(|u| format!("Target URL: {u}")).unwrap_or_default();
    format!(
        "
Task: {task}
{target}

Execute this web automation task using browser control capabilities.
Provide step-by-step actions taken and results achieved.
"
    )
}

pub(crate) fn live(interaction_type: &str, data: &Map<String, Value>) -> String {
    let data = serde_json::to_string_pretty(data).unwrap_or_default();
    format!(
        "
Handle real-time {interaction_type} interaction:

Data: {data}

Provide immediate response and processing for this live interaction.
"
    )
}

pub(crate) fn workflow(description: &str, tasks: &[Map<String, Value>]) -> String {
    let tasks = serde_json::to_string_pretty(tasks).unwrap_or_default();
    format!(
        "
Execute the following multi-task workflow:

Workflow: {description}

Tasks to execute:
{tasks}

Coordinate all necessary AI capabilities to complete this workflow efficiently.
Provide progress updates and final results.
"
    )
}
