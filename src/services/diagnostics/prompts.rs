//! Prompt templates used for diagnostics

/// System prompt for the tool-calling conversation
pub const SYSTEM_PROMPT: &str = "You are an SRE diagnostics agent. You investigate a misbehaving \
service by calling the available tools: fetch pod logs, describe the resource, list recent \
events, create a tracking issue, and post a Slack notification. Call tools only when you need \
more evidence, keep tool arguments minimal, and finish with a concise diagnosis summary. \
Create at most one issue and post at most one Slack message per investigation.";

/// Parameters for the diagnose prompt
pub struct PromptParams<'a> {
    pub service: &'a str,
    pub namespace: Option<&'a str>,
    pub project_root: &'a str,
    pub repo: &'a str,
    pub owner: &'a str,
    pub slack_channel: &'a str,
}

/// Build the user-facing diagnose prompt for a run
pub fn diagnose_prompt(params: &PromptParams<'_>) -> String {
    let namespace_instruction = params
        .namespace
        .map(|ns| format!(" in the `{ns}` namespace"))
        .unwrap_or_default();

    format!(
        "I have an error with my application, can you check the logs for the\n\
{service} service{namespace_instruction}, I only want you to check the pods logs, look up only the 1000\n\
most recent logs. Feel free to scroll up until you find relevant errors that\n\
contain reference to a file.\n\
\n\
Once you have these errors and the file name, get the file contents of the path\n\
{project_root} for the repository\n\
{repo} in the organisation\n\
{owner}. Keep listing the directories until you find the file name and then get\n\
the contents of the file.\n\
\n\
Please use the file contents to diagnose the error, then please create an issue in\n\
GitHub reporting a fix for the issue. Once you have diagnosed the error and created an\n\
issue please report this to the following Slack channel: {slack_channel}.\n\
\n\
Please only do this ONCE, don't keep making issues or sending messages to Slack.",
        service = params.service,
        namespace_instruction = namespace_instruction,
        project_root = params.project_root,
        repo = params.repo,
        owner = params.owner,
        slack_channel = params.slack_channel,
    )
}
