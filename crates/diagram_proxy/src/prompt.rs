//! Fixed instructions sent with every diagram request.

use anthropic_api::{MessageParam, MessagesRequest};

pub const SYSTEM_PROMPT: &str = "You are a diagram generation expert specializing in Mermaid.js flowcharts.
Rules:
1. ONLY output valid Mermaid flowchart syntax
2. Start with EXACTLY ONE flowchart declaration (either 'flowchart LR' or 'flowchart TB')
3. Do not include any text like \"Here is the diagram:\" or \"mermaid\"
4. Do not include multiple flowchart declarations
5. Use proper arrow syntax (-->)
6. Ensure there are no spaces in node IDs
7. Use clear and concise labels
8. Double-check syntax before responding";

pub fn user_prompt(text: &str) -> String {
    format!(
        "Create a Mermaid flowchart diagram for: {text}.\n\
         Important: Only output the diagram code, no explanatory text. \
         Start with 'flowchart LR' or 'flowchart TB' and then directly list the nodes and connections."
    )
}

pub fn diagram_request(model: &str, max_tokens: u32, text: &str) -> MessagesRequest {
    MessagesRequest::new(model, vec![MessageParam::user(user_prompt(text))])
        .with_system(SYSTEM_PROMPT)
        .with_max_tokens(max_tokens)
}
