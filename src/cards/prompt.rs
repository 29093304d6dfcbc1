//! Fixed instruction prompt for agent card synthesis
//!
//! The raw single-agent manifest payload is appended to this constant before
//! the generation call.

pub const AGENT_CARD_PROMPT: &str = r#"# Objective
Extract all MCP agents from the provided manifest and transform them into the
Nexagen standard agent card format. Return the result as a JSON array.

# Input Format
The input JSON maps an agent identifier to its raw entry. Each entry contains
tools, and each tool has a name, description, and input schema.

# Output Format
The output should be a JSON array where each object represents an agent card
in the Nexagen standard format. Each agent card must include the following
fields:
- `name`: Name of the agent.
- `description`: General description of the agent's purpose.
- `url`: Leave this empty or set a default placeholder (e.g., "http://localhost:0000/").
- `version`: Default to "1.0.0".
- `capabilities`: Set default values (streaming, pushNotifications, stateTransitionHistory).
- `defaultInputModes`: Default to ["text", "text/plain"].
- `defaultOutputModes`: Default to ["text", "text/plain"].
- `skills`: A list of skills where each tool corresponds to a skill with:
  - `id`: Tool name.
  - `name`: Tool name.
  - `description`: Tool description.
  - `tags`: Default to an empty array or derive from the tool name.
  - `examples`: Default to an empty array.
**Do not return anything other than JSON.**

# Example Output
```json
[
  {
    "name": "Chart Agent",
    "description": "Handles chart-related operations",
    "url": "http://localhost:0000/",
    "version": "1.0.0",
    "capabilities": {
      "streaming": false,
      "pushNotifications": false,
      "stateTransitionHistory": false
    },
    "defaultInputModes": ["text", "text/plain"],
    "defaultOutputModes": ["text", "text/plain"],
    "skills": [
      {
        "id": "draw_chart",
        "name": "draw_chart",
        "description": "Generates a chart based on input data array and returns the file path",
        "tags": ["chart", "draw"],
        "examples": []
      }
    ]
  }
]
```

# Instructions
Parse the manifest to identify each tool under every agent. For each agent,
create an agent card object with the specified fields and map each tool to a
skill. Use placeholders for fields not directly available in the MCP format.
Ensure the output JSON is correctly formatted and assume default values for
unspecified fields.

# Manifest content
"#;
