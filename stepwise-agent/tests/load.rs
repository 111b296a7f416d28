mod support;

use std::sync::Arc;

use serde_json::json;
use stepwise_agent::{
    load_agent, load_agent_from_file, save_agent, Agent, AgentExecutor, PromptArgs,
    ReActOutputParser, SerializedAgent, ToolRegistry, ZeroShotAgent,
};
use stepwise_core::{StepwiseError, Tool};
use support::{question, ScriptedLlm, StubTool};

fn tools() -> Vec<Arc<dyn Tool>> {
    vec![
        StubTool::calculator() as Arc<dyn Tool>,
        StubTool::new("Search", "Look things up on the web.", "result"),
    ]
}

#[test]
fn serialized_agent_carries_its_type_tag() {
    let agent =
        ZeroShotAgent::from_llm_and_tools(ScriptedLlm::new(["x"]), &tools(), PromptArgs::default())
            .unwrap();

    let value = serde_json::to_value(agent.serialize()).unwrap();

    assert_eq!(value["_type"], "zero-shot-react-description");
    assert_eq!(value["allowed_tools"], json!(["Calculator", "Search"]));
    assert_eq!(value["output_key"], "output");
    assert_eq!(value["prompt"], agent.prompt().template());
}

#[tokio::test]
async fn reloaded_agent_builds_the_same_prompt() {
    let original = ZeroShotAgent::from_llm_and_tools(
        ScriptedLlm::new(["x"]),
        &tools(),
        PromptArgs::default(),
    )
    .unwrap()
    .with_output_parser(ReActOutputParser::new("answer"));
    let saved = serde_json::to_value(original.serialize()).unwrap();

    let llm = ScriptedLlm::new(["Final Answer: 4"]);
    let loaded = load_agent(saved, llm.clone(), &tools()).unwrap();

    assert_eq!(loaded.allowed_tools(), original.allowed_tools());
    assert_eq!(loaded.return_values(), vec!["answer".to_string()]);
    assert_eq!(
        loaded.construct_prompt(&question("2+2?"), &[]).unwrap(),
        original.construct_prompt(&question("2+2?"), &[]).unwrap()
    );

    let executor = AgentExecutor::new(loaded, ToolRegistry::from_tools(tools()).unwrap());
    let output = executor.run(&question("2+2?")).await.unwrap();
    assert_eq!(output.get("answer"), Some("4"));
}

#[test]
fn output_key_defaults_when_omitted() {
    let saved = json!({
        "_type": "zero-shot-react-description",
        "prompt": "Question: {{input}}\nThought:{{agent_scratchpad}}",
        "allowed_tools": ["Calculator"],
    });

    let agent = load_agent(saved, ScriptedLlm::new(["x"]), &tools()).unwrap();

    assert_eq!(agent.return_values(), vec!["output".to_string()]);
    assert_eq!(agent.input_keys(), vec!["input".to_string()]);
}

#[test]
fn unknown_or_missing_type_is_rejected() {
    let unknown = json!({ "_type": "plan-and-execute", "prompt": "", "allowed_tools": [] });
    let err = load_agent(unknown, ScriptedLlm::new(["x"]), &tools()).unwrap_err();
    assert!(matches!(
        err,
        StepwiseError::InvalidConfig(ref msg) if msg.contains("plan-and-execute")
    ));

    let untagged = json!({ "prompt": "{{agent_scratchpad}}", "allowed_tools": [] });
    let err = load_agent(untagged, ScriptedLlm::new(["x"]), &tools()).unwrap_err();
    assert!(matches!(err, StepwiseError::InvalidConfig(_)));
}

#[test]
fn allowed_tools_must_be_provided() {
    let saved = json!({
        "_type": "zero-shot-react-description",
        "prompt": "{{input}}{{agent_scratchpad}}",
        "allowed_tools": ["Calculator", "Weather"],
    });

    let err = load_agent(saved, ScriptedLlm::new(["x"]), &tools()).unwrap_err();
    assert!(matches!(err, StepwiseError::InvalidConfig(ref msg) if msg.contains("Weather")));
}

#[test]
fn saved_prompt_needs_a_scratchpad() {
    let saved = json!({
        "_type": "zero-shot-react-description",
        "prompt": "Question: {{input}}",
        "allowed_tools": ["Calculator"],
    });

    let err = load_agent(saved, ScriptedLlm::new(["x"]), &tools()).unwrap_err();
    assert!(matches!(err, StepwiseError::InvalidConfig(_)));
}

#[test]
fn agent_survives_a_trip_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.json");
    let agent =
        ZeroShotAgent::from_llm_and_tools(ScriptedLlm::new(["x"]), &tools(), PromptArgs::default())
            .unwrap();

    save_agent(&path, &agent).unwrap();
    let loaded = load_agent_from_file(&path, ScriptedLlm::new(["x"]), &tools()).unwrap();

    let SerializedAgent::ZeroShotReactDescription(saved) = loaded.serialize();
    assert_eq!(saved.allowed_tools, vec!["Calculator", "Search"]);
    assert_eq!(loaded.serialize(), agent.serialize());
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = load_agent_from_file(path, ScriptedLlm::new(["x"]), &tools()).unwrap_err();
    assert!(matches!(err, StepwiseError::InvalidConfig(_)));
}
