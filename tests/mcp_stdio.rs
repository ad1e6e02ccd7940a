#![cfg(unix)]

use anyhow::Result;
use rmcp::ServiceExt;
use rmcp::model::{CallToolRequestParams, CallToolResult, ErrorCode, RawContent};
use rmcp::service::{RoleClient, RunningService, ServiceError};
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use serde_json::{Value, json};
use tokio::process::Command;

async fn spawn_server(token_threshold: usize) -> Result<RunningService<RoleClient, ()>> {
    let command = Command::new(env!("CARGO_BIN_EXE_cmdpager")).configure(|cmd| {
        cmd.arg("serve")
            .env_remove("CMDPAGER_CONFIG_PATH")
            .env_remove("RUST_LOG")
            .env("CMDPAGER_TOKEN_THRESHOLD", token_threshold.to_string())
            .env("CMDPAGER_PAGE_SIZE", "100");
    });
    let transport = TokioChildProcess::new(command)?;
    Ok(().serve(transport).await?)
}

async fn call(
    client: &RunningService<RoleClient, ()>,
    tool: &str,
    arguments: Value,
) -> Result<CallToolResult, ServiceError> {
    client
        .call_tool(
            CallToolRequestParams::new(tool.to_string())
                .with_arguments(arguments.as_object().cloned().unwrap_or_default()),
        )
        .await
}

fn result_json(result: &CallToolResult) -> Value {
    let text = result
        .content
        .iter()
        .filter_map(|item| match &item.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");
    serde_json::from_str(&text).unwrap_or(Value::Null)
}

#[tokio::test]
async fn lists_both_tools() -> Result<()> {
    let client = spawn_server(10_000).await?;
    let mut names: Vec<String> = client
        .list_all_tools()
        .await?
        .into_iter()
        .map(|tool| tool.name.to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["read_output_page", "run_command"]);
    client.cancel().await?;
    Ok(())
}

#[tokio::test]
async fn paginated_output_is_read_and_released() -> Result<()> {
    let client = spawn_server(100).await?;

    let run = call(&client, "run_command", json!({ "command": "seq 1 250" })).await?;
    let run = result_json(&run);
    assert_eq!(run["status"], "paginated");
    assert_eq!(run["return_code"], 0);
    // 250 numbers plus the section scaffolding make 257 lines.
    assert_eq!(run["total_lines"], 257);
    assert_eq!(run["total_pages"], 3);
    let output_id = run["output_id"].as_str().unwrap_or_default().to_string();

    let beyond = call(
        &client,
        "read_output_page",
        json!({ "output_id": output_id, "page": 4 }),
    )
    .await;
    match beyond {
        Err(ServiceError::McpError(err)) => assert_eq!(err.code, ErrorCode::INVALID_PARAMS),
        other => panic!("expected invalid params, got {other:?}"),
    }

    for page in 1..=3 {
        let read = call(
            &client,
            "read_output_page",
            json!({ "output_id": output_id, "page": page }),
        )
        .await?;
        let read = result_json(&read);
        assert_eq!(read["page"], page);
        assert_eq!(read["has_previous"], page > 1);
        assert_eq!(read["has_next"], page < 3);
        if page == 3 {
            assert_eq!(read["all_pages_read"], true);
            assert_eq!(read["pages_read"], json!([1, 2, 3]));
            assert!(read["note"].is_string());
        } else {
            assert!(read.get("note").is_none());
        }
    }

    let expired = call(
        &client,
        "read_output_page",
        json!({ "output_id": output_id, "page": 1 }),
    )
    .await;
    match expired {
        Err(ServiceError::McpError(err)) => {
            assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
            assert!(err.message.contains("expired"));
        }
        other => panic!("expected not found, got {other:?}"),
    }

    client.cancel().await?;
    Ok(())
}

#[tokio::test]
async fn timeout_is_a_tool_error() -> Result<()> {
    let client = spawn_server(10_000).await?;
    let result = call(
        &client,
        "run_command",
        json!({ "command": "sleep 30", "timeout_seconds": 1 }),
    )
    .await;
    match result {
        Err(ServiceError::McpError(err)) => {
            assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
            assert_eq!(err.data, Some(json!({ "kind": "timeout" })));
        }
        other => panic!("expected timeout error, got {other:?}"),
    }
    client.cancel().await?;
    Ok(())
}
