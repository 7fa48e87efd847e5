// Tool dispatch: normalize, resolve, invoke, wrap.

use crate::normalize::ToolCall;
use crate::protocol::{CallToolResult, CallerContext};
use crate::tools::{AnalyzeBlobArgs, ExecuteSqlArgs, SchemaInfoArgs, ToolKind};
use anyhow::Context as _;
use serde_json::{Map, Value};
use sqlx::{Connection, SqliteConnection};
use std::sync::Arc;
use teller_core::{blob, query, schema, CredentialProvider};
use uuid::Uuid;

/// Resolves inbound tool calls and executes them against the store.
///
/// Dispatch is total over any well-formed call: normalization problems,
/// unknown names, and every failure inside a handler collapse into the
/// uniform error envelope. No call is left unanswered, and no handler
/// runs for an unregistered name.
pub struct Dispatcher {
    credentials: Arc<dyn CredentialProvider>,
}

impl Dispatcher {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }

    /// Handle one inbound call end-to-end.
    pub async fn dispatch(
        &self,
        body: &Value,
        context: Option<&CallerContext>,
    ) -> CallToolResult {
        let call = match ToolCall::resolve(body, context) {
            Ok(call) => call,
            Err(e) => return CallToolResult::error(format!("{:#}", e)),
        };

        let Some(kind) = ToolKind::resolve(&call.tool_name) else {
            return CallToolResult::error(format!("Unknown tool: {}", call.tool_name));
        };

        let invocation_id = Uuid::new_v4();
        tracing::debug!(tool = kind.name(), %invocation_id, "dispatching tool call");

        match self.invoke(kind, call.arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = kind.name(), %invocation_id, error = %e, "tool call failed");
                CallToolResult::error(format!("{:#}", e))
            }
        }
    }

    /// Run one resolved capability with a fresh store connection.
    ///
    /// Argument parsing and identifier validation happen before the
    /// connection is opened; the connection is closed before returning on
    /// both the success and the failure path.
    async fn invoke(
        &self,
        kind: ToolKind,
        arguments: Map<String, Value>,
    ) -> anyhow::Result<CallToolResult> {
        let arguments = Value::Object(arguments);

        match kind {
            ToolKind::ExecuteSqlQuery => {
                let args: ExecuteSqlArgs = serde_json::from_value(arguments)
                    .context("Invalid arguments for execute_sql_query")?;

                let mut conn = self.connect().await?;
                let outcome =
                    query::execute(&mut conn, &args.query, args.parameters.as_ref()).await;
                let _ = conn.close().await;

                Ok(CallToolResult::success(&outcome?))
            }
            ToolKind::GetSchemaInfo => {
                let args: SchemaInfoArgs = serde_json::from_value(arguments)
                    .context("Invalid arguments for get_schema_info")?;
                if let Some(database_name) = &args.database_name {
                    tracing::debug!(%database_name, "database_name ignored; catalog fixed by configuration");
                }

                let mut conn = self.connect().await?;
                let outcome = match args.table_name.as_deref() {
                    Some(table) => schema::describe_table(&mut conn, table).await,
                    None => schema::list_tables(&mut conn).await,
                };
                let _ = conn.close().await;

                Ok(CallToolResult::success(&outcome?))
            }
            ToolKind::AnalyzeBlobData => {
                let args: AnalyzeBlobArgs = serde_json::from_value(arguments)
                    .context("Invalid arguments for analyze_blob_data")?;
                blob::validate_identifier(&args.table)?;
                blob::validate_identifier(&args.blob_column)?;
                blob::validate_identifier(&args.id_column)?;

                let mut conn = self.connect().await?;
                let outcome = blob::extract(
                    &mut conn,
                    &args.table,
                    &args.blob_column,
                    args.row_id,
                    &args.id_column,
                )
                .await;
                let _ = conn.close().await;

                Ok(CallToolResult::success(&outcome?))
            }
        }
    }

    async fn connect(&self) -> anyhow::Result<SqliteConnection> {
        Ok(self.credentials.current()?.connect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ToolContent, CONTEXT_TOOL_NAME_KEY};
    use serde_json::json;
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::ConnectOptions;
    use teller_core::{GatewayError, GatewayResult, StaticCredentials};

    /// Provider that fails loudly if the dispatcher touches the store.
    struct UnreachableProvider;

    impl CredentialProvider for UnreachableProvider {
        fn current(&self) -> GatewayResult<teller_core::Credentials> {
            Err(GatewayError::Credentials(
                "store accessed during a call that must not reach it".to_string(),
            ))
        }
    }

    async fn fixture() -> (tempfile::TempDir, Dispatcher) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.db");

        let mut conn = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE customers (
                id INTEGER PRIMARY KEY,
                customer_code TEXT NOT NULL,
                risk_rating TEXT
            )",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO customers VALUES
                (1, 'CUST001', 'Medium'),
                (2, 'CUST002', 'Low')",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE research_reports (id INTEGER PRIMARY KEY, report_content BLOB)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        sqlx::query("INSERT INTO research_reports VALUES (1, ?1)")
            .bind(b"%PDF-1.4 x BT Annual Credit Review ET".to_vec())
            .execute(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();

        let url = format!("sqlite:{}", path.display());
        let dispatcher = Dispatcher::new(Arc::new(StaticCredentials::new(url)));
        (dir, dispatcher)
    }

    fn payload(result: &CallToolResult) -> Value {
        let ToolContent::Text { text } = &result.content[0];
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn executes_sql_through_the_envelope() {
        let (_dir, dispatcher) = fixture().await;
        let body = json!({
            "name": "execute_sql_query",
            "arguments": {"query": "SELECT customer_code FROM customers ORDER BY id"}
        });
        let result = dispatcher.dispatch(&body, None).await;

        assert!(!result.is_error);
        let payload = payload(&result);
        assert_eq!(payload["row_count"], 2);
        assert_eq!(payload["rows"][0]["customer_code"], "CUST001");
        assert_eq!(payload["truncated"], false);
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_without_store_access() {
        let dispatcher = Dispatcher::new(Arc::new(UnreachableProvider));
        let body = json!({"name": "delete_everything", "arguments": {}});
        let result = dispatcher.dispatch(&body, None).await;

        assert!(result.is_error);
        assert_eq!(payload(&result)["error"], "Unknown tool: delete_everything");
    }

    #[tokio::test]
    async fn blocked_statement_surfaces_as_error_envelope() {
        let (_dir, dispatcher) = fixture().await;
        let body = json!({"name": "execute_sql_query", "arguments": {"query": "DROP TABLE customers"}});
        let result = dispatcher.dispatch(&body, None).await;

        assert!(result.is_error);
        let message = payload(&result)["error"].as_str().unwrap().to_string();
        assert!(message.contains("DROP"));
        assert!(message.contains("Read-only access"));
    }

    #[tokio::test]
    async fn missing_required_argument_is_an_error_envelope() {
        let (_dir, dispatcher) = fixture().await;
        let body = json!({"name": "execute_sql_query", "arguments": {}});
        let result = dispatcher.dispatch(&body, None).await;

        assert!(result.is_error);
        let message = payload(&result)["error"].as_str().unwrap().to_string();
        assert!(message.contains("execute_sql_query"));
    }

    #[tokio::test]
    async fn schema_listing_and_detail_are_mutually_exclusive() {
        let (_dir, dispatcher) = fixture().await;

        let listing = dispatcher
            .dispatch(&json!({"name": "get_schema_info", "arguments": {}}), None)
            .await;
        let listing = payload(&listing);
        assert!(listing.get("tables").is_some());
        assert!(listing.get("columns").is_none());

        let detail = dispatcher
            .dispatch(
                &json!({"name": "get_schema_info", "arguments": {"table_name": "customers"}}),
                None,
            )
            .await;
        let detail = payload(&detail);
        assert!(detail.get("tables").is_none());
        assert_eq!(detail["table"], "customers");
        assert_eq!(detail["primary_keys"][0], "id");
    }

    #[tokio::test]
    async fn envelope_shapes_resolve_to_the_same_invocation() {
        let (_dir, dispatcher) = fixture().await;

        let in_band = dispatcher
            .dispatch(&json!({"name": "get_schema_info", "arguments": {}}), None)
            .await;

        let mut context = CallerContext::default();
        context
            .custom
            .insert(CONTEXT_TOOL_NAME_KEY.to_string(), json!("ns___get_schema_info"));
        let out_of_band = dispatcher.dispatch(&json!({}), Some(&context)).await;

        assert_eq!(payload(&in_band), payload(&out_of_band));
    }

    #[tokio::test]
    async fn blob_analysis_round_trips_through_dispatch() {
        let (_dir, dispatcher) = fixture().await;
        let body = json!({
            "name": "analyze_blob_data",
            "arguments": {"table": "research_reports", "blob_column": "report_content", "row_id": 1}
        });
        let result = dispatcher.dispatch(&body, None).await;

        assert!(!result.is_error);
        let payload = payload(&result);
        assert_eq!(payload["content_type"], "application/pdf");
        assert!(payload["preview"]
            .as_str()
            .unwrap()
            .contains("Annual Credit Review"));
    }

    #[tokio::test]
    async fn blob_lookup_miss_is_an_error_payload_not_a_fault() {
        let (_dir, dispatcher) = fixture().await;
        let body = json!({
            "name": "analyze_blob_data",
            "arguments": {"table": "research_reports", "blob_column": "report_content", "row_id": 404}
        });
        let result = dispatcher.dispatch(&body, None).await;

        assert!(result.is_error);
        assert_eq!(
            payload(&result)["error"],
            "No blob data found for id=404"
        );
    }

    #[tokio::test]
    async fn unsafe_identifier_is_rejected_in_the_envelope() {
        let (_dir, dispatcher) = fixture().await;
        let body = json!({
            "name": "analyze_blob_data",
            "arguments": {
                "table": "research_reports",
                "blob_column": "x; DROP TABLE research_reports",
                "row_id": 1
            }
        });
        let result = dispatcher.dispatch(&body, None).await;

        assert!(result.is_error);
        let message = payload(&result)["error"].as_str().unwrap().to_string();
        assert!(message.starts_with("Invalid table/column name"));
    }

    #[tokio::test]
    async fn malformed_string_arguments_become_an_error_envelope() {
        let dispatcher = Dispatcher::new(Arc::new(UnreachableProvider));
        let body = json!({"name": "execute_sql_query", "arguments": "{not json"});
        let result = dispatcher.dispatch(&body, None).await;

        assert!(result.is_error);
        let message = payload(&result)["error"].as_str().unwrap().to_string();
        assert!(message.contains("not valid JSON"));
    }
}
