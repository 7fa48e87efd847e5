// Read-only safety guard for agent-generated SQL.

use crate::error::{GatewayError, GatewayResult};

/// Statement prefixes that are never allowed on the read path.
const DENYLIST: [&str; 9] = [
    "DROP", "DELETE", "TRUNCATE", "ALTER", "CREATE", "INSERT", "UPDATE", "EXEC", "EXECUTE",
];

/// Classify a statement before execution.
///
/// The check normalizes the statement and compares its leading keyword
/// against the denylist. It is deliberately coarse: a denylisted keyword
/// inside a CTE, subquery, or chained statement is not caught. This is a
/// last-resort guard against an obviously mutating statement, not a SQL
/// parser.
pub fn check(statement: &str) -> GatewayResult<()> {
    let upper = statement.trim().to_uppercase();
    for keyword in DENYLIST {
        if upper.starts_with(keyword) {
            return Err(GatewayError::Blocked { keyword });
        }
    }
    Ok(())
}
