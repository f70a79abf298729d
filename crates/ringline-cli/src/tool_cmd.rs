use serde_json::Value;

use ringline_mcp::{Dispatcher, ToolName};

/// Invoke a tool through the dispatcher and print its outcome.
///
/// Uses the same validation and formatting as the protocol servers.
pub async fn run(dispatcher: &Dispatcher, tool: ToolName, arguments: Value) -> anyhow::Result<()> {
    let outcome = dispatcher.call(tool.as_str(), arguments).await;

    if outcome.success {
        println!("{}", outcome.text);
        Ok(())
    } else {
        eprintln!("{}", outcome.text);
        anyhow::bail!("{tool} failed")
    }
}
