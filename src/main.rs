//! Key/value service entry point.
//!
//! Serves the plain-text protocol used by the remote persistence scope.

use persistent_item::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
