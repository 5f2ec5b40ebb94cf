#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Bridge(#[from] qbridge_api::BridgeError),

    #[error("argument ({context}): {source}")]
    Json { context: &'static str, source: serde_json::Error },
}
