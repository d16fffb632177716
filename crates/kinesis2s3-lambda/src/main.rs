// AWS Lambda binary entry point for the archive handler
//
// Build with: cargo build -p kinesis2s3-lambda --bin bootstrap
//
// The lambda_runtime crate provides the tokio runtime, so we use #[tokio::main]

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    kinesis2s3_lambda::run(kinesis2s3_lambda::Handler::Archive).await
}
