// AWS Lambda binary entry point for the decode-and-log stub

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    kinesis2s3_lambda::run(kinesis2s3_lambda::Handler::DecodeLog).await
}
