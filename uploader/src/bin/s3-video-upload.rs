#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let invocation = match uploader::parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(_) => {
            println!("\n{}", uploader::USAGE);
            std::process::exit(1);
        }
    };

    if let Err(e) = upload(&invocation).await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn upload(invocation: &uploader::Invocation) -> Result<(), anyhow::Error> {
    use anyhow::Context as _;

    uploader::run(
        invocation,
        &uploader::ProfileStore::new(),
        &uploader::TokioRunner,
        uploader::s3_client,
    )
    .await
    .with_context(|| format!("failed to upload test video to {}", invocation.bucket))?;
    Ok(())
}
