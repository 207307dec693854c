use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;

/// Creates an S3 client for `region` using the default credential chain.
///
/// `endpoint_url` points the client at an S3-compatible service; path-style
/// addressing is enabled in that case since most of them require it.
pub async fn create_s3_client(region: String, endpoint_url: Option<String>) -> Client {
    let sdk_config = aws_config::from_env()
        .region(Region::new(region))
        .load()
        .await;

    match endpoint_url {
        Some(url) => {
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .endpoint_url(url)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        }
        None => Client::new(&sdk_config),
    }
}
