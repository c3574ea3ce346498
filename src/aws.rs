use crate::config::AwsConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use tracing::info;

/// Load the shared SDK configuration used by both the S3 and DynamoDB clients
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    let config_loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

    // If access key and secret are provided, use them for credentials
    let sdk_config = if let (Some(access_key), Some(secret_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        let credentials = Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "StaticCredentialsProvider",
        );

        config_loader.credentials_provider(credentials).load().await
    } else {
        config_loader.load().await
    };

    info!("Loaded AWS configuration for region {}", config.region);
    sdk_config
}
