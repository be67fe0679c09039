use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::info;

use super::config::AppConfig;

/// Loads the shared SDK config from the standard AWS provider chain, applying
/// any region or endpoint override from [`AppConfig`].
pub async fn load_sdk_config(config: &AppConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint_url {
        info!(endpoint = %endpoint, "Using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}
