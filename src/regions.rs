//! Region handling
//!
//! The known-region set and default-region resolution. The default region
//! authenticates global services and anchors the client cache key for them;
//! regional services take their region from the query's matrix fan-out.

use crate::auth::env::Env;
use crate::connection::ConnectionConfig;
use crate::error::{Error, Result};

/// Environment variables consulted for the default region, in priority order.
pub const REGION_ENV_VARS: &[&str] = &[
    "ALIBABACLOUD_REGION_ID",
    "ALICLOUD_REGION_ID",
    "ALICLOUD_REGION",
];

/// Fallback when neither the connection nor the environment names a region.
pub const FALLBACK_REGION: &str = "cn-hangzhou";

/// Alibaba Cloud region ids.
pub const KNOWN_REGIONS: &[&str] = &[
    // China
    "cn-qingdao",
    "cn-beijing",
    "cn-zhangjiakou",
    "cn-huhehaote",
    "cn-wulanchabu",
    "cn-hangzhou",
    "cn-shanghai",
    "cn-nanjing",
    "cn-fuzhou",
    "cn-shenzhen",
    "cn-heyuan",
    "cn-guangzhou",
    "cn-chengdu",
    "cn-hongkong",
    // Asia Pacific
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-5",
    "ap-southeast-6",
    "ap-southeast-7",
    "ap-south-1",
    // Europe & Americas
    "us-east-1",
    "us-west-1",
    "eu-west-1",
    "eu-central-1",
    "me-east-1",
    "me-central-1",
];

pub fn is_known_region(region: &str) -> bool {
    KNOWN_REGIONS.contains(&region)
}

/// Entries of `regions` that are not valid region ids.
pub fn invalid_regions(regions: &[String]) -> Vec<String> {
    regions
        .iter()
        .filter(|r| !is_known_region(r))
        .cloned()
        .collect()
}

/// Resolve the default region: first configured region (validated) →
/// environment → hardcoded fallback.
///
/// An invalid configured region is a fatal, user-visible configuration
/// error: the operator typo'd the connection file and every global-service
/// call would otherwise target a nonexistent endpoint.
pub fn default_region(config: &ConnectionConfig, env: &Env) -> Result<String> {
    if let Some(regions) = &config.regions {
        if let Some(region) = regions.first() {
            if !is_known_region(region) {
                return Err(Error::config(format!(
                    "connection config has invalid region: {region}. Edit your connection configuration and retry"
                )));
            }
            return Ok(region.clone());
        }
    }

    for var in REGION_ENV_VARS {
        if let Some(region) = env.get(var) {
            if !region.is_empty() {
                return Ok(region);
            }
        }
    }

    Ok(FALLBACK_REGION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_region_wins() {
        let config = ConnectionConfig {
            regions: Some(vec!["us-east-1".to_string(), "cn-beijing".to_string()]),
            ..Default::default()
        };
        let env = Env::from_map([("ALIBABACLOUD_REGION_ID", "eu-west-1")]);
        assert_eq!(default_region(&config, &env).unwrap(), "us-east-1");
    }

    #[test]
    fn test_invalid_configured_region_is_fatal() {
        let config = ConnectionConfig {
            regions: Some(vec!["us-east-99".to_string()]),
            ..Default::default()
        };
        let err = default_region(&config, &Env::empty()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("us-east-99"));
    }

    #[test]
    fn test_env_fallback_order() {
        let config = ConnectionConfig::default();
        let env = Env::from_map([
            ("ALICLOUD_REGION", "cn-shanghai"),
            ("ALICLOUD_REGION_ID", "cn-beijing"),
        ]);
        assert_eq!(default_region(&config, &env).unwrap(), "cn-beijing");
    }

    #[test]
    fn test_hardcoded_fallback() {
        assert_eq!(
            default_region(&ConnectionConfig::default(), &Env::empty()).unwrap(),
            FALLBACK_REGION
        );
    }

    #[test]
    fn test_invalid_regions_filter() {
        let regions = vec![
            "cn-hangzhou".to_string(),
            "mars-north-1".to_string(),
            "us-west-1".to_string(),
        ];
        assert_eq!(invalid_regions(&regions), vec!["mars-north-1"]);
    }
}
