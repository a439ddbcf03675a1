//! Collector URL construction.
//!
//! [`collector_url`] runs once per client build and yields the client's fixed
//! base address. [`raw_metadata_query`] runs per raw delivery and yields the
//! query fragment carrying event metadata.

use super::url_encoding::escape_data;
use crate::config::{ChannelIdMode, HecConfig};

/// Build the base address for a client.
///
/// Order is fixed: trailing slash, path segment, channel, then token, so the
/// token is always the last parameter when present.
pub fn collector_url(config: &HecConfig, segment: &str, channel_id: &str) -> String {
    let mut url = config.collector_url.trim().to_owned();
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(segment.trim_start_matches('/'));

    if config.channel_id == ChannelIdMode::QueryString {
        url.push_str("?channel=");
        url.push_str(&escape_data(channel_id));
    }

    if config.use_token_as_query_string {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str("token=");
        url.push_str(&escape_data(&config.auth_token));
    }

    url
}

/// Build the per-request metadata fragment for the raw endpoint.
///
/// Keys are emitted in the order source, sourcetype, index, host and unset
/// keys are skipped. The separator is `&` when the fragment already has
/// content or `base_url` already carries a query, else `?`.
pub fn raw_metadata_query(config: &HecConfig, base_url: &str) -> String {
    let base_has_query = base_url.contains('?');
    let pairs = [
        ("source", config.source.as_deref()),
        ("sourcetype", config.sourcetype.as_deref()),
        ("index", config.index.as_deref()),
        ("host", config.host.as_deref()),
    ];

    let mut fragment = String::new();
    for (key, value) in pairs {
        let Some(value) = value else {
            continue;
        };
        fragment.push(if !fragment.is_empty() || base_has_query {
            '&'
        } else {
            '?'
        });
        fragment.push_str(key);
        fragment.push('=');
        fragment.push_str(&escape_data(value));
    }
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const CHANNEL: &str = "5f0c7a2e-3c59-4b8a-9d0e-1f2a3b4c5d6e";

    #[fixture]
    fn config() -> HecConfig {
        HecConfig {
            collector_url: "https://h/collector".into(),
            auth_token: "tok en".into(),
            ..HecConfig::default()
        }
    }

    #[rstest]
    fn appends_slash_and_segment(config: HecConfig) {
        assert_eq!(collector_url(&config, "raw", CHANNEL), "https://h/collector/raw");
    }

    #[rstest]
    fn keeps_existing_trailing_slash(mut config: HecConfig) {
        config.collector_url = "https://h/collector/".into();
        assert_eq!(
            collector_url(&config, "event", CHANNEL),
            "https://h/collector/event"
        );
    }

    #[rstest]
    fn empty_segment_leaves_base(config: HecConfig) {
        assert_eq!(collector_url(&config, "", CHANNEL), "https://h/collector/");
    }

    #[rstest]
    fn channel_precedes_token(mut config: HecConfig) {
        config.channel_id = ChannelIdMode::QueryString;
        config.use_token_as_query_string = true;
        assert_eq!(
            collector_url(&config, "raw", CHANNEL),
            format!("https://h/collector/raw?channel={CHANNEL}&token=tok%20en")
        );
    }

    #[rstest]
    fn token_alone_opens_query(mut config: HecConfig) {
        config.use_token_as_query_string = true;
        assert_eq!(
            collector_url(&config, "event", CHANNEL),
            "https://h/collector/event?token=tok%20en"
        );
    }

    #[rstest]
    fn header_channel_mode_leaves_url_untouched(mut config: HecConfig) {
        config.channel_id = ChannelIdMode::Header;
        assert_eq!(collector_url(&config, "raw", CHANNEL), "https://h/collector/raw");
    }

    #[rstest]
    fn metadata_in_fixed_order(mut config: HecConfig) {
        config.host = Some("A".into());
        config.source = Some("B".into());
        assert_eq!(
            raw_metadata_query(&config, "https://h/collector/raw"),
            "?source=B&host=A"
        );
    }

    #[rstest]
    fn metadata_all_fields(mut config: HecConfig) {
        config.source = Some("my app".into());
        config.sourcetype = Some("_json".into());
        config.index = Some("main".into());
        config.host = Some("web-1".into());
        assert_eq!(
            raw_metadata_query(&config, "https://h/collector/raw"),
            "?source=my%20app&sourcetype=_json&index=main&host=web-1"
        );
    }

    #[rstest]
    fn metadata_continues_existing_query(mut config: HecConfig) {
        config.index = Some("main".into());
        assert_eq!(
            raw_metadata_query(&config, "https://h/collector/raw?channel=x"),
            "&index=main"
        );
    }

    #[rstest]
    fn metadata_empty_when_unset(config: HecConfig) {
        assert_eq!(raw_metadata_query(&config, "https://h/collector/raw"), "");
    }
}
