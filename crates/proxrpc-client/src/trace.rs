use proxrpc_common::config::names;
use proxrpc_common::Properties;

/// Tracing target for retry decisions.
pub const RETRY_TARGET: &str = "proxrpc::retry";
/// Tracing target for locator cache activity.
pub const LOCATOR_TARGET: &str = "proxrpc::locator";

/// Verbosity of the optional trace categories.
///
/// `0` disables a category. For retries `1` logs each decision and `2` also
/// the schedule at start-up. For the locator `1` logs cache hits, misses and
/// invalidations and `2` also every locator round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceLevels {
    pub retry: i32,
    pub locator: i32,
}

impl TraceLevels {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            retry: props.get_property_as_int(names::TRACE_RETRY),
            locator: props.get_property_as_int(names::TRACE_LOCATOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_silent() {
        assert_eq!(TraceLevels::from_properties(&Properties::new()), TraceLevels::default());
    }

    #[test]
    fn test_reads_levels() {
        let props = Properties::new();
        props.set_property("Proxrpc.Trace.Retry", "2");
        props.set_property("Proxrpc.Trace.Locator", "1");
        let levels = TraceLevels::from_properties(&props);
        assert_eq!(levels.retry, 2);
        assert_eq!(levels.locator, 1);
    }
}
