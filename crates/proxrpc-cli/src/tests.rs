/// Command handler tests.
///
/// Each test builds a communicator the way the binary does and checks the
/// text a subcommand would print.
#[cfg(test)]
mod tests {
    use crate::commands::*;
    use proxrpc_client::Communicator;
    use proxrpc_common::Properties;
    use std::sync::Arc;

    fn communicator(props: &[(&str, &str)]) -> Communicator {
        let properties = Properties::new();
        for (key, value) in props {
            properties.set_property(key, value);
        }
        Communicator::with_properties(Arc::new(properties))
    }

    #[test]
    fn test_parse_direct_proxy() {
        let json = run_parse(&communicator(&[]), "office/printer -o:tcp -h 10.0.0.5 -p 4061", false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["identity"], "office/printer");
        assert_eq!(value["category"], "office");
        assert_eq!(value["mode"], "Oneway");
        assert_eq!(value["kind"], "direct");
        assert_eq!(value["endpoints"][0], "tcp -h 10.0.0.5 -p 4061");
        assert!(value.get("adapter_id").is_none());
        assert_eq!(value["normalized"], "office/printer -o:tcp -h 10.0.0.5 -p 4061");
    }

    #[test]
    fn test_parse_adapter_and_well_known() {
        let comm = communicator(&[]);
        let adapter: serde_json::Value =
            serde_json::from_str(&run_parse(&comm, "printer @ Printers", true).unwrap()).unwrap();
        assert_eq!(adapter["kind"], "adapter");
        assert_eq!(adapter["adapter_id"], "Printers");

        let well_known: serde_json::Value =
            serde_json::from_str(&run_parse(&comm, "printer", false).unwrap()).unwrap();
        assert_eq!(well_known["kind"], "well-known");
    }

    #[test]
    fn test_parse_null_and_invalid() {
        let comm = communicator(&[]);
        assert_eq!(run_parse(&comm, "", false).unwrap(), "null");

        let err = run_parse(&comm, "printer -q", false).unwrap_err();
        assert!(err.to_string().contains("cannot parse proxy"));
    }

    #[test]
    fn test_encode_then_decode() {
        let comm = communicator(&[]);
        for proxy in ["printer -f admin @ Printers", "printer -d:udp -h 239.255.0.1 -p 10000"] {
            let hex = run_encode(&comm, proxy).unwrap();
            assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));

            let decoded = run_decode(&comm, &hex).unwrap();
            let expected = comm.string_to_proxy(proxy).unwrap();
            assert_eq!(comm.string_to_proxy(&decoded).unwrap(), expected);
        }
    }

    #[test]
    fn test_null_proxy_encoding() {
        let comm = communicator(&[]);
        let hex = run_encode(&comm, "").unwrap();
        assert_eq!(run_decode(&comm, &hex).unwrap(), "");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        let comm = communicator(&[]);
        assert!(run_decode(&comm, "zz").is_err());

        let hex = run_encode(&comm, "printer @ Printers").unwrap();
        assert!(run_decode(&comm, &hex[..hex.len() - 4]).is_err());

        let trailing = format!("{}00", hex);
        let err = run_decode(&comm, &trailing).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn test_schedule_output() {
        let comm = communicator(&[("Proxrpc.RetryIntervals", "0 100 1500")]);
        let output = run_schedule(&comm, None);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "3 retries (0 100 1500)");
        assert_eq!(lines[1], "  retry 1: immediately");
        assert_eq!(lines[2], "  retry 2: after 100ms");
        assert_eq!(lines[3], "  retry 3: after 1.5s");
        assert_eq!(lines[4], "  worst case backoff: 1600ms");
    }

    #[test]
    fn test_schedule_override_and_disabled() {
        let comm = communicator(&[]);
        assert_eq!(run_schedule(&comm, Some("-1")), "retries disabled");
        assert!(run_schedule(&comm, Some("")).starts_with("1 retry (0)"));
        assert!(run_schedule(&comm, None).starts_with("1 retry (0)"));
    }

    #[test]
    fn test_props_output() {
        let comm = communicator(&[
            ("Proxrpc.Trace.Retry", "1"),
            ("Proxrpc.RetryIntervals", "0 50"),
            ("App.Name", "demo"),
        ]);

        assert_eq!(
            run_props(&comm, "Proxrpc.", false),
            "Proxrpc.RetryIntervals=0 50\nProxrpc.Trace.Retry=1"
        );
        assert_eq!(run_props(&comm, "App.", true), "--App.Name=demo");
    }

    #[test]
    fn test_read_input_passes_arguments_through() {
        assert_eq!(read_input("printer").unwrap(), "printer");
    }
}
