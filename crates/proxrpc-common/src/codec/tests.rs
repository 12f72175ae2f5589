//! Tests for the string and binary proxy forms.

#[cfg(test)]
mod tests {
    use crate::codec::{InputStream, OutputStream, ReferenceFactory};
    use crate::protocol::{
        Endpoint, EncodingVersion, Identity, InvocationMode, ProxrpcError, Reference, Target,
    };

    fn parse(s: &str) -> Reference {
        ReferenceFactory::new().create(s).unwrap().unwrap()
    }

    fn round_trip_string(s: &str) {
        let reference = parse(s);
        let printed = reference.to_string();
        assert_eq!(parse(&printed), reference, "`{}` printed as `{}`", s, printed);
    }

    // ========================================================================
    // String form
    // ========================================================================

    #[test]
    fn test_empty_string_is_null_proxy() {
        let factory = ReferenceFactory::new();
        assert!(factory.create("").unwrap().is_none());
        assert!(factory.create(" \t\n").unwrap().is_none());
    }

    #[test]
    fn test_well_known_proxy() {
        let reference = parse("greeter");
        assert_eq!(reference.identity, Identity::named("greeter"));
        assert!(reference.is_well_known());
        assert_eq!(reference.mode, InvocationMode::Twoway);
    }

    #[test]
    fn test_direct_proxy_with_two_endpoints() {
        let reference = parse("cat/greeter -o:tcp -h a.example -p 4061:udp -h b.example -p 4062");
        assert_eq!(reference.identity, Identity::new("greeter", "cat"));
        assert_eq!(reference.mode, InvocationMode::Oneway);
        assert_eq!(
            reference.endpoints(),
            &[Endpoint::tcp("a.example", 4061), Endpoint::udp("b.example", 4062)]
        );
    }

    #[test]
    fn test_adapter_proxy_with_options() {
        let reference = parse("printer -f admin -s -e 1.1 @ PrinterAdapter");
        assert_eq!(reference.facet, "admin");
        assert!(reference.secure);
        assert_eq!(reference.encoding, EncodingVersion::new(1, 1));
        assert_eq!(reference.adapter_id(), Some("PrinterAdapter"));
    }

    #[test]
    fn test_quoted_identity_and_adapter() {
        let reference = parse("\"my printer\" @ \"Printer Adapter\"");
        assert_eq!(reference.identity.name, "my printer");
        assert_eq!(reference.adapter_id(), Some("Printer Adapter"));
    }

    #[test]
    fn test_ipv6_endpoint() {
        let reference = parse("x:tcp -h \"::1\" -p 10000");
        assert_eq!(reference.endpoints()[0].host, "::1");
    }

    #[test]
    fn test_parse_errors() {
        let factory = ReferenceFactory::new();
        for bad in [
            "x -q",
            "x -f",
            "x -t extra",
            "x:",
            "x @",
            "x @ a b",
            "\"x",
            "x:tcp -h a -p notaport",
            "a/b/c",
            "x -e 1",
        ] {
            let result = factory.create(bad);
            assert!(
                matches!(result, Err(ProxrpcError::Parse(_))),
                "`{}` should fail to parse, got {:?}",
                bad,
                result
            );
        }
    }

    #[test]
    fn test_string_round_trips() {
        for s in [
            "greeter",
            "cat/greeter -D",
            "greeter -f \"admin facet\" -O @ Adapter",
            "greeter -s -p 1.1 -e 1.1:tcp -h host -p 1 -t 100 -z:ssl -h \"::1\" -p 2",
            "\"with space/and:colon\" @ \"Adapter With Spaces\"",
            "odd\\/name",
        ] {
            round_trip_string(s);
        }
    }

    #[test]
    fn test_dash_facet_needs_quotes() {
        let reference = parse("x -f \"-dash\":tcp -h h -p 3");
        assert_eq!(reference.facet, "-dash");
        assert!(reference.to_string().contains("-f \"-dash\""));
    }

    #[test]
    fn test_cached_endpoints_not_printed() {
        let reference = parse("x @ A").with_cached_endpoints(vec![Endpoint::tcp("h", 1)]);
        assert_eq!(reference.to_string(), "x -t @ A");
    }

    // ========================================================================
    // Binary form
    // ========================================================================

    fn round_trip_binary(reference: &Reference) -> Reference {
        let factory = ReferenceFactory::new();
        let mut out = OutputStream::new();
        factory.write(Some(reference), &mut out).unwrap();
        let bytes = out.into_bytes();
        let mut input = InputStream::new(&bytes);
        let decoded = factory.read(&mut input).unwrap().unwrap();
        assert!(input.is_empty());
        decoded
    }

    #[test]
    fn test_null_proxy_is_empty_identity() {
        let factory = ReferenceFactory::new();
        let mut out = OutputStream::new();
        factory.write(None, &mut out).unwrap();

        let bytes = out.into_bytes();
        let mut input = InputStream::new(&bytes);
        let identity: Identity = input.read().unwrap();
        assert!(identity.is_null());
        assert!(input.is_empty());

        let mut input = InputStream::new(&bytes);
        assert!(factory.read(&mut input).unwrap().is_none());
    }

    #[test]
    fn test_binary_direct_and_indirect() {
        let direct = parse("a -d:udp -h h -p 9");
        assert_eq!(round_trip_binary(&direct), direct);

        let adapter = parse("a -f f -s @ Adapter");
        assert_eq!(round_trip_binary(&adapter), adapter);

        let well_known = parse("cat/a");
        assert_eq!(round_trip_binary(&well_known), well_known);
    }

    #[test]
    fn test_stream_holds_several_proxies() {
        let factory = ReferenceFactory::new();
        let first = parse("one:tcp -h h -p 1");
        let second = parse("two @ B");

        let mut out = OutputStream::new();
        factory.write(Some(&first), &mut out).unwrap();
        factory.write(None, &mut out).unwrap();
        factory.write(Some(&second), &mut out).unwrap();

        let bytes = out.into_bytes();
        let mut input = InputStream::new(&bytes);
        assert_eq!(factory.read(&mut input).unwrap(), Some(first));
        assert_eq!(factory.read(&mut input).unwrap(), None);
        assert_eq!(factory.read(&mut input).unwrap(), Some(second));
        assert!(input.is_empty());
    }

    #[test]
    fn test_truncated_stream() {
        let factory = ReferenceFactory::new();
        let mut out = OutputStream::new();
        factory.write(Some(&parse("a:tcp -h host -p 1")), &mut out).unwrap();
        let bytes = out.into_bytes();

        let mut input = InputStream::new(&bytes[..bytes.len() - 3]);
        assert!(matches!(factory.read(&mut input), Err(ProxrpcError::Truncated(_))));
    }

    #[test]
    fn test_direct_without_endpoints_cannot_be_written() {
        let reference = Reference {
            target: Target::Direct { endpoints: vec![] },
            ..Reference::well_known(Identity::named("x"))
        };
        let factory = ReferenceFactory::new();
        let mut out = OutputStream::new();
        factory.write(Some(&parse("before @ A")), &mut out).unwrap();
        let written = out.as_bytes().to_vec();

        assert!(factory.write(Some(&reference), &mut out).is_err());
        assert_eq!(out.as_bytes(), written.as_slice());

        let mut input = InputStream::new(&written);
        assert_eq!(factory.read(&mut input).unwrap(), Some(parse("before @ A")));
        assert!(input.is_empty());
    }
}
