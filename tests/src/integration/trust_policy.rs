//! Registry trust-policy properties, exercised across both crates.

#[cfg(test)]
mod tests {
    use conveyor_serialization::{
        disable_untrusted_serializers, global_registry, SerializerRegistry, ValueFormat,
        CONTENT_TYPE_BINCODE, CONTENT_TYPE_JSON, JSON,
    };

    /// Test: for an allow list L, exactly the registered serializers outside
    /// L end up disabled
    #[test]
    fn test_allow_list_exactness() {
        let registry = SerializerRegistry::with_defaults();
        registry.register_value("yaml", "application/x-yaml", ValueFormat::Json);
        registry.register_value("msgpack", "application/x-msgpack", ValueFormat::Bincode);

        registry.disable_untrusted(Some(&[JSON, "msgpack"]));

        assert_eq!(
            registry.disabled_content_types(),
            vec![
                "application/x-bincode".to_owned(),
                "application/x-yaml".to_owned()
            ]
        );
    }

    /// Test: the no-argument form disables the unsafe formats and keeps the
    /// safe structured one
    #[test]
    fn test_conservative_default() {
        let registry = SerializerRegistry::with_defaults();
        registry.register_value("yaml", "application/x-yaml", ValueFormat::Json);

        registry.disable_untrusted(None);

        assert!(registry.is_disabled("application/x-yaml"));
        assert!(registry.is_disabled(CONTENT_TYPE_BINCODE));
        assert!(!registry.is_disabled(CONTENT_TYPE_JSON));
    }

    /// Test: the standalone facade locks down the process-wide registry
    /// without any security setup
    #[test]
    fn test_standalone_disable_on_global_registry() {
        disable_untrusted_serializers(None);

        assert!(global_registry().is_disabled(CONTENT_TYPE_BINCODE));
        assert!(!global_registry().is_disabled(CONTENT_TYPE_JSON));
    }

    /// Test: decode refuses a disabled type even mid-flight with concurrent
    /// policy changes
    #[test]
    fn test_decode_enforcement_under_races() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(SerializerRegistry::with_defaults());
        let message = registry.dumps(&vec![1u32, 2, 3], Some("bincode")).unwrap();

        let flipper = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..200 {
                    registry.disable_untrusted(Some(&[JSON]));
                    registry.disable_untrusted(Some(&[JSON, "bincode"]));
                }
            })
        };

        for _ in 0..200 {
            match registry.loads(&message.content_type, &message.body) {
                Ok(decoded) => {
                    assert_eq!(decoded.read::<Vec<u32>>().unwrap(), vec![1, 2, 3]);
                }
                Err(conveyor_serialization::SerializationError::ContentTypeDisabled(ct)) => {
                    assert_eq!(ct, CONTENT_TYPE_BINCODE);
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        flipper.join().unwrap();
    }
}
