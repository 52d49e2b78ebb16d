//! End-to-end signed messaging flows between two workers.
//!
//! Each worker gets its own key, certificate, trust-store directory, and
//! serializer registry, the same shape a real deployment has: one registry
//! per worker process.

#[cfg(test)]
mod tests {
    use conveyor_security::{
        setup_security, Certificate, NoPassphrase, SecurityConfig, SigningKeyMaterial,
        StaticPassphrase,
    };
    use conveyor_serialization::{SerializerRegistry, AUTH, CONTENT_TYPE_AUTH, JSON};
    use serde::{Deserialize, Serialize};
    use std::fs;
    use std::path::Path;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TaskPayload {
        task: String,
        args: Vec<i64>,
    }

    fn payload() -> TaskPayload {
        TaskPayload {
            task: "emails.send".into(),
            args: vec![7, 11],
        }
    }

    /// A provisioned worker identity on disk.
    struct Worker {
        _dir: tempfile::TempDir,
        key: SigningKeyMaterial,
        certificate: Certificate,
        registry: SerializerRegistry,
        config: SecurityConfig,
    }

    /// Provision a worker: key + cert on disk, trust dir containing its own
    /// certificate plus every certificate in `trusted`.
    fn provision(subject: &str, trusted: &[&Certificate]) -> Worker {
        let dir = tempfile::tempdir().unwrap();
        let key = SigningKeyMaterial::generate();
        let certificate = Certificate::issue_self_signed(subject, 3600, &key).unwrap();

        let key_file = dir.path().join("worker.key");
        let cert_file = dir.path().join("worker.cert");
        let trust_dir = dir.path().join("trust");
        fs::write(&key_file, key.export_plain().unwrap()).unwrap();
        fs::write(&cert_file, certificate.raw()).unwrap();
        fs::create_dir(&trust_dir).unwrap();
        fs::write(trust_dir.join("own.cert"), certificate.raw()).unwrap();
        for (i, peer) in trusted.iter().enumerate() {
            fs::write(trust_dir.join(format!("peer-{i}.cert")), peer.raw()).unwrap();
        }

        let config = SecurityConfig {
            task_serializer: AUTH.to_owned(),
            trusted_serializers: Some(vec![JSON.to_owned()]),
            key_file: Some(key_file),
            certificate_file: Some(cert_file),
            trust_store_dir: Some(trust_dir),
            ..SecurityConfig::default()
        };

        Worker {
            _dir: dir,
            key,
            certificate,
            registry: SerializerRegistry::with_defaults(),
            config,
        }
    }

    /// Test: a payload signed by worker A is decoded by worker B when A's
    /// certificate is in B's trust store
    #[test]
    fn test_signed_payload_flows_between_trusting_workers() {
        let sender = provision("sender@dc1", &[]);
        let receiver = provision("receiver@dc1", &[&sender.certificate]);

        setup_security(&sender.registry, &sender.config, &NoPassphrase).unwrap();
        setup_security(&receiver.registry, &receiver.config, &NoPassphrase).unwrap();

        let message = sender.registry.dumps(&payload(), None).unwrap();
        assert_eq!(message.content_type, CONTENT_TYPE_AUTH);

        let decoded = receiver
            .registry
            .loads(&message.content_type, &message.body)
            .unwrap();
        assert_eq!(decoded.read::<TaskPayload>().unwrap(), payload());

        // The reverse direction is NOT trusted: receiver is unknown to
        // sender's store.
        let reply = receiver.registry.dumps(&payload(), None).unwrap();
        assert!(sender
            .registry
            .loads(&reply.content_type, &reply.body)
            .is_err());
    }

    /// Test: a message from a worker outside the trust store is poison
    #[test]
    fn test_stranger_message_rejected() {
        let stranger = provision("intruder@dc9", &[]);
        let receiver = provision("receiver@dc1", &[]);

        setup_security(&stranger.registry, &stranger.config, &NoPassphrase).unwrap();
        setup_security(&receiver.registry, &receiver.config, &NoPassphrase).unwrap();

        let message = stranger.registry.dumps(&payload(), None).unwrap();
        let err = receiver
            .registry
            .loads(&message.content_type, &message.body)
            .unwrap_err();
        assert!(matches!(
            err,
            conveyor_serialization::SerializationError::Rejected(_)
        ));
    }

    /// Test: tampering with a signed message in transit is detected
    #[test]
    fn test_tampered_message_rejected() {
        let sender = provision("sender@dc1", &[]);
        let receiver = provision("receiver@dc1", &[&sender.certificate]);

        setup_security(&sender.registry, &sender.config, &NoPassphrase).unwrap();
        setup_security(&receiver.registry, &receiver.config, &NoPassphrase).unwrap();

        let message = sender.registry.dumps(&payload(), None).unwrap();

        // Flip one byte somewhere in the framed body field.
        let mut body = message.body.clone();
        body[6] ^= 0x01;
        assert!(receiver.registry.loads(&message.content_type, &body).is_err());
    }

    /// Test: passphrase-protected keys work end to end
    #[test]
    fn test_encrypted_key_flow() {
        let worker = provision("sender@dc1", &[]);

        // Re-write the key file encrypted under a passphrase.
        let encrypted = worker.key.export_encrypted(b"s3cret").unwrap();
        fs::write(worker.config.key_file.as_ref().unwrap(), encrypted).unwrap();

        // Without the passphrase setup fails...
        assert!(setup_security(&worker.registry, &worker.config, &NoPassphrase).is_err());

        // ...with it, signing works.
        setup_security(
            &worker.registry,
            &worker.config,
            &StaticPassphrase::new(b"s3cret".to_vec()),
        )
        .unwrap();
        let message = worker.registry.dumps(&payload(), None).unwrap();
        let decoded = worker
            .registry
            .loads(&message.content_type, &message.body)
            .unwrap();
        assert_eq!(decoded.read::<TaskPayload>().unwrap(), payload());
    }

    /// Test: a worker bootstrapped from a TOML file behaves like one
    /// configured in code
    #[test]
    fn test_config_file_bootstrap() {
        let worker = provision("sender@dc1", &[]);

        let config_path = worker.config.key_file.as_ref().unwrap().with_file_name("security.toml");
        fs::write(
            &config_path,
            format!(
                "task_serializer = \"auth\"\n\
                 digest = \"sha256\"\n\
                 key_file = {:?}\n\
                 certificate_file = {:?}\n\
                 trust_store_dir = {:?}\n\
                 trusted_serializers = [\"json\"]\n",
                worker.config.key_file.as_ref().unwrap(),
                worker.config.certificate_file.as_ref().unwrap(),
                worker.config.trust_store_dir.as_ref().unwrap(),
            ),
        )
        .unwrap();

        let config = conveyor_security::load_security_config(Path::new(&config_path)).unwrap();
        assert_eq!(config.digest, "sha256");

        setup_security(&worker.registry, &config, &NoPassphrase).unwrap();
        let message = worker.registry.dumps(&payload(), None).unwrap();
        let decoded = worker
            .registry
            .loads(&message.content_type, &message.body)
            .unwrap();
        assert_eq!(decoded.read::<TaskPayload>().unwrap(), payload());
    }
}
