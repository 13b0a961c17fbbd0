fn main() {
    println!("Run `cargo test -p hostpanel-wire-compat` to check the agent JSON fixtures.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use hostpanel_protocol::{
        ActionResponse, Health, ServiceState, StatusResponse, StatusSnapshot,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Decodes a fixture straight from its text, keeping document order.
    fn decode<T: serde::de::DeserializeOwned>(name: &str) -> T {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (key order is not compared).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  agent: {fixture}\n  rust:  {reserialized}"
        );
    }

    // --- Agent bodies ---

    #[test]
    fn fixture_status_online() {
        roundtrip_test::<StatusResponse>("status_online.json");
    }

    #[test]
    fn fixture_status_offline() {
        roundtrip_test::<StatusResponse>("status_offline.json");
    }

    #[test]
    fn fixture_status_service_error() {
        roundtrip_test::<StatusResponse>("status_service_error.json");
    }

    #[test]
    fn fixture_action_ok() {
        roundtrip_test::<ActionResponse>("action_ok.json");
    }

    #[test]
    fn fixture_action_error() {
        roundtrip_test::<ActionResponse>("action_error.json");
    }

    #[test]
    fn fixture_wake_ok() {
        roundtrip_test::<ActionResponse>("wake_ok.json");
    }

    // --- Snapshot decoding ---

    #[test]
    fn online_snapshot_keeps_agent_order() {
        let snap = StatusSnapshot::from(decode::<StatusResponse>("status_online.json"));

        assert!(snap.host.online);
        let names: Vec<&str> = snap.services().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["vanilla", "modded", "creative", "archive"]);
    }

    #[test]
    fn online_snapshot_maps_health() {
        let snap = StatusSnapshot::from(decode::<StatusResponse>("status_online.json"));

        assert_eq!(
            snap.service("vanilla"),
            Some(&ServiceState::new(Health::Healthy, 3, 20))
        );
        assert_eq!(snap.service("modded").unwrap().health, Health::Starting);
        assert_eq!(snap.service("creative").unwrap().health, Health::Unhealthy);
        assert_eq!(snap.service("archive").unwrap().health, Health::Unknown);
    }

    #[test]
    fn offline_snapshot_has_no_services() {
        let snap = StatusSnapshot::from(decode::<StatusResponse>("status_offline.json"));

        assert!(!snap.host.online);
        assert_eq!(snap.service_count(), 0);
        assert_eq!(snap, StatusSnapshot::unreachable());
    }

    #[test]
    fn service_error_keeps_counts() {
        let resp: StatusResponse = decode("status_service_error.json");
        let vanilla = resp.services.get("vanilla").unwrap();
        assert!(vanilla.error.as_deref().unwrap().starts_with("Failed to reach"));

        let snap = StatusSnapshot::from(resp);
        assert_eq!(
            snap.service("vanilla"),
            Some(&ServiceState::new(Health::Healthy, 0, 0))
        );
    }

    #[test]
    fn action_bodies() {
        assert!(decode::<ActionResponse>("action_ok.json").is_ok());
        assert!(decode::<ActionResponse>("wake_ok.json").is_ok());

        let err: ActionResponse = decode("action_error.json");
        assert!(!err.is_ok());
        assert_eq!(err.message, "Unknown server");
    }
}
