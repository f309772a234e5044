use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_pass: String::new(),
            mqtt_host: "192.168.1.100".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub publish_interval_ms: u64,
    pub readings_per_publish: usize,
    pub session_retry_ms: u64,
    pub link_poll_ms: u64,
    pub client_id: String,
    pub boot_brightness: u8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            publish_interval_ms: 1_000,
            readings_per_publish: 10,
            session_retry_ms: 5_000,
            link_poll_ms: 1_000,
            client_id: "fermenter.temp.esp8266.1".to_string(),
            boot_brightness: 4,
        }
    }
}

impl MonitorConfig {
    pub fn sanitize(&mut self) {
        self.publish_interval_ms = self.publish_interval_ms.max(100);
        self.readings_per_publish = self.readings_per_publish.clamp(1, 1_000);
        self.session_retry_ms = self.session_retry_ms.max(500);
        self.link_poll_ms = self.link_poll_ms.clamp(100, 60_000);
        if self.client_id.is_empty() {
            self.client_id = "fermenter.temp.esp8266.1".to_string();
        }
        self.boot_brightness = self.boot_brightness.min(7);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub network: NetworkConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_restores_unusable_values() {
        let mut config = MonitorConfig {
            publish_interval_ms: 0,
            readings_per_publish: 0,
            session_retry_ms: 0,
            link_poll_ms: 0,
            client_id: String::new(),
            boot_brightness: 9,
        };
        config.sanitize();

        assert_eq!(config.publish_interval_ms, 100);
        assert_eq!(config.readings_per_publish, 1);
        assert_eq!(config.session_retry_ms, 500);
        assert_eq!(config.link_poll_ms, 100);
        assert_eq!(config.client_id, "fermenter.temp.esp8266.1");
        assert_eq!(config.boot_brightness, 7);
    }

    #[test]
    fn sanitize_keeps_defaults_untouched() {
        let mut config = MonitorConfig::default();
        config.sanitize();

        assert_eq!(config.publish_interval_ms, 1_000);
        assert_eq!(config.readings_per_publish, 10);
        assert_eq!(config.session_retry_ms, 5_000);
    }

    #[test]
    fn runtime_config_round_trips_and_fills_missing_sections() {
        let raw = r#"{ "network": { "wifi_ssid": "brewhouse", "wifi_pass": "secret",
            "mqtt_host": "10.0.0.2", "mqtt_port": 1883, "mqtt_user": "", "mqtt_pass": "" } }"#;
        let config: RuntimeConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.network.wifi_ssid, "brewhouse");
        assert_eq!(config.monitor.publish_interval_ms, 1_000);

        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: RuntimeConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.network.mqtt_host, "10.0.0.2");
    }
}
