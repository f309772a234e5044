use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::OnceLock,
    time::{Duration, Instant},
};

use anyhow::Context;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tracing::{info, warn};

use fermenter_common::{
    telemetry_payload, Brightness, DisplayState, IntervalScheduler, LinkCommand, LinkSupervisor,
    MacAddr, MessageRouter, NetworkConfig, NetworkLink, NumericDisplay, RouterAction,
    RuntimeConfig, Sampler, SessionCommand, SessionSupervisor, TemperatureSensor,
    TOPIC_DISPLAY_WILDCARD, TOPIC_TEMP_READING,
};

/// Control-loop tick. Finer than the publish interval so the strict
/// elapsed-interval comparison fires close to its boundary.
const CONTROL_TICK_MS: u64 = 250;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = load_config().await.unwrap_or_else(|err| {
        warn!("failed to load config, using defaults: {err:#}");
        RuntimeConfig::default()
    });
    config.monitor.sanitize();
    apply_env_overrides(&mut config.network);

    let mut link_adapter = HostLink::from_env();
    let device_id = link_adapter.mac().device_id();
    info!(device_id = %device_id, "fermenter monitor starting");

    let mut link = LinkSupervisor::new(config.monitor.link_poll_ms);
    let mut session = SessionSupervisor::new(config.monitor.session_retry_ms);
    let mut router = MessageRouter::new(DisplayState::new(config.monitor.boot_brightness));
    let sampler = Sampler::new(config.monitor.readings_per_publish);
    let mut probe = SimulatedProbe::default();
    let mut panel = LoggingDisplay;

    panel.set_brightness(Brightness::Level(config.monitor.boot_brightness));

    let mut mqtt_options = MqttOptions::new(
        config.monitor.client_id.clone(),
        config.network.mqtt_host.clone(),
        config.network.mqtt_port,
    );
    if !config.network.mqtt_user.is_empty() {
        mqtt_options.set_credentials(
            config.network.mqtt_user.clone(),
            config.network.mqtt_pass.clone(),
        );
    }

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 32);

    let mut session_up = false;
    let mut last_link_state = link.state();
    let mut last_session_state = session.state();
    let mut scheduler =
        IntervalScheduler::new(monotonic_ms(), config.monitor.publish_interval_ms);
    let mut ticker = tokio::time::interval(Duration::from_millis(CONTROL_TICK_MS));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        info!("mqtt connected");
                        session_up = true;
                    }
                    Ok(Event::Incoming(Incoming::Publish(message))) => {
                        handle_inbound(&client, &mut router, &mut panel, &message.topic, &message.payload).await;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        session_up = false;
                        warn!(
                            "mqtt connection failed: {err}, retrying in {}ms",
                            config.monitor.session_retry_ms
                        );
                        tokio::time::sleep(Duration::from_millis(config.monitor.session_retry_ms)).await;
                    }
                }
            }

            _ = ticker.tick() => {
                let now_ms = monotonic_ms();

                if link.poll_due(now_ms) {
                    info!("waiting for network link");
                }
                for command in link.step(link_adapter.is_up(), now_ms) {
                    match command {
                        LinkCommand::BeginConnect => {
                            info!(ssid = %config.network.wifi_ssid, "connecting to network");
                            link_adapter.begin_connect();
                        }
                    }
                }

                for command in session.step(link.state(), session_up, now_ms) {
                    match command {
                        SessionCommand::Connect => info!("attempting mqtt connection"),
                        SessionCommand::Subscribe => {
                            subscribe_topics(&client, router.watched_topic()).await;
                        }
                    }
                }

                if link.state() != last_link_state {
                    info!(state = link.state().as_str(), "network link");
                    last_link_state = link.state();
                }
                if session.state() != last_session_state {
                    info!(state = session.state().as_str(), "broker session");
                    last_session_state = session.state();
                }

                if session.is_connected() && scheduler.poll(now_ms) {
                    let mean = sampler.run_cycle(&mut probe);
                    info!("{mean:.2}°C");

                    let payload = telemetry_payload(mean, &device_id);
                    if let Err(err) = client
                        .publish(TOPIC_TEMP_READING, QoS::AtMostOnce, false, payload)
                        .await
                    {
                        warn!("telemetry publish failed: {err}");
                    }
                }
            }

            _ = &mut ctrl_c => {
                info!("shutdown requested");
                return Ok(());
            }
        }
    }
}

async fn subscribe_topics(client: &AsyncClient, watched: Option<&str>) {
    if let Err(err) = client
        .subscribe(TOPIC_DISPLAY_WILDCARD, QoS::AtLeastOnce)
        .await
    {
        warn!("subscribe {TOPIC_DISPLAY_WILDCARD} failed: {err}");
    }

    if let Some(topic) = watched {
        if let Err(err) = client.subscribe(topic, QoS::AtLeastOnce).await {
            warn!("subscribe {topic} failed: {err}");
        }
    }
}

async fn handle_inbound(
    client: &AsyncClient,
    router: &mut MessageRouter,
    panel: &mut impl NumericDisplay,
    topic: &str,
    payload: &[u8],
) {
    info!(topic, "message arrived");

    for action in router.dispatch(topic, payload) {
        match action {
            RouterAction::SetBrightness(brightness) => panel.set_brightness(brightness),
            RouterAction::WatchTopic(watched) => {
                info!(topic = %watched, "display source updated");
                if !watched.is_empty() {
                    if let Err(err) = client.subscribe(&watched, QoS::AtLeastOnce).await {
                        warn!("subscribe {watched} failed: {err}");
                    }
                }
            }
            RouterAction::Render(value) => panel.render(value),
        }
    }
}

async fn load_config() -> anyhow::Result<RuntimeConfig> {
    let path = std::env::var("FERMENTER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./fermenter.json"));

    match tokio::fs::read(&path).await {
        Ok(raw) => serde_json::from_slice::<RuntimeConfig>(&raw)
            .with_context(|| format!("malformed config at {}", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
        Err(err) => Err(err.into()),
    }
}

fn apply_env_overrides(network: &mut NetworkConfig) {
    if let Ok(host) = std::env::var("MQTT_HOST") {
        network.mqtt_host = host;
    }
    if let Some(port) = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
    {
        network.mqtt_port = port;
    }
    if let Ok(user) = std::env::var("MQTT_USER") {
        network.mqtt_user = user;
    }
    if let Ok(pass) = std::env::var("MQTT_PASS") {
        network.mqtt_pass = pass;
    }
}

/// Host stand-in for the wireless driver: the OS owns the interface, so the
/// link reports up and connect initiation is a no-op. The hardware address
/// comes from `DEVICE_MAC` since there is no radio to read it from.
struct HostLink {
    mac: MacAddr,
}

impl HostLink {
    fn from_env() -> Self {
        let mac = std::env::var("DEVICE_MAC")
            .ok()
            .and_then(|raw| match raw.parse::<MacAddr>() {
                Ok(mac) => Some(mac),
                Err(err) => {
                    warn!("invalid DEVICE_MAC: {err}");
                    None
                }
            })
            .unwrap_or(MacAddr([0; 6]));
        Self { mac }
    }
}

impl NetworkLink for HostLink {
    fn is_up(&mut self) -> bool {
        true
    }

    fn begin_connect(&mut self) {}

    fn mac(&self) -> MacAddr {
        self.mac
    }
}

// Hardware integration point:
// replace with the one-wire DS18B20 driver on the device target.
struct SimulatedProbe {
    converted: f32,
    cycle: u64,
}

impl Default for SimulatedProbe {
    fn default() -> Self {
        Self {
            converted: 18.0,
            cycle: 0,
        }
    }
}

impl TemperatureSensor for SimulatedProbe {
    fn request_reading(&mut self) {
        self.cycle = self.cycle.wrapping_add(1);
        self.converted = 18.0 + ((self.cycle % 8) as f32 * 0.2);
    }

    fn read_last_celsius(&mut self) -> f32 {
        self.converted
    }
}

// Hardware integration point:
// replace with the TM1637 clock/data driver on the device target.
struct LoggingDisplay;

impl NumericDisplay for LoggingDisplay {
    fn render(&mut self, value: i32) {
        info!(value, "display");
    }

    fn set_brightness(&mut self, brightness: Brightness) {
        match brightness {
            Brightness::Off => info!("display off"),
            // The panel hardware only has 8 levels.
            Brightness::Level(level) => info!(level = level.min(7), "display brightness"),
        }
    }
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
