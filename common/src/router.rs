use crate::{
    display::DisplayState,
    topics::{TOPIC_DISPLAY_BRIGHTNESS, TOPIC_DISPLAY_TOPIC_UPDATE},
    types::Brightness,
};

/// Side effects a dispatch asks the caller to carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    SetBrightness(Brightness),
    /// Subscribe to the newly watched topic so its values reach the display.
    WatchTopic(String),
    Render(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Brightness,
    WatchedValue,
    TopicUpdate,
}

/// Dispatches inbound broker messages to the command handlers and owns the
/// runtime display state they mutate. Every dispatch ends with a render of
/// the current value, whether or not it changed, so the display driver stays
/// in sync with any state mutation.
#[derive(Debug)]
pub struct MessageRouter {
    display: DisplayState,
}

impl MessageRouter {
    pub fn new(display: DisplayState) -> Self {
        Self { display }
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn watched_topic(&self) -> Option<&str> {
        if self.display.watched_topic.is_empty() {
            None
        } else {
            Some(&self.display.watched_topic)
        }
    }

    pub fn dispatch(&mut self, topic: &str, payload: &[u8]) -> Vec<RouterAction> {
        let mut actions = Vec::new();

        // Clauses are evaluated independently: a topic may select more than
        // one handler.
        for handler in self.handlers_for(topic) {
            match handler {
                CommandKind::Brightness => self.handle_brightness(payload, &mut actions),
                CommandKind::WatchedValue => self.handle_watched_value(payload),
                CommandKind::TopicUpdate => self.handle_topic_update(payload, &mut actions),
            }
        }

        actions.push(RouterAction::Render(self.display.displayed_value));
        actions
    }

    fn handlers_for(&self, topic: &str) -> Vec<CommandKind> {
        let mut matched = Vec::new();
        if topic == TOPIC_DISPLAY_BRIGHTNESS {
            matched.push(CommandKind::Brightness);
        }
        if !self.display.watched_topic.is_empty() && topic == self.display.watched_topic {
            matched.push(CommandKind::WatchedValue);
        }
        if topic == TOPIC_DISPLAY_TOPIC_UPDATE {
            matched.push(CommandKind::TopicUpdate);
        }
        matched
    }

    fn handle_brightness(&mut self, payload: &[u8], actions: &mut Vec<RouterAction>) {
        let brightness = if payload == b"off" {
            Brightness::Off
        } else {
            // First payload byte as an ASCII digit; anything else (including
            // an empty payload) coerces to level 0.
            let level = match payload.first().copied() {
                Some(byte @ b'0'..=b'9') => byte - b'0',
                _ => 0,
            };
            Brightness::Level(level)
        };

        self.display.brightness = brightness;
        actions.push(RouterAction::SetBrightness(brightness));
    }

    fn handle_watched_value(&mut self, payload: &[u8]) {
        // Non-numeric payloads coerce to 0; this handler never fails.
        let value = String::from_utf8_lossy(payload)
            .trim()
            .parse::<f32>()
            .unwrap_or(0.0);
        self.display.displayed_value = (value * 100.0) as i32;
    }

    fn handle_topic_update(&mut self, payload: &[u8], actions: &mut Vec<RouterAction>) {
        let topic = String::from_utf8_lossy(payload).into_owned();
        self.display.watched_topic = topic.clone();
        // Switching sources always blanks the display until a value arrives.
        self.display.displayed_value = 0;
        actions.push(RouterAction::WatchTopic(topic));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn router() -> MessageRouter {
        MessageRouter::new(DisplayState::new(4))
    }

    #[test]
    fn topic_update_stores_topic_blanks_value_and_renders_zero() {
        let mut router = router();
        router.display.displayed_value = 1_234;

        let actions = router.dispatch(TOPIC_DISPLAY_TOPIC_UPDATE, b"beer/temp/watch");

        assert_eq!(router.display().watched_topic, "beer/temp/watch");
        assert_eq!(router.display().displayed_value, 0);
        assert_eq!(
            actions,
            vec![
                RouterAction::WatchTopic("beer/temp/watch".to_string()),
                RouterAction::Render(0),
            ]
        );
    }

    #[test]
    fn watched_value_is_scaled_by_100_and_truncated() {
        let mut router = router();
        router.dispatch(TOPIC_DISPLAY_TOPIC_UPDATE, b"beer/temp/watch");

        let actions = router.dispatch("beer/temp/watch", b"21.5");

        assert_eq!(router.display().displayed_value, 2_150);
        assert_eq!(actions, vec![RouterAction::Render(2_150)]);
    }

    #[test]
    fn non_numeric_watched_payload_falls_back_to_zero() {
        let mut router = router();
        router.dispatch(TOPIC_DISPLAY_TOPIC_UPDATE, b"beer/temp/watch");
        router.dispatch("beer/temp/watch", b"21.5");

        router.dispatch("beer/temp/watch", b"abc");

        assert_eq!(router.display().displayed_value, 0);
    }

    #[test]
    fn unconfigured_watched_clause_never_matches() {
        let mut router = router();

        // An empty watched topic must not match the empty-topic string either.
        let actions = router.dispatch("", b"42.0");

        assert_eq!(router.display().displayed_value, 0);
        assert_eq!(actions, vec![RouterAction::Render(0)]);
    }

    #[test]
    fn brightness_off_and_digit_payloads() {
        let mut router = router();

        let actions = router.dispatch(TOPIC_DISPLAY_BRIGHTNESS, b"off");
        assert_eq!(router.display().brightness, Brightness::Off);
        assert_eq!(
            actions,
            vec![
                RouterAction::SetBrightness(Brightness::Off),
                RouterAction::Render(0),
            ]
        );

        // Only the first byte counts.
        router.dispatch(TOPIC_DISPLAY_BRIGHTNESS, b"7xyz");
        assert_eq!(router.display().brightness, Brightness::Level(7));
    }

    #[test]
    fn brightness_non_digit_first_byte_coerces_to_zero() {
        let mut router = router();

        router.dispatch(TOPIC_DISPLAY_BRIGHTNESS, b"bright");
        assert_eq!(router.display().brightness, Brightness::Level(0));

        router.dispatch(TOPIC_DISPLAY_BRIGHTNESS, b"");
        assert_eq!(router.display().brightness, Brightness::Level(0));
    }

    #[test]
    fn every_message_on_a_subscribed_topic_triggers_a_render() {
        let mut router = router();
        router.dispatch(TOPIC_DISPLAY_TOPIC_UPDATE, b"beer/temp/watch");
        router.dispatch("beer/temp/watch", b"18.0");

        // Brightness-only message: value unchanged, render still issued.
        let actions = router.dispatch(TOPIC_DISPLAY_BRIGHTNESS, b"3");
        assert_eq!(
            actions,
            vec![
                RouterAction::SetBrightness(Brightness::Level(3)),
                RouterAction::Render(1_800),
            ]
        );
    }

    #[test]
    fn watched_topic_may_alias_a_command_topic() {
        let mut router = router();
        router.dispatch(
            TOPIC_DISPLAY_TOPIC_UPDATE,
            TOPIC_DISPLAY_BRIGHTNESS.as_bytes(),
        );

        // Both clauses fire: brightness is applied and the payload is also
        // parsed as the watched value (coercing to 0 here).
        let actions = router.dispatch(TOPIC_DISPLAY_BRIGHTNESS, b"5");
        assert_eq!(router.display().brightness, Brightness::Level(5));
        assert_eq!(
            actions,
            vec![
                RouterAction::SetBrightness(Brightness::Level(5)),
                RouterAction::Render(500),
            ]
        );
    }
}
