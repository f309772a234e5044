pub const TOPIC_TEMP_READING: &str = "beer/temp/reading";

pub const TOPIC_DISPLAY_WILDCARD: &str = "beer/display/#";
pub const TOPIC_DISPLAY_BRIGHTNESS: &str = "beer/display/brightness";
pub const TOPIC_DISPLAY_TOPIC_UPDATE: &str = "beer/display/topic";
