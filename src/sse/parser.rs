//! Frame parsing: raw frame text to `(event_type, data)`.
//!
//! The backend has emitted two incompatible framing conventions over
//! its lifetime. The current one is plain SSE:
//!
//! ```text
//! event: progress
//! data: {"type":"progress",...}
//! ```
//!
//! The legacy gateway double-wrapped both lines in a `data:` prefix:
//!
//! ```text
//! data: event: progress
//! data: data: {"type":"progress",...}
//! ```
//!
//! Both are accepted here without configuration, double-wrapped first
//! so a legacy line is never mistaken for a plain data payload.
//! Comment lines (`:`-prefixed) and anything else are noise.

use super::frame::Frame;

/// Extract the event type and data payload from one frame.
///
/// The first line matching an event form sets the event type; the
/// first line matching a data form (that is not itself an event form)
/// sets the data. A frame with no data line yields an empty string.
pub fn parse_frame(frame: &Frame) -> (String, String) {
    let mut event_type: Option<String> = None;
    let mut data: Option<String> = None;

    for line in frame.as_str().lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        // Legacy double-wrapped forms take priority: a `data: event: x`
        // line is an event declaration, never a payload.
        if let Some(rest) = strip_prefix_loose(line, "data:") {
            if let Some(inner) = strip_prefix_loose(rest, "event:") {
                if event_type.is_none() {
                    event_type = Some(inner.to_string());
                }
                continue;
            }
            if let Some(inner) = strip_prefix_loose(rest, "data:") {
                if data.is_none() {
                    data = Some(inner.to_string());
                }
                continue;
            }
            if data.is_none() {
                data = Some(rest.to_string());
            }
            continue;
        }

        if let Some(rest) = strip_prefix_loose(line, "event:") {
            if event_type.is_none() {
                event_type = Some(rest.to_string());
            }
            continue;
        }

        // Lines matching no known prefix are ignored.
    }

    (event_type.unwrap_or_default(), data.unwrap_or_default())
}

/// Strip a field prefix, tolerating the optional space after the colon.
fn strip_prefix_loose<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix).map(|rest| rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (String, String) {
        parse_frame(&Frame(text.to_string()))
    }

    #[test]
    fn test_plain_convention() {
        let (event, data) = parse("event: start\ndata: {\"type\":\"start\"}");
        assert_eq!(event, "start");
        assert_eq!(data, "{\"type\":\"start\"}");
    }

    #[test]
    fn test_double_wrapped_convention() {
        let (event, data) = parse("data: event: progress\ndata: data: {\"stage\":\"plan\"}");
        assert_eq!(event, "progress");
        assert_eq!(data, "{\"stage\":\"plan\"}");
    }

    #[test]
    fn test_data_only_frame() {
        let (event, data) = parse("data: {\"type\":\"complete\"}");
        assert_eq!(event, "");
        assert_eq!(data, "{\"type\":\"complete\"}");
    }

    #[test]
    fn test_event_only_frame() {
        let (event, data) = parse("event: done");
        assert_eq!(event, "done");
        assert_eq!(data, "");
    }

    #[test]
    fn test_no_space_after_colon() {
        let (event, data) = parse("event:done\ndata:[DONE]");
        assert_eq!(event, "done");
        assert_eq!(data, "[DONE]");
    }

    #[test]
    fn test_double_wrapped_event_is_not_data() {
        // A lone `data: event: x` line declares the event type; it must
        // not fall through to the data slot.
        let (event, data) = parse("data: event: heartbeat");
        assert_eq!(event, "heartbeat");
        assert_eq!(data, "");
    }

    #[test]
    fn test_first_match_wins() {
        let (event, data) = parse("event: start\nevent: complete\ndata: one\ndata: two");
        assert_eq!(event, "start");
        assert_eq!(data, "one");
    }

    #[test]
    fn test_double_wrapped_wins_over_plain_data() {
        let (event, data) = parse("data: data: inner\ndata: outer");
        assert_eq!(event, "");
        assert_eq!(data, "inner");
    }

    #[test]
    fn test_comments_and_noise_ignored() {
        let (event, data) = parse(": keep-alive\nretry: 3000\nevent: start\ndata: {}");
        assert_eq!(event, "start");
        assert_eq!(data, "{}");
    }

    #[test]
    fn test_mixed_conventions_in_one_frame() {
        // Seen in the wild during the gateway migration: the event line
        // double-wrapped, the data line plain.
        let (event, data) = parse("data: event: result\ndata: {\"data\":42}");
        assert_eq!(event, "result");
        assert_eq!(data, "{\"data\":42}");
    }

    #[test]
    fn test_crlf_lines() {
        let (event, data) = parse("event: start\r\ndata: {}\r");
        assert_eq!(event, "start");
        assert_eq!(data, "{}");
    }

    #[test]
    fn test_empty_frame() {
        let (event, data) = parse("");
        assert_eq!(event, "");
        assert_eq!(data, "");
    }
}
