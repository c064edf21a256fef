use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::poll::PollMsg;
use crate::rotator::{DisplayFrame, DisplayOptions, Rotator};

pub struct App {
    /// Cursor over the latest feed.
    rotator: Rotator,
    /// What the UI draws until the next rotation.
    pub frame: DisplayFrame,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Whether the user has asked for an immediate poll.
    pub refresh_requested: bool,
    /// Last poll status message.
    pub status: String,
}

impl App {
    pub fn new(options: DisplayOptions) -> Self {
        Self {
            rotator: Rotator::new(options),
            frame: DisplayFrame::loading(),
            quit: false,
            refresh_requested: false,
            status: "Starting…".into(),
        }
    }

    /// Apply one message from the poller.
    ///
    /// A new feed replaces the snapshot and rotates straight away so the
    /// first message appears without waiting a full UI interval.  A failure
    /// only refreshes the banner on the current frame.
    pub fn handle_poll_msg(&mut self, msg: PollMsg, now: DateTime<Utc>) {
        match msg {
            PollMsg::NewFeed(items) => {
                self.rotator.replace_snapshot(items);
                self.rotate(now);
            }
            PollMsg::ServiceFailure(failure) => {
                warn!(status = ?failure.status_code, "service failure: {}", failure.message);
                self.status = format!("Service failure: {failure}");
                self.rotator.record_failure(failure);
                self.frame = self.rotator.with_current_failure(self.frame.clone());
            }
            PollMsg::Log(line) => {
                info!("{line}");
                self.status = line;
            }
        }
    }

    /// Advance to the next message.
    pub fn rotate(&mut self, now: DateTime<Utc>) {
        self.frame = self.rotator.tick(now);
    }

    /// Number of messages in the current feed.
    pub fn message_count(&self) -> usize {
        self.rotator.snapshot_len()
    }

    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
        self.status = "Refreshing…".into();
    }

    /// Take the pending refresh request, if any.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotator::Content;
    use crate::source::{FailureDetail, FeedItem};
    use chrono::TimeZone;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn make_item(id: &str) -> FeedItem {
        FeedItem {
            identifier: id.to_string(),
            headline: format!("Headline {id}"),
            preamble: Some("Preamble".to_string()),
            published: Some(now()),
            updated: Some(now()),
            sender_name: None,
            areas: vec![],
        }
    }

    fn current_headline(app: &App) -> Option<&str> {
        match &app.frame.content {
            Content::Item(item) => Some(item.headline.as_str()),
            _ => None,
        }
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_is_loading() {
        let app = App::new(DisplayOptions::default());
        assert_eq!(app.frame.content, Content::Loading);
        assert!(!app.frame.loaded);
        assert!(!app.quit);
        assert_eq!(app.message_count(), 0);
    }

    // -- poll messages -------------------------------------------------------

    #[test]
    fn new_feed_shows_first_item_immediately() {
        let mut app = App::new(DisplayOptions::default());
        app.handle_poll_msg(PollMsg::NewFeed(vec![make_item("a"), make_item("b")]), now());

        assert!(app.frame.loaded);
        assert_eq!(current_headline(&app), Some("Headline a"));
        assert_eq!(app.message_count(), 2);

        app.rotate(now());
        assert_eq!(current_headline(&app), Some("Headline b"));
    }

    #[test]
    fn failure_is_additive() {
        let mut app = App::new(DisplayOptions::default());
        app.handle_poll_msg(PollMsg::NewFeed(vec![make_item("a"), make_item("b")]), now());
        app.handle_poll_msg(
            PollMsg::ServiceFailure(FailureDetail::new(Some(503), "HTTP error: Service Unavailable")),
            now(),
        );

        assert_eq!(current_headline(&app), Some("Headline a"), "content stays");
        assert_eq!(app.frame.failure.as_ref().unwrap().status_code, Some(503));
        assert!(app.status.contains("503"));

        // Rotation continues through the failure.
        app.rotate(now());
        assert_eq!(current_headline(&app), Some("Headline b"));
        assert!(app.frame.failure.is_some());

        // The next good poll clears it.
        app.handle_poll_msg(PollMsg::NewFeed(vec![make_item("c")]), now());
        assert!(app.frame.failure.is_none());
    }

    #[test]
    fn empty_feed_is_not_a_failure() {
        let mut app = App::new(DisplayOptions::default());
        app.handle_poll_msg(PollMsg::NewFeed(vec![]), now());

        assert_eq!(app.frame.content, Content::NoMessages);
        assert!(app.frame.failure.is_none());
        assert!(app.frame.loaded);
    }

    #[test]
    fn log_line_becomes_status() {
        let mut app = App::new(DisplayOptions::default());
        app.handle_poll_msg(PollMsg::Log("Fetched 3 messages, 1 after filtering".into()), now());
        assert_eq!(app.status, "Fetched 3 messages, 1 after filtering");
    }

    #[test]
    fn refresh_request_is_taken_once() {
        let mut app = App::new(DisplayOptions::default());
        app.request_refresh();
        assert!(app.take_refresh_request());
        assert!(!app.take_refresh_request());
    }

    // -- rendering (smoke tests) ---------------------------------------------

    #[test]
    fn draw_does_not_panic_while_loading() {
        let app = App::new(DisplayOptions::default());
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| crate::ui::draw(&app, f, now())).unwrap();
    }

    #[test]
    fn draw_does_not_panic_on_tiny_terminal() {
        let mut app = App::new(DisplayOptions::default());
        app.handle_poll_msg(PollMsg::NewFeed(vec![make_item("a")]), now());
        let backend = TestBackend::new(10, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| crate::ui::draw(&app, f, now())).unwrap();
    }
}
