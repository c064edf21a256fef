//! Display rotation over the most recent feed snapshot.
//!
//! The [`Rotator`] owns the last accepted snapshot, a cursor into it and the
//! last failure.  Every UI tick it produces a [`DisplayFrame`]: a plain value
//! that a renderer can draw without knowing anything about the feed format
//! or the configuration.
//!
//! Stale items are not removed up front.  When the cursor lands on an item
//! whose published and updated timestamps are both older than the limit,
//! the cursor jumps back to 0.  If the item at 0 is itself stale, every item
//! has been cycled through and the "nothing recent" placeholder is shown.

use chrono::{DateTime, Duration, Utc};

use crate::source::{FailureDetail, FeedItem};

/// Display settings, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Include the preamble in the frame.
    pub show_description: bool,
    /// Items older than this many days are skipped.
    pub oldest_days: u32,
    /// Render nothing instead of the "no messages" placeholders.
    pub silent: bool,
    /// Include the cursor position in the frame.
    pub debug: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_description: true,
            oldest_days: 7,
            silent: false,
            debug: false,
        }
    }
}

impl DisplayOptions {
    fn max_age(&self) -> Duration {
        Duration::days(i64::from(self.oldest_days))
    }
}

/// One message, reduced to what the renderer shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub headline: String,
    /// Present only when descriptions are enabled and the item has one.
    pub preamble: Option<String>,
    pub sender_name: Option<String>,
    /// Area descriptions in feed order.
    pub areas: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    /// `(index, snapshot length)`, only in debug mode.
    pub position: Option<(usize, usize)>,
}

/// What the main panel shows this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// No feed has arrived yet.
    Loading,
    /// Show this message.
    Item(DisplayItem),
    /// The filtered feed is empty.
    NoMessages,
    /// Every message is older than the limit.
    NothingRecent { oldest_days: u32 },
    /// Show nothing (silent mode, or a stale item was skipped this tick).
    Blank,
}

/// Everything the renderer receives for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub content: Content,
    /// The latest poll failure, shown alongside the content.
    pub failure: Option<FailureDetail>,
    /// Whether any feed has been received yet.
    pub loaded: bool,
}

impl DisplayFrame {
    pub fn loading() -> Self {
        Self {
            content: Content::Loading,
            failure: None,
            loaded: false,
        }
    }
}

/// Cursor over the current snapshot.
pub struct Rotator {
    options: DisplayOptions,
    /// `None` until the first successful poll.
    snapshot: Option<Vec<FeedItem>>,
    cursor: usize,
    failure: Option<FailureDetail>,
}

impl Rotator {
    pub fn new(options: DisplayOptions) -> Self {
        Self {
            options,
            snapshot: None,
            cursor: 0,
            failure: None,
        }
    }

    /// Replace the snapshot wholesale and clear any failure.  The cursor is
    /// kept; the next tick wraps it if the new snapshot is shorter.
    pub fn replace_snapshot(&mut self, items: Vec<FeedItem>) {
        self.snapshot = Some(items);
        self.failure = None;
    }

    /// Record a poll failure.  The snapshot and cursor are untouched.
    pub fn record_failure(&mut self, failure: FailureDetail) {
        self.failure = Some(failure);
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of items in the current snapshot.
    pub fn snapshot_len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, Vec::len)
    }

    /// Advance one step and return what to show.
    pub fn tick(&mut self, now: DateTime<Utc>) -> DisplayFrame {
        let content = self.next_content(now);
        DisplayFrame {
            content,
            failure: self.failure.clone(),
            loaded: self.is_loaded(),
        }
    }

    /// `frame` with its failure refreshed, without moving the cursor.
    pub fn with_current_failure(&self, mut frame: DisplayFrame) -> DisplayFrame {
        frame.failure = self.failure.clone();
        frame.loaded = self.is_loaded();
        frame
    }

    fn next_content(&mut self, now: DateTime<Utc>) -> Content {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Content::Loading;
        };

        if self.cursor >= snapshot.len() {
            self.cursor = 0;
        }

        let Some(item) = snapshot.get(self.cursor) else {
            return self.placeholder(Content::NoMessages);
        };

        if item.is_older_than(self.options.max_age(), now) {
            let wrapped_to_start = self.cursor == 0;
            self.cursor = 0;
            return if wrapped_to_start {
                self.placeholder(Content::NothingRecent {
                    oldest_days: self.options.oldest_days,
                })
            } else {
                Content::Blank
            };
        }

        let shown = self.display_item(item, snapshot.len());
        self.cursor += 1;
        Content::Item(shown)
    }

    fn placeholder(&self, content: Content) -> Content {
        if self.options.silent {
            Content::Blank
        } else {
            content
        }
    }

    fn display_item(&self, item: &FeedItem, total: usize) -> DisplayItem {
        DisplayItem {
            headline: item.headline.clone(),
            preamble: if self.options.show_description {
                item.preamble.clone().filter(|p| !p.is_empty())
            } else {
                None
            },
            sender_name: item.sender_name.clone().filter(|s| !s.is_empty()),
            areas: item.areas.iter().map(|a| a.description.clone()).collect(),
            published: item.published,
            position: self.options.debug.then_some((self.cursor, total)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Area, AreaKind};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    fn fresh(id: &str) -> FeedItem {
        let ts = now() - Duration::hours(1);
        FeedItem {
            identifier: id.to_string(),
            headline: format!("Headline {id}"),
            preamble: Some(format!("Preamble {id}")),
            published: Some(ts),
            updated: Some(ts),
            sender_name: Some("SMHI".to_string()),
            areas: vec![Area::new(AreaKind::County, "Stockholms län")],
        }
    }

    fn stale(id: &str) -> FeedItem {
        let ts = now() - Duration::days(30);
        FeedItem {
            published: Some(ts),
            updated: Some(ts),
            ..fresh(id)
        }
    }

    fn headline(frame: &DisplayFrame) -> Option<&str> {
        match &frame.content {
            Content::Item(item) => Some(item.headline.as_str()),
            _ => None,
        }
    }

    #[test]
    fn loading_until_first_snapshot() {
        let mut rot = Rotator::new(DisplayOptions::default());
        let frame = rot.tick(now());
        assert_eq!(frame.content, Content::Loading);
        assert!(!frame.loaded);
        assert_eq!(rot.cursor(), 0);
    }

    #[test]
    fn failure_is_reported_even_while_loading() {
        let mut rot = Rotator::new(DisplayOptions::default());
        rot.record_failure(FailureDetail::new(Some(503), "HTTP error"));

        let frame = rot.tick(now());
        assert_eq!(frame.content, Content::Loading);
        assert_eq!(frame.failure.unwrap().status_code, Some(503));
    }

    #[test]
    fn n_ticks_visit_every_index_once_in_order() {
        let mut rot = Rotator::new(DisplayOptions::default());
        rot.replace_snapshot(vec![fresh("0"), fresh("1"), fresh("2"), fresh("3")]);

        let seen: Vec<String> = (0..4)
            .map(|_| headline(&rot.tick(now())).unwrap().to_string())
            .collect();
        assert_eq!(seen, ["Headline 0", "Headline 1", "Headline 2", "Headline 3"]);

        // ...and then starts over.
        assert_eq!(headline(&rot.tick(now())), Some("Headline 0"));
    }

    #[test]
    fn empty_snapshot_shows_no_messages() {
        let mut rot = Rotator::new(DisplayOptions::default());
        rot.replace_snapshot(vec![]);

        let frame = rot.tick(now());
        assert_eq!(frame.content, Content::NoMessages);
        assert!(frame.loaded);
        assert!(frame.failure.is_none(), "empty feed is not a failure");
    }

    #[test]
    fn silent_suppresses_placeholders() {
        let opts = DisplayOptions {
            silent: true,
            ..DisplayOptions::default()
        };
        let mut rot = Rotator::new(opts);

        rot.replace_snapshot(vec![]);
        assert_eq!(rot.tick(now()).content, Content::Blank);

        rot.replace_snapshot(vec![stale("a")]);
        assert_eq!(rot.tick(now()).content, Content::Blank);
    }

    #[test]
    fn all_stale_shows_nothing_recent() {
        let mut rot = Rotator::new(DisplayOptions::default());
        rot.replace_snapshot(vec![stale("a"), stale("b")]);

        for _ in 0..3 {
            assert_eq!(
                rot.tick(now()).content,
                Content::NothingRecent { oldest_days: 7 }
            );
            assert_eq!(rot.cursor(), 0);
        }
    }

    #[test]
    fn stale_item_resets_cursor_to_start() {
        let mut rot = Rotator::new(DisplayOptions::default());
        rot.replace_snapshot(vec![fresh("a"), fresh("b"), stale("c"), fresh("d")]);

        assert_eq!(headline(&rot.tick(now())), Some("Headline a"));
        assert_eq!(headline(&rot.tick(now())), Some("Headline b"));
        assert_eq!(rot.cursor(), 2);

        // Cursor lands on the stale item: nothing shown, back to the start.
        assert_eq!(rot.tick(now()).content, Content::Blank);
        assert_eq!(rot.cursor(), 0);

        // "d" is never reached behind the stale item.
        assert_eq!(headline(&rot.tick(now())), Some("Headline a"));
    }

    #[test]
    fn item_with_only_one_old_timestamp_is_shown() {
        let mut item = stale("u");
        item.updated = Some(now() - Duration::hours(2));

        let mut rot = Rotator::new(DisplayOptions::default());
        rot.replace_snapshot(vec![item]);
        assert_eq!(headline(&rot.tick(now())), Some("Headline u"));
    }

    #[test]
    fn oldest_days_is_configurable() {
        let opts = DisplayOptions {
            oldest_days: 60,
            ..DisplayOptions::default()
        };
        let mut rot = Rotator::new(opts);
        rot.replace_snapshot(vec![stale("a")]);
        assert_eq!(headline(&rot.tick(now())), Some("Headline a"));
    }

    #[test]
    fn shorter_snapshot_wraps_cursor() {
        let mut rot = Rotator::new(DisplayOptions::default());
        rot.replace_snapshot(vec![fresh("a"), fresh("b"), fresh("c")]);
        rot.tick(now());
        rot.tick(now());
        rot.tick(now());
        assert_eq!(rot.cursor(), 3);

        rot.replace_snapshot(vec![fresh("x")]);
        assert_eq!(headline(&rot.tick(now())), Some("Headline x"));
    }

    #[test]
    fn failure_keeps_content_and_success_clears_it() {
        let mut rot = Rotator::new(DisplayOptions::default());
        rot.replace_snapshot(vec![fresh("a"), fresh("b")]);
        rot.tick(now());

        rot.record_failure(FailureDetail::new(Some(503), "HTTP error"));
        assert_eq!(rot.cursor(), 1, "failure does not move the cursor");
        assert_eq!(rot.snapshot_len(), 2, "failure keeps the previous snapshot");

        let frame = rot.tick(now());
        assert_eq!(headline(&frame), Some("Headline b"));
        assert_eq!(frame.failure.as_ref().unwrap().status_code, Some(503));

        rot.replace_snapshot(vec![fresh("c")]);
        assert!(rot.tick(now()).failure.is_none());
    }

    #[test]
    fn with_current_failure_does_not_advance() {
        let mut rot = Rotator::new(DisplayOptions::default());
        rot.replace_snapshot(vec![fresh("a"), fresh("b")]);
        let frame = rot.tick(now());

        rot.record_failure(FailureDetail::new(None, "Request timed out"));
        let refreshed = rot.with_current_failure(frame.clone());

        assert_eq!(refreshed.content, frame.content);
        assert_eq!(refreshed.failure.unwrap().message, "Request timed out");
        assert_eq!(rot.cursor(), 1);
    }

    #[test]
    fn hide_description_drops_preamble() {
        let opts = DisplayOptions {
            show_description: false,
            ..DisplayOptions::default()
        };
        let mut rot = Rotator::new(opts);
        rot.replace_snapshot(vec![fresh("a")]);

        match rot.tick(now()).content {
            Content::Item(item) => {
                assert!(item.preamble.is_none());
                assert_eq!(item.areas, ["Stockholms län"]);
                assert_eq!(item.sender_name.as_deref(), Some("SMHI"));
            }
            other => panic!("expected item, got {other:?}"),
        }
    }

    #[test]
    fn empty_preamble_is_dropped() {
        let mut rot = Rotator::new(DisplayOptions::default());
        rot.replace_snapshot(vec![FeedItem {
            preamble: Some(String::new()),
            ..fresh("a")
        }]);

        match rot.tick(now()).content {
            Content::Item(item) => assert!(item.preamble.is_none()),
            other => panic!("expected item, got {other:?}"),
        }
    }

    #[test]
    fn debug_includes_position() {
        let opts = DisplayOptions {
            debug: true,
            ..DisplayOptions::default()
        };
        let mut rot = Rotator::new(opts);
        rot.replace_snapshot(vec![fresh("a"), fresh("b")]);
        rot.tick(now());

        match rot.tick(now()).content {
            Content::Item(item) => assert_eq!(item.position, Some((1, 2))),
            other => panic!("expected item, got {other:?}"),
        }
    }
}
