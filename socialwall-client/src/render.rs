//! Turns the feed and the local state into what the front end shows.

use crate::editor::FeedEditor;
use serde::Deserialize;
use socialwall_common::{
    model::{
        Id,
        post::{MESSAGE_MAX_LEN, Post, PostMarker},
        profile::LocalProfile,
    },
    text::MessageInput,
};
use std::fmt::{self, Display};
use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

/// Grey silhouette shown for anyone without an avatar.
pub const DEFAULT_AVATAR: &str = concat!(
    "data:image/svg+xml,",
    "%3Csvg%20width%3D%22120%22%20height%3D%22120%22%20viewBox%3D%220%200%20120%20120%22",
    "%20fill%3D%22none%22%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%3E",
    "%3Ccircle%20cx%3D%2260%22%20cy%3D%2260%22%20r%3D%2260%22%20fill%3D%22%23D1D5DB%22%2F%3E",
    "%3Ccircle%20cx%3D%2260%22%20cy%3D%2245%22%20r%3D%2218%22%20fill%3D%22%236B7280%22%2F%3E",
    "%3Cpath%20d%3D%22M30%2095c0-16.569%2013.431-30%2030-30s30%2013.431%2030%2030%22",
    "%20fill%3D%22%236B7280%22%2F%3E",
    "%3C%2Fsvg%3E",
);

pub const ANONYMOUS_NAME: &str = "User";

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Which posts show the avatar stored on this device.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarPolicy {
    /// Every post, whoever wrote it.
    Device,
    /// Only posts whose author name equals the local profile's name.
    #[default]
    MatchingAuthor,
}

impl AvatarPolicy {
    #[must_use]
    pub fn avatar_for<'a>(self, post: &Post, profile: Option<&'a LocalProfile>) -> &'a str {
        profile
            .filter(|profile| match self {
                AvatarPolicy::Device => true,
                AvatarPolicy::MatchingAuthor => profile.username == post.username,
            })
            .and_then(LocalProfile::avatar)
            .unwrap_or(DEFAULT_AVATAR)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum CounterLevel {
    Normal,
    Warning,
    Critical,
}

impl CounterLevel {
    #[must_use]
    pub fn for_len(len: usize) -> Self {
        match len {
            0..=240 => CounterLevel::Normal,
            241..=260 => CounterLevel::Warning,
            _ => CounterLevel::Critical,
        }
    }
}

/// The `n/280` character counter under a text input.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Counter {
    pub len: usize,
    pub level: CounterLevel,
}

impl Counter {
    #[must_use]
    pub fn of(text: &MessageInput) -> Self {
        Self {
            len: text.len(),
            level: CounterLevel::for_len(text.len()),
        }
    }
}

impl Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{MESSAGE_MAX_LEN}", self.len)?;
        match self.level {
            CounterLevel::Normal => Ok(()),
            CounterLevel::Warning => write!(f, " (running out)"),
            CounterLevel::Critical => write!(f, " (almost full)"),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum PostBody {
    Message(String),
    Editing { text: String, counter: Counter },
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct RenderedPost {
    pub id: Id<PostMarker>,
    pub avatar_url: String,
    pub username: String,
    pub timestamp: String,
    pub body: PostBody,
    pub image_url: Option<String>,
}

impl Display for RenderedPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#{} {} ({})", self.id, self.username, self.timestamp)?;
        if self.avatar_url == DEFAULT_AVATAR {
            writeln!(f, "  avatar: default")?;
        } else {
            writeln!(f, "  avatar: {}", self.avatar_url)?;
        }
        match &self.body {
            PostBody::Message(message) => writeln!(f, "  {message}")?,
            PostBody::Editing { text, counter } => {
                writeln!(f, "  editing> {text}")?;
                writeln!(f, "  {counter}")?;
            }
        }
        if let Some(image_url) = &self.image_url {
            writeln!(f, "  image: {image_url}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum FeedView {
    Empty,
    Posts(Vec<RenderedPost>),
}

impl FeedView {
    #[must_use]
    pub fn posts(&self) -> &[RenderedPost] {
        match self {
            FeedView::Empty => &[],
            FeedView::Posts(posts) => posts,
        }
    }
}

impl Display for FeedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedView::Empty => {
                writeln!(f, "No posts yet")?;
                writeln!(f, "Be the first to share something amazing!")
            }
            FeedView::Posts(posts) => {
                for (i, post) in posts.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{post}")?;
                }
                Ok(())
            }
        }
    }
}

#[must_use]
pub fn format_timestamp(created_at: OffsetDateTime, offset: UtcOffset) -> String {
    let local = created_at.to_offset(offset);
    local
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| local.to_string())
}

#[must_use]
pub fn render_feed(
    posts: &[Post],
    editor: &FeedEditor,
    profile: Option<&LocalProfile>,
    policy: AvatarPolicy,
    offset: UtcOffset,
) -> FeedView {
    if posts.is_empty() {
        return FeedView::Empty;
    }

    let rendered = posts
        .iter()
        .map(|post| {
            let body = if editor.is_editing(post.id) {
                PostBody::Editing {
                    text: editor.buffer().as_str().to_owned(),
                    counter: Counter::of(editor.buffer()),
                }
            } else {
                PostBody::Message(post.message.clone())
            };

            RenderedPost {
                id: post.id,
                avatar_url: policy.avatar_for(post, profile).to_owned(),
                username: post.username.clone(),
                timestamp: format_timestamp(post.created_at, offset),
                body,
                image_url: post.image_url.clone(),
            }
        })
        .collect();

    FeedView::Posts(rendered)
}

/// The name and avatar shown next to the feed.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Sidebar {
    pub name: String,
    pub avatar_url: String,
}

impl Sidebar {
    #[must_use]
    pub fn new(profile: Option<&LocalProfile>) -> Self {
        let name = profile
            .map(|profile| profile.username.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_NAME);
        let avatar_url = profile
            .and_then(LocalProfile::avatar)
            .unwrap_or(DEFAULT_AVATAR);

        Self {
            name: name.to_owned(),
            avatar_url: avatar_url.to_owned(),
        }
    }
}

impl Display for Sidebar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.avatar_url == DEFAULT_AVATAR {
            write!(f, "Signed in as {}", self.name)
        } else {
            write!(f, "Signed in as {} ({})", self.name, self.avatar_url)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        editor::FeedEditor,
        render::{
            AvatarPolicy, Counter, CounterLevel, DEFAULT_AVATAR, FeedView, PostBody, Sidebar,
            format_timestamp, render_feed,
        },
    };
    use socialwall_common::{
        model::{Id, post::Post, profile::LocalProfile},
        text::MessageInput,
    };
    use time::{
        UtcOffset,
        macros::{datetime, offset},
    };

    fn post(id: i64, username: &str, message: &str) -> Post {
        Post {
            id: Id::new(id),
            username: username.to_owned(),
            message: message.to_owned(),
            image_url: None,
            created_at: datetime!(2025-03-01 12:30:05 UTC),
        }
    }

    #[test]
    fn empty_feed() {
        let view = render_feed(
            &[],
            &FeedEditor::new(),
            None,
            AvatarPolicy::default(),
            UtcOffset::UTC,
        );
        assert_eq!(view, FeedView::Empty);
        assert!(view.to_string().starts_with("No posts yet"));
    }

    #[test]
    fn counter_levels() {
        assert_eq!(CounterLevel::for_len(0), CounterLevel::Normal);
        assert_eq!(CounterLevel::for_len(240), CounterLevel::Normal);
        assert_eq!(CounterLevel::for_len(241), CounterLevel::Warning);
        assert_eq!(CounterLevel::for_len(260), CounterLevel::Warning);
        assert_eq!(CounterLevel::for_len(261), CounterLevel::Critical);
        assert_eq!(CounterLevel::for_len(280), CounterLevel::Critical);

        let text = MessageInput::from_text("hello").unwrap();
        assert_eq!(Counter::of(&text).to_string(), "5/280");
    }

    #[test]
    fn timestamps_are_local() {
        let at = datetime!(2025-03-01 23:30:05 UTC);
        assert_eq!(format_timestamp(at, UtcOffset::UTC), "2025-03-01 23:30:05");
        assert_eq!(format_timestamp(at, offset!(+2)), "2025-03-02 01:30:05");
    }

    #[test]
    fn avatar_policies() {
        let profile = LocalProfile::new("Ada", Some("http://x/ada.png".to_owned()));
        let own = post(1, "Ada", "mine");
        let other = post(2, "Grace", "theirs");

        let matching = AvatarPolicy::MatchingAuthor;
        assert_eq!(matching.avatar_for(&own, Some(&profile)), "http://x/ada.png");
        assert_eq!(matching.avatar_for(&other, Some(&profile)), DEFAULT_AVATAR);

        let device = AvatarPolicy::Device;
        assert_eq!(device.avatar_for(&other, Some(&profile)), "http://x/ada.png");
        assert_eq!(device.avatar_for(&other, None), DEFAULT_AVATAR);

        let no_avatar = LocalProfile::new("Ada", None);
        assert_eq!(device.avatar_for(&own, Some(&no_avatar)), DEFAULT_AVATAR);
    }

    #[test]
    fn edited_post_shows_buffer() {
        let posts = [post(1, "Ada", "one"), post(2, "Ada", "two")];
        let mut editor = FeedEditor::new();
        editor.start_edit(&posts[1]);
        editor.type_text("!");

        let view = render_feed(&posts, &editor, None, AvatarPolicy::Device, UtcOffset::UTC);
        let rendered = view.posts();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].body, PostBody::Message("one".to_owned()));
        assert_eq!(
            rendered[1].body,
            PostBody::Editing {
                text: "two!".to_owned(),
                counter: Counter {
                    len: 4,
                    level: CounterLevel::Normal
                },
            }
        );
        assert_eq!(rendered[1].timestamp, "2025-03-01 12:30:05");
    }

    #[test]
    fn sidebar_name() {
        assert_eq!(Sidebar::new(None).name, "User");
        assert_eq!(Sidebar::new(None).avatar_url, DEFAULT_AVATAR);

        let avatar_only = LocalProfile::new("", Some("http://x/a.png".to_owned()));
        let sidebar = Sidebar::new(Some(&avatar_only));
        assert_eq!(sidebar.name, "User");
        assert_eq!(sidebar.avatar_url, "http://x/a.png");

        let profile = LocalProfile::new("Ada", None);
        assert_eq!(Sidebar::new(Some(&profile)).to_string(), "Signed in as Ada");
    }

    #[test]
    fn avatar_policy_from_config() {
        let policy: AvatarPolicy = serde_json::from_str("\"matching_author\"").unwrap();
        assert_eq!(policy, AvatarPolicy::MatchingAuthor);
        let policy: AvatarPolicy = serde_json::from_str("\"device\"").unwrap();
        assert_eq!(policy, AvatarPolicy::Device);
    }
}
