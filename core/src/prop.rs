//! # Prop: Descriptor Builder DSL
//!
//! Every page property is described once, at schema-definition time, by a
//! [`PropDescriptor`]. Descriptors are produced by the [`Prop`] builder:
//!
//! ```rust,ignore
//! let title = Prop::plain().build()?;
//! let stats = Prop::plain().optional().build()?;
//! let feed = Prop::merge().prepend().match_on("id").scroll().build()?;
//! let plans = Prop::plain().once().deferred_in("billing").build()?;
//! ```
//!
//! Modifiers are plain field sets, so calling one twice is harmless. Visibility
//! conflicts (`optional` with `always`) are rejected by [`Prop::build`] instead
//! of being settled by call order.

use chrono::{DateTime, Utc};

use crate::error::SchemaError;

/// Group name used by [`Prop::deferred`].
pub const DEFAULT_DEFERRED_GROUP: &str = "default";

/// Query parameter name used by [`Prop::scroll`].
pub const DEFAULT_PAGE_NAME: &str = "page";

/// Primary behavior of a prop, derived from its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Plain,
    Once,
    Deferred,
    Merge,
    DeepMerge,
}

/// Whether a prop is sent by default, only on request, or always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Default,
    Optional,
    Always,
}

/// Direction new elements are combined with the client's existing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeDirection {
    #[default]
    Append,
    Prepend,
}

impl MergeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeDirection::Append => "append",
            MergeDirection::Prepend => "prepend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    #[default]
    Shallow,
    Deep,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOptions {
    pub strategy: MergeStrategy,
    pub direction: MergeDirection,
    /// Dotted path identifying an element, e.g. `id` or `author.id`.
    pub match_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnceOptions {
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollOptions {
    pub page_name: String,
}

/// Immutable description of how one prop is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropDescriptor {
    visibility: Visibility,
    deferred_group: Option<String>,
    once: Option<OnceOptions>,
    merge: Option<MergeOptions>,
    scroll: Option<ScrollOptions>,
}

impl PropDescriptor {
    /// Descriptor of a bare value with no modifiers.
    pub fn plain() -> Self {
        Self {
            visibility: Visibility::Default,
            deferred_group: None,
            once: None,
            merge: None,
            scroll: None,
        }
    }

    /// Plain value sent on every response.
    pub fn always() -> Self {
        Self {
            visibility: Visibility::Always,
            ..Self::plain()
        }
    }

    pub fn kind(&self) -> PropKind {
        if self.deferred_group.is_some() {
            PropKind::Deferred
        } else if self.once.is_some() {
            PropKind::Once
        } else {
            match self.merge.as_ref().map(|m| m.strategy) {
                Some(MergeStrategy::Shallow) => PropKind::Merge,
                Some(MergeStrategy::Deep) => PropKind::DeepMerge,
                None => PropKind::Plain,
            }
        }
    }

    /// True for anything that may need on-demand resolution.
    pub fn is_lazy(&self) -> bool {
        self.kind() != PropKind::Plain || self.visibility != Visibility::Default
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_optional(&self) -> bool {
        self.visibility == Visibility::Optional
    }

    pub fn is_always(&self) -> bool {
        self.visibility == Visibility::Always
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred_group.is_some()
    }

    pub fn deferred_group(&self) -> Option<&str> {
        self.deferred_group.as_deref()
    }

    pub fn is_once(&self) -> bool {
        self.once.is_some()
    }

    pub fn is_deferred_once(&self) -> bool {
        self.is_once() && self.is_deferred()
    }

    pub fn once_options(&self) -> Option<&OnceOptions> {
        self.once.as_ref()
    }

    pub fn merge_options(&self) -> Option<&MergeOptions> {
        self.merge.as_ref()
    }

    pub fn scroll_options(&self) -> Option<&ScrollOptions> {
        self.scroll.as_ref()
    }
}

/// Builder for [`PropDescriptor`].
#[derive(Debug, Clone, Default)]
pub struct Prop {
    optional: bool,
    always: bool,
    deferred_group: Option<String>,
    once: Option<OnceOptions>,
    merge: Option<MergeOptions>,
    scroll: Option<ScrollOptions>,
    // Merge-only modifiers requested on a builder that has no merge options.
    stray_merge_modifier: Option<&'static str>,
}

impl Prop {
    /// A prop sent on every visit unless a partial reload filters it out.
    pub fn plain() -> Self {
        Self::default()
    }

    /// An array prop appended to what the client already holds.
    pub fn merge() -> Self {
        Self {
            merge: Some(MergeOptions::default()),
            ..Self::default()
        }
    }

    /// A nested prop merged recursively into the client's value.
    pub fn deep_merge() -> Self {
        Self {
            merge: Some(MergeOptions {
                strategy: MergeStrategy::Deep,
                ..MergeOptions::default()
            }),
            ..Self::default()
        }
    }

    /// Sent only when a partial reload names it.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Sent on every response, partial reload filters notwithstanding.
    pub fn always(mut self) -> Self {
        self.always = true;
        self
    }

    pub fn deferred(self) -> Self {
        self.deferred_in(DEFAULT_DEFERRED_GROUP)
    }

    /// Never sent on the first visit; the client fetches `group` afterwards.
    pub fn deferred_in(mut self, group: impl Into<String>) -> Self {
        self.deferred_group = Some(group.into());
        self
    }

    /// Cached by the client, which reports it back through the except-once header.
    pub fn once(mut self) -> Self {
        self.once.get_or_insert(OnceOptions { expires_at: None });
        self
    }

    pub fn once_until(mut self, expires_at: DateTime<Utc>) -> Self {
        self.once = Some(OnceOptions {
            expires_at: Some(expires_at),
        });
        self
    }

    pub fn append(self) -> Self {
        self.with_merge("append", |m| m.direction = MergeDirection::Append)
    }

    pub fn prepend(self) -> Self {
        self.with_merge("prepend", |m| m.direction = MergeDirection::Prepend)
    }

    pub fn match_on(self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.with_merge("match_on", move |m| m.match_on = Some(path))
    }

    pub fn scroll(self) -> Self {
        self.scroll_with(DEFAULT_PAGE_NAME)
    }

    /// Attaches pagination metadata read from the `page_name` query parameter.
    pub fn scroll_with(mut self, page_name: impl Into<String>) -> Self {
        if self.merge.is_none() {
            self.stray_merge_modifier.get_or_insert("scroll");
        } else {
            self.scroll = Some(ScrollOptions {
                page_name: page_name.into(),
            });
        }
        self
    }

    fn with_merge(mut self, modifier: &'static str, f: impl FnOnce(&mut MergeOptions)) -> Self {
        match self.merge.as_mut() {
            Some(merge) => f(merge),
            None => {
                self.stray_merge_modifier.get_or_insert(modifier);
            }
        }
        self
    }

    pub fn build(self) -> Result<PropDescriptor, SchemaError> {
        if let Some(modifier) = self.stray_merge_modifier {
            return Err(SchemaError::NotMergeable(modifier));
        }
        let visibility = match (self.optional, self.always) {
            (true, true) => return Err(SchemaError::OptionalAndAlways),
            (true, false) => Visibility::Optional,
            (false, true) => Visibility::Always,
            (false, false) => Visibility::Default,
        };
        if visibility == Visibility::Always && self.deferred_group.is_some() {
            return Err(SchemaError::DeferredAndAlways);
        }

        Ok(PropDescriptor {
            visibility,
            deferred_group: self.deferred_group,
            once: self.once,
            merge: self.merge,
            scroll: self.scroll,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_plain_is_not_lazy() {
        let prop = Prop::plain().build().unwrap();
        assert_eq!(prop.kind(), PropKind::Plain);
        assert!(!prop.is_lazy());
        assert!(!prop.is_optional());
        assert!(!prop.is_always());
        assert_eq!(PropDescriptor::plain(), prop);
        assert!(PropDescriptor::always().is_always());
    }

    #[test]
    fn test_modifiers_make_props_lazy() {
        assert!(Prop::plain().optional().build().unwrap().is_lazy());
        assert!(Prop::plain().always().build().unwrap().is_lazy());
        assert!(Prop::plain().deferred().build().unwrap().is_lazy());
        assert!(Prop::merge().build().unwrap().is_lazy());
    }

    #[test]
    fn test_deferred_defaults_to_default_group() {
        let prop = Prop::plain().deferred().build().unwrap();
        assert_eq!(prop.kind(), PropKind::Deferred);
        assert_eq!(prop.deferred_group(), Some("default"));

        let grouped = Prop::plain().deferred_in("sidebar").build().unwrap();
        assert_eq!(grouped.deferred_group(), Some("sidebar"));
    }

    #[test]
    fn test_once_then_deferred_is_deferred_once() {
        let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let prop = Prop::plain()
            .once_until(expires)
            .deferred()
            .build()
            .unwrap();
        assert!(prop.is_deferred_once());
        assert_eq!(prop.kind(), PropKind::Deferred);
        assert_eq!(prop.once_options().unwrap().expires_at, Some(expires));
    }

    #[test]
    fn test_once_keeps_earlier_expiry() {
        let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let prop = Prop::plain().once_until(expires).once().build().unwrap();
        assert_eq!(prop.once_options().unwrap().expires_at, Some(expires));
    }

    #[test]
    fn test_merge_defaults_to_append() {
        let prop = Prop::merge().build().unwrap();
        assert_eq!(prop.kind(), PropKind::Merge);
        let merge = prop.merge_options().unwrap();
        assert_eq!(merge.direction, MergeDirection::Append);
        assert_eq!(merge.strategy, MergeStrategy::Shallow);
    }

    #[test]
    fn test_merge_modifiers_are_order_independent() {
        let a = Prop::merge().prepend().match_on("id").scroll().build().unwrap();
        let b = Prop::merge().scroll().match_on("id").prepend().build().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.scroll_options().unwrap().page_name, "page");
        assert_eq!(a.merge_options().unwrap().match_on.as_deref(), Some("id"));
    }

    #[test]
    fn test_deep_merge_kind() {
        let prop = Prop::deep_merge().build().unwrap();
        assert_eq!(prop.kind(), PropKind::DeepMerge);
    }

    #[test]
    fn test_optional_and_always_is_rejected() {
        let err = Prop::plain().optional().always().build().unwrap_err();
        assert!(matches!(err, SchemaError::OptionalAndAlways));

        let err = Prop::plain().always().optional().build().unwrap_err();
        assert!(matches!(err, SchemaError::OptionalAndAlways));
    }

    #[test]
    fn test_deferred_and_always_is_rejected() {
        let err = Prop::plain().always().deferred().build().unwrap_err();
        assert!(matches!(err, SchemaError::DeferredAndAlways));
    }

    #[test]
    fn test_merge_modifier_on_plain_is_rejected() {
        let err = Prop::plain().prepend().build().unwrap_err();
        assert!(matches!(err, SchemaError::NotMergeable("prepend")));

        let err = Prop::plain().scroll().build().unwrap_err();
        assert!(matches!(err, SchemaError::NotMergeable("scroll")));
    }
}
