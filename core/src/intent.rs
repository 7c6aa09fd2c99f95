use crate::prop::MergeDirection;

/// What the client told us about the visit, normalized from protocol headers.
///
/// Every field has a neutral default, so a plain browser request is simply
/// `RequestIntent::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIntent {
    pub is_protocol_request: bool,
    pub client_version: Option<String>,
    pub partial_component: Option<String>,
    pub partial_include: Vec<String>,
    pub partial_exclude: Vec<String>,
    /// Props whose client-side merge state should be reset. Carried, not acted on.
    pub reset_props: Vec<String>,
    pub error_bag: Option<String>,
    pub except_once_props: Vec<String>,
    pub scroll_merge_direction: Option<MergeDirection>,
    pub is_prefetch: bool,
}

impl RequestIntent {
    /// A partial reload only applies to the component the client is showing.
    pub fn is_partial_for(&self, component: &str) -> bool {
        self.partial_component.as_deref() == Some(component)
    }

    pub fn includes(&self, prop: &str) -> bool {
        self.partial_include.iter().any(|p| p == prop)
    }

    pub fn excludes(&self, prop: &str) -> bool {
        self.partial_exclude.iter().any(|p| p == prop)
    }

    pub fn has_once(&self, prop: &str) -> bool {
        self.except_once_props.iter().any(|p| p == prop)
    }

    /// True when the client's version is known and differs from `current`.
    pub fn version_conflicts(&self, current: &str) -> bool {
        matches!(self.client_version.as_deref(), Some(client) if client != current)
    }
}
