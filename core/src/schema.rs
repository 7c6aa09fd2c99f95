use std::sync::Arc;

use crate::error::SchemaError;
use crate::prop::{Prop, PropDescriptor};

/// Ordered prop declarations of one page type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSchema {
    props: Vec<(String, PropDescriptor)>,
}

impl PageSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema holding exactly one prop.
    pub fn with_prop(name: impl Into<String>, descriptor: PropDescriptor) -> Self {
        Self {
            props: vec![(name.into(), descriptor)],
        }
    }

    /// Adds a prop, rejecting a name that is already declared.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: PropDescriptor) -> Result<(), SchemaError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(SchemaError::DuplicateProp(name));
        }
        self.props.push((name, descriptor));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PropDescriptor> {
        self.props
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, descriptor)| descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropDescriptor)> {
        self.props.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

/// A page type: component name, prop schema and the shared props it relies on.
///
/// Built once and shared for the life of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDefinition {
    component: String,
    schema: PageSchema,
    required_shared: Vec<String>,
}

impl PageDefinition {
    /// Start defining the page rendered by `component`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let dashboard = PageDefinition::builder("Dashboard")
    ///     .prop("title", Prop::plain())
    ///     .prop("stats", Prop::plain().deferred())
    ///     .require_shared("auth")
    ///     .build()?;
    /// ```
    pub fn builder(component: impl Into<String>) -> PageDefinitionBuilder {
        PageDefinitionBuilder {
            component: component.into(),
            props: Vec::new(),
            required_shared: Vec::new(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn schema(&self) -> &PageSchema {
        &self.schema
    }

    pub fn required_shared(&self) -> &[String] {
        &self.required_shared
    }

    /// Wraps the definition for sharing across request handlers.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

pub struct PageDefinitionBuilder {
    component: String,
    props: Vec<(String, Prop)>,
    required_shared: Vec<String>,
}

impl PageDefinitionBuilder {
    pub fn prop(mut self, name: impl Into<String>, prop: Prop) -> Self {
        self.props.push((name.into(), prop));
        self
    }

    /// Declares a shared prop key that every render of this page must supply.
    pub fn require_shared(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.required_shared.contains(&key) {
            self.required_shared.push(key);
        }
        self
    }

    pub fn build(self) -> Result<PageDefinition, SchemaError> {
        let mut schema = PageSchema::new();
        for (name, prop) in self.props {
            schema.insert(name, prop.build()?)?;
        }
        Ok(PageDefinition {
            component: self.component,
            schema,
            required_shared: self.required_shared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_prop_seeds_one_entry() {
        let mut schema = PageSchema::with_prop("errors", PropDescriptor::always());
        assert_eq!(schema.len(), 1);
        assert!(schema.get("errors").unwrap().is_always());
        assert!(matches!(
            schema.insert("errors", PropDescriptor::plain()),
            Err(SchemaError::DuplicateProp(_))
        ));
    }

    #[test]
    fn test_builder_keeps_declaration_order() {
        let page = PageDefinition::builder("Users/Index")
            .prop("users", Prop::plain())
            .prop("filters", Prop::plain().optional())
            .prop("stats", Prop::plain().deferred())
            .build()
            .unwrap();

        let names: Vec<&str> = page.schema().iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["users", "filters", "stats"]);
        assert_eq!(page.component(), "Users/Index");
    }

    #[test]
    fn test_duplicate_prop_is_rejected() {
        let err = PageDefinition::builder("Home")
            .prop("title", Prop::plain())
            .prop("title", Prop::plain().optional())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateProp(name) if name == "title"));
    }

    #[test]
    fn test_invalid_prop_fails_the_page() {
        let err = PageDefinition::builder("Home")
            .prop("auth", Prop::plain().optional().always())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::OptionalAndAlways));
    }

    #[test]
    fn test_required_shared_is_deduplicated() {
        let page = PageDefinition::builder("Home")
            .require_shared("auth")
            .require_shared("auth")
            .require_shared("flash")
            .build()
            .unwrap();
        assert_eq!(page.required_shared(), ["auth".to_string(), "flash".to_string()]);
    }
}
