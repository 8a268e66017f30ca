//! Stylesheet registry and cascade.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;

use super::custom_properties::{self, CustomProperties, PropertyTable};
use super::entry::{StylesheetEntry, StylesheetSource};
use super::origin::StyleOrigin;
use crate::Result;
use crate::config::CascadeConfig;
use crate::function::{DefaultUnitConverter, FunctionProcessor, UnitConverter};
use crate::logging::targets;
use crate::model::SelectorModel;
use crate::parser::parse_declaration_list;
use crate::rules::{Declaration, Stylesheet};
use crate::selector::Specificity;

/// Stylesheets of one origin and their memoized custom properties.
#[derive(Default)]
struct OriginSheets {
    entries: Vec<Arc<StylesheetEntry>>,
    custom_properties: Mutex<Option<Arc<PropertyTable>>>,
}

impl OriginSheets {
    fn invalidate(&mut self) {
        *self.custom_properties.get_mut() = None;
    }
}

/// Holds the stylesheets of every origin and applies them to elements.
///
/// Values are written through the model's
/// [`set_style_value`](SelectorModel::set_style_value). Origins are applied
/// from lowest to highest precedence and, within an origin, declarations
/// from lowest to highest specificity, so the last write for a property is
/// the winning one.
///
/// # Example
///
/// ```ignore
/// let mut manager = StylesheetManager::new(document);
/// manager.add_stylesheet(StyleOrigin::UserAgent, "div { display: block }");
/// manager.add_stylesheet(StyleOrigin::Author, Path::new("styles/app.css"));
///
/// manager.apply_to(&root)?;
/// ```
pub struct StylesheetManager<M: SelectorModel> {
    model: M,
    config: CascadeConfig,
    converter: Arc<dyn UnitConverter>,
    origins: [OriginSheets; 4],
}

impl<M: SelectorModel> StylesheetManager<M> {
    /// Create a manager with the default configuration.
    pub fn new(model: M) -> Self {
        Self::with_config(model, CascadeConfig::default())
    }

    /// Create a manager with a custom configuration.
    pub fn with_config(model: M, config: CascadeConfig) -> Self {
        let converter = Arc::new(DefaultUnitConverter::new(config.processor.units.clone()));
        Self {
            model,
            config,
            converter,
            origins: Default::default(),
        }
    }

    /// Replace the unit converter used by `calc()` and `attr()`.
    pub fn with_unit_converter(mut self, converter: Arc<dyn UnitConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// The element model.
    pub fn model(&self) -> &M {
        &self.model
    }

    fn sheets(&self, origin: StyleOrigin) -> &OriginSheets {
        &self.origins[origin as usize]
    }

    fn sheets_mut(&mut self, origin: StyleOrigin) -> &mut OriginSheets {
        &mut self.origins[origin as usize]
    }

    /// Append a stylesheet to an origin.
    ///
    /// The source is loaded on first use or by [`preload`](Self::preload).
    /// Stylesheets of [`StyleOrigin::User`] are kept but never cascaded.
    pub fn add_stylesheet(
        &mut self,
        origin: StyleOrigin,
        source: impl Into<StylesheetSource>,
    ) -> Arc<StylesheetEntry> {
        let entry = Arc::new(StylesheetEntry::new(source));
        tracing::debug!(
            target: targets::STYLESHEET,
            %origin,
            source = %entry.source(),
            "adding stylesheet"
        );
        let sheets = self.sheets_mut(origin);
        sheets.entries.push(Arc::clone(&entry));
        sheets.invalidate();
        entry
    }

    /// Replace all stylesheets of an origin.
    pub fn set_stylesheets<I>(&mut self, origin: StyleOrigin, sources: I)
    where
        I: IntoIterator,
        I::Item: Into<StylesheetSource>,
    {
        let sheets = self.sheets_mut(origin);
        sheets.entries = sources
            .into_iter()
            .map(|source| Arc::new(StylesheetEntry::new(source)))
            .collect();
        sheets.invalidate();
    }

    /// Remove the stylesheets of one origin, or of all origins with `None`.
    pub fn clear_stylesheets(&mut self, origin: Option<StyleOrigin>) {
        match origin {
            Some(origin) => {
                let sheets = self.sheets_mut(origin);
                sheets.entries.clear();
                sheets.invalidate();
            }
            None => {
                for sheets in &mut self.origins {
                    sheets.entries.clear();
                    sheets.invalidate();
                }
            }
        }
    }

    /// The stylesheet entries of an origin, in order.
    pub fn stylesheets(&self, origin: StyleOrigin) -> &[Arc<StylesheetEntry>] {
        &self.sheets(origin).entries
    }

    /// Load every pending stylesheet in parallel.
    pub fn preload(&self) {
        self.origins
            .par_iter()
            .flat_map(|sheets| sheets.entries.par_iter())
            .for_each(|entry| entry.resolve());
    }

    /// Reload every file-backed stylesheet reading `path`.
    ///
    /// Returns true if any stylesheet uses the path.
    pub fn reload_path(&mut self, path: &Path) -> bool {
        let mut found = false;
        for sheets in &mut self.origins {
            let mut changed = false;
            for entry in &mut sheets.entries {
                if same_file(entry.source(), path) {
                    *entry = Arc::new(StylesheetEntry::new(entry.source().clone()));
                    changed = true;
                }
            }
            if changed {
                sheets.invalidate();
                found = true;
            }
        }
        if found {
            tracing::debug!(target: targets::STYLESHEET, path = %path.display(), "reloading stylesheet");
        }
        found
    }

    /// Drop every file-backed stylesheet reading `path`.
    ///
    /// Returns true if any stylesheet was removed.
    pub fn remove_path(&mut self, path: &Path) -> bool {
        let mut found = false;
        for sheets in &mut self.origins {
            let before = sheets.entries.len();
            sheets.entries.retain(|entry| !same_file(entry.source(), path));
            if sheets.entries.len() != before {
                sheets.invalidate();
                found = true;
            }
        }
        found
    }

    /// Custom properties declared by an origin's stylesheets.
    ///
    /// Computed on first use and kept until the origin's list changes.
    pub fn custom_properties(&self, origin: StyleOrigin) -> Arc<PropertyTable> {
        let sheets = self.sheets(origin);
        let mut cached = sheets.custom_properties.lock();
        if let Some(table) = cached.as_ref() {
            return Arc::clone(table);
        }
        let loaded: Vec<Arc<Stylesheet>> =
            sheets.entries.iter().filter_map(|entry| entry.stylesheet()).collect();
        let table = Arc::new(custom_properties::collect_stylesheets(
            loaded.iter().map(Arc::as_ref),
        ));
        // An interrupted entry shows up once it loads.
        if sheets.entries.iter().all(|entry| entry.is_resolved()) {
            *cached = Some(Arc::clone(&table));
        }
        table
    }

    /// Lookup order for `var()`: the element's own layer, then Inline,
    /// Author and UserAgent.
    fn variables(&self, element_layer: Option<Arc<PropertyTable>>) -> CustomProperties {
        self.variables_with(element_layer, None)
    }

    /// Like [`variables`](Self::variables), with an extra layer placed in
    /// front of the given origin's own.
    fn variables_with(
        &self,
        element_layer: Option<Arc<PropertyTable>>,
        extra: Option<(StyleOrigin, Arc<PropertyTable>)>,
    ) -> CustomProperties {
        let mut variables = CustomProperties::new();
        if let Some(layer) = element_layer {
            variables.push(layer);
        }
        let mut extra = extra;
        for origin in StyleOrigin::CASCADED.into_iter().rev() {
            if let Some((_, layer)) = extra.take_if(|(at, _)| *at >= origin) {
                variables.push(layer);
            }
            variables.push(self.custom_properties(origin));
        }
        variables
    }

    /// Declarations of an origin that apply to `element`, sorted from lowest
    /// to highest specificity. Source order is kept for equal specificity.
    pub fn applicable_declarations(
        &self,
        origin: StyleOrigin,
        element: &M::Element,
    ) -> Vec<(Specificity, Declaration)> {
        let loaded: Vec<Arc<Stylesheet>> = self
            .sheets(origin)
            .entries
            .iter()
            .filter_map(|entry| entry.stylesheet())
            .collect();
        matching_declarations(&self.model, loaded.iter().map(Arc::as_ref), element)
            .into_iter()
            .map(|(specificity, declaration)| (specificity, declaration.clone()))
            .collect()
    }

    /// Run the cascade for one element.
    ///
    /// Clears the values written by earlier runs, applies the UserAgent,
    /// Author and Inline stylesheets in that order and finally the element's
    /// `style` attribute. With
    /// [`suppress_errors`](CascadeConfig::suppress_errors) off, the first
    /// function error aborts the run.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn apply_to(&self, element: &M::Element) -> Result<()> {
        self.model.reset_style_values(element);

        let style_attribute = if self.config.apply_style_attribute {
            self.model.style_attribute(element).map(|css| {
                let (declarations, errors) = parse_declaration_list(&css);
                if !errors.is_empty() {
                    tracing::debug!(
                        target: targets::CASCADE,
                        errors = errors.len(),
                        "ignoring malformed style attribute declarations"
                    );
                }
                declarations
            })
        } else {
            None
        };

        let element_layer = style_attribute
            .as_deref()
            .map(|declarations| Arc::new(custom_properties::collect(declarations)))
            .filter(|layer| !layer.is_empty());
        let variables = self.variables(element_layer);
        let processor = FunctionProcessor::new(
            &self.model,
            &variables,
            &self.config.processor,
            self.converter.as_ref(),
        );
        let suppress = self.config.suppress_errors;

        for origin in StyleOrigin::CASCADED {
            let loaded: Vec<Arc<Stylesheet>> = self
                .sheets(origin)
                .entries
                .iter()
                .filter_map(|entry| entry.stylesheet())
                .collect();
            let matched = matching_declarations(&self.model, loaded.iter().map(Arc::as_ref), element);
            tracing::trace!(target: targets::CASCADE, %origin, declarations = matched.len(), "cascading");
            for (_, declaration) in matched {
                self.apply_declaration(&processor, origin, element, declaration, suppress)?;
            }
        }

        for declaration in style_attribute.iter().flatten() {
            self.apply_declaration(&processor, StyleOrigin::Inline, element, declaration, suppress)?;
        }
        Ok(())
    }

    /// Apply one stylesheet to an element with the given origin.
    ///
    /// Values already on the element are not reset. `var()` sees the
    /// stylesheet's own custom properties ahead of the registered ones of
    /// the same origin. Returns true if at least one value was written.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn apply(
        &self,
        origin: StyleOrigin,
        stylesheet: &Stylesheet,
        element: &M::Element,
        suppress_errors: bool,
    ) -> Result<bool> {
        let own = Arc::new(custom_properties::collect_stylesheets([stylesheet]));
        let variables = self.variables_with(None, Some((origin, own)));
        let processor = FunctionProcessor::new(
            &self.model,
            &variables,
            &self.config.processor,
            self.converter.as_ref(),
        );
        let mut applied = false;
        for (_, declaration) in matching_declarations(&self.model, [stylesheet], element) {
            applied |= self.apply_declaration(&processor, origin, element, declaration, suppress_errors)?;
        }
        Ok(applied)
    }

    fn apply_declaration(
        &self,
        processor: &FunctionProcessor<'_, M>,
        origin: StyleOrigin,
        element: &M::Element,
        declaration: &Declaration,
        suppress_errors: bool,
    ) -> Result<bool> {
        if declaration.is_empty() || declaration.is_custom_property() {
            return Ok(false);
        }
        match processor.process(element, &declaration.terms) {
            Ok(value) => {
                self.model
                    .set_style_value(element, origin, &declaration.name, Some(value));
                Ok(true)
            }
            Err(err) if suppress_errors => {
                tracing::debug!(
                    target: targets::CASCADE,
                    property = %declaration.name,
                    error = %err,
                    "skipping declaration"
                );
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl<M> StylesheetManager<M>
where
    M: SelectorModel + Sync,
    M::Element: Send + Sync,
{
    /// Run [`apply_to`](Self::apply_to) for many elements in parallel.
    pub fn apply_to_all(&self, elements: &[M::Element]) -> Result<()> {
        elements
            .par_iter()
            .try_for_each(|element| self.apply_to(element))
    }
}

/// Declarations of every matching style rule, stably sorted by the
/// specificity of the matching selector.
fn matching_declarations<'s, M: SelectorModel + ?Sized>(
    model: &M,
    stylesheets: impl IntoIterator<Item = &'s Stylesheet>,
    element: &M::Element,
) -> Vec<(Specificity, &'s Declaration)> {
    let mut matched = vec![];
    for stylesheet in stylesheets {
        for rule in stylesheet.style_rules() {
            if let Some(selector) = rule.selector_group.match_selector(model, element) {
                let specificity = selector.specificity();
                matched.extend(rule.declarations.iter().map(|decl| (specificity, decl)));
            }
        }
    }
    matched.sort_by_key(|(specificity, _)| *specificity);
    matched
}

fn same_file(source: &StylesheetSource, path: &Path) -> bool {
    let Some(own) = source.file_path() else {
        return false;
    };
    if own == path {
        return true;
    }
    match (own.canonicalize(), path.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
