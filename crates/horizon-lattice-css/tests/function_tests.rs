//! Tests for var(), calc(), attr() and the extension functions in
//! declaration values.

mod common;

use common::Scene;
use horizon_lattice_css::prelude::*;
use horizon_lattice_css::FunctionError;
use horizon_lattice_css::resolve::CustomProperties;

fn styled(scene: Scene, element: usize, css: &str) -> StylesheetManager<Scene> {
    let mut manager = StylesheetManager::new(scene);
    manager.add_stylesheet(StyleOrigin::Author, css);
    manager.apply_to(&element).unwrap();
    manager
}

fn single_element(description: &str) -> (Scene, usize) {
    let mut scene = Scene::new();
    let el = scene.add(None, description);
    (scene, el)
}

#[test]
fn test_calc_same_unit() {
    let (scene, el) = single_element("div");
    let manager = styled(scene, el, "div { width: calc(10px - 2px) }");

    let tokens = manager.model().tokens(el, "width").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind(), TokenKind::Dimension);
    assert_eq!(tokens[0].number_value(), Some(8.0));
    assert_eq!(tokens[0].string_value(), Some("px"));
}

#[test]
fn test_calc_uses_unit_config() {
    let (scene, el) = single_element("div");
    let config = CascadeConfig::new().processor(
        ProcessorConfig::new().units(UnitConfig::new().font_size(10.0).percentage_base(400.0)),
    );
    let mut manager = StylesheetManager::with_config(scene, config);
    manager.add_stylesheet(
        StyleOrigin::Author,
        "div { a: calc(2px + 1em); b: calc(10px + 50%); c: calc(1em + 2px) }",
    );
    manager.apply_to(&el).unwrap();

    let scene = manager.model();
    assert_eq!(scene.value(el, "a").as_deref(), Some("12px"));
    assert_eq!(scene.value(el, "b").as_deref(), Some("210px"));
    assert_eq!(scene.value(el, "c").as_deref(), Some("1.2em"));
}

#[test]
fn test_calc_errors_skip_declaration() {
    let (scene, el) = single_element("div");
    let manager = styled(
        scene,
        el,
        "div { a: 1px; a: calc(1px / 0); b: calc(1px + 1s); c: calc(3 * 2) }",
    );

    let scene = manager.model();
    assert_eq!(scene.value(el, "a").as_deref(), Some("1px"));
    assert_eq!(scene.value(el, "b"), None);
    assert_eq!(scene.value(el, "c").as_deref(), Some("6"));
}

#[test]
fn test_attr_absent_without_fallback() {
    let (scene, el) = single_element("div");
    let manager = styled(scene, el, "div { content: attr(data-x) }");

    let tokens = manager.model().tokens(el, "content").unwrap();
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].same_value(&Token::ident("none")));
}

#[test]
fn test_attr_values() {
    let (mut scene, el) = single_element("div");
    scene.set_attribute(el, "data-label", "Save file");
    scene.set_attribute(el, "data-cols", "3");
    scene.set_attribute(el, "data-bad", "many");
    let manager = styled(
        scene,
        el,
        "div {
            content: attr(data-label);
            width: calc(attr(data-cols px) * 10);
            columns: attr(data-cols integer);
            order: attr(data-bad integer, 7);
            z-index: attr(data-bad integer);
            height: attr(data-missing, 5em);
        }",
    );

    let scene = manager.model();
    assert_eq!(scene.value(el, "content").as_deref(), Some("\"Save file\""));
    assert_eq!(scene.value(el, "width").as_deref(), Some("30px"));
    assert_eq!(scene.value(el, "columns").as_deref(), Some("3"));
    assert_eq!(scene.value(el, "order").as_deref(), Some("7"));
    assert_eq!(scene.value(el, "z-index"), None);
    assert_eq!(scene.value(el, "height").as_deref(), Some("5em"));
}

#[test]
fn test_var_fallback_and_nesting() {
    let (scene, el) = single_element("div");
    let manager = styled(
        scene,
        el,
        ":root { --gap: 4px; --double: calc(var(--gap) * 2) }
         div {
            margin: var(--double);
            padding: var(--missing, var(--gap));
            border: var(--missing);
         }",
    );

    let scene = manager.model();
    assert_eq!(scene.value(el, "margin").as_deref(), Some("8px"));
    assert_eq!(scene.value(el, "padding").as_deref(), Some("4px"));
    assert_eq!(scene.value(el, "border"), None);
}

#[test]
fn test_recursion_bound() {
    let (scene, el) = single_element("div");
    let manager = styled(
        scene,
        el,
        ":root { --a: var(--b); --b: var(--c); --c: var(--d); --d: 1px; --e: var(--a) }
         div { four: var(--a); five: var(--e); loop: var(--loop); }
         :root { --loop: var(--loop) }",
    );

    let scene = manager.model();
    assert_eq!(scene.value(el, "four").as_deref(), Some("1px"));
    assert_eq!(scene.value(el, "five"), None);
    assert_eq!(scene.value(el, "loop"), None);
}

#[test]
fn test_recursion_error_propagates() {
    common::init_logging();
    let (scene, el) = single_element("div");
    let mut manager =
        StylesheetManager::with_config(scene, CascadeConfig::new().suppress_errors(false));
    manager.add_stylesheet(
        StyleOrigin::Author,
        "div { width: calc(calc(calc(calc(calc(1px))))) }",
    );

    match manager.apply_to(&el) {
        Err(Error::Function(FunctionError::RecursionLimit { max_depth, .. })) => {
            assert_eq!(max_depth, 4)
        }
        other => panic!("expected recursion error, got {other:?}"),
    }
}

#[test]
fn test_extensions() {
    let (mut scene, el) = single_element("div");
    scene.set_attribute(el, "data-name", "main-menu");
    let manager = styled(
        scene,
        el,
        ":root { --prefix: \"icon-\" }
         div {
            a: concat(var(--prefix), attr(data-name));
            b: replace(attr(data-name), \"-\", \"_\");
            c: round(calc(10px / 3));
         }",
    );

    let scene = manager.model();
    assert_eq!(scene.value(el, "a").as_deref(), Some("\"icon-main-menu\""));
    assert_eq!(scene.value(el, "b").as_deref(), Some("\"main_menu\""));
    assert_eq!(scene.value(el, "c").as_deref(), Some("3px"));
}

#[test]
fn test_extensions_disabled() {
    let (scene, el) = single_element("div");
    let config = CascadeConfig::new().processor(ProcessorConfig::new().extensions(false));
    let mut manager = StylesheetManager::with_config(scene, config);
    manager.add_stylesheet(StyleOrigin::Author, "div { a: round(1.5) }");
    manager.apply_to(&el).unwrap();

    assert_eq!(manager.model().value(el, "a").as_deref(), Some("round(1.5)"));
}

#[test]
fn test_processor_directly() {
    let (mut scene, el) = single_element("div");
    scene.set_attribute(el, "data-w", "2");
    let config = ProcessorConfig::default();
    let converter = DefaultUnitConverter::new(config.units.clone());
    let variables = CustomProperties::new();
    let processor = FunctionProcessor::new(&scene, &variables, &config, &converter);

    let value = processor
        .process(&el, &tokenize("calc(attr(data-w rem) + 8px) solid"))
        .unwrap();
    assert_eq!(horizon_lattice_css::syntax::serialize_tokens(&value), "2.5rem solid");
}

#[test]
fn test_replace_capture_groups() {
    let (mut scene, el) = single_element("div");
    scene.set_attribute(el, "data-name", "main-menu");
    let config = ProcessorConfig::default();
    let converter = DefaultUnitConverter::new(config.units.clone());
    let variables = CustomProperties::new();
    let processor = FunctionProcessor::new(&scene, &variables, &config, &converter);

    let value = processor
        .process(&el, &tokenize("replace(attr(data-name), \"([a-z]+)-([a-z]+)\", \"$2-$1\")"))
        .unwrap();
    assert_eq!(value.len(), 1);
    assert_eq!(value[0].string_value(), Some("menu-main"));

    let value = processor
        .process(&el, &tokenize("replace(\"a1b22\", \"[0-9]+\", \"#\") x"))
        .unwrap();
    assert_eq!(horizon_lattice_css::syntax::serialize_tokens(&value), "\"a#b#\" x");

    assert!(matches!(
        processor.process(&el, &tokenize("replace(\"x\", \"(\", \"y\")")),
        Err(FunctionError::InvalidRegex { .. })
    ));
}

#[test]
fn test_replace_in_cascade() {
    let (mut scene, el) = single_element("div");
    scene.set_attribute(el, "data-path", "a/b/c");
    let manager = styled(
        scene,
        el,
        "div { a: replace(attr(data-path), \"/\", \".\"); b: replace(\"x\", \"[\", \"y\"); c: 1 }",
    );

    let scene = manager.model();
    assert_eq!(scene.value(el, "a").as_deref(), Some("\"a.b.c\""));
    assert_eq!(scene.value(el, "b"), None);
    assert_eq!(scene.value(el, "c").as_deref(), Some("1"));
}

#[test]
fn test_deep_calc_nesting_skips_declaration() {
    let (scene, el) = single_element("div");
    let deep = format!("calc({}1px{})", "(".repeat(50_000), ")".repeat(50_000));
    let css = format!("div {{ width: {deep}; height: calc(((1px + 1px))) }}");
    let manager = styled(scene, el, &css);

    assert_eq!(manager.model().value(el, "width"), None);
    assert_eq!(manager.model().value(el, "height").as_deref(), Some("2px"));
}

#[test]
fn test_deeply_nested_unknown_functions_are_kept() {
    let (scene, el) = single_element("div");
    let value = format!("{}var(--n){}", "f(".repeat(20_000), ")".repeat(20_000));
    let css = format!(":root {{ --n: 7 }} div {{ a: {value} }}");
    let manager = styled(scene, el, &css);

    let expected = format!("{}7{}", "f(".repeat(20_000), ")".repeat(20_000));
    assert_eq!(manager.model().value(el, "a"), Some(expected));
}
