//! End-to-end scenarios over the public `compile_sources` entry point,
//! exercising derived-artefact generation and resolution together rather
//! than unit-testing each phase in isolation.

use cdsc::{CompileOptions, compile_sources};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{Value, json};

fn compile_one(name: &str, csn: serde_json::Value) -> cdsc::Model {
    let mut sources = IndexMap::new();
    sources.insert(name.to_string(), cdsc::ingest::SourceInput::Csn(csn));
    compile_sources(sources, CompileOptions::default()).expect("compilation should succeed")
}

/// A small bookshop-style schema shared by several tests below, so the
/// literal is written once rather than duplicated per scenario.
static BOOKSHOP_FIXTURE: Lazy<Value> = Lazy::new(|| {
    json!({
        "definitions": {
            "my.bookshop.Books": {
                "kind": "entity",
                "elements": {
                    "ID": { "key": true, "type": "cds.Integer" },
                    "title": { "type": "cds.String" }
                }
            },
            "my.bookshop.Orders": {
                "kind": "entity",
                "elements": {
                    "ID": { "key": true, "type": "cds.Integer" },
                    "book": {
                        "type": "cds.Association",
                        "cardinality": { "max": 1 },
                        "target": "my.bookshop.Books"
                    },
                    "items": {
                        "type": "cds.Composition",
                        "cardinality": { "max": "*" },
                        "target": "my.bookshop.OrderItems"
                    }
                }
            },
            "my.bookshop.OrderItems": {
                "kind": "entity",
                "elements": {
                    "ID": { "key": true, "type": "cds.Integer" }
                }
            }
        }
    })
});

#[test]
fn a_composition_target_is_recorded_in_the_global_composition_target_set() {
    let model = compile_one("bookshop.csn", BOOKSHOP_FIXTURE.clone());
    let order_items_id = *model.definitions.get(&std::rc::Rc::from("my.bookshop.OrderItems")).unwrap();
    assert!(model.links.composition_targets.contains(&order_items_id));
}

#[test]
fn an_association_target_is_not_recorded_as_a_composition_target() {
    let model = compile_one("bookshop.csn", BOOKSHOP_FIXTURE.clone());
    let books_id = *model.definitions.get(&std::rc::Rc::from("my.bookshop.Books")).unwrap();
    assert!(!model.links.composition_targets.contains(&books_id));
}

#[test]
fn an_entity_with_a_key_and_localized_element_gets_a_generated_texts_entity() {
    let csn = json!({
        "definitions": {
            "my.bookshop.Books": {
                "kind": "entity",
                "elements": {
                    "ID": { "key": true, "type": "cds.Integer" },
                    "title": { "type": "cds.String", "localized": true }
                }
            }
        }
    });
    let model = compile_one("books.csn", csn);

    let texts_id = *model
        .definitions
        .get(&std::rc::Rc::from("my.bookshop.Books.texts"))
        .expect("generated texts entity should be registered under its dotted name");
    let texts = model.node(texts_id);
    assert!(texts.elements.get(&std::rc::Rc::from("locale")).is_some());
    assert!(texts.elements.get(&std::rc::Rc::from("ID")).is_some());
    assert!(texts.elements.get(&std::rc::Rc::from("title")).is_some());

    let books_id = *model.definitions.get(&std::rc::Rc::from("my.bookshop.Books")).unwrap();
    let books = model.node(books_id);
    assert!(books.elements.get(&std::rc::Rc::from("texts")).is_some());
    assert!(books.elements.get(&std::rc::Rc::from("localized")).is_some());
}

#[test]
fn an_entity_without_a_localized_element_gets_no_texts_entity() {
    let csn = json!({
        "definitions": {
            "my.bookshop.Authors": {
                "kind": "entity",
                "elements": {
                    "ID": { "key": true, "type": "cds.Integer" },
                    "name": { "type": "cds.String" }
                }
            }
        }
    });
    let model = compile_one("authors.csn", csn);
    assert!(model.definitions.get(&std::rc::Rc::from("my.bookshop.Authors.texts")).is_none());
}

#[test]
fn an_include_flattens_the_included_aspects_elements() {
    let csn = json!({
        "definitions": {
            "sap.common.Managed": {
                "kind": "aspect",
                "elements": {
                    "createdAt": { "type": "cds.Timestamp" }
                }
            },
            "my.bookshop.Orders": {
                "kind": "entity",
                "includes": ["sap.common.Managed"],
                "elements": {
                    "ID": { "key": true, "type": "cds.Integer" }
                }
            }
        }
    });
    let model = compile_one("orders.csn", csn);
    let orders_id = *model.definitions.get(&std::rc::Rc::from("my.bookshop.Orders")).unwrap();
    let orders = model.node(orders_id);
    assert!(orders.elements.get(&std::rc::Rc::from("createdAt")).is_some());
}

#[test]
fn an_undefined_type_reference_is_reported_as_ref_undefined() {
    let csn = json!({
        "definitions": {
            "my.bookshop.Books": {
                "kind": "entity",
                "elements": {
                    "currency": { "type": "my.bookshop.DoesNotExist" }
                }
            }
        }
    });
    let mut options = CompileOptions::default();
    options.test_mode = true;
    let mut sources = IndexMap::new();
    sources.insert("books.csn".to_string(), cdsc::ingest::SourceInput::Csn(csn));
    let model = compile_sources(sources, options).expect("test_mode tolerates fatal diagnostics");
    let books_id = *model.definitions.get(&std::rc::Rc::from("my.bookshop.Books")).unwrap();
    let currency_id = *model.node(books_id).elements.get(&std::rc::Rc::from("currency")).unwrap();
    let pr = match model.node(currency_id).type_ref {
        Some(cdsc::model::TypeRef::Type(pr)) => pr,
        _ => panic!("expected a type reference"),
    };
    assert!(model.pathrefs.get(pr).error);
}

#[test]
fn a_builtin_scalar_type_resolves_without_a_ref_undefined_diagnostic() {
    let csn = json!({
        "definitions": {
            "my.bookshop.Books": {
                "kind": "entity",
                "elements": {
                    "ID": { "key": true, "type": "cds.UUID" }
                }
            }
        }
    });
    let model = compile_one("books.csn", csn);
    let books_id = *model.definitions.get(&std::rc::Rc::from("my.bookshop.Books")).unwrap();
    let id_elem = *model.node(books_id).elements.get(&std::rc::Rc::from("ID")).unwrap();
    let pr = match model.node(id_elem).type_ref {
        Some(cdsc::model::TypeRef::Type(pr)) => pr,
        _ => panic!("expected a type reference"),
    };
    assert!(!model.pathrefs.get(pr).error);
    assert!(model.pathrefs.get(pr).art.is_none());
}
