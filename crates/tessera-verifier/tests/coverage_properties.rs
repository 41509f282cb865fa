//! Property tests for coverage accounting.

use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;
use http::{Method, Request, Response};
use proptest::prelude::*;
use tessera_verifier::{Exchange, Verifier, VerifierConfig};

const METHODS: [&str; 8] = ["get", "head", "put", "post", "delete", "patch", "options", "trace"];
const STATUS_KEYS: [&str; 8] = ["200", "201", "204", "400", "404", "500", "2XX", "default"];

type Document = BTreeMap<String, BTreeMap<&'static str, BTreeSet<&'static str>>>;

fn document() -> impl Strategy<Value = Document> {
    let responses = prop::collection::btree_set(prop::sample::select(STATUS_KEYS.to_vec()), 1..5);
    let methods = prop::collection::btree_map(prop::sample::select(METHODS.to_vec()), responses, 1..4);
    prop::collection::btree_map("[a-z]{1,8}", methods, 1..5)
}

fn render(doc: &Document) -> String {
    let mut yaml = String::from("openapi: 3.0.3\ninfo:\n  title: Generated\n  version: \"1\"\npaths:\n");
    for (path, methods) in doc {
        yaml.push_str(&format!("  /{path}:\n"));
        for (method, keys) in methods {
            yaml.push_str(&format!("    {method}:\n      responses:\n"));
            for key in keys {
                yaml.push_str(&format!("        '{key}':\n          description: generated\n"));
            }
        }
    }
    yaml
}

fn documented(doc: &Document, include_500: bool) -> usize {
    doc.values()
        .flat_map(|methods| methods.iter())
        .filter(|(method, _)| **method != "trace")
        .flat_map(|(_, keys)| keys.iter())
        .filter(|key| include_500 || **key != "500")
        .count()
}

fn concrete_status(key: &str) -> u16 {
    match key {
        "2XX" => 250,
        "default" => 418,
        exact => exact.parse().unwrap(),
    }
}

proptest! {
    #[test]
    fn test_unchecked_count_matches_documented_triples(doc in document(), include_500 in any::<bool>()) {
        let mut config = VerifierConfig::new();
        if include_500 {
            config = config.with_internal_server_errors();
        }
        let verifier = Verifier::new(render(&doc).as_bytes(), config).unwrap();

        let expected = documented(&doc, include_500);
        prop_assert_eq!(verifier.coverage().total, expected);
        prop_assert_eq!(verifier.current_errors().len(), expected);
    }

    #[test]
    fn test_recording_every_triple_leaves_no_errors(doc in document()) {
        let verifier = Verifier::new(render(&doc).as_bytes(), VerifierConfig::new()).unwrap();

        for (path, methods) in &doc {
            for (method, keys) in methods {
                if *method == "trace" {
                    continue;
                }
                for key in keys.iter().filter(|key| **key != "500") {
                    let request = Request::builder()
                        .method(Method::from_bytes(method.to_uppercase().as_bytes()).unwrap())
                        .uri(format!("/{path}"))
                        .body(Bytes::new())
                        .unwrap();
                    let response = Response::builder()
                        .status(concrete_status(key))
                        .body(Bytes::new())
                        .unwrap();
                    verifier.record(&Exchange::new(request, response));
                }
            }
        }

        let summary = verifier.coverage();
        prop_assert_eq!(summary.checked, summary.total);
        prop_assert!(verifier.current_error().is_none());
    }
}
