use serde_json::json;

use super::*;

fn cache() -> (tempfile::TempDir, ContentCache) {
    let dir = tempfile::tempdir().unwrap();
    let cache = ContentCache::at(dir.path().join("cache")).unwrap();
    (dir, cache)
}

fn chatbot(format: Option<&str>) -> Chatbot {
    let args = match format {
        Some(f) => json!({"type": f}),
        None => json!({}),
    };
    Chatbot::from_args(
        args.as_object().unwrap(),
        Arc::new(ComponentRegistry::with_builtins()),
    )
    .unwrap()
}

#[test]
fn unset_type_falls_back_to_tuples() {
    let c = chatbot(None);
    assert_eq!(c.format(), ChatbotType::Tuples);
    assert_eq!(Component::get_config(&c)["type"], json!("tuples"));
}

#[test]
fn messages_payload_must_have_role_and_content() {
    let c = chatbot(Some("messages"));
    let err = c.decode_payload(json!([["hi", null]])).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("schema validation error: {MESSAGES_FORMAT_ERROR}")
    );
    let ok = c
        .decode_payload(json!([{"role": "user", "content": "hi"}]))
        .unwrap();
    assert_eq!(ok, ChatbotData::Messages(vec![Message::text("user", "hi")]));
}

#[test]
fn tuples_payload_must_hold_pairs() {
    let c = chatbot(Some("tuples"));
    let err = c.decode_payload(json!([["a", "b", "c"]])).unwrap_err();
    assert!(err.to_string().contains(TUPLES_FORMAT_ERROR));
    let err = c
        .decode_payload(json!([{"role": "user", "content": "hi"}]))
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn returning_messages_to_a_tuples_chatbot_fails() {
    let (_d, cache) = cache();
    let c = chatbot(Some("tuples"));
    let err = c
        .postprocess(
            &cache,
            Some(ChatbotValue::Raw(json!([{"role": "user", "content": "hi"}]))),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("schema validation error: {TUPLES_FORMAT_ERROR}")
    );
}

#[test]
fn tuple_entries_of_the_wrong_length_fail() {
    let (_d, cache) = cache();
    let c = chatbot(Some("tuples"));
    let value = ChatbotValue::Tuples(vec![vec![Some(ChatContent::Text("solo".into()))]]);
    let err = c.postprocess(&cache, Some(value)).unwrap_err();
    assert!(err.to_string().contains(TUPLES_FORMAT_ERROR));
}

#[test]
fn message_text_is_dedented() {
    let (_d, cache) = cache();
    let c = chatbot(Some("messages"));
    let value = ChatbotValue::Raw(json!([
        {"role": "assistant", "content": "\n    Sure:\n      - one\n    - two\n  "}
    ]));
    let Some(ChatbotData::Messages(out)) = c.postprocess(&cache, Some(value)).unwrap() else {
        panic!("expected messages");
    };
    assert_eq!(
        out[0].content,
        MessageContent::Text("Sure:\n  - one\n- two".into())
    );
    assert_eq!(
        serde_json::to_value(&out[0]).unwrap(),
        json!({"role": "assistant", "metadata": null, "content": "Sure:\n  - one\n- two", "options": null})
    );
}

#[test]
fn cleandoc_matches_docstring_rules() {
    assert_eq!(cleandoc("  first\n    a\n      b\n"), "first\na\n  b");
    assert_eq!(cleandoc("\n\n  x\n\n"), "x");
    assert_eq!(cleandoc("plain"), "plain");
    assert_eq!(cleandoc(""), "");
}

#[test]
fn file_contents_are_cached_with_alt_text() {
    let (d, cache) = cache();
    let src = d.path().join("cat.png");
    std::fs::write(&src, b"\x89PNG fake").unwrap();
    let c = chatbot(Some("tuples"));
    let value = ChatbotValue::Raw(json!([[
        [src.to_string_lossy(), "a cat"],
        "nice"
    ]]));
    let Some(ChatbotData::Tuples(out)) = c.postprocess(&cache, Some(value)).unwrap() else {
        panic!("expected tuples");
    };
    let Some(MessageContent::File(fm)) = &out[0].0 else {
        panic!("expected a file");
    };
    assert!(cache.contains(Path::new(&fm.file.path)));
    assert_eq!(fm.alt_text.as_deref(), Some("a cat"));
    assert_eq!(out[0].1, Some(MessageContent::Text("nice".into())));
}

#[test]
fn uploaded_files_preprocess_to_paths() {
    let (d, cache) = cache();
    let src = d.path().join("notes.txt");
    std::fs::write(&src, b"hello").unwrap();
    let c = chatbot(Some("messages"));
    let payload = c
        .decode_payload(json!([{
            "role": "user",
            "content": {"file": {"path": src.to_string_lossy(), "meta": {"_type": "gradio.FileData"}}, "alt_text": null}
        }]))
        .unwrap();
    let Some(ChatbotValue::Messages(msgs)) = c.preprocess(&cache, Some(payload)).unwrap() else {
        panic!("expected messages");
    };
    let ChatContent::File { path, alt_text } = &msgs[0].content else {
        panic!("expected a file");
    };
    assert_eq!(path, &src.to_string_lossy());
    assert!(alt_text.is_none());
}

#[test]
fn embedded_components_round_trip_through_the_registry() {
    let (_d, cache) = cache();
    let c = chatbot(Some("messages"));
    let payload = c
        .decode_payload(json!([{
            "role": "assistant",
            "content": {
                "component": "textbox",
                "value": "hi",
                "constructor_args": {"value": "hi", "lines": 2},
                "props": {}
            }
        }]))
        .unwrap();
    let Some(ChatbotValue::Messages(msgs)) = c.preprocess(&cache, Some(payload)).unwrap() else {
        panic!("expected messages");
    };
    let ChatContent::Component(embedded) = msgs[0].content.clone() else {
        panic!("expected a component");
    };
    assert_eq!(embedded.tag, "textbox");
    assert!(!embedded.constructor_args.contains_key("value"));
    assert!(matches!(&embedded.value, Some(ComponentValue::Text(s)) if s == "hi"));

    let Some(ChatbotData::Messages(out)) = c
        .postprocess(&cache, Some(ChatbotValue::Messages(msgs)))
        .unwrap()
    else {
        panic!("expected messages");
    };
    let MessageContent::Component(cm) = &out[0].content else {
        panic!("expected a component");
    };
    assert_eq!(cm.component, "textbox");
    assert_eq!(cm.value, json!("hi"));
    assert_eq!(cm.props["value"], json!("hi"));
    assert_eq!(cm.props["name"], json!("textbox"));
}

#[test]
fn unknown_embedded_component_is_rejected() {
    let (_d, cache) = cache();
    let c = chatbot(Some("messages"));
    let payload = c
        .decode_payload(json!([{
            "role": "assistant",
            "content": {"component": "plot", "value": null}
        }]))
        .unwrap();
    let err = c.preprocess(&cache, Some(payload)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "schema validation error: Invalid component for Chatbot component: plot"
    );
}

#[test]
fn empty_values_give_an_empty_history() {
    let (_d, cache) = cache();
    for format in ["messages", "tuples"] {
        let c = chatbot(Some(format));
        let out = c.postprocess(&cache, None).unwrap();
        assert_eq!(serde_json::to_value(out).unwrap(), json!([]));
        assert!(c.preprocess(&cache, None).unwrap().is_some());
    }
}

#[test]
fn empty_history_of_the_other_format_is_accepted_both_ways() {
    let (_d, cache) = cache();
    let tuples = chatbot(Some("tuples"));
    let out = tuples
        .postprocess(&cache, Some(ChatbotValue::Messages(vec![])))
        .unwrap();
    assert!(matches!(out, Some(ChatbotData::Tuples(t)) if t.is_empty()));
    let back = tuples
        .preprocess(&cache, Some(ChatbotData::Messages(vec![])))
        .unwrap();
    assert!(matches!(back, Some(ChatbotValue::Tuples(t)) if t.is_empty()));

    let messages = chatbot(Some("messages"));
    let out = messages
        .postprocess(&cache, Some(ChatbotValue::Tuples(vec![])))
        .unwrap();
    assert!(matches!(out, Some(ChatbotData::Messages(m)) if m.is_empty()));

    let err = messages
        .postprocess(
            &cache,
            Some(ChatbotValue::Tuples(vec![vec![Some(ChatContent::Text("hi".into())), None]])),
        )
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn examples_are_accepted_by_each_format() {
    let (_d, cache) = cache();
    for format in ["messages", "tuples"] {
        let c = chatbot(Some(format));
        let raw = serde_json::to_value(c.example_payload()).unwrap();
        let decoded = c.decode_payload(raw).unwrap();
        assert!(c.preprocess(&cache, Some(decoded)).is_ok());
        assert!(c.postprocess(&cache, Some(c.example_value())).is_ok());
    }
}
