use protocol::codec::{CodecError, LineCodec};
use protocol::message::{AckResult, RequestEnvelope};

fn decode(chunk: &str) -> Result<RequestEnvelope, CodecError> {
    LineCodec::default().decode_request(chunk.as_bytes())
}

#[test]
fn documented_request_shape_decodes() {
    let request = decode(
        r#"{ "secret": "youshouldchangethis", "topic": "/user/example/foo", "message": "This is a message for the queue" }"#,
    )
    .expect("valid request");

    assert!(request.secret_matches("youshouldchangethis"));
    assert_eq!(request.topic(), Some("/user/example/foo"));
    assert_eq!(request.message(), Some("This is a message for the queue"));
}

#[test]
fn missing_fields_do_not_fail_decoding() {
    let request = decode(r#"{"secret":"s","message":"hi"}"#).expect("object decodes");
    assert_eq!(request.topic(), None);
    assert_eq!(request.message(), Some("hi"));

    let empty = decode("{}").expect("empty object decodes");
    assert!(empty.fields().is_empty());
}

#[test]
fn extra_fields_survive_secret_stripping() {
    let mut request =
        decode(r#"{"secret":"s","topic":"/a","message":"m","device":"pump-3"}"#).unwrap();
    request.strip_secret();

    let logged: serde_json::Value = serde_json::from_str(&request.to_json()).unwrap();
    assert_eq!(logged["device"], "pump-3");
    assert_eq!(logged["topic"], "/a");
    assert!(logged.get("secret").is_none());
}

#[test]
fn two_objects_in_one_chunk_are_malformed() {
    let result = decode("{\"a\":\"1\"}\n{\"b\":\"2\"}");
    assert!(matches!(result, Err(CodecError::Json(_))));
}

#[test]
fn invalid_utf8_is_malformed_not_a_panic() {
    let result = LineCodec::default().decode_request(&[0xff, 0xfe, b'{', b'}']);
    assert!(result.is_err());
}

#[test]
fn ack_is_readable_by_clients() {
    let line = LineCodec::default()
        .encode_ack(&AckResult::from_success(true))
        .unwrap();
    let text = std::str::from_utf8(&line).unwrap();

    assert!(text.ends_with('\n'));
    let parsed: AckResult = serde_json::from_str(text.trim_end()).unwrap();
    assert_eq!(parsed, AckResult::ACCEPTED);
}
