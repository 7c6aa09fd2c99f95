use kinetic::prelude::*;
use kinetic_test::{PageProbe, protocol_request};
use serde_json::json;

#[tokio::test]
async fn test_prelude_renders_a_page() {
    let kinetic = Kinetic::new(KineticConfig::default());
    let page = PageDefinition::builder("Hello")
        .prop("greeting", Prop::plain())
        .build()
        .unwrap();
    let req = protocol_request("/hello", "").body(()).unwrap();

    let response = kinetic
        .render(
            &req,
            &page,
            RenderRequest::new().prop("greeting", json!("hi")),
            None,
        )
        .await
        .unwrap();
    let probe = PageProbe::from_response(response).await.unwrap();

    assert_eq!(probe.component(), Some("Hello"));
    assert_eq!(probe.prop("greeting"), Some(&json!("hi")));
}
