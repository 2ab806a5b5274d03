use grapnel_core::connect::{self, ConnectError};

#[tokio::test]
async fn connect_verifies_the_channel_with_a_reflection_probe() {
    let addr = adder_service::spawn().await;

    // "127.0.0.1:<port>" carries a non-443 port, so the first strategy is the
    // plaintext dial that the fixture answers.
    let channel = connect::connect(&addr.to_string()).await;
    assert!(channel.is_ok());
}

#[tokio::test]
async fn scheme_prefix_is_tolerated() {
    let addr = adder_service::spawn().await;

    let channel = connect::connect(&format!("http://{addr}")).await;
    assert!(channel.is_ok());
}

#[tokio::test]
async fn exhausted_strategies_report_the_last_cause() {
    // Grab a free port and release it again so nothing listens there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = connect::connect(&addr.to_string()).await.unwrap_err();

    let ConnectError::Exhausted { host, .. } = &err;
    assert_eq!(host, &addr.to_string());
    assert!(err.to_string().starts_with("Failed to connect to"));
}
