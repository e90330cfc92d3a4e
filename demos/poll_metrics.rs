//! Demo: bring a session up against a scripted loopback device and watch
//! metrics arrive.
//!
//! Run with: `cargo run --example poll_metrics`

use std::sync::Arc;
use std::time::Duration;

use helion_ble::encode;
use helion_ble::transport::loopback::LoopbackTransport;
use helion_ble::{codes, Session, SessionConfig};

#[tokio::main]
async fn main() -> helion_ble::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let (transport, mut device) = LoopbackTransport::pair();

    // A scripted lamp: answers identity and a few sensor readbacks.
    tokio::spawn(async move {
        while let Some(request) = device.next_write().await {
            for sub in request.split(|&b| b == b'@').filter(|s| !s.is_empty()) {
                let answer: Option<&[u8]> = match sub {
                    b"V" => Some(b"$V2.4.1"),
                    b"gN" => Some(b"$gNStudio lamp"),
                    b"u" => Some(b"$uHL1-00412"),
                    b"qf" => Some(b"$qf1.0.9"),
                    b"mgg" => Some(b"$mgg030.46"),
                    b"mga" => Some(b"$mga2"),
                    b"mgt" => Some(b"$mgt021.50"),
                    b"mgp" => Some(b"$mgp097796"),
                    b"mgh" => Some(b"$mgh040.00"),
                    b"mgs" => Some(b"$mgs1709251200"),
                    b"gA" => Some(b"$gA1"),
                    _ => None,
                };
                if let Some(answer) = answer {
                    device.notify(answer);
                }
            }
        }
    });

    let config = SessionConfig {
        metrics_interval: Duration::from_millis(300),
        ..SessionConfig::default()
    };
    let session = Arc::new(Session::connect(Arc::new(transport), config).await?);
    println!("connected: {:?}", session.identity());

    for code in [
        codes::METRICS_CO2,
        codes::METRICS_TEMPERATURE,
        codes::METRICS_PRESSURE,
        codes::METRICS_HUMIDITY,
    ] {
        session.register_callback(code, |value| {
            println!("{} -> {:?}", value.mnemonic, value.value);
        });
    }

    session.enqueue(encode::req_all_channels());

    let runner = {
        let session = session.clone();
        tokio::spawn(async move { session.run().await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    session.shutdown().await;
    let _ = runner.await.expect("run task");

    Ok(())
}
