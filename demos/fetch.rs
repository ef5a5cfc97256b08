//! Send one request over TLS and print the response
//!
//! ```bash
//! cargo run --example fetch -- example.com:443 "HEAD / HTTP/1.0\r\n"
//! cargo run --example fetch -- internal.host:7000 STATUS --ca ca.pem
//! RUST_LOG=secure_stream=debug cargo run --example fetch -- example.com:443 ""
//! ```

use secure_stream::{ClientConfig, RootCertificate, SecureStreamClient, TrustPolicy};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let address = args
        .next()
        .ok_or("usage: fetch <host:port> <request> [--ca <root.pem>]")?;
    let request = args
        .next()
        .unwrap_or_default()
        .replace("\\r", "\r")
        .replace("\\n", "\n");

    let policy = match (args.next().as_deref(), args.next()) {
        (Some("--ca"), Some(path)) => {
            TrustPolicy::VerifyWithRootCertificate(RootCertificate::from_pem_file(path)?)
        }
        _ => TrustPolicy::Insecure,
    };

    let config = ClientConfig::builder()
        .connect_timeout(Duration::from_secs(10))
        .build();
    let mut client = SecureStreamClient::with_trust(policy, config)?;

    client.connect_str(&address).await?;
    let written = client.send_request(request.as_bytes()).await?;
    println!("sent {} bytes", written);

    let response = client.read_response().await?;
    println!("{}", String::from_utf8_lossy(&response));
    Ok(())
}
