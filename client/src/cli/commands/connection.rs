use iris_client_rs::IrisClientError;

use crate::Params;
use crate::utils::create_store;

pub async fn status(params: Params) -> Result<(), IrisClientError> {
    let store = create_store(&params)?;
    let connected = store.check_status().await;
    let info = store.connection();
    if connected {
        println!(
            "Connected to bridge at {}",
            info.bridge_ip.as_deref().unwrap_or("unknown address")
        );
    } else {
        println!("Not connected");
    }
    if let Some(saved_ip) = info.saved_ip {
        println!("Saved bridge address: {saved_ip}");
    }
    Ok(())
}

pub async fn connect(params: Params, ip: &str) -> Result<(), IrisClientError> {
    let store = create_store(&params)?;
    if let Err(e) = store.connect(ip).await {
        println!("Connection to {ip} failed: {}", e.detail());
        return Err(e);
    }
    println!("Connected to bridge at {ip}");
    match store.last_error() {
        Some(error) => println!("Failed to load lights: {error}"),
        None => println!(
            "Found {} lights and {} rooms",
            store.lights().len(),
            store.groups().len()
        ),
    }
    Ok(())
}
