use bytes::Bytes;
use imagestore_client::{ClientConfig, Error, MemoryType, SecureObjectClient};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let input_file = args
        .next()
        .ok_or("Usage: store_read_remove <input_file> [output_file]")?;
    let output_file = args.next();

    println!("==> ImageStore Client Example");

    let config = ClientConfig::from_env()?;
    let client = SecureObjectClient::connect(&config)?;
    println!("✓ Connected to {}", config.address());

    // Reading an unknown handle reports ObjectNotFound
    match client.read("inmem") {
        Err(Error::ObjectNotFound(msg)) => println!("✓ Unknown key: {}", msg),
        Err(e) => return Err(e.into()),
        Ok(data) => println!("  Unexpected {} bytes for unknown key", data.len()),
    }

    // Small in-memory object
    let key = client.store(Bytes::from_static(b"vivek"), MemoryType::InMemory)?;
    println!("✓ Stored object: {}", key);

    let data = client.read(&key)?;
    println!("✓ Read {} bytes", data.len());

    client.remove(&key)?;
    println!("✓ Removed {}", key);

    // File round trip
    let input = std::fs::read(&input_file)?;
    let key = client.store(input, MemoryType::InMemory)?;
    println!("✓ Stored {} as {}", input_file, key);

    let data = client.read(&key)?;
    println!("✓ Read {} bytes", data.len());

    if let Some(output_file) = output_file {
        imagestore_client::driver::write_payload(std::path::Path::new(&output_file), &data)?;
        println!("✓ Wrote {}", output_file);
    }

    client.remove(&key)?;
    println!("\n==> ImageStore client example completed successfully!");

    Ok(())
}
